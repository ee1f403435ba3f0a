//! Session credential adapters.

use std::collections::BTreeMap;

use sceptre_cdk_core::{
    application::{ApplicationError, ports::SessionProvider},
    domain::{ConnectionInfo, SessionCredentials, environment},
    error::HandlerResult,
};
use tracing::debug;

/// Reads the session the orchestrator exported as `AWS_ACCESS_KEY_ID`,
/// `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`.
///
/// Variables are captured when the provider is created.
#[derive(Debug, Clone, Default)]
pub struct EnvSessionProvider {
    vars: BTreeMap<String, String>,
}

impl EnvSessionProvider {
    /// Capture the current process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .filter(|(_, v)| !v.is_empty())
                .collect(),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

impl SessionProvider for EnvSessionProvider {
    fn session_credentials(
        &self,
        connection: &ConnectionInfo,
    ) -> HandlerResult<Option<SessionCredentials>> {
        let access = self.get(environment::AWS_ACCESS_KEY_ID);
        let secret = self.get(environment::AWS_SECRET_ACCESS_KEY);

        match (access, secret) {
            (Some(access), Some(secret)) => {
                debug!(region = %connection.region, "Using exported session credentials");
                Ok(Some(SessionCredentials {
                    access_key_id: access.to_string(),
                    secret_access_key: secret.to_string(),
                    session_token: self.get(environment::AWS_SESSION_TOKEN).map(str::to_string),
                }))
            }
            (None, None) => {
                debug!(profile = ?connection.profile, "No exported session credentials");
                Ok(None)
            }
            (Some(_), None) => Err(ApplicationError::SessionUnavailable {
                reason: format!(
                    "{} is set but {} is not",
                    environment::AWS_ACCESS_KEY_ID,
                    environment::AWS_SECRET_ACCESS_KEY
                ),
            }
            .into()),
            (None, Some(_)) => Err(ApplicationError::SessionUnavailable {
                reason: format!(
                    "{} is set but {} is not",
                    environment::AWS_SECRET_ACCESS_KEY,
                    environment::AWS_ACCESS_KEY_ID
                ),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sceptre_cdk_core::error::Stage;

    fn connection() -> ConnectionInfo {
        ConnectionInfo {
            region: "eu-west-1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn reads_full_session() {
        let provider = EnvSessionProvider::from_vars([
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_SESSION_TOKEN", "token"),
        ]);
        let creds = provider.session_credentials(&connection()).unwrap().unwrap();
        assert_eq!(creds.access_key_id, "AKIA");
        assert_eq!(creds.session_token.as_deref(), Some("token"));
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let provider = EnvSessionProvider::from_vars([
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_SESSION_TOKEN", ""),
        ]);
        let creds = provider.session_credentials(&connection()).unwrap().unwrap();
        assert!(creds.session_token.is_none());
    }

    #[test]
    fn no_variables_means_no_session() {
        let provider = EnvSessionProvider::from_vars(Vec::<(String, String)>::new());
        assert!(provider.session_credentials(&connection()).unwrap().is_none());
    }

    #[test]
    fn half_a_session_is_a_publishing_error() {
        let provider = EnvSessionProvider::from_vars([("AWS_ACCESS_KEY_ID", "AKIA")]);
        let err = provider.session_credentials(&connection()).unwrap_err();
        assert_eq!(err.stage(), Stage::Publishing);
    }
}
