//! Connection data and the environment handed to CDK subprocesses.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Deserialize;

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const AWS_PROFILE: &str = "AWS_PROFILE";
pub const AWS_REGION: &str = "AWS_REGION";
pub const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
pub const CDK_DEFAULT_REGION: &str = "CDK_DEFAULT_REGION";
pub const CDK_DEFAULT_ACCOUNT: &str = "CDK_DEFAULT_ACCOUNT";

/// The orchestrator's view of how a stack connects to AWS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionInfo {
    pub region: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub iam_role: Option<String>,
}

/// Temporary credentials of an already-established session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where the subprocess gets its credentials from. Exactly one source is
/// ever active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Session(SessionCredentials),
    Profile(String),
    /// Whatever the inherited environment already provides.
    Ambient,
}

/// Changes applied on top of the inherited process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentOverrides {
    pub set: BTreeMap<String, String>,
    pub remove: BTreeSet<String>,
}

impl EnvironmentOverrides {
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.remove.remove(&key);
        self.set.insert(key, value.into());
    }

    pub fn remove(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.set.remove(&key);
        self.remove.insert(key);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.set.get(key).map(String::as_str)
    }

    pub fn removes(&self, key: &str) -> bool {
        self.remove.contains(key)
    }

    /// Apply `other` after `self`.
    pub fn merge(&mut self, other: &EnvironmentOverrides) {
        for key in &other.remove {
            self.remove(key.clone());
        }
        for (key, value) in &other.set {
            self.set(key.clone(), value.clone());
        }
    }
}

/// Account, region and credentials for the publishing subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishingEnvironment {
    pub region: String,
    pub account_id: Option<String>,
    pub credentials: CredentialSource,
}

impl PublishingEnvironment {
    /// Derive from the stack's connection and the orchestrator's session.
    ///
    /// Session credentials take precedence over a named profile: they are
    /// what the orchestrator itself uses for the stack, including any
    /// assumed role, and they cannot be combined with `AWS_PROFILE`.
    pub fn derive(connection: &ConnectionInfo, session: Option<SessionCredentials>) -> Self {
        let credentials = match (session, &connection.profile) {
            (Some(session), _) => CredentialSource::Session(session),
            (None, Some(profile)) => CredentialSource::Profile(profile.clone()),
            (None, None) => CredentialSource::Ambient,
        };
        Self {
            region: connection.region.clone(),
            account_id: connection.account_id.clone(),
            credentials,
        }
    }

    /// Variables to set and clear in the inherited environment.
    pub fn overrides(&self) -> EnvironmentOverrides {
        let mut env = EnvironmentOverrides::default();
        env.set(AWS_REGION, &self.region);
        env.set(AWS_DEFAULT_REGION, &self.region);
        env.set(CDK_DEFAULT_REGION, &self.region);
        if let Some(account) = &self.account_id {
            env.set(CDK_DEFAULT_ACCOUNT, account);
        }

        match &self.credentials {
            CredentialSource::Session(session) => {
                env.remove(AWS_PROFILE);
                env.set(AWS_ACCESS_KEY_ID, &session.access_key_id);
                env.set(AWS_SECRET_ACCESS_KEY, &session.secret_access_key);
                match &session.session_token {
                    Some(token) => env.set(AWS_SESSION_TOKEN, token),
                    None => env.remove(AWS_SESSION_TOKEN),
                }
            }
            CredentialSource::Profile(profile) => {
                env.set(AWS_PROFILE, profile);
                env.remove(AWS_ACCESS_KEY_ID);
                env.remove(AWS_SECRET_ACCESS_KEY);
                env.remove(AWS_SESSION_TOKEN);
            }
            CredentialSource::Ambient => {}
        }
        env
    }
}
