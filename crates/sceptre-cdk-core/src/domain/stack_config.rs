//! The stack config file handed to the handler binary.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::arguments::HandlerArguments;
use crate::domain::context::ParameterValue;
use crate::domain::environment::ConnectionInfo;
use crate::domain::error::DomainError;

/// One Sceptre stack, as far as this handler is concerned.
///
/// ```yaml
/// template:
///   type: cdk
///   path: s3.py
///   deployment_type: bootstrapped
/// region: eu-west-1
/// sceptre_user_data:
///   bucket_name: logs
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StackConfig {
    pub template: HandlerArguments,
    #[serde(default)]
    pub sceptre_user_data: Value,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub iam_role: Option<String>,
}

impl StackConfig {
    pub fn from_yaml(raw: &str) -> Result<Self, DomainError> {
        serde_yaml_ng::from_str(raw).map_err(|e| DomainError::InvalidStackConfig {
            reason: e.to_string(),
        })
    }

    /// Connection details. A region is required; `fallback_region` is
    /// used when the config has none.
    pub fn connection(&self, fallback_region: Option<&str>) -> Result<ConnectionInfo, DomainError> {
        let region = self
            .region
            .as_deref()
            .or(fallback_region)
            .filter(|r| !r.trim().is_empty())
            .ok_or(DomainError::MissingRequiredField { field: "region" })?;
        Ok(ConnectionInfo {
            region: region.to_string(),
            account_id: self.account_id.clone(),
            profile: self.profile.clone(),
            iam_role: self.iam_role.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FULL: &str = r#"
template:
  type: cdk
  path: lambda_stack.py
  deployment_type: bootstrapless
  bootstrapless_config:
    file_asset_bucket_name: my-assets
region: us-east-1
profile: dev
parameters:
  Env: prod
  Subnets: [a, b]
sceptre_user_data:
  memory: 256
"#;

    #[test]
    fn parses_full_config() {
        let config = StackConfig::from_yaml(FULL).unwrap();
        assert_eq!(config.template.path.as_deref(), Some("lambda_stack.py"));
        assert_eq!(config.sceptre_user_data, json!({"memory": 256}));
        assert_eq!(
            config.parameters["Subnets"],
            ParameterValue::List(vec!["a".into(), "b".into()])
        );
        let connection = config.connection(None).unwrap();
        assert_eq!(connection.region, "us-east-1");
        assert_eq!(connection.profile.as_deref(), Some("dev"));
    }

    #[test]
    fn unknown_template_key_is_rejected() {
        let raw = "template:\n  path: s.py\n  deployment_type: bootstrapped\n  colour: red\n";
        let err = StackConfig::from_yaml(raw).unwrap_err();
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn region_falls_back_then_fails() {
        let config =
            StackConfig::from_yaml("template:\n  path: s.py\n  deployment_type: bootstrapped\n")
                .unwrap();
        assert_eq!(config.connection(Some("eu-west-2")).unwrap().region, "eu-west-2");
        assert_eq!(
            config.connection(None).unwrap_err(),
            DomainError::MissingRequiredField { field: "region" }
        );
    }
}
