//! Asset-publishing strategies.
//!
//! A stack is deployed either against a pre-existing CDK bootstrap stack
//! ("bootstrapped") or with every asset destination supplied explicitly
//! ("bootstrapless"). The two are mutually exclusive, so they are modelled
//! as one enum rather than two optional fields.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::error::DomainError;

/// Keys accepted in `bootstrapless_config`, in schema order.
pub const BOOTSTRAPLESS_KEYS: [&str; 10] = [
    "file_asset_bucket_name",
    "file_asset_prefix",
    "file_asset_publishing_role_arn",
    "file_asset_region_set",
    "image_asset_account_id",
    "image_asset_publishing_role_arn",
    "image_asset_region_set",
    "image_asset_repository_name",
    "image_asset_tag_prefix",
    "template_bucket_name",
];

/// The `deployment_type` handler argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentType {
    Bootstrapped,
    Bootstrapless,
}

impl DeploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bootstrapped => "bootstrapped",
            Self::Bootstrapless => "bootstrapless",
        }
    }
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bootstrapped" => Ok(Self::Bootstrapped),
            "bootstrapless" => Ok(Self::Bootstrapless),
            other => Err(DomainError::InvalidDeploymentType {
                found: other.to_string(),
            }),
        }
    }
}

/// Settings for the bootstrapless stack synthesizer. Every field is optional;
/// a missing bucket for a stack that has file assets only surfaces at
/// synthesis or publish time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstraplessConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_asset_bucket_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_asset_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_asset_publishing_role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_asset_region_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_asset_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_asset_publishing_role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_asset_region_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_asset_repository_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_asset_tag_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_bucket_name: Option<String>,
}

impl BootstraplessConfig {
    /// Build from the raw `bootstrapless_config` mapping, rejecting any key
    /// the synthesizer does not recognise.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, DomainError> {
        let mut config = Self::default();
        for (key, value) in map {
            let slot = match key.as_str() {
                "file_asset_bucket_name" => &mut config.file_asset_bucket_name,
                "file_asset_prefix" => &mut config.file_asset_prefix,
                "file_asset_publishing_role_arn" => &mut config.file_asset_publishing_role_arn,
                "file_asset_region_set" => &mut config.file_asset_region_set,
                "image_asset_account_id" => &mut config.image_asset_account_id,
                "image_asset_publishing_role_arn" => &mut config.image_asset_publishing_role_arn,
                "image_asset_region_set" => &mut config.image_asset_region_set,
                "image_asset_repository_name" => &mut config.image_asset_repository_name,
                "image_asset_tag_prefix" => &mut config.image_asset_tag_prefix,
                "template_bucket_name" => &mut config.template_bucket_name,
                _ => {
                    return Err(DomainError::UnknownBootstraplessKey { key: key.clone() });
                }
            };
            *slot = Some(value.clone());
        }
        Ok(config)
    }

    /// Set entries as `(key, value)` pairs, in schema order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        let values = [
            &self.file_asset_bucket_name,
            &self.file_asset_prefix,
            &self.file_asset_publishing_role_arn,
            &self.file_asset_region_set,
            &self.image_asset_account_id,
            &self.image_asset_publishing_role_arn,
            &self.image_asset_region_set,
            &self.image_asset_repository_name,
            &self.image_asset_tag_prefix,
            &self.template_bucket_name,
        ];
        BOOTSTRAPLESS_KEYS
            .iter()
            .zip(values)
            .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// The validated asset-publishing strategy for one stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentStrategy {
    /// Assets go to the infrastructure of an existing bootstrap stack.
    Bootstrapped { qualifier: Option<String> },
    /// Asset destinations are supplied explicitly.
    Bootstrapless(BootstraplessConfig),
}

impl DeploymentStrategy {
    /// Validate the strategy-related handler arguments.
    ///
    /// Arguments belonging to the other strategy are rejected rather than
    /// ignored.
    pub fn from_arguments(
        deployment_type: &str,
        bootstrap_qualifier: Option<&str>,
        bootstrapless_config: Option<&BTreeMap<String, String>>,
    ) -> Result<Self, DomainError> {
        let kind: DeploymentType = deployment_type.parse()?;
        let has_bootstrapless = bootstrapless_config.is_some_and(|m| !m.is_empty());

        match kind {
            DeploymentType::Bootstrapped => {
                if has_bootstrapless {
                    return Err(DomainError::ConflictingStrategy {
                        field: "bootstrapless_config",
                        deployment_type: kind.as_str(),
                    });
                }
                Ok(Self::Bootstrapped {
                    qualifier: bootstrap_qualifier.map(str::to_string),
                })
            }
            DeploymentType::Bootstrapless => {
                if bootstrap_qualifier.is_some() {
                    return Err(DomainError::ConflictingStrategy {
                        field: "bootstrap_qualifier",
                        deployment_type: kind.as_str(),
                    });
                }
                let config = match bootstrapless_config {
                    Some(map) => BootstraplessConfig::from_map(map)?,
                    None => BootstraplessConfig::default(),
                };
                Ok(Self::Bootstrapless(config))
            }
        }
    }

    pub fn deployment_type(&self) -> DeploymentType {
        match self {
            Self::Bootstrapped { .. } => DeploymentType::Bootstrapped,
            Self::Bootstrapless(_) => DeploymentType::Bootstrapless,
        }
    }
}
