//! Cloud assembly manifests.
//!
//! Only the parts of the CDK cloud-assembly schema this handler reads are
//! modelled; everything else is ignored on deserialization.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::error::DomainError;

/// Top-level manifest written by every synthesis.
pub const ASSEMBLY_MANIFEST: &str = "manifest.json";

pub const STACK_ARTIFACT_TYPE: &str = "aws:cloudformation:stack";
pub const ASSET_MANIFEST_ARTIFACT_TYPE: &str = "cdk:asset-manifest";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssemblyManifest {
    #[serde(default)]
    pub artifacts: BTreeMap<String, Artifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: ArtifactProperties,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactProperties {
    /// Set on stack artifacts.
    pub template_file: Option<String>,
    /// Set on asset-manifest artifacts.
    pub file: Option<String>,
}

/// The stack chosen from an assembly, with file names relative to the
/// assembly directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedStack {
    pub id: String,
    pub template_file: String,
    pub asset_manifest: Option<String>,
}

impl AssemblyManifest {
    /// Ids of all stack artifacts, sorted.
    pub fn stack_ids(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .filter(|(_, a)| a.kind == STACK_ARTIFACT_TYPE)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Select exactly one stack.
    ///
    /// With `requested` set, that stack must exist. Without it the assembly
    /// must contain exactly one stack.
    pub fn select_stack(&self, requested: Option<&str>) -> Result<SelectedStack, DomainError> {
        let ids = self.stack_ids();
        let id = match requested {
            Some(id) if ids.contains(&id) => id,
            Some(id) => {
                return Err(DomainError::StackNotInAssembly {
                    id: id.to_string(),
                    available: list(&ids),
                });
            }
            None => match ids.as_slice() {
                [] => return Err(DomainError::NoStacksInAssembly),
                [only] => *only,
                _ => {
                    return Err(DomainError::AmbiguousStack {
                        available: list(&ids),
                    });
                }
            },
        };

        let artifact = &self.artifacts[id];
        let template_file = artifact
            .properties
            .template_file
            .clone()
            .unwrap_or_else(|| format!("{id}.template.json"));

        Ok(SelectedStack {
            id: id.to_string(),
            template_file,
            asset_manifest: self.asset_manifest_for(id, artifact),
        })
    }

    /// The asset manifest belonging to a stack: a dependency of the stack
    /// artifact, or failing that the conventional `<id>.assets` artifact.
    fn asset_manifest_for(&self, id: &str, stack: &Artifact) -> Option<String> {
        let conventional = format!("{id}.assets");
        stack
            .dependencies
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(conventional.as_str()))
            .filter_map(|dep| self.artifacts.get(dep))
            .find(|a| a.kind == ASSET_MANIFEST_ARTIFACT_TYPE)
            .and_then(|a| a.properties.file.clone())
    }
}

fn list(ids: &[&str]) -> String {
    if ids.is_empty() {
        "none".to_string()
    } else {
        ids.join(", ")
    }
}

/// An asset manifest (`<stack>.assets.json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetManifest {
    #[serde(default)]
    pub files: BTreeMap<String, FileAsset>,
    #[serde(default, rename = "dockerImages")]
    pub docker_images: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileAsset {
    #[serde(default)]
    pub source: FileAssetSource,
    #[serde(default)]
    pub destinations: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileAssetSource {
    pub path: Option<String>,
    pub packaging: Option<String>,
}

impl AssetManifest {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.docker_images.is_empty()
    }

    /// Whether anything besides the stack's own template must be uploaded.
    ///
    /// Sceptre uploads templates itself, so a manifest whose only file is
    /// the template needs no publishing run.
    pub fn requires_publishing(&self, template_file: &str) -> bool {
        !self.docker_images.is_empty()
            || self
                .files
                .values()
                .any(|f| f.source.path.as_deref() != Some(template_file))
    }
}
