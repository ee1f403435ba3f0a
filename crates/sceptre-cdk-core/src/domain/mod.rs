// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for the CDK handler.
//!
//! Pure rules about handler arguments, stack references, publishing
//! strategies and the shape of synthesized assemblies. No process
//! execution happens here; the only filesystem access is the package-marker
//! probe of [`ImportSearchPath::resolve`].

pub mod arguments;
pub mod assembly;
pub mod context;
pub mod environment;
pub mod error;
pub mod import_path;
pub mod schema;
pub mod stack_config;
pub mod stack_reference;
pub mod strategy;
pub mod synthesizer;

pub use arguments::{HANDLER_TYPE, HandlerArguments, HandlerPlan};
pub use assembly::{
    ASSEMBLY_MANIFEST, AssemblyManifest, AssetManifest, FileAsset, SelectedStack,
};
pub use context::{ParameterValue, QUALIFIER_CONTEXT_KEY, SynthesisContext};
pub use environment::{
    ConnectionInfo, CredentialSource, EnvironmentOverrides, PublishingEnvironment,
    SessionCredentials,
};
pub use error::DomainError;
pub use import_path::{ImportSearchPath, PACKAGE_MARKER, normalize_path};
pub use schema::handler_schema;
pub use stack_config::StackConfig;
pub use stack_reference::{
    DEFAULT_CLASS_NAME, DEFAULT_STACK_LOGICAL_ID, PROJECT_DESCRIPTOR, StackDefinitionReference,
    StackSource,
};
pub use strategy::{BOOTSTRAPLESS_KEYS, BootstraplessConfig, DeploymentStrategy, DeploymentType};
pub use synthesizer::SynthesizerConfig;
