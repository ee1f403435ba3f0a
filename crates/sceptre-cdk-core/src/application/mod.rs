//! Application layer for the CDK handler.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (CdkHandler and the stages it runs)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Import scope**: The process-wide module search list
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business rules itself. Those live in `crate::domain`.

pub mod error;
pub mod import_scope;
pub mod ports;
pub mod services;

pub use services::{
    AssetPublisher, CdkHandler, CloudAssembly, HandleRequest, LoadedStack, ModuleLoader,
    PrerequisiteChecker, PrerequisiteKind, PrerequisiteStatus, PublishOutcome, SynthesisInvoker,
    TemplateBody, Toolchain,
};

// Re-export port traits (for adapter implementation)
pub use ports::{
    CommandSpec, DiscardOutput, OutputSink, ProcessOutput, ProcessRunner, SessionProvider,
    StreamKind,
};

pub use error::ApplicationError;
pub use import_scope::{ImportPathRegistry, ImportPathScope};
