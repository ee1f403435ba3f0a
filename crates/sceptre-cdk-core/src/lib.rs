//! Sceptre CDK Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers of the Sceptre
//! CDK template handler, following hexagonal (ports and adapters)
//! architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        sceptre-cdk-cli (CLI)            │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (CdkHandler, ModuleLoader, Synthesis,  │
//! │       AssetPublisher, Prerequisites)    │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (ProcessRunner, OutputSink, Session)    │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    sceptre-cdk-adapters (Infrastructure)│
//! │ (SystemProcessRunner, EnvSessionProvider│
//! │        TracingOutputSink, etc)          │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (HandlerArguments, DeploymentStrategy,  │
//! │  ImportSearchPath, AssemblyManifest)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sceptre_cdk_core::{
//!     application::{CdkHandler, HandleRequest},
//!     domain::HandlerArguments,
//! };
//!
//! let arguments = HandlerArguments {
//!     path: Some("s3.py".into()),
//!     deployment_type: Some("bootstrapped".into()),
//!     ..Default::default()
//! };
//! let request = HandleRequest::new(arguments, "/srv/sceptre-project");
//!
//! // Inject adapters for processes, output and credentials
//! let handler = CdkHandler::new(runner, sink, session);
//! let template = handler.handle(&request).unwrap();
//! ```

// Domain layer (stable, well-defined API)
pub mod domain;

// Application layer (orchestration logic)
pub mod application;

// Error types
pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        CdkHandler, CloudAssembly, HandleRequest, LoadedStack, TemplateBody, Toolchain,
        ports::{CommandSpec, OutputSink, ProcessOutput, ProcessRunner, SessionProvider, StreamKind},
    };
    pub use crate::domain::{
        ConnectionInfo, DeploymentStrategy, HandlerArguments, ParameterValue, SessionCredentials,
        StackConfig,
    };
    pub use crate::error::{HandlerError, HandlerResult, Stage};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
