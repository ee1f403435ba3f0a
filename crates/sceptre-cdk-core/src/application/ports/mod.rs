//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `sceptre-cdk-adapters`
//! implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `ProcessRunner`: Runs CDK, cdk-assets, npm and the Python shim
//!   - `OutputSink`: Receives subprocess output line by line
//!   - `SessionProvider`: Supplies the orchestrator's resolved credentials
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (`CdkHandler::handle`, called by the CLI layer)

pub mod output;

pub use output::{
    CommandSpec, DiscardOutput, OutputSink, ProcessOutput, ProcessRunner, SessionProvider,
    StreamKind,
};

#[cfg(test)]
pub use output::MockSessionProvider;
