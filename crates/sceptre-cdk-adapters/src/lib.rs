//! Infrastructure adapters for the Sceptre CDK handler.
//!
//! This crate implements the ports defined in
//! `sceptre-cdk-core::application::ports`. It contains all process
//! execution and environment access.

pub mod output;
pub mod process;
pub mod session;

// Re-export commonly used adapters
pub use output::{MemoryOutputSink, TracingOutputSink};
pub use process::{ScriptedProcessRunner, SystemProcessRunner, exit_with};
pub use session::EnvSessionProvider;
