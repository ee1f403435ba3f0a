//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish the
//! handler's use cases: load a stack, synthesize it, publish its assets.

pub mod handler;
pub mod module_loader;
pub mod prerequisites;
pub mod publisher;
pub mod synthesis;

pub use handler::{CdkHandler, HandleRequest};
pub use module_loader::{LoadedStack, ModuleLoader};
pub use prerequisites::{PrerequisiteChecker, PrerequisiteKind, PrerequisiteStatus};
pub use publisher::{AssetPublisher, PublishOutcome};
pub use synthesis::{CloudAssembly, SynthesisInvoker, TemplateBody, Toolchain};
