//! Process adapters.

mod scripted;
mod system;

pub use scripted::{ScriptedProcessRunner, exit_with};
pub use system::SystemProcessRunner;
