//! Types and helpers shared by every crate in the workspace.

pub mod patch;
pub mod types;
pub mod utils;

pub use patch::Patch;
