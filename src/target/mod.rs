//! Build targets and the incremental rebuild engine
//!
//! Target kinds:
//! - [`FileTarget`] - explicit file paths
//! - [`GlobTarget`] - a glob mask, expanded on every check
//! - [`PhonyTarget`] - no backing files, always stale

pub mod deps;
pub mod engine;
pub mod file;
pub mod glob;
pub mod phony;
pub mod stamp;
pub mod traits;

pub use deps::DependencySet;
pub use engine::BuildSession;
pub use file::FileTarget;
pub use glob::GlobTarget;
pub use phony::PhonyTarget;
pub use traits::*;
