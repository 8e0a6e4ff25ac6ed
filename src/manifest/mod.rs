//! Declarative build manifests
//!
//! A manifest describes a target graph in TOML; [`Graph::wire`] turns it into
//! the same [`Target`](crate::target::Target) objects a host program would
//! build by hand.

pub mod graph;
pub mod model;

pub use graph::{Graph, ROOT_NAME};
pub use model::{Manifest, TargetKind, TargetSpec};
