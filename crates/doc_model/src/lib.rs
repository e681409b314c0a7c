//! Document Model - Core document tree structure and types
//!
//! This crate provides the foundational document model for the rich content
//! editor: an arena tree of typed block/run/link/image nodes with stable
//! node IDs, the selection model, and the structural invariants.

mod block;
mod error;
mod image;
mod link;
mod node;
mod node_id;
mod run;
mod selection;
mod tree;

pub use block::*;
pub use error::*;
pub use image::*;
pub use link::*;
pub use node::*;
pub use node_id::*;
pub use run::*;
pub use selection::*;
pub use tree::*;
