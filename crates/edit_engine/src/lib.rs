//! Edit Engine - Command system, selection resolution, and undo/redo
//!
//! Commands apply a discrete, named edit to a `(DocumentTree, Selection)`
//! pair and return the updated pair plus an inverse for undo. The
//! [`EditingEngine`] owns the state and silently ignores commands while no
//! selection is active.

mod block_commands;
mod command;
mod error;
mod executor;
mod image_commands;
mod link_commands;
mod list_commands;
mod mark_commands;
pub mod queries;
mod undo;

pub use block_commands::*;
pub use command::*;
pub use error::*;
pub use executor::*;
pub use image_commands::*;
pub use link_commands::*;
pub use mark_commands::*;
pub use undo::*;
