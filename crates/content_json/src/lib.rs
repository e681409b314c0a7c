//! Content JSON - the persisted wire format
//!
//! Parses and serializes the JSON array representation the content API
//! stores. `parse` is fail-soft (the editor must never refuse to mount);
//! `serialize` is total and pure.

mod serializer;
mod wire;

pub use serializer::*;
pub use wire::*;
