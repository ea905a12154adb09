//! In-memory collection and index implementations.
//!
//! These back the engine's own tests and serve embedders that keep small
//! collections entirely in memory.

mod collection;
mod ordered;
mod text;

pub use collection::MemoryCollection;
pub use ordered::MemoryOrderedIndex;
pub use text::MemoryTextIndex;
