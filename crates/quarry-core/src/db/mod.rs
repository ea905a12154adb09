pub mod document;
pub mod filter;
pub mod index;
pub mod memory;
pub mod plan;
pub mod source;
pub mod trace;
