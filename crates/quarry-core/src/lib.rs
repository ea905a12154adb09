//! Core of Quarry: document values, filter expressions, index-aware filter
//! evaluation and query planning for an embedded document store.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod traits;
pub mod value;

///
/// Prelude
///
/// Prelude contains only domain vocabulary and filter builders.
/// No executors, indexes, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{
            document::{Document, RecordId},
            filter::{Filter, by_id, element, where_field},
        },
        traits::FieldValue,
        value::Value,
    };
}
