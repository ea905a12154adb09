//! Filter expressions: construction, validation and per-record evaluation.

mod ast;
mod builder;
mod convert;
mod element;
mod eval;

#[cfg(test)]
mod tests;

pub use ast::{
    CompareOp, ComparisonFilter, ElementMatchFilter, Filter, MembershipFilter, RegexFilter,
    TextFilter,
};
pub use builder::{FieldRef, by_id, element, where_field};
pub use convert::validate_and_convert;
pub use eval::EvalContext;
