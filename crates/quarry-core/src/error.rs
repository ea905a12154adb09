use std::fmt;
use thiserror::Error as ThisError;

///
/// QueryError
///
/// Structured filter/query error with a stable classification.
/// Calling layers (collection, repository) translate the class into their own
/// result types; the message is for humans only.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct QueryError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl QueryError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a malformed-input error.
    pub fn validation(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Validation, origin, message)
    }

    /// Construct a runtime filter-application error.
    pub fn filter(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Filter, origin, message)
    }

    /// Construct an unsupported-operation error.
    pub fn unsupported(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, origin, message)
    }

    /// Standard error for an operand that cannot take part in an ordering.
    pub(crate) fn not_comparable(origin: ErrorOrigin, subject: impl fmt::Display) -> Self {
        Self::filter(origin, format!("{subject} is not comparable"))
    }

    /// Standard error for an empty or missing field name.
    pub(crate) fn empty_field(origin: ErrorOrigin) -> Self {
        Self::validation(origin, "field name cannot be empty")
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.class, ErrorClass::Validation)
    }

    #[must_use]
    pub const fn is_filter(&self) -> bool {
        matches!(self.class, ErrorClass::Filter)
    }

    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self.class, ErrorClass::Unsupported)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
///
/// Error taxonomy exposed to calling layers.
///
/// Validation  → malformed filter construction input
/// Filter      → runtime evaluation failure against a document or index
/// Unsupported → the operation needs a capability that is not available
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    Validation,
    Filter,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Filter => "filter",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Subsystem that detected the error.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorOrigin {
    Compare,
    Convert,
    Document,
    ElementMatch,
    Filter,
    Index,
    Planner,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Compare => "compare",
            Self::Convert => "convert",
            Self::Document => "document",
            Self::ElementMatch => "element_match",
            Self::Filter => "filter",
            Self::Index => "index",
            Self::Planner => "planner",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_class_prefixes_origin_and_class() {
        let err = QueryError::filter(ErrorOrigin::ElementMatch, "nested elemMatch is not supported");

        assert_eq!(
            err.display_with_class(),
            "element_match:filter: nested elemMatch is not supported"
        );
        assert!(err.is_filter());
        assert!(!err.is_validation());
    }

    #[test]
    fn not_comparable_names_the_subject() {
        let err = QueryError::not_comparable(ErrorOrigin::Compare, "[1, 2]");

        assert_eq!(err.to_string(), "[1, 2] is not comparable");
        assert_eq!(err.class, ErrorClass::Filter);
    }
}
