mod compare;
mod number;


use crate::{db::document::Document, traits::FieldValue};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::fmt;
use time::OffsetDateTime;

// re-exports
pub use compare::{canonical_cmp, compare, deep_equals, strict_order_cmp};
pub use number::compare_numbers;

pub(crate) use compare::canonical_rank;

///
/// Value
///
/// Dynamic field value held by a document and carried as a filter operand.
///
/// Numeric variants (`Decimal`, `Float32`, `Float64`, `Int`, `IntBig`, `Uint`)
/// compare with each other by exact value. `Bool`, `Text`, `Timestamp` and
/// `Enum` are ordered within their own variant only. `List`, `Map` and
/// `Document` can be tested for equality but never ordered.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Decimal(Decimal),
    Document(Document),
    Enum(ValueEnum),
    Float32(f32),
    Float64(f64),
    Int(i64),
    IntBig(BigInt),
    List(Vec<Self>),
    /// Insertion-ordered key/value entries.
    Map(Vec<(Self, Self)>),
    Null,
    Text(String),
    Timestamp(OffsetDateTime),
    Uint(u64),
}

impl Value {
    ///
    /// CONSTRUCTION
    ///

    pub fn from_list<T: FieldValue>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(|item| item.to_value()).collect())
    }

    #[must_use]
    pub fn from_entries(entries: Vec<(Self, Self)>) -> Self {
        Self::Map(entries)
    }

    ///
    /// TYPES
    ///

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Decimal(_)
                | Self::Float32(_)
                | Self::Float64(_)
                | Self::Int(_)
                | Self::IntBig(_)
                | Self::Uint(_)
        )
    }

    /// Returns true when the value has a native ordering and may take part in
    /// range comparisons.
    #[must_use]
    pub const fn is_comparable(&self) -> bool {
        self.is_numeric()
            || matches!(
                self,
                Self::Bool(_) | Self::Enum(_) | Self::Text(_) | Self::Timestamp(_)
            )
    }

    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::Document(_) | Self::List(_) | Self::Map(_))
    }

    /// Stable lowercase label used in diagnostics.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Decimal(_) => "decimal",
            Self::Document(_) => "document",
            Self::Enum(_) => "enum",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::Int(_) => "int",
            Self::IntBig(_) => "int_big",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Uint(_) => "uint",
        }
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Self::Text(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&[Self]> {
        if let Self::List(items) = self {
            Some(items.as_slice())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_document(&self) -> Option<&Document> {
        if let Self::Document(doc) = self {
            Some(doc)
        } else {
            None
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Document(doc) => write!(f, "{doc}"),
            Self::Enum(v) => write!(f, "{}::{}", v.path, v.variant),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::IntBig(v) => write!(f, "{v}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Self::Null => write!(f, "null"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Timestamp(ts) => write!(f, "{}", ts.unix_timestamp_nanos() / 1_000_000),
            Self::Uint(v) => write!(f, "{v}"),
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Self::Document(doc)
    }
}

///
/// ValueEnum
///
/// Enum constant identified by its enum path and variant name.
/// Values from different enum paths never compare.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ValueEnum {
    pub path: String,
    pub variant: String,
    pub ordinal: u32,
}

impl ValueEnum {
    pub fn new(path: impl Into<String>, variant: impl Into<String>, ordinal: u32) -> Self {
        Self {
            path: path.into(),
            variant: variant.into(),
            ordinal,
        }
    }
}
