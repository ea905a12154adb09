use crate::{
    db::filter::convert::{Operand, ValueSet},
    error::QueryError,
    value::Value,
};
use std::{
    cmp::Ordering,
    fmt,
    ops::{BitAnd, BitOr, Not},
};

///
/// Filter AST
///
/// Immutable filter tree built by callers and either evaluated record by
/// record or decomposed by the planner. Evaluation never mutates a filter
/// beyond its set-once object-context flag and cached operand conversions.
///

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }

    /// Range operators order values; `Eq` only tests equality.
    #[must_use]
    pub const fn is_range(self) -> bool {
        !matches!(self, Self::Eq)
    }

    /// Whether `field <op> operand` holds given `field.cmp(operand)`.
    #[must_use]
    pub const fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => matches!(ordering, Ordering::Equal),
            Self::Gt => matches!(ordering, Ordering::Greater),
            Self::Gte => matches!(ordering, Ordering::Greater | Ordering::Equal),
            Self::Lt => matches!(ordering, Ordering::Less),
            Self::Lte => matches!(ordering, Ordering::Less | Ordering::Equal),
        }
    }
}

///
/// ComparisonFilter
///

#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonFilter {
    pub field: String,
    pub op: CompareOp,
    pub(crate) operand: Operand,
}

impl ComparisonFilter {
    pub fn new(field: impl Into<String>, op: CompareOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            operand: Operand::new(value),
        }
    }

    /// Operand as supplied by the caller.
    #[must_use]
    pub const fn value(&self) -> &Value {
        self.operand.raw()
    }
}

///
/// MembershipFilter
///
/// Shared payload of `In` and `NotIn`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct MembershipFilter {
    pub field: String,
    pub(crate) values: ValueSet,
}

impl MembershipFilter {
    pub fn new(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            values: ValueSet::new(values),
        }
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        self.values.raw()
    }
}

///
/// RegexFilter
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegexFilter {
    pub field: String,
    pub pattern: String,
}

///
/// TextFilter
///
/// Full-text search; only answerable through a full-text index.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextFilter {
    pub field: String,
    pub query: String,
}

///
/// ElementMatchFilter
///
/// Matches when at least one element of a list field satisfies `filter`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ElementMatchFilter {
    pub field: String,
    pub filter: Box<Filter>,
}

///
/// Filter
///

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    All,
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare(ComparisonFilter),
    In(MembershipFilter),
    NotIn(MembershipFilter),
    Regex(RegexFilter),
    Text(TextFilter),
    ElementMatch(ElementMatchFilter),
}

impl Filter {
    #[must_use]
    pub const fn all_of(filters: Vec<Self>) -> Self {
        Self::And(filters)
    }

    #[must_use]
    pub const fn any_of(filters: Vec<Self>) -> Self {
        Self::Or(filters)
    }

    /// Conjunction, flattening nested `And` groups while keeping order.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let mut children = Vec::new();
        for filter in [self, other] {
            match filter {
                Self::And(inner) => children.extend(inner),
                filter => children.push(filter),
            }
        }

        Self::And(children)
    }

    /// Disjunction, flattening nested `Or` groups while keeping order.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        let mut children = Vec::new();
        for filter in [self, other] {
            match filter {
                Self::Or(inner) => children.extend(inner),
                filter => children.push(filter),
            }
        }

        Self::Or(children)
    }

    /// Field addressed by a leaf, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Compare(c) => Some(&c.field),
            Self::In(m) | Self::NotIn(m) => Some(&m.field),
            Self::Regex(r) => Some(&r.field),
            Self::Text(t) => Some(&t.field),
            Self::ElementMatch(e) => Some(&e.field),
            Self::All | Self::And(_) | Self::Or(_) | Self::Not(_) => None,
        }
    }

    /// Mark every leaf as evaluating against object-mapped records (or not).
    ///
    /// The flag is set once per leaf; binding a leaf to the other value later,
    /// or after it has already been evaluated in plain context, fails.
    pub fn bind_object_context(&self, enabled: bool) -> Result<(), QueryError> {
        match self {
            Self::All | Self::Regex(_) | Self::Text(_) => Ok(()),
            Self::And(children) | Self::Or(children) => children
                .iter()
                .try_for_each(|child| child.bind_object_context(enabled)),
            Self::Not(inner) => inner.bind_object_context(enabled),
            Self::Compare(c) => c.operand.bind(enabled, &c.field),
            Self::In(m) | Self::NotIn(m) => m.values.bind(enabled, &m.field),
            Self::ElementMatch(e) => e.filter.bind_object_context(enabled),
        }
    }
}

impl BitAnd for Filter {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitAnd for &Filter {
    type Output = Filter;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.clone().and(rhs.clone())
    }
}

impl BitOr for Filter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl BitOr for &Filter {
    type Output = Filter;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.clone().or(rhs.clone())
    }
}

impl Not for Filter {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "ALL"),
            Self::And(children) => write_group(f, children, " && "),
            Self::Or(children) => write_group(f, children, " || "),
            Self::Not(inner) => write!(f, "!{inner}"),
            Self::Compare(c) => write!(f, "({} {} {})", c.field, c.op.symbol(), c.value()),
            Self::In(m) => write!(f, "({} in {})", m.field, Value::List(m.values().to_vec())),
            Self::NotIn(m) => write!(
                f,
                "({} not in {})",
                m.field,
                Value::List(m.values().to_vec())
            ),
            Self::Regex(r) => write!(f, "({} =~ /{}/)", r.field, r.pattern),
            Self::Text(t) => write!(f, "({} : {})", t.field, t.query),
            Self::ElementMatch(e) => write!(f, "elemMatch({} : {})", e.field, e.filter),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, children: &[Filter], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}
