//! Query planning and execution over a collection.
//!
//! Planning splits the top-level conjunction of a filter into index scans
//! and a residual filter. Execution intersects the scan results and
//! evaluates the residual against each candidate record.

mod executor;
mod planner;

#[cfg(test)]
mod tests;

pub use executor::{FilteredRecords, QueryExecutor};
pub use planner::plan_query;

use crate::db::{document::RecordId, filter::Filter};
use std::fmt;

///
/// QueryPlan
///
/// Index scans to run (in order) plus the filter left for per-record
/// evaluation. A plan without scans is a collection scan.
///

#[derive(Clone, Debug, PartialEq)]
pub struct QueryPlan {
    pub scans: Vec<IndexScan>,
    pub residual: Option<Filter>,
}

impl QueryPlan {
    /// Plan that visits every record and evaluates the whole filter.
    #[must_use]
    pub fn full_scan(filter: &Filter) -> Self {
        Self {
            scans: Vec::new(),
            residual: match filter {
                Filter::All => None,
                filter => Some(filter.clone()),
            },
        }
    }

    #[must_use]
    pub const fn is_full_scan(&self) -> bool {
        self.scans.is_empty()
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scans.is_empty() {
            write!(f, "FullScan")?;
        }
        for (i, scan) in self.scans.iter().enumerate() {
            if i > 0 {
                write!(f, " & ")?;
            }
            write!(f, "{scan}")?;
        }
        if let Some(residual) = &self.residual {
            write!(f, " | {residual}")?;
        }

        Ok(())
    }
}

///
/// IndexScan
///
/// One filter answered wholesale by index access.
///

#[derive(Clone, Debug, PartialEq)]
pub struct IndexScan {
    pub filter: Filter,
    pub access: ScanAccess,
}

impl IndexScan {
    // Cheapest scans run first so an empty intersection stops early.
    pub(crate) const fn priority(&self) -> u8 {
        match self.access {
            ScanAccess::ById(_) => 0,
            ScanAccess::Ordered { unique: true } => 1,
            ScanAccess::Ordered { unique: false } => 2,
            ScanAccess::FullText => 3,
            ScanAccess::Union(_) | ScanAccess::Intersection(_) => 4,
        }
    }

    /// Field whose index this scan reads, when it reads exactly one.
    pub(crate) fn field(&self) -> Option<&str> {
        match self.access {
            ScanAccess::Ordered { .. } | ScanAccess::FullText => self.filter.field(),
            ScanAccess::ById(_) | ScanAccess::Union(_) | ScanAccess::Intersection(_) => None,
        }
    }
}

impl fmt::Display for IndexScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.access {
            ScanAccess::ById(id) => write!(f, "ById({id})"),
            ScanAccess::Ordered { unique: true } => write!(f, "UniqueIndex{}", self.filter),
            ScanAccess::Ordered { unique: false } => write!(f, "Index{}", self.filter),
            ScanAccess::FullText => write!(f, "TextIndex{}", self.filter),
            ScanAccess::Union(children) => write_group(f, "Union", children),
            ScanAccess::Intersection(children) => write_group(f, "Intersection", children),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, label: &str, children: &[IndexScan]) -> fmt::Result {
    write!(f, "{label}[")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, "]")
}

///
/// ScanAccess
///

#[derive(Clone, Debug, PartialEq)]
pub enum ScanAccess {
    /// Primary key lookup for `_id == value`.
    ById(RecordId),
    /// Ordered index lookup for a comparison or membership leaf.
    Ordered { unique: bool },
    /// Full-text index search for a text leaf.
    FullText,
    /// Union of branch scans for an `Or` whose every branch is indexable.
    Union(Vec<IndexScan>),
    /// Intersection of child scans for an `And` nested under an `Or`.
    Intersection(Vec<IndexScan>),
}
