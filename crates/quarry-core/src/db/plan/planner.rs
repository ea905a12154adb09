//! Semantic planning from filters to index scans.

use crate::{
    config::QueryConfig,
    db::{
        document::{DOC_ID, RecordId},
        filter::{CompareOp, Filter},
        index::{IndexCatalog, IndexDescriptor, IndexKind},
        plan::{IndexScan, QueryPlan, ScanAccess},
    },
    error::{ErrorOrigin, QueryError},
    traits::FieldValue,
    value::Value,
};
use std::collections::BTreeMap;

/// Split a filter into index scans and a residual filter.
///
/// Only the top-level conjunction is decomposed. A conjunct becomes a scan
/// when an index can answer it wholesale; everything else stays in the
/// residual, evaluated per record. The filter is validated first, so a
/// malformed tree fails here rather than during the scan.
pub fn plan_query(
    filter: &Filter,
    catalog: &dyn IndexCatalog,
    config: &QueryConfig,
) -> Result<QueryPlan, QueryError> {
    filter.validate_with(config)?;

    let plan = if config.planner_enabled {
        plan_conjunction(filter, catalog)
    } else {
        QueryPlan::full_scan(filter)
    };
    if let Some(residual) = &plan.residual {
        require_text_indexes(residual, catalog)?;
    }

    tracing::debug!(
        scans = plan.scans.len(),
        residual = plan.residual.is_some(),
        "query planned"
    );

    Ok(plan)
}

fn plan_conjunction(filter: &Filter, catalog: &dyn IndexCatalog) -> QueryPlan {
    let descriptors: BTreeMap<String, IndexDescriptor> = catalog
        .descriptors()
        .into_iter()
        .map(|descriptor| (descriptor.field.clone(), descriptor))
        .collect();

    let mut conjuncts = Vec::new();
    flatten_and(filter, &mut conjuncts);

    let mut scans = Vec::new();
    let mut residual = Vec::new();
    for conjunct in conjuncts {
        match plan_scan(conjunct, &descriptors) {
            Some(scan) => scans.push(scan),
            None => residual.push(conjunct.clone()),
        }
    }
    // stable: equal priorities keep filter order
    scans.sort_by_key(IndexScan::priority);

    QueryPlan {
        scans,
        residual: conjoin(residual),
    }
}

fn flatten_and<'f>(filter: &'f Filter, out: &mut Vec<&'f Filter>) {
    match filter {
        Filter::All => {}
        Filter::And(children) => {
            for child in children {
                flatten_and(child, out);
            }
        }
        leaf => out.push(leaf),
    }
}

// Index access answering the whole filter, if any.
fn plan_scan(filter: &Filter, descriptors: &BTreeMap<String, IndexDescriptor>) -> Option<IndexScan> {
    let access = match filter {
        Filter::Compare(c) if c.op == CompareOp::Eq && c.field == DOC_ID => {
            ScanAccess::ById(plan_id(c.value())?)
        }
        Filter::Compare(c) => plan_ordered(&c.field, descriptors)?,
        Filter::In(m) => plan_ordered(&m.field, descriptors)?,
        Filter::Text(t) => match descriptors.get(&t.field) {
            Some(descriptor) if descriptor.kind == IndexKind::FullText => ScanAccess::FullText,
            _ => return None,
        },
        Filter::Or(children) if !children.is_empty() => {
            ScanAccess::Union(plan_all(children, descriptors)?)
        }
        Filter::And(children) if !children.is_empty() => {
            ScanAccess::Intersection(plan_all(children, descriptors)?)
        }
        _ => return None,
    };

    Some(IndexScan {
        filter: filter.clone(),
        access,
    })
}

// Identifiers match by string form, so "042" never finds record 42.
fn plan_id(value: &Value) -> Option<RecordId> {
    RecordId::from_value(value).filter(|id| id.to_string() == value.to_string())
}

fn plan_ordered(
    field: &str,
    descriptors: &BTreeMap<String, IndexDescriptor>,
) -> Option<ScanAccess> {
    match descriptors.get(field) {
        Some(descriptor) if descriptor.kind == IndexKind::Ordered => Some(ScanAccess::Ordered {
            unique: descriptor.unique,
        }),
        _ => None,
    }
}

// Every child must be answerable, otherwise the group is not.
fn plan_all(
    children: &[Filter],
    descriptors: &BTreeMap<String, IndexDescriptor>,
) -> Option<Vec<IndexScan>> {
    children
        .iter()
        .map(|child| plan_scan(child, descriptors))
        .collect()
}

/// Combine residual conjuncts back into one filter.
pub(crate) fn conjoin(mut filters: Vec<Filter>) -> Option<Filter> {
    match filters.len() {
        0 => None,
        1 => filters.pop(),
        _ => Some(Filter::And(filters)),
    }
}

/// Text search has no direct evaluation; every text leaf left for per-record
/// evaluation must find a full-text index on its field.
pub(crate) fn require_text_indexes(
    filter: &Filter,
    catalog: &dyn IndexCatalog,
) -> Result<(), QueryError> {
    match filter {
        Filter::Text(t) if catalog.index_kind(&t.field) != Some(IndexKind::FullText) => {
            Err(QueryError::unsupported(
                ErrorOrigin::Planner,
                format!("{} is not full-text indexed", t.field),
            ))
        }
        Filter::And(children) | Filter::Or(children) => children
            .iter()
            .try_for_each(|child| require_text_indexes(child, catalog)),
        Filter::Not(inner) => require_text_indexes(inner, catalog),
        _ => Ok(()),
    }
}
