use crate::{
    config::QueryConfig,
    db::{
        document::{Document, RecordId},
        filter::{EvalContext, Filter},
        index::{FieldIndexState, IndexCatalog, IndexKind, OrderedIndex, RecordIdSet},
        plan::{
            IndexScan, QueryPlan, ScanAccess,
            planner::{conjoin, plan_query, require_text_indexes},
        },
        source::RecordSource,
        trace::{QueryTraceEvent, QueryTraceSink, emit},
    },
    error::{ErrorOrigin, QueryError},
};

///
/// QueryExecutor
///
/// Runs filters against one collection: plans, reads the index scans, then
/// streams the candidate records that pass the residual filter.
///

#[derive(Clone, Copy)]
pub struct QueryExecutor<'a> {
    source: &'a dyn RecordSource,
    catalog: &'a dyn IndexCatalog,
    config: QueryConfig,
    trace: Option<&'a dyn QueryTraceSink>,
}

impl<'a> QueryExecutor<'a> {
    #[must_use]
    pub fn new(source: &'a dyn RecordSource, catalog: &'a dyn IndexCatalog) -> Self {
        Self {
            source,
            catalog,
            config: QueryConfig::default(),
            trace: None,
        }
    }

    #[must_use]
    pub const fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn with_trace(mut self, trace: &'a dyn QueryTraceSink) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn plan(&self, filter: &Filter) -> Result<QueryPlan, QueryError> {
        let plan = plan_query(filter, self.catalog, &self.config)?;
        emit(
            self.trace,
            QueryTraceEvent::Planned {
                scans: plan.scans.len(),
                residual: plan.residual.is_some(),
            },
        );

        Ok(plan)
    }

    /// Identifiers of every matching record, in candidate order.
    pub fn find(&self, filter: &Filter) -> Result<Vec<RecordId>, QueryError> {
        self.stream(filter)?.collect()
    }

    pub fn stream(&self, filter: &Filter) -> Result<FilteredRecords<'a>, QueryError> {
        let plan = self.plan(filter)?;
        self.execute(&plan)
    }

    /// Run the index scans of a plan and prepare the residual stream.
    ///
    /// Scans whose index has been dropped since planning are answered by the
    /// residual filter instead.
    pub fn execute(&self, plan: &QueryPlan) -> Result<FilteredRecords<'a>, QueryError> {
        let mut candidates: Option<RecordIdSet> = None;
        let mut deferred = Vec::new();

        for (position, scan) in plan.scans.iter().enumerate() {
            let Some(ids) = self.run_scan(scan)? else {
                deferred.push(scan.filter.clone());
                continue;
            };
            let narrowed = match candidates.take() {
                Some(current) => current.intersect(&ids),
                None => ids,
            };
            let exhausted = narrowed.is_empty();
            candidates = Some(narrowed);
            if exhausted {
                // skipped scans still need their text indexes
                for rest in &plan.scans[position + 1..] {
                    require_text_indexes(&rest.filter, self.catalog)?;
                }
                break;
            }
        }

        let residual = if deferred.is_empty() {
            plan.residual.clone()
        } else {
            deferred.extend(plan.residual.clone());
            let residual = conjoin(deferred);
            if let Some(residual) = &residual {
                require_text_indexes(residual, self.catalog)?;
            }
            residual
        };

        let source = self.source;
        let records: Box<dyn Iterator<Item = (RecordId, &'a Document)> + 'a> = match candidates {
            Some(ids) => Box::new(
                ids.into_iter()
                    .filter_map(move |id| source.get(id).map(|doc| (id, doc))),
            ),
            None => source.scan(),
        };

        let mut ctx = EvalContext::new(self.config).with_indexes(self.catalog);
        if let Some(trace) = self.trace {
            ctx = ctx.with_trace(trace);
        }

        Ok(FilteredRecords {
            records,
            residual,
            ctx,
            scanned: 0,
            matched: 0,
            finished: false,
        })
    }

    // None when the index behind the scan is gone.
    fn run_scan(&self, scan: &IndexScan) -> Result<Option<RecordIdSet>, QueryError> {
        let ids = match &scan.access {
            ScanAccess::ById(id) => self
                .source
                .get(*id)
                .map(|_| *id)
                .into_iter()
                .collect(),
            ScanAccess::Ordered { .. } | ScanAccess::FullText => {
                let Some(ids) = self.lookup(scan)? else {
                    emit(
                        self.trace,
                        QueryTraceEvent::IndexDropped {
                            field: scan.field().unwrap_or_default(),
                        },
                    );
                    return Ok(None);
                };
                ids
            }
            ScanAccess::Union(children) => {
                let mut out = RecordIdSet::new();
                for child in children {
                    let Some(ids) = self.run_scan(child)? else {
                        return Ok(None);
                    };
                    out.extend(ids);
                }
                out
            }
            ScanAccess::Intersection(children) => {
                let mut out: Option<RecordIdSet> = None;
                for child in children {
                    let Some(ids) = self.run_scan(child)? else {
                        return Ok(None);
                    };
                    out = Some(match out {
                        Some(current) => current.intersect(&ids),
                        None => ids,
                    });
                }
                out.unwrap_or_default()
            }
        };

        Ok(Some(ids))
    }

    // Single-index lookup against the live catalog.
    fn lookup(&self, scan: &IndexScan) -> Result<Option<RecordIdSet>, QueryError> {
        let Some(field) = scan.field() else {
            return Ok(None);
        };

        let (ids, kind) = match (self.catalog.field_index(field), &scan.filter) {
            (FieldIndexState::Ordered(index), Filter::Compare(c)) => {
                if c.op.is_range() {
                    reject_unorderable_keys(index)?;
                }
                (c.lookup(index)?, IndexKind::Ordered)
            }
            (FieldIndexState::Ordered(index), Filter::In(m)) => {
                reject_unorderable_keys(index)?;
                (m.lookup(index)?, IndexKind::Ordered)
            }
            (FieldIndexState::FullText(index), Filter::Text(t)) => {
                (t.lookup(index)?, IndexKind::FullText)
            }
            _ => return Ok(None),
        };
        emit(
            self.trace,
            QueryTraceEvent::IndexLookup {
                field,
                kind,
                matched: ids.len(),
            },
        );

        Ok(Some(ids))
    }
}

// A record holding a composite value fails the query the same way a scan
// would when it reaches that record.
fn reject_unorderable_keys(index: &dyn OrderedIndex) -> Result<(), QueryError> {
    match index.unorderable_key() {
        Some(key) => Err(QueryError::not_comparable(ErrorOrigin::Index, key)),
        None => Ok(()),
    }
}

///
/// FilteredRecords
///
/// Lazy stream of matching record identifiers. The first evaluation error is
/// yielded once and ends the stream.
///

pub struct FilteredRecords<'a> {
    records: Box<dyn Iterator<Item = (RecordId, &'a Document)> + 'a>,
    residual: Option<Filter>,
    ctx: EvalContext<'a>,
    scanned: u64,
    matched: u64,
    finished: bool,
}

impl FilteredRecords<'_> {
    /// Records visited so far.
    #[must_use]
    pub const fn scanned(&self) -> u64 {
        self.scanned
    }

    #[must_use]
    pub const fn matched(&self) -> u64 {
        self.matched
    }

    fn finish(&mut self) {
        self.finished = true;
        emit(
            self.ctx.trace(),
            QueryTraceEvent::ScanFinished {
                scanned: self.scanned,
                matched: self.matched,
            },
        );
    }
}

impl Iterator for FilteredRecords<'_> {
    type Item = Result<RecordId, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let Some((id, doc)) = self.records.next() else {
                self.finish();
                return None;
            };
            self.scanned += 1;

            let keep = match &self.residual {
                Some(filter) => filter.apply_in(&self.ctx, id, doc),
                None => Ok(true),
            };
            match keep {
                Ok(true) => {
                    self.matched += 1;
                    return Some(Ok(id));
                }
                Ok(false) => {}
                Err(err) => {
                    self.finish();
                    return Some(Err(err));
                }
            }
        }
    }
}
