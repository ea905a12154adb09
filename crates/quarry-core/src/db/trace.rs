//! Query tracing boundary.
//!
//! Tracing is optional, injected by the caller, and must not affect
//! evaluation results. Every event is also logged at debug level.

use crate::db::index::IndexKind;

///
/// QueryTraceSink
///

pub trait QueryTraceSink: Send + Sync {
    fn on_event(&self, event: QueryTraceEvent<'_>);
}

///
/// QueryTraceEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryTraceEvent<'a> {
    /// A leaf was answered by an index lookup.
    IndexLookup {
        field: &'a str,
        kind: IndexKind,
        matched: usize,
    },
    /// An equality leaf on a full-text indexed field was evaluated directly.
    IndexDegraded { field: &'a str, kind: IndexKind },
    /// A planned scan found its index gone and moved to the residual filter.
    IndexDropped { field: &'a str },
    Planned {
        scans: usize,
        residual: bool,
    },
    ScanFinished {
        scanned: u64,
        matched: u64,
    },
}

pub(crate) fn emit(sink: Option<&dyn QueryTraceSink>, event: QueryTraceEvent<'_>) {
    tracing::debug!(?event, "query trace");

    if let Some(sink) = sink {
        sink.on_event(event);
    }
}
