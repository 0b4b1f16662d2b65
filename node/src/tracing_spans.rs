//! Span constructors shared by the validator and the HTTP layer, so traces
//! carry the same field names everywhere.

use sigrelay_types::{Address, RecordKind};
use tracing::{info_span, Span};

/// Span covering one submission through the whole pipeline.
pub fn intent_span(kind: RecordKind, address: &Address) -> Span {
    info_span!("intent", kind = kind.as_str(), address = %address)
}

/// Span covering a read-only eligibility probe.
pub fn probe_span(check: &'static str, address: &Address) -> Span {
    info_span!("probe", check, address = %address)
}
