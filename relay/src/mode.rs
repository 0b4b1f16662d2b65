use std::fmt;
use std::sync::Arc;

use crate::RelayDispatcher;

/// What happens to an intent after it has been persisted.
#[derive(Clone)]
pub enum RelayMode {
    /// Nothing; an out-of-band worker drains the pending list.
    Deferred,
    /// Dispatch immediately and mark the record executed on success.
    Synchronous(Arc<dyn RelayDispatcher>),
}

impl RelayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deferred => "deferred",
            Self::Synchronous(_) => "synchronous",
        }
    }
}

impl fmt::Debug for RelayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
