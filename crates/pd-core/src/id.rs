use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter for item handles.
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// A non-owning handle to an item in a [`Scene`](crate::model::Scene).
///
/// 8 bytes, Copy, Eq, Hash in O(1). Handles are never reused, so a handle
/// to a removed item simply resolves to `None` on lookup.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Allocate a fresh, never-before-seen handle.
    pub fn fresh() -> Self {
        ItemId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value (stable for the lifetime of the process).
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
