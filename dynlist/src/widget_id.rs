//! Widget identity.
//!
//! Row widgets are recycled, so a `WidgetId` names a visual slot rather than
//! the item it happens to show. The item is resolved through the owning
//! table's binding side-table.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique widget IDs.
static WIDGET_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a widget (a table or one of its rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

impl WidgetId {
    /// Create a new unique widget ID.
    ///
    /// Each call returns a different ID.
    pub fn new() -> Self {
        Self(WIDGET_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Create a widget ID from an existing value.
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw numeric value.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for WidgetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = WidgetId::new();
        let b = WidgetId::new();
        assert_ne!(a, b);
        assert_eq!(WidgetId::from_raw(a.raw()), a);
    }
}
