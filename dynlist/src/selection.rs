//! Selection policy and the selected-item set.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::items::ItemRef;

/// How many items may be selected and how clicks toggle them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Nothing can be selected.
    None,
    /// At most one item; clicking the selected item keeps it selected.
    #[default]
    Single,
    /// At most one item; clicking the selected item deselects it.
    SingleToggle,
    /// Any number of items.
    Multi,
}

impl SelectionMode {
    pub fn allows_selection(self) -> bool {
        self != SelectionMode::None
    }

    pub fn is_single(self) -> bool {
        matches!(self, SelectionMode::Single | SelectionMode::SingleToggle)
    }
}

/// What caused a selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectInfo {
    /// Changed through the API.
    Direct,
    OnMouseClick,
    OnNavigation,
    OnKeyPress,
}

/// Selected items, in selection order.
pub struct SelectionSet<T> {
    items: IndexSet<ItemRef<T>>,
}

impl<T> SelectionSet<T> {
    pub fn new() -> Self {
        Self {
            items: IndexSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &ItemRef<T>) -> bool {
        self.items.contains(item)
    }

    pub fn first(&self) -> Option<&ItemRef<T>> {
        self.items.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemRef<T>> {
        self.items.iter()
    }

    /// Select or deselect `item` under `mode`. Returns whether the set changed.
    ///
    /// Single-item modes drop any previous selection before adding, so the
    /// set never holds more than one item for them.
    pub fn set(&mut self, item: &ItemRef<T>, selected: bool, mode: SelectionMode) -> bool {
        if !selected {
            return self.items.shift_remove(item);
        }
        match mode {
            SelectionMode::None => false,
            SelectionMode::Multi => self.items.insert(item.clone()),
            SelectionMode::Single | SelectionMode::SingleToggle => {
                if self.items.len() == 1 && self.items.contains(item) {
                    return false;
                }
                self.items.clear();
                self.items.insert(item.clone());
                true
            }
        }
    }

    /// Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        let changed = !self.items.is_empty();
        self.items.clear();
        changed
    }

    /// Drop items the predicate rejects. Returns whether the set changed.
    pub fn retain(&mut self, mut keep: impl FnMut(&ItemRef<T>) -> bool) -> bool {
        let before = self.items.len();
        self.items.retain(|item| keep(item));
        self.items.len() != before
    }

    /// Shrink the selection to what `mode` allows, keeping the earliest pick.
    pub fn conform_to(&mut self, mode: SelectionMode) -> bool {
        match mode {
            SelectionMode::None => self.clear(),
            SelectionMode::Multi => false,
            SelectionMode::Single | SelectionMode::SingleToggle => {
                if self.items.len() > 1 {
                    self.items.truncate(1);
                    true
                } else {
                    false
                }
            }
        }
    }
}

impl<T> Default for SelectionSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
