//! Item references and the ordered item collection.
//!
//! Items are compared by identity, never by value: two equal payloads are
//! still two different items.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexSet;

/// Shared, identity-compared reference to application data.
pub struct ItemRef<T>(Rc<T>);

impl<T> ItemRef<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(value))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for ItemRef<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> PartialEq for ItemRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for ItemRef<T> {}

impl<T> Hash for ItemRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state);
    }
}

impl<T> std::ops::Deref for ItemRef<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for ItemRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ItemRef").field(&*self.0).finish()
    }
}

impl<T> From<Rc<T>> for ItemRef<T> {
    fn from(rc: Rc<T>) -> Self {
        Self(rc)
    }
}

/// Items added to and removed from a collection by one mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDelta<T> {
    pub added: Vec<ItemRef<T>>,
    pub removed: Vec<ItemRef<T>>,
}

impl<T> ItemDelta<T> {
    pub fn added(item: ItemRef<T>) -> Self {
        Self {
            added: vec![item],
            removed: Vec::new(),
        }
    }

    pub fn removed(items: Vec<ItemRef<T>>) -> Self {
        Self {
            added: Vec::new(),
            removed: items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Ordered, duplicate-free sequence of items.
pub struct ItemCollection<T> {
    items: IndexSet<ItemRef<T>>,
}

impl<T> ItemCollection<T> {
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

    pub fn get(&self, index: usize) -> Option<&ItemRef<T>> {
        self.items.get_index(index)
    }

    pub fn index_of(&self, item: &ItemRef<T>) -> Option<usize> {
        self.items.get_index_of(item)
    }

    pub fn contains(&self, item: &ItemRef<T>) -> bool {
        self.items.contains(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemRef<T>> {
        self.items.iter()
    }

    /// Append an item. Returns the delta, or `Err(index)` of the existing
    /// occurrence when the item is already present.
    pub fn push(&mut self, item: ItemRef<T>) -> Result<ItemDelta<T>, usize> {
        let (index, inserted) = self.items.insert_full(item.clone());
        if inserted {
            Ok(ItemDelta::added(item))
        } else {
            Err(index)
        }
    }

    /// Remove an item, keeping the order of the rest.
    pub fn remove(&mut self, item: &ItemRef<T>) -> Option<ItemDelta<T>> {
        self.items
            .shift_remove_full(item)
            .map(|(_, removed)| ItemDelta::removed(vec![removed]))
    }

    pub fn clear(&mut self) -> ItemDelta<T> {
        let removed: Vec<_> = self.items.drain(..).collect();
        ItemDelta::removed(removed)
    }

    /// Replace the whole collection. Items present before and after are
    /// reported in neither list.
    pub fn replace_all(&mut self, items: IndexSet<ItemRef<T>>) -> ItemDelta<T> {
        let removed = self
            .items
            .iter()
            .filter(|item| !items.contains(*item))
            .cloned()
            .collect();
        let added = items
            .iter()
            .filter(|item| !self.items.contains(*item))
            .cloned()
            .collect();
        self.items = items;
        ItemDelta { added, removed }
    }
}

impl<T> Default for ItemCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}
