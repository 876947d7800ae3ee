//! Events a list view raises for its owner.
//!
//! Events are queued while input and ticks are processed and handed out by
//! [`crate::ListView::drain_events`]. Within one tick, item and selection
//! events come before the scroll events of that tick.

use crate::items::ItemRef;
use crate::primitives::Point;
use crate::selection::SelectInfo;
use crate::widget_id::WidgetId;

pub enum ListEvent<T> {
    ItemsChanged {
        added: Vec<ItemRef<T>>,
        removed: Vec<ItemRef<T>>,
    },
    ItemClicked(ItemRef<T>),
    ItemDoubleClicked(ItemRef<T>),
    /// `first` is the first selected item, if any remain selected.
    SelectionChanged {
        first: Option<ItemRef<T>>,
        info: SelectInfo,
    },
    ItemScrolledIntoView {
        item: ItemRef<T>,
        widget: WidgetId,
    },
    Scrolled {
        offset: f32,
        distance_remaining: f32,
    },
    ItemHoverChanged {
        item: ItemRef<T>,
        hovered: bool,
    },
    /// A row was bound to an item it was not showing before.
    EntryInitialized {
        item: ItemRef<T>,
        widget: WidgetId,
    },
    ItemRightClicked {
        item: ItemRef<T>,
        position: Point,
    },
    /// Right click that was not a drag-scroll and no row claimed.
    ContextMenuRequested {
        position: Point,
    },
    FinishedScrolling,
}

// Derives would require `T: Clone`/`T: Debug`; items are shared handles.
impl<T> Clone for ListEvent<T> {
    fn clone(&self) -> Self {
        match self {
            Self::ItemsChanged { added, removed } => Self::ItemsChanged {
                added: added.clone(),
                removed: removed.clone(),
            },
            Self::ItemClicked(item) => Self::ItemClicked(item.clone()),
            Self::ItemDoubleClicked(item) => Self::ItemDoubleClicked(item.clone()),
            Self::SelectionChanged { first, info } => Self::SelectionChanged {
                first: first.clone(),
                info: *info,
            },
            Self::ItemScrolledIntoView { item, widget } => Self::ItemScrolledIntoView {
                item: item.clone(),
                widget: *widget,
            },
            Self::Scrolled {
                offset,
                distance_remaining,
            } => Self::Scrolled {
                offset: *offset,
                distance_remaining: *distance_remaining,
            },
            Self::ItemHoverChanged { item, hovered } => Self::ItemHoverChanged {
                item: item.clone(),
                hovered: *hovered,
            },
            Self::EntryInitialized { item, widget } => Self::EntryInitialized {
                item: item.clone(),
                widget: *widget,
            },
            Self::ItemRightClicked { item, position } => Self::ItemRightClicked {
                item: item.clone(),
                position: *position,
            },
            Self::ContextMenuRequested { position } => Self::ContextMenuRequested {
                position: *position,
            },
            Self::FinishedScrolling => Self::FinishedScrolling,
        }
    }
}

impl<T> std::fmt::Debug for ListEvent<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemsChanged { added, removed } => f
                .debug_struct("ItemsChanged")
                .field("added", &added.len())
                .field("removed", &removed.len())
                .finish(),
            Self::ItemClicked(_) => f.write_str("ItemClicked"),
            Self::ItemDoubleClicked(_) => f.write_str("ItemDoubleClicked"),
            Self::SelectionChanged { first, info } => f
                .debug_struct("SelectionChanged")
                .field("has_first", &first.is_some())
                .field("info", info)
                .finish(),
            Self::ItemScrolledIntoView { widget, .. } => f
                .debug_struct("ItemScrolledIntoView")
                .field("widget", widget)
                .finish(),
            Self::Scrolled {
                offset,
                distance_remaining,
            } => f
                .debug_struct("Scrolled")
                .field("offset", offset)
                .field("distance_remaining", distance_remaining)
                .finish(),
            Self::ItemHoverChanged { hovered, .. } => f
                .debug_struct("ItemHoverChanged")
                .field("hovered", hovered)
                .finish(),
            Self::EntryInitialized { widget, .. } => f
                .debug_struct("EntryInitialized")
                .field("widget", widget)
                .finish(),
            Self::ItemRightClicked { position, .. } => f
                .debug_struct("ItemRightClicked")
                .field("position", position)
                .finish(),
            Self::ContextMenuRequested { position } => f
                .debug_struct("ContextMenuRequested")
                .field("position", position)
                .finish(),
            Self::FinishedScrolling => f.write_str("FinishedScrolling"),
        }
    }
}
