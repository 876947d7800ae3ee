//! Typed list view.
//!
//! Binds the [`TableViewBase`] engine to a collection of `ItemRef<T>`:
//! measures items, binds recycled rows to them through a side table,
//! holds the selection, routes pointer and keyboard input and exposes the
//! application-facing API.
//!
//! Row bindings are the only link from a row widget to its item. A binding
//! is always written whole (`item` and `index` together) and is purged as
//! soon as its item leaves the collection, even though the row itself stays
//! in the panel until the next generation pass recycles it.

use std::collections::HashMap;
use std::ops::Range;

use indexmap::IndexSet;

use crate::config::{ItemLayout, TableViewConfig};
use crate::error::ListError;
use crate::events::ListEvent;
use crate::input::{CaptureRequest, CaptureState, Key, KeyEvent, MouseButton, PointerEvent, Reply};
use crate::items::{ItemCollection, ItemDelta, ItemRef};
use crate::lines::LineMetrics;
use crate::panel::{ListPanel, PanelChild};
use crate::primitives::{Orientation, PanelGeometry, Point, TableViewDimensions};
use crate::row::{ListEntry, OwnerTable, RowPool, TableRow};
use crate::selection::{SelectInfo, SelectionMode, SelectionSet};
use crate::table_view_base::{
    ScrollIntoView, ScrollIntoViewResult, TableViewBase, TableViewHost, TableViewNotification,
};
use crate::widget_id::WidgetId;

struct RowBinding<T> {
    item: ItemRef<T>,
    index: usize,
}

struct ScrollRequest<T> {
    item: ItemRef<T>,
    /// Move keyboard focus to the item once it has a row.
    navigate: bool,
}

/// Everything the rows may consult or mutate through [`OwnerTable`].
struct TableState<T> {
    table_id: WidgetId,
    items: ItemCollection<T>,
    selection: SelectionSet<T>,
    selection_mode: SelectionMode,
    entry_spacing: f32,
    tile_width: Option<f32>,
    extent_of: Box<dyn Fn(&T) -> f32>,

    bindings: HashMap<WidgetId, RowBinding<T>>,
    item_to_widget: HashMap<ItemRef<T>, WidgetId>,
    /// Generated rows in display order.
    live_rows: Vec<WidgetId>,
    /// Rows sent back to the pool since the host last looked.
    released_rows: Vec<WidgetId>,

    /// Keyboard cursor.
    selector_item: Option<ItemRef<T>>,
    range_selection_start: Option<ItemRef<T>>,
    scroll_request: Option<ScrollRequest<T>>,
    notify_when_in_view: Option<ScrollRequest<T>>,

    events: Vec<ListEvent<T>>,
}

impl<T> TableState<T> {
    /// Scroll-axis extent of an item, including the spacing before every
    /// line but the first.
    fn item_extent(&self, index: usize, item: &ItemRef<T>, items_per_line: usize) -> f32 {
        let extent = (self.extent_of)(item).max(0.0);
        if index >= items_per_line {
            extent + self.entry_spacing
        } else {
            extent
        }
    }

    fn emit_items_changed(&mut self, delta: ItemDelta<T>) {
        if delta.is_empty() {
            return;
        }
        self.events.push(ListEvent::ItemsChanged {
            added: delta.added,
            removed: delta.removed,
        });
    }

    fn emit_selection_changed(&mut self, info: SelectInfo) {
        if !self.selection_mode.allows_selection() {
            return;
        }
        self.events.push(ListEvent::SelectionChanged {
            first: self.selection.first().cloned(),
            info,
        });
    }

    /// Forget the row bound to `item`. The row stays live until recycled.
    fn unbind_item(&mut self, item: &ItemRef<T>) {
        if let Some(widget) = self.item_to_widget.remove(item) {
            self.bindings.remove(&widget);
        }
    }

    fn reindex_bindings(&mut self, rows: &mut RowPool<T>) {
        for (widget, binding) in &mut self.bindings {
            if let Some(index) = self.items.index_of(&binding.item) {
                binding.index = index;
                if let Some(row) = rows.get_mut(*widget) {
                    row.set_index_in_list(Some(index));
                }
            }
        }
    }
}

/// The table as a row sees it, with a snapshot of engine state.
struct RowOwner<'a, T> {
    state: &'a mut TableState<T>,
    pending_refresh: bool,
    right_click_scrolling: bool,
}

impl<T> OwnerTable<T> for RowOwner<'_, T> {
    fn table_widget(&self) -> WidgetId {
        self.state.table_id
    }

    fn selection_mode(&self) -> SelectionMode {
        self.state.selection_mode
    }

    fn item_from_widget(&self, widget: WidgetId) -> Option<ItemRef<T>> {
        self.state.bindings.get(&widget).map(|binding| binding.item.clone())
    }

    fn is_pending_refresh(&self) -> bool {
        self.pending_refresh
    }

    fn is_right_click_scrolling(&self) -> bool {
        self.right_click_scrolling
    }

    fn is_item_selected(&self, item: &ItemRef<T>) -> bool {
        self.state.selection.contains(item)
    }

    fn num_selected_items(&self) -> usize {
        self.state.selection.len()
    }

    fn clear_selection(&mut self) {
        self.state.selection.clear();
    }

    fn set_item_selection(&mut self, item: &ItemRef<T>, selected: bool, was_user_directed: bool) {
        self.state
            .selection
            .set(item, selected, self.state.selection_mode);
        if was_user_directed {
            self.state.selector_item = Some(item.clone());
            self.state.range_selection_start = Some(item.clone());
        }
    }

    fn signal_selection_changed(&mut self, info: SelectInfo) {
        self.state.emit_selection_changed(info);
    }

    fn on_item_clicked(&mut self, item: &ItemRef<T>) -> bool {
        self.state.events.push(ListEvent::ItemClicked(item.clone()));
        false
    }

    fn on_item_double_clicked(&mut self, item: &ItemRef<T>) {
        self.state.events.push(ListEvent::ItemDoubleClicked(item.clone()));
    }

    fn on_item_right_clicked(&mut self, item: &ItemRef<T>, position: Point) {
        self.state.events.push(ListEvent::ItemRightClicked {
            item: item.clone(),
            position,
        });
    }

    fn on_item_hover_changed(&mut self, item: &ItemRef<T>, hovered: bool) {
        self.state.events.push(ListEvent::ItemHoverChanged {
            item: item.clone(),
            hovered,
        });
    }
}

/// Reuse the row already showing `item`, or bind a pooled one.
fn bind_row<T>(
    state: &mut TableState<T>,
    rows: &mut RowPool<T>,
    right_click_scrolling: bool,
    item: &ItemRef<T>,
    index: usize,
) -> WidgetId {
    if let Some(&widget) = state.item_to_widget.get(item) {
        state.bindings.insert(
            widget,
            RowBinding {
                item: item.clone(),
                index,
            },
        );
        if let Some(row) = rows.get_mut(widget) {
            row.set_index_in_list(Some(index));
        }
        state.live_rows.push(widget);
        return widget;
    }

    let widget = rows.acquire();
    state.item_to_widget.insert(item.clone(), widget);
    state.bindings.insert(
        widget,
        RowBinding {
            item: item.clone(),
            index,
        },
    );
    state.live_rows.push(widget);

    if let Some(row) = rows.get_mut(widget) {
        row.set_index_in_list(Some(index));
        let mut owner = RowOwner {
            state: &mut *state,
            pending_refresh: true,
            right_click_scrolling,
        };
        row.initialize_row(&mut owner);
    }
    state.events.push(ListEvent::EntryInitialized {
        item: item.clone(),
        widget,
    });
    widget
}

/// Engine-facing view of the typed state for one tick.
struct Generator<'a, T> {
    state: &'a mut TableState<T>,
    rows: &'a mut RowPool<T>,
    right_click_scrolling: bool,
}

impl<T> TableViewHost for Generator<'_, T> {
    fn measure_lines(&self, items_per_line: usize) -> LineMetrics {
        let state = &*self.state;
        LineMetrics::from_extents(
            state
                .items
                .iter()
                .enumerate()
                .map(|(index, item)| state.item_extent(index, item, items_per_line.max(1))),
            items_per_line,
        )
    }

    fn scroll_into_view(&mut self, lines: &LineMetrics, viewport: f32, scroll_offset: f32) -> ScrollIntoView {
        let state = &mut *self.state;
        let Some(request) = state.scroll_request.take() else {
            return ScrollIntoView::success();
        };
        let Some(index) = state.items.index_of(&request.item) else {
            tracing::debug!("scroll-into-view target is not in the list");
            return ScrollIntoView::success();
        };
        if viewport <= 0.0 || lines.num_lines() == 0 {
            state.scroll_request = Some(request);
            return ScrollIntoView::deferred();
        }

        let line = lines.line_of_item(index);
        let start = lines.line_start(line);
        let extent = lines.line_extent(line);
        let new_scroll_offset = if start < scroll_offset || start + extent > scroll_offset + viewport {
            // Center the line, as far as the content allows.
            let max_offset = (lines.total_length() - viewport).max(0.0);
            Some((start - (viewport - extent) / 2.0).clamp(0.0, max_offset))
        } else {
            None
        };

        state.notify_when_in_view = Some(request);
        ScrollIntoView {
            result: ScrollIntoViewResult::Success,
            new_scroll_offset,
        }
    }

    fn regenerate_items(
        &mut self,
        panel: &mut ListPanel,
        lines: &LineMetrics,
        window: Range<usize>,
        geometry: &PanelGeometry,
    ) -> usize {
        let state = &mut *self.state;
        let rows = &mut *self.rows;
        let previous = std::mem::take(&mut state.live_rows);
        panel.clear_items();

        let orientation = panel.orientation();
        let line_axis = match state.tile_width {
            Some(width) => width,
            None => geometry.dimensions(orientation).line_axis,
        };
        let items_per_line = lines.items_per_line();

        for line in window {
            for index in lines.items_in_line(line) {
                let Some(item) = state.items.get(index).cloned() else {
                    continue;
                };
                let widget = bind_row(state, rows, self.right_click_scrolling, &item, index);
                let size = TableViewDimensions {
                    orientation,
                    scroll_axis: state.item_extent(index, &item, items_per_line),
                    line_axis,
                };
                panel.add_slot(PanelChild::new(widget, size.to_size()), None);
            }
        }

        // Recycle rows that fell out of the window or lost their item.
        for widget in previous {
            if state.live_rows.contains(&widget) {
                continue;
            }
            // Hover ends while the binding can still name the item.
            if let Some(row) = rows.get_mut(widget) {
                let mut owner = RowOwner {
                    state: &mut *state,
                    pending_refresh: true,
                    right_click_scrolling: self.right_click_scrolling,
                };
                row.on_mouse_leave(&mut owner);
            }
            if let Some(binding) = state.bindings.remove(&widget) {
                if state.item_to_widget.get(&binding.item) == Some(&widget) {
                    state.item_to_widget.remove(&binding.item);
                }
            }
            rows.release(widget);
            state.released_rows.push(widget);
        }

        state.live_rows.len()
    }

    fn update_selection_set(&mut self) {
        let state = &mut *self.state;
        let items = &state.items;
        let changed = state.selection.retain(|item| items.contains(item));

        if state.selector_item.as_ref().is_some_and(|item| !items.contains(item)) {
            state.selector_item = None;
        }
        if state
            .range_selection_start
            .as_ref()
            .is_some_and(|item| !items.contains(item))
        {
            state.range_selection_start = None;
        }
        if state
            .notify_when_in_view
            .as_ref()
            .is_some_and(|request| !items.contains(&request.item))
        {
            state.notify_when_in_view = None;
        }

        if changed {
            tracing::debug!("dropped removed items from the selection");
            state.emit_selection_changed(SelectInfo::Direct);
        }
    }

    fn notify_item_scrolled_into_view(&mut self) {
        let state = &mut *self.state;
        let Some(request) = state.notify_when_in_view.as_ref() else {
            return;
        };
        let Some(&widget) = state.item_to_widget.get(&request.item) else {
            return;
        };
        let Some(request) = state.notify_when_in_view.take() else {
            return;
        };
        if request.navigate {
            state.selector_item = Some(request.item.clone());
        }
        state.events.push(ListEvent::ItemScrolledIntoView {
            item: request.item,
            widget,
        });
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingDrag {
    widget: WidgetId,
    origin: Point,
}

enum PointerTarget {
    Table,
    Row(WidgetId),
}

/// A virtualized list of `ItemRef<T>`.
pub struct ListView<T> {
    base: TableViewBase,
    state: TableState<T>,
    rows: RowPool<T>,
    capture: CaptureState,
    drag: Option<PendingDrag>,
    hovered_row: Option<WidgetId>,
}

impl<T> ListView<T> {
    /// Create a list view.
    ///
    /// `extent_of` gives an item's length along the scroll axis and
    /// `entry_factory` builds the entry shown inside each row widget.
    pub fn new(
        config: TableViewConfig,
        extent_of: impl Fn(&T) -> f32 + 'static,
        entry_factory: impl FnMut() -> Box<dyn ListEntry<T>> + 'static,
    ) -> Result<Self, ListError> {
        config.validate()?;
        tracing::debug!(
            orientation = ?config.orientation,
            layout = ?config.item_layout,
            selection = ?config.selection_mode,
            "creating list view"
        );

        let tile_width = match config.item_layout {
            ItemLayout::Tile { item_width } => Some(item_width),
            ItemLayout::List => None,
        };
        let base = TableViewBase::new(config);
        let state = TableState {
            table_id: base.id(),
            items: ItemCollection::new(),
            selection: SelectionSet::new(),
            selection_mode: base.config().selection_mode,
            entry_spacing: base.config().entry_spacing,
            tile_width,
            extent_of: Box::new(extent_of),
            bindings: HashMap::new(),
            item_to_widget: HashMap::new(),
            live_rows: Vec::new(),
            released_rows: Vec::new(),
            selector_item: None,
            range_selection_start: None,
            scroll_request: None,
            notify_when_in_view: None,
            events: Vec::new(),
        };

        Ok(Self {
            base,
            state,
            rows: RowPool::new(entry_factory),
            capture: CaptureState::None,
            drag: None,
            hovered_row: None,
        })
    }

    pub fn id(&self) -> WidgetId {
        self.base.id()
    }

    pub fn config(&self) -> &TableViewConfig {
        self.base.config()
    }

    /// The scroll engine, for offsets, scrollbar and panel state.
    pub fn base(&self) -> &TableViewBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut TableViewBase {
        &mut self.base
    }

    pub fn capture(&self) -> CaptureState {
        self.capture
    }

    /// Take every event raised since the last call.
    pub fn drain_events(&mut self) -> Vec<ListEvent<T>> {
        self.forward_notifications();
        std::mem::take(&mut self.state.events)
    }

    fn forward_notifications(&mut self) {
        for notification in self.base.drain_notifications() {
            let event = match notification {
                TableViewNotification::Scrolled {
                    offset,
                    distance_remaining,
                } => ListEvent::Scrolled {
                    offset,
                    distance_remaining,
                },
                TableViewNotification::FinishedScrolling => ListEvent::FinishedScrolling,
                TableViewNotification::ContextMenuRequested { position } => {
                    ListEvent::ContextMenuRequested { position }
                }
            };
            self.state.events.push(event);
        }
    }

    // =====================================================================
    // Items
    // =====================================================================

    /// Append an item. Null and duplicate items are rejected with a warning
    /// and leave the list untouched.
    pub fn add_item(&mut self, item: impl Into<Option<ItemRef<T>>>) -> Result<(), ListError> {
        let Some(item) = item.into() else {
            tracing::warn!("cannot add null item into list view");
            return Err(ListError::NullItem);
        };
        match self.state.items.push(item) {
            Ok(delta) => {
                self.state.emit_items_changed(delta);
                self.base.request_list_refresh();
                Ok(())
            }
            Err(index) => {
                tracing::warn!(index, "cannot add duplicate item into list view");
                Err(ListError::DuplicateItem { index })
            }
        }
    }

    pub fn remove_item(&mut self, item: &ItemRef<T>) -> Result<(), ListError> {
        if !self.state.items.contains(item) {
            tracing::debug!("remove of an item that is not in the list");
            return Err(ListError::ItemNotFound);
        }
        self.leave_hovered_row_if(|hovered| hovered == item);
        let Some(delta) = self.state.items.remove(item) else {
            return Err(ListError::ItemNotFound);
        };
        self.state.unbind_item(item);
        self.state.reindex_bindings(&mut self.rows);
        self.state.emit_items_changed(delta);
        self.base.request_list_refresh();
        Ok(())
    }

    pub fn clear_list_items(&mut self) {
        self.leave_hovered_row_if(|_| true);
        let delta = self.state.items.clear();
        self.state.item_to_widget.clear();
        self.state.bindings.clear();
        self.state.emit_items_changed(delta);
        self.base.request_list_refresh();
    }

    /// Replace every item. Duplicates reject the whole call.
    pub fn set_items(&mut self, items: impl IntoIterator<Item = ItemRef<T>>) -> Result<(), ListError> {
        let mut set = IndexSet::new();
        for item in items {
            let (index, inserted) = set.insert_full(item);
            if !inserted {
                tracing::warn!(index, "cannot set duplicate item into list view");
                return Err(ListError::DuplicateItem { index });
            }
        }

        self.leave_hovered_row_if(|hovered| !set.contains(hovered));
        let delta = self.state.items.replace_all(set);
        for item in &delta.removed {
            self.state.unbind_item(item);
        }
        self.state.reindex_bindings(&mut self.rows);
        self.state.emit_items_changed(delta);
        self.base.request_list_refresh();
        Ok(())
    }

    pub fn get_item_at(&self, index: usize) -> Option<&ItemRef<T>> {
        self.state.items.get(index)
    }

    pub fn get_num_items(&self) -> usize {
        self.state.items.len()
    }

    pub fn get_index_for_item(&self, item: &ItemRef<T>) -> Option<usize> {
        self.state.items.index_of(item)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemRef<T>> {
        self.state.items.iter()
    }

    fn item_at_checked(&self, index: usize) -> Result<ItemRef<T>, ListError> {
        match self.state.items.get(index) {
            Some(item) => Ok(item.clone()),
            None => {
                let len = self.state.items.len();
                tracing::warn!(index, len, "list index out of range");
                Err(ListError::IndexOutOfRange { index, len })
            }
        }
    }

    // =====================================================================
    // Selection
    // =====================================================================

    pub fn selection_mode(&self) -> SelectionMode {
        self.state.selection_mode
    }

    /// Change the mode, shrinking the current selection to fit it.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.state.selection_mode = mode;
        self.base.set_selection_mode(mode);
        if self.state.selection.conform_to(mode) {
            self.state.events.push(ListEvent::SelectionChanged {
                first: self.state.selection.first().cloned(),
                info: SelectInfo::Direct,
            });
        }
    }

    fn ensure_in_list(&self, item: &ItemRef<T>) -> Result<(), ListError> {
        if self.state.items.contains(item) {
            Ok(())
        } else {
            tracing::warn!("cannot select an item that is not in the list");
            Err(ListError::ItemNotFound)
        }
    }

    /// Select or deselect one item, leaving others alone where the mode allows.
    pub fn set_item_selection(&mut self, item: &ItemRef<T>, selected: bool, info: SelectInfo) -> Result<(), ListError> {
        self.ensure_in_list(item)?;
        if self.state.selection.set(item, selected, self.state.selection_mode) {
            self.state.emit_selection_changed(info);
        }
        Ok(())
    }

    /// Make `item` the only selected item.
    pub fn set_selection(&mut self, item: &ItemRef<T>, info: SelectInfo) -> Result<(), ListError> {
        self.ensure_in_list(item)?;
        let mode = self.state.selection_mode;
        if !mode.allows_selection() {
            return Ok(());
        }
        let already = self.state.selection.len() == 1 && self.state.selection.contains(item);
        if !already {
            self.state.selection.clear();
            self.state.selection.set(item, true, mode);
            self.state.emit_selection_changed(info);
        }
        Ok(())
    }

    pub fn set_selected_item(&mut self, item: &ItemRef<T>) -> Result<(), ListError> {
        self.set_selection(item, SelectInfo::Direct)
    }

    pub fn set_selected_index(&mut self, index: usize) -> Result<(), ListError> {
        let item = self.item_at_checked(index)?;
        self.set_selection(&item, SelectInfo::Direct)
    }

    /// Replace the selection with `items`. Single modes keep the last one.
    pub fn set_selected_items(&mut self, items: &[ItemRef<T>]) -> Result<(), ListError> {
        for item in items {
            self.ensure_in_list(item)?;
        }
        let mode = self.state.selection_mode;
        let mut changed = self.state.selection.clear();
        for item in items {
            changed |= self.state.selection.set(item, true, mode);
        }
        if changed {
            self.state.emit_selection_changed(SelectInfo::Direct);
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.state.selection.clear() {
            self.state.emit_selection_changed(SelectInfo::Direct);
        }
    }

    pub fn get_selected_item(&self) -> Option<&ItemRef<T>> {
        self.state.selection.first()
    }

    pub fn get_selected_items(&self) -> Vec<ItemRef<T>> {
        self.state.selection.iter().cloned().collect()
    }

    pub fn num_items_selected(&self) -> usize {
        self.state.selection.len()
    }

    pub fn is_item_selected(&self, item: &ItemRef<T>) -> bool {
        self.state.selection.contains(item)
    }

    /// Item under the keyboard cursor.
    pub fn selector_item(&self) -> Option<&ItemRef<T>> {
        self.state.selector_item.as_ref()
    }

    // Flat lists have no hierarchy.
    pub fn does_item_have_children(&self, _index: usize) -> bool {
        false
    }

    pub fn is_item_expanded(&self, _item: &ItemRef<T>) -> bool {
        false
    }

    // =====================================================================
    // Scrolling and navigation
    // =====================================================================

    /// Request `item` be scrolled into view on the next tick. Items not in
    /// the list resolve to nothing.
    pub fn scroll_item_into_view(&mut self, item: &ItemRef<T>) {
        self.request_scroll_into_view(item.clone(), false);
    }

    pub fn scroll_index_into_view(&mut self, index: usize) -> Result<(), ListError> {
        let item = self.item_at_checked(index)?;
        self.request_scroll_into_view(item, false);
        Ok(())
    }

    /// Scroll `item` into view and move the keyboard cursor to it.
    pub fn navigate_to_item(&mut self, item: &ItemRef<T>) {
        self.request_scroll_into_view(item.clone(), true);
    }

    pub fn navigate_to_index(&mut self, index: usize) -> Result<(), ListError> {
        let item = self.item_at_checked(index)?;
        self.request_scroll_into_view(item, true);
        Ok(())
    }

    fn request_scroll_into_view(&mut self, item: ItemRef<T>, navigate: bool) {
        self.state.scroll_request = Some(ScrollRequest { item, navigate });
        self.base.request_layout_refresh();
    }

    pub fn cancel_scroll_into_view(&mut self) {
        self.state.scroll_request = None;
        self.state.notify_when_in_view = None;
    }

    /// The item currently has a generated row.
    pub fn is_item_visible(&self, item: &ItemRef<T>) -> bool {
        self.state.item_to_widget.contains_key(item)
    }

    pub fn scroll_offset(&self) -> f32 {
        self.base.scroll_offset()
    }

    pub fn set_scroll_offset(&mut self, offset: f32) {
        self.base.set_scroll_offset(offset);
    }

    pub fn scroll_to_top(&mut self) {
        self.base.scroll_to_top();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.base.scroll_to_bottom();
    }

    pub fn is_refresh_pending(&self) -> bool {
        self.base.is_pending_refresh()
    }

    /// Remeasure and regenerate on the next tick.
    pub fn request_refresh(&mut self) {
        self.base.request_list_refresh();
    }

    // =====================================================================
    // Entries
    // =====================================================================

    pub fn entry_for_item(&self, item: &ItemRef<T>) -> Option<WidgetId> {
        self.state.item_to_widget.get(item).copied()
    }

    pub fn item_from_entry(&self, widget: WidgetId) -> Option<&ItemRef<T>> {
        self.state.bindings.get(&widget).map(|binding| &binding.item)
    }

    /// Generated rows in display order.
    pub fn displayed_entries(&self) -> &[WidgetId] {
        &self.state.live_rows
    }

    pub fn row(&self, widget: WidgetId) -> Option<&TableRow<T>> {
        self.rows.get(widget)
    }

    pub fn num_constructed_rows(&self) -> usize {
        self.rows.num_constructed()
    }

    // =====================================================================
    // Frame
    // =====================================================================

    /// Run timers, refresh if needed and sync row selection visuals.
    pub fn tick(&mut self, geometry: PanelGeometry, current_time: f64, delta_time: f32) {
        self.base.run_active_timers(current_time, delta_time);

        let right_click_scrolling = self.base.is_right_click_scrolling();
        let mut host = Generator {
            state: &mut self.state,
            rows: &mut self.rows,
            right_click_scrolling,
        };
        self.base.tick(&mut host, geometry, current_time, delta_time);
        self.forget_released_rows();

        let owner = RowOwner {
            state: &mut self.state,
            pending_refresh: self.base.is_pending_refresh(),
            right_click_scrolling,
        };
        for widget in owner.state.live_rows.clone() {
            if let Some(row) = self.rows.get_mut(widget) {
                row.detect_item_selection_changed(&owner);
            }
        }

        self.forward_notifications();
    }

    // =====================================================================
    // Input routing
    // =====================================================================

    fn with_row<R>(
        &mut self,
        widget: WidgetId,
        f: impl FnOnce(&mut TableRow<T>, &mut RowOwner<'_, T>) -> R,
    ) -> Option<R> {
        let pending_refresh = self.base.is_pending_refresh();
        let right_click_scrolling = self.base.is_right_click_scrolling();
        let row = self.rows.get_mut(widget)?;
        let mut owner = RowOwner {
            state: &mut self.state,
            pending_refresh,
            right_click_scrolling,
        };
        Some(f(row, &mut owner))
    }

    fn row_at(&self, position: Point) -> Option<WidgetId> {
        let geometry = self.base.cached_geometry();
        if !geometry.is_under_location(position) {
            return None;
        }
        let local = geometry.absolute_to_local(position);
        self.base.panel().child_at(geometry.size, local)
    }

    fn table_has_capture(&self) -> bool {
        self.capture.is_captured_by(self.base.id())
    }

    /// Drop capture, drag and hover state held by rows that went back to the
    /// pool. A recycled widget may already show another item.
    fn forget_released_rows(&mut self) {
        let released = std::mem::take(&mut self.state.released_rows);
        if released.is_empty() {
            return;
        }
        if let Some(widget) = self.capture.captured_by() {
            if released.contains(&widget) {
                tracing::debug!(row = %widget, "dropping capture held by a recycled row");
                self.capture = CaptureState::None;
            }
        }
        if self.drag.is_some_and(|drag| released.contains(&drag.widget)) {
            self.drag = None;
        }
        if self.hovered_row.is_some_and(|widget| released.contains(&widget)) {
            self.hovered_row = None;
        }
    }

    /// End hover on the hovered row if its item is about to leave the list.
    fn leave_hovered_row_if(&mut self, leaving: impl Fn(&ItemRef<T>) -> bool) {
        let Some(widget) = self.hovered_row else {
            return;
        };
        let bound = self
            .state
            .bindings
            .get(&widget)
            .is_some_and(|binding| leaving(&binding.item));
        if bound {
            self.with_row(widget, |row, owner| row.on_mouse_leave(owner));
            self.hovered_row = None;
        }
    }

    /// The row holding capture, if it can still resolve its item.
    fn captured_row(&mut self) -> Option<WidgetId> {
        let widget = self.capture.captured_by()?;
        if widget == self.base.id() {
            return None;
        }
        if self.state.bindings.contains_key(&widget) || self.base.is_pending_refresh() {
            return Some(widget);
        }
        tracing::debug!(row = %widget, "dropping capture held by a recycled row");
        self.capture = CaptureState::None;
        None
    }

    fn pointer_target(&mut self, position: Point) -> PointerTarget {
        if self.table_has_capture() {
            return PointerTarget::Table;
        }
        if let Some(widget) = self.captured_row() {
            return PointerTarget::Row(widget);
        }
        match self.row_at(position) {
            Some(widget) => PointerTarget::Row(widget),
            None => PointerTarget::Table,
        }
    }

    fn apply_reply(&mut self, reply: Reply, position: Point) {
        match reply.capture {
            CaptureRequest::Capture(widget) => self.capture = CaptureState::Captured(widget),
            CaptureRequest::Release => self.capture = CaptureState::None,
            CaptureRequest::None => {}
        }
        if let Some(widget) = reply.detect_drag {
            self.drag = Some(PendingDrag {
                widget,
                origin: position,
            });
        }
    }

    fn update_hover(&mut self, position: Option<Point>) {
        let hovered = position.and_then(|position| self.row_at(position));
        if hovered == self.hovered_row {
            return;
        }
        if let Some(previous) = self.hovered_row.take() {
            self.with_row(previous, |row, owner| row.on_mouse_leave(owner));
        }
        if let Some(widget) = hovered {
            self.with_row(widget, |row, owner| row.on_mouse_enter(owner));
        }
        self.hovered_row = hovered;
    }

    fn detect_drag(&mut self, position: Point) {
        let Some(pending) = self.drag else {
            return;
        };
        let moved = position - pending.origin;
        let distance = (moved.x * moved.x + moved.y * moved.y).sqrt();
        if distance < self.base.config().physics.drag_trigger_distance {
            return;
        }
        self.drag = None;
        let has_capture = self.capture.is_captured_by(pending.widget);
        let reply = self
            .with_row(pending.widget, |row, owner| row.on_drag_detected(owner, has_capture))
            .unwrap_or_default();
        self.apply_reply(reply, position);
    }

    /// Route a pointer event: capture holder first, then the row under the
    /// pointer, then the table itself.
    pub fn on_pointer_event(&mut self, event: &PointerEvent) -> Reply {
        let reply = match *event {
            PointerEvent::ButtonPressed { button, position } => self.on_button_pressed(button, position),
            PointerEvent::ButtonReleased { button, position } => self.on_button_released(button, position),
            PointerEvent::DoubleClicked { button, position } => {
                let reply = match self.pointer_target(position) {
                    PointerTarget::Row(widget) => self
                        .with_row(widget, |row, owner| row.on_mouse_button_double_click(owner, button))
                        .unwrap_or_default(),
                    PointerTarget::Table => Reply::unhandled(),
                };
                if reply.is_handled() {
                    reply
                } else {
                    let has_capture = self.table_has_capture();
                    self.base.on_mouse_button_double_click(has_capture)
                }
            }
            PointerEvent::CursorMoved {
                position,
                delta,
                right_button_down,
            } => {
                self.update_hover(Some(position));
                self.detect_drag(position);
                let row_has_capture = self
                    .capture
                    .captured_by()
                    .is_some_and(|widget| widget != self.base.id());
                if row_has_capture {
                    Reply::unhandled()
                } else {
                    let has_capture = self.table_has_capture();
                    let reply = self.base.on_mouse_move(delta, right_button_down, has_capture);
                    self.apply_reply(reply, position);
                    reply
                }
            }
            PointerEvent::WheelScrolled { delta, modifiers, .. } => self.base.on_mouse_wheel(delta, modifiers),
            PointerEvent::Entered { position, touch } => {
                self.base.on_mouse_enter(position, touch);
                self.update_hover(Some(position));
                Reply::unhandled()
            }
            PointerEvent::Left { .. } => {
                self.update_hover(None);
                let has_capture = self.table_has_capture();
                self.base.on_mouse_leave(has_capture);
                Reply::unhandled()
            }
            PointerEvent::TouchStarted { position } => {
                self.base.on_preview_touch_down(position);
                let reply = match self.row_at(position) {
                    Some(widget) => self
                        .with_row(widget, |row, _| row.on_touch_started())
                        .unwrap_or_default(),
                    None => Reply::unhandled(),
                };
                self.apply_reply(reply, position);
                reply
            }
            PointerEvent::TouchMoved { position, delta } => {
                self.detect_drag(position);
                let has_capture = self.table_has_capture();
                let reply = self.base.on_touch_moved(position, delta, has_capture);
                self.apply_reply(reply, position);
                reply
            }
            PointerEvent::TouchEnded { position } => self.on_touch_ended(position),
        };
        self.forward_notifications();
        reply
    }

    fn on_button_pressed(&mut self, button: MouseButton, position: Point) -> Reply {
        let reply = match self.pointer_target(position) {
            PointerTarget::Row(widget) => self
                .with_row(widget, |row, owner| row.on_mouse_button_down(owner, button))
                .unwrap_or_default(),
            PointerTarget::Table => Reply::unhandled(),
        };
        let reply = if reply.is_handled() {
            reply
        } else {
            let has_capture = self.table_has_capture();
            self.base.on_mouse_button_down(button, has_capture)
        };
        self.apply_reply(reply, position);
        reply
    }

    fn on_button_released(&mut self, button: MouseButton, position: Point) -> Reply {
        self.drag = None;
        let mut reply = Reply::unhandled();
        if let PointerTarget::Row(widget) = self.pointer_target(position) {
            let under_pointer = self.row_at(position) == Some(widget);
            let has_capture = self.capture.is_captured_by(widget);
            reply = self
                .with_row(widget, |row, owner| {
                    row.on_mouse_button_up(owner, button, position, has_capture, under_pointer)
                })
                .unwrap_or_default();
            self.apply_reply(reply, position);
            // A row that lost its item cannot answer the release itself.
            if has_capture && reply.capture == CaptureRequest::None {
                self.capture = CaptureState::None;
            }
        }
        if reply.is_handled() {
            return reply;
        }
        let table = self.base.on_mouse_button_up(button, position);
        self.apply_reply(table, position);
        table
    }

    fn on_touch_ended(&mut self, position: Point) -> Reply {
        self.drag = None;
        let table_has_capture = self.table_has_capture();
        let mut handled = false;
        if !table_has_capture {
            if let Some(widget) = self.row_at(position) {
                let reply = self
                    .with_row(widget, |row, owner| row.on_touch_ended(owner))
                    .unwrap_or_default();
                self.apply_reply(reply, position);
                handled = reply.is_handled();
            }
        }
        let table = self.base.on_touch_ended(table_has_capture);
        self.apply_reply(table, position);
        if handled {
            Reply::handled()
        } else {
            table
        }
    }

    // =====================================================================
    // Keyboard
    // =====================================================================

    pub fn on_key_down(&mut self, event: KeyEvent) -> Reply {
        let reply = self.base.on_key_down(event);
        if reply.is_handled() {
            self.forward_notifications();
            return reply;
        }

        if event.key == Key::Enter {
            let item = self
                .state
                .selector_item
                .clone()
                .or_else(|| self.state.selection.first().cloned());
            return match item {
                Some(item) => {
                    self.state.events.push(ListEvent::ItemClicked(item));
                    Reply::handled()
                }
                None => Reply::unhandled(),
            };
        }

        match self.navigation_target(event.key) {
            Some(index) => {
                self.navigation_select(index, event.modifiers.shift);
                self.forward_notifications();
                Reply::handled()
            }
            None => Reply::unhandled(),
        }
    }

    fn navigation_target(&self, key: Key) -> Option<usize> {
        let num_items = self.state.items.len();
        if num_items == 0 {
            return None;
        }
        let last = num_items as i64 - 1;
        let items_per_line = self.base.lines().items_per_line().max(1) as i64;
        let current = self
            .state
            .selector_item
            .as_ref()
            .and_then(|item| self.state.items.index_of(item))
            .map_or(-1, |index| index as i64);
        let page_lines = self.base.last_generate_results().exact_lines_on_screen.floor() as i64;
        let page = page_lines.max(1) * items_per_line;

        let (previous_line, next_line, previous_item, next_item) = match self.base.config().orientation {
            Orientation::Vertical => (Key::Up, Key::Down, Key::Left, Key::Right),
            Orientation::Horizontal => (Key::Left, Key::Right, Key::Up, Key::Down),
        };

        let target = if key == previous_line {
            current - items_per_line
        } else if key == next_line {
            if current < 0 { 0 } else { current + items_per_line }
        } else if key == previous_item && items_per_line > 1 {
            current - 1
        } else if key == next_item && items_per_line > 1 {
            current + 1
        } else {
            match key {
                Key::Home => 0,
                Key::End => last,
                Key::PageUp => (current - page).max(0),
                Key::PageDown => (current + page).min(last),
                _ => return None,
            }
        };

        (0..=last).contains(&target).then_some(target as usize)
    }

    /// Select the item at `index` for keyboard navigation and bring it into
    /// view. Shift extends a multi-selection from the range anchor.
    fn navigation_select(&mut self, index: usize, extend: bool) {
        let Some(item) = self.state.items.get(index).cloned() else {
            return;
        };
        let mode = self.state.selection_mode;

        if mode.allows_selection() {
            let anchor = self
                .state
                .range_selection_start
                .as_ref()
                .and_then(|anchor| self.state.items.index_of(anchor));
            match anchor {
                Some(anchor) if extend && mode == SelectionMode::Multi => {
                    self.state.selection.clear();
                    for i in anchor.min(index)..=anchor.max(index) {
                        if let Some(ranged) = self.state.items.get(i).cloned() {
                            self.state.selection.set(&ranged, true, mode);
                        }
                    }
                }
                _ => {
                    self.state.selection.clear();
                    self.state.selection.set(&item, true, mode);
                    self.state.range_selection_start = Some(item.clone());
                }
            }
            self.state.emit_selection_changed(SelectInfo::OnNavigation);
        }

        self.state.selector_item = Some(item.clone());
        self.request_scroll_into_view(item, true);
    }
}
