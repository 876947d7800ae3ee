//! Table rows: the recycled visual representation of one item.
//!
//! A row never owns its item. It asks the owning table "what am I showing?"
//! through [`OwnerTable::item_from_widget`], so a recycled row can never act
//! on a stale item. Lifecycle:
//!
//! ```text
//! Unbound -> Initialized -> (selection / hover / expansion)* -> Reset -> Unbound
//! ```

use indexmap::IndexMap;

use crate::input::{MouseButton, Reply};
use crate::items::ItemRef;
use crate::primitives::Point;
use crate::selection::{SelectInfo, SelectionMode};
use crate::widget_id::WidgetId;

/// Application content hosted inside a row.
pub trait ListEntry<T> {
    /// The row now represents `item`.
    fn on_item_set(&mut self, item: &ItemRef<T>);

    /// The row went back to the pool.
    fn on_released(&mut self) {}

    fn on_selection_changed(&mut self, _selected: bool) {}

    fn on_expansion_changed(&mut self, _expanded: bool) {}

    fn on_hover_changed(&mut self, _hovered: bool) {}

    fn is_selectable(&self) -> bool {
        true
    }

    fn allows_dragging(&self) -> bool {
        true
    }
}

/// What a row may ask of the table that owns it.
pub trait OwnerTable<T> {
    fn table_widget(&self) -> WidgetId;
    fn selection_mode(&self) -> SelectionMode;
    fn item_from_widget(&self, widget: WidgetId) -> Option<ItemRef<T>>;
    fn is_pending_refresh(&self) -> bool;
    fn is_right_click_scrolling(&self) -> bool;

    fn is_item_selected(&self, item: &ItemRef<T>) -> bool;
    fn num_selected_items(&self) -> usize;
    fn clear_selection(&mut self);
    fn set_item_selection(&mut self, item: &ItemRef<T>, selected: bool, was_user_directed: bool);
    fn signal_selection_changed(&mut self, info: SelectInfo);

    /// Returns true if a listener wants the click consumed.
    fn on_item_clicked(&mut self, item: &ItemRef<T>) -> bool;
    fn on_item_double_clicked(&mut self, item: &ItemRef<T>);
    fn on_item_right_clicked(&mut self, item: &ItemRef<T>, position: Point);
    fn on_item_hover_changed(&mut self, item: &ItemRef<T>, hovered: bool);
}

/// One recyclable row widget.
pub struct TableRow<T> {
    id: WidgetId,
    entry: Box<dyn ListEntry<T>>,
    index_in_list: Option<usize>,
    changed_selection_on_mouse_down: bool,
    appearing_selected: bool,
    processing_selection_touch: bool,
    hovered: bool,
}

impl<T> TableRow<T> {
    pub fn new(entry: Box<dyn ListEntry<T>>) -> Self {
        Self {
            id: WidgetId::new(),
            entry,
            index_in_list: None,
            changed_selection_on_mouse_down: false,
            appearing_selected: false,
            processing_selection_touch: false,
            hovered: false,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn entry(&self) -> &dyn ListEntry<T> {
        self.entry.as_ref()
    }

    pub fn index_in_list(&self) -> Option<usize> {
        self.index_in_list
    }

    pub fn set_index_in_list(&mut self, index: Option<usize>) {
        self.index_in_list = index;
    }

    pub fn is_appearing_selected(&self) -> bool {
        self.appearing_selected
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn is_item_selectable(&self) -> bool {
        self.entry.is_selectable()
    }

    /// Resolve the item this row currently shows.
    ///
    /// A missing binding outside a pending refresh means an item was removed
    /// while its row was still live.
    fn item_for_this(&self, owner: &dyn OwnerTable<T>) -> Option<ItemRef<T>> {
        let item = owner.item_from_widget(self.id);
        if item.is_none() {
            debug_assert!(
                owner.is_pending_refresh(),
                "unable to find the item for {}; a removed item must leave the list pending a refresh",
                self.id
            );
            if !owner.is_pending_refresh() {
                tracing::warn!(row = %self.id, "row has no bound item outside a pending refresh");
            }
        }
        item
    }

    // =====================================================================
    // Lifecycle
    // =====================================================================

    /// Bind the row to its current item.
    pub fn initialize_row(&mut self, owner: &mut dyn OwnerTable<T>) {
        let Some(item) = self.item_for_this(owner) else {
            return;
        };
        self.entry.on_item_set(&item);

        // Unselectable items are never selected.
        if owner.is_item_selected(&item) && !self.is_item_selectable() {
            tracing::warn!(row = %self.id, "unselectable item was selected; deselecting");
            owner.set_item_selection(&item, false, false);
        }
    }

    /// Unbind the row before it goes back to the pool.
    pub fn reset_row(&mut self) {
        self.appearing_selected = false;
        self.changed_selection_on_mouse_down = false;
        self.processing_selection_touch = false;
        self.hovered = false;
        self.index_in_list = None;
        self.entry.on_released();
    }

    /// Compare the cached selection bit with the live selection set and fire
    /// `on_selection_changed` once if they disagree.
    pub fn detect_item_selection_changed(&mut self, owner: &dyn OwnerTable<T>) {
        let Some(item) = owner.item_from_widget(self.id) else {
            return;
        };
        if self.appearing_selected != owner.is_item_selected(&item) {
            self.appearing_selected = !self.appearing_selected;
            self.entry.on_selection_changed(self.appearing_selected);
        }
    }

    // =====================================================================
    // Pointer
    // =====================================================================

    pub fn on_mouse_enter(&mut self, owner: &mut dyn OwnerTable<T>) {
        if self.hovered {
            return;
        }
        self.hovered = true;
        self.entry.on_hover_changed(true);
        if let Some(item) = owner.item_from_widget(self.id) {
            owner.on_item_hover_changed(&item, true);
        }
    }

    pub fn on_mouse_leave(&mut self, owner: &mut dyn OwnerTable<T>) {
        if !self.hovered {
            return;
        }
        self.hovered = false;
        self.entry.on_hover_changed(false);
        if let Some(item) = owner.item_from_widget(self.id) {
            owner.on_item_hover_changed(&item, false);
        }
    }

    /// New selections happen on press; refinement waits for release.
    pub fn on_mouse_button_down(
        &mut self,
        owner: &mut dyn OwnerTable<T>,
        button: MouseButton,
    ) -> Reply {
        self.changed_selection_on_mouse_down = false;
        let mode = owner.selection_mode();
        if button != MouseButton::Left || !mode.allows_selection() || !self.is_item_selectable() {
            return Reply::unhandled();
        }

        if let Some(item) = self.item_for_this(owner) {
            if !owner.is_item_selected(&item) {
                if mode != SelectionMode::Multi {
                    owner.clear_selection();
                }
                owner.set_item_selection(&item, true, true);
                self.changed_selection_on_mouse_down = true;
            }
        }
        Reply::handled().detect_drag(self.id).capture_mouse(self.id)
    }

    pub fn on_mouse_button_up(
        &mut self,
        owner: &mut dyn OwnerTable<T>,
        button: MouseButton,
        position: Point,
        has_capture: bool,
        under_pointer: bool,
    ) -> Reply {
        let Some(item) = self.item_for_this(owner) else {
            return Reply::unhandled();
        };
        let mode = owner.selection_mode();
        let mut reply = Reply::unhandled();

        if button == MouseButton::Left && has_capture {
            let mut signal = self.changed_selection_on_mouse_down;

            if !self.changed_selection_on_mouse_down && self.is_item_selectable() && under_pointer {
                match mode {
                    SelectionMode::SingleToggle => {
                        owner.clear_selection();
                        signal = true;
                    }
                    SelectionMode::Multi
                        if owner.num_selected_items() > 1 && owner.is_item_selected(&item) =>
                    {
                        // Collapse a multi-selection onto the released item.
                        owner.clear_selection();
                        owner.set_item_selection(&item, true, true);
                        signal = true;
                    }
                    _ => {}
                }
            }

            if signal {
                owner.signal_selection_changed(SelectInfo::OnMouseClick);
                reply = Reply::handled();
            }
            if owner.on_item_clicked(&item) {
                reply = Reply::handled();
            }
            self.changed_selection_on_mouse_down = false;
            return reply.release_mouse_capture();
        }

        if button == MouseButton::Right && mode.allows_selection() && !owner.is_right_click_scrolling() {
            if self.is_item_selectable() && !owner.is_item_selected(&item) {
                owner.clear_selection();
                owner.set_item_selection(&item, true, true);
                owner.signal_selection_changed(SelectInfo::OnMouseClick);
            }
            owner.on_item_right_clicked(&item, position);
            reply = Reply::handled();
        }
        reply
    }

    pub fn on_mouse_button_double_click(
        &mut self,
        owner: &mut dyn OwnerTable<T>,
        button: MouseButton,
    ) -> Reply {
        if button != MouseButton::Left {
            return Reply::unhandled();
        }
        match self.item_for_this(owner) {
            Some(item) => {
                owner.on_item_double_clicked(&item);
                Reply::handled()
            }
            None => Reply::unhandled(),
        }
    }

    // =====================================================================
    // Touch
    // =====================================================================

    pub fn on_touch_started(&mut self) -> Reply {
        self.processing_selection_touch = true;
        Reply::handled().detect_drag(self.id)
    }

    pub fn on_touch_ended(&mut self, owner: &mut dyn OwnerTable<T>) -> Reply {
        if !self.processing_selection_touch {
            return Reply::unhandled();
        }
        self.processing_selection_touch = false;

        let Some(item) = self.item_for_this(owner) else {
            return Reply::unhandled();
        };
        let mut reply = Reply::unhandled();
        let mode = owner.selection_mode();

        if self.is_item_selectable() && mode.allows_selection() {
            if !owner.is_item_selected(&item) {
                if mode != SelectionMode::Multi {
                    owner.clear_selection();
                }
                owner.set_item_selection(&item, true, true);
                owner.signal_selection_changed(SelectInfo::OnMouseClick);
                reply = Reply::handled();
            } else if matches!(mode, SelectionMode::SingleToggle | SelectionMode::Multi) {
                owner.set_item_selection(&item, false, true);
                owner.signal_selection_changed(SelectInfo::OnMouseClick);
                reply = Reply::handled();
            }
        }
        if owner.on_item_clicked(&item) {
            reply = Reply::handled();
        }
        reply
    }

    /// The pointer travelled far enough after a press to count as a drag.
    ///
    /// A touch drag hands the pointer to the table so it can scroll.
    pub fn on_drag_detected(&mut self, owner: &mut dyn OwnerTable<T>, has_capture: bool) -> Reply {
        if !self.entry.allows_dragging() {
            self.processing_selection_touch = false;
            return Reply::unhandled();
        }
        if self.processing_selection_touch {
            self.processing_selection_touch = false;
            return Reply::handled().capture_mouse(owner.table_widget());
        }
        if has_capture && self.changed_selection_on_mouse_down {
            owner.signal_selection_changed(SelectInfo::OnMouseClick);
            self.changed_selection_on_mouse_down = false;
        }
        Reply::unhandled()
    }
}

/// Owns every row widget, live or pooled.
pub struct RowPool<T> {
    rows: IndexMap<WidgetId, TableRow<T>>,
    free: Vec<WidgetId>,
    factory: Box<dyn FnMut() -> Box<dyn ListEntry<T>>>,
}

impl<T> RowPool<T> {
    pub fn new(factory: impl FnMut() -> Box<dyn ListEntry<T>> + 'static) -> Self {
        Self {
            rows: IndexMap::new(),
            free: Vec::new(),
            factory: Box::new(factory),
        }
    }

    /// Take a row from the pool, building one if the pool is empty.
    pub fn acquire(&mut self) -> WidgetId {
        if let Some(id) = self.free.pop() {
            return id;
        }
        let row = TableRow::new((self.factory)());
        let id = row.id();
        tracing::trace!(row = %id, "constructed row widget");
        self.rows.insert(id, row);
        id
    }

    /// Reset a row and return it to the pool.
    pub fn release(&mut self, id: WidgetId) {
        if let Some(row) = self.rows.get_mut(&id) {
            row.reset_row();
            if !self.free.contains(&id) {
                self.free.push(id);
            }
        }
    }

    pub fn get(&self, id: WidgetId) -> Option<&TableRow<T>> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut TableRow<T>> {
        self.rows.get_mut(&id)
    }

    /// Rows ever constructed.
    pub fn num_constructed(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;
    use crate::selection::SelectionSet;

    #[derive(Default)]
    struct Recorded {
        item_set: Vec<u32>,
        selection_changes: Vec<bool>,
        released: usize,
    }

    struct RecordingEntry {
        log: Rc<RefCell<Recorded>>,
        selectable: bool,
    }

    impl ListEntry<u32> for RecordingEntry {
        fn on_item_set(&mut self, item: &ItemRef<u32>) {
            self.log.borrow_mut().item_set.push(**item);
        }

        fn on_released(&mut self) {
            self.log.borrow_mut().released += 1;
        }

        fn on_selection_changed(&mut self, selected: bool) {
            self.log.borrow_mut().selection_changes.push(selected);
        }

        fn is_selectable(&self) -> bool {
            self.selectable
        }
    }

    struct MockTable {
        id: WidgetId,
        mode: SelectionMode,
        bindings: HashMap<WidgetId, ItemRef<u32>>,
        selection: SelectionSet<u32>,
        pending: bool,
        right_click_scrolling: bool,
        signals: Vec<SelectInfo>,
        clicked: Vec<u32>,
        right_clicked: Vec<u32>,
        double_clicked: Vec<u32>,
    }

    impl MockTable {
        fn new(mode: SelectionMode) -> Self {
            Self {
                id: WidgetId::new(),
                mode,
                bindings: HashMap::new(),
                selection: SelectionSet::new(),
                pending: false,
                right_click_scrolling: false,
                signals: Vec::new(),
                clicked: Vec::new(),
                right_clicked: Vec::new(),
                double_clicked: Vec::new(),
            }
        }
    }

    impl OwnerTable<u32> for MockTable {
        fn table_widget(&self) -> WidgetId {
            self.id
        }
        fn selection_mode(&self) -> SelectionMode {
            self.mode
        }
        fn item_from_widget(&self, widget: WidgetId) -> Option<ItemRef<u32>> {
            self.bindings.get(&widget).cloned()
        }
        fn is_pending_refresh(&self) -> bool {
            self.pending
        }
        fn is_right_click_scrolling(&self) -> bool {
            self.right_click_scrolling
        }
        fn is_item_selected(&self, item: &ItemRef<u32>) -> bool {
            self.selection.contains(item)
        }
        fn num_selected_items(&self) -> usize {
            self.selection.len()
        }
        fn clear_selection(&mut self) {
            self.selection.clear();
        }
        fn set_item_selection(&mut self, item: &ItemRef<u32>, selected: bool, _user: bool) {
            self.selection.set(item, selected, self.mode);
        }
        fn signal_selection_changed(&mut self, info: SelectInfo) {
            self.signals.push(info);
        }
        fn on_item_clicked(&mut self, item: &ItemRef<u32>) -> bool {
            self.clicked.push(**item);
            false
        }
        fn on_item_double_clicked(&mut self, item: &ItemRef<u32>) {
            self.double_clicked.push(**item);
        }
        fn on_item_right_clicked(&mut self, item: &ItemRef<u32>, _position: Point) {
            self.right_clicked.push(**item);
        }
        fn on_item_hover_changed(&mut self, _item: &ItemRef<u32>, _hovered: bool) {}
    }

    fn bound_row(
        table: &mut MockTable,
        value: u32,
        selectable: bool,
    ) -> (TableRow<u32>, ItemRef<u32>, Rc<RefCell<Recorded>>) {
        let log = Rc::new(RefCell::new(Recorded::default()));
        let row = TableRow::new(Box::new(RecordingEntry {
            log: log.clone(),
            selectable,
        }));
        let item = ItemRef::new(value);
        table.bindings.insert(row.id(), item.clone());
        (row, item, log)
    }

    #[test]
    fn press_selects_and_release_signals() {
        let mut table = MockTable::new(SelectionMode::Single);
        let (mut row, item, _) = bound_row(&mut table, 7, true);

        let reply = row.on_mouse_button_down(&mut table, MouseButton::Left);
        assert!(reply.is_handled());
        assert_eq!(reply.detect_drag, Some(row.id()));
        assert!(table.selection.contains(&item));
        assert!(table.signals.is_empty());

        let reply = row.on_mouse_button_up(&mut table, MouseButton::Left, Point::ORIGIN, true, true);
        assert!(reply.is_handled());
        assert_eq!(reply.capture, crate::input::CaptureRequest::Release);
        assert_eq!(table.signals, vec![SelectInfo::OnMouseClick]);
        assert_eq!(table.clicked, vec![7]);
    }

    #[test]
    fn single_toggle_release_on_selected_item_clears() {
        let mut table = MockTable::new(SelectionMode::SingleToggle);
        let (mut row, item, _) = bound_row(&mut table, 1, true);
        table.selection.set(&item, true, SelectionMode::SingleToggle);

        row.on_mouse_button_down(&mut table, MouseButton::Left);
        row.on_mouse_button_up(&mut table, MouseButton::Left, Point::ORIGIN, true, true);
        assert!(table.selection.is_empty());
        assert_eq!(table.signals.len(), 1);
    }

    #[test]
    fn multi_release_collapses_selection() {
        let mut table = MockTable::new(SelectionMode::Multi);
        let (mut row, item, _) = bound_row(&mut table, 1, true);
        let other = ItemRef::new(2);
        table.selection.set(&item, true, SelectionMode::Multi);
        table.selection.set(&other, true, SelectionMode::Multi);

        row.on_mouse_button_down(&mut table, MouseButton::Left);
        row.on_mouse_button_up(&mut table, MouseButton::Left, Point::ORIGIN, true, true);
        assert_eq!(table.selection.len(), 1);
        assert!(table.selection.contains(&item));
    }

    #[test]
    fn right_click_ignored_while_drag_scrolling() {
        let mut table = MockTable::new(SelectionMode::Single);
        let (mut row, item, _) = bound_row(&mut table, 3, true);

        table.right_click_scrolling = true;
        let reply = row.on_mouse_button_up(&mut table, MouseButton::Right, Point::ORIGIN, false, true);
        assert!(!reply.is_handled());
        assert!(table.right_clicked.is_empty());

        table.right_click_scrolling = false;
        row.on_mouse_button_up(&mut table, MouseButton::Right, Point::ORIGIN, false, true);
        assert!(table.selection.contains(&item));
        assert_eq!(table.right_clicked, vec![3]);
    }

    #[test]
    fn unselectable_rows_do_not_select() {
        let mut table = MockTable::new(SelectionMode::Single);
        let (mut row, _, _) = bound_row(&mut table, 3, false);
        let reply = row.on_mouse_button_down(&mut table, MouseButton::Left);
        assert!(!reply.is_handled());
        assert!(table.selection.is_empty());
    }

    #[test]
    fn selection_poll_fires_once_per_flip() {
        let mut table = MockTable::new(SelectionMode::Single);
        let (mut row, item, log) = bound_row(&mut table, 5, true);

        row.detect_item_selection_changed(&table);
        assert!(log.borrow().selection_changes.is_empty());

        table.selection.set(&item, true, SelectionMode::Single);
        row.detect_item_selection_changed(&table);
        row.detect_item_selection_changed(&table);
        assert_eq!(log.borrow().selection_changes, vec![true]);

        table.selection.clear();
        row.detect_item_selection_changed(&table);
        assert_eq!(log.borrow().selection_changes, vec![true, false]);
    }

    #[test]
    fn initialize_and_reset_round_trip_entry() {
        let mut table = MockTable::new(SelectionMode::Single);
        let (mut row, _, log) = bound_row(&mut table, 9, true);
        row.set_index_in_list(Some(4));
        row.initialize_row(&mut table);
        assert_eq!(log.borrow().item_set, vec![9]);

        row.reset_row();
        assert_eq!(row.index_in_list(), None);
        assert_eq!(log.borrow().released, 1);
    }

    #[test]
    fn missing_item_during_refresh_is_tolerated() {
        let mut table = MockTable::new(SelectionMode::Single);
        let (mut row, _, _) = bound_row(&mut table, 9, true);
        table.bindings.clear();
        table.pending = true;
        let reply = row.on_mouse_button_double_click(&mut table, MouseButton::Left);
        assert!(!reply.is_handled());
        assert!(table.double_clicked.is_empty());
    }

    #[test]
    fn touch_drag_hands_capture_to_table() {
        let mut table = MockTable::new(SelectionMode::Single);
        let (mut row, _, _) = bound_row(&mut table, 2, true);
        row.on_touch_started();
        let reply = row.on_drag_detected(&mut table, false);
        assert_eq!(reply.capture, crate::input::CaptureRequest::Capture(table.id));

        // The touch was consumed by the drag; lifting selects nothing.
        let reply = row.on_touch_ended(&mut table);
        assert!(!reply.is_handled());
        assert!(table.selection.is_empty());
    }

    #[test]
    fn pool_reuses_released_rows() {
        let mut pool: RowPool<u32> = RowPool::new(|| {
            Box::new(RecordingEntry {
                log: Rc::new(RefCell::new(Recorded::default())),
                selectable: true,
            }) as Box<dyn ListEntry<u32>>
        });
        let a = pool.acquire();
        let b = pool.acquire();
        assert_ne!(a, b);
        pool.release(a);
        assert_eq!(pool.acquire(), a);
        assert_eq!(pool.num_constructed(), 2);
    }
}
