//! Table View Base - the scroll and virtualization engine.
//!
//! Owns the authoritative scroll offsets and drives the per-frame refresh:
//! it measures content, decides which lines are visible, asks its host to
//! materialize rows for them, corrects the offset when the data shrank, and
//! keeps the scrollbar in sync.
//!
//! Three offsets are tracked:
//! - `desired`: where the user or API asked to be (never negative)
//! - `target`: `desired`, or the fixed-line anchor derived from it
//! - `current`: what is rendered; snaps or interpolates towards `target`
//!
//! Nothing is refreshed eagerly. Mutations set dirty flags and register a
//! one-shot timer so the host ticks the view; the real work happens in
//! [`TableViewBase::tick`] because panel geometry is only known then.

use std::ops::Range;

use crate::config::{ConsumeMouseWheel, ItemLayout, TableViewConfig};
use crate::input::{Key, KeyEvent, Modifiers, MouseButton, Reply};
use crate::lines::LineMetrics;
use crate::panel::ListPanel;
use crate::physics::{InertialScrollManager, Overscroll};
use crate::primitives::{PanelGeometry, Point, Size, TableViewDimensions};
use crate::scheduler::{ActiveTimerReturn, ActiveTimers, TimerKind};
use crate::scrollbar::ScrollBarState;
use crate::selection::SelectionMode;
use crate::widget_id::WidgetId;

/// Tolerance for "at the start / end of the list" checks.
const NEARLY_EQUAL_TOLERANCE: f32 = 1e-4;

/// What one virtualization pass actually realized.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GenerationResult {
    pub num_widgets_generated: usize,
    /// Full scroll-axis length of every generated line.
    pub length_of_generated_content: f32,
    /// Visible lines, counting partially visible lines fractionally.
    pub exact_lines_on_screen: f32,
    /// Generation reached the last item before filling the viewport and
    /// backfilled earlier lines.
    pub generated_past_last_item: bool,
    /// Offset consistent with what was generated.
    pub new_scroll_offset: f32,
}

/// Lines to generate for one pass plus the resulting metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationWindow {
    pub lines: Range<usize>,
    pub result: GenerationResult,
}

/// Outcome of resolving a pending scroll-into-view request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollIntoViewResult {
    /// Nothing pending, or the request was resolved this pass.
    Success,
    /// The target cannot be placed yet; try again next frame.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollIntoView {
    pub result: ScrollIntoViewResult,
    /// Desired offset that brings the target into view, if a scroll is needed.
    pub new_scroll_offset: Option<f32>,
}

impl ScrollIntoView {
    pub const fn success() -> Self {
        Self {
            result: ScrollIntoViewResult::Success,
            new_scroll_offset: None,
        }
    }

    pub const fn deferred() -> Self {
        Self {
            result: ScrollIntoViewResult::Deferred,
            new_scroll_offset: None,
        }
    }
}

/// Notifications raised by the engine itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableViewNotification {
    Scrolled { offset: f32, distance_remaining: f32 },
    FinishedScrolling,
    ContextMenuRequested { position: Point },
}

/// The typed side of a table view: knows the items and owns the rows.
pub trait TableViewHost {
    /// Measure every item into line metrics.
    fn measure_lines(&self, items_per_line: usize) -> LineMetrics;

    /// Resolve any pending scroll-into-view request against the current
    /// metrics and desired offset.
    fn scroll_into_view(&mut self, lines: &LineMetrics, viewport: f32, scroll_offset: f32) -> ScrollIntoView;

    /// Fill `panel` with rows for every item in `window`, recycling rows of
    /// items that fell out of it. Returns the number of rows generated.
    fn regenerate_items(
        &mut self,
        panel: &mut ListPanel,
        lines: &LineMetrics,
        window: Range<usize>,
        geometry: &PanelGeometry,
    ) -> usize;

    /// Drop selected items that left the collection.
    fn update_selection_set(&mut self);

    /// A scroll-into-view target may now have a row.
    fn notify_item_scrolled_into_view(&mut self);
}

/// Frame-rate independent exponential approach.
fn interp_to(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return target;
    }
    let distance = target - current;
    if distance * distance < 1e-8 {
        return target;
    }
    current + distance * (dt * speed).clamp(0.0, 1.0)
}

fn nearly_equal(a: f32, b: f32) -> bool {
    (a - b).abs() <= NEARLY_EQUAL_TOLERANCE
}

/// Pick the lines that cover `viewport` starting at `offset`.
///
/// When the items run out before the viewport is full and the list is
/// scrolled, earlier lines are backfilled and the consistent offset is
/// reported as the one that puts the last line at the end of the viewport.
pub fn plan_generation(lines: &LineMetrics, offset: f32, viewport: f32) -> GenerationWindow {
    let num_lines = lines.num_lines();
    if num_lines == 0 || viewport <= 0.0 {
        return GenerationWindow {
            lines: 0..0,
            result: GenerationResult::default(),
        };
    }

    let total = lines.total_length();
    let offset = offset.max(0.0);
    let start_pos = lines.line_at_offset(offset);
    let start_line = (start_pos.floor() as usize).min(num_lines - 1);
    let fraction = (start_pos - start_line as f32).clamp(0.0, 1.0);

    let mut visible = 0.0f32;
    let mut generated = 0.0f32;
    let mut line = start_line;
    while line < num_lines && visible < viewport {
        let extent = lines.line_extent(line);
        generated += extent;
        visible += if line == start_line { extent * (1.0 - fraction) } else { extent };
        line += 1;
    }

    let mut first = start_line;
    let mut effective = offset;
    let mut past_last = false;
    if line >= num_lines && visible < viewport && offset > 0.0 {
        past_last = true;
        let mut filled = generated;
        while first > 0 && filled < viewport {
            first -= 1;
            let extent = lines.line_extent(first);
            generated += extent;
            filled += extent;
        }
        effective = (total - viewport).max(0.0);
    }

    let end_pos = (effective + viewport).min(total);
    let exact_lines = (lines.line_at_offset(end_pos) - lines.line_at_offset(effective)).max(0.0);

    GenerationWindow {
        lines: first..line,
        result: GenerationResult {
            num_widgets_generated: 0,
            length_of_generated_content: generated,
            exact_lines_on_screen: exact_lines,
            generated_past_last_item: past_last,
            new_scroll_offset: effective,
        },
    }
}

/// The scroll and virtualization engine.
pub struct TableViewBase {
    id: WidgetId,
    config: TableViewConfig,
    panel: ListPanel,
    scrollbar: ScrollBarState,
    inertial: InertialScrollManager,
    overscroll: Overscroll,
    timers: ActiveTimers,
    lines: LineMetrics,

    desired_scroll_offset: f32,
    current_scroll_offset: f32,
    target_scroll_offset: f32,

    items_need_refresh: bool,
    total_length_needs_refresh: bool,
    panel_size_last_tick: Option<Size>,
    cached_geometry: PanelGeometry,
    last_generate_results: GenerationResult,
    was_at_end_of_list: bool,

    amount_scrolled_while_right_down: f32,
    tick_scroll_delta: f32,
    started_touch_interaction: bool,
    pressed_position: Point,

    notifications: Vec<TableViewNotification>,
}

impl TableViewBase {
    pub fn new(config: TableViewConfig) -> Self {
        let mut panel = ListPanel::new(config.orientation);
        panel.set_preferred_num_lines(config.preferred_num_lines);
        Self {
            id: WidgetId::new(),
            panel,
            scrollbar: ScrollBarState::new(),
            inertial: InertialScrollManager::new(&config.physics),
            overscroll: Overscroll::new(&config.physics),
            timers: ActiveTimers::new(),
            lines: LineMetrics::empty(),
            desired_scroll_offset: 0.0,
            current_scroll_offset: 0.0,
            target_scroll_offset: 0.0,
            items_need_refresh: false,
            total_length_needs_refresh: true,
            panel_size_last_tick: None,
            cached_geometry: PanelGeometry::default(),
            last_generate_results: GenerationResult::default(),
            was_at_end_of_list: false,
            amount_scrolled_while_right_down: 0.0,
            tick_scroll_delta: 0.0,
            started_touch_interaction: false,
            pressed_position: Point::ORIGIN,
            notifications: Vec::new(),
            config,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn config(&self) -> &TableViewConfig {
        &self.config
    }

    pub fn panel(&self) -> &ListPanel {
        &self.panel
    }

    pub fn scrollbar(&self) -> &ScrollBarState {
        &self.scrollbar
    }

    pub fn lines(&self) -> &LineMetrics {
        &self.lines
    }

    pub fn cached_geometry(&self) -> &PanelGeometry {
        &self.cached_geometry
    }

    pub fn last_generate_results(&self) -> GenerationResult {
        self.last_generate_results
    }

    pub fn drain_notifications(&mut self) -> Vec<TableViewNotification> {
        std::mem::take(&mut self.notifications)
    }

    // =====================================================================
    // Settings
    // =====================================================================

    pub fn set_fixed_line_scroll_offset(&mut self, offset: Option<f32>) {
        if self.config.fixed_line_scroll_offset != offset {
            self.config.fixed_line_scroll_offset = offset;
            self.request_layout_refresh();
        }
    }

    pub fn set_animated_scrolling(&mut self, enabled: bool) {
        self.config.animated_scrolling = enabled;
    }

    pub fn set_allow_overscroll(&mut self, allow: bool) {
        self.config.allow_overscroll = allow;
        if !allow {
            self.overscroll.reset();
        }
    }

    pub fn set_right_click_scrolling(&mut self, enabled: bool) {
        self.config.right_click_scrolling = enabled;
    }

    pub fn set_wheel_scroll_multiplier(&mut self, multiplier: f32) {
        self.config.wheel_scroll_multiplier = multiplier;
    }

    pub fn set_consume_mouse_wheel(&mut self, policy: ConsumeMouseWheel) {
        self.config.consume_mouse_wheel = policy;
    }

    pub(crate) fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.config.selection_mode = mode;
    }

    // =====================================================================
    // Scroll state
    // =====================================================================

    /// The desired scroll offset.
    pub fn scroll_offset(&self) -> f32 {
        self.desired_scroll_offset
    }

    /// The rendered scroll offset.
    pub fn current_scroll_offset(&self) -> f32 {
        self.current_scroll_offset
    }

    pub fn total_items_length(&self) -> f32 {
        self.lines.total_length()
    }

    fn viewport_length(&self) -> f32 {
        self.cached_geometry.viewport_length(self.config.orientation)
    }

    /// Remaining scrollable distance after `offset`.
    pub fn distance_remaining(&self, offset: f32) -> f32 {
        (self.total_items_length() - self.viewport_length() - offset).max(0.0)
    }

    /// Visual overscroll amount (resisted and bounded).
    pub fn overscroll_amount(&self) -> f32 {
        self.overscroll.overscroll()
    }

    /// Raw accumulated overscroll.
    pub fn raw_overscroll_amount(&self) -> f32 {
        self.overscroll.raw_amount()
    }

    pub fn scroll_velocity(&self) -> f32 {
        self.inertial.scroll_velocity()
    }

    /// Fraction of the first visible line scrolled out of view.
    pub fn first_line_scroll_offset(&self) -> f32 {
        self.lines.line_at_offset(self.current_scroll_offset).fract()
    }

    /// Where `current` is heading.
    ///
    /// With a fixed-line anchor and no drag or fling in progress this is the
    /// start of the desired line minus the anchor fraction of a line.
    pub fn target_scroll_offset(&self) -> f32 {
        match self.config.fixed_line_scroll_offset {
            Some(fraction) if !self.is_right_click_scrolling() && self.inertial.scroll_velocity() == 0.0 => {
                let line = self.lines.line_at_offset(self.desired_scroll_offset).floor() - fraction;
                self.lines.offset_at_line(line).max(0.0)
            }
            _ => self.desired_scroll_offset,
        }
    }

    /// Set the desired offset (clamped at zero). Notifies and requests a
    /// refresh only if the value changed.
    pub fn set_scroll_offset(&mut self, offset: f32) {
        let offset = offset.max(0.0);
        if self.desired_scroll_offset != offset {
            self.desired_scroll_offset = offset;
            self.notifications.push(TableViewNotification::Scrolled {
                offset,
                distance_remaining: self.distance_remaining(offset),
            });
            self.request_layout_refresh();
        }
    }

    /// Nudge the desired offset without clamping.
    pub fn add_scroll_offset(&mut self, delta: f32, refresh: bool) {
        if nearly_equal(delta, 0.0) {
            return;
        }
        self.desired_scroll_offset += delta;
        if refresh {
            self.notifications.push(TableViewNotification::Scrolled {
                offset: self.desired_scroll_offset,
                distance_remaining: self.distance_remaining(self.desired_scroll_offset),
            });
            self.request_layout_refresh();
        }
    }

    /// Scroll by `delta`, routing it into overscroll at the edges.
    ///
    /// Returns the magnitude consumed: overscroll absorbed plus offset moved.
    pub fn scroll_by(&mut self, delta: f32, allow_overscroll: bool) -> f32 {
        let scroll_max = (self.total_items_length() - self.viewport_length()).max(0.0);
        let at_start = nearly_equal(self.desired_scroll_offset, 0.0);
        let at_end = nearly_equal(self.desired_scroll_offset, scroll_max);

        if allow_overscroll && self.overscroll.should_apply(at_start, at_end, delta) {
            let absorbed = self.overscroll.scroll_by(delta);
            if absorbed != 0.0 {
                // Overscroll only springs back while the updater runs.
                self.register_inertial_timer();
                self.request_layout_refresh();
                let remainder = delta - absorbed;
                let moved = if remainder != 0.0 {
                    self.scroll_to(self.desired_scroll_offset + remainder)
                } else {
                    0.0
                };
                return absorbed.abs() + moved;
            }
        }
        self.scroll_to(self.desired_scroll_offset + delta)
    }

    /// Scroll to `offset`, allowing a little slack past either end.
    ///
    /// Returns how far the desired offset moved. Pushing further past the
    /// end while already there reports zero.
    pub fn scroll_to(&mut self, offset: f32) -> f32 {
        let slack = self.config.physics.end_slack;
        let new_offset = offset.clamp(-slack, self.total_items_length() + slack);
        let mut amount = (self.desired_scroll_offset - new_offset.max(0.0)).abs();
        if self.was_at_end_of_list && new_offset >= self.desired_scroll_offset {
            amount = 0.0;
        }
        self.set_scroll_offset(new_offset);
        amount
    }

    pub fn scroll_to_top(&mut self) {
        self.end_inertial_scrolling();
        self.set_scroll_offset(0.0);
        self.request_layout_refresh();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.end_inertial_scrolling();
        let bottom = (self.total_items_length() - self.viewport_length()).max(0.0);
        self.set_scroll_offset(bottom);
        self.request_layout_refresh();
    }

    pub fn end_inertial_scrolling(&mut self) {
        self.inertial.clear_scroll_velocity();
    }

    /// The user dragged the scrollbar thumb to `fraction` of the content.
    pub fn on_scrollbar_user_scrolled(&mut self, fraction: f32) {
        let content = self.total_items_length();
        let clamped = (fraction * content).min(content - self.viewport_length());
        self.scroll_to(clamped);
    }

    pub fn begin_scrollbar_drag(&mut self) {
        self.scrollbar.begin_scrolling();
    }

    pub fn end_scrollbar_drag(&mut self) {
        self.scrollbar.end_scrolling();
    }

    pub fn is_scrollbar_needed(&self) -> bool {
        self.scrollbar.is_needed()
    }

    // =====================================================================
    // Refresh scheduling
    // =====================================================================

    /// Mark the visible window dirty and make sure a tick happens.
    pub fn request_layout_refresh(&mut self) {
        if !self.items_need_refresh {
            self.items_need_refresh = true;
            self.timers.register(TimerKind::EnsureTickToRefresh);
        }
        self.panel.set_refresh_pending(true);
    }

    /// The item set changed: remeasure as well.
    pub fn request_list_refresh(&mut self) {
        self.total_length_needs_refresh = true;
        self.request_layout_refresh();
    }

    pub fn is_pending_refresh(&self) -> bool {
        self.items_need_refresh || self.panel.is_refresh_pending()
    }

    pub fn has_active_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn is_timer_registered(&self, kind: TimerKind) -> bool {
        self.timers.is_registered(kind)
    }

    /// Run every registered timer once.
    pub fn run_active_timers(&mut self, current_time: f64, delta_time: f32) {
        for kind in self.timers.snapshot() {
            let verdict = match kind {
                TimerKind::EnsureTickToRefresh => ActiveTimerReturn::Stop,
                TimerKind::UpdateInertialScroll => self.update_inertial_scroll(current_time, delta_time),
            };
            self.timers.settle(kind, verdict);
        }
    }

    fn register_inertial_timer(&mut self) {
        self.timers.register(TimerKind::UpdateInertialScroll);
    }

    fn can_use_inertial_scroll(&self, amount: f32) -> bool {
        let overscroll = self.overscroll.overscroll();
        overscroll == 0.0 || overscroll.signum() != amount.signum()
    }

    fn update_inertial_scroll(&mut self, current_time: f64, delta_time: f32) -> ActiveTimerReturn {
        let mut keep_ticking = false;
        let allow_overscroll = self.config.allow_overscroll;

        if self.is_right_click_scrolling() {
            keep_ticking = true;
            // Sampled per frame so a stationary pointer still counts.
            if self.can_use_inertial_scroll(self.tick_scroll_delta) {
                self.inertial.add_scroll_sample(self.tick_scroll_delta, current_time);
            }
        } else {
            self.inertial.update_scroll_velocity(delta_time);
            let velocity = self.inertial.scroll_velocity();
            if velocity != 0.0 {
                if self.can_use_inertial_scroll(velocity) {
                    keep_ticking = true;
                    self.scroll_by(velocity * delta_time, allow_overscroll);
                } else {
                    self.inertial.clear_scroll_velocity();
                }
            }

            if allow_overscroll {
                if self.overscroll.overscroll() != 0.0 {
                    keep_ticking = true;
                    self.request_layout_refresh();
                }
                self.overscroll.update(delta_time);
            }
        }

        self.tick_scroll_delta = 0.0;
        if keep_ticking {
            ActiveTimerReturn::Continue
        } else {
            ActiveTimerReturn::Stop
        }
    }

    // =====================================================================
    // Tick
    // =====================================================================

    fn items_per_line(&self, geometry: &PanelGeometry) -> usize {
        match self.config.item_layout {
            ItemLayout::List => 1,
            ItemLayout::Tile { item_width } if item_width > 0.0 => {
                let line_axis = geometry.dimensions(self.config.orientation).line_axis;
                ((line_axis / item_width).floor() as usize).max(1)
            }
            ItemLayout::Tile { .. } => 1,
        }
    }

    /// The per-frame refresh.
    pub fn tick(
        &mut self,
        host: &mut dyn TableViewHost,
        geometry: PanelGeometry,
        _current_time: f64,
        delta_time: f32,
    ) {
        let geometry_changed = self.panel_size_last_tick != Some(geometry.size);

        if self.total_length_needs_refresh || geometry_changed {
            let items_per_line = self.items_per_line(&geometry);
            self.lines = host.measure_lines(items_per_line);
            self.total_length_needs_refresh = false;
        }

        if !(self.items_need_refresh || geometry_changed) {
            return;
        }

        self.panel_size_last_tick = Some(geometry.size);
        self.cached_geometry = geometry;
        let viewport = geometry.viewport_length(self.config.orientation);

        let into_view = host.scroll_into_view(&self.lines, viewport, self.desired_scroll_offset);
        if let Some(offset) = into_view.new_scroll_offset {
            self.set_scroll_offset(offset);
        }

        let target = self.target_scroll_offset();
        if self.config.animated_scrolling {
            let physics = self.config.physics;
            self.current_scroll_offset =
                interp_to(self.current_scroll_offset, target, delta_time, physics.interp_speed);
            if nearly_equal_within(self.current_scroll_offset, target, physics.snap_epsilon) {
                self.current_scroll_offset = target;
            }
        } else {
            self.current_scroll_offset = target;
        }
        self.target_scroll_offset = target;

        // Regenerate the visible window.
        let tile_width = match self.config.item_layout {
            ItemLayout::Tile { item_width } => Some(item_width),
            ItemLayout::List => None,
        };
        self.panel.set_tile_layout(tile_width, self.lines.items_per_line());
        let window = plan_generation(&self.lines, self.current_scroll_offset, viewport);
        let mut results = window.result;
        results.num_widgets_generated =
            host.regenerate_items(&mut self.panel, &self.lines, window.lines.clone(), &geometry);
        self.last_generate_results = results;
        tracing::trace!(
            lines = ?window.lines,
            widgets = results.num_widgets_generated,
            exact_lines = results.exact_lines_on_screen,
            past_last = results.generated_past_last_item,
            "regenerated items"
        );

        // Correct offsets the data can no longer support.
        let total = self.total_items_length();
        if total <= viewport {
            self.set_scroll_offset(0.0);
            self.current_scroll_offset = self.desired_scroll_offset;
            self.target_scroll_offset = self.desired_scroll_offset;
        } else if results.generated_past_last_item {
            self.set_scroll_offset(results.new_scroll_offset.max(0.0));
            self.current_scroll_offset = self.desired_scroll_offset;
            self.target_scroll_offset = self.desired_scroll_offset;
        }

        self.panel.set_first_line_scroll_offset(self.first_line_scroll_offset());
        if self.config.allow_overscroll {
            self.panel.set_overscroll_amount(self.overscroll.overscroll());
        }

        host.update_selection_set();

        // Scrollbar.
        if self.lines.num_items() > 0 && total > 0.0 {
            let offset_fraction = self.current_scroll_offset / total;
            let thumb_fraction = if results.exact_lines_on_screen < 1.0 {
                // A single line longer than the viewport.
                if results.length_of_generated_content > 0.0 {
                    (viewport / results.length_of_generated_content).min(1.0)
                } else {
                    1.0
                }
            } else {
                viewport / total
            };
            self.scrollbar.set_state(offset_fraction, thumb_fraction);
        } else {
            self.scrollbar.set_state(0.0, 1.0);
        }
        self.was_at_end_of_list =
            self.scrollbar.distance_from_bottom() < self.config.physics.end_of_list_epsilon;

        self.items_need_refresh = false;
        self.panel.set_refresh_pending(false);

        if into_view.result == ScrollIntoViewResult::Success {
            // Notify as soon as the row exists, even if still scrolling.
            host.notify_item_scrolled_into_view();
        }

        if into_view.result == ScrollIntoViewResult::Deferred
            || self.current_scroll_offset != self.target_scroll_offset
        {
            self.request_layout_refresh();
        } else {
            self.notifications.push(TableViewNotification::FinishedScrolling);
        }
    }

    // =====================================================================
    // Input
    // =====================================================================

    /// A press moved far enough with the right button (or a finger) down
    /// to count as dragging the list.
    pub fn is_right_click_scrolling(&self) -> bool {
        self.amount_scrolled_while_right_down >= self.config.physics.drag_trigger_distance
            && (self.scrollbar.is_needed() || self.config.allow_overscroll)
    }

    pub fn is_user_scrolling(&self) -> bool {
        (self.scrollbar.is_needed() && self.scrollbar.is_scrolling()) || self.is_right_click_scrolling()
    }

    fn scroll_axis_delta(&self, delta: Point, scale: f32) -> f32 {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        TableViewDimensions::from_point(self.config.orientation, delta).scroll_axis / scale
    }

    /// A finger went down somewhere in the list (seen before the rows).
    pub fn on_preview_touch_down(&mut self, position: Point) -> Reply {
        self.inertial.clear_scroll_velocity();
        self.amount_scrolled_while_right_down = 0.0;
        self.pressed_position = position;
        self.started_touch_interaction = true;
        Reply::unhandled()
    }

    pub fn on_mouse_button_down(&mut self, button: MouseButton, has_capture: bool) -> Reply {
        // Stop immediately on press even if the user never drags.
        self.inertial.clear_scroll_velocity();

        if button == MouseButton::Right && self.scrollbar.is_needed() {
            // No capture yet: the row must still see the release to select.
            self.amount_scrolled_while_right_down = 0.0;
            return Reply::handled();
        }
        if has_capture {
            return Reply::handled();
        }
        Reply::unhandled()
    }

    pub fn on_mouse_button_double_click(&mut self, has_capture: bool) -> Reply {
        if has_capture {
            Reply::handled()
        } else {
            Reply::unhandled()
        }
    }

    pub fn on_mouse_button_up(&mut self, button: MouseButton, position: Point) -> Reply {
        if button != MouseButton::Right {
            return Reply::unhandled();
        }
        if !self.is_right_click_scrolling() {
            self.notifications
                .push(TableViewNotification::ContextMenuRequested { position });
        }
        self.amount_scrolled_while_right_down = 0.0;
        Reply::handled().release_mouse_capture()
    }

    pub fn on_mouse_move(&mut self, delta: Point, right_button_down: bool, has_capture: bool) -> Reply {
        if !self.config.right_click_scrolling || !right_button_down {
            return Reply::unhandled();
        }
        let amount = self.scroll_axis_delta(delta, self.cached_geometry.scale);
        self.amount_scrolled_while_right_down += amount.abs();

        if !self.is_right_click_scrolling() {
            return Reply::unhandled();
        }
        self.register_inertial_timer();
        self.tick_scroll_delta -= amount;
        self.scroll_by(-amount, self.config.allow_overscroll);

        let reply = Reply::handled();
        if has_capture {
            reply
        } else {
            reply.capture_mouse(self.id)
        }
    }

    pub fn on_mouse_enter(&mut self, position: Point, touch: bool) {
        if touch && !self.started_touch_interaction && self.cached_geometry.is_under_location(position) {
            self.started_touch_interaction = true;
        }
    }

    pub fn on_mouse_leave(&mut self, has_capture: bool) {
        self.started_touch_interaction = false;
        if !has_capture {
            self.amount_scrolled_while_right_down = 0.0;
        }
    }

    pub fn on_mouse_wheel(&mut self, wheel_delta: f32, modifiers: Modifiers) -> Reply {
        if modifiers.ctrl {
            return Reply::unhandled();
        }
        // Residual fling must not fight the wheel.
        self.inertial.clear_scroll_velocity();

        let multiplier = self.config.wheel_scroll_multiplier;
        let amount = if self.config.fixed_line_scroll_offset.is_some() {
            let notches = (wheel_delta.abs() * multiplier).round().max(1.0);
            let line = self.lines.line_at_offset(self.desired_scroll_offset);
            let new_line = if wheel_delta >= 0.0 {
                line.ceil() - notches
            } else {
                line.floor() + notches
            };
            let new_offset = self.lines.offset_at_line(new_line).max(0.0);
            self.scroll_to(new_offset)
        } else {
            let delta = -wheel_delta * self.config.physics.wheel_scroll_amount * multiplier;
            self.scroll_by(delta, false)
        };

        let consume = match self.config.consume_mouse_wheel {
            ConsumeMouseWheel::Always => true,
            ConsumeMouseWheel::WhenScrollingPossible => amount.abs() > 0.0,
            ConsumeMouseWheel::Never => false,
        };
        if consume {
            Reply::handled()
        } else {
            Reply::unhandled()
        }
    }

    pub fn on_key_down(&mut self, event: KeyEvent) -> Reply {
        if event.modifiers.ctrl && event.key == Key::End {
            self.scroll_to_bottom();
            return Reply::handled();
        }
        Reply::unhandled()
    }

    pub fn on_touch_moved(&mut self, position: Point, delta: Point, has_capture: bool) -> Reply {
        if !self.started_touch_interaction {
            return Reply::unhandled();
        }
        let amount = self.scroll_axis_delta(delta, self.cached_geometry.scale);
        self.amount_scrolled_while_right_down += amount.abs();
        self.tick_scroll_delta -= amount;

        let travelled = TableViewDimensions::from_point(
            self.config.orientation,
            position - self.pressed_position,
        )
        .scroll_axis
        .abs();
        if travelled < self.config.physics.drag_trigger_distance {
            return Reply::unhandled();
        }

        self.register_inertial_timer();
        let moved = self.scroll_by(-amount, self.config.allow_overscroll);
        if moved != 0.0 {
            self.scrollbar.begin_scrolling();
            let reply = Reply::handled();
            return if has_capture {
                reply
            } else {
                reply.capture_mouse(self.id)
            };
        }
        Reply::unhandled()
    }

    pub fn on_touch_ended(&mut self, has_capture: bool) -> Reply {
        self.amount_scrolled_while_right_down = 0.0;
        self.started_touch_interaction = false;
        self.scrollbar.end_scrolling();
        if has_capture {
            Reply::handled().release_mouse_capture()
        } else {
            Reply::unhandled()
        }
    }
}

fn nearly_equal_within(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::PanelChild;

    /// Host with fixed item extents and no typed items.
    #[derive(Default)]
    struct FixedHost {
        extents: Vec<f32>,
        generated: Vec<usize>,
        regenerations: usize,
        into_view: Option<ScrollIntoView>,
        notified: usize,
    }

    impl FixedHost {
        fn uniform(count: usize, extent: f32) -> Self {
            Self {
                extents: vec![extent; count],
                ..Self::default()
            }
        }
    }

    impl TableViewHost for FixedHost {
        fn measure_lines(&self, items_per_line: usize) -> LineMetrics {
            LineMetrics::from_extents(self.extents.iter().copied(), items_per_line)
        }

        fn scroll_into_view(&mut self, _lines: &LineMetrics, _viewport: f32, _offset: f32) -> ScrollIntoView {
            self.into_view.take().unwrap_or(ScrollIntoView::success())
        }

        fn regenerate_items(
            &mut self,
            panel: &mut ListPanel,
            lines: &LineMetrics,
            window: Range<usize>,
            _geometry: &PanelGeometry,
        ) -> usize {
            self.regenerations += 1;
            panel.clear_items();
            self.generated.clear();
            for line in window {
                for index in lines.items_in_line(line) {
                    self.generated.push(index);
                    panel.add_slot(PanelChild::new(WidgetId::new(), Size::new(100.0, self.extents[index])), None);
                }
            }
            self.generated.len()
        }

        fn update_selection_set(&mut self) {}

        fn notify_item_scrolled_into_view(&mut self) {
            self.notified += 1;
        }
    }

    const GEOMETRY: PanelGeometry = PanelGeometry::sized(100.0, 120.0);
    const DT: f32 = 1.0 / 60.0;

    fn settled(config: TableViewConfig, host: &mut FixedHost) -> TableViewBase {
        let mut base = TableViewBase::new(config);
        base.request_list_refresh();
        base.tick(host, GEOMETRY, 0.0, DT);
        base
    }

    #[test]
    fn plans_partial_first_line() {
        let lines = LineMetrics::from_extents([50.0; 10], 1);
        let window = plan_generation(&lines, 75.0, 120.0);

        assert_eq!(window.lines, 1..4);
        assert_eq!(window.result.length_of_generated_content, 150.0);
        assert!((window.result.exact_lines_on_screen - 2.4).abs() < 1e-4);
        assert!(!window.result.generated_past_last_item);
    }

    #[test]
    fn plans_backfill_past_last_item() {
        let lines = LineMetrics::from_extents([50.0; 4], 1);
        let window = plan_generation(&lines, 150.0, 120.0);

        assert_eq!(window.lines, 1..4);
        assert!(window.result.generated_past_last_item);
        assert_eq!(window.result.new_scroll_offset, 80.0);
    }

    #[test]
    fn empty_or_zero_viewport_generates_nothing() {
        let lines = LineMetrics::from_extents([50.0; 4], 1);
        assert_eq!(plan_generation(&lines, 0.0, 0.0).lines, 0..0);
        assert_eq!(plan_generation(&LineMetrics::empty(), 0.0, 100.0).lines, 0..0);
    }

    #[test]
    fn tick_converges_and_goes_idle() {
        let mut host = FixedHost::uniform(10, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);
        assert!(!base.is_pending_refresh());
        assert_eq!(host.generated, vec![0, 1, 2]);

        base.set_scroll_offset(75.0);
        assert!(base.is_pending_refresh());
        base.tick(&mut host, GEOMETRY, 0.0, DT);

        assert_eq!(base.current_scroll_offset(), 75.0);
        assert_eq!(base.scroll_offset(), 75.0);
        assert!(!base.is_pending_refresh());
        assert_eq!(host.generated, vec![1, 2, 3]);
        assert!((base.first_line_scroll_offset() - 0.5).abs() < 1e-6);
        assert!(base
            .drain_notifications()
            .contains(&TableViewNotification::FinishedScrolling));

        let passes = host.regenerations;
        base.tick(&mut host, GEOMETRY, 0.0, DT);
        assert_eq!(host.regenerations, passes);
    }

    #[test]
    fn short_content_resets_offset() {
        let mut host = FixedHost::uniform(2, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);
        base.set_scroll_offset(40.0);
        base.tick(&mut host, GEOMETRY, 0.0, DT);

        assert_eq!(base.scroll_offset(), 0.0);
        assert_eq!(base.current_scroll_offset(), 0.0);
        assert!(!base.is_scrollbar_needed());
    }

    #[test]
    fn shrinking_items_pulls_offset_back() {
        let mut host = FixedHost::uniform(10, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);
        base.set_scroll_offset(380.0);
        base.tick(&mut host, GEOMETRY, 0.0, DT);

        host.extents.truncate(4);
        base.request_list_refresh();
        base.tick(&mut host, GEOMETRY, 0.0, DT);

        assert_eq!(base.scroll_offset(), 80.0);
        assert_eq!(base.current_scroll_offset(), 80.0);
        assert_eq!(host.generated, vec![1, 2, 3]);
    }

    #[test]
    fn overscroll_absorbs_scroll_at_top() {
        let mut host = FixedHost::uniform(10, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);

        let consumed = base.scroll_by(-30.0, true);
        assert_eq!(consumed, 30.0);
        assert_eq!(base.scroll_offset(), 0.0);
        assert_eq!(base.raw_overscroll_amount(), -30.0);
        assert!(base.overscroll_amount() < 0.0);

        // Without overscroll the top simply clamps.
        let mut base = settled(TableViewConfig::default(), &mut host);
        base.scroll_by(-30.0, false);
        assert_eq!(base.scroll_offset(), 0.0);
        assert_eq!(base.raw_overscroll_amount(), 0.0);
    }

    #[test]
    fn scroll_to_clamps_with_slack() {
        let mut host = FixedHost::uniform(10, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);

        base.scroll_to(-1000.0);
        assert_eq!(base.scroll_offset(), 0.0);
        base.scroll_to(100_000.0);
        assert_eq!(base.scroll_offset(), 510.0);

        base.tick(&mut host, GEOMETRY, 0.0, DT);
        assert_eq!(base.scroll_offset(), 380.0);
    }

    #[test]
    fn scrolled_notification_reports_distance_remaining() {
        let mut host = FixedHost::uniform(10, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);
        base.drain_notifications();

        base.set_scroll_offset(100.0);
        base.set_scroll_offset(100.0);
        assert_eq!(
            base.drain_notifications(),
            vec![TableViewNotification::Scrolled {
                offset: 100.0,
                distance_remaining: 280.0,
            }]
        );
    }

    #[test]
    fn fixed_line_offset_anchors_target() {
        let mut host = FixedHost::uniform(10, 50.0);
        let config = TableViewConfig {
            fixed_line_scroll_offset: Some(0.5),
            ..TableViewConfig::default()
        };
        let mut base = settled(config, &mut host);
        base.set_scroll_offset(120.0);
        base.tick(&mut host, GEOMETRY, 0.0, DT);

        assert_eq!(base.scroll_offset(), 120.0);
        assert_eq!(base.current_scroll_offset(), 75.0);
    }

    #[test]
    fn animated_scrolling_approaches_target() {
        let mut host = FixedHost::uniform(10, 50.0);
        let config = TableViewConfig {
            animated_scrolling: true,
            ..TableViewConfig::default()
        };
        let mut base = settled(config, &mut host);
        base.set_scroll_offset(100.0);
        base.tick(&mut host, GEOMETRY, 0.0, DT);

        let first = base.current_scroll_offset();
        assert!(first > 0.0 && first < 100.0);
        assert!(base.is_pending_refresh());

        for frame in 0..200 {
            if !base.is_pending_refresh() {
                break;
            }
            base.tick(&mut host, GEOMETRY, f64::from(frame) * f64::from(DT), DT);
        }
        assert_eq!(base.current_scroll_offset(), 100.0);
        assert!(!base.is_pending_refresh());
    }

    #[test]
    fn deferred_scroll_into_view_keeps_refreshing() {
        let mut host = FixedHost::uniform(10, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);
        host.into_view = Some(ScrollIntoView::deferred());
        base.request_layout_refresh();
        base.tick(&mut host, GEOMETRY, 0.0, DT);

        assert!(base.is_pending_refresh());
        let notified = host.notified;
        base.tick(&mut host, GEOMETRY, 0.0, DT);
        assert_eq!(host.notified, notified + 1);
        assert!(!base.is_pending_refresh());
    }

    #[test]
    fn right_drag_flings_after_release() {
        let mut host = FixedHost::uniform(40, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);

        base.on_mouse_button_down(MouseButton::Right, false);
        let reply = base.on_mouse_move(Point::new(0.0, -10.0), true, false);
        assert!(base.is_right_click_scrolling());
        assert_eq!(reply, Reply::handled().capture_mouse(base.id()));
        assert!(base.is_timer_registered(TimerKind::UpdateInertialScroll));
        base.run_active_timers(0.0, 0.05);

        base.on_mouse_move(Point::new(0.0, -10.0), true, true);
        base.run_active_timers(0.05, 0.05);
        assert_eq!(base.scroll_offset(), 20.0);

        let reply = base.on_mouse_button_up(MouseButton::Right, Point::ORIGIN);
        assert_eq!(reply, Reply::handled().release_mouse_capture());
        assert!(base.drain_notifications().iter().all(|n| !matches!(
            n,
            TableViewNotification::ContextMenuRequested { .. }
        )));

        base.run_active_timers(0.1, 0.05);
        assert!(base.scroll_velocity() > 0.0);
        assert!(base.scroll_offset() > 20.0);

        for frame in 3..200 {
            base.run_active_timers(f64::from(frame) * 0.05, 0.05);
        }
        assert!(!base.is_timer_registered(TimerKind::UpdateInertialScroll));
        assert_eq!(base.scroll_velocity(), 0.0);
    }

    #[test]
    fn right_click_without_drag_requests_context_menu() {
        let mut host = FixedHost::uniform(40, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);
        base.drain_notifications();

        base.on_mouse_button_down(MouseButton::Right, false);
        base.on_mouse_move(Point::new(0.0, 2.0), true, false);
        base.on_mouse_button_up(MouseButton::Right, Point::new(4.0, 5.0));

        assert_eq!(
            base.drain_notifications(),
            vec![TableViewNotification::ContextMenuRequested {
                position: Point::new(4.0, 5.0)
            }]
        );
    }

    #[test]
    fn overscroll_bounces_back_through_timer() {
        let mut host = FixedHost::uniform(10, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);
        base.scroll_by(-40.0, true);
        base.on_touch_ended(false);
        assert!(base.is_timer_registered(TimerKind::UpdateInertialScroll));

        for frame in 0..100 {
            base.run_active_timers(f64::from(frame) * 0.05, 0.05);
        }
        assert_eq!(base.raw_overscroll_amount(), 0.0);
        assert!(!base.is_timer_registered(TimerKind::UpdateInertialScroll));
    }

    #[test]
    fn wheel_respects_consume_policy() {
        let mut host = FixedHost::uniform(10, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);

        assert!(base.on_mouse_wheel(-1.0, Modifiers::NONE).is_handled());
        assert_eq!(base.scroll_offset(), 32.0);

        // Already at the top: nothing moves, so the wheel passes through.
        let mut base = settled(TableViewConfig::default(), &mut host);
        assert!(!base.on_mouse_wheel(1.0, Modifiers::NONE).is_handled());
        base.set_consume_mouse_wheel(ConsumeMouseWheel::Always);
        assert!(base.on_mouse_wheel(1.0, Modifiers::NONE).is_handled());
        assert!(!base.on_mouse_wheel(-1.0, Modifiers::CTRL).is_handled());
    }

    #[test]
    fn wheel_moves_whole_lines_with_fixed_offset() {
        let mut host = FixedHost::uniform(10, 50.0);
        let config = TableViewConfig {
            fixed_line_scroll_offset: Some(0.0),
            ..TableViewConfig::default()
        };
        let mut base = settled(config, &mut host);

        base.on_mouse_wheel(-1.0, Modifiers::NONE);
        assert_eq!(base.scroll_offset(), 50.0);
        base.on_mouse_wheel(-2.0, Modifiers::NONE);
        assert_eq!(base.scroll_offset(), 150.0);
        base.on_mouse_wheel(1.0, Modifiers::NONE);
        assert_eq!(base.scroll_offset(), 100.0);
    }

    #[test]
    fn ctrl_end_scrolls_to_bottom() {
        let mut host = FixedHost::uniform(10, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);

        assert!(!base.on_key_down(KeyEvent::new(Key::End)).is_handled());
        assert!(base
            .on_key_down(KeyEvent::with_modifiers(Key::End, Modifiers::CTRL))
            .is_handled());
        assert_eq!(base.scroll_offset(), 380.0);
    }

    #[test]
    fn touch_drag_scrolls_past_trigger() {
        let mut host = FixedHost::uniform(10, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);

        base.on_preview_touch_down(Point::new(10.0, 100.0));
        let reply = base.on_touch_moved(Point::new(10.0, 98.0), Point::new(0.0, -2.0), false);
        assert!(!reply.is_handled());
        assert_eq!(base.scroll_offset(), 0.0);

        let reply = base.on_touch_moved(Point::new(10.0, 90.0), Point::new(0.0, -8.0), false);
        assert_eq!(reply, Reply::handled().capture_mouse(base.id()));
        assert_eq!(base.scroll_offset(), 8.0);
        assert!(base.is_user_scrolling());

        let reply = base.on_touch_ended(true);
        assert_eq!(reply, Reply::handled().release_mouse_capture());
        assert!(!base.is_right_click_scrolling());
    }

    #[test]
    fn scrollbar_drag_maps_fraction_to_offset() {
        let mut host = FixedHost::uniform(10, 50.0);
        let mut base = settled(TableViewConfig::default(), &mut host);
        assert!((base.scrollbar().thumb_size_fraction() - 0.24).abs() < 1e-6);

        base.on_scrollbar_user_scrolled(0.5);
        assert_eq!(base.scroll_offset(), 250.0);
        base.on_scrollbar_user_scrolled(1.0);
        assert_eq!(base.scroll_offset(), 380.0);
    }

    #[test]
    fn tile_layout_wraps_items_into_lines() {
        let mut host = FixedHost::uniform(7, 40.0);
        let config = TableViewConfig {
            item_layout: ItemLayout::Tile { item_width: 30.0 },
            ..TableViewConfig::default()
        };
        let base = settled(config, &mut host);

        assert_eq!(base.lines().items_per_line(), 3);
        assert_eq!(base.total_items_length(), 120.0);
        assert_eq!(host.generated, (0..7).collect::<Vec<_>>());
    }
}
