//! List Panel - arranges generated rows along the scroll axis.
//!
//! The panel knows nothing about items. It holds the row widgets the table
//! generated this pass, in display order, and lays them out starting at a
//! fractional first-line offset shifted by the current overscroll.

use crate::primitives::{Orientation, Point, Rect, Size, TableViewDimensions};
use crate::widget_id::WidgetId;

/// One generated row as the panel sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelChild {
    pub widget: WidgetId,
    /// Desired size of the row.
    pub desired_size: Size,
    pub visible: bool,
}

impl PanelChild {
    pub fn new(widget: WidgetId, desired_size: Size) -> Self {
        Self {
            widget,
            desired_size,
            visible: true,
        }
    }
}

/// A child with its final panel-local rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrangedChild {
    pub widget: WidgetId,
    pub rect: Rect,
}

#[derive(Debug, Clone)]
pub struct ListPanel {
    orientation: Orientation,
    /// Line-axis width of a tile, or `None` for a plain list.
    tile_width: Option<f32>,
    items_per_line: usize,
    children: Vec<PanelChild>,
    first_line_scroll_offset: f32,
    overscroll_amount: f32,
    refresh_pending: bool,
    preferred_num_lines: Option<usize>,
}

impl ListPanel {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            tile_width: None,
            items_per_line: 1,
            children: Vec::new(),
            first_line_scroll_offset: 0.0,
            overscroll_amount: 0.0,
            refresh_pending: false,
            preferred_num_lines: None,
        }
    }

    /// Wrap children into lines of `items_per_line` tiles `tile_width` wide.
    pub fn set_tile_layout(&mut self, tile_width: Option<f32>, items_per_line: usize) {
        self.tile_width = tile_width;
        self.items_per_line = if tile_width.is_some() {
            items_per_line.max(1)
        } else {
            1
        };
    }

    pub fn set_preferred_num_lines(&mut self, lines: Option<usize>) {
        self.preferred_num_lines = lines;
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    // =====================================================================
    // Children
    // =====================================================================

    /// Insert a child at `index`, or append when `None`.
    pub fn add_slot(&mut self, child: PanelChild, index: Option<usize>) {
        match index {
            Some(index) => self.children.insert(index.min(self.children.len()), child),
            None => self.children.push(child),
        }
    }

    pub fn clear_items(&mut self) {
        self.children.clear();
    }

    /// Children safe to query. Empty while a refresh is pending, since some
    /// rows may still be bound to items that no longer exist.
    pub fn children(&self) -> &[PanelChild] {
        if self.refresh_pending {
            &[]
        } else {
            &self.children
        }
    }

    /// Every child, regardless of refresh state.
    pub fn all_children(&self) -> &[PanelChild] {
        &self.children
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn set_child_visible(&mut self, widget: WidgetId, visible: bool) {
        if let Some(child) = self.children.iter_mut().find(|c| c.widget == widget) {
            child.visible = visible;
        }
    }

    // =====================================================================
    // Scroll state pushed down from the table
    // =====================================================================

    /// Fraction of the first line scrolled out of view.
    pub fn set_first_line_scroll_offset(&mut self, offset: f32) {
        self.first_line_scroll_offset = offset.max(0.0);
    }

    pub fn first_line_scroll_offset(&self) -> f32 {
        self.first_line_scroll_offset
    }

    /// How far the list appears scrolled past either end.
    pub fn set_overscroll_amount(&mut self, amount: f32) {
        self.overscroll_amount = amount;
    }

    pub fn overscroll_amount(&self) -> f32 {
        self.overscroll_amount
    }

    pub fn set_refresh_pending(&mut self, pending: bool) {
        self.refresh_pending = pending;
    }

    pub fn is_refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    // =====================================================================
    // Layout
    // =====================================================================

    fn dims(&self, size: Size) -> TableViewDimensions {
        TableViewDimensions::from_size(self.orientation, size)
    }

    /// Scroll-axis extents of each line of children.
    fn line_extents(&self, respect_visibility: bool) -> Vec<f32> {
        self.children
            .chunks(self.items_per_line)
            .map(|line| {
                line.iter()
                    .filter(|c| !respect_visibility || c.visible)
                    .map(|c| self.dims(c.desired_size).scroll_axis)
                    .fold(0.0, f32::max)
            })
            .collect()
    }

    /// Lay the children out inside `allotted`.
    pub fn arrange_children(&self, allotted: Size) -> Vec<ArrangedChild> {
        if self.children.is_empty() {
            return Vec::new();
        }
        let allotted_dims = self.dims(allotted);
        let extents = self.line_extents(true);

        let whole_lines = (self.first_line_scroll_offset.floor() as usize).min(extents.len());
        let mut scrolled: f32 = extents[..whole_lines].iter().sum();
        if let Some(partial) = extents.get(whole_lines) {
            scrolled += self.first_line_scroll_offset.fract() * partial;
        }
        let mut scroll_pos = -scrolled.floor() - self.overscroll_amount;

        let mut arranged = Vec::with_capacity(self.children.len());
        for (line, extent) in self.children.chunks(self.items_per_line).zip(&extents) {
            for (column, child) in line.iter().enumerate() {
                let own = self.dims(child.desired_size).scroll_axis;
                let scroll_axis = if child.visible { own } else { 0.0 };
                let (line_pos, line_len) = match self.tile_width {
                    Some(width) => (column as f32 * width, width),
                    None => (0.0, allotted_dims.line_axis),
                };
                let origin = TableViewDimensions {
                    orientation: self.orientation,
                    scroll_axis: scroll_pos,
                    line_axis: line_pos,
                };
                let size = TableViewDimensions {
                    orientation: self.orientation,
                    scroll_axis,
                    line_axis: line_len,
                };
                arranged.push(ArrangedChild {
                    widget: child.widget,
                    rect: Rect::from_origin_size(origin.to_point(), size.to_size()),
                });
            }
            scroll_pos += extent;
        }
        arranged
    }

    /// Child under a panel-local point.
    pub fn child_at(&self, allotted: Size, local: Point) -> Option<WidgetId> {
        self.arrange_children(allotted)
            .into_iter()
            .find(|child| child.rect.contains(local))
            .map(|child| child.widget)
    }

    /// Sum of line extents along the scroll axis (visibility ignored) and
    /// the widest line along the line axis. With a preferred line count the
    /// scroll axis is the average line extent times that count.
    pub fn compute_desired_size(&self) -> Size {
        let mut desired = TableViewDimensions::zero(self.orientation);
        let extents = self.line_extents(false);

        for line in self.children.chunks(self.items_per_line) {
            let line_axis = match self.tile_width {
                Some(width) => width * line.len() as f32,
                None => line
                    .iter()
                    .map(|c| self.dims(c.desired_size).line_axis)
                    .fold(0.0, f32::max),
            };
            desired.line_axis = desired.line_axis.max(line_axis);
        }
        desired.scroll_axis = extents.iter().sum();

        if let Some(preferred) = self.preferred_num_lines {
            if !extents.is_empty() {
                desired.scroll_axis = desired.scroll_axis / extents.len() as f32 * preferred as f32;
            }
        }
        desired.to_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_with(heights: &[f32]) -> (ListPanel, Vec<WidgetId>) {
        let mut panel = ListPanel::new(Orientation::Vertical);
        let ids: Vec<_> = heights.iter().map(|_| WidgetId::new()).collect();
        for (id, h) in ids.iter().zip(heights) {
            panel.add_slot(PanelChild::new(*id, Size::new(80.0, *h)), None);
        }
        (panel, ids)
    }

    #[test]
    fn arranges_from_fractional_first_line() {
        let (mut panel, ids) = panel_with(&[40.0, 40.0, 40.0]);
        panel.set_first_line_scroll_offset(0.5);
        let arranged = panel.arrange_children(Size::new(200.0, 100.0));

        assert_eq!(arranged[0].widget, ids[0]);
        assert_eq!(arranged[0].rect, Rect::new(0.0, -20.0, 200.0, 40.0));
        assert_eq!(arranged[2].rect.y, 60.0);
    }

    #[test]
    fn overscroll_shifts_children() {
        let (mut panel, _) = panel_with(&[30.0]);
        panel.set_overscroll_amount(-12.0);
        let arranged = panel.arrange_children(Size::new(100.0, 100.0));
        assert_eq!(arranged[0].rect.y, 12.0);
    }

    #[test]
    fn hidden_children_take_no_space() {
        let (mut panel, ids) = panel_with(&[30.0, 30.0, 30.0]);
        panel.set_child_visible(ids[1], false);
        let arranged = panel.arrange_children(Size::new(100.0, 100.0));
        assert_eq!(arranged[1].rect.height, 0.0);
        assert_eq!(arranged[2].rect.y, 30.0);
    }

    #[test]
    fn pending_refresh_hides_children() {
        let (mut panel, _) = panel_with(&[10.0, 10.0]);
        panel.set_refresh_pending(true);
        assert!(panel.children().is_empty());
        assert_eq!(panel.all_children().len(), 2);
    }

    #[test]
    fn desired_size_uses_preferred_lines() {
        let (mut panel, _) = panel_with(&[10.0, 30.0]);
        assert_eq!(panel.compute_desired_size(), Size::new(80.0, 40.0));
        panel.set_preferred_num_lines(Some(5));
        assert_eq!(panel.compute_desired_size(), Size::new(80.0, 100.0));

        let empty = ListPanel::new(Orientation::Vertical);
        assert_eq!(empty.compute_desired_size(), Size::ZERO);
    }

    #[test]
    fn tiles_wrap_along_line_axis() {
        let mut panel = ListPanel::new(Orientation::Vertical);
        panel.set_tile_layout(Some(50.0), 2);
        let ids: Vec<_> = (0..3).map(|_| WidgetId::new()).collect();
        for id in &ids {
            panel.add_slot(PanelChild::new(*id, Size::new(50.0, 20.0)), None);
        }
        let arranged = panel.arrange_children(Size::new(100.0, 100.0));
        assert_eq!(arranged[1].rect, Rect::new(50.0, 0.0, 50.0, 20.0));
        assert_eq!(arranged[2].rect, Rect::new(0.0, 20.0, 50.0, 20.0));
        assert_eq!(panel.child_at(Size::new(100.0, 100.0), Point::new(60.0, 5.0)), Some(ids[1]));
    }
}
