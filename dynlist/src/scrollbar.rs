//! Scrollbar state.
//!
//! The scrollbar is described entirely by two fractions of the content
//! length: where the thumb starts and how long it is.

/// Thumb position and size as fractions of the total content length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollBarState {
    offset_fraction: f32,
    thumb_size_fraction: f32,
    is_scrolling: bool,
}

impl ScrollBarState {
    pub fn new() -> Self {
        Self {
            offset_fraction: 0.0,
            thumb_size_fraction: 1.0,
            is_scrolling: false,
        }
    }

    /// Set the thumb. The size is clamped to [0, 1] and the offset so the
    /// thumb stays inside the track.
    pub fn set_state(&mut self, offset_fraction: f32, thumb_size_fraction: f32) {
        let size = if thumb_size_fraction.is_finite() {
            thumb_size_fraction.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let offset = if offset_fraction.is_finite() {
            offset_fraction.clamp(0.0, 1.0 - size)
        } else {
            0.0
        };
        self.offset_fraction = offset;
        self.thumb_size_fraction = size;
    }

    pub fn offset_fraction(&self) -> f32 {
        self.offset_fraction
    }

    pub fn thumb_size_fraction(&self) -> f32 {
        self.thumb_size_fraction
    }

    /// The content is longer than the viewport.
    pub fn is_needed(&self) -> bool {
        self.thumb_size_fraction < 1.0
    }

    pub fn distance_from_top(&self) -> f32 {
        self.offset_fraction
    }

    pub fn distance_from_bottom(&self) -> f32 {
        1.0 - (self.offset_fraction + self.thumb_size_fraction)
    }

    pub fn begin_scrolling(&mut self) {
        self.is_scrolling = true;
    }

    pub fn end_scrolling(&mut self) {
        self.is_scrolling = false;
    }

    pub fn is_scrolling(&self) -> bool {
        self.is_scrolling
    }
}

impl Default for ScrollBarState {
    fn default() -> Self {
        Self::new()
    }
}
