//! Table view configuration.
//!
//! All scroll-feel tuning values live in [`ScrollPhysics`] rather than being
//! hard-coded at their use sites.

use serde::{Deserialize, Serialize};

use crate::error::ListError;
use crate::primitives::Orientation;
use crate::selection::SelectionMode;

/// Scroll physics tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollPhysics {
    /// Exponential interpolation rate for animated scrolling.
    pub interp_speed: f32,
    /// Animated scrolling snaps to the target within this distance.
    pub snap_epsilon: f32,
    /// Pointer travel (local units) before a press turns into a drag-scroll.
    pub drag_trigger_distance: f32,
    /// Scroll distance per wheel notch.
    pub wheel_scroll_amount: f32,
    /// Slack allowed past either end of the content in `scroll_to`.
    pub end_slack: f32,
    /// Maximum visual overscroll distance.
    pub overshoot_max: f32,
    /// Rate (units/s) at which overscroll springs back.
    pub overshoot_bounce_rate: f32,
    /// Velocity-proportional deceleration for inertial scrolling.
    pub inertial_friction: f32,
    /// Constant deceleration for inertial scrolling.
    pub inertial_static_drag: f32,
    /// Drag samples older than this (seconds) are discarded.
    pub inertial_sample_timeout: f64,
    /// Scrollbar distance below which the list counts as "at the end".
    pub end_of_list_epsilon: f32,
}

impl Default for ScrollPhysics {
    fn default() -> Self {
        Self {
            interp_speed: 12.0,
            snap_epsilon: 0.01,
            drag_trigger_distance: 5.0,
            wheel_scroll_amount: 32.0,
            end_slack: 10.0,
            overshoot_max: 150.0,
            overshoot_bounce_rate: 250.0,
            inertial_friction: 2.0,
            inertial_static_drag: 100.0,
            inertial_sample_timeout: 0.1,
            end_of_list_epsilon: 1e-8,
        }
    }
}

/// When the list consumes mouse wheel events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConsumeMouseWheel {
    /// Only when the wheel actually moved the list.
    #[default]
    WhenScrollingPossible,
    Always,
    Never,
}

/// How items are laid out along the line axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ItemLayout {
    /// One item per line.
    #[default]
    List,
    /// Wrap items of a fixed line-axis width into as many columns as fit.
    Tile { item_width: f32 },
}

/// Configuration for a list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableViewConfig {
    pub orientation: Orientation,
    pub item_layout: ItemLayout,
    /// Extra scroll-axis space before every entry except the first.
    pub entry_spacing: f32,
    pub selection_mode: SelectionMode,
    /// When set, the resting scroll offset snaps to a whole line minus this
    /// fraction of a line.
    pub fixed_line_scroll_offset: Option<f32>,
    pub animated_scrolling: bool,
    pub allow_overscroll: bool,
    pub right_click_scrolling: bool,
    pub wheel_scroll_multiplier: f32,
    pub consume_mouse_wheel: ConsumeMouseWheel,
    /// Lines to reserve when computing the panel's desired size.
    pub preferred_num_lines: Option<usize>,
    pub physics: ScrollPhysics,
}

impl Default for TableViewConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Vertical,
            item_layout: ItemLayout::List,
            entry_spacing: 0.0,
            selection_mode: SelectionMode::Single,
            fixed_line_scroll_offset: None,
            animated_scrolling: false,
            allow_overscroll: true,
            right_click_scrolling: true,
            wheel_scroll_multiplier: 1.0,
            consume_mouse_wheel: ConsumeMouseWheel::WhenScrollingPossible,
            preferred_num_lines: None,
            physics: ScrollPhysics::default(),
        }
    }
}

impl TableViewConfig {
    /// Check values that would make the engine misbehave.
    pub fn validate(&self) -> Result<(), ListError> {
        if let ItemLayout::Tile { item_width } = self.item_layout {
            if !(item_width > 0.0) {
                return Err(ListError::Config(format!(
                    "tile item width must be positive, got {item_width}"
                )));
            }
        }
        if let Some(fraction) = self.fixed_line_scroll_offset {
            if !(0.0..1.0).contains(&fraction) {
                return Err(ListError::Config(format!(
                    "fixed line scroll offset must be in [0, 1), got {fraction}"
                )));
            }
        }
        if self.entry_spacing < 0.0 {
            return Err(ListError::Config("entry spacing must not be negative".into()));
        }
        if !(self.physics.interp_speed > 0.0) {
            return Err(ListError::Config("interp speed must be positive".into()));
        }
        if self.physics.inertial_sample_timeout <= 0.0 {
            return Err(ListError::Config("inertial sample timeout must be positive".into()));
        }
        Ok(())
    }
}
