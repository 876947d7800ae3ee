//! Input events and replies.
//!
//! Pointer events arrive in absolute (screen) coordinates. Handlers answer
//! with a [`Reply`] that combines "handled" with pointer capture and drag
//! detection requests, so a row can select an item AND grab the pointer in
//! one step.

use crate::primitives::Point;
use crate::widget_id::WidgetId;

/// Capture state for pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// No capture - events route based on hit-testing.
    #[default]
    None,

    /// Captured by a specific widget.
    /// All pointer events go to this widget until released.
    Captured(WidgetId),
}

impl CaptureState {
    pub fn is_captured(&self) -> bool {
        matches!(self, CaptureState::Captured(_))
    }

    pub fn captured_by(&self) -> Option<WidgetId> {
        match self {
            CaptureState::Captured(id) => Some(*id),
            CaptureState::None => None,
        }
    }

    pub fn is_captured_by(&self, id: WidgetId) -> bool {
        self.captured_by() == Some(id)
    }
}

/// Mouse button types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
    };
}

/// Pointer event types.
#[derive(Debug, Clone)]
pub enum PointerEvent {
    /// Mouse button pressed.
    ButtonPressed { button: MouseButton, position: Point },

    /// Mouse button released.
    ButtonReleased { button: MouseButton, position: Point },

    /// Mouse button double-clicked.
    DoubleClicked { button: MouseButton, position: Point },

    /// Mouse cursor moved by `delta` screen units.
    CursorMoved {
        position: Point,
        delta: Point,
        right_button_down: bool,
    },

    /// Mouse wheel scrolled by `delta` notches (positive = towards the start).
    WheelScrolled {
        delta: f32,
        position: Point,
        modifiers: Modifiers,
    },

    /// Pointer entered the list.
    Entered { position: Point, touch: bool },

    /// Pointer left the list.
    Left { touch: bool },

    /// Finger down.
    TouchStarted { position: Point },

    /// Finger moved by `delta` screen units.
    TouchMoved { position: Point, delta: Point },

    /// Finger lifted.
    TouchEnded { position: Point },
}

impl PointerEvent {
    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::ButtonPressed { position, .. }
            | PointerEvent::ButtonReleased { position, .. }
            | PointerEvent::DoubleClicked { position, .. }
            | PointerEvent::CursorMoved { position, .. }
            | PointerEvent::WheelScrolled { position, .. }
            | PointerEvent::Entered { position, .. }
            | PointerEvent::TouchStarted { position }
            | PointerEvent::TouchMoved { position, .. }
            | PointerEvent::TouchEnded { position } => Some(*position),
            PointerEvent::Left { .. } => None,
        }
    }
}

/// Keys the list reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Other,
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub const fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// Request to change pointer capture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureRequest {
    /// No change to capture state.
    #[default]
    None,

    /// Capture the pointer for the specified widget.
    Capture(WidgetId),

    /// Release pointer capture.
    Release,
}

/// Response from an input handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reply {
    /// Whether the event was consumed.
    pub handled: bool,

    /// Pointer capture request.
    pub capture: CaptureRequest,

    /// Ask the router to watch for a drag starting on this widget.
    pub detect_drag: Option<WidgetId>,
}

impl Reply {
    pub fn unhandled() -> Self {
        Self::default()
    }

    pub fn handled() -> Self {
        Self {
            handled: true,
            ..Self::default()
        }
    }

    pub fn capture_mouse(mut self, id: WidgetId) -> Self {
        self.capture = CaptureRequest::Capture(id);
        self
    }

    pub fn release_mouse_capture(mut self) -> Self {
        self.capture = CaptureRequest::Release;
        self
    }

    pub fn detect_drag(mut self, id: WidgetId) -> Self {
        self.detect_drag = Some(id);
        self
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_builders_compose() {
        let id = WidgetId::new();
        let reply = Reply::handled().detect_drag(id).capture_mouse(id);
        assert!(reply.is_handled());
        assert_eq!(reply.capture, CaptureRequest::Capture(id));
        assert_eq!(reply.detect_drag, Some(id));

        let released = reply.release_mouse_capture();
        assert_eq!(released.capture, CaptureRequest::Release);
    }

    #[test]
    fn capture_state_queries() {
        let id = WidgetId::new();
        let state = CaptureState::Captured(id);
        assert!(state.is_captured());
        assert!(state.is_captured_by(id));
        assert!(!CaptureState::None.is_captured());
    }
}
