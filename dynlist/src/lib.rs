//! Dynlist: virtualized list and tile views.
//!
//! Dynlist renders arbitrarily long collections through a small, recycled
//! set of row widgets:
//! - Only rows intersecting the viewport are generated each pass
//! - Variable item extents, with fractional line scrolling
//! - Inertial, animated and overscroll-aware scrolling
//! - Single, toggle and multi selection with keyboard navigation
//!
//! # Architecture
//!
//! [`TableViewBase`] owns the scroll state and the per-frame tick. It knows
//! nothing about items: a [`TableViewHost`] measures lines and materializes
//! rows for the window the engine plans. [`ListView`] is that host for a
//! collection of shared item handles, and the surface applications use.
//!
//! # Usage
//!
//! ```ignore
//! use dynlist::{ItemRef, ListView, PanelGeometry, TableViewConfig};
//!
//! let mut list = ListView::new(TableViewConfig::default(), |_: &String| 24.0, || {
//!     Box::new(MyEntry::default())
//! })?;
//! list.add_item(ItemRef::new("hello".to_string()))?;
//!
//! // Once per frame:
//! list.tick(PanelGeometry::sized(300.0, 200.0), now, dt);
//! for event in list.drain_events() {
//!     // ...
//! }
//! ```

// Core primitives
pub mod primitives;
pub mod widget_id;
pub mod input;
pub mod error;
pub mod config;

// Item model
pub mod items;
pub mod selection;

// Scroll machinery
pub mod physics;
pub mod scheduler;
pub mod scrollbar;
pub mod lines;

// Widgets
pub mod panel;
pub mod row;

// Table views
pub mod table_view_base;
pub mod list_view;
pub mod events;

// Re-export core types
pub use primitives::{Orientation, PanelGeometry, Point, Rect, Size, TableViewDimensions};
pub use widget_id::WidgetId;
pub use input::{CaptureRequest, CaptureState, Key, KeyEvent, Modifiers, MouseButton, PointerEvent, Reply};
pub use error::ListError;
pub use config::{ConsumeMouseWheel, ItemLayout, ScrollPhysics, TableViewConfig};
pub use items::{ItemCollection, ItemDelta, ItemRef};
pub use selection::{SelectInfo, SelectionMode, SelectionSet};
pub use scheduler::{ActiveTimerReturn, TimerKind};
pub use scrollbar::ScrollBarState;
pub use lines::LineMetrics;
pub use panel::{ArrangedChild, ListPanel, PanelChild};
pub use row::{ListEntry, OwnerTable, RowPool, TableRow};
pub use table_view_base::{
    GenerationResult, GenerationWindow, ScrollIntoView, ScrollIntoViewResult, TableViewBase,
    TableViewHost, TableViewNotification, plan_generation,
};
pub use list_view::ListView;
pub use events::ListEvent;
