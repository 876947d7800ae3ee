//! Headless list simulation.
//!
//! Drives a `ListView` through a scripted session (wheel, keyboard, a
//! right-drag fling, item removal) and logs what the list reports.
//!
//! ```text
//! RUST_LOG=dynlist=debug dynlist-sim [config.json] [num_items]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use dynlist::{
    ItemRef, Key, KeyEvent, ListEntry, ListEvent, ListView, Modifiers, MouseButton, PanelGeometry,
    Point, PointerEvent, TableViewConfig,
};
use tracing_subscriber::EnvFilter;

const FRAME: f32 = 1.0 / 60.0;

/// Entry that only reports what it is shown.
struct LogEntry {
    label: String,
}

impl ListEntry<String> for LogEntry {
    fn on_item_set(&mut self, item: &ItemRef<String>) {
        self.label.clone_from(item);
        tracing::trace!(label = %self.label, "entry bound");
    }

    fn on_released(&mut self) {
        tracing::trace!(label = %self.label, "entry released");
        self.label.clear();
    }

    fn on_selection_changed(&mut self, selected: bool) {
        tracing::debug!(label = %self.label, selected, "entry selection");
    }
}

struct Simulation {
    list: ListView<String>,
    geometry: PanelGeometry,
    time: f64,
}

impl Simulation {
    fn frames(&mut self, count: usize) {
        for _ in 0..count {
            self.time += f64::from(FRAME);
            self.list.tick(self.geometry, self.time, FRAME);
            self.report();
        }
    }

    fn pointer(&mut self, event: PointerEvent) {
        self.list.on_pointer_event(&event);
        self.report();
    }

    fn key(&mut self, key: Key) {
        self.list.on_key_down(KeyEvent::new(key));
        self.report();
    }

    fn report(&mut self) {
        for event in self.list.drain_events() {
            match event {
                ListEvent::ItemsChanged { added, removed } => {
                    tracing::info!(added = added.len(), removed = removed.len(), "items changed");
                }
                ListEvent::SelectionChanged { first, info } => {
                    let first = first.map(|item| item.to_string());
                    tracing::info!(?first, ?info, "selection changed");
                }
                ListEvent::ItemClicked(item) => tracing::info!(item = %*item, "clicked"),
                ListEvent::ItemScrolledIntoView { item, widget } => {
                    tracing::info!(item = %*item, %widget, "scrolled into view");
                }
                ListEvent::Scrolled {
                    offset,
                    distance_remaining,
                } => tracing::debug!(offset, distance_remaining, "scrolled"),
                ListEvent::FinishedScrolling => {
                    tracing::debug!(offset = self.list.scroll_offset(), "finished scrolling");
                }
                ListEvent::ContextMenuRequested { position } => {
                    tracing::info!(x = position.x, y = position.y, "context menu");
                }
                other => tracing::trace!(?other, "event"),
            }
        }
    }
}

fn load_config(path: Option<&str>) -> Result<TableViewConfig> {
    let Some(path) = path else {
        return Ok(TableViewConfig::default());
    };
    let path = Path::new(path);
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: TableViewConfig =
        serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    let num_items: usize = match args.get(1) {
        Some(count) => count.parse().context("num_items must be a number")?,
        None => 200,
    };

    tracing::info!(num_items, "starting list simulation");

    // Extents vary so line metrics are not uniform.
    let list = ListView::new(
        config,
        |label: &String| 24.0 + (label.len() % 3) as f32 * 8.0,
        || Box::new(LogEntry { label: String::new() }) as Box<dyn ListEntry<String>>,
    )?;
    let mut sim = Simulation {
        list,
        geometry: PanelGeometry::sized(320.0, 240.0),
        time: 0.0,
    };

    for i in 0..num_items {
        sim.list.add_item(ItemRef::new(format!("item {i}")))?;
    }
    sim.frames(2);

    // Wheel down a few notches.
    let center = Point::new(160.0, 120.0);
    for _ in 0..3 {
        sim.pointer(PointerEvent::WheelScrolled {
            delta: -1.0,
            position: center,
            modifiers: Modifiers::NONE,
        });
        sim.frames(1);
    }

    // Keyboard navigation.
    sim.key(Key::Down);
    sim.key(Key::PageDown);
    sim.frames(30);
    sim.key(Key::Enter);

    // Right-drag fling back up.
    sim.pointer(PointerEvent::ButtonPressed {
        button: MouseButton::Right,
        position: center,
    });
    let mut position = center;
    for _ in 0..6 {
        let delta = Point::new(0.0, 20.0);
        position = position + delta;
        sim.pointer(PointerEvent::CursorMoved {
            position,
            delta,
            right_button_down: true,
        });
        sim.frames(1);
    }
    sim.pointer(PointerEvent::ButtonReleased {
        button: MouseButton::Right,
        position,
    });
    sim.frames(120);

    // Remove whatever is selected and let the list settle.
    if let Some(selected) = sim.list.get_selected_item().cloned() {
        sim.list.remove_item(&selected)?;
    }
    if let Some(last) = sim.list.get_num_items().checked_sub(1) {
        sim.list.navigate_to_index(last)?;
    }
    sim.frames(60);

    tracing::info!(
        offset = sim.list.scroll_offset(),
        rows = sim.list.num_constructed_rows(),
        live = sim.list.displayed_entries().len(),
        selected = sim.list.num_items_selected(),
        "simulation finished"
    );
    Ok(())
}
