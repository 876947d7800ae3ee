//! Inertial (fling) scrolling.
//!
//! Drag deltas are sampled once per frame while the user drags. When the drag
//! ends the sampled velocity keeps scrolling the list and decays through
//! friction plus a constant drag.

use std::collections::VecDeque;

use crate::config::ScrollPhysics;

#[derive(Debug, Clone, Copy)]
struct ScrollSample {
    delta: f32,
    time: f64,
}

/// Tracks recent drag samples and the resulting fling velocity.
#[derive(Debug, Clone)]
pub struct InertialScrollManager {
    samples: VecDeque<ScrollSample>,
    velocity: f32,
    friction: f32,
    static_drag: f32,
    sample_timeout: f64,
}

impl InertialScrollManager {
    pub fn new(physics: &ScrollPhysics) -> Self {
        Self {
            samples: VecDeque::new(),
            velocity: 0.0,
            friction: physics.inertial_friction,
            static_drag: physics.inertial_static_drag,
            sample_timeout: physics.inertial_sample_timeout,
        }
    }

    /// Record a drag delta at `time` and recompute the velocity from the
    /// samples still inside the timeout window.
    pub fn add_scroll_sample(&mut self, delta: f32, time: f64) {
        self.samples.push_back(ScrollSample { delta, time });
        self.samples
            .retain(|sample| time - sample.time <= self.sample_timeout);

        let total: f32 = self.samples.iter().map(|sample| sample.delta).sum();
        let oldest = self
            .samples
            .iter()
            .map(|sample| sample.time)
            .fold(f64::INFINITY, f64::min);
        let duration = time - oldest;

        self.velocity = if duration > 0.0 {
            (f64::from(total) / duration) as f32
        } else {
            0.0
        };
    }

    /// Decay the velocity towards zero over `dt` seconds.
    pub fn update_scroll_velocity(&mut self, dt: f32) {
        if self.velocity == 0.0 {
            return;
        }
        let static_loss = if self.velocity > 0.0 {
            self.static_drag
        } else {
            -self.static_drag
        };
        let delta_velocity = self.friction * self.velocity * dt + static_loss * dt;

        self.velocity = if self.velocity > 0.0 {
            (self.velocity - delta_velocity).max(0.0)
        } else {
            (self.velocity - delta_velocity).min(0.0)
        };
    }

    pub fn clear_scroll_velocity(&mut self) {
        self.velocity = 0.0;
        self.samples.clear();
    }

    pub fn scroll_velocity(&self) -> f32 {
        self.velocity
    }
}
