//! Rubber-band overscroll.
//!
//! Negative amounts are past the start of the list, positive past the end.
//! The stored amount is unbounded; readers get a resisted value that never
//! exceeds `overshoot_max`.

use crate::config::ScrollPhysics;

#[derive(Debug, Clone)]
pub struct Overscroll {
    amount: f32,
    overshoot_max: f32,
    bounce_rate: f32,
}

impl Overscroll {
    pub fn new(physics: &ScrollPhysics) -> Self {
        Self {
            amount: 0.0,
            overshoot_max: physics.overshoot_max,
            bounce_rate: physics.overshoot_bounce_rate,
        }
    }

    /// Whether a scroll of `delta` should feed overscroll instead of the
    /// scroll offset.
    pub fn should_apply(&self, at_start: bool, at_end: bool, delta: f32) -> bool {
        (at_start && delta < 0.0)
            || (at_end && delta > 0.0)
            || (self.amount > 0.0 && delta < 0.0)
            || (self.amount < 0.0 && delta > 0.0)
    }

    /// Accumulate `delta`. Returns the part of `delta` absorbed.
    ///
    /// A single interaction cannot flip overscroll from one end to the other:
    /// crossing zero stops at zero and the rest is left unabsorbed.
    pub fn scroll_by(&mut self, delta: f32) -> f32 {
        let before = self.amount;
        self.amount += delta;

        if before != 0.0 && before.signum() != self.amount.signum() {
            self.amount = 0.0;
        }
        self.amount - before
    }

    /// Raw accumulated amount.
    pub fn raw_amount(&self) -> f32 {
        self.amount
    }

    /// Resisted visual overscroll, bounded by `overshoot_max`.
    pub fn overscroll(&self) -> f32 {
        if self.amount == 0.0 || self.overshoot_max <= 0.0 {
            return 0.0;
        }
        let eased = self.overshoot_max * (1.0 - (-self.amount.abs() / self.overshoot_max).exp());
        eased.copysign(self.amount)
    }

    /// Spring back towards zero over `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.amount == 0.0 {
            return;
        }
        let pull = self.amount.abs() + 1.0;
        let step = self.bounce_rate * dt * (pull / self.overshoot_max.max(1.0)).max(1.0);
        self.amount = if self.amount > 0.0 {
            (self.amount - step).max(0.0)
        } else {
            (self.amount + step).min(0.0)
        };
    }

    pub fn reset(&mut self) {
        self.amount = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overscroll() -> Overscroll {
        Overscroll::new(&ScrollPhysics::default())
    }

    #[test]
    fn applies_only_at_edges_or_when_returning() {
        let mut o = overscroll();
        assert!(o.should_apply(true, false, -5.0));
        assert!(!o.should_apply(true, false, 5.0));
        assert!(o.should_apply(false, true, 5.0));
        assert!(!o.should_apply(false, false, -5.0));

        o.scroll_by(-20.0);
        assert!(o.should_apply(false, false, 5.0));
    }

    #[test]
    fn crossing_zero_stops_at_zero() {
        let mut o = overscroll();
        assert_eq!(o.scroll_by(-20.0), -20.0);
        assert_eq!(o.scroll_by(30.0), 20.0);
        assert_eq!(o.raw_amount(), 0.0);
    }

    #[test]
    fn visual_overscroll_is_bounded() {
        let mut o = overscroll();
        o.scroll_by(10_000.0);
        let visual = o.overscroll();
        assert!(visual > 0.0 && visual <= 150.0);

        let mut o = overscroll();
        o.scroll_by(-10_000.0);
        assert!(o.overscroll() < 0.0 && o.overscroll() >= -150.0);
    }

    #[test]
    fn bounces_back_to_zero() {
        let mut o = overscroll();
        o.scroll_by(-80.0);
        for _ in 0..120 {
            o.update(1.0 / 60.0);
        }
        assert_eq!(o.raw_amount(), 0.0);
        assert_eq!(o.overscroll(), 0.0);
    }
}
