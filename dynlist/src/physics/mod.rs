//! Scroll physics: fling velocity and rubber-band overscroll.

pub mod inertial;
pub mod overscroll;

pub use inertial::InertialScrollManager;
pub use overscroll::Overscroll;
