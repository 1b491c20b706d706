//! Platform layer: clocks, cancellation and timed animation of chains.

pub mod animation;
pub mod clock;

pub use animation::{RampReport, run_ramp, set_delayed, spawn_ramp, spawn_ramp_with};
pub use clock::{CancelToken, Clock, ManualClock, SystemClock};
