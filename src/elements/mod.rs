//! Built-in elements and the canonical adapter patterns.
//!
//! Each module here is both a usable element and the reference implementation
//! of one pattern peripheral adapters follow:
//!
//! - [`value`]: stored property with range clamping and change dispatch
//! - [`timer`]: deadline-driven state machine (wait / pulse / cycle)
//! - [`scene`]: multi-step sequence using the queue-empty barrier
//! - [`sensor`]: periodic probing with warm-up, resend and restart policy
//! - [`threshold`]: hysteresis band with high/low action fan-out
//! - [`remote`]: long-running request with a bounded timeout state
//! - [`pulse`]: ISR-incremented atomic counters read by delta
//! - [`logic`]: passive and/or gate recomputed on input changes

pub mod logic;
pub mod pulse;
pub mod remote;
pub mod scene;
pub mod sensor;
pub mod threshold;
pub mod timer;
pub mod value;
