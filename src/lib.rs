//! # tickboard
//!
//! A cooperative runtime for event-driven automation devices, built around
//! three ideas:
//!
//! - **Elements**: small units of function (a timer, a sensor, a logical
//!   gate) with a common lifecycle. Elements are configured from JSON,
//!   started, then driven by frequent `tick` calls. They never block.
//! - **Actions**: plain strings of the form `"<element>:<property>=<value>"`
//!   that carry events between elements through a FIFO queue. An element
//!   emits actions, the board routes each one to its target's `set` method.
//! - **The board**: owns all elements and the queue, and runs the loop:
//!   tick every active element once, then deliver every queued action until
//!   the queue is empty.
//!
//! ## Quick Start
//!
//! ```
//! use tickboard::{Board, ElementRegistry};
//!
//! let registry = ElementRegistry::with_defaults();
//! let config = serde_json::json!({
//!     "timer": {
//!         "blink": {
//!             "waittime": 1, "pulsetime": 1, "cycletime": 2, "type": "loop",
//!             "onon": "value/led:value=1",
//!             "onoff": "value/led:value=0"
//!         }
//!     },
//!     "value": { "led": { "min": 0, "max": 1 } }
//! });
//!
//! let mut board = Board::new();
//! board.add_elements(&registry, &config).unwrap();
//! board.start_all(0);
//!
//! // the embedding application calls tick from its main loop
//! board.tick(1_000);
//! assert_eq!(board.get_state(Some("value/led"))["value/led"]["value"], "1");
//! board.tick(2_000);
//! assert_eq!(board.get_state(Some("value/led"))["value/led"]["value"], "0");
//! ```
//!
//! ## Action Grammar
//!
//! | Form | Meaning |
//! |------|---------|
//! | `type/instance:prop=value` | set `prop` on one element |
//! | `type/instance:prop` | set `prop` to the empty string |
//! | `a:x=$v` | `$v` is replaced by the emitting element's value |
//! | `a:x=1,b:x=1` | comma list: fans out to several targets |
//!
//! Element ids and property names are case-insensitive; they are lowercased
//! once at the board boundary.
//!
//! ## Timing
//!
//! The board never reads a clock: the embedding application passes a
//! monotonic millisecond timestamp into [`Board::tick`]. All elements
//! express waiting as deadlines compared against that clock, which also
//! makes every timing behavior exactly testable.

pub mod board;
pub mod element;
pub mod elements;
mod error;
pub mod list;
pub mod queue;
pub mod registry;
pub mod symbol;

pub use board::Board;
pub use element::{Category, Context, Element, ElementCore, StartupMode, StateSink};
pub use error::Error;
pub use queue::ActionQueue;
pub use registry::{ElementFactory, ElementRegistry};

/// Parse a boolean property value.
///
/// `"1"`, `"true"`, `"high"` and `"on"` (any case) are true, everything
/// else is false.
///
/// # Example
///
/// ```
/// assert!(tickboard::parse_bool("ON"));
/// assert!(!tickboard::parse_bool("0"));
/// ```
pub fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("1")
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("high")
        || value.eq_ignore_ascii_case("on")
}

/// Parse an integer property value, leniently.
///
/// Reads an optional sign and leading digits and ignores any trailing
/// characters, so `"12.5"` parses as `12` and `"x"` as `0`.
pub fn parse_int(value: &str) -> i64 {
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let mut result: i64 = 0;
    for c in digits.chars() {
        let Some(d) = c.to_digit(10) else { break };
        result = result.saturating_mul(10).saturating_add(i64::from(d));
    }
    if negative {
        -result
    } else {
        result
    }
}

/// Parse a duration property value into seconds.
///
/// Accepts `"hh:mm"` and `"hh:mm:ss"` notation as well as a plain number
/// with an optional `d`, `h`, `m` or `s` unit suffix. A bare number is
/// seconds.
///
/// # Example
///
/// ```
/// assert_eq!(tickboard::parse_duration_s("90"), 90);
/// assert_eq!(tickboard::parse_duration_s("2m"), 120);
/// assert_eq!(tickboard::parse_duration_s("01:30"), 5400);
/// assert_eq!(tickboard::parse_duration_s("01:30:10"), 5410);
/// ```
pub fn parse_duration_s(value: &str) -> u64 {
    let value = value.trim();
    if value.contains(':') {
        let mut seconds: u64 = 0;
        for part in value.splitn(3, ':') {
            seconds = seconds * 60 + parse_int(part).max(0) as u64;
        }
        // hh:mm is hours and minutes, not minutes and seconds
        if value.bytes().filter(|b| *b == b':').count() == 1 {
            seconds *= 60;
        }
        return seconds;
    }
    let number = parse_int(value).max(0) as u64;
    match value.chars().last() {
        Some('d') | Some('D') => number * 24 * 60 * 60,
        Some('h') | Some('H') => number * 60 * 60,
        Some('m') | Some('M') => number * 60,
        _ => number,
    }
}
