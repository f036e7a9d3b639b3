//! The element contract: the unit of schedulable device behavior.
//!
//! An element is a sensor, actuator, logic gate or timer that the board
//! drives through a fixed lifecycle:
//!
//! 1. created by a registered factory;
//! 2. configured through any number of `set(name, value)` calls;
//! 3. activated once by `start()`; validation failures leave the element
//!    inactive and the rest of the board keeps running;
//! 4. polled by `tick()` once per scheduler sweep while active;
//! 5. deactivated by `term()`, which releases transient resources.
//!
//! `set()` and `tick()` must never block: anything with latency is written as
//! an explicit state field plus a recorded deadline checked on each tick (see
//! [`elements::timer`](crate::elements::timer) and
//! [`elements::remote`](crate::elements::remote) for the canonical pattern).
//!
//! There is no inheritance chain: every concrete element implements the one
//! flat [`Element`] trait and embeds an [`ElementCore`] for the state shared
//! by all elements. The provided `base_set` / `base_push_state` methods hold
//! the common property handling.

use crate::queue::ActionQueue;
use crate::symbol;

/// Startup ordering bucket. Elements are started bucket by bucket in the
/// order declared here, never interleaved, so network-dependent elements can
/// rely on the network element being active, and time-of-day elements on the
/// time source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum StartupMode {
    /// Infrastructure needed by everything else (file systems, buses).
    System,
    /// Network bring-up.
    Network,
    /// Time synchronization.
    Time,
    /// Everything else.
    #[default]
    Standard,
}

impl StartupMode {
    /// All buckets in activation order.
    pub const ALL: [StartupMode; 4] = [
        StartupMode::System,
        StartupMode::Network,
        StartupMode::Time,
        StartupMode::Standard,
    ];

    /// Parse a bucket name from configuration.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "system" => Some(StartupMode::System),
            "network" => Some(StartupMode::Network),
            "time" => Some(StartupMode::Time),
            "standard" => Some(StartupMode::Standard),
            _ => None,
        }
    }
}

/// Whether the element needs per-tick polling or only reacts to `set()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    /// `tick()` does real work; the board polls it every sweep while active.
    #[default]
    Polling,
    /// Acts only inside `set()`; the board skips its `tick()`.
    Passive,
}

/// State shared by every element instance. Concrete elements embed one and
/// expose it through [`Element::core`] / [`Element::core_mut`].
#[derive(Debug, Default)]
pub struct ElementCore {
    /// Unique id on the board, format `"<type>/<instance>"`, lowercase.
    pub id: String,
    /// Whether `tick()` and action delivery are enabled. Set by a successful
    /// `start()`, cleared by `term()`.
    pub active: bool,
    /// Activation ordering bucket.
    pub startup: StartupMode,
    /// Polling vs one-shot behavior.
    pub category: Category,
    /// Per-element log verbosity, stored from configuration.
    pub loglevel: u8,
}

impl ElementCore {
    /// A core with the given category; id is assigned when the element is
    /// added to a board.
    pub fn with_category(category: Category) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    /// The instance part of the id (after the `/`), or the whole id.
    pub fn instance_name(&self) -> &str {
        match self.id.split_once('/') {
            Some((_, name)) => name,
            None => &self.id,
        }
    }
}

/// The per-call view of the board an element may use while being configured,
/// started, ticked or terminated. Carries the monotonic clock and access to
/// the action queue; elements never hold a reference to the board itself.
pub struct Context<'a> {
    now_ms: u64,
    actions: &'a mut ActionQueue,
}

impl<'a> Context<'a> {
    /// Build a context for one element call.
    pub fn new(now_ms: u64, actions: &'a mut ActionQueue) -> Self {
        Self { now_ms, actions }
    }

    /// Monotonic milliseconds since device start.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Monotonic seconds since device start.
    pub fn uptime_s(&self) -> u64 {
        self.now_ms / 1000
    }

    /// Queue an action template without a value.
    pub fn dispatch(&mut self, action: &str) {
        self.actions.push_action(action);
    }

    /// Queue an action template, substituting `$v` with `value`.
    pub fn dispatch_value(&mut self, action: &str, value: &str) {
        self.actions.push_value(action, value);
    }

    /// Queue an action template, substituting `$v` with an integer value.
    pub fn dispatch_int(&mut self, action: &str, value: i64) {
        self.actions.push_int(action, value);
    }

    /// Queue `action` with the n-th item of the comma separated `values`.
    pub fn dispatch_item(&mut self, action: &str, values: &str, n: usize) {
        self.actions.push_item(action, values, n);
    }

    /// Barrier predicate: true when every previously queued action has been
    /// delivered.
    pub fn queue_is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Callback receiving `(property, value)` pairs from [`Element::push_state`].
pub type StateSink<'a> = dyn FnMut(&str, &str) + 'a;

/// The unit of schedulable behavior managed by the board.
///
/// Names arriving at `set()` are already lowercase (the board lowercases ids
/// and property names at its boundary), so implementations match them against
/// the interned [`symbol`] constants or by plain `==` for element-specific
/// properties, and fall back to [`Element::base_set`] for everything they do
/// not recognize.
pub trait Element {
    /// Shared element state.
    fn core(&self) -> &ElementCore;

    /// Shared element state, mutable.
    fn core_mut(&mut self) -> &mut ElementCore;

    /// Apply a configuration property or trigger a behavior.
    ///
    /// Returns `true` when the name was recognized. Unknown names are a
    /// configuration error on the caller's side, never a failure here.
    fn set(&mut self, name: &str, value: &str, cx: &mut Context<'_>) -> bool {
        self.base_set(name, value, cx)
    }

    /// Validate configuration and activate. Implementations that find their
    /// configuration invalid log the problem and return without setting
    /// `active`; the board continues with the remaining elements.
    fn start(&mut self, cx: &mut Context<'_>) {
        let _ = cx;
        self.core_mut().active = true;
    }

    /// Non-blocking per-tick work. Called once per scheduler sweep while
    /// active (and the category is [`Category::Polling`]).
    fn tick(&mut self, cx: &mut Context<'_>) {
        let _ = cx;
    }

    /// Deactivate and release transient resources.
    fn term(&mut self, cx: &mut Context<'_>) {
        let _ = cx;
        self.core_mut().active = false;
    }

    /// Report every externally visible property through `sink`. Must not
    /// mutate state. Implementations call [`Element::base_push_state`] first
    /// so `active` is always reported.
    fn push_state(&self, sink: &mut StateSink<'_>) {
        self.base_push_state(sink);
    }

    /// Common property handling shared by all elements: `start`, `stop`,
    /// `startup`, `loglevel`, plus properties that are stored in the
    /// configuration for the UI only. Not meant to be overridden; concrete
    /// `set()` implementations delegate unrecognized names here.
    fn base_set(&mut self, name: &str, value: &str, cx: &mut Context<'_>) -> bool {
        match symbol::find(name) {
            Some(symbol::START) => {
                self.start(cx);
                self.core().active
            }
            Some(symbol::STOP) => {
                self.term(cx);
                true
            }
            Some(symbol::STARTUP) => match StartupMode::parse(value) {
                Some(mode) => {
                    self.core_mut().startup = mode;
                    true
                }
                None => {
                    tracing::warn!(id = %self.core().id, value, "unknown startup mode");
                    false
                }
            },
            Some(symbol::LOGLEVEL) => {
                self.core_mut().loglevel = value.parse().unwrap_or(0);
                true
            }
            // used by the web ui, only stored in the config files
            Some(symbol::DESCRIPTION) => true,
            _ => name == "room",
        }
    }

    /// Report the properties every element has. See [`Element::push_state`].
    fn base_push_state(&self, sink: &mut StateSink<'_>) {
        sink("active", if self.core().active { "true" } else { "false" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        core: ElementCore,
        started: u32,
        termed: u32,
    }

    impl Dummy {
        fn new() -> Self {
            Self {
                core: ElementCore::default(),
                started: 0,
                termed: 0,
            }
        }
    }

    impl Element for Dummy {
        fn core(&self) -> &ElementCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut ElementCore {
            &mut self.core
        }
        fn start(&mut self, _cx: &mut Context<'_>) {
            self.started += 1;
            self.core.active = true;
        }
        fn term(&mut self, _cx: &mut Context<'_>) {
            self.termed += 1;
            self.core.active = false;
        }
    }

    #[test]
    fn test_base_set_start_stop() {
        let mut q = ActionQueue::new();
        let mut cx = Context::new(0, &mut q);
        let mut e = Dummy::new();

        assert!(e.set("start", "", &mut cx));
        assert!(e.core().active);
        assert_eq!(e.started, 1);

        assert!(e.set("stop", "", &mut cx));
        assert!(!e.core().active);
        assert_eq!(e.termed, 1);
    }

    #[test]
    fn test_base_set_startup_and_loglevel() {
        let mut q = ActionQueue::new();
        let mut cx = Context::new(0, &mut q);
        let mut e = Dummy::new();

        assert!(e.set("startup", "system", &mut cx));
        assert_eq!(e.core().startup, StartupMode::System);
        assert!(!e.set("startup", "bogus", &mut cx));

        assert!(e.set("loglevel", "2", &mut cx));
        assert_eq!(e.core().loglevel, 2);
    }

    #[test]
    fn test_base_set_unknown_returns_false() {
        let mut q = ActionQueue::new();
        let mut cx = Context::new(0, &mut q);
        let mut e = Dummy::new();

        assert!(!e.set("fancyness", "11", &mut cx));
        // ui-only properties are accepted without effect
        assert!(e.set("description", "living room lamp", &mut cx));
        assert!(e.set("room", "kitchen", &mut cx));
    }

    #[test]
    fn test_push_state_reports_active() {
        let mut e = Dummy::new();
        e.core_mut().active = true;

        let mut seen = Vec::new();
        e.push_state(&mut |name, value| seen.push((name.to_string(), value.to_string())));
        assert_eq!(seen, vec![("active".to_string(), "true".to_string())]);
    }

    #[test]
    fn test_startup_mode_order() {
        assert!(StartupMode::System < StartupMode::Network);
        assert!(StartupMode::Network < StartupMode::Time);
        assert!(StartupMode::Time < StartupMode::Standard);
        assert_eq!(StartupMode::parse("Network"), Some(StartupMode::Network));
    }

    #[test]
    fn test_instance_name() {
        let mut core = ElementCore::default();
        core.id = "value/brightness".to_string();
        assert_eq!(core.instance_name(), "brightness");
    }
}
