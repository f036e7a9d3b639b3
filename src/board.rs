//! The board: owner of all elements and driver of the tick loop.
//!
//! The board holds every element for its whole lifetime, starts them in
//! startup-bucket order, and then runs the cooperative loop: once per tick it
//! calls `tick()` on every active polling element in registration order, and
//! afterwards drains the action queue, routing each popped action string to
//! the addressed element's `set()`. Delivery happens strictly after the
//! sweep, so all elements observe a consistent "before this tick's events"
//! view while ticking. Cascading actions (a `set()` that pushes more actions)
//! are drained within the same phase, in FIFO order.
//!
//! There is exactly one logical thread of control; no element ever runs
//! concurrently with another. Time is a caller-supplied monotonic millisecond
//! counter, which also makes every timing behavior testable.
//!
//! ```
//! use tickboard::{Board, ElementRegistry};
//!
//! let registry = ElementRegistry::with_defaults();
//! let config = serde_json::json!({
//!     "value": { "vol": { "min": 0, "max": 100, "onvalue": "log/v:value=$v" } }
//! });
//!
//! let mut board = Board::new();
//! board.add_elements(&registry, &config).unwrap();
//! board.start_all(0);
//! board.tick(10);
//! ```

use serde_json::Value;

use crate::element::{Category, Context, Element, StartupMode};
use crate::error::Error;
use crate::queue::ActionQueue;
use crate::registry::ElementRegistry;

/// Separator between element id and property in an action string.
const ACTION_SEPARATOR: char = ':';
/// Separator between property and value in an action string.
const VALUE_SEPARATOR: char = '=';

/// Owner and scheduler of all elements on the device.
#[derive(Default)]
pub struct Board {
    elements: Vec<Box<dyn Element>>,
    actions: ActionQueue,
    now_ms: u64,
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one element under the given id (`"<type>/<instance>"`, lowercased
    /// here). The board owns the element until teardown.
    pub fn add(&mut self, id: &str, mut element: Box<dyn Element>) -> Result<(), Error> {
        let id = id.to_ascii_lowercase();
        if self.find_index(&id).is_some() {
            return Err(Error::DuplicateId(id));
        }
        if !id.contains('/') {
            tracing::warn!(id, "element id has no type/instance separator");
        }
        element.core_mut().id = id;
        self.elements.push(element);
        Ok(())
    }

    /// Create and configure elements from a JSON configuration tree of the
    /// shape `{"<type>": {"<instance>": {"<property>": value, ...}}}`.
    ///
    /// Unknown element types and unrecognized properties are logged and
    /// skipped; they never abort the remaining configuration. May be called
    /// more than once, so environment and element configuration can live in
    /// separate files.
    pub fn add_elements(&mut self, registry: &ElementRegistry, config: &Value) -> Result<(), Error> {
        let root = config
            .as_object()
            .ok_or_else(|| Error::Config("configuration root must be an object".into()))?;

        for (type_name, instances) in root {
            let Some(instances) = instances.as_object() else {
                tracing::warn!(type_name, "element type entry is not an object");
                continue;
            };
            for (instance, props) in instances {
                let id = format!("{type_name}/{instance}");
                let Some(element) = registry.create(type_name) else {
                    tracing::error!(type_name, "cannot create element type");
                    continue;
                };
                tracing::debug!(id, "new element");
                if let Err(err) = self.add(&id, element) {
                    tracing::error!(%err, "skipping element");
                    continue;
                }
                if let Some(props) = props.as_object() {
                    let index = self.elements.len() - 1;
                    for (name, value) in props {
                        self.configure(index, name, value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply one configuration property to an element, expanding JSON arrays
    /// into indexed properties (`steps` → `steps[0]`, `steps[1]`, …).
    fn configure(&mut self, index: usize, name: &str, value: &Value) {
        if let Some(items) = value.as_array() {
            for (i, item) in items.iter().enumerate() {
                self.configure(index, &format!("{name}[{i}]"), item);
            }
            return;
        }

        let name = name.to_ascii_lowercase();
        let value = config_value_string(value);
        let element = &mut self.elements[index];
        let mut cx = Context::new(self.now_ms, &mut self.actions);
        if !element.set(&name, &value, &mut cx) {
            tracing::warn!(
                id = %element.core().id,
                name,
                value,
                "unrecognized configuration property"
            );
        }
    }

    /// The element with this id, if any.
    pub fn find_id(&self, id: &str) -> Option<&dyn Element> {
        let id = id.to_ascii_lowercase();
        self.find_index(&id).map(|i| self.elements[i].as_ref())
    }

    /// The first element of the given type (id prefix `"<type>/"`). Used to
    /// reach singleton elements.
    pub fn find_type(&self, type_name: &str) -> Option<&dyn Element> {
        let prefix = format!("{}/", type_name.to_ascii_lowercase());
        self.elements
            .iter()
            .find(|e| e.core().id.starts_with(&prefix))
            .map(|e| e.as_ref())
    }

    /// Ids of all elements in registration order.
    pub fn element_ids(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|e| e.core().id.as_str())
    }

    /// Start every not-yet-active element, bucket by bucket in
    /// [`StartupMode`] order, stable within a bucket. Actions queued during
    /// startup are delivered before this returns.
    pub fn start_all(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        for bucket in StartupMode::ALL {
            for element in &mut self.elements {
                if element.core().startup == bucket && !element.core().active {
                    tracing::debug!(id = %element.core().id, ?bucket, "starting");
                    let mut cx = Context::new(now_ms, &mut self.actions);
                    element.start(&mut cx);
                    if !element.core().active {
                        tracing::warn!(id = %element.core().id, "element failed to start");
                    }
                }
            }
        }
        self.drain();
    }

    /// One scheduler tick: sweep all active polling elements, then drain the
    /// action queue to empty.
    pub fn tick(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        let mut cx = Context::new(now_ms, &mut self.actions);
        for element in &mut self.elements {
            let core = element.core();
            if core.active && core.category == Category::Polling {
                element.tick(&mut cx);
            }
        }
        self.drain();
    }

    /// Queue an action from outside any element (a button ISR bridge, a web
    /// request handler). Delivered on the next drain.
    pub fn dispatch(&mut self, action: &str, value: Option<&str>) {
        self.actions.push(action, value, true);
    }

    /// True when no action is pending delivery.
    pub fn queue_is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Deliver every queued action, including the ones queued while
    /// delivering. Runaway action cycles are a configuration error; the
    /// queue is only bounded by the finite chains the configuration encodes.
    fn drain(&mut self) {
        while let Some(event) = self.actions.pop() {
            route_action(&mut self.elements, &mut self.actions, self.now_ms, &event);
        }
    }

    /// Current values of one element (by id) or of all elements, as a JSON
    /// object keyed by element id.
    pub fn get_state(&self, path: Option<&str>) -> Value {
        let path = path.map(str::to_ascii_lowercase);
        let mut root = serde_json::Map::new();
        for element in &self.elements {
            let id = &element.core().id;
            if path.as_deref().is_some_and(|p| p != id.as_str()) {
                continue;
            }
            let mut state = serde_json::Map::new();
            element.push_state(&mut |name, value| {
                state.insert(name.to_string(), Value::String(value.to_string()));
            });
            root.insert(id.clone(), Value::Object(state));
        }
        Value::Object(root)
    }

    /// Set a single property on a single element right away, outside the
    /// queue. Used by introspection endpoints.
    pub fn set_state(&mut self, id: &str, property: &str, value: &str) {
        let id = id.to_ascii_lowercase();
        let Some(index) = self.find_index(&id) else {
            tracing::warn!(id, "set_state: element not found");
            return;
        };
        let name = property.to_ascii_lowercase();
        let element = &mut self.elements[index];
        let mut cx = Context::new(self.now_ms, &mut self.actions);
        if !element.set(&name, value, &mut cx) {
            tracing::warn!(id, name, "set_state: property not handled");
        }
    }

    fn find_index(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.core().id == id)
    }
}

/// Deliver one popped action string: split `"<id>:<prop>=<value>"` at the
/// first `:` and first `=`, look up the element, call `set()`.
fn route_action(
    elements: &mut [Box<dyn Element>],
    actions: &mut ActionQueue,
    now_ms: u64,
    event: &str,
) {
    tracing::trace!(event, "dispatch");
    let Some((target, rest)) = event.split_once(ACTION_SEPARATOR) else {
        tracing::warn!(event, "no action given");
        return;
    };
    if target.is_empty() {
        tracing::warn!(event, "no action given");
        return;
    }
    let (name, value) = match rest.split_once(VALUE_SEPARATOR) {
        Some((name, value)) => (name, value),
        None => (rest, ""),
    };
    let target = target.to_ascii_lowercase();
    let name = name.to_ascii_lowercase();

    let Some(element) = elements.iter_mut().find(|e| e.core().id == target) else {
        tracing::warn!(target, "action target not found");
        return;
    };
    let mut cx = Context::new(now_ms, actions);
    if !element.set(&name, value, &mut cx) {
        tracing::warn!(event, "action was not handled");
    }
}

fn config_value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementCore, StateSink};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Test element recording lifecycle calls into a shared log.
    struct Recorder {
        core: ElementCore,
        log: Rc<RefCell<Vec<String>>>,
        tag: &'static str,
    }

    impl Recorder {
        fn boxed(
            tag: &'static str,
            startup: StartupMode,
            log: &Rc<RefCell<Vec<String>>>,
        ) -> Box<dyn Element> {
            let mut core = ElementCore::default();
            core.startup = startup;
            Box::new(Recorder {
                core,
                log: Rc::clone(log),
                tag,
            })
        }
    }

    impl Element for Recorder {
        fn core(&self) -> &ElementCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut ElementCore {
            &mut self.core
        }
        fn set(&mut self, name: &str, value: &str, cx: &mut Context<'_>) -> bool {
            if name == "ping" {
                self.log.borrow_mut().push(format!("{}:ping={}", self.tag, value));
                true
            } else if name == "emit" {
                // cascading action: handled during a drain, pushes more work
                cx.dispatch(value);
                true
            } else {
                self.base_set(name, value, cx)
            }
        }
        fn start(&mut self, _cx: &mut Context<'_>) {
            self.log.borrow_mut().push(format!("start {}", self.tag));
            self.core.active = true;
        }
        fn tick(&mut self, _cx: &mut Context<'_>) {
            self.log.borrow_mut().push(format!("tick {}", self.tag));
        }
        fn term(&mut self, cx: &mut Context<'_>) {
            self.log.borrow_mut().push(format!("term {}", self.tag));
            let _ = cx;
            self.core.active = false;
        }
        fn push_state(&self, sink: &mut StateSink<'_>) {
            self.base_push_state(sink);
            sink("tag", self.tag);
        }
    }

    fn recorder_board(log: &Rc<RefCell<Vec<String>>>) -> Board {
        let mut board = Board::new();
        board
            .add("probe/late", Recorder::boxed("late", StartupMode::Standard, log))
            .unwrap();
        board
            .add("probe/net", Recorder::boxed("net", StartupMode::Network, log))
            .unwrap();
        board
            .add("probe/sys", Recorder::boxed("sys", StartupMode::System, log))
            .unwrap();
        board
    }

    #[test]
    fn test_startup_bucket_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut board = recorder_board(&log);
        board.start_all(0);
        assert_eq!(
            *log.borrow(),
            vec!["start sys", "start net", "start late"]
        );
    }

    #[test]
    fn test_no_tick_before_start_or_after_term() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut board = recorder_board(&log);

        // not started yet: the sweep must skip everything
        board.tick(1);
        assert!(log.borrow().is_empty());

        board.start_all(2);
        log.borrow_mut().clear();
        board.tick(3);
        assert_eq!(log.borrow().len(), 3);

        // stop one element through the action mechanism
        board.dispatch("probe/net:stop", None);
        board.tick(4);
        let calls = log.borrow();
        assert!(calls.contains(&"term net".to_string()));
        let net_ticks_after_term = calls
            .iter()
            .skip_while(|c| *c != "term net")
            .filter(|c| *c == "tick net")
            .count();
        assert_eq!(net_ticks_after_term, 0);
    }

    #[test]
    fn test_action_routing_and_unknown_target() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut board = recorder_board(&log);
        board.start_all(0);
        log.borrow_mut().clear();

        board.dispatch("probe/sys:ping=$v", Some("1"));
        board.dispatch("ghost/x:ping=2", None); // logged, not fatal
        board.dispatch("probe/net:ping", None); // value defaults to ""
        board.tick(1);

        let calls = log.borrow();
        let pings: Vec<_> = calls.iter().filter(|c| c.contains("ping")).collect();
        assert_eq!(pings, vec!["sys:ping=1", "net:ping="]);
    }

    #[test]
    fn test_cascading_actions_drain_in_same_tick() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut board = recorder_board(&log);
        board.start_all(0);
        log.borrow_mut().clear();

        // sys's set("emit") pushes a follow-up action for net
        board.dispatch("probe/sys:emit=probe/net:ping=chained", None);
        board.tick(1);

        assert!(log.borrow().contains(&"net:ping=chained".to_string()));
        assert!(board.queue_is_empty());
    }

    #[test]
    fn test_delivery_happens_after_full_sweep() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut board = recorder_board(&log);
        board.start_all(0);
        log.borrow_mut().clear();

        board.dispatch("probe/sys:ping=x", None);
        board.tick(1);

        let calls = log.borrow();
        let ping_pos = calls.iter().position(|c| c == "sys:ping=x").unwrap();
        let last_tick = calls.iter().rposition(|c| c.starts_with("tick")).unwrap();
        assert!(ping_pos > last_tick, "delivery must follow the sweep");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut board = Board::new();
        board
            .add("probe/a", Recorder::boxed("a", StartupMode::Standard, &log))
            .unwrap();
        let err = board
            .add("PROBE/A", Recorder::boxed("a2", StartupMode::Standard, &log))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));
    }

    #[test]
    fn test_add_elements_from_config() {
        let registry = ElementRegistry::with_defaults();
        let config = serde_json::json!({
            "value": {
                "vol": { "min": 0, "max": 100, "value": 40, "onvalue": "log/v:value=$v" }
            },
            "blaster": { "b1": {} }  // unknown type: logged, skipped
        });
        let mut board = Board::new();
        board.add_elements(&registry, &config).unwrap();
        assert!(board.find_id("value/vol").is_some());
        assert!(board.find_id("blaster/b1").is_none());
        assert!(board.find_type("value").is_some());

        let err = board
            .add_elements(&registry, &serde_json::json!([1, 2]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_get_state_and_set_state() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut board = recorder_board(&log);
        board.start_all(0);

        let all = board.get_state(None);
        assert_eq!(all["probe/sys"]["active"], "true");
        assert_eq!(all["probe/net"]["tag"], "net");

        let one = board.get_state(Some("probe/net"));
        assert!(one.get("probe/sys").is_none());

        board.set_state("probe/sys", "ping", "direct");
        assert!(log.borrow().contains(&"sys:ping=direct".to_string()));
    }
}
