//! Combining several boolean inputs into one output action.
//!
//! Inputs arrive as indexed `value[n]` properties, typically routed from
//! other elements' output actions. The element combines them with `and` or
//! `or`, optionally inverts the result and dispatches `onvalue` with `1` or
//! `0` whenever the combined result changes. Starting dispatches the current
//! result once so downstream elements see the initial state.

use crate::element::{Category, Context, Element, ElementCore, StateSink};
use crate::{parse_bool, symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    And,
    Or,
}

/// Boolean combiner, registered as type `"logic"`.
pub struct LogicElement {
    core: ElementCore,
    mode: Mode,
    invert: bool,
    inputs: Vec<bool>,
    out: bool,
    on_value: String,
}

impl LogicElement {
    /// Factory for the element registry.
    pub fn create() -> Box<dyn Element> {
        Box::new(Self {
            core: ElementCore::with_category(Category::Passive),
            mode: Mode::And,
            invert: false,
            inputs: Vec::new(),
            out: false,
            on_value: String::new(),
        })
    }

    fn recompute(&mut self, force: bool, cx: &mut Context<'_>) {
        let combined = match self.mode {
            Mode::And => !self.inputs.is_empty() && self.inputs.iter().all(|v| *v),
            Mode::Or => self.inputs.iter().any(|v| *v),
        };
        let out = combined != self.invert;
        if force || (self.core.active && out != self.out) {
            cx.dispatch_int(&self.on_value, i64::from(out));
        }
        self.out = out;
    }
}

impl Element for LogicElement {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn set(&mut self, name: &str, value: &str, cx: &mut Context<'_>) -> bool {
        match symbol::find(name) {
            Some(symbol::MODE) => {
                self.mode = match value.to_ascii_lowercase().as_str() {
                    "and" => Mode::And,
                    "or" => Mode::Or,
                    _ => {
                        tracing::warn!(id = %self.core.id, value, "unknown logic mode");
                        return false;
                    }
                };
            }
            Some(symbol::INVERT) => self.invert = parse_bool(value),
            Some(symbol::ON_VALUE) => self.on_value = value.to_string(),
            _ => {
                if let Some(rest) = name.strip_prefix("value[") {
                    let Some(index) = rest
                        .strip_suffix(']')
                        .and_then(|i| i.parse::<usize>().ok())
                    else {
                        tracing::warn!(id = %self.core.id, name, "bad input index");
                        return false;
                    };
                    if self.inputs.len() <= index {
                        self.inputs.resize(index + 1, false);
                    }
                    self.inputs[index] = parse_bool(value);
                    self.recompute(false, cx);
                } else {
                    return self.base_set(name, value, cx);
                }
            }
        }
        true
    }

    fn start(&mut self, cx: &mut Context<'_>) {
        self.core.active = true;
        self.recompute(true, cx);
    }

    fn push_state(&self, sink: &mut StateSink<'_>) {
        self.base_push_state(sink);
        sink("value", if self.out { "1" } else { "0" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::ActionQueue;

    fn logic(mode: &str, q: &mut ActionQueue) -> Box<dyn Element> {
        let mut e = LogicElement::create();
        let mut cx = Context::new(0, q);
        e.set("mode", mode, &mut cx);
        e.set("value[0]", "0", &mut cx);
        e.set("value[1]", "0", &mut cx);
        e.set("onvalue", "d/x:value=$v", &mut cx);
        e.start(&mut cx);
        e
    }

    #[test]
    fn test_and_dispatches_on_change() {
        let mut q = ActionQueue::new();
        let mut e = logic("and", &mut q);
        assert_eq!(q.pop().as_deref(), Some("d/x:value=0"), "initial state");

        let mut cx = Context::new(0, &mut q);
        e.set("value[0]", "1", &mut cx);
        drop(cx);
        assert!(q.is_empty(), "only one input high");

        let mut cx = Context::new(1, &mut q);
        e.set("value[1]", "1", &mut cx);
        e.set("value[1]", "true", &mut cx); // unchanged result: no dispatch
        drop(cx);
        assert_eq!(q.pop().as_deref(), Some("d/x:value=1"));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_or_mode() {
        let mut q = ActionQueue::new();
        let mut e = logic("or", &mut q);
        q.pop();

        let mut cx = Context::new(0, &mut q);
        e.set("value[1]", "high", &mut cx);
        drop(cx);
        assert_eq!(q.pop().as_deref(), Some("d/x:value=1"));
    }

    #[test]
    fn test_invert() {
        let mut q = ActionQueue::new();
        let mut e = LogicElement::create();
        let mut cx = Context::new(0, &mut q);
        e.set("mode", "or", &mut cx);
        e.set("invert", "1", &mut cx);
        e.set("value[0]", "0", &mut cx);
        e.set("onvalue", "d/x:value=$v", &mut cx);
        e.start(&mut cx);
        drop(cx);
        assert_eq!(q.pop().as_deref(), Some("d/x:value=1"));

        let mut cx = Context::new(1, &mut q);
        e.set("value[0]", "1", &mut cx);
        drop(cx);
        assert_eq!(q.pop().as_deref(), Some("d/x:value=0"));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let mut q = ActionQueue::new();
        let mut e = LogicElement::create();
        let mut cx = Context::new(0, &mut q);
        assert!(!e.set("mode", "xor", &mut cx));
    }
}
