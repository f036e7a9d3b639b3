//! A stored integer value with range clamping and change dispatch.
//!
//! The value element holds one number, adjustable in absolute (`value`) or
//! relative (`up` / `down`, scaled by `step`) form and clamped into
//! `min`..=`max`. Whenever the value changes while active, the configured
//! `onvalue` action is dispatched with the new value; starting dispatches the
//! current value once unconditionally so downstream elements see the initial
//! state.

use crate::element::{Category, Context, Element, ElementCore, StateSink};
use crate::{parse_int, symbol};

/// Configurable value holder, registered as type `"value"`.
pub struct ValueElement {
    core: ElementCore,
    value: i64,
    min: i64,
    max: i64,
    step: i64,
    label: String,
    on_value: String,
}

impl ValueElement {
    /// Factory for the element registry.
    pub fn create() -> Box<dyn Element> {
        Box::new(Self {
            core: ElementCore::with_category(Category::Passive),
            value: 0,
            min: i64::MIN,
            max: i64::MAX,
            step: 1,
            label: String::new(),
            on_value: String::new(),
        })
    }

    /// Current value.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Apply a new value, clamped to the configured range. Dispatches the
    /// `onvalue` action when the value changed while active, or always when
    /// `force` is set.
    fn set_value(&mut self, new_value: i64, force: bool, cx: &mut Context<'_>) {
        let clamped = new_value.clamp(self.min, self.max);
        if force || (self.core.active && clamped != self.value) {
            cx.dispatch_int(&self.on_value, clamped);
        }
        self.value = clamped;
    }
}

impl Element for ValueElement {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn set(&mut self, name: &str, value: &str, cx: &mut Context<'_>) -> bool {
        match symbol::find(name) {
            Some(symbol::VALUE) => self.set_value(parse_int(value), false, cx),
            Some(symbol::UP) => self.set_value(self.value + parse_int(value) * self.step, false, cx),
            Some(symbol::DOWN) => {
                self.set_value(self.value - parse_int(value) * self.step, false, cx)
            }
            Some(symbol::MIN) => self.min = parse_int(value),
            Some(symbol::MAX) => self.max = parse_int(value),
            Some(symbol::STEP) => self.step = parse_int(value),
            Some(symbol::LABEL) => self.label = value.to_string(),
            Some(symbol::ON_VALUE) => self.on_value = value.to_string(),
            _ => return self.base_set(name, value, cx),
        }
        true
    }

    fn start(&mut self, cx: &mut Context<'_>) {
        self.core.active = true;
        if self.label.is_empty() {
            self.label = self.core.instance_name().to_string();
        }
        // announce the initial value
        self.set_value(self.value, true, cx);
    }

    fn push_state(&self, sink: &mut StateSink<'_>) {
        self.base_push_state(sink);
        sink("value", &self.value.to_string());
        sink("label", &self.label);
    }
}
