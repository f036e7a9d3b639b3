//! A hysteresis band over an incoming value with high/low action fan-out.
//!
//! The threshold element receives values (typically routed from a sensor)
//! and classifies them against a `reference` level: at or above the
//! reference the band is high, below `reference - hysteresis` it is low, and
//! in between the previous band sticks. On every band change the
//! `onreference` action fires with the new band as `1`/`0`, followed by
//! `onhigh` or `onlow`; each of those may be a comma separated list fanning
//! out to several targets.

use crate::element::{Category, Context, Element, ElementCore, StateSink};
use crate::{parse_int, symbol};

/// Value classifier, registered as type `"threshold"`.
pub struct ThresholdElement {
    core: ElementCore,
    value: i64,
    reference: i64,
    hysteresis: i64,
    /// band of the last classified value; `None` before the first value
    high: Option<bool>,
    on_reference: String,
    on_high: String,
    on_low: String,
}

impl ThresholdElement {
    /// Factory for the element registry.
    pub fn create() -> Box<dyn Element> {
        Box::new(Self {
            core: ElementCore::with_category(Category::Passive),
            value: 0,
            reference: 0,
            hysteresis: 10,
            high: None,
            on_reference: String::new(),
            on_high: String::new(),
            on_low: String::new(),
        })
    }

    fn classify(&mut self, cx: &mut Context<'_>) {
        let band = if self.value >= self.reference {
            true
        } else if self.value < self.reference - self.hysteresis {
            false
        } else {
            // inside the hysteresis band the previous classification sticks
            self.high.unwrap_or(false)
        };

        if self.core.active && self.high != Some(band) {
            cx.dispatch_int(&self.on_reference, i64::from(band));
            if band {
                cx.dispatch(&self.on_high);
            } else {
                cx.dispatch(&self.on_low);
            }
        }
        self.high = Some(band);
    }
}

impl Element for ThresholdElement {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn set(&mut self, name: &str, value: &str, cx: &mut Context<'_>) -> bool {
        match symbol::find(name) {
            Some(symbol::VALUE) => {
                self.value = parse_int(value);
                self.classify(cx);
            }
            Some(symbol::REFERENCE) => self.reference = parse_int(value),
            Some(symbol::ON_REFERENCE) => self.on_reference = value.to_string(),
            Some(symbol::ON_HIGH) => self.on_high = value.to_string(),
            Some(symbol::ON_LOW) => self.on_low = value.to_string(),
            _ => {
                if name == "hysteresis" {
                    self.hysteresis = parse_int(value);
                } else {
                    return self.base_set(name, value, cx);
                }
            }
        }
        true
    }

    fn push_state(&self, sink: &mut StateSink<'_>) {
        self.base_push_state(sink);
        sink("value", &self.value.to_string());
        sink("reference", if self.high == Some(true) { "1" } else { "0" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::ActionQueue;
    use crate::{Board, ElementRegistry};

    fn classifier(q: &mut ActionQueue) -> Box<dyn Element> {
        let mut e = ThresholdElement::create();
        let mut cx = Context::new(0, q);
        e.set("reference", "50", &mut cx);
        e.set("hysteresis", "5", &mut cx);
        e.set("onhigh", "lamp1:value=1,lamp2:value=1", &mut cx);
        e.set("onlow", "lamp1:value=0,lamp2:value=0", &mut cx);
        e.start(&mut cx);
        e
    }

    #[test]
    fn test_fanout_on_band_change() {
        let mut q = ActionQueue::new();
        let mut e = classifier(&mut q);

        let mut cx = Context::new(0, &mut q);
        e.set("value", "60", &mut cx);
        drop(cx);
        assert_eq!(q.pop().as_deref(), Some("lamp1:value=1"));
        assert_eq!(q.pop().as_deref(), Some("lamp2:value=1"));
        assert_eq!(q.pop(), None);

        // same band again: no new actions
        let mut cx = Context::new(1, &mut q);
        e.set("value", "70", &mut cx);
        drop(cx);
        assert!(q.is_empty());
    }

    #[test]
    fn test_hysteresis_band_sticks() {
        let mut q = ActionQueue::new();
        let mut e = classifier(&mut q);

        let mut cx = Context::new(0, &mut q);
        e.set("value", "60", &mut cx); // high
        e.set("value", "47", &mut cx); // inside band: still high
        drop(cx);
        assert_eq!(q.len(), 2, "only the initial high actions");

        let mut cx = Context::new(1, &mut q);
        e.set("value", "44", &mut cx); // below reference - hysteresis
        drop(cx);
        let actions: Vec<_> = std::iter::from_fn(|| q.pop()).collect();
        assert_eq!(
            actions,
            vec![
                "lamp1:value=1",
                "lamp2:value=1",
                "lamp1:value=0",
                "lamp2:value=0"
            ]
        );
    }

    /// End to end version of the gauge scenario: one source action fans out
    /// to two lamps within the same drain phase.
    #[test]
    fn test_gauge_fanout_through_board() {
        let registry = ElementRegistry::with_defaults();
        let config = serde_json::json!({
            "threshold": {
                "gauge": {
                    "reference": 50,
                    "onhigh": "value/lamp1:value=1,value/lamp2:value=1"
                }
            },
            "value": {
                "lamp1": { "min": 0, "max": 1 },
                "lamp2": { "min": 0, "max": 1 }
            }
        });
        let mut board = Board::new();
        board.add_elements(&registry, &config).unwrap();
        board.start_all(0);

        board.dispatch("threshold/gauge:value=$v", Some("80"));
        board.tick(10);

        let state = board.get_state(None);
        assert_eq!(state["value/lamp1"]["value"], "1");
        assert_eq!(state["value/lamp2"]["value"], "1");
        assert!(board.queue_is_empty());
    }
}
