//! Counting pulses recorded from interrupt context.
//!
//! Pulse sources (flow meters, S0 energy counters) raise edges far more
//! often than the board ticks. Each edge is recorded into one of a fixed set
//! of counter slots via [`record_pulse`], which is safe to call from an
//! interrupt handler or any other thread: the slots are plain atomics,
//! written with relaxed ordering by a single producer and read by the single
//! board thread. Counters only ever increment and wrap; consumers take
//! wrapping differences between reads, so a wraparound costs nothing.
//!
//! The pulse element owns one slot and dispatches the number of new edges
//! since the previous tick through its `onvalue` action.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::element::{Context, Element, ElementCore, StateSink};
use crate::{parse_int, symbol};

/// Number of independent counter slots.
pub const PULSE_SLOTS: usize = 8;

static COUNTERS: [AtomicU32; PULSE_SLOTS] = [
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
];

/// Record one pulse edge on the given slot.
///
/// Callable from interrupt or signal context; does nothing for an
/// out-of-range slot.
#[inline]
pub fn record_pulse(slot: usize) {
    if let Some(counter) = COUNTERS.get(slot) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Raw cumulative counter for the given slot. Wraps at `u32::MAX`.
#[inline]
pub fn pulse_count(slot: usize) -> u32 {
    COUNTERS.get(slot).map_or(0, |c| c.load(Ordering::Relaxed))
}

/// Edge counter element, registered by the embedding application for the
/// pins it wires up.
pub struct PulseElement {
    core: ElementCore,
    slot: usize,
    on_value: String,
    /// counter value as of the previous tick
    last: u32,
    /// total edges seen since start, for state reporting
    total: u64,
}

impl PulseElement {
    /// Factory for the element registry.
    pub fn create() -> Box<dyn Element> {
        Box::new(Self {
            core: ElementCore::default(),
            slot: 0,
            on_value: String::new(),
            last: 0,
            total: 0,
        })
    }
}

impl Element for PulseElement {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn set(&mut self, name: &str, value: &str, cx: &mut Context<'_>) -> bool {
        match symbol::find(name) {
            Some(symbol::PIN) => self.slot = parse_int(value).max(0) as usize,
            Some(symbol::ON_VALUE) => self.on_value = value.to_string(),
            _ => return self.base_set(name, value, cx),
        }
        true
    }

    fn start(&mut self, cx: &mut Context<'_>) {
        let _ = cx;
        if self.slot >= PULSE_SLOTS {
            tracing::warn!(id = %self.core.id, slot = self.slot, "no such counter slot");
            return;
        }
        // edges recorded before start are not reported
        self.last = pulse_count(self.slot);
        self.total = 0;
        self.core.active = true;
    }

    fn tick(&mut self, cx: &mut Context<'_>) {
        let now = pulse_count(self.slot);
        // counters are never reset, so a wrapped counter still yields the
        // right delta
        let delta = now.wrapping_sub(self.last);
        if delta > 0 {
            self.last = now;
            self.total += u64::from(delta);
            cx.dispatch_int(&self.on_value, i64::from(delta));
        }
    }

    fn push_state(&self, sink: &mut StateSink<'_>) {
        self.base_push_state(sink);
        sink("count", &self.total.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::ActionQueue;

    // each test uses its own slot so they can run in parallel

    fn pulse(slot: usize, q: &mut ActionQueue) -> Box<dyn Element> {
        let mut e = PulseElement::create();
        let mut cx = Context::new(0, q);
        e.set("pin", &slot.to_string(), &mut cx);
        e.set("onvalue", "flow/f:value=$v", &mut cx);
        e.start(&mut cx);
        e
    }

    #[test]
    fn test_delta_per_tick() {
        let mut q = ActionQueue::new();
        let mut e = pulse(5, &mut q);

        record_pulse(5);
        record_pulse(5);
        e.tick(&mut Context::new(100, &mut q));
        assert_eq!(q.pop().as_deref(), Some("flow/f:value=2"));

        // no new edges: no action
        e.tick(&mut Context::new(200, &mut q));
        assert!(q.is_empty());

        record_pulse(5);
        e.tick(&mut Context::new(300, &mut q));
        assert_eq!(q.pop().as_deref(), Some("flow/f:value=1"));
    }

    #[test]
    fn test_edges_before_start_are_skipped() {
        let mut q = ActionQueue::new();
        record_pulse(6);
        record_pulse(6);
        let mut e = pulse(6, &mut q);

        e.tick(&mut Context::new(100, &mut q));
        assert!(q.is_empty());

        record_pulse(6);
        e.tick(&mut Context::new(200, &mut q));
        assert_eq!(q.pop().as_deref(), Some("flow/f:value=1"));
    }

    #[test]
    fn test_total_in_state() {
        let mut q = ActionQueue::new();
        let mut e = pulse(7, &mut q);
        record_pulse(7);
        record_pulse(7);
        record_pulse(7);
        e.tick(&mut Context::new(100, &mut q));

        let mut seen = Vec::new();
        e.push_state(&mut |n, v| seen.push((n.to_string(), v.to_string())));
        assert!(seen.contains(&("count".to_string(), "3".to_string())));
    }

    #[test]
    fn test_bad_slot_stays_inactive() {
        let mut q = ActionQueue::new();
        let mut e = PulseElement::create();
        let mut cx = Context::new(0, &mut q);
        e.set("pin", "99", &mut cx);
        e.start(&mut cx);
        assert!(!e.core().active);
    }

    #[test]
    fn test_out_of_range_slot_is_ignored() {
        record_pulse(PULSE_SLOTS); // must not panic
        assert_eq!(pulse_count(PULSE_SLOTS), 0);
    }
}
