//! A timer producing on/off actions on a wait / pulse / cycle pattern.
//!
//! The canonical deadline-driven state machine: all waiting is expressed as
//! a state plus a recorded start time compared against the clock on every
//! tick, never by blocking. Timing is second-granular.
//!
//! One cycle is: wait for `waittime`, dispatch `onon`, hold for `pulsetime`,
//! dispatch `onoff`, then idle until `cycletime` has passed. With
//! `type=loop` the cycle restarts; otherwise the timer stops. The `next`
//! action skips to the next phase boundary, `start` restarts the cycle and
//! `stop` halts the timer (dispatching `onoff` if the pulse was high).

use crate::element::{Context, Element, ElementCore, StateSink};
use crate::{parse_duration_s, symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for the pulse to begin.
    Wait,
    /// Pulse is high.
    Pulse,
    /// Pulse done, waiting for the cycle to end.
    Done,
    /// Timer halted.
    Stopped,
}

impl Phase {
    fn as_number(self) -> &'static str {
        match self {
            Phase::Wait => "0",
            Phase::Pulse => "1",
            Phase::Done => "2",
            Phase::Stopped => "3",
        }
    }
}

/// Timed action source, registered as type `"timer"`.
pub struct TimerElement {
    core: ElementCore,
    /// restart the cycle when it completes
    loop_cycle: bool,
    cycle_s: u64,
    wait_s: u64,
    pulse_s: u64,
    on_on: String,
    on_off: String,
    phase: Phase,
    start_time_s: u64,
    /// clock as of the last tick, for state reporting
    seen_s: u64,
}

impl TimerElement {
    /// Factory for the element registry.
    pub fn create() -> Box<dyn Element> {
        Box::new(Self {
            core: ElementCore::default(),
            loop_cycle: false,
            cycle_s: 0,
            wait_s: 0,
            pulse_s: 0,
            on_on: String::new(),
            on_off: String::new(),
            phase: Phase::Stopped,
            start_time_s: 0,
            seen_s: 0,
        })
    }

    fn restart_timer(&mut self, now_s: u64) {
        self.phase = Phase::Wait;
        self.start_time_s = now_s;
    }

    fn stop_timer(&mut self, cx: &mut Context<'_>) {
        if self.phase == Phase::Pulse {
            cx.dispatch(&self.on_off);
        }
        self.phase = Phase::Stopped;
    }
}

impl Element for TimerElement {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn set(&mut self, name: &str, value: &str, cx: &mut Context<'_>) -> bool {
        let now_s = cx.uptime_s();
        match symbol::find(name) {
            Some(symbol::TYPE) => {
                if value.eq_ignore_ascii_case("loop") {
                    self.loop_cycle = true;
                } else {
                    tracing::warn!(id = %self.core.id, value, "unknown timer type");
                    return false;
                }
            }
            Some(symbol::NEXT) => match self.phase {
                // jump to the next phase boundary by backdating the start
                Phase::Wait => self.start_time_s = now_s.saturating_sub(self.wait_s),
                Phase::Pulse => {
                    self.start_time_s = now_s.saturating_sub(self.wait_s + self.pulse_s)
                }
                Phase::Done | Phase::Stopped => self.restart_timer(now_s),
            },
            Some(symbol::START) => {
                if self.phase == Phase::Pulse {
                    cx.dispatch(&self.on_off);
                }
                if !self.core.active {
                    self.start(cx);
                }
                self.restart_timer(now_s);
            }
            Some(symbol::STOP) => {
                // halts the cycle; the element itself stays active
                self.stop_timer(cx);
            }
            _ => match name {
                "cycletime" => self.cycle_s = parse_duration_s(value),
                "waittime" => self.wait_s = parse_duration_s(value),
                "pulsetime" => self.pulse_s = parse_duration_s(value),
                "onon" => self.on_on = value.to_string(),
                "onoff" => self.on_off = value.to_string(),
                _ => return self.base_set(name, value, cx),
            },
        }
        true
    }

    fn start(&mut self, cx: &mut Context<'_>) {
        if self.cycle_s < self.wait_s + self.pulse_s {
            self.cycle_s = self.wait_s + self.pulse_s;
        }
        if self.pulse_s == 0 || self.pulse_s == self.cycle_s {
            tracing::warn!(id = %self.core.id, "no meaningful timing configured");
            return;
        }
        self.core.active = true;
        self.restart_timer(cx.uptime_s());
    }

    fn tick(&mut self, cx: &mut Context<'_>) {
        let now_s = cx.uptime_s();
        self.seen_s = now_s;
        let elapsed = now_s.saturating_sub(self.start_time_s);

        match self.phase {
            Phase::Wait => {
                if elapsed >= self.wait_s {
                    self.phase = Phase::Pulse;
                    cx.dispatch(&self.on_on);
                }
            }
            Phase::Pulse => {
                if elapsed >= self.wait_s + self.pulse_s {
                    self.phase = Phase::Done;
                    cx.dispatch(&self.on_off);
                }
            }
            Phase::Done => {
                if elapsed >= self.cycle_s {
                    if self.loop_cycle {
                        self.restart_timer(now_s);
                    } else {
                        self.stop_timer(cx);
                    }
                }
            }
            Phase::Stopped => {}
        }
    }

    fn term(&mut self, cx: &mut Context<'_>) {
        self.stop_timer(cx);
        self.core.active = false;
    }

    fn push_state(&self, sink: &mut StateSink<'_>) {
        self.base_push_state(sink);
        sink("state", self.phase.as_number());
        let time = if self.phase == Phase::Stopped {
            0
        } else {
            self.seen_s.saturating_sub(self.start_time_s)
        };
        sink("time", &time.to_string());
        sink("value", if self.phase == Phase::Pulse { "1" } else { "0" });
    }
}
