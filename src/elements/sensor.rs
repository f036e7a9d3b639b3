//! Periodic sensor polling with warm-up, resend and restart policy.
//!
//! The sensor element owns the scheduling around a [`Probe`], the narrow
//! collaborator contract every chip driver implements. It reads the probe on
//! a `readtime` interval (after an initial `warmuptime`), fans the comma
//! separated readings out to per-index actions, optionally re-sends
//! unchanged values every `resendtime`, and implements the self-healing
//! restart: a probe failure mid-read deactivates the element and, when
//! `restart` is configured and the sensor has worked before, immediately
//! starts it again with a fresh warm-up. The restart only fires for genuine
//! read attempts, so an explicit `stop` never loops back into `start`.

use crate::element::{Context, Element, ElementCore, StateSink};
use crate::{parse_bool, parse_duration_s, symbol};

/// Error reported by a probe read.
#[derive(Debug, thiserror::Error)]
#[error("sensor read failed: {0}")]
pub struct ProbeError(pub String);

/// The chip-driver side of a sensor.
///
/// `read` is called once per tick while a reading is due and must not block:
/// return `Ok(None)` while a conversion is still in progress, `Ok(Some(_))`
/// with the comma separated values when done, or `Err(_)` when the sensor
/// failed (checksum, bus NACK, timeout).
pub trait Probe {
    /// Attempt to read the sensor values.
    fn read(&mut self) -> Result<Option<String>, ProbeError>;
}

/// Scheduling wrapper around a [`Probe`]. Constructed directly (the probe is
/// a collaborator, so there is no parameterless factory) and added to the
/// board with [`Board::add`](crate::Board::add).
pub struct SensorElement {
    core: ElementCore,
    probe: Box<dyn Probe>,
    read_time_s: u64,
    resend_time_s: u64,
    warmup_time_s: u64,
    restart: bool,
    /// the sensor delivered data at least once; restarting may help
    worked_once: bool,
    /// a probe read is in progress; gates the restart path in `term()`
    is_reading: bool,
    next_read_ms: u64,
    next_send_ms: u64,
    last_values: String,
    /// action template per value index
    actions: Vec<String>,
}

impl SensorElement {
    /// Wrap a probe with default scheduling (read every 60 s, 3 s warm-up,
    /// no resend, no restart).
    pub fn new(probe: Box<dyn Probe>) -> Self {
        Self {
            core: ElementCore::default(),
            probe,
            read_time_s: 60,
            resend_time_s: 0,
            warmup_time_s: 3,
            restart: false,
            worked_once: false,
            is_reading: false,
            next_read_ms: 0,
            next_send_ms: 0,
            last_values: String::new(),
            actions: Vec::new(),
        }
    }

    /// When the next probe read is due (milliseconds).
    pub fn next_read_ms(&self) -> u64 {
        self.next_read_ms
    }

    fn set_action(&mut self, index: usize, value: &str) {
        if self.actions.len() <= index {
            self.actions.resize(index + 1, String::new());
        }
        self.actions[index] = value.to_string();
    }

    fn send_data(&mut self, cx: &mut Context<'_>) {
        for (i, action) in self.actions.iter().enumerate() {
            if !action.is_empty() {
                cx.dispatch_item(action, &self.last_values, i);
            }
        }
    }
}

impl Element for SensorElement {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn set(&mut self, name: &str, value: &str, cx: &mut Context<'_>) -> bool {
        if symbol::find(name) == Some(symbol::ON_VALUE) {
            self.set_action(0, value);
        } else if let Some(rest) = name.strip_prefix("onvalue[") {
            let Some(index) = rest.strip_suffix(']').and_then(|i| i.parse().ok()) else {
                tracing::warn!(id = %self.core.id, name, "bad action index");
                return false;
            };
            self.set_action(index, value);
        } else {
            match name {
                "readtime" => self.read_time_s = parse_duration_s(value),
                "resendtime" => self.resend_time_s = parse_duration_s(value),
                "warmuptime" => self.warmup_time_s = parse_duration_s(value),
                "restart" => self.restart = parse_bool(value),
                _ => return self.base_set(name, value, cx),
            }
        }
        true
    }

    fn start(&mut self, cx: &mut Context<'_>) {
        self.core.active = true;
        // let the sensor settle before the first read
        self.next_read_ms = cx.now_ms() + self.warmup_time_s * 1000;
        self.next_send_ms = 0;
    }

    fn term(&mut self, cx: &mut Context<'_>) {
        self.core.active = false;
        if self.is_reading && self.worked_once && self.restart {
            // deactivation came from a failed read and retrying is configured
            tracing::info!(id = %self.core.id, "restarting sensor after read failure");
            self.start(cx);
            self.worked_once = false;
        }
        self.next_read_ms = cx.now_ms() + self.warmup_time_s * 1000;
        self.next_send_ms = 0;
    }

    fn tick(&mut self, cx: &mut Context<'_>) {
        let now = cx.now_ms();

        if now >= self.next_read_ms {
            self.is_reading = true;
            match self.probe.read() {
                Ok(Some(values)) => {
                    self.worked_once = true;
                    self.next_read_ms = now + self.read_time_s * 1000;
                    if values != self.last_values {
                        self.next_send_ms = now.max(1); // send as soon as possible
                    }
                    self.last_values = values;
                }
                Ok(None) => {
                    // conversion still running, retry next tick
                }
                Err(err) => {
                    tracing::warn!(id = %self.core.id, %err, "probe failed");
                    self.term(cx);
                }
            }
            self.is_reading = false;
        } else if self.next_send_ms != 0 && now >= self.next_send_ms {
            if !self.last_values.is_empty() {
                self.send_data(cx);
            }
            self.next_send_ms = if self.resend_time_s != 0 {
                now + self.resend_time_s * 1000
            } else {
                0
            };
        }
    }

    fn push_state(&self, sink: &mut StateSink<'_>) {
        self.base_push_state(sink);
        sink("values", &self.last_values);
    }
}
