//! A series of action steps executed by a single trigger.
//!
//! Each step is an action template (possibly a comma separated list). After a
//! `start` the steps are emitted one per tick at the earliest, and only once
//! all previously queued actions have been delivered: the queue-empty
//! barrier keeps multi-step sequences from overlapping. An optional `delay`
//! (milliseconds) spaces the steps further apart.

use crate::element::{Context, Element, ElementCore, StateSink};
use crate::{parse_int, symbol};

/// Multi-step action sequence, registered as type `"scene"`.
pub struct SceneElement {
    core: ElementCore,
    steps: Vec<String>,
    /// milliseconds between steps; negative disables auto-advance
    delay_ms: i64,
    /// index of the step to emit next; -1 when idle
    current: i64,
    /// time the next step is due; 0 when nothing is pending
    next_step_ms: u64,
}

impl SceneElement {
    /// Factory for the element registry.
    pub fn create() -> Box<dyn Element> {
        Box::new(Self {
            core: ElementCore::default(),
            steps: Vec::new(),
            delay_ms: 100,
            current: -1,
            next_step_ms: 0,
        })
    }

    fn set_step(&mut self, index: usize, value: &str) {
        if self.steps.len() <= index {
            self.steps.resize(index + 1, String::new());
        }
        self.steps[index] = value.to_string();
    }
}

impl Element for SceneElement {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn set(&mut self, name: &str, value: &str, cx: &mut Context<'_>) -> bool {
        match symbol::find(name) {
            Some(symbol::START) => {
                if !self.core.active {
                    self.start(cx);
                }
                self.current = 0;
                self.next_step_ms = 1; // as soon as possible
            }
            Some(symbol::NEXT) => {
                if self.current < self.steps.len() as i64 {
                    self.current += 1;
                    self.next_step_ms = 1;
                }
            }
            Some(symbol::PREV) => {
                if self.current > 0 {
                    self.current -= 1;
                    self.next_step_ms = 1;
                }
            }
            _ => {
                if let Some(rest) = name.strip_prefix("steps[") {
                    let Some(index) = rest
                        .strip_suffix(']')
                        .and_then(|i| i.parse::<usize>().ok())
                    else {
                        tracing::warn!(id = %self.core.id, name, "bad step index");
                        return false;
                    };
                    self.set_step(index, value);
                } else if name == "delay" {
                    self.delay_ms = parse_int(value);
                } else {
                    return self.base_set(name, value, cx);
                }
            }
        }
        true
    }

    fn tick(&mut self, cx: &mut Context<'_>) {
        if self.next_step_ms == 0 {
            return;
        }
        let now = cx.now_ms();
        // barrier: only emit once every earlier action has been delivered
        if now < self.next_step_ms || !cx.queue_is_empty() {
            return;
        }

        if self.current >= 0 && (self.current as usize) < self.steps.len() {
            let step = self.steps[self.current as usize].clone();
            tracing::debug!(id = %self.core.id, step = self.current, "scene step");
            cx.dispatch(&step);
        }
        self.next_step_ms = 0;
        // negative delay: stay on this step until an explicit next/prev
        if self.delay_ms >= 0 {
            self.current += 1;
            if (self.current as usize) < self.steps.len() {
                self.next_step_ms = now + self.delay_ms as u64;
            } else {
                self.current = -1;
            }
        }
    }

    fn term(&mut self, cx: &mut Context<'_>) {
        let _ = cx;
        self.current = -1;
        self.next_step_ms = 0;
        self.core.active = false;
    }

    fn push_state(&self, sink: &mut StateSink<'_>) {
        self.base_push_state(sink);
        sink("step", &self.current.to_string());
    }
}
