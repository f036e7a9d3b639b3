//! Forwarding actions to an element on another board.
//!
//! The remote element sends a property assignment to a configured host and
//! waits for the reply without ever blocking: sending moves the element into
//! a waiting state that is polled on every tick. A reply dispatches the
//! `onreply` action with the received payload; errors and a 20 second
//! timeout abort the exchange and return the element to idle. While an
//! exchange is in flight further `send` requests are dropped with a warning.

use crate::element::{Context, Element, ElementCore, StateSink};
use crate::parse_int;

/// Outcome of polling an in-flight exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportPoll {
    /// No reply yet; keep polling.
    Pending,
    /// Reply payload arrived.
    Received(String),
    /// The exchange failed.
    Failed(String),
}

/// Connection to a remote peer, implemented by the embedding application.
///
/// All methods must return promptly; slow I/O belongs behind `poll`.
pub trait Transport {
    /// Open the connection to the given host.
    fn open(&mut self, host: &str) -> Result<(), String>;
    /// Send one request payload.
    fn send(&mut self, payload: &str) -> Result<(), String>;
    /// Check for a reply without blocking.
    fn poll(&mut self) -> TransportPoll;
    /// Close the connection. Must be safe to call in any state.
    fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Waiting,
    Abort,
}

const DEFAULT_TIMEOUT_MS: u64 = 20_000;

/// Action forwarder for a peer board, registered by the embedding
/// application with a concrete [`Transport`].
pub struct RemoteElement {
    core: ElementCore,
    transport: Box<dyn Transport>,
    host: String,
    timeout_ms: u64,
    on_reply: String,
    state: State,
    /// time the running exchange was started
    sent_ms: u64,
}

impl RemoteElement {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            core: ElementCore::default(),
            transport,
            host: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            on_reply: String::new(),
            state: State::Idle,
            sent_ms: 0,
        }
    }

    fn begin_send(&mut self, payload: &str, cx: &mut Context<'_>) {
        if self.state != State::Idle {
            tracing::warn!(id = %self.core.id, payload, "exchange in flight, request dropped");
            return;
        }
        let result = self
            .transport
            .open(&self.host)
            .and_then(|()| self.transport.send(payload));
        match result {
            Ok(()) => {
                self.state = State::Waiting;
                self.sent_ms = cx.now_ms();
            }
            Err(err) => {
                tracing::warn!(id = %self.core.id, %err, "send failed");
                self.state = State::Abort;
            }
        }
    }
}

impl Element for RemoteElement {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn set(&mut self, name: &str, value: &str, cx: &mut Context<'_>) -> bool {
        match name {
            "host" => self.host = value.to_string(),
            "timeout" => self.timeout_ms = parse_int(value).max(0) as u64,
            "send" => {
                if self.core.active {
                    self.begin_send(value, cx);
                }
            }
            "onreply" => self.on_reply = value.to_string(),
            _ => return self.base_set(name, value, cx),
        }
        true
    }

    fn start(&mut self, cx: &mut Context<'_>) {
        let _ = cx;
        if self.host.is_empty() {
            tracing::warn!(id = %self.core.id, "no host configured");
            return;
        }
        self.core.active = true;
    }

    fn tick(&mut self, cx: &mut Context<'_>) {
        match self.state {
            State::Idle => {}
            State::Waiting => {
                match self.transport.poll() {
                    TransportPoll::Pending => {
                        if cx.now_ms().saturating_sub(self.sent_ms) >= self.timeout_ms {
                            tracing::warn!(id = %self.core.id, host = %self.host, "reply timeout");
                            self.state = State::Abort;
                        }
                    }
                    TransportPoll::Received(payload) => {
                        tracing::debug!(id = %self.core.id, %payload, "reply received");
                        cx.dispatch_value(&self.on_reply, &payload);
                        self.transport.close();
                        self.state = State::Idle;
                    }
                    TransportPoll::Failed(err) => {
                        tracing::warn!(id = %self.core.id, %err, "exchange failed");
                        self.state = State::Abort;
                    }
                }
            }
            State::Abort => {
                self.transport.close();
                self.state = State::Idle;
            }
        }
    }

    fn term(&mut self, cx: &mut Context<'_>) {
        let _ = cx;
        self.transport.close();
        self.state = State::Idle;
        self.core.active = false;
    }

    fn push_state(&self, sink: &mut StateSink<'_>) {
        self.base_push_state(sink);
        sink("host", &self.host);
        sink(
            "state",
            match self.state {
                State::Idle => "idle",
                State::Waiting => "waiting",
                State::Abort => "abort",
            },
        );
    }
}
