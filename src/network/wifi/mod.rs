//! # Wireless Station Link
//!
//! Keeps the device associated with the configured access point and reports
//! link and address readiness through a [`ReadinessSignal`].
//!
//! ## Design
//!
//! The manager is a state machine driven by radio and network-layer events.
//! The decision logic lives in [`ConnectionState::transition`], a pure
//! function from `(state, event)` to the next state plus a list of
//! [`Action`]s. [`ConnectionManager`] owns the driver handles and carries the
//! actions out.
//!
//! * `Idle`: the radio has not reported that it started.
//! * `Connecting`: a connect request is outstanding.
//! * `Connected`: the station is associated.
//! * `Disconnected`: the last connect request failed to go out; waiting for
//!   the driver. A radio restart issues a fresh request.
//! * `GivenUp`: the reconnect bound was reached; no more connect requests are
//!   issued until the radio is started again.
//!
//! Exhausting the bound is silent: the only sign of it is that
//! [`Bit::LinkUp`] never comes back.
//!
//! ```rust
//! use stationlink::network::wifi::{Action, ConnectionState, Event, State};
//! use stationlink::signal::Bit;
//!
//! let idle = ConnectionState::new();
//! let step = idle.transition(Event::StationStarted, 3);
//! assert_eq!(step.next.phase, State::Connecting);
//! assert_eq!(&step.actions[..], &[Action::Connect]);
//!
//! let step = step.next.transition(Event::StationConnected, 3);
//! assert_eq!(&step.actions[..], &[Action::Set(Bit::LinkUp)]);
//! ```

use crate::config::StationConfig;
use crate::signal::{Bit, ReadinessSignal};
use crate::system::queue::EventQueue;
use heapless::Vec;

const LOG_TARGET: &str = "stationlink::wifi";

/// Phase of the station link.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    /// Waiting for the radio to start.
    Idle,
    /// A connect request is outstanding.
    Connecting,
    /// Associated with the access point.
    Connected,
    /// Link lost and no connect request in flight.
    Disconnected,
    /// Reconnect bound reached.
    GivenUp,
}

/// Notification from the radio driver or the network layer.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Event {
    /// The radio finished starting in station mode.
    StationStarted,
    /// The station associated with the access point.
    StationConnected,
    /// The station lost its association.
    StationDisconnected,
    /// The network layer obtained an address.
    AddressAcquired,
}

/// Side effect requested by a transition.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Action {
    /// Ask the radio to connect.
    Connect,
    /// Raise a readiness bit.
    Set(Bit),
    /// Lower a readiness bit.
    Clear(Bit),
}

/// Errors raised while bringing the radio up.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The radio rejected the station configuration.
    Configure,
    /// The radio failed to start.
    Start,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Configure => defmt::write!(f, "Configure"),
            Error::Start => defmt::write!(f, "Start"),
        }
    }
}

/// Connectivity bookkeeping owned by the manager.
///
/// `address_assigned` implies `link_up`, and `reconnect_attempts` never
/// exceeds the configured bound.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ConnectionState {
    /// Current phase.
    pub phase: State,
    /// The station is associated.
    pub link_up: bool,
    /// An address has been assigned on the current link.
    pub address_assigned: bool,
    /// Consecutive reconnects issued since the last association.
    pub reconnect_attempts: u32,
}

/// Result of feeding one event to a [`ConnectionState`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Transition {
    /// State after the event.
    pub next: ConnectionState,
    /// Effects to carry out, in order.
    pub actions: Vec<Action, 3>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionState {
    /// Startup state: idle, no link, no attempts.
    pub const fn new() -> Self {
        Self {
            phase: State::Idle,
            link_up: false,
            address_assigned: false,
            reconnect_attempts: 0,
        }
    }

    /// Compute the effect of `event` with reconnects bounded by `max_attempts`.
    pub fn transition(&self, event: Event, max_attempts: u32) -> Transition {
        let mut next = *self;
        let mut actions = Vec::new();

        match event {
            Event::StationStarted => match self.phase {
                // a restart after giving up is the external reset
                State::Idle | State::GivenUp => {
                    next.phase = State::Connecting;
                    next.reconnect_attempts = 0;
                    push(&mut actions, Action::Connect);
                }
                // the radio refused the last connect request; try again
                State::Disconnected => {
                    next.phase = State::Connecting;
                    push(&mut actions, Action::Connect);
                }
                State::Connecting | State::Connected => {}
            },
            Event::StationConnected => {
                next.phase = State::Connected;
                next.link_up = true;
                next.reconnect_attempts = 0;
                push(&mut actions, Action::Set(Bit::LinkUp));
            }
            Event::StationDisconnected => {
                next.link_up = false;
                next.address_assigned = false;
                push(&mut actions, Action::Clear(Bit::LinkUp));
                push(&mut actions, Action::Clear(Bit::AddressReady));

                if self.phase == State::GivenUp {
                    // stays terminal
                } else if self.reconnect_attempts < max_attempts {
                    next.reconnect_attempts = self.reconnect_attempts + 1;
                    next.phase = State::Connecting;
                    push(&mut actions, Action::Connect);
                } else {
                    next.phase = State::GivenUp;
                }
            }
            Event::AddressAcquired => {
                if self.link_up {
                    next.address_assigned = true;
                    push(&mut actions, Action::Set(Bit::AddressReady));
                }
            }
        }

        Transition { next, actions }
    }
}

// A transition emits at most three actions; the capacity matches.
fn push(actions: &mut Vec<Action, 3>, action: Action) {
    let _ = actions.push(action);
}

/// Radio driver operations the manager needs.
pub trait Radio {
    /// Associated error type
    type Error: core::fmt::Debug;

    /// Load station credentials.
    fn configure(&mut self, ssid: &str, passphrase: &str) -> Result<(), Self::Error>;

    /// Start the radio in station mode; completion arrives as
    /// [`Event::StationStarted`].
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Request association; the outcome arrives as an event.
    fn connect(&mut self) -> Result<(), Self::Error>;
}

/// Station link supervisor.
///
/// Owns the radio handle and the [`ConnectionState`]; publishes readiness
/// through `S`, typically a `&'static EventGroup` shared with other tasks.
#[derive(Debug)]
pub struct ConnectionManager<R: Radio, S: ReadinessSignal> {
    radio: R,
    signal: S,
    config: StationConfig,
    state: ConnectionState,
}

impl<R: Radio, S: ReadinessSignal> ConnectionManager<R, S> {
    /// Create a manager in the `Idle` state.
    pub fn new(radio: R, signal: S, config: StationConfig) -> Self {
        Self {
            radio,
            signal,
            config,
            state: ConnectionState::new(),
        }
    }

    /// Current connectivity bookkeeping.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// The radio driver.
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// The readiness signal.
    pub fn signal(&self) -> &S {
        &self.signal
    }

    /// Hand the credentials to the radio and start it.
    pub fn start(&mut self) -> Result<(), Error> {
        log::info!(
            target: LOG_TARGET,
            "starting station for ssid {} (passphrase {} bytes)",
            self.config.ssid.as_str(),
            self.config.passphrase.len()
        );
        self.radio
            .configure(&self.config.ssid, &self.config.passphrase)
            .map_err(|e| {
                log::error!(target: LOG_TARGET, "station configuration rejected: {:?}", e);
                Error::Configure
            })?;
        self.radio.start().map_err(|e| {
            log::error!(target: LOG_TARGET, "radio start failed: {:?}", e);
            Error::Start
        })
    }

    /// Process one event and carry out the resulting actions.
    pub fn process_event(&mut self, event: Event) {
        let Transition { next, actions } =
            self.state.transition(event, self.config.max_reconnect_attempts);

        if next.phase != self.state.phase {
            log::info!(target: LOG_TARGET, "{:?} -> {:?} on {:?}", self.state.phase, next.phase, event);
        } else {
            log::debug!(target: LOG_TARGET, "{:?} in {:?}", event, self.state.phase);
        }
        if event == Event::AddressAcquired && !self.state.link_up {
            log::warn!(target: LOG_TARGET, "address acquired without a link, ignored");
        }
        if next.phase == State::GivenUp && self.state.phase != State::GivenUp {
            log::warn!(
                target: LOG_TARGET,
                "giving up after {} reconnect attempts",
                next.reconnect_attempts
            );
        }

        self.state = next;

        for action in actions {
            match action {
                Action::Connect => {
                    if next.reconnect_attempts > 0 {
                        log::info!(
                            target: LOG_TARGET,
                            "reconnect attempt {}/{}",
                            next.reconnect_attempts,
                            self.config.max_reconnect_attempts
                        );
                    }
                    if let Err(e) = self.radio.connect() {
                        log::warn!(target: LOG_TARGET, "connect request failed: {:?}", e);
                        self.state.phase = State::Disconnected;
                    }
                }
                Action::Set(bit) => self.signal.set(bit),
                Action::Clear(bit) => self.signal.clear(bit),
            }
        }

        debug_assert!(!self.state.address_assigned || self.state.link_up);
        debug_assert!(self.state.reconnect_attempts <= self.config.max_reconnect_attempts);
    }

    /// Handle events from `queue` in arrival order until it shuts down.
    pub fn run<Q: EventQueue<Event>>(&mut self, queue: &mut Q) {
        while let Some(event) = queue.receive() {
            self.process_event(event);
        }
        log::info!(target: LOG_TARGET, "event queue closed");
    }
}
