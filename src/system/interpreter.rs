//! Serial command interpreter.
//!
//! Turns serial driver notifications into at most one action each: a JSON
//! publish through a [`Publisher`], or a raised [`ReadinessSignal`] bit.
//!
//! # Event handling
//!
//! - [`UartEvent::Data`]: the receive buffer is zeroed, then filled by a
//!   single bounded read. The bytes up to the first NUL form the line, minus
//!   any trailing `\r`/`\n`. Empty lines are dropped; anything else is
//!   classified with [`classify`] and dispatched.
//! - [`UartEvent::FifoOverflow`] / [`UartEvent::BufferFull`]: data was lost,
//!   so pending input is flushed and queued notifications are discarded.
//! - [`UartEvent::ParityError`] / [`UartEvent::FrameError`]: logged only.
//! - anything else: logged as an unknown event.
//!
//! Votes go to the uplink topic as `{"val":"<choice>"}`, chat lines to the
//! chat topic as `{"id":"<short id>","data":"<text>"}`. Publishes use QoS 1
//! without retain and are never retried here.

use super::command::{Choice, Command, Request, classify};
use super::queue::EventQueue;
use super::serial::{SerialTransport, UartEvent};
use crate::config::{DEVICE_ID_MAX_LEN, DeviceConfig};
use crate::network::application::mqtt::{Publisher, QoS};
use crate::signal::ReadinessSignal;
use serde::Serialize;

const LOG_TARGET: &str = "stationlink::serial";

/// Size of the receive buffer; one byte is always left as terminator.
pub const SERIAL_BUFFER_SIZE: usize = 256;

/// Upper bound on a serialised outbound message.
///
/// Sized for a full line of characters that JSON escapes as `\u00XX`, plus
/// an equally escaped short id and the object framing.
pub const PAYLOAD_BUFFER_SIZE: usize =
    6 * (SERIAL_BUFFER_SIZE - 1) + 6 * DEVICE_ID_MAX_LEN + CHAT_FRAMING_LEN;

// `{"id":"","data":""}` with room to spare
const CHAT_FRAMING_LEN: usize = 32;

/// How long the read following a `Data` notification may wait.
pub const READ_TIMEOUT_MS: u32 = 500;

/// Quality of service for every publish.
pub const PUBLISH_QOS: QoS = QoS::AtLeastOnce;

#[derive(Serialize)]
struct ChoiceMessage<'a> {
    val: &'a str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    id: &'a str,
    data: &'a str,
}

/// Line-level transport faults that are reported and otherwise ignored.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LineError {
    /// Parity check failed.
    Parity,
    /// Framing error.
    Frame,
}

/// What handling one notification amounted to.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Outcome {
    /// A vote was handed to the publisher.
    Voted(Choice),
    /// A chat line was handed to the publisher.
    Chatted,
    /// A request bit was raised.
    Requested(Request),
    /// The line matched no command.
    Unrecognized,
    /// No text was received.
    Empty,
    /// The transport read failed.
    ReadFailed,
    /// The message did not fit the payload buffer and was dropped.
    Oversized,
    /// Input was flushed after data loss.
    Resynchronized,
    /// A line error was reported.
    LineError(LineError),
    /// An unknown driver event was reported.
    UnknownEvent(u32),
}

#[cfg(feature = "defmt")]
impl defmt::Format for Outcome {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Outcome::Voted(choice) => defmt::write!(f, "Voted({=str})", choice.as_str()),
            Outcome::Chatted => defmt::write!(f, "Chatted"),
            Outcome::Requested(request) => {
                defmt::write!(f, "Requested({=str})", request.as_str())
            }
            Outcome::Unrecognized => defmt::write!(f, "Unrecognized"),
            Outcome::Empty => defmt::write!(f, "Empty"),
            Outcome::ReadFailed => defmt::write!(f, "ReadFailed"),
            Outcome::Oversized => defmt::write!(f, "Oversized"),
            Outcome::Resynchronized => defmt::write!(f, "Resynchronized"),
            Outcome::LineError(LineError::Parity) => defmt::write!(f, "LineError(Parity)"),
            Outcome::LineError(LineError::Frame) => defmt::write!(f, "LineError(Frame)"),
            Outcome::UnknownEvent(code) => defmt::write!(f, "UnknownEvent({})", code),
        }
    }
}

/// Reads console lines from `T` and dispatches them to `P` or `S`.
#[derive(Debug)]
pub struct CommandInterpreter<T: SerialTransport, P: Publisher, S: ReadinessSignal> {
    transport: T,
    publisher: P,
    signal: S,
    device: DeviceConfig,
    buffer: [u8; SERIAL_BUFFER_SIZE],
}

impl<T: SerialTransport, P: Publisher, S: ReadinessSignal> CommandInterpreter<T, P, S> {
    /// Create an interpreter.
    pub fn new(transport: T, publisher: P, signal: S, device: DeviceConfig) -> Self {
        log::info!(target: LOG_TARGET, "command interpreter ready");
        Self {
            transport,
            publisher,
            signal,
            device,
            buffer: [0; SERIAL_BUFFER_SIZE],
        }
    }

    /// The serial transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The publisher.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// The readiness signal.
    pub fn signal(&self) -> &S {
        &self.signal
    }

    /// Handle one driver notification.
    ///
    /// `queue` is the notification source the event came from; it is reset
    /// when data loss forces a resynchronisation.
    pub fn on_receive_event<Q: EventQueue<UartEvent>>(
        &mut self,
        event: UartEvent,
        queue: &mut Q,
    ) -> Outcome {
        match event {
            UartEvent::Data(size) => self.receive(size),
            UartEvent::FifoOverflow | UartEvent::BufferFull => {
                log::warn!(target: LOG_TARGET, "{:?}, flushing input", event);
                if let Err(e) = self.transport.flush_input() {
                    log::warn!(target: LOG_TARGET, "flush failed: {:?}", e);
                }
                queue.reset();
                Outcome::Resynchronized
            }
            UartEvent::ParityError => {
                log::warn!(target: LOG_TARGET, "parity error");
                Outcome::LineError(LineError::Parity)
            }
            UartEvent::FrameError => {
                log::warn!(target: LOG_TARGET, "frame error");
                Outcome::LineError(LineError::Frame)
            }
            UartEvent::Other(code) => {
                log::info!(target: LOG_TARGET, "unhandled uart event type {}", code);
                Outcome::UnknownEvent(code)
            }
        }
    }

    /// Handle notifications from `queue` in arrival order until it shuts down.
    pub fn run<Q: EventQueue<UartEvent>>(&mut self, queue: &mut Q) {
        while let Some(event) = queue.receive() {
            self.on_receive_event(event, queue);
        }
        log::info!(target: LOG_TARGET, "event queue closed");
    }

    fn receive(&mut self, size: usize) -> Outcome {
        self.buffer.fill(0);
        let wanted = size.min(SERIAL_BUFFER_SIZE - 1);
        if wanted == 0 {
            return Outcome::Empty;
        }

        let read = match self
            .transport
            .read_bytes(&mut self.buffer[..wanted], READ_TIMEOUT_MS)
        {
            Ok(n) => n.min(wanted),
            Err(e) => {
                log::warn!(target: LOG_TARGET, "read of {} bytes failed: {:?}", wanted, e);
                return Outcome::ReadFailed;
            }
        };
        log::debug!(target: LOG_TARGET, "received {} bytes", read);

        let line = line_text(&self.buffer[..read]);
        if line.is_empty() {
            return Outcome::Empty;
        }
        log::info!(target: LOG_TARGET, "received command: {}", line);

        let command = classify(line);
        dispatch(
            command,
            &self.device,
            &mut self.publisher,
            &self.signal,
        )
    }
}

/// Text of a received line: up to the first NUL, valid UTF-8 prefix only,
/// trailing line terminators removed.
fn line_text(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let bytes = &bytes[..end];
    let text = match core::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
    };
    text.trim_end_matches(['\r', '\n'])
}

fn dispatch<P: Publisher, S: ReadinessSignal>(
    command: Command<'_>,
    device: &DeviceConfig,
    publisher: &mut P,
    signal: &S,
) -> Outcome {
    let mut payload = [0u8; PAYLOAD_BUFFER_SIZE];

    match command {
        Command::Choice(choice) => {
            log::info!(target: LOG_TARGET, "choice: {}", choice.as_str());
            let message = ChoiceMessage {
                val: choice.as_str(),
            };
            let Ok(len) = serde_json_core::to_slice(&message, &mut payload) else {
                log::error!(target: LOG_TARGET, "choice message does not fit");
                return Outcome::Oversized;
            };
            publish(publisher, &device.uplink_topic, &payload[..len]);
            Outcome::Voted(choice)
        }
        Command::Chat(body) => {
            log::info!(target: LOG_TARGET, "chat message: {}", body);
            let message = ChatMessage {
                id: &device.short_id,
                data: body,
            };
            let Ok(len) = serde_json_core::to_slice(&message, &mut payload) else {
                log::error!(target: LOG_TARGET, "chat message too long, dropped");
                return Outcome::Oversized;
            };
            publish(publisher, &device.chat_topic, &payload[..len]);
            Outcome::Chatted
        }
        Command::Request(request) => {
            log::info!(target: LOG_TARGET, "request: {}", request.as_str());
            signal.set(request.bit());
            Outcome::Requested(request)
        }
        Command::Unrecognized => {
            log::info!(target: LOG_TARGET, "unknown choice command");
            Outcome::Unrecognized
        }
    }
}

fn publish<P: Publisher>(publisher: &mut P, topic: &str, payload: &[u8]) {
    if let Err(e) = publisher.publish(topic, payload, PUBLISH_QOS, false) {
        log::warn!(target: LOG_TARGET, "publish to {} failed: {:?}", topic, e);
    }
}
