//! System utilities for embedded devices.
//!
//! The serial console side of the device:
//!
//! - **[`serial`]**: the UART driver boundary (notifications and reads)
//! - **[`command`]**: the console command grammar
//! - **[`interpreter`]**: the receive loop that classifies and dispatches lines
//! - **[`queue`]**: the blocking notification queue both loops wait on
//!
//! # Usage
//!
//! ```rust,no_run
//! use stationlink::config::DeviceConfig;
//! use stationlink::signal::EventGroup;
//! use stationlink::system::interpreter::CommandInterpreter;
//! # use stationlink::network::application::mqtt::{Publisher, QoS};
//! # use stationlink::system::queue::EventQueue;
//! # use stationlink::system::serial::{SerialTransport, UartEvent};
//! # struct Uart;
//! # impl SerialTransport for Uart {
//! #     type Error = ();
//! #     fn read_bytes(&mut self, _buf: &mut [u8], _timeout_ms: u32) -> Result<usize, ()> { Ok(0) }
//! #     fn flush_input(&mut self) -> Result<(), ()> { Ok(()) }
//! # }
//! # struct Broker;
//! # impl Publisher for Broker {
//! #     type Error = ();
//! #     fn publish(&mut self, _t: &str, _p: &[u8], _q: QoS, _r: bool) -> Result<(), ()> { Ok(()) }
//! # }
//! # struct Events;
//! # impl EventQueue<UartEvent> for Events {
//! #     fn receive(&mut self) -> Option<UartEvent> { None }
//! #     fn reset(&mut self) {}
//! # }
//!
//! static FLAGS: EventGroup = EventGroup::new();
//!
//! let device = DeviceConfig::new("7f3a", "game/player/7f3a", "game/torget").unwrap();
//! let mut interpreter = CommandInterpreter::new(Uart, Broker, &FLAGS, device);
//! interpreter.run(&mut Events);
//! ```

/// Console command grammar.
pub mod command;

/// Serial receive loop and dispatch.
pub mod interpreter;

/// Driver notification queues.
pub mod queue;

/// UART driver boundary.
pub mod serial;
