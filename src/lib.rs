//! # stationlink - connectivity and console commands for game devices
//!
//! Two long-running supervisors for a networked handheld:
//!
//! - **Station link** ([`network::wifi`]): keeps the device associated with
//!   its access point, retries a bounded number of times after a drop, and
//!   reports link and address readiness.
//! - **Console commands** ([`system::interpreter`]): reads lines from the
//!   serial port, classifies them against a fixed grammar and either
//!   publishes a JSON message over MQTT or raises a flag for another task.
//!
//! Both share a [`signal::ReadinessSignal`], a set of atomic flag bits other
//! subsystems watch to learn that the network is up or that the player asked
//! for registration, a certificate, or a game start.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stationlink::config::Settings;
//! use stationlink::network::wifi::ConnectionManager;
//! use stationlink::signal::EventGroup;
//! # use stationlink::network::wifi::{Event, Radio};
//! # use stationlink::system::queue::EventQueue;
//! # struct Wifi;
//! # impl Radio for Wifi {
//! #     type Error = ();
//! #     fn configure(&mut self, _s: &str, _p: &str) -> Result<(), ()> { Ok(()) }
//! #     fn start(&mut self) -> Result<(), ()> { Ok(()) }
//! #     fn connect(&mut self) -> Result<(), ()> { Ok(()) }
//! # }
//! # struct RadioEvents;
//! # impl EventQueue<Event> for RadioEvents {
//! #     fn receive(&mut self) -> Option<Event> { None }
//! #     fn reset(&mut self) {}
//! # }
//!
//! static FLAGS: EventGroup = EventGroup::new();
//!
//! let settings = Settings::from_json(r#"{
//!     "station": { "ssid": "arena", "passphrase": "hunter22" },
//!     "device": { "short_id": "7f3a", "uplink_topic": "game/player/7f3a", "chat_topic": "game/torget" }
//! }"#).unwrap();
//!
//! let mut link = ConnectionManager::new(Wifi, &FLAGS, settings.station);
//! link.start().unwrap();
//! link.run(&mut RadioEvents);
//! ```
//!
//! ## Optional Features
//!
//! - `std`: queue adapter for `std::sync::mpsc::Receiver`
//! - `defmt`: `defmt::Format` for the public error and event types

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

/// Device configuration: station credentials, identity and topics.
pub mod config;

/// Network abstraction layer: the station link and the MQTT publisher.
pub mod network;

/// Shared readiness flags.
pub mod signal;

/// Serial console: transport boundary, grammar and interpreter.
pub mod system;
