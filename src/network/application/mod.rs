//! # Application Layer Network Protocols
//!
//! Protocol clients that run on top of the station link once it has an
//! address. Each client is connection agnostic and works with any type
//! implementing [`Connection`](crate::network::Connection).
//!
//! - **[`mqtt`]**: MQTT 3.1.1 publishing, used to send console commands to
//!   the game broker

/// MQTT client implementation.
///
/// Provides an MQTT 3.1.1 client for publishing messages, and the
/// [`Publisher`](mqtt::Publisher) trait the command interpreter is written
/// against.
pub mod mqtt;
