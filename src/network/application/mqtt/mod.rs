//! MQTT 3.1.1 publishing for embedded systems.
//!
//! Commands typed on the device console end up as small JSON messages on
//! broker topics. This module defines the [`Publisher`] capability the
//! command interpreter depends on, and a minimal [`Client`] that implements
//! it over any [`Connection`](crate::network::Connection).
//!
//! # Usage
//!
//! ```rust,no_run
//! use stationlink::network::application::mqtt::{Client, Options, Publisher, QoS};
//! # use stationlink::network::Connection;
//! # struct MockConnection;
//! # impl Connection for MockConnection {}
//! # impl stationlink::network::Read for MockConnection {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl stationlink::network::Write for MockConnection {
//! #     type Error = ();
//! #     fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> { Ok(0) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl stationlink::network::Close for MockConnection {
//! #     type Error = ();
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//!
//! let connection = MockConnection;
//! let options = Options {
//!     client_id: "player_7f3a",
//!     keep_alive_seconds: 60,
//!     clean_session: true,
//! };
//!
//! // let mut client = Client::connect(connection, options)?;
//! // client.publish("game/player/7f3a", br#"{"val":"ok"}"#, QoS::AtLeastOnce, false)?;
//! ```

/// MQTT client implementation and supporting types.
pub mod client;

pub use client::{Client, Options};

/// Quality of Service levels for MQTT messages.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum QoS {
    /// At most once delivery.
    AtMostOnce = 0,
    /// At least once delivery.
    AtLeastOnce = 1,
    /// Exactly once delivery.
    ExactlyOnce = 2,
}

#[cfg(feature = "defmt")]
impl defmt::Format for QoS {
    fn format(&self, f: defmt::Formatter) {
        match self {
            QoS::AtMostOnce => defmt::write!(f, "AtMostOnce"),
            QoS::AtLeastOnce => defmt::write!(f, "AtLeastOnce"),
            QoS::ExactlyOnce => defmt::write!(f, "ExactlyOnce"),
        }
    }
}

/// Outbound publish capability.
///
/// Callers treat a publish as fire-and-forget: an `Err` is reported but never
/// retried by them, so delivery guarantees belong to the implementation.
pub trait Publisher {
    /// Associated error type
    type Error: core::fmt::Debug;

    /// Publish `payload` on `topic`.
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), Self::Error>;
}

impl<P: Publisher + ?Sized> Publisher for &mut P {
    type Error = P::Error;

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), Self::Error> {
        (**self).publish(topic, payload, qos, retain)
    }
}
