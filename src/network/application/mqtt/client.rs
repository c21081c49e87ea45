//! An MQTT 3.1.1 publishing client.
//!
//! Only the packets a publishing device needs are implemented: CONNECT and
//! CONNACK to open the session, PUBLISH to send, and PUBACK so QoS 1 sends
//! can be acknowledged by the caller when it wants to.
use super::{Publisher, QoS};
use crate::network::error::Error;
use crate::network::Connection;
use heapless::Vec;

// MQTT Control Packet types
const CONNECT: u8 = 0x10;
const CONNACK: u8 = 0x20;
const PUBLISH: u8 = 0x30;
const PUBACK: u8 = 0x40;

const PUBLISH_RETAIN: u8 = 0x01;

// Protocol constants
const PROTOCOL_NAME: &[u8] = b"MQTT";
const PROTOCOL_LEVEL: u8 = 4; // MQTT 3.1.1

/// Largest PUBLISH variable header plus payload this client will send.
///
/// Holds a full-size escaped chat message on a maximum-length topic.
pub const MAX_PACKET_LEN: usize = 2048;

/// Options for configuring the MQTT client connection.
#[derive(Debug, Clone)]
pub struct Options<'a> {
    /// The client identifier, must be unique.
    pub client_id: &'a str,
    /// The keep-alive time in seconds.
    pub keep_alive_seconds: u16,
    /// Whether to start a clean session.
    pub clean_session: bool,
}

/// An MQTT 3.1.1 client that publishes over `C`.
pub struct Client<C: Connection> {
    connection: C,
    next_packet_id: u16,
}

impl<C: Connection> core::fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("next_packet_id", &self.next_packet_id)
            .finish_non_exhaustive()
    }
}

impl<C: Connection> Client<C> {
    /// Establishes an MQTT connection with the server.
    ///
    /// This function sends a `CONNECT` packet and waits for a `CONNACK` response.
    pub fn connect(mut connection: C, options: Options) -> Result<Self, Error> {
        let client_id = options.client_id.as_bytes();

        let mut body: Vec<u8, 256> = Vec::new();
        put_bytes(&mut body, PROTOCOL_NAME)?;
        body.push(PROTOCOL_LEVEL).map_err(|_| Error::ProtocolError)?;
        let connect_flags = if options.clean_session { 0x02 } else { 0x00 };
        body.push(connect_flags).map_err(|_| Error::ProtocolError)?;
        body.extend_from_slice(&options.keep_alive_seconds.to_be_bytes())
            .map_err(|_| Error::ProtocolError)?;
        put_bytes(&mut body, client_id)?;

        send_packet(&mut connection, CONNECT, &body)?;

        let mut connack = [0u8; 4];
        read_exact(&mut connection, &mut connack)?;

        if connack[0] != CONNACK || connack[1] != 2 {
            return Err(Error::ProtocolError);
        }

        match connack[3] {
            0 => {
                log::info!(target: "stationlink::mqtt", "session open as {}", options.client_id);
                Ok(Self {
                    connection,
                    next_packet_id: 1,
                })
            }
            1..=5 => Err(Error::ConnectionRefused),
            _ => Err(Error::ProtocolError),
        }
    }

    /// Send a PUBLISH packet.
    ///
    /// For QoS 1 and 2 a packet identifier is allocated and returned; the
    /// broker's acknowledgement can be collected with [`Client::read_ack`].
    pub fn send(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<Option<u16>, Error> {
        let mut packet: Vec<u8, MAX_PACKET_LEN> = Vec::new();
        put_bytes(&mut packet, topic.as_bytes()).map_err(|_| Error::PayloadTooLarge)?;

        let packet_id = match qos {
            QoS::AtMostOnce => None,
            QoS::AtLeastOnce | QoS::ExactlyOnce => {
                let id = self.allocate_packet_id();
                packet
                    .extend_from_slice(&id.to_be_bytes())
                    .map_err(|_| Error::PayloadTooLarge)?;
                Some(id)
            }
        };

        packet
            .extend_from_slice(payload)
            .map_err(|_| Error::PayloadTooLarge)?;

        let mut header = PUBLISH | ((qos as u8) << 1);
        if retain {
            header |= PUBLISH_RETAIN;
        }
        send_packet(&mut self.connection, header, &packet)?;

        log::debug!(
            target: "stationlink::mqtt",
            "published {} bytes to {} (qos {})",
            payload.len(),
            topic,
            qos as u8
        );
        Ok(packet_id)
    }

    /// Read one PUBACK from the connection and return its packet identifier.
    ///
    /// Returns `Ok(None)` when the connection has nothing to read.
    pub fn read_ack(&mut self) -> Result<Option<u16>, Error> {
        let mut puback = [0u8; 4];
        match self.connection.read(&mut puback[..1]) {
            Ok(0) => return Ok(None),
            Ok(_) => {}
            Err(_) => return Err(Error::ReadError),
        }
        read_exact(&mut self.connection, &mut puback[1..])?;

        if puback[0] != PUBACK || puback[1] != 2 {
            return Err(Error::ProtocolError);
        }
        Ok(Some(u16::from_be_bytes([puback[2], puback[3]])))
    }

    /// Give back the underlying connection.
    pub fn into_inner(self) -> C {
        self.connection
    }

    // Packet identifier 0 is reserved by the protocol.
    fn allocate_packet_id(&mut self) -> u16 {
        let id = self.next_packet_id;
        self.next_packet_id = self.next_packet_id.checked_add(1).unwrap_or(1);
        id
    }
}

impl<C: Connection> Publisher for Client<C> {
    type Error = Error;

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), Self::Error> {
        self.send(topic, payload, qos, retain).map(|_| ())
    }
}

/// Append a length-prefixed byte string.
fn put_bytes<const N: usize>(buf: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), Error> {
    let len = u16::try_from(bytes.len()).map_err(|_| Error::ProtocolError)?;
    buf.extend_from_slice(&len.to_be_bytes())
        .map_err(|_| Error::ProtocolError)?;
    buf.extend_from_slice(bytes).map_err(|_| Error::ProtocolError)
}

fn send_packet<C: Connection>(connection: &mut C, header: u8, body: &[u8]) -> Result<(), Error> {
    let mut fixed_header: Vec<u8, 5> = Vec::new();
    fixed_header.push(header).map_err(|_| Error::ProtocolError)?;
    encode_remaining_length(&mut fixed_header, body.len()).map_err(|_| Error::ProtocolError)?;

    write_all(connection, &fixed_header)?;
    write_all(connection, body)?;
    connection.flush().map_err(|_| Error::WriteError)
}

fn write_all<C: Connection>(connection: &mut C, mut buf: &[u8]) -> Result<(), Error> {
    while !buf.is_empty() {
        match connection.write(buf) {
            Ok(0) => return Err(Error::ConnectionClosed),
            Ok(n) => buf = buf.get(n..).unwrap_or(&[]),
            Err(_) => return Err(Error::WriteError),
        }
    }
    Ok(())
}

fn read_exact<C: Connection>(connection: &mut C, buf: &mut [u8]) -> Result<(), Error> {
    let mut total_read = 0;
    while total_read < buf.len() {
        match connection.read(&mut buf[total_read..]) {
            Ok(0) => return Err(Error::ConnectionClosed),
            Ok(n) => total_read += n,
            Err(_) => return Err(Error::ReadError),
        }
    }
    Ok(())
}

fn encode_remaining_length(buf: &mut Vec<u8, 5>, mut len: usize) -> Result<(), ()> {
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        buf.push(byte).map_err(|_| ())?;
        if len == 0 {
            return Ok(());
        }
    }
}
