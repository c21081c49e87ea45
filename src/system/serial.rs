//! Serial transport boundary.
//!
//! The UART driver reports activity as [`UartEvent`] notifications and
//! exposes its receive FIFO through [`SerialTransport`].

/// Notification delivered by the serial driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartEvent {
    /// `n` bytes are waiting in the receive buffer.
    Data(usize),
    /// The hardware FIFO overflowed and bytes were lost.
    FifoOverflow,
    /// The driver's ring buffer is full and bytes were lost.
    BufferFull,
    /// A byte failed its parity check.
    ParityError,
    /// A byte had a framing error.
    FrameError,
    /// Any other driver event, identified by its raw code.
    Other(u32),
}

#[cfg(feature = "defmt")]
impl defmt::Format for UartEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            UartEvent::Data(n) => defmt::write!(f, "Data({})", n),
            UartEvent::FifoOverflow => defmt::write!(f, "FifoOverflow"),
            UartEvent::BufferFull => defmt::write!(f, "BufferFull"),
            UartEvent::ParityError => defmt::write!(f, "ParityError"),
            UartEvent::FrameError => defmt::write!(f, "FrameError"),
            UartEvent::Other(code) => defmt::write!(f, "Other({})", code),
        }
    }
}

/// Byte-level access to the serial driver's receive side.
pub trait SerialTransport {
    /// Associated error type
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes, waiting at most `timeout_ms` for them.
    ///
    /// Returns the number of bytes copied into `buf`.
    fn read_bytes(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Drop everything pending in the receive buffer.
    fn flush_input(&mut self) -> Result<(), Self::Error>;
}
