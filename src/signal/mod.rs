//! Process-wide readiness flags.
//!
//! A [`ReadinessSignal`] is a small set of named bits that independent tasks
//! raise and lower to tell each other about connectivity and about commands
//! received over the serial line. Each bit is set and cleared atomically, so
//! the connection manager and the command interpreter can share one instance
//! by reference without further locking.
//!
//! ```rust
//! use stationlink::signal::{Bit, EventGroup, ReadinessSignal};
//!
//! static FLAGS: EventGroup = EventGroup::new();
//!
//! FLAGS.set(Bit::LinkUp);
//! assert!(FLAGS.is_set(Bit::LinkUp));
//! assert!(!FLAGS.is_set(Bit::AddressReady));
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

/// Named readiness bits shared between subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bit {
    /// The station is associated with the access point.
    LinkUp,
    /// The network layer has assigned an address.
    AddressReady,
    /// A player registration was requested over the serial line.
    RegistrationRequested,
    /// A certificate signing request was requested over the serial line.
    CertificateRequested,
    /// A game start was requested over the serial line.
    GameStartRequested,
}

impl Bit {
    /// Every bit, in mask order.
    pub const ALL: [Bit; 5] = [
        Bit::LinkUp,
        Bit::AddressReady,
        Bit::RegistrationRequested,
        Bit::CertificateRequested,
        Bit::GameStartRequested,
    ];

    /// The bit's position inside an [`EventGroup`] word.
    pub const fn mask(self) -> u32 {
        match self {
            Bit::LinkUp => 1 << 0,
            Bit::AddressReady => 1 << 1,
            Bit::RegistrationRequested => 1 << 3,
            Bit::CertificateRequested => 1 << 4,
            Bit::GameStartRequested => 1 << 5,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Bit {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Bit::LinkUp => defmt::write!(f, "LinkUp"),
            Bit::AddressReady => defmt::write!(f, "AddressReady"),
            Bit::RegistrationRequested => defmt::write!(f, "RegistrationRequested"),
            Bit::CertificateRequested => defmt::write!(f, "CertificateRequested"),
            Bit::GameStartRequested => defmt::write!(f, "GameStartRequested"),
        }
    }
}

/// A set of independently settable readiness bits.
///
/// Implementations must make `set` and `clear` atomic per bit; callers on
/// different tasks may race on different bits.
pub trait ReadinessSignal {
    /// Raise a bit.
    fn set(&self, bit: Bit);
    /// Lower a bit.
    fn clear(&self, bit: Bit);
    /// Whether a bit is currently raised.
    fn is_set(&self, bit: Bit) -> bool;
}

impl<T: ReadinessSignal + ?Sized> ReadinessSignal for &T {
    fn set(&self, bit: Bit) {
        (**self).set(bit)
    }

    fn clear(&self, bit: Bit) {
        (**self).clear(bit)
    }

    fn is_set(&self, bit: Bit) -> bool {
        (**self).is_set(bit)
    }
}

/// Lock-free [`ReadinessSignal`] backed by a single atomic word.
///
/// `const`-constructible so it can live in a `static` and be handed to every
/// task as `&'static EventGroup`.
#[derive(Debug, Default)]
pub struct EventGroup {
    bits: AtomicU32,
}

impl EventGroup {
    /// Create a group with every bit lowered.
    pub const fn new() -> Self {
        Self {
            bits: AtomicU32::new(0),
        }
    }

    /// Snapshot of the raw word.
    pub fn bits(&self) -> u32 {
        self.bits.load(Ordering::Acquire)
    }
}

impl ReadinessSignal for EventGroup {
    fn set(&self, bit: Bit) {
        self.bits.fetch_or(bit.mask(), Ordering::AcqRel);
    }

    fn clear(&self, bit: Bit) {
        self.bits.fetch_and(!bit.mask(), Ordering::AcqRel);
    }

    fn is_set(&self, bit: Bit) -> bool {
        self.bits.load(Ordering::Acquire) & bit.mask() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_are_distinct() {
        let mut seen = 0u32;
        for bit in Bit::ALL {
            assert_eq!(seen & bit.mask(), 0);
            seen |= bit.mask();
        }
    }

    #[test]
    fn clear_leaves_other_bits_alone() {
        let group = EventGroup::new();
        group.set(Bit::LinkUp);
        group.set(Bit::RegistrationRequested);
        group.clear(Bit::LinkUp);

        assert!(!group.is_set(Bit::LinkUp));
        assert!(group.is_set(Bit::RegistrationRequested));
        assert_eq!(group.bits(), Bit::RegistrationRequested.mask());
    }

    #[test]
    fn works_through_a_reference() {
        let group = EventGroup::new();
        let shared = &group;
        shared.set(Bit::AddressReady);
        assert!(group.is_set(Bit::AddressReady));
    }
}
