//! Driver notification queues.
//!
//! Both supervisory loops in this crate block on a queue of driver events and
//! handle one item at a time in arrival order. [`EventQueue`] is the seam
//! between those loops and whatever the platform uses to deliver events
//! (an RTOS queue, an async channel bridged to a thread, a test fixture).

/// A FIFO source of driver notifications.
pub trait EventQueue<E> {
    /// Block until the next notification arrives.
    ///
    /// Returns `None` only when the source has been shut down; the loops
    /// treat that as the end of their lifetime.
    fn receive(&mut self) -> Option<E>;

    /// Discard every notification that is queued but not yet received.
    fn reset(&mut self);
}

#[cfg(feature = "std")]
impl<E> EventQueue<E> for std::sync::mpsc::Receiver<E> {
    fn receive(&mut self) -> Option<E> {
        self.recv().ok()
    }

    fn reset(&mut self) {
        while self.try_recv().is_ok() {}
    }
}
