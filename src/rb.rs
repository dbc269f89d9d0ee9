use core::sync::atomic::{
    fence, AtomicBool, AtomicU8, AtomicUsize,
    Ordering::{Acquire, Relaxed, Release},
};

/// Lock-free single-producer/single-consumer byte ring.
///
/// The producer side runs in interrupt context and never blocks: once the
/// ring is full the oldest unread bytes are overwritten. The consumer notices
/// the lap on its next `pop`, skips ahead to the oldest byte that still
/// exists and adds the skipped bytes to an overrun counter.
///
/// `head` and `tail` are free-running counters. Because `N` is a power of
/// two they stay consistent across `usize` wraparound.
// Push at HEAD, pop at TAIL
pub struct ByteRing<const N: usize> {
    is_split: AtomicBool,
    head: AtomicUsize,
    tail: AtomicUsize,
    overruns: AtomicUsize,
    buf: [AtomicU8; N],
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteRing<N> {
    const POWER_OF_TWO: () = assert!(N.is_power_of_two(), "ByteRing capacity must be a power of two");

    pub const fn new() -> Self {
        let () = Self::POWER_OF_TWO;
        Self {
            is_split: AtomicBool::new(false),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            overruns: AtomicUsize::new(0),
            buf: [const { AtomicU8::new(0) }; N],
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// ## Safety
    /// Must only be called once, as only one Producer and Consumer may
    /// exist per ByteRing.
    pub unsafe fn split(&'static self) -> (Producer<N>, Consumer<N>) {
        self.is_split.store(true, Relaxed);
        (Producer(self), Consumer(self))
    }

    pub fn try_split(&'static self) -> Option<(Producer<N>, Consumer<N>)> {
        if self.is_split.fetch_or(true, Relaxed) {
            None
        } else {
            // SAFETY: We have just checked to ensure that this ByteRing has not
            // been split.
            Some(unsafe { self.split() })
        }
    }

    fn slot(&self, index: usize) -> &AtomicU8 {
        &self.buf[index & (N - 1)]
    }
}

pub struct Producer<const N: usize>(&'static ByteRing<N>);

impl<const N: usize> Producer<N> {
    /// Store one byte. Safe to call from the receive interrupt.
    pub fn push(&self, byte: u8) {
        let head = self.0.head.load(Relaxed);
        self.0.slot(head).store(byte, Relaxed);
        self.0.head.store(head.wrapping_add(1), Release);
    }

    /// Total number of bytes ever pushed (wrapping).
    pub fn received(&self) -> usize {
        self.0.head.load(Relaxed)
    }
}

pub struct Consumer<const N: usize>(&'static ByteRing<N>);

impl<const N: usize> Consumer<N> {
    pub fn pop(&self) -> Option<u8> {
        let ring = self.0;
        let mut tail = ring.tail.load(Relaxed);
        loop {
            let head = ring.head.load(Acquire);
            let pending = head.wrapping_sub(tail);
            if pending == 0 {
                return None;
            }
            if pending > N {
                // Lapped by the producer: everything older than head - N is gone
                ring.overruns.fetch_add(pending - N, Relaxed);
                tail = head.wrapping_sub(N);
            }

            let byte = ring.slot(tail).load(Relaxed);
            fence(Acquire);

            // The interrupt runs to completion, so the slot can only have been
            // rewritten if head has moved past tail + N in the meantime.
            let head = ring.head.load(Acquire);
            if head.wrapping_sub(tail) > N {
                ring.overruns.fetch_add(1, Relaxed);
                tail = tail.wrapping_add(1);
                continue;
            }

            ring.tail.store(tail.wrapping_add(1), Release);
            return Some(byte);
        }
    }

    /// Bytes currently waiting, capped at the capacity.
    pub fn len(&self) -> usize {
        let head = self.0.head.load(Acquire);
        let tail = self.0.tail.load(Relaxed);
        head.wrapping_sub(tail).min(N)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of bytes ever pushed by the producer (wrapping).
    pub fn received(&self) -> usize {
        self.0.head.load(Relaxed)
    }

    /// Bytes overwritten before they could be read.
    pub fn overruns(&self) -> usize {
        self.0.overruns.load(Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_order() {
        static RING: ByteRing<8> = ByteRing::new();
        let (tx, rx) = RING.try_split().unwrap();

        assert_eq!(rx.pop(), None);
        for b in b"$GP" {
            tx.push(*b);
        }
        assert_eq!(rx.len(), 3);
        assert_eq!(rx.pop(), Some(b'$'));
        assert_eq!(rx.pop(), Some(b'G'));
        assert_eq!(rx.pop(), Some(b'P'));
        assert_eq!(rx.pop(), None);
        assert!(rx.is_empty());
        assert_eq!(rx.received(), 3);
        assert_eq!(rx.overruns(), 0);
    }

    #[test]
    fn only_splits_once() {
        static RING: ByteRing<4> = ByteRing::new();
        assert!(RING.try_split().is_some());
        assert!(RING.try_split().is_none());
    }

    #[test]
    fn wraps_around_capacity() {
        static RING: ByteRing<4> = ByteRing::new();
        let (tx, rx) = RING.try_split().unwrap();

        for round in 0..10u8 {
            tx.push(round);
            tx.push(round.wrapping_mul(3));
            assert_eq!(rx.pop(), Some(round));
            assert_eq!(rx.pop(), Some(round.wrapping_mul(3)));
        }
        assert!(rx.is_empty());
        assert_eq!(tx.received(), 20);
        assert_eq!(RING.capacity(), 4);
    }

    #[test]
    fn overwrites_oldest_when_full() {
        static RING: ByteRing<4> = ByteRing::new();
        let (tx, rx) = RING.try_split().unwrap();

        for b in 0..7u8 {
            tx.push(b);
        }
        assert_eq!(rx.len(), 4);
        assert_eq!(rx.pop(), Some(3));
        assert_eq!(rx.pop(), Some(4));
        assert_eq!(rx.pop(), Some(5));
        assert_eq!(rx.pop(), Some(6));
        assert_eq!(rx.pop(), None);
        assert_eq!(rx.overruns(), 3);

        // Back to normal operation afterwards
        tx.push(42);
        assert_eq!(rx.pop(), Some(42));
        assert_eq!(rx.overruns(), 3);
    }

    #[test]
    fn survives_index_wraparound() {
        static RING: ByteRing<4> = ByteRing::new();
        let (tx, rx) = RING.try_split().unwrap();

        let start = usize::MAX - 1;
        RING.head.store(start, Relaxed);
        RING.tail.store(start, Relaxed);

        for b in 10..14u8 {
            tx.push(b);
        }
        assert_eq!(rx.len(), 4);
        for b in 10..14u8 {
            assert_eq!(rx.pop(), Some(b));
        }
        assert_eq!(rx.pop(), None);
    }
}
