//! Lock-free single-producer/single-consumer ring buffer
//!
//! The universal queue primitive of the engine: order submission,
//! arbitrage opportunities and market-maker quotes all travel through
//! one of these. Both ends are wait-free; neither end ever blocks or
//! allocates.
//!
//! Capacity is rounded up to the next power of two and one slot is
//! sacrificed to distinguish full from empty, so a ring built with
//! `new(n)` holds at most `n.next_power_of_two() - 1` items.
//!
//! ## Contract
//!
//! Exactly one thread may call [`RingBuffer::push`] and exactly one
//! thread may call [`RingBuffer::pop`]. The type is `Sync` so both
//! ends can share one `Arc`, but concurrent producers (or consumers)
//! are a caller bug and void the FIFO guarantee.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// Bounded SPSC queue with power-of-two capacity
pub struct RingBuffer<T> {
    /// Next slot to write; owned by the producer
    head: CachePadded<AtomicUsize>,
    /// Next slot to read; owned by the consumer
    tail: CachePadded<AtomicUsize>,
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
}

// Slots are only touched by the unique producer/consumer pair, with
// the head/tail release stores ordering slot data before visibility.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Create a ring with room for `next_pow2(capacity) - 1` items
    ///
    /// `capacity` is clamped to a minimum of 2.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        let buffer = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            buffer,
            mask: capacity - 1,
        }
    }

    /// Producer side: enqueue `item`, or hand it back if the ring is full
    ///
    /// Never blocks. Must only be called from the single producer
    /// thread.
    #[inline]
    pub fn push(&self, item: T) -> Result<(), T> {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) & self.mask;

        if next == self.tail.load(Ordering::Acquire) {
            return Err(item);
        }

        unsafe {
            (*self.buffer[head].get()).write(item);
        }
        self.head.store(next, Ordering::Release);
        Ok(())
    }

    /// Consumer side: dequeue the oldest item, if any
    ///
    /// Never blocks. Must only be called from the single consumer
    /// thread.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);

        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        let item = unsafe { (*self.buffer[tail].get()).assume_init_read() };
        self.tail.store((tail + 1) & self.mask, Ordering::Release);
        Some(item)
    }

    /// Number of items currently queued
    ///
    /// Approximate when called concurrently with push/pop.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail) & self.mask
    }

    /// True when no item is queued
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Slot count (one more than the maximum number of queued items)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}
