//! Single-writer versioned snapshot cell (sequence lock)
//!
//! Publishes a `Copy` record from one writer thread to any number of
//! reader threads without locking. The writer bumps the version to an
//! odd value, overwrites the record, then bumps to the next even
//! value; readers retry while the version is odd or changed under
//! them. Market and inventory snapshots, and per-slot price feeds,
//! all publish through this cell.

use std::cell::UnsafeCell;
use std::hint;
use std::sync::atomic::{AtomicU64, Ordering};

/// Seqlock-published value
///
/// ## Contract
///
/// Exactly one thread may call [`Versioned::write`]; reads are safe
/// from any thread. A second concurrent writer is a caller bug.
pub struct Versioned<T> {
    version: AtomicU64,
    data: UnsafeCell<T>,
}

unsafe impl<T: Copy + Send> Send for Versioned<T> {}
unsafe impl<T: Copy + Send> Sync for Versioned<T> {}

impl<T: Copy> Versioned<T> {
    pub const fn new(value: T) -> Self {
        Self {
            version: AtomicU64::new(0),
            data: UnsafeCell::new(value),
        }
    }

    /// Publish a new value (single writer only)
    #[inline]
    pub fn write(&self, value: T) {
        let v = self.version.load(Ordering::Relaxed);
        // Odd = write in progress
        self.version.store(v.wrapping_add(1), Ordering::Release);
        unsafe {
            std::ptr::write_volatile(self.data.get(), value);
        }
        self.version.store(v.wrapping_add(2), Ordering::Release);
    }

    /// Read a coherent copy of the current value
    ///
    /// Spins while a write is in flight; with a single writer the
    /// retry window is two stores wide, so this is effectively
    /// wait-free.
    #[inline]
    pub fn read(&self) -> T {
        loop {
            let before = self.version.load(Ordering::Acquire);
            if before & 1 == 0 {
                let value = unsafe { std::ptr::read_volatile(self.data.get()) };
                if self.version.load(Ordering::Acquire) == before {
                    return value;
                }
            }
            hint::spin_loop();
        }
    }

    /// Number of completed writes since construction
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire) >> 1
    }
}

impl<T: Copy + Default> Default for Versioned<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
