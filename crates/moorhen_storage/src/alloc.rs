//! Shared id, handle, and sequence allocation.
//!
//! Every snapshot of a world shares one allocator, so records created in
//! concurrent snapshots never collide when their changes are replayed.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use moorhen_foundation::Handle;

/// Allocates opaque ids, player handles, and creation sequence numbers.
#[derive(Debug)]
pub struct IdAllocator {
    rng: Mutex<ChaCha8Rng>,
    next_handle: AtomicU64,
    next_seq: AtomicU64,
}

impl IdAllocator {
    /// Creates an allocator whose ids are reproducible from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            next_handle: AtomicU64::new(0),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Draws a raw 64-bit id.
    ///
    /// Callers check the result against existing records.
    pub fn raw_id(&self) -> u64 {
        self.rng.lock().next_u64()
    }

    /// Returns the next unused handle.
    pub fn next_handle(&self) -> Handle {
        Handle::new(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the next creation sequence number.
    pub fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Ensures handles after `handle` are the only ones handed out.
    pub fn reserve_handle(&self, handle: Handle) {
        self.next_handle
            .fetch_max(handle.number() + 1, Ordering::Relaxed);
    }

    /// Ensures sequence numbers after `seq` are the only ones handed out.
    pub fn reserve_seq(&self, seq: u64) {
        self.next_seq.fetch_max(seq + 1, Ordering::Relaxed);
    }
}
