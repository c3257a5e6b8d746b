//! Bounded queue of in-flight memory accesses.
//!
//! Models overlap between consecutive data-cache misses: a miss issues a
//! request and retires it later, without stalling the whole pipeline on every
//! miss. Capacity is fixed at construction; when the queue is full, the
//! oldest entry's remaining latency is charged as a stall before the new
//! access can issue (backpressure). This is a scheduling policy, not an
//! error path.

use std::collections::VecDeque;

/// Fixed-capacity in-flight memory access queue.
///
/// Each outstanding request is represented by the cycle at which its refill
/// completes; entries are ordered by issue time and therefore by readiness.
#[derive(Debug)]
pub(crate) struct MemQueue {
    ready_at: VecDeque<u64>,
    capacity: usize,
}

impl MemQueue {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "memory queue needs capacity");
        Self {
            ready_at: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Issues a miss at cycle `now` with the given refill latency.
    ///
    /// Returns the stall cycles charged before the request could issue:
    /// zero while the queue has room, otherwise the remaining latency of the
    /// oldest outstanding request.
    pub fn issue(&mut self, now: u64, latency: u64) -> u64 {
        // Requests already satisfied by `now` retire for free.
        while let Some(&front) = self.ready_at.front() {
            if front > now {
                break;
            }
            let _ = self.ready_at.pop_front();
        }

        let mut stall = 0;
        if self.ready_at.len() == self.capacity {
            if let Some(oldest) = self.ready_at.pop_front() {
                stall = oldest.saturating_sub(now);
            }
        }

        self.ready_at.push_back(now + stall + latency);
        stall
    }

    /// Outstanding request count.
    pub fn len(&self) -> usize {
        self.ready_at.len()
    }

    /// Drops all outstanding requests.
    pub fn clear(&mut self) {
        self.ready_at.clear();
    }
}
