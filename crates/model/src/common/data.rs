//! Memory Access Types.
//!
//! This module defines the classification of memory accesses used throughout the
//! performance model. These types are used for the following:
//! 1. **Cache Lookup:** Distinguishing writes (which dirty lines and count as
//!    updates) from reads and fetches.
//! 2. **Statistics Tracking:** Categorizing accesses for counter attribution.

/// Type of memory access operation.
///
/// Used to distinguish between instruction fetches, data loads, and data stores
/// when consulting a cache model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Instruction fetch access.
    ///
    /// Occurs when the pipeline model consults the instruction cache for a
    /// retired instruction's address.
    Fetch,

    /// Data read access.
    ///
    /// Occurs for load instructions when the pipeline model consults the
    /// data cache.
    Read,

    /// Data write access.
    ///
    /// Occurs for store instructions. Writes on a writeable cache increment
    /// its update counter and, under a write-back policy, mark the line dirty.
    Write,
}

impl AccessType {
    /// Returns `true` for store accesses.
    #[inline]
    pub fn is_write(self) -> bool {
        self == Self::Write
    }
}
