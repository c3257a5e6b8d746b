//! RISC-V performance-modeling core.
//!
//! This crate implements the timing side of a RISC-V instruction-set simulator:
//! 1. **Instruction space:** Dense, address-indexed predecoded instruction summaries.
//! 2. **Cache model:** Tag-only set-associative caches with exact LRU replacement
//!    driven by a precomputed permutation state machine.
//! 3. **Performance counters:** A shared-memory region of per-instruction counters,
//!    written by the simulator and mapped read-only by independent viewer processes.
//! 4. **Pipeline model:** Per-instruction cycle accounting with miss penalties and
//!    a bounded in-flight memory queue.
//!
//! The crate contains no instruction semantics and no loader; the embedding
//! simulation driver executes the program and reports each retired instruction
//! to a [`SimContext`].

/// Common types (memory access classification, error taxonomy).
pub mod common;
/// Model configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Predecoded instruction space.
pub mod insn;
/// Set-associative cache simulator with LRU-FSM replacement.
pub mod cache;
/// Shared-memory performance counter store.
pub mod perf;
/// Pipeline cycle accounting and the in-flight memory queue.
pub mod pipeline;
/// Per-hart simulation context (ownership root for caches, counters, pipeline).
pub mod sim;
/// Global statistics summary and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Cache simulator; construct one per named cache instance.
pub use crate::cache::CacheSim;
/// Shared-memory counter store; `create` on the writer side, `open` on readers.
pub use crate::perf::PerfCounters;
/// Per-hart context owning caches, counters, and the pipeline model.
pub use crate::sim::SimContext;
