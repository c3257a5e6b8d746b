//! # Unit Tests
//!
//! Fine-grained tests for the individual components of the performance model.




/// Shared-memory counter store tests (writer/reader round trips).
pub mod perf_counters;
