//! Common types shared across the performance model.
//!
//! This module provides the building blocks used by every component:
//! 1. **Memory Access:** Classification of accesses (Fetch/Read/Write).
//! 2. **Error Handling:** The crate-wide error taxonomy separating
//!    configuration errors from shared-memory resource errors.

/// Memory access type definitions.
pub mod data;

/// Error types for configuration and shared-memory resources.
pub mod error;

pub use data::AccessType;
pub use error::ModelError;
