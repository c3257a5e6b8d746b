//! Error taxonomy for the performance model.
//!
//! Two failure classes exist, and they are deliberately distinguishable:
//! 1. **Configuration errors:** Invalid geometry or an empty address range.
//!    Fatal at construction; the component refuses to initialize.
//! 2. **Resource errors:** Shared-memory creation, sizing, or mapping failures.
//!    Fatal for the attempted operation only — a reader that fails to attach
//!    to a not-yet-created segment may retry later.
//!
//! Hot-path operations (`lookup`, `record`, `retire`) are infallible;
//! out-of-range addresses are caller contract violations checked with
//! `debug_assert!` rather than surfaced as errors.

use std::io;

use thiserror::Error;

/// Top-level error type for the performance-modeling core.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Invalid configuration detected at construction time.
    ///
    /// Covers non-power-of-two cache geometry, unsupported associativity,
    /// and empty or misaligned instruction address ranges.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A shared-memory operation failed.
    ///
    /// `op` names the failing primitive (`shm_open`, `ftruncate`, `mmap`)
    /// and `source` carries the OS error, so callers can distinguish a
    /// missing segment from a mapping failure.
    #[error("shared memory {op} failed for `{name}`: {source}")]
    Shm {
        /// The shared-memory primitive that failed.
        op: &'static str,
        /// Identifier of the affected segment.
        name: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl ModelError {
    /// Builds a [`ModelError::Shm`] from the current `errno`.
    pub(crate) fn shm(op: &'static str, name: &str) -> Self {
        Self::Shm {
            op,
            name: name.to_owned(),
            source: io::Error::last_os_error(),
        }
    }

    /// Returns `true` when the error means the named segment does not exist.
    ///
    /// A viewer attaching before the simulator has created the segment sees
    /// this and may retry; all other resource errors are non-retryable.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Shm { source, .. } => source.kind() == io::ErrorKind::NotFound,
            Self::Config(_) => false,
        }
    }
}
