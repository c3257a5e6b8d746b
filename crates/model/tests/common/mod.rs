//! Shared test infrastructure.

use std::collections::{HashMap, VecDeque};

use rvperf_core::config::{CacheGeometry, WritePolicy};

/// Installs a fmt tracing subscriber once, honoring `RUST_LOG`.
///
/// Safe to call from every test; repeat installs are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A read-only cache geometry with the given shape and a 25-cycle penalty.
pub fn geometry(ways: usize, line_bytes: usize, rows: usize) -> CacheGeometry {
    CacheGeometry {
        ways,
        line_bytes,
        rows,
        miss_penalty: 25,
        writeable: false,
        write_policy: WritePolicy::WriteThrough,
    }
}

/// A writeable variant of [`geometry`] with the given write policy.
pub fn writeable_geometry(
    ways: usize,
    line_bytes: usize,
    rows: usize,
    policy: WritePolicy,
) -> CacheGeometry {
    CacheGeometry {
        writeable: true,
        write_policy: policy,
        ..geometry(ways, line_bytes, rows)
    }
}

/// Reference LRU cache model: an explicit recency list per row.
///
/// Deliberately naive — the FSM-driven simulator must agree with it
/// hit-for-hit on any address stream.
pub struct ReferenceLru {
    ways: usize,
    row_mask: u64,
    lg_line: u32,
    rows: HashMap<u64, VecDeque<u64>>,
}

impl ReferenceLru {
    /// Builds the reference model for the same geometry as the simulator.
    pub fn new(ways: usize, line_bytes: usize, rows: usize) -> Self {
        Self {
            ways,
            row_mask: rows as u64 - 1,
            lg_line: line_bytes.trailing_zeros(),
            rows: HashMap::new(),
        }
    }

    /// Returns `true` when the access missed.
    pub fn lookup(&mut self, addr: u64) -> bool {
        let tag = addr >> self.lg_line;
        let row = (tag >> self.lg_line) & self.row_mask;
        let set = self.rows.entry(row).or_default();

        if let Some(pos) = set.iter().position(|&t| t == tag) {
            let _ = set.remove(pos);
            set.push_front(tag);
            false
        } else {
            if set.len() == self.ways {
                let _ = set.pop_back();
            }
            set.push_front(tag);
            true
        }
    }
}

/// Tiny deterministic pseudo-random stream for reproducible address traces.
pub struct Lcg(pub u64);

impl Lcg {
    /// Next raw value.
    pub fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 16
    }
}
