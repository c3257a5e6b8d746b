//! Set-Associative Cache Simulator.
//!
//! This module implements a tag-only set-associative cache model with exact
//! least-recently-used replacement. No data is stored; a lookup classifies an
//! access as hit or miss, updates the row's recency state through the
//! precomputed LRU transition table, and reports dirty evictions for
//! write-back caches. It provides:
//! 1. **Lookup:** Hit/miss classification with O(ways) tag scan per access.
//! 2. **Replacement:** Exact LRU via the permutation FSM in [`fsm`] — no
//!    per-access list manipulation.
//! 3. **Counters:** References, misses, updates, and evictions, cumulative
//!    across [`CacheSim::flush`].

mod fsm;

use tracing::debug;

use crate::common::{AccessType, ModelError};
use crate::config::{CacheGeometry, WritePolicy};
use fsm::LruFsm;

/// Outcome of one cache lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lookup {
    /// True when the access missed.
    pub missed: bool,
    /// Line address of a dirty victim evicted by this access, if any.
    ///
    /// Only ever `Some` for a write-back cache; the caller charges the
    /// deferred write-back cost.
    pub writeback: Option<u64>,
}

/// Tag-only set-associative cache model with exact LRU replacement.
///
/// Constructed once per named cache instance with fixed geometry; mutated on
/// every [`lookup`](Self::lookup); never resized.
///
/// Each way/row slot carries an explicit valid bit, so address 0 is an
/// ordinary tag with no sentinel role.
#[derive(Debug)]
pub struct CacheSim {
    name: String,
    fsm: LruFsm,
    lg_line: u32,
    row_mask: u64,
    rows: usize,
    ways: usize,
    miss_penalty: u64,
    writeable: bool,
    write_policy: WritePolicy,
    /// Tag array, indexed `way * rows + row`.
    tags: Vec<u64>,
    valid: Vec<bool>,
    dirty: Vec<bool>,
    /// Per-row LRU state, all initially state 0.
    states: Vec<u16>,
    refs: u64,
    misses: u64,
    updates: u64,
    evictions: u64,
}

impl CacheSim {
    /// Creates a cache model with the given geometry.
    ///
    /// Builds the LRU transition table (all `ways!` recency permutations) and
    /// allocates the `ways × rows` tag array and the per-row state vector.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] for a non-power-of-two line size or row
    /// count, unsupported associativity, or a write-back policy on a
    /// non-writeable cache.
    pub fn new(name: &str, geometry: &CacheGeometry) -> Result<Self, ModelError> {
        geometry.validate(name)?;
        let fsm = LruFsm::build(geometry.ways)?;

        let slots = geometry.ways * geometry.rows;
        debug!(
            name,
            ways = geometry.ways,
            line_bytes = geometry.line_bytes,
            rows = geometry.rows,
            states = fsm.states(),
            "cache model constructed"
        );

        Ok(Self {
            name: name.to_owned(),
            fsm,
            lg_line: geometry.line_bytes.trailing_zeros(),
            row_mask: geometry.rows as u64 - 1,
            rows: geometry.rows,
            ways: geometry.ways,
            miss_penalty: geometry.miss_penalty,
            writeable: geometry.writeable,
            write_policy: geometry.write_policy,
            tags: vec![0; slots],
            valid: vec![false; slots],
            dirty: vec![false; slots],
            states: vec![0; geometry.rows],
            refs: 0,
            misses: 0,
            updates: 0,
            evictions: 0,
        })
    }

    /// Classifies one access and updates replacement state.
    ///
    /// The tag is the address above the line offset (index bits included, as
    /// they are harmless in a per-row comparison); the row index mask is
    /// `rows - 1` shifted above the line bits of that tag, so a run of
    /// consecutive lines shares a row until the run crosses a
    /// `line_bytes * line_bytes` boundary. The current state's hit entries
    /// are scanned in recency order; on exhaustion the entry-0 victim — the
    /// least-recently-used way for this state, by construction of the
    /// table — is overwritten.
    ///
    /// Out-of-range addresses are a caller contract violation; `lookup`
    /// itself never fails.
    pub fn lookup(&mut self, addr: u64, access: AccessType) -> Lookup {
        self.refs += 1;
        let tag = addr >> self.lg_line;
        let row = ((tag >> self.lg_line) & self.row_mask) as usize;
        let block = self.fsm.block(self.states[row]);
        let write = access.is_write();

        for entry in &block[1..] {
            let slot = entry.way as usize * self.rows + row;
            if self.valid[slot] && self.tags[slot] == tag {
                self.states[row] = entry.next;
                self.touch_write(slot, write);
                return Lookup {
                    missed: false,
                    writeback: None,
                };
            }
        }

        self.misses += 1;
        let insert = block[0];
        let slot = insert.way as usize * self.rows + row;
        let mut writeback = None;
        if self.valid[slot] && self.dirty[slot] {
            self.evictions += 1;
            writeback = Some(self.tags[slot] << self.lg_line);
            self.dirty[slot] = false;
        }
        self.tags[slot] = tag;
        self.valid[slot] = true;
        self.states[row] = insert.next;
        self.touch_write(slot, write);

        Lookup {
            missed: true,
            writeback,
        }
    }

    fn touch_write(&mut self, slot: usize, write: bool) {
        if write && self.writeable {
            self.updates += 1;
            if self.write_policy == WritePolicy::WriteBack {
                self.dirty[slot] = true;
            }
        }
    }

    /// Invalidates every line and resets every row to the initial recency
    /// state. Cumulative counters are unaffected.
    pub fn flush(&mut self) {
        self.valid.fill(false);
        self.dirty.fill(false);
        self.states.fill(0);
    }

    /// Cache instance name (for reporting).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cycles charged to refill a line on a miss.
    #[inline]
    pub fn miss_penalty(&self) -> u64 {
        self.miss_penalty
    }

    /// Total lookups.
    pub fn refs(&self) -> u64 {
        self.refs
    }

    /// Total misses.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Total hits (`refs - misses`).
    pub fn hits(&self) -> u64 {
        self.refs - self.misses
    }

    /// Total writes observed by a writeable cache.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Total dirty-line evictions (write-back caches only).
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// One-line human-readable summary in the style of the statistics report.
    pub fn summary(&self) -> String {
        let ratio = if self.refs == 0 {
            0.0
        } else {
            self.misses as f64 / self.refs as f64 * 100.0
        };
        format!(
            "{}: {}B lines, {} rows, {} ways | refs {} | misses {} ({ratio:.2}%) | updates {} | evictions {}",
            self.name,
            1u64 << self.lg_line,
            self.rows,
            self.ways,
            self.refs,
            self.misses,
            self.updates,
            self.evictions,
        )
    }
}
