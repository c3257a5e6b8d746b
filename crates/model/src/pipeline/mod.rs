//! Pipeline cycle accounting.
//!
//! Per-retired-instruction timing model. For each instruction the driver
//! reports, the model:
//! 1. **Fetch:** Consults the instruction cache; a miss charges the fetch
//!    penalty.
//! 2. **Execute/Memory:** For instructions with a data operand, consults the
//!    data cache; a miss either charges the penalty directly (fast strategy)
//!    or flows through the bounded in-flight queue (slow strategy), which
//!    models overlapped miss latency with backpressure.
//! 3. **Retire:** Charges one base cycle plus accrued penalties, bumps the
//!    statistics summary, and accumulates the per-instruction counters.
//! 4. **Report:** Every `report_every` retired instructions, emits a status
//!    snapshot — an observability hook, not a state transition.
//!
//! Fast and slow strategies consult the same caches identically, so they
//! produce identical instruction counts and hit/miss classifications; only
//! cycle precision differs.

mod queue;

use tracing::info;

use crate::cache::CacheSim;
use crate::common::AccessType;
use crate::config::{PipeStrategy, PipelineConfig};
use crate::perf::PerfCounters;
use crate::stats::SimStats;
use queue::MemQueue;

/// A retired instruction's data memory operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemAccess {
    /// Effective address of the load or store.
    pub addr: u64,
    /// `Read` for loads, `Write` for stores.
    pub access: AccessType,
}

impl MemAccess {
    /// A load operand.
    pub fn read(addr: u64) -> Self {
        Self {
            addr,
            access: AccessType::Read,
        }
    }

    /// A store operand.
    pub fn write(addr: u64) -> Self {
        Self {
            addr,
            access: AccessType::Write,
        }
    }
}

/// Per-instruction cycle-accounting model.
///
/// Owns the in-flight memory queue and the statistics summary; borrows the
/// caches and counter store from the owning context on each call, keeping
/// ownership explicit rather than ambient.
#[derive(Debug)]
pub struct PipelineModel {
    strategy: PipeStrategy,
    queue: MemQueue,
    report_every: u64,
    next_report: u64,
    stats: SimStats,
}

impl PipelineModel {
    /// Creates the model from validated pipeline configuration.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            strategy: config.strategy,
            queue: MemQueue::new(config.queue_depth),
            report_every: config.report_every,
            next_report: config.report_every,
            stats: SimStats::default(),
        }
    }

    /// Accounts one retired instruction and returns the cycles charged.
    ///
    /// `pc` is the instruction's address, `mem` its data operand if it has
    /// one, and `taken_branch` whether it retired as a taken branch. Exactly
    /// one instruction is counted per call, compressed or standard encoding
    /// alike.
    pub fn retire(
        &mut self,
        pc: u64,
        mem: Option<MemAccess>,
        taken_branch: bool,
        icache: &mut CacheSim,
        dcache: &mut CacheSim,
        perf: Option<&mut PerfCounters>,
    ) -> u64 {
        let mut cycles = 1u64;

        let fetch = icache.lookup(pc, AccessType::Fetch);
        if fetch.missed {
            cycles += icache.miss_penalty();
        }

        let mut data_missed = false;
        if let Some(op) = mem {
            let data = dcache.lookup(op.addr, op.access);
            data_missed = data.missed;
            if data.missed {
                match self.strategy {
                    PipeStrategy::Fast => cycles += dcache.miss_penalty(),
                    PipeStrategy::Slow => {
                        let now = self.stats.cycles + cycles;
                        cycles += self.queue.issue(now, dcache.miss_penalty());
                        if data.writeback.is_some() {
                            // Deferred write-back of the dirty victim.
                            cycles += dcache.miss_penalty();
                        }
                    }
                }
            }
        }

        self.stats.insns += 1;
        if taken_branch {
            self.stats.branches_taken += 1;
        }
        self.stats.cycles += cycles;

        if let Some(perf) = perf {
            perf.record(pc, cycles, fetch.missed, data_missed);
        }

        if self.stats.insns >= self.next_report {
            self.stats.segments += 1;
            self.next_report += self.report_every;
            self.status_report();
        }

        cycles
    }

    /// Emits the periodic status snapshot.
    pub fn status_report(&self) {
        info!(
            segment = self.stats.segments,
            cycles = self.stats.cycles,
            insns = self.stats.insns,
            ipc = format_args!("{:.4}", self.stats.ipc()),
            branch_ratio = format_args!("{:.4}", self.stats.branch_ratio()),
            elapsed_s = format_args!("{:.3}", self.stats.elapsed().as_secs_f64()),
            "status"
        );
    }

    /// Whole-run statistics summary.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Outstanding entries in the in-flight memory queue.
    pub fn inflight(&self) -> usize {
        self.queue.len()
    }

    /// Drops any outstanding memory requests (e.g. around a cache flush).
    pub fn drain_queue(&mut self) {
        self.queue.clear();
    }
}
