//! Per-hart simulation context.
//!
//! Owns one hart's instruction cache, data cache, pipeline model, and
//! (optionally) the writer side of the shared counter store, and passes them
//! explicitly to the pipeline on every retired instruction. There is no
//! process-wide model state: multi-hart simulation is a collection of
//! contexts owned by the embedding driver, one per hart.

use crate::cache::CacheSim;
use crate::common::ModelError;
use crate::config::Config;
use crate::insn::InsnSpace;
use crate::perf::PerfCounters;
use crate::pipeline::{MemAccess, PipelineModel};
use crate::stats::SimStats;

/// One hart's performance-model state.
#[derive(Debug)]
pub struct SimContext {
    hart: usize,
    icache: CacheSim,
    dcache: CacheSim,
    pipeline: PipelineModel,
    perf: Option<PerfCounters>,
}

impl SimContext {
    /// Builds the context for `hart` from a validated configuration.
    ///
    /// When `config.perf.shm_name` is set, creates the writer-side counter
    /// store covering `space`, under the segment name `<shm_name>.<hart>` so
    /// each hart owns a private segment.
    ///
    /// # Errors
    ///
    /// Propagates configuration errors from cache construction and resource
    /// errors from counter-store creation.
    pub fn new(hart: usize, config: &Config, space: &InsnSpace) -> Result<Self, ModelError> {
        config.validate()?;
        let icache = CacheSim::new("icache", &config.icache)?;
        let dcache = CacheSim::new("dcache", &config.dcache)?;
        let perf = match &config.perf.shm_name {
            Some(name) => Some(PerfCounters::create(&format!("{name}.{hart}"), space)?),
            None => None,
        };

        Ok(Self {
            hart,
            icache,
            dcache,
            pipeline: PipelineModel::new(&config.pipeline),
            perf,
        })
    }

    /// Accounts one retired instruction; returns the cycles charged.
    ///
    /// See [`PipelineModel::retire`] for the accounting contract. The caller
    /// guarantees `pc` lies inside the instruction space handed to
    /// [`SimContext::new`].
    pub fn retire(&mut self, pc: u64, mem: Option<MemAccess>, taken_branch: bool) -> u64 {
        self.pipeline.retire(
            pc,
            mem,
            taken_branch,
            &mut self.icache,
            &mut self.dcache,
            self.perf.as_mut(),
        )
    }

    /// Hart index of this context.
    pub fn hart(&self) -> usize {
        self.hart
    }

    /// Whole-run statistics summary.
    pub fn stats(&self) -> &SimStats {
        self.pipeline.stats()
    }

    /// The instruction cache model.
    pub fn icache(&self) -> &CacheSim {
        &self.icache
    }

    /// The data cache model.
    pub fn dcache(&self) -> &CacheSim {
        &self.dcache
    }

    /// The counter store, when one was configured.
    pub fn perf(&self) -> Option<&PerfCounters> {
        self.perf.as_ref()
    }

    /// Flushes both caches and drains the in-flight queue.
    ///
    /// Cumulative cache counters are unaffected; subsequent accesses to
    /// previously cached lines miss again.
    pub fn flush_caches(&mut self) {
        self.icache.flush();
        self.dcache.flush();
        self.pipeline.drain_queue();
    }

    /// Emits a status snapshot immediately, outside the periodic schedule.
    pub fn status_report(&self) {
        self.pipeline.status_report();
    }
}
