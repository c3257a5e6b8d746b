//! Global statistics summary and reporting.
//!
//! This module tracks the whole-run metrics of the pipeline model:
//! 1. **Cycle and instruction totals:** Both monotonically increasing; the
//!    instruction count grows by exactly one per retired instruction,
//!    compressed or not.
//! 2. **Segments:** Batches of retired instructions between periodic status
//!    reports.
//! 3. **Branches:** Count of taken branches, for branch-ratio reporting.

use std::time::{Duration, Instant};

/// Whole-run statistics summary for one hart's pipeline model.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Total simulated cycles.
    pub cycles: u64,
    /// Total retired instructions.
    pub insns: u64,
    /// Completed reporting segments.
    pub segments: u64,
    /// Taken branches retired.
    pub branches_taken: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            insns: 0,
            segments: 0,
            branches_taken: 0,
        }
    }
}

impl SimStats {
    /// Instructions per simulated cycle.
    pub fn ipc(&self) -> f64 {
        let cyc = if self.cycles == 0 { 1 } else { self.cycles };
        self.insns as f64 / cyc as f64
    }

    /// Fraction of retired instructions that were taken branches.
    pub fn branch_ratio(&self) -> f64 {
        let instr = if self.insns == 0 { 1 } else { self.insns };
        self.branches_taken as f64 / instr as f64
    }

    /// Wall-clock time since this summary was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Prints the summary to stdout.
    pub fn print(&self) {
        let seconds = self.elapsed().as_secs_f64();
        let mips = (self.insns as f64 / seconds) / 1_000_000.0;
        println!("\n==========================================================");
        println!("PERFORMANCE MODEL SUMMARY");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_cycles               {}", self.cycles);
        println!("sim_insts                {}", self.insns);
        println!("sim_ipc                  {:.4}", self.ipc());
        println!("segments                 {}", self.segments);
        println!(
            "branches_taken           {} ({:.2}%)",
            self.branches_taken,
            self.branch_ratio() * 100.0
        );
        println!("sim_mips                 {mips:.2}");
        println!("==========================================================");
    }
}
