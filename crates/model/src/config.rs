//! Configuration system for the performance model.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the model. It provides:
//! 1. **Defaults:** Baseline geometry constants (cache shape, penalties, queue depth).
//! 2. **Structures:** Hierarchical config for the instruction cache, data cache,
//!    pipeline model, and counter store.
//! 3. **Enums:** Write policy and pipeline strategy variants, selected at
//!    construction time rather than through per-access flags.
//!
//! Configuration is supplied as JSON (see [`Config::from_json`]) or built in
//! code from `Config::default()`.

use serde::Deserialize;

use crate::common::ModelError;

/// Default configuration constants for the performance model.
///
/// These values define the baseline cache and pipeline shape when not
/// explicitly overridden.
mod defaults {
    /// Default cache line size in bytes.
    ///
    /// Matches typical modern processor cache line sizes.
    pub const LINE_BYTES: usize = 64;

    /// Default number of cache rows (sets).
    pub const ROWS: usize = 64;

    /// Default cache associativity (number of ways).
    pub const WAYS: usize = 4;

    /// Default miss penalty in cycles (line refill from the next level).
    pub const MISS_PENALTY: u64 = 25;

    /// Default capacity of the in-flight memory access queue.
    ///
    /// Bounds how many outstanding data-cache misses may overlap before
    /// backpressure stalls the pipeline.
    pub const QUEUE_DEPTH: usize = 8;

    /// Default number of retired instructions per reporting segment.
    pub const REPORT_EVERY: u64 = 10_000_000;
}

/// Highest supported cache associativity.
///
/// The LRU transition table enumerates all `ways!` recency permutations,
/// so the table size grows factorially; 8 ways (40320 states) is the
/// practical ceiling.
pub const MAX_WAYS: usize = 8;

/// Data cache write handling, fixed per cache instance at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Every store is immediately counted as an update; no dirty state is
    /// buffered and evictions never surface a write-back.
    #[default]
    WriteThrough,
    /// Stores mark the line dirty; evicting a dirty line surfaces the
    /// victim's address so the deferred write-back cost can be charged.
    WriteBack,
}

/// Pipeline cycle-accounting strategy, fixed at construction.
///
/// Both strategies consult the same caches identically and therefore produce
/// identical instruction counts and hit/miss classifications; they differ
/// only in cycle-accounting precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipeStrategy {
    /// Charge cache miss penalties directly, skipping the memory queue.
    Fast,
    /// Fully model the bounded in-flight memory queue and write-back
    /// eviction charges.
    #[default]
    Slow,
}

/// Geometry and policy of one cache instance.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheGeometry {
    /// Associativity (number of ways); `1..=MAX_WAYS`.
    #[serde(default = "CacheGeometry::default_ways")]
    pub ways: usize,

    /// Cache line size in bytes; must be a power of two.
    #[serde(default = "CacheGeometry::default_line")]
    pub line_bytes: usize,

    /// Number of rows (sets); must be a power of two.
    #[serde(default = "CacheGeometry::default_rows")]
    pub rows: usize,

    /// Cycles to refill a line on a miss.
    #[serde(default = "CacheGeometry::default_penalty")]
    pub miss_penalty: u64,

    /// Whether stores are tracked (update counter, dirty state).
    #[serde(default)]
    pub writeable: bool,

    /// Write handling for writeable caches.
    #[serde(default)]
    pub write_policy: WritePolicy,
}

impl CacheGeometry {
    fn default_ways() -> usize {
        defaults::WAYS
    }

    fn default_line() -> usize {
        defaults::LINE_BYTES
    }

    fn default_rows() -> usize {
        defaults::ROWS
    }

    fn default_penalty() -> u64 {
        defaults::MISS_PENALTY
    }

    /// Validates the geometry, naming the offending field on failure.
    pub fn validate(&self, name: &str) -> Result<(), ModelError> {
        if self.ways == 0 || self.ways > MAX_WAYS {
            return Err(ModelError::Config(format!(
                "{name}: ways must be in 1..={MAX_WAYS}, got {}",
                self.ways
            )));
        }
        if !self.line_bytes.is_power_of_two() {
            return Err(ModelError::Config(format!(
                "{name}: line_bytes must be a power of two, got {}",
                self.line_bytes
            )));
        }
        if !self.rows.is_power_of_two() {
            return Err(ModelError::Config(format!(
                "{name}: rows must be a power of two, got {}",
                self.rows
            )));
        }
        if self.write_policy == WritePolicy::WriteBack && !self.writeable {
            return Err(ModelError::Config(format!(
                "{name}: write_back requires a writeable cache"
            )));
        }
        Ok(())
    }
}

impl Default for CacheGeometry {
    fn default() -> Self {
        Self {
            ways: defaults::WAYS,
            line_bytes: defaults::LINE_BYTES,
            rows: defaults::ROWS,
            miss_penalty: defaults::MISS_PENALTY,
            writeable: false,
            write_policy: WritePolicy::WriteThrough,
        }
    }
}

/// Pipeline model configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Cycle-accounting strategy.
    #[serde(default)]
    pub strategy: PipeStrategy,

    /// Capacity of the in-flight memory queue; must be at least 1.
    #[serde(default = "PipelineConfig::default_queue_depth")]
    pub queue_depth: usize,

    /// Retired instructions per reporting segment; must be at least 1.
    #[serde(default = "PipelineConfig::default_report_every")]
    pub report_every: u64,
}

impl PipelineConfig {
    fn default_queue_depth() -> usize {
        defaults::QUEUE_DEPTH
    }

    fn default_report_every() -> u64 {
        defaults::REPORT_EVERY
    }

    /// Validates the pipeline parameters.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.queue_depth == 0 {
            return Err(ModelError::Config(
                "pipeline: queue_depth must be at least 1".to_owned(),
            ));
        }
        if self.report_every == 0 {
            return Err(ModelError::Config(
                "pipeline: report_every must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategy: PipeStrategy::default(),
            queue_depth: defaults::QUEUE_DEPTH,
            report_every: defaults::REPORT_EVERY,
        }
    }
}

/// Counter store configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerfConfig {
    /// Shared-memory segment identifier for the counter store.
    ///
    /// When absent, no counter store is created and per-instruction counters
    /// are not collected. Per-hart contexts append `.<hart>` to this name.
    #[serde(default)]
    pub shm_name: Option<String>,
}

/// Root configuration for the performance model.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Instruction cache geometry.
    #[serde(default)]
    pub icache: CacheGeometry,

    /// Data cache geometry.
    ///
    /// The default is read-only like the instruction cache; a realistic data
    /// cache sets `writeable` and usually `write_policy = "write_back"`.
    #[serde(default = "Config::default_dcache")]
    pub dcache: CacheGeometry,

    /// Pipeline model parameters.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Counter store parameters.
    #[serde(default)]
    pub perf: PerfConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            icache: CacheGeometry::default(),
            dcache: Self::default_dcache(),
            pipeline: PipelineConfig::default(),
            perf: PerfConfig::default(),
        }
    }
}

impl Config {
    fn default_dcache() -> CacheGeometry {
        CacheGeometry {
            writeable: true,
            write_policy: WritePolicy::WriteBack,
            ..CacheGeometry::default()
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] when the JSON is malformed or a field
    /// fails validation.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ModelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section, surfacing the first offending field.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] naming the invalid field.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.icache.validate("icache")?;
        self.dcache.validate("dcache")?;
        self.pipeline.validate()
    }
}
