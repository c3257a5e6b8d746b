//! Shared-Memory Counter Store Unit Tests.
//!
//! Verifies the writer/reader round trip through a real POSIX shared-memory
//! segment, the slot addressing contract, predecoded summaries, and the
//! error taxonomy for missing segments and bad identifiers.
//!
//! Segment names embed the process id so parallel test runs cannot collide.

use rvperf_core::PerfCounters;
use rvperf_core::insn::{InsnSpace, OpClass};

use crate::common::init_tracing;

/// A unique segment name per test case.
fn segment_name(case: &str) -> String {
    format!("/rvperf-test-{}-{case}", std::process::id())
}

/// A small instruction space: addi, lw, sw, beq — 16 bytes at 0x1000.
fn test_space() -> InsnSpace {
    let mut code = Vec::new();
    code.extend_from_slice(&0x0015_0513u32.to_le_bytes()); // addi
    code.extend_from_slice(&0x0005_2503u32.to_le_bytes()); // lw
    code.extend_from_slice(&0x00A1_2023u32.to_le_bytes()); // sw
    code.extend_from_slice(&0x0000_0063u32.to_le_bytes()); // beq
    InsnSpace::new(0x1000, &code).unwrap()
}

// ══════════════════════════════════════════════════════════
// 1. Writer Side
// ══════════════════════════════════════════════════════════

/// Creation zero-fills the counters and predecodes every slot.
#[test]
fn create_predecodes_and_zeroes() {
    init_tracing();
    let space = test_space();
    let perf = PerfCounters::create(&segment_name("create"), &space).unwrap();

    assert!(perf.is_writer());
    assert_eq!(perf.base(), 0x1000);
    assert_eq!(perf.bound(), 0x1010);
    assert_eq!(perf.len(), 8);

    assert_eq!(perf.executed_at(0x1000), 0);
    assert_eq!(perf.cycles_at(0x1000), 0);
    assert_eq!(perf.insn_at(0x1000).class, OpClass::Alu);
    assert_eq!(perf.insn_at(0x1004).class, OpClass::Load);
    assert_eq!(perf.insn_at(0x1008).class, OpClass::Store);
    assert_eq!(perf.insn_at(0x100C).class, OpClass::Branch);
}

/// `record` accumulates all four counters independently.
#[test]
fn record_accumulates() {
    let space = test_space();
    let mut perf = PerfCounters::create(&segment_name("record"), &space).unwrap();

    perf.record(0x1004, 26, true, false);
    perf.record(0x1004, 1, false, true);
    perf.record(0x1004, 1, false, false);

    assert_eq!(perf.executed_at(0x1004), 3);
    assert_eq!(perf.cycles_at(0x1004), 28);
    assert_eq!(perf.fetch_misses_at(0x1004), 1);
    assert_eq!(perf.data_misses_at(0x1004), 1);

    // Neighboring slots are untouched.
    assert_eq!(perf.executed_at(0x1000), 0);
    assert_eq!(perf.executed_at(0x1008), 0);
}

// ══════════════════════════════════════════════════════════
// 2. Reader Round Trip
// ══════════════════════════════════════════════════════════

/// A fresh reader attach observes exactly what the writer recorded
/// (spec: quiescent-writer round trip).
#[test]
fn reader_round_trip() {
    let space = test_space();
    let name = segment_name("roundtrip");
    let mut writer = PerfCounters::create(&name, &space).unwrap();

    for (i, pc) in (0x1000u64..0x1010).step_by(4).enumerate() {
        writer.record(pc, 10 + i as u64, i % 2 == 0, i % 2 == 1);
    }

    let reader = PerfCounters::open(&name).unwrap();
    assert!(!reader.is_writer());
    assert_eq!(reader.base(), writer.base());
    assert_eq!(reader.bound(), writer.bound());
    assert_eq!(reader.len(), writer.len());

    for (i, pc) in (0x1000u64..0x1010).step_by(4).enumerate() {
        assert_eq!(reader.executed_at(pc), 1, "slot for {pc:#x}");
        assert_eq!(reader.cycles_at(pc), 10 + i as u64);
        assert_eq!(reader.fetch_misses_at(pc), u64::from(i % 2 == 0));
        assert_eq!(reader.data_misses_at(pc), u64::from(i % 2 == 1));
        assert_eq!(reader.insn_at(pc), writer.insn_at(pc));
    }

    // The reader borrows the segment; the writer owns its lifetime.
    reader.close();
    writer.close();
}

/// A reader may attach while the writer keeps recording; later snapshots
/// observe monotonically non-decreasing counters (the documented relaxed
/// consistency — no locks on either side).
#[test]
fn reader_sees_live_writer_updates() {
    let space = test_space();
    let name = segment_name("live");
    let mut writer = PerfCounters::create(&name, &space).unwrap();
    let reader = PerfCounters::open(&name).unwrap();

    let before = reader.executed_at(0x1000);
    writer.record(0x1000, 5, false, false);
    writer.record(0x1000, 5, false, false);
    let after = reader.executed_at(0x1000);

    assert_eq!(before, 0);
    assert_eq!(after, 2);
}

// ══════════════════════════════════════════════════════════
// 3. Error Taxonomy
// ══════════════════════════════════════════════════════════

/// Attaching to a segment nobody created is the retryable not-found error.
#[test]
fn open_missing_segment_is_not_found() {
    let err = PerfCounters::open(&segment_name("never-created")).unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err}");
}

/// An identifier with an interior slash is rejected before any syscall.
#[test]
fn invalid_identifier_is_config_error() {
    let space = test_space();
    let err = PerfCounters::create("/bad/name", &space).unwrap_err();
    assert!(!err.is_not_found());
    assert!(matches!(err, rvperf_core::common::ModelError::Config(_)));
}

/// Dropping the writer unlinks the segment: a subsequent attach fails.
#[test]
fn writer_drop_unlinks_segment() {
    let space = test_space();
    let name = segment_name("unlink");
    let writer = PerfCounters::create(&name, &space).unwrap();
    drop(writer);

    let err = PerfCounters::open(&name).unwrap_err();
    assert!(err.is_not_found());
}
