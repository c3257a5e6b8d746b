//! Shared-memory performance counter store.
//!
//! One counter slot per 2-byte instruction address, held in a named POSIX
//! shared-memory segment so an independent viewer process can watch a live
//! simulation. This module provides:
//! 1. **Wire Format:** `repr(C)` header + slot array, host byte order,
//!    same-build only — the sole contract between writer and reader.
//! 2. **Writer Side:** [`PerfCounters::create`] sizes, zero-fills, and
//!    predecodes every slot so viewers never need the original binary.
//! 3. **Reader Side:** [`PerfCounters::open`] maps the header to discover the
//!    true size, then remaps the full region read-only.
//!
//! # Consistency
//!
//! There is deliberately no synchronization. The writer never blocks on
//! readers; readers take racy snapshots and may observe torn or partial
//! counter updates across the four counters of a slot or across slots. The
//! counters are monotonically increasing integers read for approximate
//! visualization, so this relaxation is the design, not a bug — do not add
//! locks, which would defeat the non-blocking-writer requirement.

mod region;

use std::mem::size_of;
use std::ptr;

use tracing::debug;

use crate::common::ModelError;
use crate::insn::{InsnSpace, InsnSummary};
use region::SharedRegion;

/// Segment header: the covered instruction range and the total region size.
///
/// The reader maps this much first to learn `size`, then remaps.
#[derive(Clone, Copy, Debug)]
#[repr(C)]
pub struct PerfHeader {
    /// First covered instruction address (inclusive).
    pub base: u64,
    /// Last covered instruction address (exclusive).
    pub bound: u64,
    /// Total byte size of the region, header included.
    pub size: u64,
}

/// One per-instruction counter slot.
#[derive(Clone, Copy, Debug)]
#[repr(C)]
pub struct CountSlot {
    /// Predecoded summary of the instruction at this slot.
    pub insn: InsnSummary,
    /// Times this instruction retired.
    pub executed: u64,
    /// Cycles charged to this instruction, cumulative.
    pub cycles: u64,
    /// Instruction-fetch misses at this address.
    pub fetch_misses: u64,
    /// Data-access misses charged to this instruction.
    pub data_misses: u64,
}

/// Shared-memory-backed array of per-instruction counters.
///
/// Created by the simulator (single writer), opened read-only by any number
/// of viewer processes. Slot index for address `pc` is `(pc - base) / 2` —
/// the same formula on both sides, and the only addressing contract.
///
/// The writer process must outlive its readers' mappings: the segment is
/// unlinked when the writer drops, with no cross-process refcounting.
#[derive(Debug)]
pub struct PerfCounters {
    region: SharedRegion,
    base: u64,
    bound: u64,
}

impl PerfCounters {
    /// Creates the writer-side store covering `space`'s address range.
    ///
    /// Allocates and zero-fills the segment, writes the header, and
    /// predecodes an [`InsnSummary`] into every slot up front.
    ///
    /// # Errors
    ///
    /// [`ModelError::Shm`] when the segment cannot be created, sized, or
    /// mapped. (An empty address range is unrepresentable: [`InsnSpace`]
    /// refuses to construct one.)
    pub fn create(name: &str, space: &InsnSpace) -> Result<Self, ModelError> {
        let slots = space.len();
        let size = size_of::<PerfHeader>() + slots * size_of::<CountSlot>();
        let region = SharedRegion::create(name, size)?;

        let header = PerfHeader {
            base: space.base(),
            bound: space.bound(),
            size: size as u64,
        };
        // SAFETY: the region is at least `size` bytes, exclusively owned by
        // this writer, and `PerfHeader`/`CountSlot` are plain `repr(C)` data.
        unsafe {
            ptr::write(region.as_mut_ptr().cast::<PerfHeader>(), header);
            let array = region
                .as_mut_ptr()
                .add(size_of::<PerfHeader>())
                .cast::<CountSlot>();
            for slot in 0..slots {
                let pc = space.base() + slot as u64 * 2;
                (*array.add(slot)).insn = space.at(pc);
            }
        }
        debug!(name, slots, size, "counter segment created");

        Ok(Self {
            region,
            base: space.base(),
            bound: space.bound(),
        })
    }

    /// Attaches read-only to an existing store.
    ///
    /// Maps the header alone to learn the true region size, unmaps, then
    /// remaps the full region. Safe to call while the writer is live; all
    /// subsequent reads are racy snapshots by contract.
    ///
    /// # Errors
    ///
    /// [`ModelError::Shm`] when the segment does not exist (see
    /// [`ModelError::is_not_found`]) or cannot be mapped, and
    /// [`ModelError::Config`] when the header is internally inconsistent.
    pub fn open(name: &str) -> Result<Self, ModelError> {
        let probe = SharedRegion::open(name, size_of::<PerfHeader>())?;
        // SAFETY: the probe mapping covers exactly one header.
        let header = unsafe { ptr::read(probe.as_ptr().cast::<PerfHeader>()) };
        drop(probe);

        let slots = header.bound.saturating_sub(header.base) / 2;
        let expect = size_of::<PerfHeader>() as u64 + slots * size_of::<CountSlot>() as u64;
        if header.bound <= header.base || header.size != expect {
            return Err(ModelError::Config(format!(
                "counter segment `{name}`: inconsistent header (base {:#x}, bound {:#x}, size {})",
                header.base, header.bound, header.size
            )));
        }

        let region = SharedRegion::open(name, header.size as usize)?;
        debug!(name, slots, size = header.size, "counter segment attached");

        Ok(Self {
            region,
            base: header.base,
            bound: header.bound,
        })
    }

    /// Accumulates one retired instruction into its slot. O(1), writer only.
    ///
    /// Bumps the execution count by one, the cycle count by `cycles`, and
    /// the two miss counters by zero or one.
    #[inline]
    pub fn record(&mut self, pc: u64, cycles: u64, fetch_miss: bool, data_miss: bool) {
        debug_assert!(self.region.is_writer(), "record on a reader mapping");
        let slot = self.slot_ptr(pc);
        // SAFETY: `slot` points into the writer's live read-write mapping;
        // this process is the only writer.
        unsafe {
            (*slot).executed += 1;
            (*slot).cycles += cycles;
            (*slot).fetch_misses += u64::from(fetch_miss);
            (*slot).data_misses += u64::from(data_miss);
        }
    }

    /// Execution count at `pc`. Racy snapshot on a reader mapping.
    pub fn executed_at(&self, pc: u64) -> u64 {
        // SAFETY: in-range slot in a live mapping; volatile because the
        // writer may be updating concurrently.
        unsafe { ptr::read_volatile(&raw const (*self.slot_ptr(pc)).executed) }
    }

    /// Accumulated cycles at `pc`. Racy snapshot on a reader mapping.
    pub fn cycles_at(&self, pc: u64) -> u64 {
        // SAFETY: as in `executed_at`.
        unsafe { ptr::read_volatile(&raw const (*self.slot_ptr(pc)).cycles) }
    }

    /// Instruction-fetch miss count at `pc`. Racy snapshot on a reader mapping.
    pub fn fetch_misses_at(&self, pc: u64) -> u64 {
        // SAFETY: as in `executed_at`.
        unsafe { ptr::read_volatile(&raw const (*self.slot_ptr(pc)).fetch_misses) }
    }

    /// Data-access miss count at `pc`. Racy snapshot on a reader mapping.
    pub fn data_misses_at(&self, pc: u64) -> u64 {
        // SAFETY: as in `executed_at`.
        unsafe { ptr::read_volatile(&raw const (*self.slot_ptr(pc)).data_misses) }
    }

    /// Predecoded instruction summary at `pc` (written once at creation).
    pub fn insn_at(&self, pc: u64) -> InsnSummary {
        // SAFETY: as in `executed_at`; the summary is immutable after create.
        unsafe { ptr::read_volatile(&raw const (*self.slot_ptr(pc)).insn) }
    }

    /// First covered instruction address.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// One past the last covered instruction address.
    pub fn bound(&self) -> u64 {
        self.bound
    }

    /// Number of counter slots.
    pub fn len(&self) -> usize {
        ((self.bound - self.base) / 2) as usize
    }

    /// True when the store covers no slots (never, post-construction).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this handle is the writer side.
    pub fn is_writer(&self) -> bool {
        self.region.is_writer()
    }

    /// Unmaps the region; the writer side also unlinks the segment.
    ///
    /// Equivalent to dropping the handle; provided for explicit shutdown.
    pub fn close(self) {
        drop(self);
    }

    #[inline]
    fn slot_ptr(&self, pc: u64) -> *mut CountSlot {
        debug_assert!(
            (self.base..self.bound).contains(&pc) && pc % 2 == 0,
            "pc {pc:#x} outside counter range {:#x}..{:#x}",
            self.base,
            self.bound
        );
        let index = ((pc - self.base) / 2) as usize;
        // Cast through the const pointer so reader mappings never touch
        // `as_mut_ptr`'s writer assertion.
        let array = unsafe { self.region.as_ptr().add(size_of::<PerfHeader>()) };
        unsafe { array.cast::<CountSlot>().cast_mut().add(index) }
    }
}
