//! Predecoded instruction space.
//!
//! This module holds a dense, address-indexed array of predecoded instruction
//! summaries covering the executable's code region. It is built once at load
//! time from the raw code bytes and is read-only during simulation. It provides:
//! 1. **Slot Addressing:** `slot = (pc - base) / 2`, the contract shared with
//!    the counter store (RISC-V instructions are a minimum of 2 bytes).
//! 2. **Classification:** A coarse opcode class per slot, sufficient for
//!    performance modeling without full decode.
//! 3. **Raw Bits:** The encoded bits at each address, so the counter store can
//!    embed them and viewers never need the original binary.

use crate::common::ModelError;

/// Coarse instruction classification for performance modeling.
///
/// Full semantic decode lives in the embedding simulator; the model only needs
/// to know whether an instruction touches memory, transfers control, or is a
/// plain ALU/system operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OpClass {
    /// Integer or FP computation, immediates, fences.
    Alu = 0,
    /// Integer or FP load.
    Load = 1,
    /// Integer or FP store.
    Store = 2,
    /// Conditional branch.
    Branch = 3,
    /// Unconditional jump (`jal`, `jalr`, `c.j`, `c.jr`, ...).
    Jump = 4,
    /// `ecall`, `ebreak`, CSR access.
    System = 5,
    /// Unclassified or illegal encoding.
    Other = 6,
}

/// Predecoded summary of one instruction slot.
///
/// This struct is embedded verbatim in the shared-memory counter layout, so
/// its size and field order are part of the wire format: 8 bytes, `repr(C)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct InsnSummary {
    /// Raw encoded bits (lower 16 significant for compressed encodings).
    pub bits: u32,
    /// Coarse opcode classification.
    pub class: OpClass,
    /// True for a 16-bit compressed encoding.
    pub compressed: bool,
    _pad: [u8; 2],
}

impl InsnSummary {
    /// Decodes the summary for one encoding.
    ///
    /// Low two bits `!= 0b11` mark a 16-bit compressed instruction; otherwise
    /// the 32-bit major opcode selects the class.
    pub fn decode(bits: u32) -> Self {
        let compressed = bits & 0b11 != 0b11;
        let class = if compressed {
            classify_compressed(bits as u16)
        } else {
            classify_standard(bits)
        };
        Self {
            bits,
            class,
            compressed,
            _pad: [0; 2],
        }
    }

    /// Instruction length in bytes (2 or 4).
    #[inline]
    pub fn len(&self) -> u64 {
        if self.compressed { 2 } else { 4 }
    }
}

/// Classifies a standard 32-bit encoding by its major opcode.
fn classify_standard(bits: u32) -> OpClass {
    match bits & 0x7f {
        0b000_0011 | 0b000_0111 => OpClass::Load,
        0b010_0011 | 0b010_0111 => OpClass::Store,
        0b110_0011 => OpClass::Branch,
        0b110_1111 | 0b110_0111 => OpClass::Jump,
        0b111_0011 => OpClass::System,
        // OP, OP-IMM, OP-32, OP-IMM-32, LUI, AUIPC, AMO, FP-OP, MISC-MEM
        0b011_0011 | 0b001_0011 | 0b011_1011 | 0b001_1011 | 0b011_0111 | 0b001_0111
        | 0b010_1111 | 0b101_0011 | 0b000_1111 => OpClass::Alu,
        _ => OpClass::Other,
    }
}

/// Classifies a compressed 16-bit encoding by quadrant and funct3.
///
/// RV64 interpretation: `funct3 = 001` in quadrant 1 is `c.addiw`, not the
/// RV32-only `c.jal`.
fn classify_compressed(bits: u16) -> OpClass {
    if bits == 0 {
        return OpClass::Other;
    }
    let funct3 = (bits >> 13) & 0b111;
    match bits & 0b11 {
        0b00 => match funct3 {
            0b001 | 0b010 | 0b011 => OpClass::Load,
            0b101 | 0b110 | 0b111 => OpClass::Store,
            0b000 => OpClass::Alu,
            _ => OpClass::Other,
        },
        0b01 => match funct3 {
            0b101 => OpClass::Jump,
            0b110 | 0b111 => OpClass::Branch,
            _ => OpClass::Alu,
        },
        0b10 => match funct3 {
            0b001 | 0b010 | 0b011 => OpClass::Load,
            0b101 | 0b110 | 0b111 => OpClass::Store,
            // c.jr / c.jalr when rs2 is zero, else c.mv / c.add
            0b100 => {
                if (bits >> 2) & 0b1_1111 == 0 {
                    OpClass::Jump
                } else {
                    OpClass::Alu
                }
            }
            _ => OpClass::Alu,
        },
        _ => OpClass::Other,
    }
}

/// Dense, address-indexed array of predecoded instruction summaries.
///
/// One slot per 2-byte-aligned address between `base` (inclusive) and `bound`
/// (exclusive). Owned once at load time, read-only thereafter.
#[derive(Debug)]
pub struct InsnSpace {
    base: u64,
    bound: u64,
    summaries: Vec<InsnSummary>,
}

impl InsnSpace {
    /// Predecodes the code region starting at `base`.
    ///
    /// Each 2-byte slot is decoded from the 32-bit window at its offset; the
    /// tail of the region is zero-padded. A slot in the middle of a 4-byte
    /// instruction still gets a summary — the driver only ever queries real
    /// instruction boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] when the region is empty or `base` or
    /// its length is not 2-byte aligned.
    pub fn new(base: u64, code: &[u8]) -> Result<Self, ModelError> {
        if code.is_empty() {
            return Err(ModelError::Config(
                "instruction space: empty code region".to_owned(),
            ));
        }
        if base % 2 != 0 || code.len() % 2 != 0 {
            return Err(ModelError::Config(format!(
                "instruction space: base {base:#x} and length {:#x} must be 2-byte aligned",
                code.len()
            )));
        }

        let slots = code.len() / 2;
        let mut summaries = Vec::with_capacity(slots);
        for slot in 0..slots {
            let off = slot * 2;
            let mut word = [0u8; 4];
            for (i, byte) in word.iter_mut().enumerate() {
                *byte = code.get(off + i).copied().unwrap_or(0);
            }
            summaries.push(InsnSummary::decode(u32::from_le_bytes(word)));
        }

        Ok(Self {
            base,
            bound: base + code.len() as u64,
            summaries,
        })
    }

    /// First covered address.
    #[inline]
    pub fn base(&self) -> u64 {
        self.base
    }

    /// One past the last covered address.
    #[inline]
    pub fn bound(&self) -> u64 {
        self.bound
    }

    /// Number of 2-byte instruction slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    /// True when the region covers no slots (never, post-construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Whether `pc` falls inside the covered range.
    #[inline]
    pub fn contains(&self, pc: u64) -> bool {
        (self.base..self.bound).contains(&pc)
    }

    /// Predecoded summary at `pc`. O(1).
    ///
    /// `pc` must be in range and 2-byte aligned; this is a caller contract.
    #[inline]
    pub fn at(&self, pc: u64) -> InsnSummary {
        self.summaries[self.slot(pc)]
    }

    /// Raw encoded bits at `pc`. O(1).
    #[inline]
    pub fn image(&self, pc: u64) -> u32 {
        self.summaries[self.slot(pc)].bits
    }

    /// Slot index for `pc` — the addressing contract shared with the
    /// counter store.
    #[inline]
    fn slot(&self, pc: u64) -> usize {
        debug_assert!(self.contains(pc), "pc {pc:#x} outside instruction space");
        debug_assert!(pc % 2 == 0, "pc {pc:#x} misaligned");
        ((pc - self.base) / 2) as usize
    }
}
