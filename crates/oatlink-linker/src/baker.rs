//! Baker read barrier patch data.
//!
//! A read barrier branch patch carries one custom word describing the barrier:
//! - bits 0-1: kind (field, array, GC root)
//! - bits 2-7: first register
//! - bits 8-13: second register
//!
//! Register value 63 means "no register".

use crate::thunk::{RawThunkParams, ThunkKey, ThunkType};

/// Register value marking an unused register slot.
pub const INVALID_REG: u32 = 63;

const KIND_BITS: u32 = 2;
const REG_BITS: u32 = 6;
const FIRST_REG_SHIFT: u32 = KIND_BITS;
const SECOND_REG_SHIFT: u32 = KIND_BITS + REG_BITS;
const USED_BITS: u32 = KIND_BITS + 2 * REG_BITS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BakerReadBarrierKind {
    Field = 0,
    Array = 1,
    GcRoot = 2,
}

impl BakerReadBarrierKind {
    pub fn thunk_type(self) -> ThunkType {
        match self {
            BakerReadBarrierKind::Field => ThunkType::BakerReadBarrierField,
            BakerReadBarrierKind::Array => ThunkType::BakerReadBarrierArray,
            BakerReadBarrierKind::GcRoot => ThunkType::BakerReadBarrierRoot,
        }
    }
}

/// Decoded custom word of a Baker read barrier branch patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BakerReadBarrierData {
    pub kind: BakerReadBarrierKind,
    pub first_reg: u32,
    pub second_reg: u32,
}

impl BakerReadBarrierData {
    /// Field load through `base_reg`, lock word read from `holder_reg`.
    pub fn field(base_reg: u32, holder_reg: u32) -> Self {
        Self {
            kind: BakerReadBarrierKind::Field,
            first_reg: base_reg,
            second_reg: holder_reg,
        }
    }

    pub fn array(base_reg: u32) -> Self {
        Self {
            kind: BakerReadBarrierKind::Array,
            first_reg: base_reg,
            second_reg: INVALID_REG,
        }
    }

    pub fn gc_root(root_reg: u32) -> Self {
        Self {
            kind: BakerReadBarrierKind::GcRoot,
            first_reg: root_reg,
            second_reg: INVALID_REG,
        }
    }

    pub fn encode(&self) -> u32 {
        debug_assert!(self.first_reg <= INVALID_REG && self.second_reg <= INVALID_REG);
        self.kind as u32 | (self.first_reg << FIRST_REG_SHIFT) | (self.second_reg << SECOND_REG_SHIFT)
    }

    /// Returns `None` for an unknown kind, stray high bits, or a missing
    /// register the kind requires.
    pub fn decode(value: u32) -> Option<Self> {
        if value >> USED_BITS != 0 {
            return None;
        }
        let reg_mask = (1 << REG_BITS) - 1;
        let kind = match value & ((1 << KIND_BITS) - 1) {
            0 => BakerReadBarrierKind::Field,
            1 => BakerReadBarrierKind::Array,
            2 => BakerReadBarrierKind::GcRoot,
            _ => return None,
        };
        let data = Self {
            kind,
            first_reg: (value >> FIRST_REG_SHIFT) & reg_mask,
            second_reg: (value >> SECOND_REG_SHIFT) & reg_mask,
        };
        let valid = match kind {
            BakerReadBarrierKind::Field => {
                data.first_reg != INVALID_REG && data.second_reg != INVALID_REG
            }
            BakerReadBarrierKind::Array | BakerReadBarrierKind::GcRoot => {
                data.first_reg != INVALID_REG && data.second_reg == INVALID_REG
            }
        };
        valid.then_some(data)
    }

    /// Thunk key shared by all barriers with this data.
    pub fn thunk_key(&self) -> ThunkKey {
        let raw = match self.kind {
            BakerReadBarrierKind::Field => RawThunkParams {
                first: self.second_reg,
                second: self.first_reg,
            },
            BakerReadBarrierKind::Array | BakerReadBarrierKind::GcRoot => RawThunkParams {
                first: self.first_reg,
                second: 0,
            },
        };
        ThunkKey::new(self.kind.thunk_type(), raw)
    }
}
