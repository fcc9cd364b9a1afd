use oatlink_core::{PointerSize, invariants};
use oatlink_format::{MAX_INDEX_DELTA, MethodBssMappingEntry};

/// Greedy run builder for [`MethodBssMappingEntry`].
///
/// Pairs must arrive in increasing index order. A pair joins the current run
/// when its slot directly follows the run's last slot and its index is within
/// [`MAX_INDEX_DELTA`] of the run's anchor without pushing an earlier member
/// out of the mask.
#[derive(Clone, Debug)]
pub struct MethodBssMappingEncoder {
    pointer_size: u32,
    entry: MethodBssMappingEntry,
}

impl MethodBssMappingEncoder {
    pub fn new(pointer_size: PointerSize) -> Self {
        Self {
            pointer_size: pointer_size.bytes(),
            entry: MethodBssMappingEntry::EMPTY,
        }
    }

    /// Fold `(method_index, bss_offset)` into the current run.
    ///
    /// Returns `false` and leaves the run untouched when the pair cannot join.
    ///
    /// # Panics
    /// If `method_index` equals the run's anchor, or does not fit in 16 bits.
    pub fn try_merge(&mut self, method_index: u32, bss_offset: u32) -> bool {
        let method_index = checked_index(method_index);
        let anchor = self.entry.method_index;
        if method_index == anchor {
            invariants::repeated_value("bss mapping index", method_index as u32);
        }
        if self.entry.bss_offset.wrapping_add(self.pointer_size) != bss_offset {
            return false;
        }
        let diff = (method_index as u32).wrapping_sub(anchor as u32);
        if diff > MAX_INDEX_DELTA {
            return false;
        }
        // Bits that would fall off the low end of the mask.
        let mask = self.entry.index_mask as u32;
        if mask & !(!0u32 << diff) != 0 {
            return false;
        }

        self.entry = MethodBssMappingEntry {
            method_index,
            index_mask: ((mask | (1 << MAX_INDEX_DELTA)) >> diff) as u16,
            bss_offset,
        };
        true
    }

    /// Start a new run at `(method_index, bss_offset)`.
    ///
    /// # Panics
    /// If `method_index` does not fit in 16 bits.
    pub fn reset(&mut self, method_index: u32, bss_offset: u32) {
        self.entry = MethodBssMappingEntry {
            method_index: checked_index(method_index),
            index_mask: 0,
            bss_offset,
        };
    }

    /// The current run; the empty sentinel before the first `reset`.
    pub fn entry(&self) -> MethodBssMappingEntry {
        self.entry
    }
}

fn checked_index(method_index: u32) -> u16 {
    // 0xFFFF is the "no index" sentinel and never a real index.
    if method_index >= u16::MAX as u32 {
        invariants::value_overflow("bss mapping index", method_index, u16::MAX as u32 - 1);
    }
    method_index as u16
}
