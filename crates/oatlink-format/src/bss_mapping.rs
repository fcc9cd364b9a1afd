//! Compressed method -> bss slot mapping.
//!
//! Each entry describes a run of up to 17 method indices whose bss slots are
//! consecutive pointer-sized cells. The entry stores the highest index of the
//! run (`method_index`), its slot (`bss_offset`), and a 16-bit mask of which
//! of the 16 preceding indices also belong to the run. Bit `16 - d` marks the
//! index `method_index - d`.
//!
//! Table layout: `count (u32)` followed by `count` 8-byte records
//! `method_index (u16) | index_mask (u16) | bss_offset (u32)`, little-endian,
//! in increasing `method_index` order.

use oatlink_core::NO_INDEX16;

use crate::FormatError;

/// Size of one serialized entry.
pub const ENTRY_SIZE: usize = 8;

/// Largest distance below `method_index` that an entry can cover.
pub const MAX_INDEX_DELTA: u32 = 16;

/// One compressed run of the method bss mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct MethodBssMappingEntry {
    pub method_index: u16,
    pub index_mask: u16,
    pub bss_offset: u32,
}

impl Default for MethodBssMappingEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl MethodBssMappingEntry {
    /// Sentinel entry that covers nothing.
    pub const EMPTY: Self = Self {
        method_index: NO_INDEX16,
        index_mask: 0,
        bss_offset: u32::MAX,
    };

    pub fn covers_index(&self, method_index: u32) -> bool {
        let diff = (self.method_index as u32).wrapping_sub(method_index);
        diff == 0
            || (diff <= MAX_INDEX_DELTA
                && (self.index_mask as u32 >> (MAX_INDEX_DELTA - diff)) & 1 != 0)
    }

    /// Slot offset of a covered index.
    ///
    /// Members of the run occupy consecutive slots, so an earlier member sits
    /// one pointer below for every covered index between it and the anchor.
    pub fn bss_offset_for(&self, method_index: u32, pointer_size: u32) -> u32 {
        debug_assert!(
            self.covers_index(method_index),
            "entry {self:?} does not cover index {method_index}"
        );
        let diff = (self.method_index as u32).wrapping_sub(method_index);
        if diff == 0 {
            return self.bss_offset;
        }
        let skipped = (self.index_mask as u32 >> (MAX_INDEX_DELTA - diff)).count_ones();
        self.bss_offset - skipped * pointer_size
    }

    /// Method indices covered by this entry, ascending.
    pub fn covered_indices(&self) -> Vec<u32> {
        let anchor = self.method_index as u32;
        let mut indices: Vec<u32> = (1..=MAX_INDEX_DELTA)
            .rev()
            .filter(|&d| d <= anchor && (self.index_mask as u32 >> (MAX_INDEX_DELTA - d)) & 1 != 0)
            .map(|d| anchor - d)
            .collect();
        indices.push(anchor);
        indices
    }

    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[0..2].copy_from_slice(&self.method_index.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.index_mask.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.bss_offset.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; ENTRY_SIZE]) -> Self {
        Self {
            method_index: u16::from_le_bytes([bytes[0], bytes[1]]),
            index_mask: u16::from_le_bytes([bytes[2], bytes[3]]),
            bss_offset: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

/// Serialize entries as a count-prefixed table.
pub fn encode_bss_mapping(entries: &[MethodBssMappingEntry]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(4 + entries.len() * ENTRY_SIZE);
    bytes.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for entry in entries {
        bytes.extend_from_slice(&entry.to_bytes());
    }
    bytes
}

/// Zero-copy view over a serialized mapping table.
#[derive(Clone, Copy, Debug)]
pub struct MethodBssMappingView<'a> {
    records: &'a [u8],
    count: usize,
}

impl<'a> MethodBssMappingView<'a> {
    /// Parse the count prefix and check that all records are present and sorted.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, FormatError> {
        if bytes.len() < 4 {
            return Err(FormatError::Truncated {
                section: "bss mapping",
                needed: 4,
                available: bytes.len(),
            });
        }
        let count = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        let needed = 4 + count * ENTRY_SIZE;
        if bytes.len() < needed {
            return Err(FormatError::Truncated {
                section: "bss mapping",
                needed,
                available: bytes.len(),
            });
        }

        let view = Self {
            records: &bytes[4..needed],
            count,
        };
        for i in 1..count {
            if view.get(i).method_index <= view.get(i - 1).method_index {
                return Err(FormatError::UnsortedBssMapping(i));
            }
        }
        Ok(view)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Serialized size, count prefix included.
    pub fn byte_len(&self) -> usize {
        4 + self.records.len()
    }

    pub fn get(&self, idx: usize) -> MethodBssMappingEntry {
        assert!(idx < self.count, "bss mapping index {idx} out of range");
        let start = idx * ENTRY_SIZE;
        let mut record = [0u8; ENTRY_SIZE];
        record.copy_from_slice(&self.records[start..start + ENTRY_SIZE]);
        MethodBssMappingEntry::from_bytes(record)
    }

    pub fn iter(&self) -> impl Iterator<Item = MethodBssMappingEntry> + '_ {
        (0..self.count).map(|i| self.get(i))
    }

    /// Find the bss slot of `method_index`, if the mapping covers it.
    ///
    /// Only the first entry whose anchor is not below the index can cover it.
    pub fn bss_offset(&self, method_index: u32, pointer_size: u32) -> Option<u32> {
        let (mut lo, mut hi) = (0usize, self.count);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if (self.get(mid).method_index as u32) < method_index {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo == self.count {
            return None;
        }
        let entry = self.get(lo);
        entry
            .covers_index(method_index)
            .then(|| entry.bss_offset_for(method_index, pointer_size))
    }
}
