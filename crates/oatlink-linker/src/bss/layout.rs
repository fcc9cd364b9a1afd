use std::collections::BTreeMap;

use oatlink_core::{DexFileId, MethodRef, NO_INDEX16, PointerSize};
use oatlink_format::MethodBssMappingEntry;
use tracing::debug;

use super::encoder::MethodBssMappingEncoder;
use crate::LinkError;

/// Assign consecutive pointer-sized slots, starting at `start`, to the given
/// method indices in ascending order. Duplicates share a slot.
pub fn layout_method_bss(
    method_indices: impl IntoIterator<Item = u32>,
    start: u32,
    pointer_size: PointerSize,
) -> Vec<(u32, u32)> {
    let mut indices: Vec<u32> = method_indices.into_iter().collect();
    indices.sort_unstable();
    indices.dedup();

    let step = pointer_size.bytes();
    indices
        .into_iter()
        .zip((0..).map(|i: u32| start + i * step))
        .collect()
}

/// Compress `(method_index, bss_offset)` pairs, sorted by index, into runs.
pub fn encode_method_bss_mapping(
    pairs: &[(u32, u32)],
    pointer_size: PointerSize,
) -> Vec<MethodBssMappingEntry> {
    let Some(&(first_index, first_offset)) = pairs.first() else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    let mut encoder = MethodBssMappingEncoder::new(pointer_size);
    encoder.reset(first_index, first_offset);
    for &(method_index, bss_offset) in &pairs[1..] {
        if !encoder.try_merge(method_index, bss_offset) {
            entries.push(encoder.entry());
            encoder.reset(method_index, bss_offset);
        }
    }
    entries.push(encoder.entry());
    entries
}

/// Bss slots of every method referenced through a bss entry patch.
///
/// Dex files get consecutive slot ranges in increasing id order, starting at
/// offset 0 of the bss segment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MethodBssLayout {
    pub slots: BTreeMap<MethodRef, u32>,
    pub mappings: BTreeMap<DexFileId, Vec<MethodBssMappingEntry>>,
    /// Bytes of bss taken by the slots.
    pub size: u32,
}

impl MethodBssLayout {
    pub fn new(
        targets: impl IntoIterator<Item = MethodRef>,
        pointer_size: PointerSize,
    ) -> Result<Self, LinkError> {
        let mut per_dex: BTreeMap<DexFileId, Vec<u32>> = BTreeMap::new();
        for target in targets {
            // The top 16-bit value is reserved for "no index".
            if target.method_index >= NO_INDEX16 as u32 {
                return Err(LinkError::BssIndexTooLarge(target));
            }
            per_dex
                .entry(target.dex_file)
                .or_default()
                .push(target.method_index);
        }

        let mut layout = Self::default();
        for (dex_file, indices) in per_dex {
            let pairs = layout_method_bss(indices, layout.size, pointer_size);
            layout.size += pairs.len() as u32 * pointer_size.bytes();
            for &(method_index, bss_offset) in &pairs {
                layout
                    .slots
                    .insert(MethodRef::new(dex_file, method_index), bss_offset);
            }
            let entries = encode_method_bss_mapping(&pairs, pointer_size);
            debug!(%dex_file, slots = pairs.len(), entries = entries.len(), "laid out method bss");
            layout.mappings.insert(dex_file, entries);
        }
        Ok(layout)
    }

    pub fn slot(&self, method: MethodRef) -> Option<u32> {
        self.slots.get(&method).copied()
    }
}
