use oatlink_core::{DexFileId, MethodRef, PointerSize};
use oatlink_format::{MethodBssMappingEntry, MethodBssMappingView, encode_bss_mapping};

use super::layout::{MethodBssLayout, encode_method_bss_mapping, layout_method_bss};
use crate::LinkError;

#[test]
fn slots_follow_sorted_unique_indices() {
    let pairs = layout_method_bss([9, 3, 9, 1], 16, PointerSize::K32);
    assert_eq!(pairs, vec![(1, 16), (3, 20), (9, 24)]);

    let pairs = layout_method_bss([2, 0], 0, PointerSize::K64);
    assert_eq!(pairs, vec![(0, 0), (2, 8)]);

    assert!(layout_method_bss(Vec::new(), 0, PointerSize::K64).is_empty());
}

#[test]
fn no_pairs_no_entries() {
    assert!(encode_method_bss_mapping(&[], PointerSize::K32).is_empty());
}

#[test]
fn single_pair() {
    let entries = encode_method_bss_mapping(&[(7, 24)], PointerSize::K32);
    assert_eq!(
        entries,
        vec![MethodBssMappingEntry {
            method_index: 7,
            index_mask: 0,
            bss_offset: 24,
        }]
    );
}

#[test]
fn dense_indices_split_every_seventeen() {
    let pairs = layout_method_bss(0..=40, 0, PointerSize::K32);
    let entries = encode_method_bss_mapping(&pairs, PointerSize::K32);

    let bytes = encode_bss_mapping(&entries);
    let view = MethodBssMappingView::from_bytes(&bytes).unwrap();
    insta::assert_snapshot!(oatlink_format::dump_bss_mapping(&view, oatlink_core::Colors::OFF), @r"
    E0 #16 mask 0xffff @ 0x40  [0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16]
    E1 #33 mask 0xffff @ 0x84  [17 18 19 20 21 22 23 24 25 26 27 28 29 30 31 32 33]
    E2 #40 mask 0xfc00 @ 0xa0  [34 35 36 37 38 39 40]
    ");
}

#[test]
fn slot_gap_starts_a_new_run() {
    let entries = encode_method_bss_mapping(&[(1, 0), (2, 8)], PointerSize::K32);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].method_index, 2);
}

#[test]
fn encoded_runs_reproduce_every_slot() {
    let indices = [2, 3, 7, 20, 21, 40, 41, 57, 100, 116, 117];
    let pairs = layout_method_bss(indices, 0x40, PointerSize::K64);
    let entries = encode_method_bss_mapping(&pairs, PointerSize::K64);
    assert_eq!(entries.len(), 6);
    assert!(entries.iter().all(|e| e.covered_indices().len() <= 17));

    let bytes = encode_bss_mapping(&entries);
    let view = MethodBssMappingView::from_bytes(&bytes).unwrap();
    for &(method_index, bss_offset) in &pairs {
        assert_eq!(view.bss_offset(method_index, 8), Some(bss_offset), "index {method_index}");
    }
    for missing in [0, 4, 19, 56, 101, 118] {
        assert_eq!(view.bss_offset(missing, 8), None, "index {missing}");
    }
}

#[test]
fn dex_files_take_consecutive_slot_ranges() {
    let r = |dex, idx| MethodRef::new(DexFileId(dex), idx);
    let layout =
        MethodBssLayout::new([r(0, 5), r(1, 3), r(0, 1), r(0, 5)], PointerSize::K64).unwrap();

    assert_eq!(layout.size, 24);
    assert_eq!(layout.slot(r(0, 1)), Some(0));
    assert_eq!(layout.slot(r(0, 5)), Some(8));
    assert_eq!(layout.slot(r(1, 3)), Some(16));
    assert_eq!(layout.slot(r(1, 5)), None);

    assert_eq!(
        layout.mappings[&DexFileId(0)],
        vec![MethodBssMappingEntry {
            method_index: 5,
            index_mask: 0x1000,
            bss_offset: 8,
        }]
    );
    assert_eq!(
        layout.mappings[&DexFileId(1)],
        vec![MethodBssMappingEntry {
            method_index: 3,
            index_mask: 0,
            bss_offset: 16,
        }]
    );
}

#[test]
fn sentinel_index_is_rejected() {
    let target = MethodRef::new(DexFileId(2), 0xFFFF);
    let err = MethodBssLayout::new([target], PointerSize::K32).unwrap_err();
    assert!(matches!(err, LinkError::BssIndexTooLarge(t) if t == target));
}
