//! Tests for the method bss mapping records.

use super::bss_mapping::{MethodBssMappingEntry, MethodBssMappingView, encode_bss_mapping};
use crate::FormatError;

fn entry(method_index: u16, index_mask: u16, bss_offset: u32) -> MethodBssMappingEntry {
    MethodBssMappingEntry {
        method_index,
        index_mask,
        bss_offset,
    }
}

#[test]
fn empty_entry_is_the_sentinel() {
    let e = MethodBssMappingEntry::default();
    assert_eq!(e.method_index, 0xFFFF);
    assert_eq!(e.index_mask, 0);
    assert_eq!(e.bss_offset, 0xFFFF_FFFF);
}

#[test]
fn covers_anchor_and_masked_indices() {
    // Run {1, 5, 17}: 17 - 5 = 12 -> bit 4, 17 - 1 = 16 -> bit 0.
    let e = entry(17, 0x0011, 8);

    assert!(e.covers_index(17));
    assert!(e.covers_index(5));
    assert!(e.covers_index(1));
    assert!(!e.covers_index(0));
    assert!(!e.covers_index(2));
    assert!(!e.covers_index(16));
    assert!(!e.covers_index(18));
}

#[test]
fn bss_offsets_step_by_pointer_per_member() {
    let e = entry(17, 0x0011, 8);
    assert_eq!(e.bss_offset_for(17, 4), 8);
    assert_eq!(e.bss_offset_for(5, 4), 4);
    assert_eq!(e.bss_offset_for(1, 4), 0);

    let e = entry(17, 0x0011, 16);
    assert_eq!(e.bss_offset_for(5, 8), 8);
    assert_eq!(e.bss_offset_for(1, 8), 0);
}

#[test]
fn covered_indices_ascending() {
    assert_eq!(entry(17, 0x0011, 8).covered_indices(), vec![1, 5, 17]);
    assert_eq!(entry(3, 0, 0).covered_indices(), vec![3]);
    // Bit for index 3 - 4 would underflow; it is ignored.
    assert_eq!(entry(3, 0xFFFF, 0).covered_indices(), vec![0, 1, 2, 3]);
}

#[test]
fn record_layout_is_little_endian() {
    let bytes = entry(0x1234, 0x0011, 0xAABBCCDD).to_bytes();
    assert_eq!(bytes, [0x34, 0x12, 0x11, 0x00, 0xDD, 0xCC, 0xBB, 0xAA]);
    assert_eq!(MethodBssMappingEntry::from_bytes(bytes), entry(0x1234, 0x0011, 0xAABBCCDD));
}

#[test]
fn table_lookup() {
    let entries = [entry(17, 0x0011, 8), entry(40, 0x8000, 20)];
    let bytes = encode_bss_mapping(&entries);
    assert_eq!(bytes.len(), 4 + 2 * 8);

    let view = MethodBssMappingView::from_bytes(&bytes).unwrap();
    assert_eq!(view.len(), 2);
    assert_eq!(view.get(1), entries[1]);

    assert_eq!(view.bss_offset(1, 4), Some(0));
    assert_eq!(view.bss_offset(5, 4), Some(4));
    assert_eq!(view.bss_offset(17, 4), Some(8));
    assert_eq!(view.bss_offset(39, 4), Some(16));
    assert_eq!(view.bss_offset(40, 4), Some(20));
    assert_eq!(view.bss_offset(6, 4), None);
    assert_eq!(view.bss_offset(41, 4), None);
}

#[test]
fn empty_table() {
    let bytes = encode_bss_mapping(&[]);
    let view = MethodBssMappingView::from_bytes(&bytes).unwrap();
    assert!(view.is_empty());
    assert_eq!(view.bss_offset(0, 8), None);
}

#[test]
fn truncated_table_is_rejected() {
    let mut bytes = encode_bss_mapping(&[entry(3, 0, 0)]);
    bytes.pop();
    let err = MethodBssMappingView::from_bytes(&bytes).unwrap_err();
    assert!(matches!(
        err,
        FormatError::Truncated {
            needed: 12,
            available: 11,
            ..
        }
    ));

    assert!(MethodBssMappingView::from_bytes(&[1, 0]).is_err());
}

#[test]
fn unsorted_table_is_rejected() {
    let bytes = encode_bss_mapping(&[entry(9, 0, 0), entry(9, 0, 8)]);
    let err = MethodBssMappingView::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, FormatError::UnsortedBssMapping(1)));
}
