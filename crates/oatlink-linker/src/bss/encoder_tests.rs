use oatlink_core::PointerSize;
use oatlink_format::MethodBssMappingEntry;

use super::encoder::MethodBssMappingEncoder;

fn encoder_at(method_index: u32, bss_offset: u32) -> MethodBssMappingEncoder {
    let mut encoder = MethodBssMappingEncoder::new(PointerSize::K32);
    encoder.reset(method_index, bss_offset);
    encoder
}

#[test]
fn fresh_encoder_holds_the_sentinel() {
    let encoder = MethodBssMappingEncoder::new(PointerSize::K64);
    assert_eq!(encoder.entry(), MethodBssMappingEntry::EMPTY);
}

#[test]
fn sparse_run_within_window() {
    let mut encoder = encoder_at(1, 0);
    assert!(!encoder.try_merge(18, 4));
    assert_eq!(encoder.entry().method_index, 1);

    assert!(encoder.try_merge(5, 4));
    assert!(encoder.try_merge(17, 8));

    let entry = encoder.entry();
    assert_eq!(entry.method_index, 17);
    assert_eq!(entry.index_mask, 0x0011);
    assert_eq!(entry.bss_offset, 8);
    assert_eq!(entry.covered_indices(), vec![1, 5, 17]);
    assert_eq!(entry.bss_offset_for(1, 4), 0);
    assert_eq!(entry.bss_offset_for(5, 4), 4);
    assert_eq!(entry.bss_offset_for(17, 4), 8);
}

#[test]
fn index_delta_limit() {
    let mut encoder = encoder_at(0, 0);
    assert!(encoder.try_merge(16, 4));
    assert_eq!(encoder.entry().index_mask, 0x0001);

    let mut encoder = encoder_at(0, 0);
    assert!(!encoder.try_merge(17, 4));
}

#[test]
fn offset_must_follow_by_one_pointer() {
    for offset in [8, 11, 13, 16] {
        let mut encoder = encoder_at(3, 8);
        assert!(!encoder.try_merge(4, offset), "offset {offset}");
        assert_eq!(encoder.entry().bss_offset, 8);
    }

    let mut encoder = encoder_at(3, 8);
    assert!(encoder.try_merge(4, 12));

    let mut encoder = MethodBssMappingEncoder::new(PointerSize::K64);
    encoder.reset(3, 8);
    assert!(!encoder.try_merge(4, 12));
    assert!(encoder.try_merge(4, 16));
}

#[test]
fn member_shifted_out_of_window_blocks_merge() {
    let mut encoder = encoder_at(0, 0);
    assert!(encoder.try_merge(1, 4));
    assert_eq!(encoder.entry().index_mask, 0x8000);

    // 17 - 0 > 16: index 0 would leave the mask.
    assert!(!encoder.try_merge(17, 8));
    assert_eq!(encoder.entry().method_index, 1);

    assert!(encoder.try_merge(16, 8));
    let entry = encoder.entry();
    assert_eq!(entry.index_mask, 0x0003);
    assert_eq!(entry.covered_indices(), vec![0, 1, 16]);
}

#[test]
fn reset_clears_the_mask() {
    let mut encoder = encoder_at(0, 0);
    assert!(encoder.try_merge(1, 4));
    encoder.reset(30, 64);
    assert_eq!(
        encoder.entry(),
        MethodBssMappingEntry {
            method_index: 30,
            index_mask: 0,
            bss_offset: 64,
        }
    );
}

#[test]
#[should_panic(expected = "repeated")]
fn merging_the_anchor_again_panics() {
    let mut encoder = encoder_at(5, 0);
    encoder.try_merge(5, 4);
}

#[test]
#[should_panic(expected = "exceeds")]
fn index_beyond_sixteen_bits_panics() {
    let mut encoder = MethodBssMappingEncoder::new(PointerSize::K32);
    encoder.reset(0x1_0000, 0);
}
