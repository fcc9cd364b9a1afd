use std::collections::BTreeMap;

use oatlink_core::{DexFileId, PointerSize};

use super::bss_mapping::MethodBssMappingEntry;
use super::image::{Image, emit_image};
use crate::{FormatError, HEADER_SIZE};

fn sample() -> Vec<u8> {
    let entries = vec![MethodBssMappingEntry {
        method_index: 17,
        index_mask: 0x0011,
        bss_offset: 8,
    }];
    emit_image(&[0xAA; 20], &BTreeMap::from([(DexFileId(0), entries)]), PointerSize::K32)
}

#[test]
fn emitted_layout() {
    let bytes = sample();
    // header 32 + code 20 padded to 32 + mappings 4 + 4 + 12 padded to 32
    assert_eq!(bytes.len(), 96);

    let image = Image::from_bytes(bytes).unwrap();
    let h = image.header();
    assert_eq!(h.code_offset, 32);
    assert_eq!(h.code_size, 20);
    assert_eq!(h.bss_mapping_offset, 64);
    assert_eq!(image.code(), &[0xAA; 20]);
    assert_eq!(image.pointer_size(), Ok(PointerSize::K32));

    let tables = image.bss_mappings().unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].0, DexFileId(0));
    assert_eq!(tables[0].1.len(), 1);

    let view = image.bss_mapping(DexFileId(0)).unwrap().unwrap();
    assert_eq!(view.bss_offset(5, 4), Some(4));
    assert!(image.bss_mapping(DexFileId(1)).unwrap().is_none());
}

#[test]
fn tables_per_dex_file() {
    let entry = |method_index, bss_offset| MethodBssMappingEntry {
        method_index,
        index_mask: 0,
        bss_offset,
    };
    let tables = BTreeMap::from([
        (DexFileId(3), vec![entry(1, 16)]),
        (DexFileId(0), vec![entry(2, 0), entry(9, 8)]),
    ]);
    let image = Image::from_bytes(emit_image(&[0; 4], &tables, PointerSize::K64)).unwrap();

    let parsed = image.bss_mappings().unwrap();
    let ids: Vec<_> = parsed.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![DexFileId(0), DexFileId(3)]);
    assert_eq!(parsed[0].1.bss_offset(9, 8), Some(8));
    assert_eq!(parsed[1].1.bss_offset(1, 8), Some(16));
    assert_eq!(parsed[1].1.bss_offset(2, 8), None);
}

#[test]
fn rejects_dex_files_out_of_order() {
    let mut bytes = sample();
    // Claim a second table; the zero padding reads as dex 0 again.
    bytes[64] = 2;
    refresh_checksum(&mut bytes);
    assert!(matches!(
        Image::from_bytes(bytes).unwrap_err(),
        FormatError::UnsortedDexFiles(0)
    ));
}

#[test]
fn rejects_truncated_mappings() {
    let mut bytes = sample();
    // Entry count of the dex 0 table.
    bytes[72] = 5;
    refresh_checksum(&mut bytes);
    assert!(matches!(
        Image::from_bytes(bytes).unwrap_err(),
        FormatError::Truncated {
            section: "bss mapping",
            ..
        }
    ));
}

fn refresh_checksum(bytes: &mut [u8]) {
    let checksum = crc32fast::hash(&bytes[HEADER_SIZE..]);
    bytes[8..12].copy_from_slice(&checksum.to_le_bytes());
}

#[test]
fn empty_image() {
    let bytes = emit_image(&[], &BTreeMap::new(), PointerSize::K64);
    assert_eq!(bytes.len(), HEADER_SIZE + 16);
    let image = Image::from_bytes(bytes).unwrap();
    assert!(image.code().is_empty());
    assert!(image.bss_mappings().unwrap().is_empty());
}

#[test]
fn rejects_short_file() {
    let err = Image::from_bytes(vec![0; 10]).unwrap_err();
    assert!(matches!(err, FormatError::FileTooSmall(10)));
}

#[test]
fn rejects_bad_magic() {
    let mut bytes = sample();
    bytes[0] = b'X';
    assert!(matches!(
        Image::from_bytes(bytes).unwrap_err(),
        FormatError::InvalidMagic
    ));
}

#[test]
fn rejects_bad_version() {
    let mut bytes = sample();
    bytes[4] = 9;
    assert!(matches!(
        Image::from_bytes(bytes).unwrap_err(),
        FormatError::UnsupportedVersion(9)
    ));
}

#[test]
fn rejects_size_mismatch() {
    let mut bytes = sample();
    bytes.extend_from_slice(&[0; 16]);
    assert!(matches!(
        Image::from_bytes(bytes).unwrap_err(),
        FormatError::SizeMismatch {
            header: 96,
            actual: 112
        }
    ));
}

#[test]
fn rejects_corrupted_payload() {
    let mut bytes = sample();
    bytes[40] ^= 0xFF;
    let err = Image::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, FormatError::ChecksumMismatch { .. }));
}

#[test]
fn from_path_reports_missing_file() {
    let err = Image::from_path("/nonexistent/oatlink/image.oat").unwrap_err();
    assert!(matches!(err, FormatError::Io(_)));
}

#[test]
fn error_display() {
    assert_eq!(
        FormatError::InvalidMagic.to_string(),
        "invalid magic: expected OATL"
    );
    assert!(FormatError::UnsupportedVersion(99).to_string().contains("99"));
    let err = FormatError::SizeMismatch {
        header: 100,
        actual: 50,
    };
    assert!(err.to_string().contains("100"));
    assert!(err.to_string().contains("50"));
}
