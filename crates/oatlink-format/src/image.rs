//! Linked image container.
//!
//! Section order: Header → Code → BssMappings. Each section starts on a
//! [`SECTION_ALIGN`] boundary and the file is padded to one as well.
//!
//! The bss mappings section holds one table per dex file:
//! `dex_count (u32)`, then for every dex file in increasing id order
//! `dex_file (u16) | reserved (u16)` followed by its count-prefixed table.

use std::collections::BTreeMap;
use std::path::Path;

use oatlink_core::{DexFileId, PointerSize};

use crate::bss_mapping::{MethodBssMappingEntry, MethodBssMappingView, encode_bss_mapping};
use crate::header::{HEADER_SIZE, Header, SECTION_ALIGN};
use crate::FormatError;

/// A validated linked image.
#[derive(Debug)]
pub struct Image {
    bytes: Vec<u8>,
    header: Header,
}

impl Image {
    /// Load an image from owned bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FormatError::FileTooSmall(bytes.len()));
        }

        let header = Header::from_bytes(&bytes[..HEADER_SIZE]);

        if !header.validate_magic() {
            return Err(FormatError::InvalidMagic);
        }
        if !header.validate_version() {
            return Err(FormatError::UnsupportedVersion(header.version));
        }
        if header.total_size as usize != bytes.len() {
            return Err(FormatError::SizeMismatch {
                header: header.total_size,
                actual: bytes.len(),
            });
        }

        let actual = crc32fast::hash(&bytes[HEADER_SIZE..]);
        if actual != header.checksum {
            return Err(FormatError::ChecksumMismatch {
                header: header.checksum,
                actual,
            });
        }

        let code_end = header.code_offset as usize + header.code_size as usize;
        if code_end > bytes.len() {
            return Err(FormatError::Truncated {
                section: "code",
                needed: code_end,
                available: bytes.len(),
            });
        }
        let bss_start = header.bss_mapping_offset as usize;
        if bss_start > bytes.len() {
            return Err(FormatError::Truncated {
                section: "bss mapping",
                needed: bss_start,
                available: bytes.len(),
            });
        }

        let image = Self { bytes, header };
        image.bss_mappings()?;
        Ok(image)
    }

    /// Load an image from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn code(&self) -> &[u8] {
        let start = self.header.code_offset as usize;
        &self.bytes[start..start + self.header.code_size as usize]
    }

    pub fn pointer_size(&self) -> Result<PointerSize, String> {
        PointerSize::try_from(self.header.pointer_size as u32)
    }

    /// Per-dex bss mapping tables, in increasing dex file order.
    pub fn bss_mappings(&self) -> Result<Vec<(DexFileId, MethodBssMappingView<'_>)>, FormatError> {
        let mut rest = &self.bytes[self.header.bss_mapping_offset as usize..];
        let dex_count = read_u32(rest)? as usize;
        rest = &rest[4..];

        let mut tables: Vec<(DexFileId, MethodBssMappingView<'_>)> =
            Vec::with_capacity(dex_count.min(rest.len() / 8));
        for _ in 0..dex_count {
            let dex_file = DexFileId(read_u32(rest)? as u16);
            if let Some((prev, _)) = tables.last()
                && *prev >= dex_file
            {
                return Err(FormatError::UnsortedDexFiles(dex_file.0));
            }
            let view = MethodBssMappingView::from_bytes(&rest[4..])?;
            rest = &rest[4 + view.byte_len()..];
            tables.push((dex_file, view));
        }
        Ok(tables)
    }

    /// The bss mapping table of one dex file, if the image has one.
    pub fn bss_mapping(
        &self,
        dex_file: DexFileId,
    ) -> Result<Option<MethodBssMappingView<'_>>, FormatError> {
        Ok(self
            .bss_mappings()?
            .into_iter()
            .find_map(|(id, view)| (id == dex_file).then_some(view)))
    }
}

/// Assemble an image from linked code and per-dex method bss mappings.
pub fn emit_image(
    code: &[u8],
    bss_mappings: &BTreeMap<DexFileId, Vec<MethodBssMappingEntry>>,
    pointer_size: PointerSize,
) -> Vec<u8> {
    let mut output = vec![0u8; HEADER_SIZE];

    let code_offset = output.len() as u32;
    emit_section(&mut output, code);
    let bss_mapping_offset = output.len() as u32;
    emit_section(&mut output, &encode_bss_mappings(bss_mappings));

    let mut header = Header {
        total_size: output.len() as u32,
        code_offset,
        code_size: code.len() as u32,
        bss_mapping_offset,
        pointer_size: pointer_size.bytes() as u8,
        ..Default::default()
    };
    header.checksum = crc32fast::hash(&output[HEADER_SIZE..]);
    output[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    output
}

fn encode_bss_mappings(bss_mappings: &BTreeMap<DexFileId, Vec<MethodBssMappingEntry>>) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(bss_mappings.len() as u32).to_le_bytes());
    for (dex_file, entries) in bss_mappings {
        bytes.extend_from_slice(&(dex_file.0 as u32).to_le_bytes());
        bytes.extend_from_slice(&encode_bss_mapping(entries));
    }
    bytes
}

fn read_u32(bytes: &[u8]) -> Result<u32, FormatError> {
    match bytes {
        [a, b, c, d, ..] => Ok(u32::from_le_bytes([*a, *b, *c, *d])),
        _ => Err(FormatError::Truncated {
            section: "bss mapping",
            needed: 4,
            available: bytes.len(),
        }),
    }
}

fn emit_section(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(data);
    pad_to_section(out);
}

fn pad_to_section(buf: &mut Vec<u8>) {
    let rem = buf.len() % SECTION_ALIGN;
    if rem != 0 {
        buf.resize(buf.len() + SECTION_ALIGN - rem, 0);
    }
}
