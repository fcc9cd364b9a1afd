//! Linked image header (32 bytes).
//!
//! Layout:
//! - 0-15: identity and size (magic, version, checksum, total_size)
//! - 16-27: section placement (code offset, code size, bss mapping offset)
//! - 28: pointer size in bytes
//! - 29-31: reserved
//!
//! Section order: Header → Code → BssMapping, each starting on a
//! `SECTION_ALIGN` boundary.

/// Magic bytes at the start of every image.
pub const MAGIC: [u8; 4] = *b"OATL";

/// Current image format version.
pub const VERSION: u32 = 1;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 32;

/// Alignment of every section start.
pub const SECTION_ALIGN: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u32,
    /// CRC32 of everything after the header.
    pub checksum: u32,
    pub total_size: u32,
    pub code_offset: u32,
    pub code_size: u32,
    pub bss_mapping_offset: u32,
    pub pointer_size: u8,
    pub _reserved: [u8; 3],
}

impl Default for Header {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            checksum: 0,
            total_size: 0,
            code_offset: 0,
            code_size: 0,
            bss_mapping_offset: 0,
            pointer_size: 8,
            _reserved: [0; 3],
        }
    }
}

impl Header {
    /// Decode header from the first 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= HEADER_SIZE, "header too short");

        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: u32_at(4),
            checksum: u32_at(8),
            total_size: u32_at(12),
            code_offset: u32_at(16),
            code_size: u32_at(20),
            bss_mapping_offset: u32_at(24),
            pointer_size: bytes[28],
            _reserved: [bytes[29], bytes[30], bytes[31]],
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.total_size.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.code_offset.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.code_size.to_le_bytes());
        bytes[24..28].copy_from_slice(&self.bss_mapping_offset.to_le_bytes());
        bytes[28] = self.pointer_size;
        bytes[29..32].copy_from_slice(&self._reserved);
        bytes
    }

    pub fn validate_magic(&self) -> bool {
        self.magic == MAGIC
    }

    pub fn validate_version(&self) -> bool {
        self.version == VERSION
    }
}
