use std::io;

use crate::VERSION;

/// Errors raised while decoding persisted records.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("invalid magic: expected OATL")]
    InvalidMagic,
    #[error("unsupported version: {0} (expected {VERSION})")]
    UnsupportedVersion(u32),
    #[error("file too small: {0} bytes (minimum 32)")]
    FileTooSmall(usize),
    #[error("size mismatch: header says {header} bytes, got {actual}")]
    SizeMismatch { header: u32, actual: usize },
    #[error("checksum mismatch: header says {header:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { header: u32, actual: u32 },
    #[error("truncated {section} section: needs {needed} bytes, {available} available")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("bss mapping entry {0} does not increase the method index")]
    UnsortedBssMapping(usize),
    #[error("bss mapping for dex file {0} is out of order")]
    UnsortedDexFiles(u16),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
