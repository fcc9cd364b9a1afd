//! Persisted formats produced by the oatlink linker.
//!
//! This crate contains:
//! - The compressed method bss mapping (entries, table codec, lookup view)
//! - The linked image container (header, sections, validation)
//! - A human-readable dump of both

mod bss_mapping;
mod dump;
mod error;
mod header;
mod image;

#[cfg(test)]
mod bss_mapping_tests;
#[cfg(test)]
mod image_tests;

pub use bss_mapping::{
    ENTRY_SIZE, MAX_INDEX_DELTA, MethodBssMappingEntry, MethodBssMappingView, encode_bss_mapping,
};
pub use dump::{dump, dump_bss_mapping};
pub use error::FormatError;
pub use header::{HEADER_SIZE, Header, MAGIC, SECTION_ALIGN, VERSION};
pub use image::{Image, emit_image};
