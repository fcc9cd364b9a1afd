//! Method bss slots: layout and compression of the index -> slot mapping.
//!
//! Code that calls a method indirectly loads the target from a pointer-sized
//! slot in a zero-initialized data segment. [`layout_method_bss`] assigns the
//! slots; [`encode_method_bss_mapping`] compresses the resulting pairs into the
//! persisted [`MethodBssMappingEntry`] runs.

mod encoder;
mod layout;

#[cfg(test)]
mod encoder_tests;
#[cfg(test)]
mod layout_tests;

pub use encoder::MethodBssMappingEncoder;
pub use layout::{MethodBssLayout, encode_method_bss_mapping, layout_method_bss};

pub use oatlink_format::MethodBssMappingEntry;
