#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core identifiers shared by the oatlink crates.
//!
//! Methods are addressed the way the runtime addresses them: a dex file plus a
//! method index inside that file. Everything that crosses a crate boundary
//! (the linker, the persisted bss mapping, the CLI plans) uses these types.

pub mod colors;
pub mod invariants;
pub mod utils;


pub use colors::Colors;
pub use utils::{checked_align_up, round_down};

// ============================================================================
// Sentinels
// ============================================================================

/// "No index" marker for 16-bit dex indices.
pub const NO_INDEX16: u16 = u16::MAX;

// ============================================================================
// Method references
// ============================================================================

/// Identifies one dex file within a link session.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct DexFileId(pub u16);

impl DexFileId {
    pub fn get(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for DexFileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dex{}", self.0)
    }
}

/// A method, named by its dex file and its index in that file's method table.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct MethodRef {
    pub dex_file: DexFileId,
    pub method_index: u32,
}

impl MethodRef {
    pub fn new(dex_file: DexFileId, method_index: u32) -> Self {
        Self {
            dex_file,
            method_index,
        }
    }
}

impl std::fmt::Display for MethodRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.dex_file, self.method_index)
    }
}

// ============================================================================
// Pointer size
// ============================================================================

/// Width of a pointer in the target image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PointerSize {
    K32,
    #[default]
    K64,
}

impl PointerSize {
    /// Size in bytes.
    pub const fn bytes(self) -> u32 {
        match self {
            PointerSize::K32 => 4,
            PointerSize::K64 => 8,
        }
    }
}

impl TryFrom<u32> for PointerSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(PointerSize::K32),
            8 => Ok(PointerSize::K64),
            other => Err(format!("unsupported pointer size: {other} (expected 4 or 8)")),
        }
    }
}

impl From<PointerSize> for u32 {
    fn from(value: PointerSize) -> Self {
        value.bytes()
    }
}
