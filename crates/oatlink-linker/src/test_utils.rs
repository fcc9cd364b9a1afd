//! Fixture builders shared by the linker tests.

use std::collections::BTreeMap;

use oatlink_core::{DexFileId, MethodRef};

use crate::baker::BakerReadBarrierData;
use crate::isa::{IsaLimits, SyntheticIsa};
use crate::method::{CompiledMethod, LinkerPatch};
use crate::patcher::ThunkPatcher;
use crate::PatcherConfig;

/// Thunk size used by [`test_isa`].
pub const THUNK_SIZE: u32 = 8;

/// Method `idx` of dex file 0.
pub fn m(idx: u32) -> MethodRef {
    MethodRef::new(DexFileId(0), idx)
}

/// 4-byte alignment, 8-byte headers, no entry delta.
pub fn test_config() -> PatcherConfig {
    PatcherConfig::new()
        .code_alignment(4)
        .method_header_size(8)
        .code_delta(0)
}

/// Same reach in both directions for every thunk, 8-byte thunks.
pub fn test_isa(reach: u32) -> SyntheticIsa {
    SyntheticIsa::new(IsaLimits::uniform(reach, THUNK_SIZE))
}

pub fn test_patcher(reach: u32) -> ThunkPatcher<SyntheticIsa> {
    ThunkPatcher::new(test_isa(reach), test_config())
}

/// Code of `size` bytes filled with 0xAA.
pub fn method(size: usize, patches: Vec<LinkerPatch>) -> CompiledMethod {
    CompiledMethod::new(vec![0xAA; size], patches)
}

pub fn call(literal_offset: u32, target: u32) -> LinkerPatch {
    LinkerPatch::call_relative(literal_offset, m(target))
}

pub fn field_barrier(literal_offset: u32, base_reg: u32, holder_reg: u32) -> LinkerPatch {
    LinkerPatch::baker_read_barrier_branch(
        literal_offset,
        BakerReadBarrierData::field(base_reg, holder_reg).encode(),
    )
}

pub fn root_barrier(literal_offset: u32, root_reg: u32) -> LinkerPatch {
    LinkerPatch::baker_read_barrier_branch(
        literal_offset,
        BakerReadBarrierData::gc_root(root_reg).encode(),
    )
}

pub fn no_methods() -> BTreeMap<MethodRef, u32> {
    BTreeMap::new()
}

/// Little-endian word at `at`.
pub fn word_at(bytes: &[u8], at: u32) -> u32 {
    let at = at as usize;
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
