//! Compiled method descriptors consumed by the patcher.

use oatlink_core::MethodRef;

/// What a patch refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatchKind {
    /// PC-relative call to another method.
    CallRelative { target: MethodRef },
    /// Branch to a Baker read barrier thunk described by `custom_value`.
    BakerReadBarrierBranch { custom_value: u32 },
    /// Load of the bss slot holding `target`'s entry point.
    MethodBssEntry { target: MethodRef },
}

/// A location in method code that needs a value once layout is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LinkerPatch {
    /// Offset of the patched word from the start of the method code.
    pub literal_offset: u32,
    #[serde(flatten)]
    pub kind: PatchKind,
}

impl LinkerPatch {
    /// Bytes rewritten at `literal_offset`.
    pub const SIZE: u32 = 4;

    pub fn call_relative(literal_offset: u32, target: MethodRef) -> Self {
        Self {
            literal_offset,
            kind: PatchKind::CallRelative { target },
        }
    }

    pub fn baker_read_barrier_branch(literal_offset: u32, custom_value: u32) -> Self {
        Self {
            literal_offset,
            kind: PatchKind::BakerReadBarrierBranch { custom_value },
        }
    }

    pub fn method_bss_entry(literal_offset: u32, target: MethodRef) -> Self {
        Self {
            literal_offset,
            kind: PatchKind::MethodBssEntry { target },
        }
    }
}

/// Machine code of one method plus the patches it needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledMethod {
    code: Vec<u8>,
    patches: Vec<LinkerPatch>,
}

impl CompiledMethod {
    /// Patches are kept ordered by literal offset; equal offsets keep their order.
    pub fn new(code: Vec<u8>, mut patches: Vec<LinkerPatch>) -> Self {
        patches.sort_by_key(|p| p.literal_offset);
        Self { code, patches }
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn code_size(&self) -> u32 {
        self.code.len() as u32
    }

    pub fn patches(&self) -> &[LinkerPatch] {
        &self.patches
    }

    /// First patch whose word does not lie inside the code.
    pub fn find_out_of_bounds_patch(&self) -> Option<&LinkerPatch> {
        self.patches
            .iter()
            .find(|p| p.literal_offset as usize + LinkerPatch::SIZE as usize > self.code.len())
    }
}
