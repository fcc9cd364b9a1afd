//! Serialized description of a link batch.
//!
//! ```json
//! {
//!   "isa": "thumb2",
//!   "pointer_size": 4,
//!   "methods": [
//!     {
//!       "method": { "dex_file": 0, "method_index": 1 },
//!       "code_size": 64,
//!       "patches": [
//!         { "literal_offset": 8, "kind": "call_relative",
//!           "target": { "dex_file": 0, "method_index": 2 } }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use oatlink_core::{MethodRef, PointerSize};

use crate::isa::{IsaKind, SyntheticIsa};
use crate::method::{CompiledMethod, LinkerPatch, PatchKind};
use crate::PatcherConfig;

/// Methods to link, in placement order, plus the context they link against.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LinkPlan {
    #[serde(default)]
    pub isa: IsaKind,
    #[serde(default)]
    pub pointer_size: PointerSize,
    /// Offset of the first byte of linked code.
    #[serde(default)]
    pub base_offset: u32,
    pub methods: Vec<PlannedMethod>,
    /// Methods linked earlier, by entry offset.
    #[serde(default)]
    pub external_methods: Vec<ExternalMethod>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlannedMethod {
    pub method: MethodRef,
    #[serde(default)]
    pub code: Vec<u8>,
    /// Zero-extends `code` to this many bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_size: Option<u32>,
    #[serde(default)]
    pub patches: Vec<LinkerPatch>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExternalMethod {
    pub method: MethodRef,
    pub offset: u32,
}

impl PlannedMethod {
    pub fn compile(&self) -> CompiledMethod {
        let mut code = self.code.clone();
        if let Some(size) = self.code_size
            && code.len() < size as usize
        {
            code.resize(size as usize, 0);
        }
        CompiledMethod::new(code, self.patches.clone())
    }
}

impl LinkPlan {
    pub fn compiled_methods(&self) -> Vec<(MethodRef, CompiledMethod)> {
        self.methods.iter().map(|m| (m.method, m.compile())).collect()
    }

    pub fn external_offsets(&self) -> BTreeMap<MethodRef, u32> {
        self.external_methods
            .iter()
            .map(|e| (e.method, e.offset))
            .collect()
    }

    /// Every method referenced through a bss entry patch.
    pub fn bss_targets(&self) -> impl Iterator<Item = MethodRef> + '_ {
        self.methods
            .iter()
            .flat_map(|m| &m.patches)
            .filter_map(|p| match p.kind {
                PatchKind::MethodBssEntry { target } => Some(target),
                _ => None,
            })
    }

    /// Patcher defaults for the plan's target.
    pub fn config(&self) -> PatcherConfig {
        self.isa.config()
    }

    pub fn synthetic_isa(&self) -> SyntheticIsa {
        SyntheticIsa::from(self.isa)
    }
}
