use oatlink_core::invariants::wrong_variant;

use crate::baker::BakerReadBarrierData;
use crate::method::{LinkerPatch, PatchKind};
use crate::patcher::sign_extension_adjust;
use crate::thunk::{ThunkKey, ThunkType};
use crate::PatcherConfig;

use super::IsaStrategy;

/// Byte filling thunk bodies past their descriptor.
pub const TRAP_FILL: u8 = 0xDE;

/// Named targets with real branch ranges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsaKind {
    Thumb2,
    #[default]
    Arm64,
}

impl IsaKind {
    pub fn limits(self) -> IsaLimits {
        match self {
            IsaKind::Thumb2 => IsaLimits::thumb2(),
            IsaKind::Arm64 => IsaLimits::arm64(),
        }
    }

    pub fn config(self) -> PatcherConfig {
        match self {
            IsaKind::Thumb2 => PatcherConfig::thumb2(),
            IsaKind::Arm64 => PatcherConfig::arm64(),
        }
    }
}

impl std::str::FromStr for IsaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thumb2" => Ok(IsaKind::Thumb2),
            "arm64" => Ok(IsaKind::Arm64),
            other => Err(format!("unknown isa: {other} (expected thumb2 or arm64)")),
        }
    }
}

/// Branch ranges and thunk sizes of a target.
///
/// Calls use the unconditional branch-with-link range; Baker read barrier
/// thunks are reached by conditional branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IsaLimits {
    pub call_max_positive: u32,
    pub call_max_negative: u32,
    pub branch_max_positive: u32,
    pub branch_max_negative: u32,
    pub call_thunk_size: u32,
    pub baker_thunk_size: u32,
    /// Width of the sign-extended low half when call displacements are
    /// split into a high/low immediate pair.
    pub split_low_bits: Option<u32>,
}

impl IsaLimits {
    /// BL reaches +/-16MiB, B.cond +/-1MiB, both relative to PC + 4.
    pub fn thumb2() -> Self {
        Self {
            call_max_positive: (1 << 24) - 2 + 4,
            call_max_negative: (1 << 24) - 4,
            branch_max_positive: (1 << 20) - 2 + 4,
            branch_max_negative: (1 << 20) - 4,
            call_thunk_size: 8,
            baker_thunk_size: 32,
            split_low_bits: None,
        }
    }

    /// BL reaches +/-128MiB, B.cond +/-1MiB.
    pub fn arm64() -> Self {
        Self {
            call_max_positive: (1 << 27) - 4,
            call_max_negative: 1 << 27,
            branch_max_positive: (1 << 20) - 4,
            branch_max_negative: 1 << 20,
            call_thunk_size: 12,
            baker_thunk_size: 40,
            split_low_bits: None,
        }
    }

    /// Same reach in both directions for every thunk type.
    pub fn uniform(max_displacement: u32, thunk_size: u32) -> Self {
        Self {
            call_max_positive: max_displacement,
            call_max_negative: max_displacement,
            branch_max_positive: max_displacement,
            branch_max_negative: max_displacement,
            call_thunk_size: thunk_size,
            baker_thunk_size: thunk_size,
            split_low_bits: None,
        }
    }

    /// Encode calls as a high/low pair with a `bits`-wide low half.
    pub fn split_low_bits(mut self, bits: u32) -> Self {
        self.split_low_bits = Some(bits);
        self
    }
}

/// Strategy producing placeholder thunks with configurable reach.
///
/// A thunk body starts with the descriptor `[type, first, second, 0]` built
/// from the key, then trap fill up to the thunk size.
#[derive(Clone, Debug)]
pub struct SyntheticIsa {
    limits: IsaLimits,
}

impl SyntheticIsa {
    pub fn new(limits: IsaLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &IsaLimits {
        &self.limits
    }
}

impl From<IsaKind> for SyntheticIsa {
    fn from(kind: IsaKind) -> Self {
        Self::new(kind.limits())
    }
}

impl IsaStrategy for SyntheticIsa {
    fn baker_read_barrier_key(&self, patch: &LinkerPatch) -> ThunkKey {
        let PatchKind::BakerReadBarrierBranch { custom_value } = patch.kind else {
            wrong_variant("linker patch", "BakerReadBarrierBranch", &patch.kind);
        };
        match BakerReadBarrierData::decode(custom_value) {
            Some(data) => data.thunk_key(),
            None => wrong_variant("read barrier data", "a valid encoding", &custom_value),
        }
    }

    fn compile_thunk(&self, key: &ThunkKey) -> Vec<u8> {
        let size = match key.thunk_type() {
            ThunkType::MethodCall => self.limits.call_thunk_size,
            _ => self.limits.baker_thunk_size,
        };
        let raw = key.raw_params();
        let mut code = vec![key.thunk_type() as u8, raw.first as u8, raw.second as u8, 0];
        code.resize(code.len().max(size as usize), TRAP_FILL);
        code
    }

    fn max_positive_displacement(&self, thunk_type: ThunkType) -> u32 {
        match thunk_type {
            ThunkType::MethodCall => self.limits.call_max_positive,
            _ => self.limits.branch_max_positive,
        }
    }

    fn max_negative_displacement(&self, thunk_type: ThunkType) -> u32 {
        match thunk_type {
            ThunkType::MethodCall => self.limits.call_max_negative,
            _ => self.limits.branch_max_negative,
        }
    }

    fn encode_call_displacement(&self, displacement: u32) -> u32 {
        match self.limits.split_low_bits {
            Some(bits) => sign_extension_adjust(displacement, bits),
            None => displacement,
        }
    }
}
