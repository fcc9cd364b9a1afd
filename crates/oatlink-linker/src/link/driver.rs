use std::collections::BTreeMap;

use indexmap::IndexMap;
use oatlink_core::{DexFileId, MethodRef, PointerSize};
use oatlink_format::{MethodBssMappingEntry, emit_image};
use tracing::{debug, trace};

use crate::baker::BakerReadBarrierData;
use crate::bss::MethodBssLayout;
use crate::error::LinkError;
use crate::isa::IsaStrategy;
use crate::method::{CompiledMethod, PatchKind};
use crate::patcher::{MethodPlacement, PatcherStats, ThunkPatcher, ThunkPlacement};
use crate::provider::MethodOffsetProvider;
use crate::PatcherConfig;

use super::plan::LinkPlan;

/// Output of a successful link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedCode {
    /// Offset of `code[0]`.
    pub base_offset: u32,
    pub code: Vec<u8>,
    /// Placements in plan order.
    pub methods: IndexMap<MethodRef, MethodPlacement>,
    pub thunks: Vec<ThunkPlacement>,
    pub bss_slots: BTreeMap<MethodRef, u32>,
    pub bss_mappings: BTreeMap<DexFileId, Vec<MethodBssMappingEntry>>,
    pub stats: PatcherStats,
    pub pointer_size: PointerSize,
}

impl LinkedCode {
    /// Offset one past the last byte of linked code.
    pub fn end_offset(&self) -> u32 {
        self.base_offset + self.code.len() as u32
    }

    /// Serialize as an image file.
    pub fn to_image(&self) -> Vec<u8> {
        emit_image(&self.code, &self.bss_mappings, self.pointer_size)
    }
}

/// Link `plan`, resolving calls outside the batch through its external methods.
pub fn link<I: IsaStrategy>(
    plan: &LinkPlan,
    isa: I,
    config: PatcherConfig,
) -> Result<LinkedCode, LinkError> {
    link_with_provider(plan, isa, config, &plan.external_offsets())
}

/// Link `plan`, resolving calls outside the batch through `provider`.
///
/// Output bytes are only handed back on success.
pub fn link_with_provider<I: IsaStrategy>(
    plan: &LinkPlan,
    isa: I,
    config: PatcherConfig,
    provider: &impl MethodOffsetProvider,
) -> Result<LinkedCode, LinkError> {
    config.validate()?;
    let methods = plan.compiled_methods();
    for (method_ref, method) in &methods {
        validate_method(*method_ref, method)?;
    }
    let bss = MethodBssLayout::new(plan.bss_targets(), plan.pointer_size)?;

    let mut patcher = ThunkPatcher::new(isa, config);
    let mut placements = Vec::with_capacity(methods.len());
    let mut offset = plan.base_offset;
    for (method_ref, method) in &methods {
        let placement = patcher.reserve_space(offset, method, *method_ref, provider)?;
        offset = placement.end_offset;
        placements.push(placement);
    }
    let end = patcher.reserve_space_end(offset, provider)?;
    debug!(
        methods = methods.len(),
        start = plan.base_offset,
        end,
        "reservation pass done"
    );

    let mut out = Vec::with_capacity((end - plan.base_offset) as usize);
    let mut offset = plan.base_offset;
    for ((method_ref, method), placement) in methods.iter().zip(&placements) {
        offset = patcher.write_thunks(&mut out, offset)?;
        let padding = placement
            .header_offset
            .checked_sub(offset)
            .ok_or(LinkError::OutOfOrderWrite {
                expected: placement.header_offset,
                actual: offset,
            })?;
        patcher.write_code_alignment(&mut out, padding)?;
        write_method_header(&mut out, patcher.config().header_size(), method.code_size());

        let code = patch_method(&patcher, *method_ref, method, placement, &bss, provider)?;
        out.extend_from_slice(&code);
        offset = placement.end_offset;
        patcher.advance_to(offset)?;
        debug_assert_eq!(plan.base_offset + out.len() as u32, offset);
    }
    let written_end = patcher.write_thunks(&mut out, offset)?;
    debug_assert_eq!(written_end, end);

    let stats = patcher.finish()?;
    debug!(size = out.len(), ?stats, "write pass done");
    Ok(LinkedCode {
        base_offset: plan.base_offset,
        code: out,
        methods: patcher.methods().clone(),
        thunks: patcher.thunk_placements(),
        bss_slots: bss.slots,
        bss_mappings: bss.mappings,
        stats,
        pointer_size: plan.pointer_size,
    })
}

fn validate_method(method_ref: MethodRef, method: &CompiledMethod) -> Result<(), LinkError> {
    if let Some(patch) = method.find_out_of_bounds_patch() {
        return Err(LinkError::PatchOutOfBounds {
            method: method_ref,
            literal_offset: patch.literal_offset,
            code_size: method.code().len(),
        });
    }
    for patch in method.patches() {
        if let PatchKind::BakerReadBarrierBranch { custom_value } = patch.kind
            && BakerReadBarrierData::decode(custom_value).is_none()
        {
            return Err(LinkError::InvalidBakerData {
                method: method_ref,
                custom_value,
            });
        }
    }
    Ok(())
}

/// Zeroed header with the code size in its last word.
fn write_method_header(out: &mut Vec<u8>, header_size: u32, code_size: u32) {
    let start = out.len();
    out.resize(start + header_size as usize, 0);
    if header_size >= 4 {
        let end = out.len();
        out[end - 4..].copy_from_slice(&code_size.to_le_bytes());
    }
}

/// Copy of the method code with every patch resolved.
///
/// Patched words are written little-endian: call and read barrier patches get
/// their branch displacement, bss entry patches the slot offset.
fn patch_method<I: IsaStrategy>(
    patcher: &ThunkPatcher<I>,
    method_ref: MethodRef,
    method: &CompiledMethod,
    placement: &MethodPlacement,
    bss: &MethodBssLayout,
    provider: &impl MethodOffsetProvider,
) -> Result<Vec<u8>, LinkError> {
    let mut code = method.code().to_vec();
    for patch in method.patches() {
        let patch_offset = placement.code_offset + patch.literal_offset;
        let value = match patch.kind {
            PatchKind::CallRelative { target } => {
                let entry = patcher
                    .find_method_offset(target, provider)
                    .ok_or(LinkError::UnresolvedCallTarget {
                        patch_offset,
                        target,
                    })?;
                let target_offset = entry.saturating_sub(patcher.config().delta());
                let displacement =
                    patcher.calculate_method_call_displacement(patch_offset, target_offset)?;
                patcher.isa().encode_call_displacement(displacement)
            }
            PatchKind::BakerReadBarrierBranch { .. } => {
                let key = patcher.baker_read_barrier_key(patch);
                patcher
                    .thunk_target_offset(&key, patch_offset)?
                    .wrapping_sub(patch_offset)
            }
            PatchKind::MethodBssEntry { target } => match bss.slot(target) {
                Some(slot) => slot,
                None => return Err(LinkError::BssIndexTooLarge(target)),
            },
        };
        trace!(method = %method_ref, patch_offset, value, "patched");
        let at = patch.literal_offset as usize;
        code[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
    Ok(code)
}
