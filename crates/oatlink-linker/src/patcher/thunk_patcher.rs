use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, VecDeque};
use std::io::Write;

use indexmap::IndexMap;
use oatlink_core::{MethodRef, checked_align_up, round_down};
use tracing::{debug, trace};

use crate::config::PatcherConfig;
use crate::error::LinkError;
use crate::isa::IsaStrategy;
use crate::method::{CompiledMethod, LinkerPatch, PatchKind};
use crate::provider::MethodOffsetProvider;
use crate::thunk::{ThunkData, ThunkId, ThunkKey, ThunkType};

use super::displacement::displacement_in_range;

/// Life cycle of a patch session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Reserving,
    ReservationDone,
    Writing,
    Done,
}

/// Where a reserved method landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct MethodPlacement {
    /// First byte of the method header.
    pub header_offset: u32,
    pub code_offset: u32,
    /// Code offset plus the code delta.
    pub entry_offset: u32,
    /// One past the last code byte.
    pub end_offset: u32,
}

/// One reserved copy of a thunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ThunkPlacement {
    pub key: ThunkKey,
    pub offset: u32,
    pub size: u32,
}

/// Bytes written by the patcher, by purpose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PatcherStats {
    pub code_alignment_bytes: u32,
    pub call_thunk_bytes: u32,
    pub misc_thunk_bytes: u32,
}

/// A call whose target was not known to be reachable when it was seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnprocessedMethodCallPatch {
    pub patch_offset: u32,
    pub target: MethodRef,
}

/// Places shared thunks so that every relative call and read barrier branch
/// reaches its destination.
///
/// Thunk records live in an arena indexed by [`ThunkId`]; the key map, the
/// unreserved worklist and the pending heap hold ids. The pending heap orders
/// by `(pending offset, key)`, so write order never depends on insertion.
pub struct ThunkPatcher<I> {
    isa: I,
    config: PatcherConfig,
    phase: Phase,
    thunks: Vec<ThunkData>,
    thunk_ids: BTreeMap<ThunkKey, ThunkId>,
    method_call_thunk: Option<ThunkId>,
    unprocessed_calls: VecDeque<UnprocessedMethodCallPatch>,
    /// First call site of every call target, in patch order.
    call_targets: IndexMap<MethodRef, u32>,
    /// Thunks still needing a copy, by ascending deadline.
    unreserved: VecDeque<ThunkId>,
    pending: BinaryHeap<Reverse<(u32, ThunkKey, ThunkId)>>,
    methods: IndexMap<MethodRef, MethodPlacement>,
    reserve_cursor: u32,
    write_cursor: u32,
    stats: PatcherStats,
}

impl<I: IsaStrategy> ThunkPatcher<I> {
    pub fn new(isa: I, config: PatcherConfig) -> Self {
        Self {
            isa,
            config,
            phase: Phase::Reserving,
            thunks: Vec::new(),
            thunk_ids: BTreeMap::new(),
            method_call_thunk: None,
            unprocessed_calls: VecDeque::new(),
            call_targets: IndexMap::new(),
            unreserved: VecDeque::new(),
            pending: BinaryHeap::new(),
            methods: IndexMap::new(),
            reserve_cursor: 0,
            write_cursor: 0,
            stats: PatcherStats::default(),
        }
    }

    pub fn isa(&self) -> &I {
        &self.isa
    }

    pub fn config(&self) -> &PatcherConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> PatcherStats {
        self.stats
    }

    pub fn method_placement(&self, method: MethodRef) -> Option<MethodPlacement> {
        self.methods.get(&method).copied()
    }

    /// Reserved methods, in reservation order.
    pub fn methods(&self) -> &IndexMap<MethodRef, MethodPlacement> {
        &self.methods
    }

    pub fn thunk(&self, key: &ThunkKey) -> Option<&ThunkData> {
        self.thunk_ids.get(key).map(|id| &self.thunks[id.index()])
    }

    /// Thunks still waiting for a copy, earliest deadline first.
    pub fn unreserved(&self) -> impl Iterator<Item = &ThunkData> + '_ {
        self.unreserved.iter().map(|id| &self.thunks[id.index()])
    }

    pub fn unprocessed_calls(&self) -> impl Iterator<Item = &UnprocessedMethodCallPatch> + '_ {
        self.unprocessed_calls.iter()
    }

    /// Every reserved thunk copy, by offset.
    pub fn thunk_placements(&self) -> Vec<ThunkPlacement> {
        let mut placements: Vec<ThunkPlacement> = self
            .thunks
            .iter()
            .flat_map(|data| {
                data.offsets().iter().map(|&offset| ThunkPlacement {
                    key: *data.key(),
                    offset,
                    size: data.code_size(),
                })
            })
            .collect();
        placements.sort_by_key(|p| (p.offset, p.key));
        placements
    }

    /// Entry offset of a method, from this session or from `provider`.
    pub fn find_method_offset(
        &self,
        method: MethodRef,
        provider: &impl MethodOffsetProvider,
    ) -> Option<u32> {
        self.methods
            .get(&method)
            .map(|p| p.entry_offset)
            .or_else(|| provider.find_method_offset(method))
    }

    // ========================================================================
    // Reservation
    // ========================================================================

    /// Reserve space for `method` starting at `offset`.
    ///
    /// Thunks whose deadline would pass inside this method are reserved first,
    /// so the returned placement may start later than `offset`.
    pub fn reserve_space(
        &mut self,
        offset: u32,
        method: &CompiledMethod,
        method_ref: MethodRef,
        provider: &impl MethodOffsetProvider,
    ) -> Result<MethodPlacement, LinkError> {
        self.expect_phase("reserve_space", &[Phase::Reserving])?;
        if self.methods.contains_key(&method_ref) {
            return Err(LinkError::MethodReservedTwice(method_ref));
        }
        if offset < self.reserve_cursor {
            return Err(LinkError::OffsetWentBackwards {
                offset,
                minimum: self.reserve_cursor,
            });
        }

        let code_size = method.code_size();
        let mut offset = offset;
        let (code_offset, next_aligned_offset) = loop {
            let (code_offset, next_aligned_offset) = self
                .method_span(offset, code_size)
                .ok_or(LinkError::MethodOffsetOverflow {
                    method: method_ref,
                    offset,
                })?;
            if !self.front_deadline_before(next_aligned_offset) {
                break (code_offset, next_aligned_offset);
            }

            let mut thunk = self.unreserved[0];
            if Some(thunk) == self.method_call_thunk {
                self.resolve_method_calls(code_offset, Some(method_ref), provider);
                if !self.front_deadline_before(next_aligned_offset) {
                    break (code_offset, next_aligned_offset);
                }
                thunk = self.unreserved[0];
            }

            self.unreserved.pop_front();
            offset = self.reserve_thunk(thunk, offset)?;
            if Some(thunk) == self.method_call_thunk {
                // Every queued call reaches this copy.
                self.unprocessed_calls.clear();
            }
        };

        let entry_offset = code_offset
            .checked_add(self.config.code_delta)
            .ok_or(LinkError::MethodOffsetOverflow {
                method: method_ref,
                offset,
            })?;

        self.process_patches(method, code_offset);
        if let Some(&front) = self.unreserved.front() {
            let deadline = self.thunks[front.index()].max_next_offset();
            if deadline < next_aligned_offset {
                return Err(LinkError::MethodTooLarge {
                    method: method_ref,
                    deadline,
                    method_end: next_aligned_offset,
                });
            }
        }

        let placement = MethodPlacement {
            header_offset: code_offset - self.config.method_header_size,
            code_offset,
            entry_offset,
            end_offset: code_offset + code_size,
        };
        trace!(method = %method_ref, code_offset, "reserved method");
        self.methods.insert(method_ref, placement);
        self.reserve_cursor = placement.end_offset;
        Ok(placement)
    }

    /// Reserve every thunk still needed after the last method.
    ///
    /// Returns the offset past the trailing thunks. Fails if a call targets a
    /// method neither this session nor `provider` knows.
    pub fn reserve_space_end(
        &mut self,
        offset: u32,
        provider: &impl MethodOffsetProvider,
    ) -> Result<u32, LinkError> {
        self.expect_phase("reserve_space_end", &[Phase::Reserving])?;
        if offset < self.reserve_cursor {
            return Err(LinkError::OffsetWentBackwards {
                offset,
                minimum: self.reserve_cursor,
            });
        }

        if !self.unprocessed_calls.is_empty() {
            self.resolve_method_calls(offset, None, provider);
        }
        for (&target, &patch_offset) in &self.call_targets {
            if self.find_method_offset(target, provider).is_none() {
                return Err(LinkError::UnresolvedCallTarget {
                    patch_offset,
                    target,
                });
            }
        }

        let mut offset = offset;
        while let Some(thunk) = self.unreserved.pop_front() {
            offset = self.reserve_thunk(thunk, offset)?;
        }
        self.unprocessed_calls.clear();
        self.phase = Phase::ReservationDone;
        debug!(end = offset, thunks = self.thunks.len(), "reservation done");
        Ok(offset)
    }

    fn front_deadline_before(&self, offset: u32) -> bool {
        self.unreserved
            .front()
            .is_some_and(|id| self.thunks[id.index()].max_next_offset() < offset)
    }

    /// Code offset and aligned end of a method whose header starts at or
    /// after `offset`.
    fn method_span(&self, offset: u32, code_size: u32) -> Option<(u32, u32)> {
        let header_end = offset.checked_add(self.config.method_header_size)?;
        let code_offset = self.checked_align(header_end)?;
        let next_aligned_offset = self.checked_align(code_offset.checked_add(code_size)?)?;
        Some((code_offset, next_aligned_offset))
    }

    /// Reserve a copy of `thunk` at the first aligned offset from `offset`.
    fn reserve_thunk(&mut self, thunk: ThunkId, offset: u32) -> Result<u32, LinkError> {
        let thunk_offset = self.checked_align(offset);
        let data = &mut self.thunks[thunk.index()];
        let Some(thunk_offset) =
            thunk_offset.filter(|o| o.checked_add(data.code_size()).is_some())
        else {
            return Err(LinkError::ThunkOffsetOverflow {
                key: *data.key(),
                offset,
            });
        };
        debug!(key = %data.key(), offset = thunk_offset, "reserved thunk");
        Ok(data.reserve_offset(thunk_offset))
    }

    fn process_patches(&mut self, method: &CompiledMethod, code_offset: u32) {
        for patch in method.patches() {
            let patch_offset = code_offset + patch.literal_offset;
            trace!(patch_offset, kind = ?patch.kind, "processing patch");
            let (key, existing) = match patch.kind {
                PatchKind::CallRelative { target } => {
                    self.unprocessed_calls.push_back(UnprocessedMethodCallPatch {
                        patch_offset,
                        target,
                    });
                    self.call_targets.entry(target).or_insert(patch_offset);
                    match self.method_call_thunk {
                        Some(id) => (ThunkKey::MethodCall, id),
                        None => {
                            let id = self.create_thunk(ThunkKey::MethodCall, patch_offset);
                            self.method_call_thunk = Some(id);
                            continue;
                        }
                    }
                }
                PatchKind::BakerReadBarrierBranch { .. } => {
                    let key = self.isa.baker_read_barrier_key(patch);
                    match self.thunk_ids.get(&key) {
                        Some(&id) => (key, id),
                        None => {
                            self.create_thunk(key, patch_offset);
                            continue;
                        }
                    }
                }
                PatchKind::MethodBssEntry { .. } => continue,
            };

            let thunk_type = key.thunk_type();
            let max_next_offset = self.calculate_max_next_offset(patch_offset, thunk_type);
            let max_negative = self.isa.max_negative_displacement(thunk_type);
            let data = &mut self.thunks[existing.index()];
            debug_assert!(!data.has_reserved_offset() || data.last_reserved_offset() < patch_offset);
            if data.needs_next_thunk() {
                // Patches are ordered by offset, so the awaited copy reaches this one too.
                debug_assert!(data.max_next_offset() <= max_next_offset);
            } else if !data.has_reserved_offset()
                || patch_offset - data.last_reserved_offset() > max_negative
            {
                data.set_max_next_offset(max_next_offset);
                self.add_unreserved_thunk(existing);
            }
        }
    }

    fn create_thunk(&mut self, key: ThunkKey, patch_offset: u32) -> ThunkId {
        let max_next_offset = self.calculate_max_next_offset(patch_offset, key.thunk_type());
        let code = self.isa.compile_thunk(&key);
        let id = ThunkId(self.thunks.len() as u32);
        debug!(%key, max_next_offset, size = code.len(), "created thunk");
        self.thunks.push(ThunkData::new(key, code, max_next_offset));
        self.thunk_ids.insert(key, id);
        self.add_unreserved_thunk(id);
        id
    }

    fn calculate_max_next_offset(&self, patch_offset: u32, thunk_type: ThunkType) -> u32 {
        round_down(
            patch_offset.saturating_add(self.isa.max_positive_displacement(thunk_type)),
            self.config.code_alignment,
        )
    }

    /// Insert by deadline after any equal deadlines, then pull earlier
    /// deadlines down until every thunk fits before its successor.
    fn add_unreserved_thunk(&mut self, id: ThunkId) {
        let deadline = self.thunks[id.index()].max_next_offset();
        let mut index = self.unreserved.len();
        while index != 0 && deadline < self.deadline_at(index - 1) {
            index -= 1;
        }
        self.unreserved.insert(index, id);

        let alignment = self.config.code_alignment;
        if index + 1 != self.unreserved.len() {
            let next = self.deadline_at(index + 1);
            self.thunks[id.index()].make_space_before(next, alignment);
        }
        while index != 0 {
            let next = self.deadline_at(index);
            let prev = self.unreserved[index - 1];
            if !self.thunks[prev.index()].make_space_before(next, alignment) {
                break;
            }
            index -= 1;
        }
    }

    fn deadline_at(&self, index: usize) -> u32 {
        self.thunks[self.unreserved[index].index()].max_next_offset()
    }

    /// Drop queued calls that reach their target directly or through an
    /// earlier copy of the method call thunk. Stops at the first that does not.
    fn resolve_method_calls(
        &mut self,
        code_offset: u32,
        method_ref: Option<MethodRef>,
        provider: &impl MethodOffsetProvider,
    ) {
        let Some(call_thunk) = self.method_call_thunk else {
            return;
        };
        let max_positive = self.isa.max_positive_displacement(ThunkType::MethodCall);
        let max_negative = self.isa.max_negative_displacement(ThunkType::MethodCall);

        while let Some(&call) = self.unprocessed_calls.front() {
            let data = &self.thunks[call_thunk.index()];
            let copy_in_reach = data.has_reserved_offset()
                && call.patch_offset.wrapping_sub(data.last_reserved_offset()) <= max_negative;
            if !copy_in_reach {
                if Some(call.target) == method_ref {
                    debug_assert!(code_offset > call.patch_offset);
                    if code_offset - call.patch_offset > max_positive {
                        break;
                    }
                } else {
                    let Some(entry) = self.find_method_offset(call.target, provider) else {
                        break;
                    };
                    let target_offset = entry.saturating_sub(self.config.code_delta);
                    let in_reach = if target_offset >= call.patch_offset {
                        target_offset - call.patch_offset <= max_positive
                    } else {
                        call.patch_offset - target_offset <= max_negative
                    };
                    if !in_reach {
                        break;
                    }
                }
            }
            trace!(patch_offset = call.patch_offset, target = %call.target, "resolved call");
            self.unprocessed_calls.pop_front();
        }

        if !self.thunks[call_thunk.index()].needs_next_thunk() {
            return;
        }
        match self.unprocessed_calls.front() {
            Some(front) => {
                // Only move the deadline later when the thunk can go last.
                let new_max_next_offset = round_down(
                    front.patch_offset.saturating_add(max_positive),
                    self.config.code_alignment,
                );
                let Some(&back) = self.unreserved.back() else {
                    return;
                };
                let back_data = &self.thunks[back.index()];
                if new_max_next_offset
                    > back_data.max_next_offset().saturating_add(back_data.code_size())
                {
                    let data = &mut self.thunks[call_thunk.index()];
                    data.clear_max_next_offset();
                    data.set_max_next_offset(new_max_next_offset);
                    if back != call_thunk {
                        self.unreserved.retain(|&id| id != call_thunk);
                        self.unreserved.push_back(call_thunk);
                    }
                    debug!(max_next_offset = new_max_next_offset, "postponed method call thunk");
                }
            }
            None => {
                // Every call resolved, no copy needed for now.
                self.thunks[call_thunk.index()].clear_max_next_offset();
                self.unreserved.retain(|&id| id != call_thunk);
            }
        }
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write every thunk copy due at `offset`, with alignment padding.
    ///
    /// Returns the offset past the written bytes. Calls must come in
    /// increasing offset order and must not skip a due thunk.
    pub fn write_thunks(&mut self, out: &mut impl Write, offset: u32) -> Result<u32, LinkError> {
        self.expect_phase("write_thunks", &[Phase::ReservationDone, Phase::Writing])?;
        if offset < self.write_cursor {
            return Err(LinkError::OutOfOrderWrite {
                expected: self.write_cursor,
                actual: offset,
            });
        }
        if self.phase == Phase::ReservationDone {
            for (&key, &id) in &self.thunk_ids {
                let data = &self.thunks[id.index()];
                if data.has_pending_offset() {
                    self.pending.push(Reverse((data.pending_offset(), key, id)));
                }
            }
            self.phase = Phase::Writing;
        }

        let mut offset = offset;
        while let Some(&Reverse((pending_offset, key, id))) = self.pending.peek() {
            // Nothing can be due past the end of the offset space.
            let aligned_offset = self.checked_align(offset).unwrap_or(u32::MAX);
            if pending_offset < aligned_offset {
                return Err(LinkError::OutOfOrderWrite {
                    expected: pending_offset,
                    actual: aligned_offset,
                });
            }
            if pending_offset != aligned_offset {
                break;
            }

            self.write_code_alignment(out, aligned_offset - offset)?;
            let data = &mut self.thunks[id.index()];
            out.write_all(data.code())?;
            let size = data.code_size();
            if key == ThunkKey::MethodCall {
                self.stats.call_thunk_bytes += size;
            } else {
                self.stats.misc_thunk_bytes += size;
            }
            debug!(%key, offset = aligned_offset, "wrote thunk");

            self.pending.pop();
            data.mark_pending_offset_as_written();
            if data.has_pending_offset() {
                self.pending.push(Reverse((data.pending_offset(), key, id)));
            }
            offset = aligned_offset + size;
        }

        self.write_cursor = offset;
        Ok(offset)
    }

    /// Write `padding` zero bytes of code alignment.
    pub fn write_code_alignment(&mut self, out: &mut impl Write, padding: u32) -> Result<(), LinkError> {
        if padding == 0 {
            return Ok(());
        }
        out.write_all(&vec![0u8; padding as usize])?;
        self.stats.code_alignment_bytes += padding;
        Ok(())
    }

    /// Record that the caller wrote everything up to `offset`.
    pub fn advance_to(&mut self, offset: u32) -> Result<(), LinkError> {
        if offset < self.write_cursor {
            return Err(LinkError::OutOfOrderWrite {
                expected: self.write_cursor,
                actual: offset,
            });
        }
        self.write_cursor = offset;
        Ok(())
    }

    /// Displacement for a call at `patch_offset` to code at `target_offset`,
    /// through a method call thunk copy when the target is out of range.
    pub fn calculate_method_call_displacement(
        &self,
        patch_offset: u32,
        target_offset: u32,
    ) -> Result<u32, LinkError> {
        self.expect_phase(
            "calculate_method_call_displacement",
            &[Phase::ReservationDone, Phase::Writing],
        )?;
        let max_positive = self.isa.max_positive_displacement(ThunkType::MethodCall);
        let max_negative = self.isa.max_negative_displacement(ThunkType::MethodCall);
        let displacement = target_offset.wrapping_sub(patch_offset);
        if displacement_in_range(displacement, max_positive, max_negative) {
            return Ok(displacement);
        }

        let out_of_range = LinkError::DisplacementOutOfRange {
            kind: ThunkType::MethodCall,
            patch_offset,
            target_offset,
        };
        let Some(id) = self.method_call_thunk else {
            return Err(out_of_range);
        };
        let data = &self.thunks[id.index()];
        if data.has_pending_offset() {
            let pending = data.pending_offset();
            if pending > patch_offset && pending - patch_offset <= max_positive {
                return Ok(pending - patch_offset);
            }
        }
        if data.has_written_offset() {
            let written = data.last_written_offset();
            if written < patch_offset && patch_offset - written <= max_negative {
                return Ok(written.wrapping_sub(patch_offset));
            }
        }
        Err(out_of_range)
    }

    /// Offset of the copy of `key`'s thunk a branch at `patch_offset` uses.
    ///
    /// The last written copy wins when it is within backward reach.
    pub fn thunk_target_offset(&self, key: &ThunkKey, patch_offset: u32) -> Result<u32, LinkError> {
        self.expect_phase(
            "thunk_target_offset",
            &[Phase::ReservationDone, Phase::Writing],
        )?;
        let id = self
            .thunk_ids
            .get(key)
            .ok_or(LinkError::UnknownThunk(*key))?;
        let data = &self.thunks[id.index()];
        let thunk_type = key.thunk_type();

        let mut nearest = None;
        if data.has_written_offset() {
            let written = data.last_written_offset();
            if written < patch_offset
                && patch_offset - written <= self.isa.max_negative_displacement(thunk_type)
            {
                return Ok(written);
            }
            nearest = Some(written);
        }
        if data.has_pending_offset() {
            let pending = data.pending_offset();
            if pending > patch_offset
                && pending - patch_offset <= self.isa.max_positive_displacement(thunk_type)
            {
                return Ok(pending);
            }
            nearest = Some(pending);
        }
        Err(LinkError::DisplacementOutOfRange {
            kind: thunk_type,
            patch_offset,
            target_offset: nearest.unwrap_or(0),
        })
    }

    /// Thunk key a Baker read barrier patch branches to.
    pub fn baker_read_barrier_key(&self, patch: &LinkerPatch) -> ThunkKey {
        self.isa.baker_read_barrier_key(patch)
    }

    /// End the session. Fails if a reserved thunk copy was never written.
    pub fn finish(&mut self) -> Result<PatcherStats, LinkError> {
        self.expect_phase("finish", &[Phase::ReservationDone, Phase::Writing])?;
        for (key, id) in &self.thunk_ids {
            let data = &self.thunks[id.index()];
            if data.has_pending_offset() {
                return Err(LinkError::ThunkNotWritten {
                    key: *key,
                    offset: data.pending_offset(),
                });
            }
        }
        self.phase = Phase::Done;
        debug!(stats = ?self.stats, "patch session done");
        Ok(self.stats)
    }

    fn expect_phase(&self, operation: &'static str, allowed: &[Phase]) -> Result<(), LinkError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(LinkError::WrongPhase {
                operation,
                phase: self.phase,
            })
        }
    }

    fn checked_align(&self, offset: u32) -> Option<u32> {
        checked_align_up(offset, self.config.code_alignment)
    }
}
