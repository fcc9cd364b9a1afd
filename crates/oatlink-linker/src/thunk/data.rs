use oatlink_core::round_down;

use super::key::ThunkKey;

/// Index of a thunk in the patcher's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThunkId(pub(crate) u32);

impl ThunkId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Placement state of one thunk.
///
/// A thunk can be reserved several times, once per reach window. Reserved
/// offsets are written in order; `pending` points at the first unwritten one.
/// A `max_next_offset` of zero means no further copy is needed.
#[derive(Clone, Debug)]
pub struct ThunkData {
    key: ThunkKey,
    code: Vec<u8>,
    offsets: Vec<u32>,
    max_next_offset: u32,
    pending: usize,
}

impl ThunkData {
    pub fn new(key: ThunkKey, code: Vec<u8>, max_next_offset: u32) -> Self {
        debug_assert!(max_next_offset != 0, "new thunk must need a placement");
        Self {
            key,
            code,
            offsets: Vec::new(),
            max_next_offset,
            pending: 0,
        }
    }

    pub fn key(&self) -> &ThunkKey {
        &self.key
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn code_size(&self) -> u32 {
        self.code.len() as u32
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn needs_next_thunk(&self) -> bool {
        self.max_next_offset != 0
    }

    /// Latest offset at which the next copy still reaches every user.
    pub fn max_next_offset(&self) -> u32 {
        debug_assert!(self.needs_next_thunk());
        self.max_next_offset
    }

    pub fn clear_max_next_offset(&mut self) {
        debug_assert!(self.needs_next_thunk());
        self.max_next_offset = 0;
    }

    pub fn set_max_next_offset(&mut self, max_next_offset: u32) {
        debug_assert!(!self.needs_next_thunk());
        self.max_next_offset = max_next_offset;
    }

    /// Pull the deadline down so this thunk fits before a thunk due at
    /// `next_max_next_offset`. Returns whether the deadline moved.
    pub fn make_space_before(&mut self, next_max_next_offset: u32, alignment: u32) -> bool {
        debug_assert!(self.needs_next_thunk());
        debug_assert!(next_max_next_offset != 0);
        debug_assert_eq!(self.max_next_offset % alignment, 0);
        debug_assert_eq!(next_max_next_offset % alignment, 0);
        match next_max_next_offset.checked_sub(self.code_size()) {
            Some(limit) if limit < self.max_next_offset => {
                self.max_next_offset = round_down(limit, alignment);
                true
            }
            _ => false,
        }
    }

    /// Reserve a copy at `offset`; returns the offset just past it.
    pub fn reserve_offset(&mut self, offset: u32) -> u32 {
        debug_assert!(self.needs_next_thunk());
        debug_assert!(
            offset <= self.max_next_offset,
            "{} reserved at {offset:#x} past its deadline {:#x}",
            self.key,
            self.max_next_offset
        );
        // The reserved copy serves every pending user.
        self.max_next_offset = 0;
        self.offsets.push(offset);
        offset + self.code_size()
    }

    pub fn has_reserved_offset(&self) -> bool {
        !self.offsets.is_empty()
    }

    pub fn last_reserved_offset(&self) -> u32 {
        debug_assert!(self.has_reserved_offset());
        self.offsets[self.offsets.len() - 1]
    }

    pub fn has_pending_offset(&self) -> bool {
        self.pending != self.offsets.len()
    }

    pub fn pending_offset(&self) -> u32 {
        debug_assert!(self.has_pending_offset());
        self.offsets[self.pending]
    }

    pub fn mark_pending_offset_as_written(&mut self) {
        debug_assert!(self.has_pending_offset());
        self.pending += 1;
    }

    pub fn has_written_offset(&self) -> bool {
        self.pending != 0
    }

    pub fn last_written_offset(&self) -> u32 {
        debug_assert!(self.has_written_offset());
        self.offsets[self.pending - 1]
    }
}
