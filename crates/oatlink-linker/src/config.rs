//! Code layout configuration for a link session.

/// Layout parameters of the target instruction set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatcherConfig {
    /// Alignment of method code and thunks; thunk deadlines are rounded down to it.
    pub(crate) code_alignment: u32,
    /// Bytes of method header preceding each method's code.
    pub(crate) method_header_size: u32,
    /// Added to a code offset to form the method entry point.
    pub(crate) code_delta: u32,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self::arm64()
    }
}

impl PatcherConfig {
    /// Size of the method header both presets use.
    pub const METHOD_HEADER_SIZE: u32 = 24;

    pub fn new() -> Self {
        Self::default()
    }

    /// Thumb2: 8-byte alignment, entry points carry the Thumb mode bit.
    pub fn thumb2() -> Self {
        Self {
            code_alignment: 8,
            method_header_size: Self::METHOD_HEADER_SIZE,
            code_delta: 1,
        }
    }

    pub fn arm64() -> Self {
        Self {
            code_alignment: 16,
            method_header_size: Self::METHOD_HEADER_SIZE,
            code_delta: 0,
        }
    }

    /// Set the code alignment.
    pub fn code_alignment(mut self, value: u32) -> Self {
        self.code_alignment = value;
        self
    }

    /// Set the method header size.
    pub fn method_header_size(mut self, value: u32) -> Self {
        self.method_header_size = value;
        self
    }

    /// Set the entry point delta.
    pub fn code_delta(mut self, value: u32) -> Self {
        self.code_delta = value;
        self
    }

    pub fn alignment(&self) -> u32 {
        self.code_alignment
    }

    pub fn header_size(&self) -> u32 {
        self.method_header_size
    }

    pub fn delta(&self) -> u32 {
        self.code_delta
    }

    pub fn validate(&self) -> Result<(), crate::LinkError> {
        if !self.code_alignment.is_power_of_two() {
            return Err(crate::LinkError::InvalidAlignment(self.code_alignment));
        }
        Ok(())
    }
}
