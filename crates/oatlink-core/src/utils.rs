//! Offset arithmetic for code layout.
//!
//! All alignments are powers of two.

/// Round `value` up to the next multiple of `align`, or `None` past `u32::MAX`.
///
/// # Examples
/// ```
/// use oatlink_core::checked_align_up;
/// assert_eq!(checked_align_up(9, 8), Some(16));
/// assert_eq!(checked_align_up(u32::MAX, 8), None);
/// ```
pub fn checked_align_up(value: u32, align: u32) -> Option<u32> {
    debug_assert!(align.is_power_of_two(), "alignment {align} is not a power of two");
    value.checked_add(align - 1).map(|v| v & !(align - 1))
}

/// Round `value` down to a multiple of `align`.
///
/// # Examples
/// ```
/// use oatlink_core::round_down;
/// assert_eq!(round_down(15, 8), 8);
/// ```
pub fn round_down(value: u32, align: u32) -> u32 {
    debug_assert!(align.is_power_of_two(), "alignment {align} is not a power of two");
    value & !(align - 1)
}
