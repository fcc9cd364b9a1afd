/// Whether a wrapping displacement lies in `[-max_negative, max_positive]`.
pub fn displacement_in_range(displacement: u32, max_positive: u32, max_negative: u32) -> bool {
    displacement <= max_positive
        || (max_negative != 0 && displacement >= max_negative.wrapping_neg())
}

/// Compensate for sign extension of the low `low_bits` of a split immediate.
///
/// When the low part is sign-extended on use, its top bit borrows one from
/// the high part; adding that bit back keeps `high + sext(low)` equal to
/// `diff`.
pub fn sign_extension_adjust(diff: u32, low_bits: u32) -> u32 {
    debug_assert!((1..32).contains(&low_bits));
    let high_bit = 1u32 << (low_bits - 1);
    diff.wrapping_add((diff & high_bit) << 1)
}
