//! Bit-width arithmetic shared by all field types.

/// Number of bits needed to represent `value` as an unsigned integer.
///
/// Zero needs zero bits; this matches the convention that a field
/// addressing a single alternative has no selector bits.
#[must_use]
pub const fn bit_length(value: u32) -> u32 {
    u32::BITS - value.leading_zeros()
}

/// Selector width for choosing among `count` alternatives: zero when at
/// most one alternative exists, otherwise the ceiling of log2.
#[must_use]
pub const fn encoding_width_for(count: usize) -> u32 {
    match count.checked_sub(1) {
        None | Some(0) => 0,
        Some(max_index) => usize::BITS - max_index.leading_zeros(),
    }
}
