use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Every simulation quantity (capacity, availability, demand, support) uses
/// this type so that two games fed the same inputs stay bit-identical.
pub type Fixed64 = I32F32;

/// Turns are the atomic unit of game time (roughly one in-game year).
pub type Turn = u32;

/// Convert an f64 to Fixed64. Use only for configuration, never in a turn.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Clamp a value into the unit interval [0, 1].
#[inline]
pub fn clamp_unit(v: Fixed64) -> Fixed64 {
    v.clamp(Fixed64::ZERO, Fixed64::ONE)
}

/// Clamp a value so it never drops below zero.
#[inline]
pub fn floor_zero(v: Fixed64) -> Fixed64 {
    v.max(Fixed64::ZERO)
}

/// Sum an iterator of Fixed64 values, saturating at the type bounds.
pub fn saturating_sum<I: IntoIterator<Item = Fixed64>>(values: I) -> Fixed64 {
    values
        .into_iter()
        .fold(Fixed64::ZERO, |acc, v| acc.saturating_add(v))
}
