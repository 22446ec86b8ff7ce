//! Fixed-point helpers shared by every kernel family.
//!
//! All of these are exact integer formulas: accelerated kernels reproduce them lane by lane,
//! so changing any rounding constant here changes the contract they are tested against.

/// `round(a * b / 255)` for `a, b <= 255`, via the "+128, add high byte, shift" idiom.
#[inline]
pub(crate) fn int_mult(a: u32, b: u32) -> u32 {
    let t = a * b + 0x80;
    ((t >> 8) + t) >> 8
}

/// `a * b * c / (255 * 255)` with the same rounding family as [`int_mult`].
#[inline]
pub(crate) fn int_mult3(a: u32, b: u32, c: u32) -> u32 {
    let t = a * b * c + 0x7F5B;
    ((t >> 7) + t) >> 16
}

/// Interpolate from `b` towards `a` by `alpha / 255`.
#[inline]
pub(crate) fn int_blend(a: u8, b: u8, alpha: u8) -> u8 {
    let t = (i32::from(a) - i32::from(b)) * i32::from(alpha) + 0x80;
    let v = (((t >> 8) + t) >> 8) + i32::from(b);
    v.clamp(0, 255) as u8
}

/// Exact `x / 255` for `x <= 65279`, using only adds and shifts.
#[inline]
pub(crate) fn div_255(x: u32) -> u32 {
    debug_assert!(x <= 65279);
    (x + 1 + (x >> 8)) >> 8
}

#[inline]
pub(crate) fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Luma with 8-bit fixed-point weights (77, 150, 29) ~ (0.30, 0.59, 0.11).
#[inline]
pub(crate) fn intensity(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 77 + u32::from(g) * 150 + u32::from(b) * 29 + 128) >> 8) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
