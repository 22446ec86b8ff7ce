//! SSE2 kernels, sixteen bytes per step.
//!
//! Registered only when [`crate::Capabilities`] reports `sse2`. Every law reproduces the
//! fixed-point formula of its generic twin exactly; the trailing `len % 16` bytes go
//! through the generic byte helpers.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::generic::{self, blend_byte, law_byte, scale_byte};
use super::{alpha_mask, exchange_rows, is_alpha_byte};
use crate::context::{CompositeContext, Planes};
use crate::dispatch::table::{Family, KernelFn, TableBuilder};
use crate::format::PixelFormat;
use crate::op::CompositeOp;

const W: usize = 16;

/// What one register step computes.
#[derive(Clone, Copy)]
enum Lane {
    Add,
    Sub,
    Darken,
    Lighten,
    Difference,
    Multiply,
    Screen,
    GrainExtract,
    GrainMerge,
    Xor,
    Blend(u8),
    Scale(u8),
}

impl Lane {
    /// Unary lanes never read B.
    fn unary(self) -> bool {
        matches!(self, Lane::Scale(_))
    }

    /// Blend and scale treat alpha like any other byte.
    fn merges_alpha(self) -> bool {
        !matches!(self, Lane::Blend(_) | Lane::Scale(_))
    }

    fn byte(self, a: u8, b: u8, is_alpha: bool) -> u8 {
        let law = match self {
            Lane::Add => generic::addition,
            Lane::Sub => generic::subtract,
            Lane::Darken => generic::darken,
            Lane::Lighten => generic::lighten,
            Lane::Difference => generic::difference,
            Lane::Multiply => generic::multiply,
            Lane::Screen => generic::screen,
            Lane::GrainExtract => generic::grain_extract,
            Lane::GrainMerge => generic::grain_merge,
            Lane::Xor => generic::xor,
            Lane::Blend(w) => return blend_byte(a, b, w),
            Lane::Scale(s) => return scale_byte(a, s),
        };
        law_byte(law, a, b, is_alpha)
    }
}

#[inline]
#[target_feature(enable = "sse2")]
fn load(bytes: &[u8]) -> __m128i {
    debug_assert!(bytes.len() >= W);
    // SAFETY: `bytes` holds at least 16 readable bytes; the load is unaligned.
    unsafe { _mm_loadu_si128(bytes.as_ptr().cast()) }
}

#[inline]
#[target_feature(enable = "sse2")]
fn store(bytes: &mut [u8], v: __m128i) {
    debug_assert!(bytes.len() >= W);
    // SAFETY: `bytes` holds at least 16 writable bytes; the store is unaligned.
    unsafe { _mm_storeu_si128(bytes.as_mut_ptr().cast(), v) }
}

/// `int_mult` on eight 16-bit lanes holding byte values.
#[inline]
#[target_feature(enable = "sse2")]
fn mult16(a: __m128i, b: __m128i) -> __m128i {
    let t = _mm_add_epi16(_mm_mullo_epi16(a, b), _mm_set1_epi16(0x80));
    _mm_srli_epi16::<8>(_mm_add_epi16(t, _mm_srli_epi16::<8>(t)))
}

/// Exact `x / 255` on eight 16-bit lanes, `x <= 65025`.
#[inline]
#[target_feature(enable = "sse2")]
fn div255_16(x: __m128i) -> __m128i {
    let t = _mm_add_epi16(_mm_add_epi16(x, _mm_set1_epi16(1)), _mm_srli_epi16::<8>(x));
    _mm_srli_epi16::<8>(t)
}

/// Zero-extend the low and high eight bytes to 16-bit lanes.
#[inline]
#[target_feature(enable = "sse2")]
fn unpack(v: __m128i) -> (__m128i, __m128i) {
    let zero = _mm_setzero_si128();
    (_mm_unpacklo_epi8(v, zero), _mm_unpackhi_epi8(v, zero))
}

#[inline]
#[target_feature(enable = "sse2")]
fn grain16(x: __m128i, y: __m128i, merge: bool) -> __m128i {
    let bias = _mm_set1_epi16(128);
    if merge {
        _mm_sub_epi16(_mm_add_epi16(x, y), bias)
    } else {
        _mm_add_epi16(_mm_sub_epi16(x, y), bias)
    }
}

#[inline]
#[target_feature(enable = "sse2")]
fn blend16(x: __m128i, y: __m128i, w: u8) -> __m128i {
    let wb = _mm_set1_epi16(i16::from(w));
    let wa = _mm_set1_epi16(255 - i16::from(w));
    div255_16(_mm_add_epi16(_mm_mullo_epi16(x, wa), _mm_mullo_epi16(y, wb)))
}

#[target_feature(enable = "sse2")]
fn step(lane: Lane, a: __m128i, b: __m128i, alpha: __m128i) -> __m128i {
    let ones = _mm_set1_epi8(-1);
    let (al, ah) = unpack(a);
    let (bl, bh) = unpack(b);
    let color = match lane {
        Lane::Add => _mm_adds_epu8(a, b),
        Lane::Sub => _mm_subs_epu8(a, b),
        Lane::Darken => _mm_min_epu8(a, b),
        Lane::Lighten => _mm_max_epu8(a, b),
        Lane::Difference => _mm_or_si128(_mm_subs_epu8(a, b), _mm_subs_epu8(b, a)),
        Lane::Xor => _mm_xor_si128(a, b),
        Lane::Multiply => _mm_packus_epi16(mult16(al, bl), mult16(ah, bh)),
        Lane::Screen => {
            let (il, ih) = unpack(_mm_xor_si128(a, ones));
            let (jl, jh) = unpack(_mm_xor_si128(b, ones));
            let inv = _mm_packus_epi16(mult16(il, jl), mult16(ih, jh));
            _mm_xor_si128(inv, ones)
        }
        Lane::GrainExtract => {
            _mm_packus_epi16(grain16(al, bl, false), grain16(ah, bh, false))
        }
        Lane::GrainMerge => _mm_packus_epi16(grain16(al, bl, true), grain16(ah, bh, true)),
        Lane::Blend(w) => _mm_packus_epi16(blend16(al, bl, w), blend16(ah, bh, w)),
        Lane::Scale(s) => {
            let s = _mm_set1_epi16(i16::from(s));
            _mm_packus_epi16(mult16(al, s), mult16(ah, s))
        }
    };
    if lane.merges_alpha() {
        _mm_or_si128(
            _mm_andnot_si128(alpha, color),
            _mm_and_si128(alpha, _mm_min_epu8(a, b)),
        )
    } else {
        color
    }
}

/// Homogeneous row driver. For unary lanes B may be empty; A stands in for it.
#[target_feature(enable = "sse2")]
fn drive(ctx: &mut CompositeContext<'_>, lane: Lane) {
    let fmt = ctx.pixelformat_a;
    let len = ctx.n_pixels * ctx.bpp_a();
    let body = len - len % W;
    let alpha = load(&alpha_mask::<W>(fmt));
    let unary = lane.unary();

    match ctx.operands.planes() {
        Planes::Separate { a, b, d } => {
            let a = &a[..len];
            let b = if unary { a } else { &b[..len] };
            let d = &mut d[..len];
            for i in (0..body).step_by(W) {
                let (va, vb) = (load(&a[i..]), load(&b[i..]));
                store(&mut d[i..], step(lane, va, vb, alpha));
            }
            for i in body..len {
                d[i] = lane.byte(a[i], b[i], is_alpha_byte(fmt, i));
            }
        }
        Planes::Aliased { ad, b } => {
            let ad = &mut ad[..len];
            let b = if unary { None } else { Some(&b[..len]) };
            for i in (0..body).step_by(W) {
                let va = load(&ad[i..]);
                let vb = match b {
                    Some(b) => load(&b[i..]),
                    None => va,
                };
                store(&mut ad[i..], step(lane, va, vb, alpha));
            }
            for i in body..len {
                let x = ad[i];
                ad[i] = lane.byte(x, b.map_or(x, |b| b[i]), is_alpha_byte(fmt, i));
            }
        }
    }
}

/// Wrap one lane as a [`KernelFn`].
fn run(ctx: &mut CompositeContext<'_>, lane: Lane) {
    // SAFETY: installed only when Capabilities reports sse2.
    unsafe { drive(ctx, lane) }
}

fn addition(ctx: &mut CompositeContext<'_>) {
    run(ctx, Lane::Add);
}

fn subtract(ctx: &mut CompositeContext<'_>) {
    run(ctx, Lane::Sub);
}

fn darken(ctx: &mut CompositeContext<'_>) {
    run(ctx, Lane::Darken);
}

fn lighten(ctx: &mut CompositeContext<'_>) {
    run(ctx, Lane::Lighten);
}

fn difference(ctx: &mut CompositeContext<'_>) {
    run(ctx, Lane::Difference);
}

fn multiply(ctx: &mut CompositeContext<'_>) {
    run(ctx, Lane::Multiply);
}

fn screen(ctx: &mut CompositeContext<'_>) {
    run(ctx, Lane::Screen);
}

fn grain_extract(ctx: &mut CompositeContext<'_>) {
    run(ctx, Lane::GrainExtract);
}

fn grain_merge(ctx: &mut CompositeContext<'_>) {
    run(ctx, Lane::GrainMerge);
}

fn xor(ctx: &mut CompositeContext<'_>) {
    run(ctx, Lane::Xor);
}

fn blend(ctx: &mut CompositeContext<'_>) {
    let w = ctx.params.blend;
    run(ctx, Lane::Blend(w));
}

fn scale(ctx: &mut CompositeContext<'_>) {
    let s = ctx.params.scale;
    run(ctx, Lane::Scale(s));
}

#[target_feature(enable = "sse2")]
fn swap_rows(a: &mut [u8], b: &mut [u8]) {
    let body = a.len() - a.len() % W;
    for i in (0..body).step_by(W) {
        let (va, vb) = (load(&a[i..]), load(&b[i..]));
        store(&mut a[i..], vb);
        store(&mut b[i..], va);
    }
    a[body..].swap_with_slice(&mut b[body..]);
}

fn swap(ctx: &mut CompositeContext<'_>) {
    if let Some((a, b)) = exchange_rows(ctx) {
        // SAFETY: installed only when Capabilities reports sse2.
        unsafe { swap_rows(a, b) }
    }
}

pub(crate) fn install(builder: &mut TableBuilder) {
    let ops: [(CompositeOp, KernelFn); 11] = [
        (CompositeOp::Addition, addition),
        (CompositeOp::Subtract, subtract),
        (CompositeOp::Darken, darken),
        (CompositeOp::Lighten, lighten),
        (CompositeOp::Difference, difference),
        (CompositeOp::Multiply, multiply),
        (CompositeOp::Screen, screen),
        (CompositeOp::GrainExtract, grain_extract),
        (CompositeOp::GrainMerge, grain_merge),
        (CompositeOp::Xor, xor),
        (CompositeOp::Blend, blend),
    ];
    let eight = PixelFormat::EIGHT_BIT;
    for f in eight {
        for (op, func) in ops {
            builder.insert(op, f, f, f, func, Family::Sse2);
        }
        for x in eight.into_iter().chain([PixelFormat::Any]) {
            builder.insert(CompositeOp::Scale, f, x, f, scale, Family::Sse2);
        }
        builder.insert(CompositeOp::Swap, f, f, f, swap, Family::Sse2);
        builder.insert(CompositeOp::Swap, f, f, PixelFormat::Any, swap, Family::Sse2);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/sse2.rs"]
mod tests;
