//! SIMD-within-a-register kernels: eight byte lanes packed in a `u64`.
//!
//! Portable, so the family is compiled in everywhere. It covers the saturating and
//! min/max laws, xor and swap; anything needing a per-lane multiply stays generic here.

use super::generic::{self, Law, law_byte};
use super::{alpha_mask, drive_bytes, exchange_rows};
use crate::context::CompositeContext;
use crate::dispatch::table::{Family, KernelFn, TableBuilder};
use crate::format::PixelFormat;
use crate::op::CompositeOp;

const W: usize = 8;
const HI: u64 = 0x8080_8080_8080_8080;
const LO: u64 = 0x7F7F_7F7F_7F7F_7F7F;

/// Spread each lane's top bit across the whole lane.
#[inline]
fn widen(top_bits: u64) -> u64 {
    (top_bits >> 7) * 0xFF
}

#[inline]
fn adds(a: u64, b: u64) -> u64 {
    let sum = ((a & LO) + (b & LO)) ^ ((a ^ b) & HI);
    let carry = ((a & b) | ((a | b) & !sum)) & HI;
    sum | widen(carry)
}

#[inline]
fn subs(a: u64, b: u64) -> u64 {
    let diff = ((a | HI) - (b & LO)) ^ ((a ^ !b) & HI);
    let borrow = ((!a & b) | (!(a ^ b) & diff)) & HI;
    diff & !widen(borrow)
}

#[inline]
fn min(a: u64, b: u64) -> u64 {
    a - subs(a, b)
}

#[inline]
fn max(a: u64, b: u64) -> u64 {
    b + subs(a, b)
}

#[inline]
fn absdiff(a: u64, b: u64) -> u64 {
    subs(a, b) | subs(b, a)
}

/// Run `op` on every lane and keep `min(a, b)` in the alpha lanes.
fn run(ctx: &mut CompositeContext<'_>, op: fn(u64, u64) -> u64, law: Law) {
    let alpha = u64::from_le_bytes(alpha_mask::<W>(ctx.pixelformat_a));
    drive_bytes::<W>(
        ctx,
        |a, b| {
            let (a, b) = (u64::from_le_bytes(a), u64::from_le_bytes(b));
            let out = (op(a, b) & !alpha) | (min(a, b) & alpha);
            out.to_le_bytes()
        },
        |a, b, is_alpha| law_byte(law, a, b, is_alpha),
    );
}

fn addition(ctx: &mut CompositeContext<'_>) {
    run(ctx, adds, generic::addition);
}

fn subtract(ctx: &mut CompositeContext<'_>) {
    run(ctx, subs, generic::subtract);
}

fn darken(ctx: &mut CompositeContext<'_>) {
    run(ctx, min, generic::darken);
}

fn lighten(ctx: &mut CompositeContext<'_>) {
    run(ctx, max, generic::lighten);
}

fn difference(ctx: &mut CompositeContext<'_>) {
    run(ctx, absdiff, generic::difference);
}

fn xor(ctx: &mut CompositeContext<'_>) {
    run(ctx, |a, b| a ^ b, generic::xor);
}

fn swap(ctx: &mut CompositeContext<'_>) {
    let Some((a, b)) = exchange_rows(ctx) else {
        return;
    };
    let body = a.len() - a.len() % W;
    for (ca, cb) in a[..body]
        .chunks_exact_mut(W)
        .zip(b[..body].chunks_exact_mut(W))
    {
        let mut x = [0u8; W];
        x.copy_from_slice(ca);
        ca.copy_from_slice(cb);
        cb.copy_from_slice(&x);
    }
    a[body..].swap_with_slice(&mut b[body..]);
}

pub(crate) fn install(builder: &mut TableBuilder) {
    let ops: [(CompositeOp, KernelFn); 6] = [
        (CompositeOp::Addition, addition),
        (CompositeOp::Subtract, subtract),
        (CompositeOp::Darken, darken),
        (CompositeOp::Lighten, lighten),
        (CompositeOp::Difference, difference),
        (CompositeOp::Xor, xor),
    ];
    for f in PixelFormat::EIGHT_BIT {
        for (op, func) in ops {
            builder.insert(op, f, f, f, func, Family::Swar);
        }
        builder.insert(CompositeOp::Swap, f, f, f, swap, Family::Swar);
        builder.insert(CompositeOp::Swap, f, f, PixelFormat::Any, swap, Family::Swar);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/swar.rs"]
mod tests;
