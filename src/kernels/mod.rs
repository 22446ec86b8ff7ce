//! Kernel families and the row drivers they share.
//!
//! Every kernel has the [`crate::KernelFn`] shape. Drivers hide the operand layout
//! (separate destination or destination aliasing A) so a kernel only describes one pixel
//! or one register's worth of bytes.

pub(crate) mod color;
pub(crate) mod generic;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[allow(unsafe_code)]
pub(crate) mod sse2;
pub(crate) mod swar;

use crate::context::{CompositeContext, Planes};
use crate::format::PixelFormat;

/// One 8-bit pixel widened to the largest layout; bytes past the format width are zero.
pub(crate) type Px = [u8; 4];

/// Walk `n_pixels` pixels, handing `f` the index, A, B and the mask byte (if any), and
/// storing the first `bpp(D)` bytes of its result.
pub(crate) fn for_each_pixel<F>(ctx: &mut CompositeContext<'_>, f: F)
where
    F: FnMut(usize, Px, Px, Option<u8>) -> Px,
{
    walk(ctx, true, true, f);
}

/// Like [`for_each_pixel`] for ops that only read A; B is never touched.
pub(crate) fn map_pixels<F>(ctx: &mut CompositeContext<'_>, mut f: F)
where
    F: FnMut(Px) -> Px,
{
    walk(ctx, true, false, |_, a, _, _| f(a));
}

/// For ops whose output depends only on B (and the mask); A is never touched, so it may
/// be empty unless it is also the destination.
pub(crate) fn map_b_pixels<F>(ctx: &mut CompositeContext<'_>, mut f: F)
where
    F: FnMut(Px, Option<u8>) -> Px,
{
    walk(ctx, false, true, |_, _, b, m| f(b, m));
}

fn walk<F>(ctx: &mut CompositeContext<'_>, reads_a: bool, reads_b: bool, mut f: F)
where
    F: FnMut(usize, Px, Px, Option<u8>) -> Px,
{
    let sd = ctx.bpp_d();
    let sa = if reads_a { ctx.bpp_a() } else { 0 };
    let sb = if reads_b { ctx.bpp_b() } else { 0 };
    let n = ctx.n_pixels;
    let mask = ctx.mask;
    debug_assert!(mask.is_none_or(|m| m.len() >= n));
    debug_assert!(sa <= 4 && sb <= 4 && sd <= 4);

    match ctx.operands.planes() {
        Planes::Separate { a, b, d } => {
            debug_assert!(a.len() >= n * sa && b.len() >= n * sb && d.len() >= n * sd);
            for i in 0..n {
                let out = f(i, load(a, i, sa), load(b, i, sb), mask.map(|m| m[i]));
                d[i * sd..(i + 1) * sd].copy_from_slice(&out[..sd]);
            }
        }
        Planes::Aliased { ad, b } => {
            debug_assert!(!reads_a || sd <= sa, "in-place destination wider than A");
            debug_assert!(ad.len() >= n * sd);
            for i in 0..n {
                let out = f(i, load(ad, i, sa), load(b, i, sb), mask.map(|m| m[i]));
                ad[i * sd..(i + 1) * sd].copy_from_slice(&out[..sd]);
            }
        }
    }
}

fn load(buf: &[u8], i: usize, bpp: usize) -> Px {
    let mut px = [0u8; 4];
    px[..bpp].copy_from_slice(&buf[i * bpp..(i + 1) * bpp]);
    px
}

fn chunk<const W: usize>(s: &[u8]) -> [u8; W] {
    let mut c = [0u8; W];
    c.copy_from_slice(s);
    c
}

/// True when byte `i` of a row in `fmt` is an alpha byte.
pub(crate) fn is_alpha_byte(fmt: PixelFormat, i: usize) -> bool {
    match fmt.bytes_per_pixel() {
        Some(bpp) if fmt.has_alpha() => i % bpp == bpp - 1,
        _ => false,
    }
}

/// `0xFF` at every alpha byte of a `W`-byte window starting on a pixel boundary.
///
/// Only meaningful when `bpp` divides `W`, which holds for every alpha-carrying 8-bit
/// format (2 and 4 bytes) and the register widths used here.
pub(crate) fn alpha_mask<const W: usize>(fmt: PixelFormat) -> [u8; W] {
    let mut m = [0u8; W];
    for (i, byte) in m.iter_mut().enumerate() {
        if is_alpha_byte(fmt, i) {
            *byte = 0xFF;
        }
    }
    m
}

/// Homogeneous byte-stream driver: `lane` handles whole `W`-byte windows, `byte` handles
/// the tail one byte at a time and is told whether that byte is alpha.
///
/// A, B and D share one format, so the row is `n_pixels * bpp` bytes on every side.
pub(crate) fn drive_bytes<const W: usize>(
    ctx: &mut CompositeContext<'_>,
    mut lane: impl FnMut([u8; W], [u8; W]) -> [u8; W],
    byte: impl Fn(u8, u8, bool) -> u8,
) {
    let fmt = ctx.pixelformat_a;
    debug_assert!(fmt == ctx.pixelformat_b && fmt == ctx.pixelformat_d);
    let len = ctx.n_pixels * ctx.bpp_a();
    let body = len - len % W;

    match ctx.operands.planes() {
        Planes::Separate { a, b, d } => {
            let (a, b, d) = (&a[..len], &b[..len], &mut d[..len]);
            for ((ca, cb), cd) in a[..body]
                .chunks_exact(W)
                .zip(b[..body].chunks_exact(W))
                .zip(d[..body].chunks_exact_mut(W))
            {
                cd.copy_from_slice(&lane(chunk(ca), chunk(cb)));
            }
            for i in body..len {
                d[i] = byte(a[i], b[i], is_alpha_byte(fmt, i));
            }
        }
        Planes::Aliased { ad, b } => {
            let (ad, b) = (&mut ad[..len], &b[..len]);
            for (cad, cb) in ad[..body]
                .chunks_exact_mut(W)
                .zip(b[..body].chunks_exact(W))
            {
                let out = lane(chunk(cad), chunk(cb));
                cad.copy_from_slice(&out);
            }
            for i in body..len {
                ad[i] = byte(ad[i], b[i], is_alpha_byte(fmt, i));
            }
        }
    }
}

/// Borrow both halves of an exchange, or `None` for any other layout.
pub(crate) fn exchange_rows<'s>(
    ctx: &'s mut CompositeContext<'_>,
) -> Option<(&'s mut [u8], &'s mut [u8])> {
    let len = ctx.n_pixels * ctx.bpp_a();
    match &mut ctx.operands {
        crate::context::Operands::Exchange { a, b } => Some((&mut a[..len], &mut b[..len])),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/mod.rs"]
mod tests;
