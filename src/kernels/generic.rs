//! Portable scalar kernels. Their output defines every blend law; accelerated families
//! are checked against them byte for byte.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::color::{hsl_to_rgb, hsv_to_rgb, rgb_to_hsl, rgb_to_hsv};
use super::{Px, exchange_rows, for_each_pixel, map_b_pixels, map_pixels};
use crate::context::CompositeContext;
use crate::dispatch::table::{Family, KernelFn, TableBuilder};
use crate::format::PixelFormat;
use crate::foundation::math::{clamp_u8, div_255, int_blend, int_mult, int_mult3, intensity};
use crate::op::CompositeOp;

/// A per-channel blend law.
pub(crate) type Law = fn(u8, u8) -> u8;

const EPSILON: f32 = 0.0001;
const DISSOLVE_SEED: u64 = 314_159_265;
const DISSOLVE_ROWS: usize = 4096;

pub(crate) fn multiply(a: u8, b: u8) -> u8 {
    int_mult(u32::from(a), u32::from(b)) as u8
}

pub(crate) fn screen(a: u8, b: u8) -> u8 {
    255 - multiply(255 - a, 255 - b)
}

pub(crate) fn overlay(a: u8, b: u8) -> u8 {
    let a32 = u32::from(a);
    let inner = int_mult(2 * u32::from(b), 255 - a32);
    int_mult(a32, a32 + inner).min(255) as u8
}

pub(crate) fn difference(a: u8, b: u8) -> u8 {
    a.abs_diff(b)
}

pub(crate) fn addition(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

pub(crate) fn subtract(a: u8, b: u8) -> u8 {
    a.saturating_sub(b)
}

pub(crate) fn darken(a: u8, b: u8) -> u8 {
    a.min(b)
}

pub(crate) fn lighten(a: u8, b: u8) -> u8 {
    a.max(b)
}

pub(crate) fn divide(a: u8, b: u8) -> u8 {
    ((u32::from(a) * 256) / (u32::from(b) + 1)).min(255) as u8
}

pub(crate) fn dodge(a: u8, b: u8) -> u8 {
    ((u32::from(a) * 256) / (256 - u32::from(b))).min(255) as u8
}

pub(crate) fn burn(a: u8, b: u8) -> u8 {
    burn_table()[usize::from(a) << 8 | usize::from(b)]
}

fn burn_table() -> &'static [u8] {
    static TABLE: OnceLock<Vec<u8>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t = vec![0u8; 256 * 256];
        for a in 0..256i32 {
            for b in 0..256i32 {
                t[(a << 8 | b) as usize] = clamp_u8(255 - (255 - a) * 256 / (b + 1));
            }
        }
        t
    })
}

pub(crate) fn hard_light(a: u8, b: u8) -> u8 {
    let (a, b) = (i32::from(a), i32::from(b));
    if b > 128 {
        let t = (255 - a) * (255 - ((b - 128) << 1));
        clamp_u8(255 - (t >> 8))
    } else {
        clamp_u8((a * (b << 1)) >> 8)
    }
}

pub(crate) fn soft_light(a: u8, b: u8) -> u8 {
    let s = u32::from(screen(a, b));
    let m = u32::from(multiply(a, b));
    let a = u32::from(a);
    (int_mult(255 - a, m) + int_mult(a, s)).min(255) as u8
}

pub(crate) fn grain_extract(a: u8, b: u8) -> u8 {
    clamp_u8(i32::from(a) - i32::from(b) + 128)
}

pub(crate) fn grain_merge(a: u8, b: u8) -> u8 {
    clamp_u8(i32::from(a) + i32::from(b) - 128)
}

pub(crate) fn xor(a: u8, b: u8) -> u8 {
    a ^ b
}

/// The per-channel law for ops that have one.
pub(crate) fn law_of(op: CompositeOp) -> Option<Law> {
    use CompositeOp::*;
    let law: Law = match op {
        Multiply => multiply,
        Screen => screen,
        Overlay => overlay,
        Difference => difference,
        Addition => addition,
        Subtract => subtract,
        Darken => darken,
        Lighten => lighten,
        Divide => divide,
        Dodge => dodge,
        Burn => burn,
        HardLight => hard_light,
        SoftLight => soft_light,
        GrainExtract => grain_extract,
        GrainMerge => grain_merge,
        Xor => xor,
        _ => return None,
    };
    Some(law)
}

/// One byte of a homogeneous law row: the law on color bytes, `min` on alpha bytes.
pub(crate) fn law_byte(law: Law, a: u8, b: u8, is_alpha: bool) -> u8 {
    if is_alpha { a.min(b) } else { law(a, b) }
}

pub(crate) fn blend_byte(a: u8, b: u8, blend: u8) -> u8 {
    let (a, b, w) = (u32::from(a), u32::from(b), u32::from(blend));
    div_255(a * (255 - w) + b * w) as u8
}

pub(crate) fn scale_byte(a: u8, scale: u8) -> u8 {
    int_mult(u32::from(a), u32::from(scale)) as u8
}

/// Channel count written by the law ops, and which side supplies alpha.
struct LawLayout {
    alpha: usize,
    both: bool,
    only_b: bool,
}

impl LawLayout {
    fn of(ctx: &CompositeContext<'_>) -> Self {
        let (ha, hb) = (
            ctx.pixelformat_a.has_alpha(),
            ctx.pixelformat_b.has_alpha(),
        );
        let alpha = if ha || hb {
            ctx.bpp_a().max(ctx.bpp_b()) - 1
        } else {
            ctx.bpp_a()
        };
        Self {
            alpha,
            both: ha && hb,
            only_b: hb && !ha,
        }
    }

    fn finish(&self, a: Px, b: Px, d: &mut Px) {
        if self.both {
            d[self.alpha] = a[self.alpha].min(b[self.alpha]);
        } else if self.only_b {
            d[self.alpha] = b[self.alpha];
        }
    }
}

fn law_any(ctx: &mut CompositeContext<'_>) {
    let Some(law) = law_of(ctx.op) else {
        return;
    };
    let layout = LawLayout::of(ctx);
    for_each_pixel(ctx, |_, a, b, _| {
        let mut d = [0u8; 4];
        for c in 0..layout.alpha {
            d[c] = law(a[c], b[c]);
        }
        layout.finish(a, b, &mut d);
        d
    });
}

/// Hue, saturation, value and color-only. Gray rows have nothing to transfer, so D is B.
fn component_any(ctx: &mut CompositeContext<'_>) {
    let op = ctx.op;
    if ctx.pixelformat_a.is_gray() {
        let sb = ctx.bpp_b();
        for_each_pixel(ctx, |_, _, b, _| {
            let mut d = [0u8; 4];
            d[..sb].copy_from_slice(&b[..sb]);
            d
        });
        return;
    }

    let layout = LawLayout::of(ctx);
    for_each_pixel(ctx, |_, a, b, _| {
        let rgb = match op {
            CompositeOp::ColorOnly => {
                let mut x = rgb_to_hsl(a[0], a[1], a[2]);
                let y = rgb_to_hsl(b[0], b[1], b[2]);
                x[0] = y[0];
                x[1] = y[1];
                hsl_to_rgb(x)
            }
            _ => {
                let mut x = rgb_to_hsv(a[0], a[1], a[2]);
                let y = rgb_to_hsv(b[0], b[1], b[2]);
                match op {
                    // Painting a gray hue would turn black red.
                    CompositeOp::Hue if y[1] != 0 => x[0] = y[0],
                    CompositeOp::Saturation => x[1] = y[1],
                    CompositeOp::Value => x[2] = y[2],
                    _ => {}
                }
                hsv_to_rgb(x)
            }
        };
        let mut d = [rgb[0], rgb[1], rgb[2], 0];
        layout.finish(a, b, &mut d);
        d
    });
}

/// Coverage of B's pixel after mask and opacity, as the normal combine computes it.
fn normal_coverage(b_alpha: u8, mask: Option<u8>, opacity: u8) -> u32 {
    let (ba, op) = (u32::from(b_alpha), u32::from(opacity));
    match (mask, opacity) {
        (None, 255) => ba,
        (None, _) => int_mult(ba, op),
        (Some(m), 255) => int_mult(ba, u32::from(m)),
        (Some(m), _) => int_mult3(ba, u32::from(m), op),
    }
}

/// Coverage used by behind, erase, anti-erase and color-erase: an absent mask counts as
/// fully opaque.
fn coverage3(b_alpha: u8, mask: Option<u8>, opacity: u8) -> u8 {
    int_mult3(
        u32::from(b_alpha),
        u32::from(mask.unwrap_or(255)),
        u32::from(opacity),
    ) as u8
}

fn mix(x: u8, y: u8, ratio: f32) -> u8 {
    (f32::from(x) * ratio + f32::from(y) * (1.0 - ratio) + EPSILON) as u8
}

fn normal(ctx: &mut CompositeContext<'_>) {
    let bpp = ctx.bpp_a();
    let params = ctx.params;
    let affect = params.affect;

    if !ctx.pixelformat_a.has_alpha() {
        for_each_pixel(ctx, |_, a, b, m| {
            let weight = match m {
                Some(m) => int_mult(u32::from(m), u32::from(params.opacity)) as u8,
                None => params.opacity,
            };
            let mut d = a;
            for c in 0..bpp {
                if affect[c] {
                    d[c] = int_blend(b[c], a[c], weight);
                }
            }
            d
        });
        return;
    }

    let alpha = bpp - 1;
    for_each_pixel(ctx, |_, a, b, m| {
        let sa = normal_coverage(b[alpha], m, params.opacity);
        let a_alpha = u32::from(a[alpha]);
        let na = (a_alpha + int_mult(255 - a_alpha, sa)) as u8;
        let sa = sa as u8;

        let mut d = a;
        if sa != 0 && na != 0 {
            let ratio = f32::from(sa) / f32::from(na);
            for c in 0..alpha {
                if affect[c] {
                    d[c] = if sa == na { b[c] } else { mix(b[c], a[c], ratio) };
                }
            }
        }
        d[alpha] = if affect[alpha] { na } else { a[alpha] };
        d
    });
}

fn behind(ctx: &mut CompositeContext<'_>) {
    let bpp = ctx.bpp_a();
    let params = ctx.params;
    if !ctx.pixelformat_a.has_alpha() {
        map_pixels(ctx, |a| a);
        return;
    }

    let alpha = bpp - 1;
    for_each_pixel(ctx, |_, a, b, m| {
        let sa = coverage3(b[alpha], m, params.opacity);
        let na = (u32::from(sa) + int_mult(255 - u32::from(sa), u32::from(a[alpha]))) as u8;
        let ratio = if na == 0 {
            0.0
        } else {
            f32::from(a[alpha]) / f32::from(na)
        };

        let mut d = a;
        for c in 0..alpha {
            if params.affect[c] {
                d[c] = mix(a[c], b[c], ratio);
            }
        }
        d[alpha] = if params.affect[alpha] { na } else { a[alpha] };
        d
    });
}

fn erase(ctx: &mut CompositeContext<'_>) {
    let alpha = ctx.bpp_a() - 1;
    let opacity = ctx.params.opacity;
    for_each_pixel(ctx, |_, a, b, m| {
        let sa = u32::from(coverage3(b[alpha], m, opacity));
        let mut d = a;
        d[alpha] = a[alpha] - int_mult(u32::from(a[alpha]), sa) as u8;
        d
    });
}

fn anti_erase(ctx: &mut CompositeContext<'_>) {
    let alpha = ctx.bpp_a() - 1;
    let opacity = ctx.params.opacity;
    for_each_pixel(ctx, |_, a, b, m| {
        let sa = u32::from(coverage3(b[alpha], m, opacity));
        let mut d = a;
        d[alpha] = a[alpha] + int_mult(255 - u32::from(a[alpha]), sa) as u8;
        d
    });
}

/// Remove `color` from `src` by raising transparency; both are `[r, g, b, a]` in `0..=1`.
fn color_to_alpha(src: [f64; 4], color: [f64; 4]) -> [f64; 4] {
    let mut alpha = [0.0f64; 3];
    for c in 0..3 {
        alpha[c] = if color[c] < 0.0001 {
            src[c]
        } else if src[c] > color[c] {
            (src[c] - color[c]) / (1.0 - color[c])
        } else if src[c] < color[c] {
            (color[c] - src[c]) / color[c]
        } else {
            0.0
        };
    }

    let strongest = if alpha[0] > alpha[1] {
        if alpha[0] > alpha[2] { alpha[0] } else { alpha[2] }
    } else if alpha[1] > alpha[2] {
        alpha[1]
    } else {
        alpha[2]
    };

    let a = (1.0 - color[3]) + strongest * color[3];
    if a < 0.0001 {
        return [src[0], src[1], src[2], a];
    }

    let mut out = [0.0; 4];
    for c in 0..3 {
        out[c] = (src[c] - color[c]) / a + color[c];
    }
    out[3] = a * src[3];
    out
}

fn unit(v: u8) -> f64 {
    f64::from(v) / 255.0
}

fn from_unit(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

fn color_erase(ctx: &mut CompositeContext<'_>) {
    let gray = ctx.pixelformat_a.is_gray();
    let alpha = ctx.bpp_a() - 1;
    let opacity = ctx.params.opacity;
    for_each_pixel(ctx, |_, a, b, m| {
        let sa = coverage3(b[alpha], m, opacity);
        let (src, color) = if gray {
            (
                [unit(a[0]), unit(a[0]), unit(a[0]), unit(a[1])],
                [unit(b[0]), unit(b[0]), unit(b[0]), unit(sa)],
            )
        } else {
            (
                [unit(a[0]), unit(a[1]), unit(a[2]), unit(a[3])],
                [unit(b[0]), unit(b[1]), unit(b[2]), unit(sa)],
            )
        };
        let out = color_to_alpha(src, color);
        if gray {
            [from_unit(out[0]), from_unit(out[3]), 0, 0]
        } else {
            [
                from_unit(out[0]),
                from_unit(out[1]),
                from_unit(out[2]),
                from_unit(out[3]),
            ]
        }
    });
}

/// `a / b` rounded to nearest, ties down.
fn int_div(a: u32, b: u32) -> u32 {
    a / b + u32::from(a % b > b / 2)
}

fn replace(ctx: &mut CompositeContext<'_>) {
    let has_alpha = ctx.pixelformat_a.has_alpha();
    let bpp = ctx.bpp_a();
    let colors = bpp - usize::from(has_alpha);
    let params = ctx.params;
    let opacity = u32::from(params.opacity);

    for_each_pixel(ctx, |_, a, b, m| {
        let m = u32::from(m.unwrap_or(255));
        let a_alpha = if has_alpha { a[colors] } else { 255 };
        let b_alpha = if has_alpha { b[colors] } else { 255 };
        let na = int_blend(b_alpha, a_alpha, int_mult(m, opacity) as u8);

        let mut d = a;
        if na != 0 {
            let ratio = int_div(m * opacity / 255 * u32::from(b_alpha), u32::from(na));
            for c in 0..colors {
                if !params.affect[c] {
                    continue;
                }
                let (x, y) = (i32::from(a[c]), i32::from(b[c]));
                let step = int_div(x.abs_diff(y) * ratio, 255) as i32;
                d[c] = clamp_u8(if y > x { x + step } else { x - step });
            }
        }
        if has_alpha && params.affect[colors] {
            d[colors] = na;
        }
        d
    });
}

fn dissolve_seeds() -> &'static [u32] {
    static SEEDS: OnceLock<Vec<u32>> = OnceLock::new();
    SEEDS.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(DISSOLVE_SEED);
        (0..DISSOLVE_ROWS).map(|_| rng.random::<u32>()).collect()
    })
}

/// Row-deterministic noise: the same `(x, y)` always draws the same value.
fn dissolve_rng(x: i32, y: i32) -> StdRng {
    let row = y.rem_euclid(DISSOLVE_ROWS as i32) as usize;
    let mut rng = StdRng::seed_from_u64(u64::from(dissolve_seeds()[row]));
    for _ in 0..x.max(0) {
        rng.random::<u32>();
    }
    rng
}

fn dissolve(ctx: &mut CompositeContext<'_>) {
    let b_alpha = ctx.pixelformat_b.has_alpha();
    let colors = ctx.pixelformat_b.color_channels();
    let params = ctx.params;
    let opacity = i32::from(params.opacity);
    let mut rng = dissolve_rng(params.x, params.y);

    map_b_pixels(ctx, |b, m| {
        let draw: i32 = rng.random_range(0..255);
        let ba = i32::from(b[colors]);
        let combined = match (m.map(i32::from), b_alpha) {
            (Some(m), true) => opacity * ba * m / (255 * 255),
            (Some(m), false) => opacity * m / 255,
            (None, true) => opacity * ba / 255,
            (None, false) => opacity,
        };
        let mut d = [0u8; 4];
        d[..colors].copy_from_slice(&b[..colors]);
        d[colors] = if draw >= combined { 0 } else { 255 };
        d
    });
}

fn blend(ctx: &mut CompositeContext<'_>) {
    let w = ctx.params.blend;
    for_each_pixel(ctx, |_, a, b, _| {
        let mut d = [0u8; 4];
        for c in 0..4 {
            d[c] = blend_byte(a[c], b[c], w);
        }
        d
    });
}

fn shade(ctx: &mut CompositeContext<'_>) {
    let w = u32::from(ctx.params.blend);
    let colors = ctx.pixelformat_a.color_channels();
    let sb = ctx.bpp_b();
    let mut shade = [0u8; 4];
    if let Some(px) = ctx.operands.b().get(..sb) {
        shade[..sb].copy_from_slice(px);
    }

    map_pixels(ctx, |a| {
        let mut d = a;
        for c in 0..colors {
            d[c] = div_255(u32::from(a[c]) * (255 - w) + u32::from(shade[c]) * w) as u8;
        }
        d
    });
}

fn swap(ctx: &mut CompositeContext<'_>) {
    if let Some((a, b)) = exchange_rows(ctx) {
        a.swap_with_slice(b);
    }
}

fn scale(ctx: &mut CompositeContext<'_>) {
    let s = ctx.params.scale;
    map_pixels(ctx, |a| a.map(|x| scale_byte(x, s)));
}

fn convert(ctx: &mut CompositeContext<'_>) {
    let (from, to) = (ctx.pixelformat_a, ctx.pixelformat_d);
    let (a_alpha, d_colors) = (from.color_channels(), to.color_channels());
    map_pixels(ctx, |a| {
        let mut d = [0u8; 4];
        match (from.is_gray(), to.is_gray()) {
            (true, false) => d[..3].fill(a[0]),
            (false, true) => d[0] = intensity(a[0], a[1], a[2]),
            _ => d[..d_colors].copy_from_slice(&a[..d_colors]),
        }
        if to.has_alpha() {
            d[d_colors] = if from.has_alpha() { a[a_alpha] } else { 255 };
        }
        d
    });
}

fn insert(
    builder: &mut TableBuilder,
    op: CompositeOp,
    a: PixelFormat,
    b: PixelFormat,
    d: PixelFormat,
    f: KernelFn,
) {
    builder.insert(op, a, b, d, f, Family::Generic);
}

const LAW_OPS: [CompositeOp; 16] = [
    CompositeOp::Multiply,
    CompositeOp::Screen,
    CompositeOp::Overlay,
    CompositeOp::Difference,
    CompositeOp::Addition,
    CompositeOp::Subtract,
    CompositeOp::Darken,
    CompositeOp::Lighten,
    CompositeOp::Divide,
    CompositeOp::Dodge,
    CompositeOp::Burn,
    CompositeOp::HardLight,
    CompositeOp::SoftLight,
    CompositeOp::GrainExtract,
    CompositeOp::GrainMerge,
    CompositeOp::Xor,
];

const COMPONENT_OPS: [CompositeOp; 4] = [
    CompositeOp::Hue,
    CompositeOp::Saturation,
    CompositeOp::ColorOnly,
    CompositeOp::Value,
];

/// Fill every entry the generic library supports.
pub(crate) fn install(builder: &mut TableBuilder) {
    use PixelFormat::{Any, Rgba8, Va8};
    let eight = PixelFormat::EIGHT_BIT;
    let b_slots = [eight[0], eight[1], eight[2], eight[3], Any];

    for a in eight {
        for b in eight.into_iter().filter(|b| a.same_model(*b)) {
            for op in LAW_OPS {
                insert(builder, op, a, b, b, law_any);
            }
            for op in COMPONENT_OPS {
                insert(builder, op, a, b, b, component_any);
            }
        }
    }

    for f in eight {
        insert(builder, CompositeOp::Normal, f, f, f, normal);
        insert(builder, CompositeOp::Behind, f, f, f, behind);
        insert(builder, CompositeOp::Replace, f, f, f, replace);
        insert(builder, CompositeOp::Blend, f, f, f, blend);
        insert(builder, CompositeOp::Shade, f, f, f, shade);
        insert(builder, CompositeOp::Swap, f, f, f, swap);
        insert(builder, CompositeOp::Swap, f, f, Any, swap);

        let d = if f.has_alpha() { f } else { f.alpha_dual() };
        for a in b_slots {
            insert(builder, CompositeOp::Dissolve, a, f, d, dissolve);
            insert(builder, CompositeOp::Scale, f, a, f, scale);
        }

        for to in eight {
            for b in b_slots {
                insert(builder, CompositeOp::Convert, f, b, to, convert);
            }
        }
    }

    for f in [Va8, Rgba8] {
        insert(builder, CompositeOp::Erase, f, f, f, erase);
        insert(builder, CompositeOp::AntiErase, f, f, f, anti_erase);
        insert(builder, CompositeOp::ColorErase, f, f, f, color_erase);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/generic.rs"]
mod tests;
