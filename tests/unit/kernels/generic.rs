use super::*;
use crate::config::{Capabilities, CompositeOptions};
use crate::context::{CompositeParams, Operands};
use crate::dispatch::table::{KernelKey, install as build_table};

fn bytes() -> impl Iterator<Item = (u8, u8)> {
    (0..=255u8).flat_map(|a| (0..=255u8).map(move |b| (a, b)))
}

/// Run one generic kernel on separate buffers.
fn apply(
    op: CompositeOp,
    formats: (PixelFormat, PixelFormat, PixelFormat),
    a: &[u8],
    b: &[u8],
    params: CompositeParams,
) -> Vec<u8> {
    apply_masked(op, formats, a, b, None, params)
}

fn apply_masked(
    op: CompositeOp,
    formats: (PixelFormat, PixelFormat, PixelFormat),
    a: &[u8],
    b: &[u8],
    mask: Option<&[u8]>,
    params: CompositeParams,
) -> Vec<u8> {
    let table = build_table(CompositeOptions::generic_only(), Capabilities::none());
    let bpp_b = formats.1.bytes_per_pixel().unwrap_or(0);
    let n = if bpp_b == 0 {
        a.len() / formats.0.bytes_per_pixel().unwrap_or(1)
    } else {
        b.len() / bpp_b
    };
    let mut d = vec![0u8; n * formats.2.bytes_per_pixel().unwrap_or(0)];
    let mut ctx = CompositeContext::new(op, formats, n, Operands::Separate { a, b, d: &mut d })
        .with_params(params);
    if let Some(m) = mask {
        ctx = ctx.with_mask(m);
    }
    table.dispatch(&mut ctx).expect("supported");
    d
}

fn same(f: PixelFormat) -> (PixelFormat, PixelFormat, PixelFormat) {
    (f, f, f)
}

#[test]
fn law_identities_hold_over_every_pair() {
    for (a, b) in bytes() {
        assert_eq!(multiply(a, b), multiply(b, a));
        assert_eq!(screen(a, b), 255 - multiply(255 - a, 255 - b));
        assert_eq!(difference(a, b), difference(b, a));
        assert!(darken(a, b) <= lighten(a, b));
        assert_eq!(xor(xor(a, b), b), a);
        assert!(subtract(addition(a, b), b) <= a);
    }
    for a in 0..=255u8 {
        assert_eq!(multiply(a, 255), a);
        assert_eq!(multiply(a, 0), 0);
        assert_eq!(screen(a, 0), a);
        assert_eq!(dodge(a, 0), a);
        assert_eq!(burn(a, 255), a);
        assert_eq!(hard_light(a, 128), a);
        assert_eq!(grain_extract(a, a), 128);
        assert_eq!(grain_merge(a, 128), a);
        assert_eq!(overlay(0, a), 0);
        assert_eq!(soft_light(0, a), 0);
        assert_eq!(soft_light(255, a), 255);
    }
}

#[test]
fn law_spot_values() {
    assert_eq!(multiply(200, 128), 100);
    assert_eq!(screen(128, 128), 192);
    assert_eq!(addition(200, 100), 255);
    assert_eq!(subtract(100, 200), 0);
    assert_eq!(divide(255, 0), 255);
    assert_eq!(divide(100, 255), 100);
    assert_eq!(burn(0, 0), 0);
    assert_eq!(burn(255, 0), 255);
    assert_eq!(grain_extract(0, 255), 0);
    assert_eq!(grain_merge(255, 255), 255);
}

#[test]
fn law_ops_keep_the_weaker_alpha() {
    let f = PixelFormat::Rgba8;
    let d = apply(
        CompositeOp::Addition,
        same(f),
        &[200, 100, 50, 128],
        &[100, 100, 10, 255],
        CompositeParams::default(),
    );
    assert_eq!(d, [255, 200, 60, 128]);
}

#[test]
fn law_ops_take_alpha_from_b_when_only_b_has_it() {
    let d = apply(
        CompositeOp::Multiply,
        (PixelFormat::Rgb8, PixelFormat::Rgba8, PixelFormat::Rgba8),
        &[200, 255, 0],
        &[128, 7, 9, 77],
        CompositeParams::default(),
    );
    assert_eq!(d, [100, 7, 0, 77]);
}

#[test]
fn value_transfers_brightness() {
    let f = PixelFormat::Rgb8;
    let d = apply(
        CompositeOp::Value,
        same(f),
        &[255, 0, 0],
        &[0, 0, 128],
        CompositeParams::default(),
    );
    assert_eq!(d, [128, 0, 0]);
}

#[test]
fn component_ops_on_gray_copy_b() {
    let f = PixelFormat::Va8;
    let d = apply(
        CompositeOp::Hue,
        same(f),
        &[10, 20, 30, 40],
        &[50, 60, 70, 80],
        CompositeParams::default(),
    );
    assert_eq!(d, [50, 60, 70, 80]);
}

#[test]
fn normal_with_opaque_source_copies_b() {
    let f = PixelFormat::Rgba8;
    let d = apply(
        CompositeOp::Normal,
        same(f),
        &[1, 2, 3, 40, 9, 9, 9, 255],
        &[100, 150, 200, 255, 50, 60, 70, 0],
        CompositeParams::default(),
    );
    assert_eq!(&d[..4], &[100, 150, 200, 255]);
    // Fully transparent B leaves A alone.
    assert_eq!(&d[4..], &[9, 9, 9, 255]);
}

#[test]
fn normal_without_alpha_interpolates_by_opacity() {
    let f = PixelFormat::Rgb8;
    let params = CompositeParams {
        opacity: 128,
        ..CompositeParams::default()
    };
    let d = apply(CompositeOp::Normal, same(f), &[0, 0, 0], &[255, 255, 255], params);
    assert_eq!(d, [128, 128, 128]);
}

#[test]
fn normal_respects_affect_and_mask() {
    let f = PixelFormat::Rgba8;
    let params = CompositeParams {
        affect: [true, false, true, true],
        ..CompositeParams::default()
    };
    let d = apply_masked(
        CompositeOp::Normal,
        same(f),
        &[0, 0, 0, 255, 0, 0, 0, 255],
        &[200, 200, 200, 255, 200, 200, 200, 255],
        Some(&[255u8, 0][..]),
        params,
    );
    assert_eq!(&d[..4], &[200, 0, 200, 255]);
    assert_eq!(&d[4..], &[0, 0, 0, 255]);
}

#[test]
fn behind_keeps_opaque_a() {
    let f = PixelFormat::Rgba8;
    let d = apply(
        CompositeOp::Behind,
        same(f),
        &[10, 20, 30, 255],
        &[200, 200, 200, 255],
        CompositeParams::default(),
    );
    assert_eq!(d, [10, 20, 30, 255]);
}

#[test]
fn erase_and_anti_erase_move_alpha_only() {
    let f = PixelFormat::Rgba8;
    let a = [10, 20, 30, 200];
    let b = [0, 0, 0, 255];
    let erased = apply(CompositeOp::Erase, same(f), &a, &b, CompositeParams::default());
    assert_eq!(erased, [10, 20, 30, 0]);

    let restored = apply(
        CompositeOp::AntiErase,
        same(f),
        &[10, 20, 30, 0],
        &b,
        CompositeParams::default(),
    );
    assert_eq!(restored, [10, 20, 30, 255]);

    let transparent = CompositeParams {
        opacity: 0,
        ..CompositeParams::default()
    };
    assert_eq!(apply(CompositeOp::Erase, same(f), &a, &b, transparent), a);
}

#[test]
fn color_erase_removes_matching_color() {
    let f = PixelFormat::Rgba8;
    let d = apply(
        CompositeOp::ColorErase,
        same(f),
        &[120, 60, 30, 255],
        &[120, 60, 30, 255],
        CompositeParams::default(),
    );
    assert_eq!(d[3], 0);
}

#[test]
fn replace_at_full_opacity_is_b() {
    let f = PixelFormat::Rgba8;
    let d = apply(
        CompositeOp::Replace,
        same(f),
        &[10, 20, 30, 40],
        &[200, 100, 0, 90],
        CompositeParams::default(),
    );
    assert_eq!(d, [200, 100, 0, 90]);

    let none = CompositeParams {
        opacity: 0,
        ..CompositeParams::default()
    };
    let d = apply(CompositeOp::Replace, same(f), &[10, 20, 30, 40], &[200, 100, 0, 90], none);
    assert_eq!(d, [10, 20, 30, 40]);
}

fn dissolve_row(opacity: u8, x: i32, y: i32) -> Vec<u8> {
    let b: Vec<u8> = (0..64 * 3).map(|i| i as u8).collect();
    let params = CompositeParams {
        opacity,
        x,
        y,
        ..CompositeParams::default()
    };
    apply(
        CompositeOp::Dissolve,
        (PixelFormat::Any, PixelFormat::Rgb8, PixelFormat::Rgba8),
        &[],
        &b,
        params,
    )
}

#[test]
fn dissolve_is_deterministic_per_position() {
    assert_eq!(dissolve_row(128, 5, 9), dissolve_row(128, 5, 9));
    let row = dissolve_row(128, 0, 9);
    assert!(row.chunks(4).any(|p| p[3] == 0));
    assert!(row.chunks(4).any(|p| p[3] == 255));
    // Color bytes always come from B.
    assert_eq!(&row[..3], &[0, 1, 2]);
}

#[test]
fn dissolve_extremes() {
    assert!(dissolve_row(0, 0, 0).chunks(4).all(|p| p[3] == 0));
    assert!(dissolve_row(255, 0, 0).chunks(4).all(|p| p[3] == 255));
}

#[test]
fn dissolve_rows_draw_different_noise() {
    assert_ne!(dissolve_row(128, 0, 3), dissolve_row(128, 0, 4));
}

#[test]
fn blend_and_scale_extremes() {
    let f = PixelFormat::Rgba8;
    let a = [10, 20, 30, 40];
    let b = [200, 210, 220, 230];
    let at = |blend| CompositeParams {
        blend,
        ..CompositeParams::default()
    };
    assert_eq!(apply(CompositeOp::Blend, same(f), &a, &b, at(0)), a);
    assert_eq!(apply(CompositeOp::Blend, same(f), &a, &b, at(255)), b);

    let zero = CompositeParams {
        scale: 0,
        ..CompositeParams::default()
    };
    let scaled = apply(CompositeOp::Scale, (f, PixelFormat::Any, f), &a, &[], zero);
    assert_eq!(scaled, [0, 0, 0, 0]);
    let kept = apply(
        CompositeOp::Scale,
        (f, PixelFormat::Any, f),
        &a,
        &[],
        CompositeParams::default(),
    );
    assert_eq!(kept, a);
}

#[test]
fn shade_pulls_colors_towards_first_b_pixel() {
    let f = PixelFormat::Rgba8;
    let full = CompositeParams {
        blend: 255,
        ..CompositeParams::default()
    };
    let d = apply(
        CompositeOp::Shade,
        same(f),
        &[0, 0, 0, 77, 255, 255, 255, 88],
        &[10, 20, 30, 0, 1, 1, 1, 1],
        full,
    );
    assert_eq!(d, [10, 20, 30, 77, 10, 20, 30, 88]);
}

#[test]
fn convert_between_models() {
    let to_gray = apply(
        CompositeOp::Convert,
        (PixelFormat::Rgba8, PixelFormat::Any, PixelFormat::Va8),
        &[255, 255, 255, 9],
        &[],
        CompositeParams::default(),
    );
    assert_eq!(to_gray, [255, 9]);

    let to_rgb = apply(
        CompositeOp::Convert,
        (PixelFormat::V8, PixelFormat::Any, PixelFormat::Rgba8),
        &[42],
        &[],
        CompositeParams::default(),
    );
    assert_eq!(to_rgb, [42, 42, 42, 255]);

    let drop_alpha = apply(
        CompositeOp::Convert,
        (PixelFormat::Rgba8, PixelFormat::Any, PixelFormat::Rgb8),
        &[1, 2, 3, 4],
        &[],
        CompositeParams::default(),
    );
    assert_eq!(drop_alpha, [1, 2, 3]);
}

#[test]
fn swap_exchanges_buffers() {
    let f = PixelFormat::Va8;
    let (mut a, mut b) = (vec![1, 2, 3, 4], vec![5, 6, 7, 8]);
    let mut ctx = CompositeContext::new(
        CompositeOp::Swap,
        same(f),
        2,
        Operands::Exchange {
            a: &mut a,
            b: &mut b,
        },
    );
    swap(&mut ctx);
    assert_eq!((a, b), (vec![5, 6, 7, 8], vec![1, 2, 3, 4]));
}

#[test]
fn install_covers_same_model_law_pairs() {
    let table = build_table(CompositeOptions::generic_only(), Capabilities::none());
    use PixelFormat::*;
    for op in LAW_OPS {
        assert!(table.lookup(KernelKey::new(op, Rgb8, Rgba8, Rgba8)).is_some());
        assert!(table.lookup(KernelKey::new(op, V8, Va8, Va8)).is_some());
        assert!(table.lookup(KernelKey::new(op, V8, Rgb8, Rgb8)).is_none());
    }
    for f in PixelFormat::EIGHT_BIT {
        assert!(table.lookup(KernelKey::new(CompositeOp::Normal, f, f, f)).is_some());
    }
    assert!(
        table
            .lookup(KernelKey::new(CompositeOp::Erase, Rgb8, Rgb8, Rgb8))
            .is_none()
    );
}
