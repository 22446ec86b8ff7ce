use super::*;

#[test]
fn params_defaults_are_neutral() {
    let p = CompositeParams::default();
    assert_eq!(p.scale, 255);
    assert_eq!(p.blend, 0);
    assert_eq!(p.opacity, 255);
    assert_eq!(p.affect, [true; 4]);
    assert_eq!((p.x, p.y), (0, 0));
}

#[test]
fn in_place_destination_is_a() {
    let mut a = vec![1u8, 2, 3, 4];
    let b = vec![9u8; 4];
    let ops = Operands::InPlace { a: &mut a, b: &b };
    assert_eq!(ops.d(), &[1, 2, 3, 4]);
    assert_eq!(ops.b(), &[9; 4]);
}

#[test]
fn builder_sets_mask_format() {
    let a = [0u8; 4];
    let b = [0u8; 4];
    let mut d = [0u8; 4];
    let mask = [255u8];
    let f = PixelFormat::Rgba8;
    let ctx = CompositeContext::new(
        CompositeOp::Normal,
        (f, f, f),
        1,
        Operands::Separate {
            a: &a,
            b: &b,
            d: &mut d,
        },
    )
    .with_mask(&mask);
    assert_eq!(ctx.pixelformat_m, PixelFormat::V8);
    assert_eq!(ctx.bpp_a(), 4);
    assert_eq!(ctx.mask, Some(&mask[..]));
}

#[test]
fn planes_alias_a_for_exchange() {
    let mut a = vec![1u8; 2];
    let mut b = vec![2u8; 2];
    let mut ops = Operands::Exchange {
        a: &mut a,
        b: &mut b,
    };
    match ops.planes() {
        Planes::Aliased { ad, b } => {
            ad[0] = b[0];
        }
        Planes::Separate { .. } => panic!("exchange must alias A"),
    }
    assert_eq!(a, vec![2, 1]);
}
