use super::*;
use crate::context::Operands;

fn everything() -> Capabilities {
    Capabilities {
        swar: true,
        sse2: true,
    }
}

fn key(op: CompositeOp, f: PixelFormat) -> KernelKey {
    KernelKey::new(op, f, f, f)
}

#[test]
fn disabled_extensions_leave_only_generic() {
    let table = install(CompositeOptions::generic_only(), everything());
    assert_eq!(table.families(), &[Family::Generic]);
    assert!(
        table
            .entries()
            .iter()
            .all(|(_, k)| k.family == Family::Generic)
    );
}

#[test]
fn capabilities_gate_families() {
    let table = install(CompositeOptions::default(), Capabilities::none());
    assert_eq!(table.families(), &[Family::Generic]);

    let swar_only = Capabilities {
        swar: true,
        sse2: false,
    };
    let table = install(CompositeOptions::default(), swar_only);
    let add = table.lookup(key(CompositeOp::Addition, PixelFormat::Rgba8));
    assert_eq!(add.map(|k| k.family), Some(Family::Swar));
    let mul = table.lookup(key(CompositeOp::Multiply, PixelFormat::Rgba8));
    assert_eq!(mul.map(|k| k.family), Some(Family::Generic));
}

#[test]
fn wider_family_wins_shared_entries() {
    let table = install(CompositeOptions::default(), everything());
    let add = table.lookup(key(CompositeOp::Addition, PixelFormat::Rgba8));
    let expected = if Family::Sse2.compiled_in() {
        Family::Sse2
    } else {
        Family::Swar
    };
    assert_eq!(add.map(|k| k.family), Some(expected));
}

#[test]
fn single_family_table_keeps_shadowed_kernels() {
    let table = install_single(Family::Swar, everything());
    assert_eq!(table.families(), &[Family::Generic, Family::Swar]);
    let add = table.lookup(key(CompositeOp::Addition, PixelFormat::Rgba8));
    assert_eq!(add.map(|k| k.family), Some(Family::Swar));
    let mul = table.lookup(key(CompositeOp::Multiply, PixelFormat::Rgba8));
    assert_eq!(mul.map(|k| k.family), Some(Family::Generic));

    let table = install_single(Family::Swar, Capabilities::none());
    assert_eq!(table.families(), &[Family::Generic]);
}

#[test]
fn accelerated_tables_never_lose_entries() {
    let generic = install(CompositeOptions::generic_only(), Capabilities::none());
    let full = install(CompositeOptions::default(), everything());
    assert_eq!(generic.len(), full.len());
    for (k, _) in generic.entries() {
        assert!(full.lookup(k).is_some(), "{k}");
    }
}

#[test]
fn later_insert_overwrites() {
    fn first(_: &mut CompositeContext<'_>) {}
    fn second(ctx: &mut CompositeContext<'_>) {
        ctx.params.opacity = 7;
    }
    let mut builder = TableBuilder::new();
    let f = PixelFormat::V8;
    builder.insert(CompositeOp::Normal, f, f, f, first, Family::Generic);
    builder.insert(CompositeOp::Normal, f, f, f, second, Family::Swar);
    assert_eq!(builder.len(), 1);
    let table = builder.freeze(CompositeOptions::default(), Capabilities::none());
    assert_eq!(table.families(), &[Family::Generic, Family::Swar]);

    let (a, b, mut d) = ([0u8], [0u8], [0u8]);
    let mut ctx = CompositeContext::new(CompositeOp::Normal, (f, f, f), 1, Operands::Separate {
        a: &a,
        b: &b,
        d: &mut d,
    });
    table.dispatch(&mut ctx).expect("entry");
    assert_eq!(ctx.params.opacity, 7);
}

#[test]
fn unsupported_combination_leaves_destination_untouched() {
    let table = install(CompositeOptions::default(), everything());
    let (a, b) = ([1u8, 2, 3], [4u8, 5, 6]);
    let mut d = [9u8; 3];
    let mut ctx = CompositeContext::new(
        CompositeOp::Erase,
        (PixelFormat::Rgb8, PixelFormat::Rgb8, PixelFormat::Rgb8),
        1,
        Operands::Separate {
            a: &a,
            b: &b,
            d: &mut d,
        },
    );
    let err = table.dispatch(&mut ctx).unwrap_err();
    assert!(matches!(err, CompositeError::UnsupportedCombination { .. }));
    assert_eq!(err.to_string(), "unsupported combination: erase rgb8/rgb8/rgb8");
    assert_eq!(d, [9, 9, 9]);
}

#[test]
fn swap_needs_exchange_operands() {
    let table = install(CompositeOptions::default(), everything());
    let f = PixelFormat::V8;
    let (a, b) = ([1u8], [2u8]);
    let mut d = [0u8];
    let mut ctx = CompositeContext::new(CompositeOp::Swap, (f, f, f), 1, Operands::Separate {
        a: &a,
        b: &b,
        d: &mut d,
    });
    let err = table.dispatch(&mut ctx).unwrap_err();
    assert!(matches!(err, CompositeError::OperandLayout(_)));
}

#[test]
fn mask_must_be_described_as_v8() {
    let table = install(CompositeOptions::default(), everything());
    let f = PixelFormat::Rgba8;
    let a = [10u8, 20, 30, 255];
    let b = [200u8, 100, 50, 255];
    let mask = [128u8];
    let mut d = [7u8; 4];
    let mut ctx = CompositeContext::new(CompositeOp::Normal, (f, f, f), 1, Operands::Separate {
        a: &a,
        b: &b,
        d: &mut d,
    })
    .with_mask(&mask);
    ctx.pixelformat_m = PixelFormat::Va8;
    let err = table.dispatch(&mut ctx).unwrap_err();
    assert!(matches!(err, CompositeError::OperandLayout(_)));
    assert!(err.to_string().contains("va8"));
    drop(ctx);
    assert_eq!(d, [7; 4]);

    let mut ctx = CompositeContext::new(CompositeOp::Normal, (f, f, f), 1, Operands::Separate {
        a: &a,
        b: &b,
        d: &mut d,
    })
    .with_mask(&mask);
    table.dispatch(&mut ctx).expect("v8 mask");
}

#[test]
fn kernel_names_follow_key_and_family() {
    let table = install(CompositeOptions::generic_only(), Capabilities::none());
    let k = key(CompositeOp::Multiply, PixelFormat::Rgba8);
    let kernel = table.lookup(k).expect("entry");
    assert_eq!(kernel.name(k), "multiply_rgba8_rgba8_rgba8_generic");
}

#[test]
fn entries_are_sorted() {
    let table = install(CompositeOptions::generic_only(), Capabilities::none());
    let entries = table.entries();
    assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
}
