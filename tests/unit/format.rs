use super::*;

#[test]
fn alpha_dual_is_an_involution_that_toggles_alpha() {
    for fmt in PixelFormat::ALL {
        if fmt == PixelFormat::Any {
            continue;
        }
        assert_eq!(fmt.alpha_dual().alpha_dual(), fmt, "{fmt}");
        assert_ne!(fmt.has_alpha(), fmt.alpha_dual().has_alpha(), "{fmt}");
        assert_eq!(fmt.is_gray(), fmt.alpha_dual().is_gray(), "{fmt}");
    }
}

#[test]
fn any_is_a_wildcard() {
    assert_eq!(PixelFormat::Any.bytes_per_pixel(), None);
    assert_eq!(PixelFormat::Any.alpha_dual(), PixelFormat::Any);
    assert!(!PixelFormat::Any.has_alpha());
    assert!(!PixelFormat::Any.same_model(PixelFormat::Any));
}

#[test]
fn byte_widths_match_layout() {
    let expected = [1, 2, 3, 4, 2, 4, 6, 8, 4, 8, 12, 16];
    for (fmt, want) in PixelFormat::ALL.iter().zip(expected) {
        assert_eq!(fmt.bytes_per_pixel(), Some(want), "{fmt}");
    }
}

#[test]
fn eight_bit_formats_split_into_two_models() {
    let [v8, va8, rgb8, rgba8] = PixelFormat::EIGHT_BIT;
    assert!(v8.same_model(va8));
    assert!(rgb8.same_model(rgba8));
    assert!(!v8.same_model(rgb8));
    assert_eq!(va8.color_channels(), 1);
    assert_eq!(rgba8.color_channels(), 3);
}

#[test]
fn names_are_lowercase_and_serde_agrees() {
    assert_eq!(PixelFormat::Rgba8.to_string(), "rgba8");
    assert_eq!(PixelFormat::Va16.name(), "va16");
    let json = serde_json::to_string(&PixelFormat::Rgb32).unwrap();
    assert_eq!(json, "\"rgb32\"");
}
