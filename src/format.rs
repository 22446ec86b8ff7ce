//! Pixel format tags and their static metadata.

use serde::{Deserialize, Serialize};

/// Pixel layout of one operand buffer.
///
/// Every concrete tag has a fixed byte width and alpha flag. [`PixelFormat::Any`] is a
/// wildcard for mask and don't-care slots and has no byte width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    V8,
    Va8,
    Rgb8,
    Rgba8,
    V16,
    Va16,
    Rgb16,
    Rgba16,
    V32,
    Va32,
    Rgb32,
    Rgba32,
    Any,
}

const BYTES_PER_PIXEL: [u8; 13] = [1, 2, 3, 4, 2, 4, 6, 8, 4, 8, 12, 16, 0];

const HAS_ALPHA: [bool; 13] = [
    false, true, false, true, false, true, false, true, false, true, false, true, false,
];

const ALPHA_DUAL: [PixelFormat; 13] = [
    PixelFormat::Va8,
    PixelFormat::V8,
    PixelFormat::Rgba8,
    PixelFormat::Rgb8,
    PixelFormat::Va16,
    PixelFormat::V16,
    PixelFormat::Rgba16,
    PixelFormat::Rgb16,
    PixelFormat::Va32,
    PixelFormat::V32,
    PixelFormat::Rgba32,
    PixelFormat::Rgb32,
    PixelFormat::Any,
];

const NAMES: [&str; 13] = [
    "v8", "va8", "rgb8", "rgba8", "v16", "va16", "rgb16", "rgba16", "v32", "va32", "rgb32",
    "rgba32", "any",
];

impl PixelFormat {
    /// Every tag, in table order.
    pub const ALL: [PixelFormat; 13] = [
        PixelFormat::V8,
        PixelFormat::Va8,
        PixelFormat::Rgb8,
        PixelFormat::Rgba8,
        PixelFormat::V16,
        PixelFormat::Va16,
        PixelFormat::Rgb16,
        PixelFormat::Rgba16,
        PixelFormat::V32,
        PixelFormat::Va32,
        PixelFormat::Rgb32,
        PixelFormat::Rgba32,
        PixelFormat::Any,
    ];

    /// The formats kernels exist for.
    pub const EIGHT_BIT: [PixelFormat; 4] = [
        PixelFormat::V8,
        PixelFormat::Va8,
        PixelFormat::Rgb8,
        PixelFormat::Rgba8,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Byte width of one pixel; `None` only for [`PixelFormat::Any`].
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match BYTES_PER_PIXEL[self.index()] {
            0 => None,
            n => Some(usize::from(n)),
        }
    }

    pub fn has_alpha(self) -> bool {
        HAS_ALPHA[self.index()]
    }

    /// The same color model with alpha toggled (`V8 <-> VA8`, `RGB8 <-> RGBA8`, ...).
    pub fn alpha_dual(self) -> PixelFormat {
        ALPHA_DUAL[self.index()]
    }

    pub fn name(self) -> &'static str {
        NAMES[self.index()]
    }

    /// Number of non-alpha channels, or 0 for [`PixelFormat::Any`].
    pub fn color_channels(self) -> usize {
        match self {
            PixelFormat::Any => 0,
            _ if self.is_gray() => 1,
            _ => 3,
        }
    }

    /// True for the gray models (`V*`, `VA*`).
    pub fn is_gray(self) -> bool {
        matches!(
            self,
            PixelFormat::V8
                | PixelFormat::Va8
                | PixelFormat::V16
                | PixelFormat::Va16
                | PixelFormat::V32
                | PixelFormat::Va32
        )
    }

    /// True when both tags describe the same color model at any width or alpha.
    pub fn same_model(self, other: PixelFormat) -> bool {
        self != PixelFormat::Any
            && other != PixelFormat::Any
            && self.is_gray() == other.is_gray()
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "../tests/unit/format.rs"]
mod tests;
