//! One compositing request: operands, formats and per-op parameters.

use crate::format::PixelFormat;
use crate::op::CompositeOp;

/// The buffers a kernel reads and writes.
///
/// Which variant a caller picks decides where the destination lives; kernels see the
/// same pixels either way.
pub enum Operands<'a> {
    /// The destination is its own buffer.
    Separate {
        a: &'a [u8],
        b: &'a [u8],
        d: &'a mut [u8],
    },
    /// The destination overwrites A. Requires `bpp(D) <= bpp(A)`.
    InPlace { a: &'a mut [u8], b: &'a [u8] },
    /// Both sources are writable. Swap needs this; every other op treats it as
    /// [`Operands::InPlace`].
    Exchange { a: &'a mut [u8], b: &'a mut [u8] },
}

/// Borrowed view a kernel driver walks.
pub(crate) enum Planes<'s> {
    Separate {
        a: &'s [u8],
        b: &'s [u8],
        d: &'s mut [u8],
    },
    /// A and D share storage.
    Aliased { ad: &'s mut [u8], b: &'s [u8] },
}

impl<'a> Operands<'a> {
    pub(crate) fn planes(&mut self) -> Planes<'_> {
        match self {
            Operands::Separate { a, b, d } => Planes::Separate { a, b, d },
            Operands::InPlace { a, b } => Planes::Aliased { ad: a, b },
            Operands::Exchange { a, b } => Planes::Aliased { ad: a, b },
        }
    }

    pub fn a(&self) -> &[u8] {
        match self {
            Operands::Separate { a, .. } => a,
            Operands::InPlace { a, .. } => a,
            Operands::Exchange { a, .. } => a,
        }
    }

    pub fn b(&self) -> &[u8] {
        match self {
            Operands::Separate { b, .. } => b,
            Operands::InPlace { b, .. } => b,
            Operands::Exchange { b, .. } => b,
        }
    }

    /// The destination as the caller sees it after the call.
    pub fn d(&self) -> &[u8] {
        match self {
            Operands::Separate { d, .. } => d,
            Operands::InPlace { a, .. } => a,
            Operands::Exchange { a, .. } => a,
        }
    }
}

/// Small per-op knobs. Ops ignore the fields they do not use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositeParams {
    /// Scale factor for [`CompositeOp::Scale`].
    pub scale: u8,
    /// Weight of B for [`CompositeOp::Blend`] and of the shade color for
    /// [`CompositeOp::Shade`].
    pub blend: u8,
    /// Layer opacity for the combine ops and Dissolve.
    pub opacity: u8,
    /// Per-channel write enable for the combine ops; index 3 (or 1 for gray) is alpha.
    pub affect: [bool; 4],
    /// Dissolve noise coordinates of the first pixel.
    pub x: i32,
    pub y: i32,
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self {
            scale: 255,
            blend: 0,
            opacity: 255,
            affect: [true; 4],
            x: 0,
            y: 0,
        }
    }
}

pub struct CompositeContext<'a> {
    pub op: CompositeOp,
    pub pixelformat_a: PixelFormat,
    pub pixelformat_b: PixelFormat,
    pub pixelformat_d: PixelFormat,
    /// Format of `mask`: `Any` without one, `V8` with one. Not part of the dispatch key;
    /// dispatch refuses a mask described as anything but `V8`.
    pub pixelformat_m: PixelFormat,
    pub n_pixels: usize,
    pub operands: Operands<'a>,
    /// One coverage byte per pixel.
    pub mask: Option<&'a [u8]>,
    pub params: CompositeParams,
}

impl<'a> CompositeContext<'a> {
    pub fn new(
        op: CompositeOp,
        formats: (PixelFormat, PixelFormat, PixelFormat),
        n_pixels: usize,
        operands: Operands<'a>,
    ) -> Self {
        let (a, b, d) = formats;
        Self {
            op,
            pixelformat_a: a,
            pixelformat_b: b,
            pixelformat_d: d,
            pixelformat_m: PixelFormat::Any,
            n_pixels,
            operands,
            mask: None,
            params: CompositeParams::default(),
        }
    }

    pub fn with_mask(mut self, mask: &'a [u8]) -> Self {
        self.mask = Some(mask);
        self.pixelformat_m = PixelFormat::V8;
        self
    }

    pub fn with_params(mut self, params: CompositeParams) -> Self {
        self.params = params;
        self
    }

    pub(crate) fn bpp_a(&self) -> usize {
        self.pixelformat_a.bytes_per_pixel().unwrap_or(0)
    }

    pub(crate) fn bpp_b(&self) -> usize {
        self.pixelformat_b.bytes_per_pixel().unwrap_or(0)
    }

    pub(crate) fn bpp_d(&self) -> usize {
        self.pixelformat_d.bytes_per_pixel().unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "../tests/unit/context.rs"]
mod tests;
