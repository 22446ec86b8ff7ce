//! The closed set of compositing operations and the opacity side table callers consult.

use serde::{Deserialize, Serialize};

use crate::foundation::error::{CompositeError, CompositeResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeOp {
    Normal,
    Dissolve,
    Behind,
    Multiply,
    Screen,
    Overlay,
    Difference,
    Addition,
    Subtract,
    Darken,
    Lighten,
    Hue,
    Saturation,
    ColorOnly,
    Value,
    Divide,
    Dodge,
    Burn,
    HardLight,
    SoftLight,
    GrainExtract,
    GrainMerge,
    ColorErase,
    Erase,
    Replace,
    AntiErase,
    Blend,
    Shade,
    Swap,
    Scale,
    Convert,
    Xor,
}

/// How an operation changes the opacity of the pixels it touches.
///
/// Kernels never read this; paint and layer code uses it to decide whether a stroke can
/// be skipped or whether the destination needs an alpha channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ModeFlags {
    pub affect_alpha: bool,
    pub increase_opacity: bool,
    pub decrease_opacity: bool,
}

impl ModeFlags {
    const fn new(affect_alpha: bool, increase_opacity: bool, decrease_opacity: bool) -> Self {
        Self {
            affect_alpha,
            increase_opacity,
            decrease_opacity,
        }
    }
}

impl CompositeOp {
    pub const ALL: [CompositeOp; 32] = [
        CompositeOp::Normal,
        CompositeOp::Dissolve,
        CompositeOp::Behind,
        CompositeOp::Multiply,
        CompositeOp::Screen,
        CompositeOp::Overlay,
        CompositeOp::Difference,
        CompositeOp::Addition,
        CompositeOp::Subtract,
        CompositeOp::Darken,
        CompositeOp::Lighten,
        CompositeOp::Hue,
        CompositeOp::Saturation,
        CompositeOp::ColorOnly,
        CompositeOp::Value,
        CompositeOp::Divide,
        CompositeOp::Dodge,
        CompositeOp::Burn,
        CompositeOp::HardLight,
        CompositeOp::SoftLight,
        CompositeOp::GrainExtract,
        CompositeOp::GrainMerge,
        CompositeOp::ColorErase,
        CompositeOp::Erase,
        CompositeOp::Replace,
        CompositeOp::AntiErase,
        CompositeOp::Blend,
        CompositeOp::Shade,
        CompositeOp::Swap,
        CompositeOp::Scale,
        CompositeOp::Convert,
        CompositeOp::Xor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CompositeOp::Normal => "normal",
            CompositeOp::Dissolve => "dissolve",
            CompositeOp::Behind => "behind",
            CompositeOp::Multiply => "multiply",
            CompositeOp::Screen => "screen",
            CompositeOp::Overlay => "overlay",
            CompositeOp::Difference => "difference",
            CompositeOp::Addition => "addition",
            CompositeOp::Subtract => "subtract",
            CompositeOp::Darken => "darken",
            CompositeOp::Lighten => "lighten",
            CompositeOp::Hue => "hue",
            CompositeOp::Saturation => "saturation",
            CompositeOp::ColorOnly => "color-only",
            CompositeOp::Value => "value",
            CompositeOp::Divide => "divide",
            CompositeOp::Dodge => "dodge",
            CompositeOp::Burn => "burn",
            CompositeOp::HardLight => "hard-light",
            CompositeOp::SoftLight => "soft-light",
            CompositeOp::GrainExtract => "grain-extract",
            CompositeOp::GrainMerge => "grain-merge",
            CompositeOp::ColorErase => "color-erase",
            CompositeOp::Erase => "erase",
            CompositeOp::Replace => "replace",
            CompositeOp::AntiErase => "anti-erase",
            CompositeOp::Blend => "blend",
            CompositeOp::Shade => "shade",
            CompositeOp::Swap => "swap",
            CompositeOp::Scale => "scale",
            CompositeOp::Convert => "convert",
            CompositeOp::Xor => "xor",
        }
    }

    pub fn flags(self) -> ModeFlags {
        use CompositeOp::*;
        match self {
            Normal | Dissolve | Behind | AntiErase | Convert => ModeFlags::new(true, true, false),
            ColorErase | Erase | Scale => ModeFlags::new(true, false, true),
            Replace | Blend => ModeFlags::new(true, true, true),
            _ => ModeFlags::new(false, false, false),
        }
    }
}

impl std::fmt::Display for CompositeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CompositeOp {
    type Err = CompositeError;

    fn from_str(s: &str) -> CompositeResult<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        CompositeOp::ALL
            .into_iter()
            .find(|op| op.name() == wanted)
            .ok_or_else(|| CompositeError::config(format!("unknown composite op '{s}'")))
    }
}

#[cfg(test)]
#[path = "../tests/unit/op.rs"]
mod tests;
