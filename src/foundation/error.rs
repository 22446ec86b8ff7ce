use crate::format::PixelFormat;
use crate::op::CompositeOp;

pub type CompositeResult<T> = Result<T, CompositeError>;

#[derive(thiserror::Error, Debug)]
pub enum CompositeError {
    #[error("unsupported combination: {op} {a}/{b}/{d}")]
    UnsupportedCombination {
        op: CompositeOp,
        a: PixelFormat,
        b: PixelFormat,
        d: PixelFormat,
    },

    #[error("operand layout error: {0}")]
    OperandLayout(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl CompositeError {
    pub fn unsupported(op: CompositeOp, a: PixelFormat, b: PixelFormat, d: PixelFormat) -> Self {
        Self::UnsupportedCombination { op, a, b, d }
    }

    pub fn operand_layout(msg: impl Into<String>) -> Self {
        Self::OperandLayout(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
