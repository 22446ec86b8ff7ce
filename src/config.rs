//! Runtime knobs: the `BLENDKIT_COMPOSITE` switch and the host capability vector.

use crate::foundation::error::{CompositeError, CompositeResult};

pub const ENV_VAR: &str = "BLENDKIT_COMPOSITE";

const USE_EXTENSIONS: u32 = 0x1;
const VERBOSE: u32 = 0x2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositeOptions {
    /// Install accelerated families on top of the generic kernels.
    pub use_extensions: bool,
    /// Report probe results at `info` instead of `debug`.
    pub verbose: bool,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self::from_bits(USE_EXTENSIONS)
    }
}

impl CompositeOptions {
    pub fn generic_only() -> Self {
        Self {
            use_extensions: false,
            verbose: false,
        }
    }

    pub fn from_bits(bits: u32) -> Self {
        Self {
            use_extensions: bits & USE_EXTENSIONS != 0,
            verbose: bits & VERBOSE != 0,
        }
    }

    pub fn bits(self) -> u32 {
        let mut bits = 0;
        if self.use_extensions {
            bits |= USE_EXTENSIONS;
        }
        if self.verbose {
            bits |= VERBOSE;
        }
        bits
    }

    /// Parse a hex bitmask such as `1`, `0x3` or `0X0`.
    pub fn parse(value: &str) -> CompositeResult<Self> {
        let v = value.trim();
        let digits = v
            .strip_prefix("0x")
            .or_else(|| v.strip_prefix("0X"))
            .unwrap_or(v);
        u32::from_str_radix(digits, 16)
            .map(Self::from_bits)
            .map_err(|e| CompositeError::config(format!("{ENV_VAR}={value:?}: {e}")))
    }

    /// Read [`ENV_VAR`]; unset means the default, garbage is logged and ignored.
    pub fn from_env() -> Self {
        match std::env::var(ENV_VAR) {
            Ok(v) => Self::parse(&v).unwrap_or_else(|err| {
                tracing::warn!(%err, "ignoring composite options");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

/// Which accelerated families the host can run.
///
/// Install only reads this vector; it never probes the CPU itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Capabilities {
    pub swar: bool,
    pub sse2: bool,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }

    /// Query the running CPU.
    pub fn detect() -> Self {
        Self {
            swar: true,
            sse2: detect_sse2(),
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn detect_sse2() -> bool {
    std::is_x86_feature_detected!("sse2")
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn detect_sse2() -> bool {
    false
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
