//! Bit-exactness and timing harness: every accelerated entry against its generic twin.
//!
//! The reference side always goes through a generic-only [`DispatchTable`]; the
//! accelerated side calls the kernel directly, so a missing generic twin shows up as an
//! error instead of a silent pass. Each family is checked from its own table, so a
//! kernel shadowed by a wider family is still compared.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{Capabilities, CompositeOptions};
use crate::context::{CompositeContext, CompositeParams, Operands};
use crate::dispatch::table::{
    DispatchTable, Family, Kernel, KernelKey, install, install_single,
};
use crate::format::PixelFormat;
use crate::foundation::error::CompositeResult;
use crate::op::CompositeOp;

/// At most this many mismatches are recorded per case; the count is always exact.
pub const MISMATCH_CAP: usize = 16;

/// How operand bytes are synthesised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestPattern {
    Zero,
    Full,
    Half,
    /// A walks `0..=255`; B advances one extra step every 256 bytes, so any 65536
    /// consecutive bytes hold every `(a, b)` pair.
    Ramp,
    Random(u64),
}

impl TestPattern {
    pub const DEFAULT_SEED: u64 = 0x5EED_B1E0;

    pub fn all() -> Vec<TestPattern> {
        vec![
            TestPattern::Zero,
            TestPattern::Full,
            TestPattern::Half,
            TestPattern::Ramp,
            TestPattern::Random(Self::DEFAULT_SEED),
        ]
    }

    /// Fill the A-side (`second == false`) or B-side buffer.
    pub fn fill(self, buf: &mut [u8], second: bool) {
        match self {
            TestPattern::Zero => buf.fill(0x00),
            TestPattern::Full => buf.fill(0xFF),
            TestPattern::Half => buf.fill(0x80),
            TestPattern::Ramp => {
                for (i, byte) in buf.iter_mut().enumerate() {
                    *byte = if second { (i / 256 + i) as u8 } else { i as u8 };
                }
            }
            TestPattern::Random(seed) => {
                let seed = if second { seed.wrapping_add(1) } else { seed };
                StdRng::seed_from_u64(seed).fill(buf);
            }
        }
    }
}

impl std::fmt::Display for TestPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestPattern::Zero => f.write_str("0x00"),
            TestPattern::Full => f.write_str("0xff"),
            TestPattern::Half => f.write_str("0x80"),
            TestPattern::Ramp => f.write_str("ramp"),
            TestPattern::Random(seed) => write!(f, "random({seed:#x})"),
        }
    }
}

/// One differing byte.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Which output buffer: `"d"`, or `"b"` for the second half of a swap.
    pub buffer: &'static str,
    pub offset: usize,
    pub pixel: usize,
    pub channel: usize,
    pub a: Option<u8>,
    pub b: Option<u8>,
    pub expected: u8,
    pub actual: u8,
}

#[derive(Clone, Debug, Serialize)]
pub struct CaseReport {
    pub kernel: String,
    pub key: KernelKey,
    pub family: Family,
    pub pattern: TestPattern,
    pub n_pixels: usize,
    pub mismatches: Vec<Mismatch>,
    pub mismatch_count: usize,
    pub generic_secs: f64,
    pub accelerated_secs: f64,
    /// `generic_secs / accelerated_secs`; `None` when nothing was timed.
    pub speedup: Option<f64>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.mismatch_count == 0
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RegressionReport {
    pub capabilities: Capabilities,
    pub families: Vec<Family>,
    pub cases: Vec<CaseReport>,
}

impl RegressionReport {
    pub fn failed(&self) -> bool {
        self.cases.iter().any(|c| !c.passed())
    }

    pub fn mismatch_count(&self) -> usize {
        self.cases.iter().map(|c| c.mismatch_count).sum()
    }
}

#[derive(Clone, Debug)]
pub struct RegressOptions {
    pub iterations: usize,
    pub n_pixels: usize,
    /// Only check this op.
    pub op: Option<CompositeOp>,
    pub patterns: Vec<TestPattern>,
    pub capabilities: Capabilities,
}

impl Default for RegressOptions {
    fn default() -> Self {
        Self {
            iterations: 10,
            n_pixels: 256 * 256 + 1,
            op: None,
            patterns: TestPattern::all(),
            capabilities: Capabilities::detect(),
        }
    }
}

/// Parameters every case runs with; non-trivial so blend and scale are exercised.
pub fn harness_params() -> CompositeParams {
    CompositeParams {
        blend: 0x5a,
        scale: 0xa5,
        ..CompositeParams::default()
    }
}

fn bpp(f: PixelFormat) -> usize {
    f.bytes_per_pixel().unwrap_or(0)
}

fn operands(key: KernelKey, n: usize, pattern: TestPattern) -> (Vec<u8>, Vec<u8>) {
    let mut a = vec![0u8; n * bpp(key.a)];
    let mut b = vec![0u8; n * bpp(key.b)];
    pattern.fill(&mut a, false);
    pattern.fill(&mut b, true);
    (a, b)
}

/// Buffers one side of a case runs over, allocated once so timed runs only pay for
/// the kernel.
struct Workspace {
    key: KernelKey,
    n: usize,
    a: Vec<u8>,
    b: Vec<u8>,
    d: Vec<u8>,
}

impl Workspace {
    fn new(key: KernelKey, n: usize, a: &[u8], b: &[u8]) -> Self {
        let d = if key.op == CompositeOp::Swap {
            Vec::new()
        } else {
            vec![0u8; n * bpp(key.d)]
        };
        Self {
            key,
            n,
            a: a.to_vec(),
            b: b.to_vec(),
            d,
        }
    }

    fn context(&mut self, params: CompositeParams) -> CompositeContext<'_> {
        let key = self.key;
        let operands = if key.op == CompositeOp::Swap {
            Operands::Exchange {
                a: &mut self.a,
                b: &mut self.b,
            }
        } else {
            Operands::Separate {
                a: &self.a,
                b: &self.b,
                d: &mut self.d,
            }
        };
        CompositeContext::new(key.op, (key.a, key.b, key.d), self.n, operands).with_params(params)
    }

    /// Call `func` `iterations` times over the same buffers.
    fn time(
        &mut self,
        func: &mut dyn FnMut(&mut CompositeContext<'_>) -> CompositeResult<()>,
        params: CompositeParams,
        iterations: usize,
    ) -> CompositeResult<f64> {
        let mut ctx = self.context(params);
        let start = Instant::now();
        for _ in 0..iterations {
            func(&mut ctx)?;
        }
        Ok(start.elapsed().as_secs_f64())
    }

    /// D, or the swapped A and B.
    fn outputs(self) -> (Vec<u8>, Option<Vec<u8>>) {
        if self.key.op == CompositeOp::Swap {
            (self.a, Some(self.b))
        } else {
            (self.d, None)
        }
    }
}

fn run_once(
    func: &mut dyn FnMut(&mut CompositeContext<'_>) -> CompositeResult<()>,
    key: KernelKey,
    n: usize,
    a: &[u8],
    b: &[u8],
    params: CompositeParams,
) -> CompositeResult<(Vec<u8>, Option<Vec<u8>>)> {
    let mut ws = Workspace::new(key, n, a, b);
    ws.time(func, params, 1)?;
    Ok(ws.outputs())
}

fn diff(
    buffer: &'static str,
    expected: &[u8],
    actual: &[u8],
    bpp: usize,
    a: &[u8],
    b: &[u8],
    found: &mut Vec<Mismatch>,
) -> usize {
    let mut count = 0;
    for (offset, (&e, &x)) in expected.iter().zip(actual).enumerate() {
        if e == x {
            continue;
        }
        count += 1;
        if found.len() < MISMATCH_CAP {
            found.push(Mismatch {
                buffer,
                offset,
                pixel: offset / bpp.max(1),
                channel: offset % bpp.max(1),
                a: a.get(offset).copied(),
                b: b.get(offset).copied(),
                expected: e,
                actual: x,
            });
        }
    }
    count + expected.len().abs_diff(actual.len())
}

/// Check one accelerated kernel against `reference` on one pattern.
pub fn compare(
    reference: &DispatchTable,
    kernel: &Kernel,
    key: KernelKey,
    n_pixels: usize,
    pattern: TestPattern,
    params: CompositeParams,
    iterations: usize,
) -> CompositeResult<CaseReport> {
    let (a, b) = operands(key, n_pixels, pattern);
    let mut generic = |ctx: &mut CompositeContext<'_>| reference.dispatch(ctx);
    let mut accelerated = |ctx: &mut CompositeContext<'_>| -> CompositeResult<()> {
        (kernel.func)(ctx);
        Ok(())
    };

    let (expected, expected_b) = run_once(&mut generic, key, n_pixels, &a, &b, params)?;
    let (actual, actual_b) = run_once(&mut accelerated, key, n_pixels, &a, &b, params)?;

    let mut mismatches = Vec::new();
    let mut mismatch_count = diff("d", &expected, &actual, bpp(key.d), &a, &b, &mut mismatches);
    if let (Some(e), Some(x)) = (&expected_b, &actual_b) {
        mismatch_count += diff("b", e, x, bpp(key.b), &a, &b, &mut mismatches);
    }

    let generic_secs =
        Workspace::new(key, n_pixels, &a, &b).time(&mut generic, params, iterations)?;
    let accelerated_secs =
        Workspace::new(key, n_pixels, &a, &b).time(&mut accelerated, params, iterations)?;
    let speedup = (iterations > 0 && accelerated_secs > 0.0).then(|| generic_secs / accelerated_secs);

    let report = CaseReport {
        kernel: kernel.name(key),
        key,
        family: kernel.family,
        pattern,
        n_pixels,
        mismatches,
        mismatch_count,
        generic_secs,
        accelerated_secs,
        speedup,
    };
    if report.passed() {
        debug!(kernel = %report.kernel, %pattern, ?speedup, "case ok");
    } else {
        warn!(kernel = %report.kernel, %pattern, mismatches = mismatch_count, "case mismatch");
    }
    Ok(report)
}

/// Check every kernel of every usable family, including entries a wider family would
/// take over in the process-wide table.
#[tracing::instrument(level = "debug", skip_all, fields(n_pixels = opts.n_pixels))]
pub fn run(opts: &RegressOptions) -> CompositeResult<RegressionReport> {
    let reference = install(CompositeOptions::generic_only(), Capabilities::none());
    let params = harness_params();

    let mut families = vec![Family::Generic];
    let mut cases = Vec::new();
    for family in Family::EXTENSIONS {
        if !family.usable(opts.capabilities) {
            debug!(%family, "family not usable, skipped");
            continue;
        }
        families.push(family);
        let table = install_single(family, opts.capabilities);
        for (key, kernel) in table.entries() {
            if kernel.family != family || opts.op.is_some_and(|op| op != key.op) {
                continue;
            }
            for &pattern in &opts.patterns {
                cases.push(compare(
                    &reference,
                    &kernel,
                    key,
                    opts.n_pixels,
                    pattern,
                    params,
                    opts.iterations,
                )?);
            }
        }
    }

    Ok(RegressionReport {
        capabilities: opts.capabilities,
        families,
        cases,
    })
}

#[cfg(test)]
#[path = "../tests/unit/regress.rs"]
mod tests;
