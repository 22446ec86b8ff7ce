//! The `(op, A, B, D) -> kernel` table and the install sequence that fills it.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Capabilities, CompositeOptions};
use crate::context::{CompositeContext, Operands};
use crate::format::PixelFormat;
use crate::foundation::error::{CompositeError, CompositeResult};
use crate::kernels;
use crate::op::CompositeOp;

/// Every kernel, generic or accelerated, has this shape.
pub type KernelFn = fn(&mut CompositeContext<'_>);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct KernelKey {
    pub op: CompositeOp,
    pub a: PixelFormat,
    pub b: PixelFormat,
    pub d: PixelFormat,
}

impl KernelKey {
    pub fn new(op: CompositeOp, a: PixelFormat, b: PixelFormat, d: PixelFormat) -> Self {
        Self { op, a, b, d }
    }

    pub fn of(ctx: &CompositeContext<'_>) -> Self {
        Self::new(
            ctx.op,
            ctx.pixelformat_a,
            ctx.pixelformat_b,
            ctx.pixelformat_d,
        )
    }
}

impl std::fmt::Display for KernelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_{}_{}", self.op, self.a, self.b, self.d)
    }
}

/// A kernel library. Accelerated families install in [`Family::EXTENSIONS`] order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Generic,
    Swar,
    Sse2,
}

impl Family {
    /// Narrow first, so the widest usable family owns any triple two families share.
    pub const EXTENSIONS: [Family; 2] = [Family::Swar, Family::Sse2];

    pub fn name(self) -> &'static str {
        match self {
            Family::Generic => "generic",
            Family::Swar => "swar",
            Family::Sse2 => "sse2",
        }
    }

    /// Whether this build carries the family's kernels at all.
    pub fn compiled_in(self) -> bool {
        match self {
            Family::Generic | Family::Swar => true,
            Family::Sse2 => cfg!(any(target_arch = "x86", target_arch = "x86_64")),
        }
    }

    /// Compiled in and marked usable by the capability vector.
    pub fn usable(self, caps: Capabilities) -> bool {
        let present = match self {
            Family::Generic => true,
            Family::Swar => caps.swar,
            Family::Sse2 => caps.sse2,
        };
        present && self.compiled_in()
    }

    fn install_into(self, builder: &mut TableBuilder) {
        match self {
            Family::Generic => kernels::generic::install(builder),
            Family::Swar => kernels::swar::install(builder),
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Family::Sse2 => kernels::sse2::install(builder),
            #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
            Family::Sse2 => {}
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Kernel {
    pub func: KernelFn,
    pub family: Family,
}

impl Kernel {
    /// Diagnostic name, e.g. `multiply_rgba8_rgba8_rgba8_sse2`.
    pub fn name(&self, key: KernelKey) -> String {
        format!("{key}_{}", self.family)
    }
}

/// Mutable table under construction. Only [`TableBuilder::freeze`] yields something that
/// can dispatch.
#[derive(Default)]
pub struct TableBuilder {
    entries: HashMap<KernelKey, Kernel>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) one cell.
    pub fn insert(
        &mut self,
        op: CompositeOp,
        a: PixelFormat,
        b: PixelFormat,
        d: PixelFormat,
        func: KernelFn,
        family: Family,
    ) {
        self.entries
            .insert(KernelKey::new(op, a, b, d), Kernel { func, family });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn freeze(self, options: CompositeOptions, capabilities: Capabilities) -> DispatchTable {
        let mut families = vec![Family::Generic];
        for family in Family::EXTENSIONS {
            if self.entries.values().any(|k| k.family == family) {
                families.push(family);
            }
        }
        DispatchTable {
            entries: self.entries,
            options,
            capabilities,
            families,
        }
    }
}

/// Immutable kernel table.
#[derive(Debug)]
pub struct DispatchTable {
    entries: HashMap<KernelKey, Kernel>,
    options: CompositeOptions,
    capabilities: Capabilities,
    families: Vec<Family>,
}

impl DispatchTable {
    pub fn lookup(&self, key: KernelKey) -> Option<&Kernel> {
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn options(&self) -> CompositeOptions {
        self.options
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Families that own at least one entry, generic first.
    pub fn families(&self) -> &[Family] {
        &self.families
    }

    /// All entries in key order.
    pub fn entries(&self) -> Vec<(KernelKey, Kernel)> {
        let mut v: Vec<_> = self.entries.iter().map(|(k, v)| (*k, *v)).collect();
        v.sort_by_key(|(k, _)| *k);
        v
    }

    /// Run the kernel for `ctx`'s op and formats.
    ///
    /// A missing entry is reported, never papered over, and D is left as it was.
    pub fn dispatch(&self, ctx: &mut CompositeContext<'_>) -> CompositeResult<()> {
        let key = KernelKey::of(ctx);
        let Some(kernel) = self.entries.get(&key) else {
            warn!(op = %key.op, a = %key.a, b = %key.b, d = %key.d, "unsupported composite");
            return Err(CompositeError::unsupported(key.op, key.a, key.b, key.d));
        };
        if key.op == CompositeOp::Swap && !matches!(ctx.operands, Operands::Exchange { .. }) {
            return Err(CompositeError::operand_layout(
                "swap exchanges A and B and needs Operands::Exchange",
            ));
        }
        if ctx.mask.is_some() && ctx.pixelformat_m != PixelFormat::V8 {
            return Err(CompositeError::operand_layout(format!(
                "mask must be v8, got {}",
                ctx.pixelformat_m
            )));
        }
        (kernel.func)(ctx);
        Ok(())
    }
}

/// Build a table: generic kernels, then each usable accelerated family in order.
#[tracing::instrument(level = "debug", skip_all, fields(use_extensions = options.use_extensions))]
pub fn install(options: CompositeOptions, capabilities: Capabilities) -> DispatchTable {
    let mut builder = TableBuilder::new();
    Family::Generic.install_into(&mut builder);
    let generic = builder.len();

    if options.use_extensions {
        for family in Family::EXTENSIONS {
            let usable = family.usable(capabilities);
            if usable {
                family.install_into(&mut builder);
            }
            report_probe(options.verbose, family, usable);
        }
    } else {
        report_disabled(options.verbose);
    }

    let table = builder.freeze(options, capabilities);
    debug!(entries = table.len(), generic, families = ?table.families(), "composite table ready");
    table
}

/// Generic kernels plus `family` alone, so entries a wider family would take over stay
/// reachable. An unusable family leaves a generic-only table.
pub fn install_single(family: Family, capabilities: Capabilities) -> DispatchTable {
    let mut builder = TableBuilder::new();
    Family::Generic.install_into(&mut builder);
    if family.usable(capabilities) {
        family.install_into(&mut builder);
    }
    builder.freeze(CompositeOptions::default(), capabilities)
}

fn report_probe(verbose: bool, family: Family, usable: bool) {
    let compiled_in = family.compiled_in();
    if verbose {
        info!(%family, compiled_in, usable, "composite extension probe");
    } else {
        debug!(%family, compiled_in, usable, "composite extension probe");
    }
}

fn report_disabled(verbose: bool) {
    if verbose {
        info!("composite extensions disabled");
    } else {
        debug!("composite extensions disabled");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/table.rs"]
mod tests;
