//! The process-wide table and the entry point callers use.

pub mod table;

use std::sync::OnceLock;

use crate::config::{Capabilities, CompositeOptions};
use crate::context::CompositeContext;
use crate::foundation::error::CompositeResult;
use table::{DispatchTable, install};

static TABLE: OnceLock<DispatchTable> = OnceLock::new();

/// Build the process-wide table with explicit options. Returns `true` if this call built
/// it; later calls (or a table already built lazily by [`composite`]) leave it unchanged.
pub fn init(options: CompositeOptions, capabilities: Capabilities) -> bool {
    let mut built = false;
    TABLE.get_or_init(|| {
        built = true;
        install(options, capabilities)
    });
    built
}

/// The process-wide table, built from `BLENDKIT_COMPOSITE` and the detected CPU on first
/// use.
pub fn table() -> &'static DispatchTable {
    TABLE.get_or_init(|| install(CompositeOptions::from_env(), Capabilities::detect()))
}

/// Composite one request with the process-wide table.
pub fn composite(ctx: &mut CompositeContext<'_>) -> CompositeResult<()> {
    table().dispatch(ctx)
}
