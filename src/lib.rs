//! blendkit composites two same-shaped pixel rows under one of 32 blend laws.
//!
//! A process-wide [`DispatchTable`] maps `(op, format A, format B, format D)` to a kernel.
//! The generic scalar kernels define the exact output of every law; accelerated families
//! (64-bit SWAR, x86 SSE2) replace individual entries and must match them bit for bit,
//! which [`regress`] checks.
//!
//! - Fill a [`CompositeContext`]
//! - Call [`composite`]
//! - Read the destination back from [`Operands`]
#![deny(unsafe_code)]

mod foundation;

pub mod config;
pub mod context;
pub mod dispatch;
pub mod format;
pub(crate) mod kernels;
pub mod op;
pub mod regress;

pub use crate::config::{Capabilities, CompositeOptions};
pub use crate::context::{CompositeContext, CompositeParams, Operands};
pub use crate::dispatch::table::{
    DispatchTable, Family, Kernel, KernelFn, KernelKey, install, install_single,
};
pub use crate::dispatch::{composite, init, table};
pub use crate::format::PixelFormat;
pub use crate::foundation::error::{CompositeError, CompositeResult};
pub use crate::op::{CompositeOp, ModeFlags};
