// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! GPU core error types.
//!
//! Every variant here is fatal to the emulation session: it means the
//! guest programmed the GPU in a way the core does not support, or the
//! core's own model is wrong. Continuing would corrupt emulated state,
//! so callers are expected to stop the session. Recoverable conditions
//! (cache misses, unimplemented backend features) are not errors; they
//! log a warning and continue.

use thiserror::Error;

/// Fatal GPU configuration or decode error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GpuError {
    #[error("unimplemented primitive type {0}")]
    UnimplementedPrimitive(u32),

    #[error("invalid vertex count {count} for primitive type {prim_type}")]
    InvalidVertexCount { prim_type: u32, count: u32 },

    #[error("vertex count {count} exceeds batch capacity {capacity}")]
    BatchOverflow { count: u32, capacity: u32 },

    #[error("vertex attribute slot {0} used as padding")]
    AttributeSlotPadding(u32),

    #[error("unimplemented attribute element type {0}")]
    UnimplementedAttributeType(u32),

    #[error("DMA of {size:#X} bytes from {src:#010X} to {dest:#010X} is out of bounds")]
    DmaBounds { dest: u32, src: u32, size: u32 },

    #[error("guest memory translation failed for {len:#X} bytes at {addr:#010X}")]
    MemoryTranslation { addr: u32, len: u32 },
}
