// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! GPU DMA engine.
//!
//! Bounds-checked bulk copy from the linear heap into VRAM. No format
//! interpretation; the copy is byte-exact and either happens in full
//! or not at all.

use rupica_common::{FCRAM_SIZE, LINEAR_HEAP_BASE, VRAM_SIZE, VRAM_START};

use crate::error::GpuError;
use crate::memory::GuestMemory;

/// Check that `[dest, dest+size)` lies in VRAM and `[source,
/// source+size)` lies in the linear heap. The subtraction is
/// wrap-safe: an address below the base wraps to a huge offset and
/// fails the range test.
pub fn check_bounds(dest: u32, source: u32, size: u32) -> Result<(), GpuError> {
    let dest_off = dest.wrapping_sub(VRAM_START);
    if dest_off >= VRAM_SIZE || size > VRAM_SIZE - dest_off {
        return Err(GpuError::DmaBounds { dest, src: source, size });
    }

    let src_off = source.wrapping_sub(LINEAR_HEAP_BASE);
    if src_off >= FCRAM_SIZE || size > FCRAM_SIZE - src_off {
        return Err(GpuError::DmaBounds { dest, src: source, size });
    }

    Ok(())
}

/// Validate and execute one DMA transfer into `vram` (the full VRAM
/// allocation). On any bounds violation nothing is copied.
pub fn execute(
    vram: &mut [u8],
    mem: &dyn GuestMemory,
    dest: u32,
    source: u32,
    size: u32,
) -> Result<(), GpuError> {
    check_bounds(dest, source, size)?;

    let src = mem
        .slice(source, size)
        .ok_or(GpuError::MemoryTranslation {
            addr: source,
            len: size,
        })?;

    let dest_off = (dest - VRAM_START) as usize;
    vram[dest_off..dest_off + size as usize].copy_from_slice(src);

    log::debug!(
        "DMA: copied 0x{:X} bytes from 0x{:08X} to 0x{:08X}",
        size,
        source,
        dest
    );
    Ok(())
}
