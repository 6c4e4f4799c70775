// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

/// Physical address in the emulated console's flat memory space.
pub type PAddr = u32;

/// Four-component float vector (shader register width).
pub type Vec4 = [f32; 4];

/// Two-component float vector (texture coordinate pair).
pub type Vec2 = [f32; 2];

/// VRAM base address as seen by the GPU DMA path.
pub const VRAM_START: PAddr = 0x1F00_0000;

/// VRAM size (6 MiB).
pub const VRAM_SIZE: u32 = 0x0060_0000;

/// Base of the linear heap, the FCRAM-backed region reachable by GPU DMA.
pub const LINEAR_HEAP_BASE: PAddr = 0x1400_0000;

/// Total FCRAM size (128 MiB).
pub const FCRAM_SIZE: u32 = 0x0800_0000;

/// Top screen width in pixels.
pub const TOP_SCREEN_WIDTH: u32 = 400;

/// Bottom screen width in pixels.
pub const BOTTOM_SCREEN_WIDTH: u32 = 320;

/// Height of either screen in pixels.
pub const SCREEN_HEIGHT: u32 = 240;

/// Horizontal offset of the bottom screen inside the presentation surface.
pub const BOTTOM_SCREEN_X: u32 = (TOP_SCREEN_WIDTH - BOTTOM_SCREEN_WIDTH) / 2;

/// Align a value up to the given power-of-two alignment.
#[inline]
pub const fn align_up(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

/// Align a value down to the given power-of-two alignment.
#[inline]
pub const fn align_down(value: u32, alignment: u32) -> u32 {
    value & !(alignment - 1)
}
