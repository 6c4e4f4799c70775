// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Null rendering backend — draws are accepted, logged, and discarded.
//!
//! Despite producing no pixels, the null backend keeps real surface
//! caches so address-range lookups, cache eviction, and the
//! clear/transfer interplay behave exactly as they do in a native
//! backend. Useful for headless runs and as the reference for the
//! cache semantics every backend must share.

use raw_window_handle::HasRawWindowHandle;
use rupica_common::{
    BOTTOM_SCREEN_WIDTH, BOTTOM_SCREEN_X, SCREEN_HEIGHT, TOP_SCREEN_WIDTH,
};

use crate::renderer::{
    decode_clear_color, decode_transfer_size, ColorFormat, InitError, PrimitiveTopology,
    Renderer, ScalingMode, TransferFlags, Vertex,
};
use crate::surface_cache::{CachedSurface, SurfaceCache};

/// Colour render target slots.
const COLOR_TARGET_CAPACITY: usize = 16;
/// Depth/stencil render target slots.
const DEPTH_TARGET_CAPACITY: usize = 16;
/// Texture slots.
const TEXTURE_CAPACITY: usize = 256;

/// Descriptor-only stand-in for a backend-native surface.
#[derive(Debug, Clone, Copy)]
pub struct NullSurface {
    pub location: u32,
    pub format: ColorFormat,
    pub width: u32,
    pub height: u32,
}

impl NullSurface {
    pub fn new(location: u32, format: ColorFormat, width: u32, height: u32) -> Self {
        Self {
            location,
            format,
            width,
            height,
        }
    }
}

impl CachedSurface for NullSurface {
    fn location(&self) -> u32 {
        self.location
    }

    fn size_bytes(&self) -> u32 {
        self.width
            .saturating_mul(self.height)
            .saturating_mul(self.format.bytes_per_pixel())
    }

    fn matches(&self, other: &Self) -> bool {
        self.location == other.location
            && self.format == other.format
            && self.width == other.width
            && self.height == other.height
    }
}

/// The no-op backend.
pub struct NullRenderer {
    color_targets: SurfaceCache<NullSurface, COLOR_TARGET_CAPACITY>,
    depth_targets: SurfaceCache<NullSurface, DEPTH_TARGET_CAPACITY>,
    textures: SurfaceCache<NullSurface, TEXTURE_CAPACITY>,

    draw_calls: usize,
    frames_presented: usize,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self {
            color_targets: SurfaceCache::new(),
            depth_targets: SurfaceCache::new(),
            textures: SurfaceCache::new(),
            draw_calls: 0,
            frames_presented: 0,
        }
    }

    /// Draw submissions since construction.
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    /// Frames presented since construction.
    pub fn frames_presented(&self) -> usize {
        self.frames_presented
    }

    /// Cached colour render targets.
    pub fn color_target_count(&self) -> usize {
        self.color_targets.len()
    }

    /// Cached textures.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Cached depth/stencil targets.
    pub fn depth_target_count(&self) -> usize {
        self.depth_targets.len()
    }

    /// Cache a colour render target for `addr` unless one already
    /// covers it.
    fn ensure_color_target(&mut self, addr: u32, format: ColorFormat, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if self.color_targets.find_from_address(addr).is_none() {
            self.color_targets
                .add(NullSurface::new(addr, format, width, height));
        }
    }
}

impl Default for NullRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for NullRenderer {
    fn reset(&mut self) {
        self.color_targets.reset();
        self.depth_targets.reset();
        self.textures.reset();
    }

    fn init_graphics_context(
        &mut self,
        _window: &dyn HasRawWindowHandle,
    ) -> Result<(), InitError> {
        log::debug!("NullRenderer: graphics context initialized");
        Ok(())
    }

    fn deinit_graphics_context(&mut self) {
        self.reset();
    }

    fn display(&mut self, top_fb_addr: u32, bottom_fb_addr: u32) {
        self.frames_presented += 1;
        log::trace!(
            "NullRenderer: top screen {}x{} at (0, 0) from 0x{:08X} ({})",
            TOP_SCREEN_WIDTH,
            SCREEN_HEIGHT,
            top_fb_addr,
            if self.color_targets.find_from_address(top_fb_addr).is_some() {
                "hit"
            } else {
                "miss"
            },
        );
        log::trace!(
            "NullRenderer: bottom screen {}x{} at ({}, {}) from 0x{:08X} ({})",
            BOTTOM_SCREEN_WIDTH,
            SCREEN_HEIGHT,
            BOTTOM_SCREEN_X,
            SCREEN_HEIGHT,
            bottom_fb_addr,
            if self.color_targets.find_from_address(bottom_fb_addr).is_some() {
                "hit"
            } else {
                "miss"
            },
        );
    }

    fn clear_buffer(&mut self, start_addr: u32, end_addr: u32, value: u32, control: u32) {
        match self.color_targets.find_from_address(start_addr) {
            Some(target) => {
                let colour = decode_clear_color(value);
                log::debug!(
                    "NullRenderer: clear 0x{:08X}..0x{:08X} ({}x{}) to [{:.3}, {:.3}, {:.3}, {:.3}] control=0x{:X}",
                    start_addr,
                    end_addr,
                    target.width,
                    target.height,
                    colour[0],
                    colour[1],
                    colour[2],
                    colour[3],
                    control,
                );
            }
            None => {
                log::warn!(
                    "NullRenderer: no render target contains 0x{:08X}, clear skipped",
                    start_addr
                );
            }
        }
    }

    fn display_transfer(
        &mut self,
        input_addr: u32,
        output_addr: u32,
        input_size: u32,
        output_size: u32,
        flags: u32,
    ) {
        let decoded = TransferFlags::from_raw(flags);
        let (input_width, input_height) = decode_transfer_size(input_size);
        let (mut output_width, mut output_height) = decode_transfer_size(output_size);

        if decoded.scaling != ScalingMode::None {
            output_width >>= 1;
        }
        if decoded.scaling == ScalingMode::Xy {
            output_height >>= 1;
        }

        self.ensure_color_target(input_addr, decoded.input_format, input_width, input_height);
        self.ensure_color_target(
            output_addr,
            decoded.output_format,
            output_width,
            output_height,
        );

        log::debug!(
            "NullRenderer: transfer 0x{:08X} ({}x{} {:?}) -> 0x{:08X} ({}x{} {:?}) flip={} scaling={:?}",
            input_addr,
            input_width,
            input_height,
            decoded.input_format,
            output_addr,
            output_width,
            output_height,
            decoded.output_format,
            decoded.vertical_flip,
            decoded.scaling,
        );
    }

    fn texture_copy(
        &mut self,
        input_addr: u32,
        output_addr: u32,
        total_bytes: u32,
        _input_size: u32,
        _output_size: u32,
        _flags: u32,
    ) {
        log::warn!(
            "NullRenderer: texture copy 0x{:08X} -> 0x{:08X} ({} bytes) not implemented",
            input_addr,
            output_addr,
            total_bytes,
        );
    }

    fn draw_vertices(&mut self, prim: PrimitiveTopology, vertices: &[Vertex], _regs: &[u32]) {
        self.draw_calls += 1;
        log::debug!(
            "NullRenderer: draw {:?} with {} vertices",
            prim,
            vertices.len()
        );
    }

    fn screenshot(&mut self, name: &str) {
        log::warn!("NullRenderer: screenshot '{}' not implemented", name);
    }
}
