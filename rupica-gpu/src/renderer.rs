// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Rendering backend contract.
//!
//! Every backend implements [`Renderer`]; the core never branches on
//! backend identity. All parameters crossing the boundary are
//! primitive values or borrowed slices (the vertex batch and the raw
//! register file). Backends own command-stream management: a call may
//! return before the native GPU has finished, but never before being
//! recorded into the backend's current command stream.

use raw_window_handle::HasRawWindowHandle;
use rupica_common::{Vec2, Vec4};
use thiserror::Error;

/// One post-shader vertex, alive only for the draw that produced it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Vertex {
    pub position: Vec4,
    pub colour: Vec4,
    pub uv: Vec2,
}

/// Renderer-level primitive topology.
///
/// The raw primitive field maps 0 to `TriangleList` and 1 to
/// `TriangleStrip`; other encodings are rejected before mapping.
/// `TriangleFan` is carried for the strip/fan encoding should the
/// validation layer ever admit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

/// Framebuffer/texture colour format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    Rgba8,
    Rgb8,
    Rgb565,
    Rgba5551,
    Rgba4,
}

impl ColorFormat {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0 => Self::Rgba8,
            1 => Self::Rgb8,
            2 => Self::Rgb565,
            3 => Self::Rgba5551,
            4 => Self::Rgba4,
            _ => {
                log::warn!("renderer: unknown colour format {}, defaulting to RGBA8", value);
                Self::Rgba8
            }
        }
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::Rgba8 => 4,
            Self::Rgb8 => 3,
            Self::Rgb565 | Self::Rgba5551 | Self::Rgba4 => 2,
        }
    }
}

/// Output scaling selector of a display transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingMode {
    None,
    X,
    Xy,
}

impl ScalingMode {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0 => Self::None,
            1 => Self::X,
            2 => Self::Xy,
            _ => {
                log::warn!("renderer: unknown scaling mode {}, defaulting to none", value);
                Self::None
            }
        }
    }
}

/// Decoded display-transfer flag word.
#[derive(Debug, Clone, Copy)]
pub struct TransferFlags {
    pub vertical_flip: bool,
    pub input_format: ColorFormat,
    pub output_format: ColorFormat,
    pub scaling: ScalingMode,
}

impl TransferFlags {
    /// Decode: bit 0 flip, bits[8:10] input format, bits[12:14] output
    /// format, bits[24:25] scaling.
    pub fn from_raw(flags: u32) -> Self {
        Self {
            vertical_flip: flags & 1 != 0,
            input_format: ColorFormat::from_raw((flags >> 8) & 0x7),
            output_format: ColorFormat::from_raw((flags >> 12) & 0x7),
            scaling: ScalingMode::from_raw((flags >> 24) & 0x3),
        }
    }
}

/// Split a packed transfer size word into (width, height).
pub fn decode_transfer_size(word: u32) -> (u32, u32) {
    (word & 0xFFFF, word >> 16)
}

/// Decode a clear value into normalized RGBA. Channels sit high to
/// low: R in bits[24:31] down to A in bits[0:7].
pub fn decode_clear_color(value: u32) -> [f32; 4] {
    [
        ((value >> 24) & 0xFF) as f32 / 255.0,
        ((value >> 16) & 0xFF) as f32 / 255.0,
        ((value >> 8) & 0xFF) as f32 / 255.0,
        (value & 0xFF) as f32 / 255.0,
    ]
}

/// Fatal context-initialization failure.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),
    #[error("pipeline creation failed: {0}")]
    PipelineCreation(String),
    #[error("presentation surface creation failed: {0}")]
    Surface(String),
}

/// The backend contract.
///
/// Features a backend has not implemented yet must no-op with a
/// logged warning rather than fail, so partially-supported backends
/// stay usable.
pub trait Renderer {
    /// Drop all cached GPU-side resources, leaving the backend ready
    /// to reinitialize.
    fn reset(&mut self);

    /// Create the device and presentation surface, compile shader
    /// programs and fixed pipeline objects, build samplers.
    /// Compilation failure aborts startup.
    fn init_graphics_context(
        &mut self,
        window: &dyn HasRawWindowHandle,
    ) -> Result<(), InitError>;

    /// Release everything acquired by init and by the caches.
    fn deinit_graphics_context(&mut self);

    /// Present the two screens' framebuffers into their fixed,
    /// non-overlapping viewport regions.
    fn display(&mut self, top_fb_addr: u32, bottom_fb_addr: u32);

    /// Clear the cached render target whose address range contains
    /// `start_addr` to the colour decoded from `value`. A miss is a
    /// logged no-op, never fatal.
    fn clear_buffer(&mut self, start_addr: u32, end_addr: u32, value: u32, control: u32);

    /// Format-converting (optionally flipped/scaled) blit between two
    /// memory-resident surfaces located by address.
    fn display_transfer(
        &mut self,
        input_addr: u32,
        output_addr: u32,
        input_size: u32,
        output_size: u32,
        flags: u32,
    );

    /// Raw rectangular byte copy honoring declared strides; no pixel
    /// format reinterpretation.
    fn texture_copy(
        &mut self,
        input_addr: u32,
        output_addr: u32,
        total_bytes: u32,
        input_size: u32,
        output_size: u32,
        flags: u32,
    );

    /// Rasterize one batch against the currently targeted render
    /// target. `regs` is the interpreter's register file, borrowed so
    /// the backend can source texture-environment and texture-unit
    /// state.
    fn draw_vertices(&mut self, prim: PrimitiveTopology, vertices: &[Vertex], regs: &[u32]);

    /// Capture the current front buffer to persistent storage.
    fn screenshot(&mut self, name: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_format_decode() {
        assert_eq!(ColorFormat::from_raw(0), ColorFormat::Rgba8);
        assert_eq!(ColorFormat::from_raw(1), ColorFormat::Rgb8);
        assert_eq!(ColorFormat::from_raw(2), ColorFormat::Rgb565);
        assert_eq!(ColorFormat::from_raw(3), ColorFormat::Rgba5551);
        assert_eq!(ColorFormat::from_raw(4), ColorFormat::Rgba4);
        // Unknown values fall back rather than fail.
        assert_eq!(ColorFormat::from_raw(7), ColorFormat::Rgba8);
    }

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(ColorFormat::Rgba8.bytes_per_pixel(), 4);
        assert_eq!(ColorFormat::Rgb8.bytes_per_pixel(), 3);
        assert_eq!(ColorFormat::Rgb565.bytes_per_pixel(), 2);
        assert_eq!(ColorFormat::Rgba5551.bytes_per_pixel(), 2);
        assert_eq!(ColorFormat::Rgba4.bytes_per_pixel(), 2);
    }

    #[test]
    fn test_transfer_flags_decode() {
        // flip | RGB565 in | RGBA4 out | halve X and Y.
        let flags = 1 | (2 << 8) | (4 << 12) | (2 << 24);
        let decoded = TransferFlags::from_raw(flags);
        assert!(decoded.vertical_flip);
        assert_eq!(decoded.input_format, ColorFormat::Rgb565);
        assert_eq!(decoded.output_format, ColorFormat::Rgba4);
        assert_eq!(decoded.scaling, ScalingMode::Xy);
    }

    #[test]
    fn test_transfer_size_decode() {
        let (w, h) = decode_transfer_size(240 << 16 | 400);
        assert_eq!(w, 400);
        assert_eq!(h, 240);
    }

    #[test]
    fn test_clear_color_decode() {
        let c = decode_clear_color(0xFF00_80FF);
        assert_eq!(c[0], 1.0);
        assert_eq!(c[1], 0.0);
        assert!((c[2] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c[3], 1.0);
    }

    #[test]
    fn test_scaling_decode() {
        assert_eq!(ScalingMode::from_raw(0), ScalingMode::None);
        assert_eq!(ScalingMode::from_raw(1), ScalingMode::X);
        assert_eq!(ScalingMode::from_raw(2), ScalingMode::Xy);
        assert_eq!(ScalingMode::from_raw(3), ScalingMode::None);
    }
}
