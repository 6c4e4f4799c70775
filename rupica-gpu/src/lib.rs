// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! GPU command/register interpreter for the rupica emulator core.
//!
//! Turns guest-written register state, command lists, and vertex
//! buffer descriptors into renderer-agnostic draw submissions. The
//! rendering itself happens behind the [`renderer::Renderer`]
//! contract; the vertex program runs behind [`shader::VertexShader`];
//! guest memory is reached only through [`memory::GuestMemory`].

pub mod attributes;
pub mod backend;
pub mod cmd_list;
pub mod dma;
pub mod error;
pub mod gpu;
pub mod memory;
pub mod regs;
pub mod renderer;
pub mod shader;
pub mod surface_cache;
pub mod vertex_fetch;

pub use error::GpuError;
pub use gpu::{Gpu, VERTEX_BATCH_CAPACITY};
