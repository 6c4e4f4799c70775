// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Rendering backend selection.
//!
//! Concrete native backends (Vulkan, Metal) live out of tree; the
//! null backend ships here so the core is exercisable without a GPU.

pub mod null_backend;

use crate::renderer::Renderer;

/// Backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Null,
    Vulkan,
}

/// Construct a backend. Kinds without an in-tree implementation fall
/// back to the null backend with a warning.
pub fn create_backend(kind: BackendKind) -> Box<dyn Renderer> {
    match kind {
        BackendKind::Null => Box::new(null_backend::NullRenderer::new()),
        BackendKind::Vulkan => {
            log::warn!("backend: Vulkan not built in, using null backend");
            Box::new(null_backend::NullRenderer::new())
        }
    }
}
