// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Vertex shader boundary.
//!
//! The shader interpreter is an external collaborator; the core only
//! loads input registers, runs the program, and harvests outputs.
//! Shader state (program, uniforms, fixed attributes) is fully owned
//! on the other side of this trait.

use rupica_common::Vec4;

/// Number of shader input registers.
pub const SHADER_INPUT_REGS: usize = 16;

/// Number of shader output registers.
pub const SHADER_OUTPUT_REGS: usize = 16;

/// Call/response boundary to the vertex shader interpreter.
pub trait VertexShader {
    /// Store a fixed attribute, submitted via register writes rather
    /// than fetched per-vertex.
    fn set_fixed_attribute(&mut self, index: usize, value: Vec4);

    /// Load one input register before `run`.
    fn set_input(&mut self, index: usize, value: Vec4);

    /// Execute the vertex program over the loaded inputs.
    fn run(&mut self);

    /// Read one output register after `run`.
    fn output(&self, index: usize) -> Vec4;

    /// Reset all shader-side state.
    fn reset(&mut self);
}

/// Shader double that copies inputs straight to outputs. Enough to
/// exercise the fetch/assembly pipeline without a real interpreter.
#[cfg(test)]
pub(crate) struct PassthroughShader {
    pub inputs: [Vec4; SHADER_INPUT_REGS],
    pub outputs: [Vec4; SHADER_OUTPUT_REGS],
    pub fixed: [Vec4; SHADER_INPUT_REGS],
    pub runs: usize,
}

#[cfg(test)]
impl PassthroughShader {
    pub fn new() -> Self {
        Self {
            inputs: [[0.0; 4]; SHADER_INPUT_REGS],
            outputs: [[0.0; 4]; SHADER_OUTPUT_REGS],
            fixed: [[0.0; 4]; SHADER_INPUT_REGS],
            runs: 0,
        }
    }
}

#[cfg(test)]
impl VertexShader for PassthroughShader {
    fn set_fixed_attribute(&mut self, index: usize, value: Vec4) {
        self.fixed[index] = value;
    }

    fn set_input(&mut self, index: usize, value: Vec4) {
        self.inputs[index] = value;
    }

    fn run(&mut self) {
        for (i, input) in self.inputs.iter().enumerate() {
            self.outputs[i] = *input;
        }
        self.runs += 1;
    }

    fn output(&self, index: usize) -> Vec4 {
        self.outputs[index]
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}
