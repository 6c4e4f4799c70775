// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! GPU core: register write dispatch and draw orchestration.
//!
//! Owns the register files, the attribute descriptor table, VRAM, and
//! the injected renderer/shader collaborators. Register writes are
//! stored and, for a handful of indices, trigger side effects: the
//! attribute table rebuild, fixed-attribute accumulation, and the two
//! draw signals. One `Gpu` is exclusively owned by one emulated
//! machine instance; nothing here is shared.

use rupica_common::float24::f24_to_f32;
use rupica_common::{Vec4, VRAM_SIZE};

use crate::attributes::{AttributeTable, MAX_ATTRIBUTES};
use crate::dma;
use crate::error::GpuError;
use crate::memory::GuestMemory;
use crate::regs::{
    ExternalRegs, RegisterFile, ATTRIB_BUFFER_BASE, ATTRIB_BUFFER_END,
    FIXED_ATTRIB_DATA0, FIXED_ATTRIB_DATA2, FIXED_ATTRIB_INDEX, SIGNAL_DRAW_ARRAYS,
    SIGNAL_DRAW_ELEMENTS,
};
use crate::renderer::{PrimitiveTopology, Renderer, Vertex};
use crate::shader::VertexShader;
use crate::vertex_fetch::VertexFetcher;

/// Hard ceiling on vertices per draw call.
pub const VERTEX_BATCH_CAPACITY: usize = 0x3000;

/// Fixed-attribute index selecting immediate-mode vertex submission.
const IMMEDIATE_MODE_INDEX: usize = 0xF;

/// The GPU core.
pub struct Gpu {
    regs: RegisterFile,
    external_regs: ExternalRegs,
    attributes: AttributeTable,

    /// Fixed-attribute vectors, consulted when the fixed mask is set.
    fixed_attributes: [Vec4; MAX_ATTRIBUTES],
    /// Target of the fixed-attribute data port, auto-incremented
    /// after every completed vector.
    fixed_attrib_index: usize,
    /// Accumulator for the three data words of one vector.
    fixed_attrib_words: [u32; 3],
    fixed_attrib_count: usize,

    vram: Box<[u8]>,
    /// Reused vertex batch; contents never outlive one draw call.
    batch: Vec<Vertex>,

    renderer: Box<dyn Renderer>,
    shader: Box<dyn VertexShader>,
}

impl Gpu {
    pub fn new(renderer: Box<dyn Renderer>, shader: Box<dyn VertexShader>) -> Self {
        Self {
            regs: RegisterFile::new(),
            external_regs: ExternalRegs::new(),
            attributes: AttributeTable::new(),
            fixed_attributes: [[0.0; 4]; MAX_ATTRIBUTES],
            fixed_attrib_index: 0,
            fixed_attrib_words: [0; 3],
            fixed_attrib_count: 0,
            vram: vec![0u8; VRAM_SIZE as usize].into_boxed_slice(),
            batch: Vec::with_capacity(VERTEX_BATCH_CAPACITY),
            renderer,
            shader,
        }
    }

    /// Reset the whole core: registers, VRAM, attribute state, and
    /// both collaborators.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.external_regs.reset();
        self.attributes.reset();
        self.fixed_attributes = [[0.0; 4]; MAX_ATTRIBUTES];
        self.fixed_attrib_index = 0;
        self.fixed_attrib_words = [0; 3];
        self.fixed_attrib_count = 0;
        self.vram.fill(0);
        self.batch.clear();
        self.shader.reset();
        self.renderer.reset();
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> &mut dyn Renderer {
        self.renderer.as_mut()
    }

    /// The VRAM allocation (DMA destination region).
    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    // ── Register write boundary ──────────────────────────────────────────

    pub fn read_internal_reg(&self, index: u32) -> u32 {
        self.regs.read(index)
    }

    /// Write an internal register with full side effects. Draw-signal
    /// writes run a complete draw call, hence the memory capability
    /// and the fatal error path.
    pub fn write_internal_reg(
        &mut self,
        mem: &dyn GuestMemory,
        index: u32,
        value: u32,
    ) -> Result<(), GpuError> {
        self.write_internal_masked(mem, index, value, 0xFFFF_FFFF)
    }

    /// Masked internal register write (command lists carry a 4-bit
    /// byte-enable mask). Unmasked bytes keep their old value.
    pub(crate) fn write_internal_masked(
        &mut self,
        mem: &dyn GuestMemory,
        index: u32,
        value: u32,
        mask: u32,
    ) -> Result<(), GpuError> {
        let merged = (self.regs.read(index) & !mask) | (value & mask);
        self.regs.write(index, merged);
        log::trace!("GPU: reg[0x{:03X}] = 0x{:08X}", index, merged);

        match index {
            ATTRIB_BUFFER_BASE..ATTRIB_BUFFER_END => {
                self.attributes.write_reg(index - ATTRIB_BUFFER_BASE, merged);
            }
            FIXED_ATTRIB_INDEX => {
                self.fixed_attrib_index = (merged & 0xF) as usize;
                self.fixed_attrib_count = 0;
                if self.fixed_attrib_index == IMMEDIATE_MODE_INDEX {
                    log::warn!("GPU: immediate-mode vertex submission not implemented");
                }
            }
            FIXED_ATTRIB_DATA0..=FIXED_ATTRIB_DATA2 => {
                self.push_fixed_attrib_word(merged);
            }
            SIGNAL_DRAW_ARRAYS => {
                self.draw_arrays(mem, false)?;
            }
            SIGNAL_DRAW_ELEMENTS => {
                self.draw_arrays(mem, true)?;
            }
            _ => {}
        }

        Ok(())
    }

    pub fn read_external_reg(&self, index: u32) -> u32 {
        self.external_regs.read(index)
    }

    pub fn write_external_reg(&mut self, index: u32, value: u32) {
        self.external_regs.write(index, value);
    }

    /// Accumulate one fixed-attribute data word; the third completes
    /// a vector of four 24-bit floats.
    fn push_fixed_attrib_word(&mut self, value: u32) {
        self.fixed_attrib_words[self.fixed_attrib_count] = value;
        self.fixed_attrib_count += 1;
        if self.fixed_attrib_count < 3 {
            return;
        }
        self.fixed_attrib_count = 0;

        let attr = unpack_fixed_attribute(&self.fixed_attrib_words);
        let index = self.fixed_attrib_index;
        if index < MAX_ATTRIBUTES {
            self.fixed_attributes[index] = attr;
            self.shader.set_fixed_attribute(index, attr);
            log::trace!(
                "GPU: fixed attribute {} = [{}, {}, {}, {}]",
                index,
                attr[0],
                attr[1],
                attr[2],
                attr[3]
            );
            // The data port targets the next attribute after each vector.
            self.fixed_attrib_index += 1;
        } else if index != IMMEDIATE_MODE_INDEX {
            log::warn!("GPU: fixed attribute index {} out of range", index);
        }
    }

    // ── Draw orchestration ───────────────────────────────────────────────

    /// Run one draw call end to end: validate the primitive
    /// configuration, assemble and shade every vertex, and submit the
    /// finished batch. Validation failures abort before any vertex
    /// work begins.
    pub fn draw_arrays(&mut self, mem: &dyn GuestMemory, indexed: bool) -> Result<(), GpuError> {
        let prim_raw = self.regs.primitive_raw();
        let vertex_count = self.regs.vertex_count();

        let topology = match prim_raw {
            0 => PrimitiveTopology::TriangleList,
            1 => PrimitiveTopology::TriangleStrip,
            other => return Err(GpuError::UnimplementedPrimitive(other)),
        };

        let count_valid = match topology {
            PrimitiveTopology::TriangleList => vertex_count % 3 == 0,
            _ => vertex_count >= 3,
        };
        if !count_valid {
            return Err(GpuError::InvalidVertexCount {
                prim_type: prim_raw,
                count: vertex_count,
            });
        }

        if vertex_count as usize > VERTEX_BATCH_CAPACITY {
            return Err(GpuError::BatchOverflow {
                count: vertex_count,
                capacity: VERTEX_BATCH_CAPACITY as u32,
            });
        }

        log::debug!(
            "GPU: draw {:?} count={} indexed={} inputs={}",
            topology,
            vertex_count,
            indexed,
            self.regs.shader_input_count(),
        );

        let mut fetcher = VertexFetcher::new(
            mem,
            &self.regs,
            &self.attributes,
            &self.fixed_attributes,
            indexed,
        );

        self.batch.clear();
        for i in 0..vertex_count {
            fetcher.load_vertex(i, self.shader.as_mut())?;
            self.shader.run();

            let position = self.shader.output(0);
            let colour = self.shader.output(1);
            let uv = self.shader.output(2);
            self.batch.push(Vertex {
                position,
                colour,
                uv: [uv[0], uv[1]],
            });
        }

        self.renderer
            .draw_vertices(topology, &self.batch, self.regs.as_slice());
        Ok(())
    }

    // ── Display / transfer / DMA paths ───────────────────────────────────

    /// Present both screens from the framebuffers currently selected
    /// by the external registers.
    pub fn display(&mut self) {
        let top = self.external_regs.top_framebuffer();
        let bottom = self.external_regs.bottom_framebuffer();
        self.renderer.display(top, bottom);
    }

    pub fn clear_buffer(&mut self, start_addr: u32, end_addr: u32, value: u32, control: u32) {
        self.renderer.clear_buffer(start_addr, end_addr, value, control);
    }

    pub fn display_transfer(
        &mut self,
        input_addr: u32,
        output_addr: u32,
        input_size: u32,
        output_size: u32,
        flags: u32,
    ) {
        self.renderer
            .display_transfer(input_addr, output_addr, input_size, output_size, flags);
    }

    pub fn texture_copy(
        &mut self,
        input_addr: u32,
        output_addr: u32,
        total_bytes: u32,
        input_size: u32,
        output_size: u32,
        flags: u32,
    ) {
        self.renderer.texture_copy(
            input_addr,
            output_addr,
            total_bytes,
            input_size,
            output_size,
            flags,
        );
    }

    /// Bounds-checked bulk copy from the linear heap into VRAM.
    pub fn fire_dma(
        &mut self,
        mem: &dyn GuestMemory,
        dest: u32,
        source: u32,
        size: u32,
    ) -> Result<(), GpuError> {
        dma::execute(&mut self.vram, mem, dest, source, size)
    }
}

/// Unpack three accumulated data words into four 24-bit floats,
/// stored w-first across the 96-bit buffer.
fn unpack_fixed_attribute(words: &[u32; 3]) -> Vec4 {
    let w = f24_to_f32(words[0] >> 8);
    let z = f24_to_f32(((words[0] & 0xFF) << 16) | (words[1] >> 16));
    let y = f24_to_f32(((words[1] & 0xFFFF) << 8) | (words[2] >> 24));
    let x = f24_to_f32(words[2] & 0x00FF_FFFF);
    [x, y, z, w]
}
