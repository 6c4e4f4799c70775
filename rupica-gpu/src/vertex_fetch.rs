// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-vertex input assembly.
//!
//! One fetcher is built per draw call. Each iteration resolves the
//! source vertex index (sequential, or read from the 8/16-bit index
//! stream), gathers every attribute (fixed attributes verbatim, buffer
//! attributes fetched from guest memory and converted to f32), fills
//! the unwritten lanes, then permutes the assembled vectors into the
//! shader's input registers. Any structural violation aborts the draw
//! before a partially-built vertex can be forwarded.

use rupica_common::Vec4;

use crate::attributes::{AttribElementType, AttributeTable, MAX_ATTRIBUTES};
use crate::error::GpuError;
use crate::memory::GuestMemory;
use crate::regs::RegisterFile;
use crate::shader::VertexShader;

/// Assembles shader input registers for one draw call.
pub struct VertexFetcher<'a> {
    mem: &'a dyn GuestMemory,
    attributes: &'a AttributeTable,
    fixed_attributes: &'a [Vec4; MAX_ATTRIBUTES],

    vertex_base: u32,
    vertex_offset: u32,
    indexed: bool,
    /// Read cursor into the index stream; advances 1 or 2 bytes per
    /// vertex, strictly in iteration order.
    index_ptr: u32,
    short_index: bool,

    attrib_format: u64,
    total_attrib_count: usize,
    fixed_mask: u32,
    permutation: u64,

    /// Assembled input registers, rebuilt per vertex.
    current: [Vec4; MAX_ATTRIBUTES],
}

impl<'a> VertexFetcher<'a> {
    pub fn new(
        mem: &'a dyn GuestMemory,
        regs: &'a RegisterFile,
        attributes: &'a AttributeTable,
        fixed_attributes: &'a [Vec4; MAX_ATTRIBUTES],
        indexed: bool,
    ) -> Self {
        let vertex_base = regs.vertex_base();
        let total = regs.total_attrib_count() as usize;
        if total > MAX_ATTRIBUTES {
            log::warn!(
                "vertex fetch: attribute count {} clamped to {}",
                total,
                MAX_ATTRIBUTES
            );
        }

        Self {
            mem,
            attributes,
            fixed_attributes,
            vertex_base,
            vertex_offset: regs.vertex_offset(),
            indexed,
            index_ptr: vertex_base.wrapping_add(regs.index_buffer_offset()),
            short_index: regs.short_index(),
            attrib_format: regs.attrib_format(),
            total_attrib_count: total.min(MAX_ATTRIBUTES),
            fixed_mask: regs.fixed_attrib_mask(),
            permutation: regs.input_permutation(),
            current: [[0.0; 4]; MAX_ATTRIBUTES],
        }
    }

    /// Resolve the source vertex index for loop iteration `i`.
    fn next_vertex_index(&mut self, i: u32) -> Result<u32, GpuError> {
        if !self.indexed {
            return Ok(i.wrapping_add(self.vertex_offset));
        }

        if self.short_index {
            let index = self.mem.read_u16(self.index_ptr).ok_or(
                GpuError::MemoryTranslation {
                    addr: self.index_ptr,
                    len: 2,
                },
            )?;
            self.index_ptr = self.index_ptr.wrapping_add(2);
            Ok(u32::from(index))
        } else {
            let index = self.mem.read_u8(self.index_ptr).ok_or(
                GpuError::MemoryTranslation {
                    addr: self.index_ptr,
                    len: 1,
                },
            )?;
            self.index_ptr = self.index_ptr.wrapping_add(1);
            Ok(u32::from(index))
        }
    }

    /// Read one attribute element and widen it to f32.
    fn read_element(&self, ty: AttribElementType, addr: u32) -> Result<f32, GpuError> {
        let value = match ty {
            AttribElementType::SignedByte => {
                self.mem.read_u8(addr).map(|v| f32::from(v as i8))
            }
            AttribElementType::UnsignedByte => self.mem.read_u8(addr).map(f32::from),
            AttribElementType::SignedShort => {
                self.mem.read_u16(addr).map(|v| f32::from(v as i16))
            }
            AttribElementType::Float => self.mem.read_f32(addr),
        };
        value.ok_or(GpuError::MemoryTranslation {
            addr,
            len: ty.size_bytes(),
        })
    }

    /// Assemble the input registers for loop iteration `i` and load
    /// them into the shader through the input permutation.
    pub fn load_vertex(
        &mut self,
        i: u32,
        shader: &mut dyn VertexShader,
    ) -> Result<(), GpuError> {
        let vertex_index = self.next_vertex_index(i)?;

        let mut attr_count = 0usize;
        let mut buffer = 0usize;

        while attr_count < self.total_attrib_count {
            if self.fixed_mask & (1 << attr_count) != 0 {
                // Fixed attribute: copied verbatim, buffer contents ignored.
                self.current[attr_count] = self.fixed_attributes[attr_count];
                attr_count += 1;
            } else {
                if buffer >= MAX_ATTRIBUTES {
                    break;
                }
                let attr = self.attributes.get(buffer);
                let component_indices = attr.config_full();
                let mut addr = self
                    .vertex_base
                    .wrapping_add(attr.offset)
                    .wrapping_add(vertex_index.wrapping_mul(attr.stride));

                for j in 0..attr.component_count {
                    if attr_count >= MAX_ATTRIBUTES {
                        break;
                    }

                    let slot = ((component_indices >> (j * 4)) & 0xF) as u32;
                    if slot >= MAX_ATTRIBUTES as u32 {
                        return Err(GpuError::AttributeSlotPadding(slot));
                    }

                    let info = ((self.attrib_format >> (slot * 4)) & 0xF) as u32;
                    let ty_raw = info & 0x3;
                    let element_count = ((info >> 2) & 0x3) as usize + 1;
                    let ty = AttribElementType::from_raw(ty_raw)
                        .ok_or(GpuError::UnimplementedAttributeType(ty_raw))?;

                    let mut lanes = [0.0f32; 4];
                    for (lane, value) in lanes.iter_mut().enumerate().take(element_count) {
                        *value =
                            self.read_element(ty, addr.wrapping_add(lane as u32 * ty.size_bytes()))?;
                    }
                    addr = addr.wrapping_add(element_count as u32 * ty.size_bytes());

                    // Default lanes: w gets 1.0, unused channels 0.0.
                    for (lane, value) in lanes.iter_mut().enumerate().skip(element_count) {
                        *value = if lane == 3 { 1.0 } else { 0.0 };
                    }

                    self.current[attr_count] = lanes;
                    attr_count += 1;
                }
                buffer += 1;
            }
        }

        // Map assembled attributes onto shader input registers.
        for j in 0..self.total_attrib_count {
            let mapping = ((self.permutation >> (j * 4)) & 0xF) as usize;
            shader.set_input(mapping, self.current[j]);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FlatMemory;
    use crate::regs::{
        ATTRIB_FORMAT_HIGH, ATTRIB_FORMAT_LOW, INDEX_BUFFER_CONFIG,
        SHADER_INPUT_PERMUTATION_LOW, VERTEX_ATTRIB_LOC, VERTEX_OFFSET,
    };
    use crate::shader::PassthroughShader;

    const BASE: u32 = 0x0100_0000;

    /// Registers for one float attribute with `components` lanes in
    /// buffer 0, identity permutation, vertex base at BASE.
    fn float_attr_regs(components: u32) -> (RegisterFile, AttributeTable) {
        let mut regs = RegisterFile::new();
        // vertex_base = ((raw >> 1) & 0xFFFFFFF) * 16 = BASE.
        regs.write(VERTEX_ATTRIB_LOC, (BASE / 16) << 1);
        // Type table slot 0: float, `components` elements.
        regs.write(ATTRIB_FORMAT_LOW, 0x3 | ((components - 1) << 2));
        // One attribute total, no fixed attributes.
        regs.write(ATTRIB_FORMAT_HIGH, 0);
        // Identity permutation is all-zero for a single attribute.
        regs.write(SHADER_INPUT_PERMUTATION_LOW, 0);

        let mut table = AttributeTable::new();
        // Buffer 0: offset 0, component index list [0], stride, count 1.
        table.write_reg(0, 0);
        table.write_reg(1, 0);
        table.write_reg(2, (1 << 28) | ((components * 4) << 16));
        (regs, table)
    }

    fn no_fixed() -> [Vec4; MAX_ATTRIBUTES] {
        [[0.0; 4]; MAX_ATTRIBUTES]
    }

    #[test]
    fn test_direct_index_order() {
        let (mut regs, table) = float_attr_regs(1);
        regs.write(VERTEX_OFFSET, 10);
        let mem = FlatMemory::new(BASE, 0x1000);
        let fixed = no_fixed();
        let mut fetcher = VertexFetcher::new(&mem, &regs, &table, &fixed, false);

        for i in 0..5 {
            assert_eq!(fetcher.next_vertex_index(i).unwrap(), i + 10);
        }
    }

    #[test]
    fn test_short_indices_consume_two_bytes_each() {
        let (mut regs, table) = float_attr_regs(1);
        regs.write(INDEX_BUFFER_CONFIG, 0x8000_0000 | 0x100);
        let mut mem = FlatMemory::new(BASE, 0x1000);
        mem.write_u16(BASE + 0x100, 7);
        mem.write_u16(BASE + 0x102, 3);
        mem.write_u16(BASE + 0x104, 7);

        let fixed = no_fixed();
        let mut fetcher = VertexFetcher::new(&mem, &regs, &table, &fixed, true);
        assert_eq!(fetcher.next_vertex_index(0).unwrap(), 7);
        assert_eq!(fetcher.next_vertex_index(1).unwrap(), 3);
        assert_eq!(fetcher.next_vertex_index(2).unwrap(), 7);
        // 3 vertices consumed exactly 6 bytes.
        assert_eq!(fetcher.index_ptr, BASE + 0x106);
    }

    #[test]
    fn test_byte_indices_consume_one_byte_each() {
        let (mut regs, table) = float_attr_regs(1);
        regs.write(INDEX_BUFFER_CONFIG, 0x200);
        let mut mem = FlatMemory::new(BASE, 0x1000);
        mem.write_bytes(BASE + 0x200, &[5, 1, 2, 250]);

        let fixed = no_fixed();
        let mut fetcher = VertexFetcher::new(&mem, &regs, &table, &fixed, true);
        assert_eq!(fetcher.next_vertex_index(0).unwrap(), 5);
        assert_eq!(fetcher.next_vertex_index(1).unwrap(), 1);
        assert_eq!(fetcher.next_vertex_index(2).unwrap(), 2);
        assert_eq!(fetcher.next_vertex_index(3).unwrap(), 250);
        assert_eq!(fetcher.index_ptr, BASE + 0x204);
    }

    #[test]
    fn test_lane_defaults_for_partial_attribute() {
        // 2-component float attribute: lanes 2 and 3 get 0.0 and 1.0.
        let (regs, table) = float_attr_regs(2);
        let mut mem = FlatMemory::new(BASE, 0x1000);
        mem.write_f32(BASE, 5.0);
        mem.write_f32(BASE + 4, -2.0);

        let fixed = no_fixed();
        let mut fetcher = VertexFetcher::new(&mem, &regs, &table, &fixed, false);
        let mut shader = PassthroughShader::new();
        fetcher.load_vertex(0, &mut shader).unwrap();

        assert_eq!(shader.inputs[0], [5.0, -2.0, 0.0, 1.0]);
    }

    #[test]
    fn test_signed_byte_conversion() {
        let (mut regs, table) = float_attr_regs(1);
        // Rewrite slot 0 as signed byte, 3 elements.
        regs.write(ATTRIB_FORMAT_LOW, 0x0 | (2 << 2));
        let mut mem = FlatMemory::new(BASE, 0x1000);
        mem.write_bytes(BASE, &[0x7F, 0x80, 0xFF]);

        let fixed = no_fixed();
        let mut fetcher = VertexFetcher::new(&mem, &regs, &table, &fixed, false);
        let mut shader = PassthroughShader::new();
        fetcher.load_vertex(0, &mut shader).unwrap();

        assert_eq!(shader.inputs[0], [127.0, -128.0, -1.0, 1.0]);
    }

    #[test]
    fn test_unsigned_byte_and_short_conversion() {
        let (mut regs, mut table) = float_attr_regs(1);
        // Slot 0: unsigned byte x2, slot 1: signed short x2.
        regs.write(ATTRIB_FORMAT_LOW, (0x1 | (1 << 2)) | ((0x2 | (1 << 2)) << 4));
        regs.write(ATTRIB_FORMAT_HIGH, 1 << 28); // two attributes
        // Buffer 0 supplies both components, stride 6.
        table.write_reg(1, 0x10); // component indices [0, 1]
        table.write_reg(2, (2 << 28) | (6 << 16));

        let mut mem = FlatMemory::new(BASE, 0x1000);
        mem.write_bytes(BASE, &[200, 255]);
        mem.write_u16(BASE + 2, 0x8000u16);
        mem.write_u16(BASE + 4, 300);

        let fixed = no_fixed();
        let mut fetcher = VertexFetcher::new(&mem, &regs, &table, &fixed, false);
        let mut shader = PassthroughShader::new();
        fetcher.load_vertex(0, &mut shader).unwrap();

        assert_eq!(shader.inputs[0], [200.0, 255.0, 0.0, 1.0]);
        assert_eq!(shader.inputs[1], [-32768.0, 300.0, 0.0, 1.0]);
    }

    #[test]
    fn test_stride_addresses_second_vertex() {
        let (mut regs, table) = float_attr_regs(1);
        regs.write(VERTEX_OFFSET, 1);
        let mut mem = FlatMemory::new(BASE, 0x1000);
        mem.write_f32(BASE, 11.0);
        mem.write_f32(BASE + 4, 22.0);

        let fixed = no_fixed();
        let mut fetcher = VertexFetcher::new(&mem, &regs, &table, &fixed, false);
        let mut shader = PassthroughShader::new();
        // i = 0 with offset 1 reads vertex 1 (stride 4).
        fetcher.load_vertex(0, &mut shader).unwrap();
        assert_eq!(shader.inputs[0][0], 22.0);
    }

    #[test]
    fn test_fixed_attribute_overrides_buffer() {
        let (mut regs, table) = float_attr_regs(1);
        // Mark attribute 0 as fixed.
        regs.write(ATTRIB_FORMAT_HIGH, 1 << 16);
        let mut mem = FlatMemory::new(BASE, 0x1000);
        mem.write_f32(BASE, 999.0); // buffer data must be ignored

        let mut fixed = no_fixed();
        fixed[0] = [1.0, 2.0, 3.0, 4.0];

        let mut fetcher = VertexFetcher::new(&mem, &regs, &table, &fixed, false);
        let mut shader = PassthroughShader::new();
        fetcher.load_vertex(0, &mut shader).unwrap();

        assert_eq!(shader.inputs[0], [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_padding_slot_is_fatal() {
        let (regs, mut table) = float_attr_regs(1);
        // Component index 12 is reserved for padding.
        table.write_reg(1, 12);
        let mem = FlatMemory::new(BASE, 0x1000);

        let fixed = no_fixed();
        let mut fetcher = VertexFetcher::new(&mem, &regs, &table, &fixed, false);
        let mut shader = PassthroughShader::new();
        let err = fetcher.load_vertex(0, &mut shader);
        assert_eq!(err, Err(GpuError::AttributeSlotPadding(12)));
    }

    #[test]
    fn test_permutation_remaps_inputs() {
        let (mut regs, table) = float_attr_regs(4);
        // Attribute 0 lands in shader input register 5.
        regs.write(SHADER_INPUT_PERMUTATION_LOW, 5);
        let mut mem = FlatMemory::new(BASE, 0x1000);
        for lane in 0..4 {
            mem.write_f32(BASE + lane * 4, lane as f32 + 1.0);
        }

        let fixed = no_fixed();
        let mut fetcher = VertexFetcher::new(&mem, &regs, &table, &fixed, false);
        let mut shader = PassthroughShader::new();
        fetcher.load_vertex(0, &mut shader).unwrap();

        assert_eq!(shader.inputs[5], [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(shader.inputs[0], [0.0; 4]);
    }

    #[test]
    fn test_untranslatable_index_stream_aborts() {
        let (mut regs, table) = float_attr_regs(1);
        regs.write(INDEX_BUFFER_CONFIG, 0x8000_0000 | 0xFFC);
        let mem = FlatMemory::new(BASE, 0x1000);

        let fixed = no_fixed();
        let mut fetcher = VertexFetcher::new(&mem, &regs, &table, &fixed, true);
        let mut shader = PassthroughShader::new();
        // Two reads fit, the third crosses the mapping's end.
        assert!(fetcher.load_vertex(0, &mut shader).is_ok());
        assert!(fetcher.load_vertex(1, &mut shader).is_ok());
        let err = fetcher.load_vertex(2, &mut shader);
        assert!(matches!(err, Err(GpuError::MemoryTranslation { .. })));
    }
}
