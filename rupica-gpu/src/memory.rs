// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Guest memory translation capability.
//!
//! The core never dereferences a guest address directly; it resolves
//! byte ranges through this trait, injected per draw/DMA call by the
//! memory subsystem. Translation is assumed pre-validated upstream;
//! a `None` here means the memory map itself refused the range.

use byteorder::{ByteOrder, LittleEndian};

/// Resolves guest physical addresses to host-visible byte slices.
pub trait GuestMemory {
    /// Borrow `len` bytes of guest memory at `addr`, valid for the
    /// duration of the current draw or DMA call.
    fn slice(&self, addr: u32, len: u32) -> Option<&[u8]>;

    fn read_u8(&self, addr: u32) -> Option<u8> {
        self.slice(addr, 1).map(|s| s[0])
    }

    fn read_u16(&self, addr: u32) -> Option<u16> {
        self.slice(addr, 2).map(LittleEndian::read_u16)
    }

    fn read_u32(&self, addr: u32) -> Option<u32> {
        self.slice(addr, 4).map(LittleEndian::read_u32)
    }

    fn read_f32(&self, addr: u32) -> Option<f32> {
        self.slice(addr, 4).map(LittleEndian::read_f32)
    }
}

/// Flat test memory backing a single contiguous region.
#[cfg(test)]
pub(crate) struct FlatMemory {
    pub base: u32,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
impl FlatMemory {
    pub fn new(base: u32, size: usize) -> Self {
        Self {
            base,
            bytes: vec![0u8; size],
        }
    }

    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) {
        let off = (addr - self.base) as usize;
        self.bytes[off..off + data.len()].copy_from_slice(data);
    }

    pub fn write_f32(&mut self, addr: u32, value: f32) {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    pub fn write_u16(&mut self, addr: u32, value: u16) {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    pub fn write_u32(&mut self, addr: u32, value: u32) {
        self.write_bytes(addr, &value.to_le_bytes());
    }
}

#[cfg(test)]
impl GuestMemory for FlatMemory {
    fn slice(&self, addr: u32, len: u32) -> Option<&[u8]> {
        let off = addr.checked_sub(self.base)? as usize;
        let end = off.checked_add(len as usize)?;
        self.bytes.get(off..end)
    }
}
