use std::fmt::Display;

use anyhow::ensure;
use thiserror::Error;

use crate::{FONT_ADDR, FONT_CHAR_LENGTH, FONT_DATA, MEM_SIZE};

/// An access that fell outside of the 4 KiB address space
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("address {addr:#06x} is outside of memory")]
pub struct OutOfBounds {
    pub addr: usize,
}

pub struct Memory {
    data: Box<[u8; MEM_SIZE]>,
}

impl Memory {
    /// Create an empty instance of the Memory struct
    pub fn new() -> Self {
        Self {
            data: Box::new([0; MEM_SIZE]),
        }
    }

    /// Create memory seeded with the font sprite table at `FONT_ADDR`
    pub fn with_font() -> Self {
        let mut memory = Self::new();
        let start = FONT_ADDR;
        memory.data[start..start + FONT_DATA.len()].copy_from_slice(&FONT_DATA);
        memory
    }

    /// Write `data` into memory starting at `addr` and return the number of bytes written
    pub fn write(&mut self, addr: usize, data: &[u8]) -> anyhow::Result<usize> {
        ensure!(addr < self.data.len(), "write address out of bounds");

        let available = self.data.len() - addr;
        ensure!(
            available >= data.len(),
            "write overflow: {} bytes do not fit in the {} bytes from {:#05x}",
            data.len(),
            available,
            addr
        );

        self.data[addr..addr + data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    pub fn read_byte(&self, addr: usize) -> Result<u8, OutOfBounds> {
        self.data.get(addr).copied().ok_or(OutOfBounds { addr })
    }

    /// Read a big-endian word: the high byte lives at `addr`, the low byte at `addr + 1`
    pub fn read_word(&self, addr: usize) -> Result<u16, OutOfBounds> {
        let hi = self.read_byte(addr)? as u16;
        let lo = self.read_byte(addr + 1)? as u16;
        Ok(hi << 8 | lo)
    }

    pub fn write_byte(&mut self, addr: usize, value: u8) -> Result<(), OutOfBounds> {
        let slot = self.data.get_mut(addr).ok_or(OutOfBounds { addr })?;
        *slot = value;
        Ok(())
    }

    /// Copy `data` in at `addr`. Nothing is written unless all of it fits.
    pub fn store(&mut self, addr: usize, data: &[u8]) -> Result<(), OutOfBounds> {
        let end = addr.checked_add(data.len()).ok_or(OutOfBounds { addr })?;
        if end > self.data.len() {
            return Err(OutOfBounds {
                addr: self.data.len().max(addr),
            });
        }
        self.data[addr..end].copy_from_slice(data);
        Ok(())
    }

    /// Borrow `len` bytes starting at `addr`
    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8], OutOfBounds> {
        let end = addr.checked_add(len).ok_or(OutOfBounds { addr })?;
        if end > self.data.len() {
            return Err(OutOfBounds { addr: end - 1 });
        }
        Ok(&self.data[addr..end])
    }

    /// Address of the 5-byte sprite for the hex digit in the low nibble of `digit`
    pub fn find_font_sprite_address(digit: u8) -> u16 {
        (FONT_ADDR + FONT_CHAR_LENGTH * (digit & 0x0F) as usize) as u16
    }
}

impl Display for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const BYTES_PER_LINE: usize = 16;
        for (line, chunk) in self.data.chunks(BYTES_PER_LINE).enumerate() {
            write!(f, "{:04X}: ", line * BYTES_PER_LINE)?;
            for byte in chunk {
                write!(f, "{:02X} ", byte)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
