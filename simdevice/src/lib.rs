//! Simulated flash and SD-card filesystem substrates for host-side testing.
//!
//! The NOR-type flashes used in microcontrollers differ quite a bit in terms
//! of capabilities provided. [`SimFlash`] captures that diversity through
//! its read/write/erase sizes rather than hard-coding one device's geometry;
//! [`styles`] enumerates a handful of real device profiles to parametrize
//! tests across. [`fs`] provides a `std::fs`-backed stand-in for the
//! removable SD-card medium the same way `SimFlash` stands in for on-chip
//! flash.

pub mod fs;
pub mod gen;
pub mod styles;

use storage::{check_erase, check_read, check_slice, check_write, Flash, ReadFlash, Result};

/// An in-memory flash device of configurable read/write/erase geometry.
/// Newly constructed devices read as `0xff` everywhere, matching an erased
/// NOR part.
pub struct SimFlash {
    data: Vec<u8>,
    read_size: usize,
    write_size: usize,
    erase_size: usize,
}

impl SimFlash {
    pub fn new(
        read_size: usize,
        write_size: usize,
        erase_size: usize,
        sectors: usize,
    ) -> Result<SimFlash> {
        Ok(SimFlash {
            data: vec![0xffu8; erase_size * sectors],
            read_size,
            write_size,
            erase_size,
        })
    }

    /// Directly installs `data` at `offset`, bypassing erase/write
    /// alignment checks. Used by tests to seed a device's initial content.
    pub fn install(&mut self, data: &[u8], offset: usize) -> Result<()> {
        check_slice(self, 1, offset, data.len())?;
        self.data[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    pub fn contents(&self) -> &[u8] {
        &self.data
    }
}

impl ReadFlash for SimFlash {
    fn read_size(&self) -> usize {
        self.read_size
    }

    fn read(&mut self, offset: usize, bytes: &mut [u8]) -> Result<()> {
        check_read(self, offset, bytes.len())?;
        bytes.copy_from_slice(&self.data[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl Flash for SimFlash {
    fn write_size(&self) -> usize {
        self.write_size
    }

    fn erase_size(&self) -> usize {
        self.erase_size
    }

    fn erase(&mut self, from: usize, to: usize) -> Result<()> {
        check_erase(self, from, to)?;
        self.data[from..to].fill(0xff);
        Ok(())
    }

    fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        check_write(self, offset, bytes.len())?;
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}
