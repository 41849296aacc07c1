//! Mapper 0: NROM.
//!
//! No bank switching. A single 16 KiB PRG bank is mirrored across both
//! halves of `$8000-$FFFF` (NROM-128); two banks fill it contiguously
//! (NROM-256). The CHR window maps the 8 KiB VROM directly, or 8 KiB of
//! CHR-RAM when the cartridge ships none.

use crate::rom::{CHR_BANK_SIZE, PRG_BANK_SIZE};
use crate::{Mapper, Mirroring, Rom, RomError};

/// NROM (mapper 0).
#[derive(Clone)]
pub struct Nrom {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_writable: bool,
    mirroring: Mirroring,
}

impl Nrom {
    /// Build an NROM mapper from a parsed ROM.
    ///
    /// # Errors
    ///
    /// Returns [`RomError::BadBankLayout`] unless the ROM carries one or
    /// two PRG banks and at most one CHR bank.
    pub fn new(rom: &Rom) -> Result<Self, RomError> {
        if rom.prg_rom.len() != PRG_BANK_SIZE && rom.prg_rom.len() != 2 * PRG_BANK_SIZE {
            return Err(RomError::BadBankLayout {
                mapper: "NROM",
                detail: format!("expected 16 or 32 KiB PRG, got {} bytes", rom.prg_rom.len()),
            });
        }
        if !rom.chr_rom.is_empty() && rom.chr_rom.len() != CHR_BANK_SIZE {
            return Err(RomError::BadBankLayout {
                mapper: "NROM",
                detail: format!("expected 8 KiB CHR, got {} bytes", rom.chr_rom.len()),
            });
        }

        // No VROM: synthesize writable CHR-RAM instead.
        let chr_writable = rom.chr_rom.is_empty();
        let chr = if chr_writable {
            vec![0; CHR_BANK_SIZE]
        } else {
            rom.chr_rom.clone()
        };

        Ok(Self {
            prg_rom: rom.prg_rom.clone(),
            chr,
            chr_writable,
            mirroring: rom.header.mirroring,
        })
    }
}

impl Mapper for Nrom {
    fn read_prg(&self, addr: u16) -> u8 {
        let offset = (addr as usize) & 0x7FFF;
        // NROM-128 mirrors its single bank into both halves.
        self.prg_rom[offset % self.prg_rom.len()]
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        log::warn!("ignored PRG write ${value:02X} -> ${addr:04X} (NROM has no registers)");
    }

    fn read_chr(&self, addr: u16) -> u8 {
        self.chr[(addr as usize) & 0x1FFF]
    }

    fn write_chr(&mut self, addr: u16, value: u8) {
        if self.chr_writable {
            self.chr[(addr as usize) & 0x1FFF] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn mapper_number(&self) -> u8 {
        0
    }

    fn mapper_name(&self) -> &'static str {
        "NROM"
    }
}
