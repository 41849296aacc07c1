//! Cartridge loading and mapper implementations.
//!
//! A cartridge is parsed from an iNES image into a [`Rom`], then wrapped in
//! a [`Mapper`] that translates bus addresses into bank offsets. The mapper
//! capability is the only coupling between the cartridge and the rest of
//! the system:
//!
//! - PRG window: CPU `$8000-$FFFF` via [`Mapper::read_prg`]/[`Mapper::write_prg`]
//! - CHR window: PPU `$0000-$1FFF` via [`Mapper::read_chr`]/[`Mapper::write_chr`]
//! - Nametable arrangement via [`Mapper::mirroring`]
//!
//! Only NROM (mapper 0) is implemented; any other id is rejected at load
//! time with [`RomError::UnsupportedMapper`].

mod mapper;
mod nrom;
mod rom;

pub use mapper::{Mapper, Mirroring};
pub use nrom::Nrom;
pub use rom::{Rom, RomError, RomHeader};

/// Create a mapper for a parsed ROM.
///
/// # Errors
///
/// Returns [`RomError::UnsupportedMapper`] for any mapper id other than 0,
/// or a size error if the ROM banks do not fit the mapper's layout.
pub fn create_mapper(rom: &Rom) -> Result<Box<dyn Mapper>, RomError> {
    match rom.header.mapper {
        0 => Ok(Box::new(Nrom::new(rom)?)),
        n => Err(RomError::UnsupportedMapper(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rom(mapper: u8) -> Vec<u8> {
        let mut image = vec![0x4E, 0x45, 0x53, 0x1A];
        image.push(1); // 16 KiB PRG
        image.push(1); // 8 KiB CHR
        image.push((mapper & 0x0F) << 4);
        image.push(mapper & 0xF0);
        image.extend_from_slice(&[0; 8]);
        image.extend_from_slice(&[0xEA; 16 * 1024]);
        image.extend_from_slice(&[0x00; 8 * 1024]);
        image
    }

    #[test]
    fn create_mapper_nrom() {
        let rom = Rom::load(&test_rom(0)).unwrap();
        let mapper = create_mapper(&rom).unwrap();
        assert_eq!(mapper.mapper_number(), 0);
        assert_eq!(mapper.mapper_name(), "NROM");
    }

    #[test]
    fn create_mapper_rejects_unknown_id() {
        let rom = Rom::load(&test_rom(4)).unwrap();
        let result = create_mapper(&rom);
        assert!(matches!(result, Err(RomError::UnsupportedMapper(4))));
    }
}
