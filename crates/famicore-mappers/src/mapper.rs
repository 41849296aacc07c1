//! The mapper capability.

/// Nametable arrangement selected by the cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mirroring {
    /// $2000/$2400 share one page, $2800/$2C00 the other.
    #[default]
    Horizontal,
    /// $2000/$2800 share one page, $2400/$2C00 the other.
    Vertical,
    /// All four logical nametables map onto a single 1 KiB page.
    SingleScreen,
    /// Four independent nametables (needs mapper-supplied VRAM).
    FourScreen,
}

/// Address translation capability of a cartridge.
///
/// The rest of the system talks to the cartridge only through these two
/// windows: the PRG window at CPU `$8000-$FFFF` and the CHR window at PPU
/// `$0000-$1FFF`. Everything else (banking registers, IRQ counters) is a
/// mapper-internal concern.
pub trait Mapper {
    /// Read a byte from the PRG window.
    fn read_prg(&self, addr: u16) -> u8;

    /// Write a byte into the PRG window.
    ///
    /// On mappers with banking registers this reconfigures banks; on NROM
    /// it is silently ignored.
    fn write_prg(&mut self, addr: u16, value: u8);

    /// Read a byte from the CHR window.
    fn read_chr(&self, addr: u16) -> u8;

    /// Write a byte into the CHR window. Honored only for CHR-RAM carts.
    fn write_chr(&mut self, addr: u16, value: u8);

    /// Current nametable arrangement.
    fn mirroring(&self) -> Mirroring;

    /// Whether the mapper is asserting its IRQ line.
    ///
    /// Level-triggered; no NROM title uses it, but the line is kept wired
    /// for mapper variants added later.
    fn irq_pending(&self) -> bool {
        false
    }

    /// Acknowledge the mapper IRQ.
    fn irq_acknowledge(&mut self) {}

    /// iNES mapper id.
    fn mapper_number(&self) -> u8;

    /// Mapper name for diagnostics.
    fn mapper_name(&self) -> &'static str;

    /// Return the mapper to its power-on banking state.
    fn reset(&mut self) {}
}
