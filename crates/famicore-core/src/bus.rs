//! The CPU-visible system bus.
//!
//! ```text
//! $0000-$1FFF  2 KiB internal RAM, mirrored every 2 KiB
//! $2000-$3FFF  PPU registers, mirrored every 8 bytes
//! $4000-$4013  APU region (open-bus/no-op simplification)
//! $4014        OAM DMA trigger
//! $4015        APU status (open-bus/no-op)
//! $4016-$4017  controller ports (reads); $4016 write strobes both pads
//! $4018-$401F  no handler: access records a bus fault
//! $4020-$FFFF  cartridge space via the mapper
//! ```

use famicore_cpu::Bus;
use famicore_mappers::{self as mappers, Mapper};
use famicore_ppu::{Mirroring, PatternBus, Ppu};

use crate::controller::Controller;

/// Pattern-window adapter handing the PPU its CHR traffic through the
/// mapper. Borrowed per call so the PPU can live inside the bus.
struct ChrBus<'a> {
    mapper: &'a mut dyn Mapper,
}

impl PatternBus for ChrBus<'_> {
    fn read_pattern(&mut self, addr: u16) -> u8 {
        self.mapper.read_chr(addr)
    }

    fn write_pattern(&mut self, addr: u16, value: u8) {
        self.mapper.write_chr(addr, value);
    }
}

/// The console bus: RAM, PPU, controllers and the cartridge mapper.
pub struct NesBus {
    /// Internal RAM (2 KiB).
    pub ram: [u8; 0x0800],
    /// Picture processing unit.
    pub ppu: Ppu,
    /// Cartridge mapper.
    pub mapper: Box<dyn Mapper>,
    /// Controller ports 0 and 1.
    pub controllers: [Controller; 2],

    /// Page latched by a $4014 write, pending DMA execution.
    oam_dma_page: Option<u8>,
    /// Last value seen on the data bus (open-bus reads).
    open_bus: u8,
    /// Address of an access with no handler, if one happened.
    fault: Option<u16>,
}

impl NesBus {
    /// Wire a bus around a mapper. The PPU adopts the cartridge's
    /// nametable arrangement.
    #[must_use]
    pub fn new(mapper: Box<dyn Mapper>) -> Self {
        let mirroring = translate_mirroring(mapper.mirroring());
        Self {
            ram: [0; 0x0800],
            ppu: Ppu::new(mirroring),
            mapper,
            controllers: [Controller::new(), Controller::new()],
            oam_dma_page: None,
            open_bus: 0,
            fault: None,
        }
    }

    /// Reset RAM, PPU, mapper and controllers.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.ppu.reset();
        self.mapper.reset();
        self.ppu
            .set_mirroring(translate_mirroring(self.mapper.mirroring()));
        for pad in &mut self.controllers {
            pad.reset();
        }
        self.oam_dma_page = None;
        self.open_bus = 0;
        self.fault = None;
    }

    /// Step the PPU one dot. Returns true at the presentation boundary.
    pub fn step_ppu_dot(&mut self) -> bool {
        let mut chr = ChrBus {
            mapper: self.mapper.as_mut(),
        };
        self.ppu.step(&mut chr).frame_complete
    }

    /// Take the page latched by a $4014 write, if any.
    pub fn take_oam_dma(&mut self) -> Option<u8> {
        self.oam_dma_page.take()
    }

    /// Take the recorded fault address, if any.
    pub fn take_fault(&mut self) -> Option<u16> {
        self.fault.take()
    }

    /// Copy 256 bytes from `page << 8` into OAM through OAMADDR.
    pub fn run_oam_dma(&mut self, page: u8) {
        let base = u16::from(page) << 8;
        for i in 0..256u16 {
            let value = self.dma_read(base.wrapping_add(i));
            self.ppu.oam_dma_write(value);
        }
    }

    /// DMA source read: plain memory only, no register side effects.
    fn dma_read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x4020..=0xFFFF => self.mapper.read_prg(addr),
            _ => 0,
        }
    }

    fn read_controller(&mut self, port: usize) -> u8 {
        // Bits 5-7 float at the last bus value.
        let bit = self.controllers[port].read();
        bit | (self.open_bus & 0xE0)
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],

            0x2000..=0x3FFF => {
                let mut chr = ChrBus {
                    mapper: self.mapper.as_mut(),
                };
                self.ppu.read_register(addr, &mut chr)
            }

            // APU region: open-bus simplification, reads as zero.
            0x4000..=0x4015 => 0,

            0x4016 => self.read_controller(0),
            0x4017 => self.read_controller(1),

            0x4018..=0x401F => {
                self.fault = Some(addr);
                0
            }

            0x4020..=0xFFFF => self.mapper.read_prg(addr),
        };

        self.open_bus = value;
        value
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.open_bus = value;

        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,

            0x2000..=0x3FFF => {
                let mut chr = ChrBus {
                    mapper: self.mapper.as_mut(),
                };
                self.ppu.write_register(addr, value, &mut chr);
            }

            // APU region: writes are dropped.
            0x4000..=0x4013 | 0x4015 | 0x4017 => {}

            0x4014 => self.oam_dma_page = Some(value),

            0x4016 => {
                for pad in &mut self.controllers {
                    pad.write_strobe(value);
                }
            }

            0x4018..=0x401F => self.fault = Some(addr),

            0x4020..=0xFFFF => self.mapper.write_prg(addr, value),
        }
    }
}

/// The mapper crate and the PPU each carry their own mirroring enum;
/// the bus is where the two meet.
fn translate_mirroring(m: mappers::Mirroring) -> Mirroring {
    match m {
        mappers::Mirroring::Horizontal => Mirroring::Horizontal,
        mappers::Mirroring::Vertical => Mirroring::Vertical,
        mappers::Mirroring::SingleScreen => Mirroring::SingleScreen,
        mappers::Mirroring::FourScreen => Mirroring::FourScreen,
    }
}
