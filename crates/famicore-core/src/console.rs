//! The console shell: owner of the CPU, bus and lockstep loop.

use famicore_cpu::{Cpu, Snapshot};
use famicore_mappers::{Rom, create_mapper};

use crate::bus::NesBus;
use crate::error::EmuError;
use crate::sink::{Frame, FrameSink};

/// The assembled console.
///
/// Owns every component; the CPU and PPU receive borrowed access per
/// step. Time is virtual and exact: each CPU cycle advances the PPU by
/// three dots, interrupts and DMA stalls included.
pub struct Console {
    cpu: Cpu,
    bus: NesBus,
    frame: Frame,
    total_cycles: u64,
    frame_count: u64,
    frame_ready: bool,
}

impl Console {
    /// Build a console from a raw iNES image and reset it.
    ///
    /// # Errors
    ///
    /// [`EmuError::InvalidRom`] for a malformed image,
    /// [`EmuError::UnsupportedMapper`] for a mapper other than NROM.
    pub fn new(rom_bytes: &[u8]) -> Result<Self, EmuError> {
        let rom = Rom::load(rom_bytes)?;
        let mapper = create_mapper(&rom)?;
        log::info!(
            "cartridge installed: {} ({} KiB PRG, {} KiB CHR)",
            mapper.mapper_name(),
            rom.prg_rom.len() / 1024,
            rom.chr_rom.len() / 1024,
        );

        let mut bus = NesBus::new(mapper);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        Ok(Self {
            cpu,
            bus,
            frame: Frame::new(),
            total_cycles: 0,
            frame_count: 0,
            frame_ready: false,
        })
    }

    /// Reset the whole console: components return to power-on state and
    /// the CPU re-reads the reset vector.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
        self.total_cycles = 0;
        self.frame_count = 0;
        self.frame_ready = false;
    }

    /// Execute one CPU step (instruction, interrupt entry or stall
    /// cycle) and keep the PPU in lockstep. Returns the elapsed CPU
    /// cycles.
    ///
    /// # Errors
    ///
    /// Fatal errors ([`EmuError::UnknownOpcode`], [`EmuError::BusFault`])
    /// end the session; the offending state is logged.
    pub fn step(&mut self) -> Result<u32, EmuError> {
        let cycles = match self.cpu.step(&mut self.bus) {
            Ok(cycles) => cycles,
            Err(err) => {
                self.log_fatal_state();
                return Err(err.into());
            }
        };
        self.total_cycles += u64::from(cycles);

        if let Some(addr) = self.bus.take_fault() {
            self.log_fatal_state();
            return Err(EmuError::BusFault { addr });
        }

        // NTSC ratio: three dots per CPU cycle.
        for _ in 0..cycles * 3 {
            if self.bus.step_ppu_dot() {
                self.frame_ready = true;
            }
        }

        // Interrupts flow PPU -> CPU through the one-shot request.
        if self.bus.ppu.take_nmi() {
            self.cpu.trigger_nmi();
        }

        // A $4014 write latches DMA; the copy runs here, then the CPU
        // sits out 513 cycles (514 when the trigger landed on an odd
        // cycle) while the dot clock keeps running.
        if let Some(page) = self.bus.take_oam_dma() {
            self.bus.run_oam_dma(page);
            let parity = (self.total_cycles & 1) as u32;
            self.cpu.stall(513 + parity);
        }

        Ok(cycles)
    }

    /// Run until the PPU finishes the visible region, then hand the
    /// frame to the sink and re-sample the controllers.
    ///
    /// # Errors
    ///
    /// Fatal step errors propagate; a closed sink surfaces as
    /// [`EmuError::FrameSinkClosed`].
    pub fn step_frame(&mut self, sink: &mut impl FrameSink) -> Result<(), EmuError> {
        self.bus.controllers[0].set_buttons(sink.poll_buttons(0));
        self.bus.controllers[1].set_buttons(sink.poll_buttons(1));

        while !self.frame_ready {
            self.step()?;
        }
        self.frame_ready = false;
        self.frame_count += 1;

        self.frame.fill_from_indices(self.bus.ppu.frame_buffer());
        sink.present(&self.frame)
            .map_err(|_| EmuError::FrameSinkClosed)?;
        Ok(())
    }

    /// The step loop: frames until the sink quits or disconnects.
    /// Disconnection is a clean shutdown; fatal errors propagate.
    pub fn run(&mut self, sink: &mut impl FrameSink) -> Result<(), EmuError> {
        while !sink.should_quit() {
            match self.step_frame(sink) {
                Ok(()) => {}
                Err(EmuError::FrameSinkClosed) => {
                    log::info!("frame sink closed, shutting down");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Total CPU cycles since reset.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Frames presented since reset.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The CPU, for tracing and tests.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Mutable CPU access (trace setup).
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// The bus, for diagnostics and tests.
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// Mutable bus access.
    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// Log the CPU snapshot at a fatal error.
    fn log_fatal_state(&mut self) {
        let snapshot = Snapshot::capture(&self.cpu, &mut self.bus);
        log::error!("emulation halted at {snapshot}");
    }
}
