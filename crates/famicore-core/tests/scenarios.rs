//! End-to-end timing scenarios run through the assembled console.

use famicore_core::{Console, EmuError, Frame, FrameSink, SinkClosed};
use famicore_cpu::Bus;

/// Build an iNES image around a program placed at $8000.
///
/// `program` bytes land at the entry point; an NMI handler that
/// increments $F0 sits at $9000; unused PRG is NOP-filled.
fn rom_image(program: &[u8], chr: &[u8; 0x2000]) -> Vec<u8> {
    let mut prg = vec![0xEA; 0x8000];
    prg[..program.len()].copy_from_slice(program);

    // NMI handler: INC $F0; RTI
    prg[0x1000] = 0xE6;
    prg[0x1001] = 0xF0;
    prg[0x1002] = 0x40;

    // Vectors: NMI $9000, reset $8000.
    prg[0x7FFA] = 0x00;
    prg[0x7FFB] = 0x90;
    prg[0x7FFC] = 0x00;
    prg[0x7FFD] = 0x80;

    let mut image = vec![0x4E, 0x45, 0x53, 0x1A, 2, 1, 0, 0];
    image.extend_from_slice(&[0; 8]);
    image.extend_from_slice(&prg);
    image.extend_from_slice(chr);
    image
}

/// CHR bank with tile 0 fully opaque.
fn solid_chr() -> [u8; 0x2000] {
    let mut chr = [0; 0x2000];
    chr[..8].fill(0xFF);
    chr
}

struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &Frame) -> Result<(), SinkClosed> {
        Ok(())
    }

    fn poll_buttons(&mut self, _port: usize) -> u8 {
        0
    }
}

#[test]
fn vblank_nmi_fires_once_per_frame() {
    // Enable NMI, then spin.
    let program = [
        0xA9, 0x80, // LDA #$80
        0x8D, 0x00, 0x20, // STA $2000
        0x4C, 0x05, 0x80, // loop: JMP loop
    ];
    let mut console = Console::new(&rom_image(&program, &[0; 0x2000])).unwrap();
    let mut sink = NullSink;

    // The first frame boundary arrives before the first vblank; each
    // later frame crosses exactly one vblank start.
    console.step_frame(&mut sink).unwrap();
    assert_eq!(console.bus().ram[0xF0], 0);

    for expected in 1..=3u8 {
        console.step_frame(&mut sink).unwrap();
        assert_eq!(console.bus().ram[0xF0], expected);
    }
}

#[test]
fn nmi_not_taken_when_disabled() {
    let program = [0x4C, 0x00, 0x80]; // JMP $8000
    let mut console = Console::new(&rom_image(&program, &[0; 0x2000])).unwrap();
    let mut sink = NullSink;

    for _ in 0..4 {
        console.step_frame(&mut sink).unwrap();
    }
    assert_eq!(console.bus().ram[0xF0], 0);
}

#[test]
fn oam_dma_stall_follows_cycle_parity() {
    // Even start: LDA #$02 (2) + STA $4014 (4) = 6 cycles.
    let program = [
        0xA9, 0x02, // LDA #$02
        0x8D, 0x14, 0x40, // STA $4014
    ];
    let mut console = Console::new(&rom_image(&program, &[0; 0x2000])).unwrap();
    console.step().unwrap();
    console.step().unwrap();
    assert_eq!(console.total_cycles(), 6);

    let mut stall_cycles = 0;
    while console.cpu().stalled() > 0 {
        stall_cycles += console.step().unwrap();
    }
    assert_eq!(stall_cycles, 513);

    // Odd start: LDA $00 (3) shifts the trigger to cycle 9.
    let program = [
        0xA5, 0x00, // LDA $00
        0xA9, 0x02, // LDA #$02
        0x8D, 0x14, 0x40, // STA $4014
    ];
    let mut console = Console::new(&rom_image(&program, &[0; 0x2000])).unwrap();
    for _ in 0..3 {
        console.step().unwrap();
    }
    assert_eq!(console.total_cycles(), 9);

    let mut stall_cycles = 0;
    while console.cpu().stalled() > 0 {
        stall_cycles += console.step().unwrap();
    }
    assert_eq!(stall_cycles, 514);
}

#[test]
fn oam_dma_moves_exactly_256_bytes() {
    let program = [
        0xA9, 0x02, // LDA #$02
        0x8D, 0x14, 0x40, // STA $4014
    ];
    let mut console = Console::new(&rom_image(&program, &[0; 0x2000])).unwrap();

    {
        let bus = console.bus_mut();
        for i in 0..256u16 {
            Bus::write(bus, 0x0200 + i, (i as u8) ^ 0x5A);
        }
        Bus::write(bus, 0x2003, 0x00);
    }

    console.step().unwrap();
    console.step().unwrap(); // DMA runs at the end of this step

    let bus = console.bus_mut();
    for i in 0..=255u8 {
        Bus::write(bus, 0x2003, i);
        assert_eq!(Bus::read(bus, 0x2004), i ^ 0x5A);
    }
}

#[test]
fn frame_dot_counts_alternate_with_parity() {
    // Turn the background on, then spin.
    let program = [
        0xA9, 0x08, // LDA #$08
        0x8D, 0x01, 0x20, // STA $2001
        0x4C, 0x05, 0x80, // loop: JMP loop
    ];
    let mut console = Console::new(&rom_image(&program, &[0; 0x2000])).unwrap();

    while console.bus().ppu.frame_count() == 0 {
        console.step().unwrap();
    }
    assert_eq!(console.bus().ppu.last_frame_dots(), 89_342);

    while console.bus().ppu.frame_count() == 1 {
        console.step().unwrap();
    }
    assert_eq!(console.bus().ppu.last_frame_dots(), 89_341);

    while console.bus().ppu.frame_count() == 2 {
        console.step().unwrap();
    }
    assert_eq!(console.bus().ppu.last_frame_dots(), 89_342);
}

#[test]
fn sprite_zero_hit_at_the_overlap() {
    let program = [0x4C, 0x00, 0x80]; // JMP $8000
    let chr = solid_chr();
    let mut console = Console::new(&rom_image(&program, &chr)).unwrap();

    {
        let bus = console.bus_mut();
        // Background + sprites, left columns visible.
        Bus::write(bus, 0x2001, 0x1E);
        // Sprite 0 at (x=40, y=16).
        Bus::write(bus, 0x2003, 0x00);
        Bus::write(bus, 0x2004, 16);
        Bus::write(bus, 0x2004, 0);
        Bus::write(bus, 0x2004, 0);
        Bus::write(bus, 0x2004, 40);
    }

    while console.bus().ppu.scanline() < 24 {
        console.step().unwrap();
    }
    // Run out scanline 24.
    while console.bus().ppu.scanline() == 24 {
        console.step().unwrap();
    }

    assert!(
        console
            .bus()
            .ppu
            .status()
            .contains(famicore_core::ppu::PpuStatus::SPRITE_ZERO_HIT)
    );
}

#[test]
fn controller_reads_reflect_sink_input() {
    let program = [0x4C, 0x00, 0x80];
    let mut console = Console::new(&rom_image(&program, &[0; 0x2000])).unwrap();

    struct PressySink;
    impl FrameSink for PressySink {
        fn present(&mut self, _frame: &Frame) -> Result<(), SinkClosed> {
            Ok(())
        }

        fn poll_buttons(&mut self, port: usize) -> u8 {
            if port == 0 { 0x09 } else { 0x00 } // A + Start
        }
    }

    let mut sink = PressySink;
    console.step_frame(&mut sink).unwrap();

    let bus = console.bus_mut();
    Bus::write(bus, 0x4016, 1);
    Bus::write(bus, 0x4016, 0);
    let bits: Vec<u8> = (0..8).map(|_| Bus::read(bus, 0x4016) & 1).collect();
    assert_eq!(bits, [1, 0, 0, 1, 0, 0, 0, 0]);
}

#[test]
fn fatal_errors_leave_the_session_stopped() {
    // Program runs into an illegal opcode immediately.
    let program = [0x02];
    let mut console = Console::new(&rom_image(&program, &[0; 0x2000])).unwrap();

    assert!(matches!(
        console.step(),
        Err(EmuError::UnknownOpcode(_))
    ));
}
