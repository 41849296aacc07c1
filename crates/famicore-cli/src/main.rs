//! Headless famicore runner.
//!
//! Usage: `famicore <rom.nes> [frame-limit]`
//!
//! Loads the ROM named by the first argument and runs the console with a
//! sink that discards video and presses nothing. Exits 0 on a clean
//! shutdown, non-zero when the ROM fails to load. The optional frame
//! limit makes headless runs finite; without it the process runs until
//! interrupted or the emulation faults.

use std::process::ExitCode;
use std::time::Instant;

use famicore_core::{Console, Frame, FrameSink, SinkClosed};

/// Sink with no display attached: counts frames and reports pace.
struct HeadlessSink {
    frames: u64,
    limit: Option<u64>,
    started: Instant,
}

impl HeadlessSink {
    fn new(limit: Option<u64>) -> Self {
        Self {
            frames: 0,
            limit,
            started: Instant::now(),
        }
    }
}

impl FrameSink for HeadlessSink {
    fn present(&mut self, _frame: &Frame) -> Result<(), SinkClosed> {
        self.frames += 1;
        if self.frames % 600 == 0 {
            let elapsed = self.started.elapsed().as_secs_f64();
            log::info!(
                "{} frames in {elapsed:.1}s ({:.0} fps)",
                self.frames,
                self.frames as f64 / elapsed
            );
        }
        Ok(())
    }

    fn poll_buttons(&mut self, _port: usize) -> u8 {
        0
    }

    fn should_quit(&mut self) -> bool {
        self.limit.is_some_and(|limit| self.frames >= limit)
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(rom_path) = args.next() else {
        eprintln!("usage: famicore <rom.nes> [frame-limit]");
        return ExitCode::FAILURE;
    };
    let limit = args.next().and_then(|arg| arg.parse().ok());

    let rom = match std::fs::read(&rom_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("famicore: cannot read {rom_path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut console = match Console::new(&rom) {
        Ok(console) => console,
        Err(err) => {
            eprintln!("famicore: cannot load {rom_path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut sink = HeadlessSink::new(limit);
    match console.run(&mut sink) {
        Ok(()) => {
            log::info!("clean shutdown after {} frames", sink.frames);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("famicore: emulation stopped: {err}");
            ExitCode::FAILURE
        }
    }
}
