//! NES emulation core: the console shell and system bus.
//!
//! This crate assembles the component crates into a runnable console:
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                   Console                      │
//! │  ┌──────────────────────────────────────────┐  │
//! │  │                  NesBus                  │  │
//! │  │  ┌─────┐ ┌─────┐ ┌────────┐ ┌─────────┐  │  │
//! │  │  │ RAM │ │ PPU │ │ Mapper │ │ 2 x Pad │  │  │
//! │  │  └─────┘ └─────┘ └────────┘ └─────────┘  │  │
//! │  └──────────────────────────────────────────┘  │
//! │                      ▲                         │
//! │                 ┌────┴────┐                    │
//! │                 │   CPU   │                    │
//! │                 └─────────┘                    │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! The shell owns the lockstep loop: one CPU instruction, then three PPU
//! dots per elapsed cycle, with NMI and OAM-DMA plumbing in between.
//! Completed frames and live input cross the [`FrameSink`] trait, which
//! is the entire contract with the world outside the core.
//!
//! # Usage
//!
//! ```no_run
//! use famicore_core::{Console, Frame, FrameSink, SinkClosed};
//!
//! struct NullSink;
//!
//! impl FrameSink for NullSink {
//!     fn present(&mut self, _frame: &Frame) -> Result<(), SinkClosed> {
//!         Ok(())
//!     }
//!
//!     fn poll_buttons(&mut self, _port: usize) -> u8 {
//!         0
//!     }
//! }
//!
//! let rom = std::fs::read("game.nes").expect("read ROM");
//! let mut console = Console::new(&rom).expect("load ROM");
//! let mut sink = NullSink;
//! console.run(&mut sink).expect("emulation");
//! ```

mod bus;
mod console;
mod controller;
mod error;
pub mod palette;
mod sink;

pub use bus::NesBus;
pub use console::Console;
pub use controller::{Controller, buttons};
pub use error::EmuError;
pub use sink::{Frame, FrameSink, HEIGHT, SinkClosed, WIDTH};

// The component crates, re-exported for embedders.
pub use famicore_cpu as cpu;
pub use famicore_mappers as mappers;
pub use famicore_ppu as ppu;
