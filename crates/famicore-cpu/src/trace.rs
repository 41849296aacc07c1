//! Per-instruction trace snapshots in the nestest.log field layout.
//!
//! One line per instruction: PC, the opcode and operand bytes, then the
//! register block and the dot-normalized cycle counter:
//!
//! ```text
//! C000  4C F5 C5  A:00 X:00 Y:00 P:24 SP:FD CYC:  0
//! ```
//!
//! The golden log carries a disassembly column between the bytes and the
//! register block; comparison is field-wise over parsed snapshots, so
//! that column is ignored rather than reproduced.

use core::fmt;

use crate::cpu::{Bus, Cpu};
use crate::opcodes::DECODE;

/// CPU state captured at an instruction boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Program counter at the fetch.
    pub pc: u16,
    /// Opcode byte plus operand bytes (1-3 total).
    pub bytes: Vec<u8>,
    /// Accumulator.
    pub a: u8,
    /// X index.
    pub x: u8,
    /// Y index.
    pub y: u8,
    /// Status byte.
    pub p: u8,
    /// Stack pointer.
    pub sp: u8,
    /// Dot-normalized cycle counter (0-340).
    pub cyc: u16,
}

impl Snapshot {
    /// Capture the state at the current PC, before the instruction runs.
    ///
    /// An illegal opcode captures only its opcode byte.
    pub fn capture(cpu: &Cpu, bus: &mut impl Bus) -> Self {
        let opcode = bus.read(cpu.pc);
        let mut bytes = vec![opcode];
        if let Some(op) = DECODE[opcode as usize] {
            for i in 1..=op.mode.operand_size() {
                bytes.push(bus.read(cpu.pc.wrapping_add(i)));
            }
        }

        Self {
            pc: cpu.pc,
            bytes,
            a: cpu.a,
            x: cpu.x,
            y: cpu.y,
            p: cpu.status.bits(),
            sp: cpu.sp,
            cyc: cpu.cycle,
        }
    }

    /// Parse one golden-log line. Returns `None` for lines that do not
    /// carry the expected fields.
    #[must_use]
    pub fn parse_log_line(line: &str) -> Option<Self> {
        let pc = u16::from_str_radix(line.get(0..4)?, 16).ok()?;

        // Instruction bytes live in the fixed-width column after the PC.
        let bytes = line
            .get(6..14)?
            .split_whitespace()
            .map(|tok| u8::from_str_radix(tok, 16))
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        if bytes.is_empty() {
            return None;
        }

        let reg8 = |tag: &str| -> Option<u8> {
            let at = line.find(tag)? + tag.len();
            u8::from_str_radix(line.get(at..at + 2)?, 16).ok()
        };

        let cyc_at = line.rfind("CYC:")? + 4;
        let cyc = line.get(cyc_at..)?.trim().parse().ok()?;

        Some(Self {
            pc,
            bytes,
            a: reg8("A:")?,
            x: reg8("X:")?,
            y: reg8("Y:")?,
            p: reg8("P:")?,
            sp: reg8("SP:")?,
            cyc,
        })
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = String::new();
        for (i, byte) in self.bytes.iter().enumerate() {
            if i > 0 {
                bytes.push(' ');
            }
            bytes.push_str(&format!("{byte:02X}"));
        }
        write!(
            f,
            "{:04X}  {:<8}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{:>3}",
            self.pc, bytes, self.a, self.x, self.y, self.p, self.sp, self.cyc
        )
    }
}
