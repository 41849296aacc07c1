//! The 6502 core: registers, instruction stepping, interrupt entry.

use crate::addressing::{AddrMode, Operand};
use crate::opcodes::{DECODE, Instr, Penalty};
use crate::status::Status;
use crate::{CpuError, vectors};

/// Dot-normalized cycle counter period: 341 PPU dots per scanline.
pub const CYCLE_WRAP: u16 = 341;

/// Memory seen by the CPU. Implemented by the console bus and by the
/// flat test buses in this crate's suites.
pub trait Bus {
    /// Read one byte.
    fn read(&mut self, addr: u16) -> u8;

    /// Write one byte.
    fn write(&mut self, addr: u16, value: u8);

    /// Read a little-endian word.
    fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr);
        let hi = self.read(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }
}

/// A pending interrupt request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interrupt {
    /// No request.
    #[default]
    None,
    /// Maskable interrupt (level-triggered, honored while I is clear).
    Irq,
    /// Non-maskable interrupt (edge-triggered, one-shot).
    Nmi,
}

/// The MOS 6502 core.
#[derive(Debug)]
pub struct Cpu {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer into page $0100.
    pub sp: u8,
    /// Program counter.
    pub pc: u16,
    /// Processor status.
    pub status: Status,
    /// Dot-normalized cycle counter, modulo 341.
    pub cycle: u16,
    /// Cycles the CPU is stalled for (OAM DMA).
    stall: u32,
    /// Pending interrupt request.
    pending: Interrupt,
    /// Set by control-flow instructions; suppresses the PC advance.
    jumped: bool,
}

impl Cpu {
    /// A CPU in power-on state. The PC is undefined until [`Cpu::reset`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: Status::POWER_ON,
            cycle: 0,
            stall: 0,
            pending: Interrupt::None,
            jumped: false,
        }
    }

    /// Reset: PC from the reset vector, S=$FD, P=$24, cycle baseline 0.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.pc = bus.read_u16(vectors::RESET);
        self.sp = 0xFD;
        self.status = Status::POWER_ON;
        self.cycle = 0;
        self.stall = 0;
        self.pending = Interrupt::None;
    }

    /// Request a non-maskable interrupt (edge; consumed by the next step).
    pub fn trigger_nmi(&mut self) {
        self.pending = Interrupt::Nmi;
    }

    /// Drive the IRQ line. NMI, if already pending, is not displaced.
    pub fn set_irq(&mut self, asserted: bool) {
        match (asserted, self.pending) {
            (true, Interrupt::None) => self.pending = Interrupt::Irq,
            (false, Interrupt::Irq) => self.pending = Interrupt::None,
            _ => {}
        }
    }

    /// Stall the CPU for `n` cycles (used by OAM DMA).
    pub fn stall(&mut self, n: u32) {
        self.stall += n;
    }

    /// Remaining stall cycles.
    #[must_use]
    pub fn stalled(&self) -> u32 {
        self.stall
    }

    /// Execute one step and return the elapsed CPU cycles.
    ///
    /// Step order: a stalled CPU burns one cycle; otherwise a pending
    /// interrupt is serviced (7 cycles); otherwise one instruction is
    /// fetched, decoded, executed and charged its base cycles plus
    /// branch/page-cross penalties.
    ///
    /// # Errors
    ///
    /// [`CpuError::UnknownOpcode`] when the fetched byte decodes to an
    /// illegal opcode. The CPU state is left at the failed fetch.
    pub fn step(&mut self, bus: &mut impl Bus) -> Result<u32, CpuError> {
        if self.stall > 0 {
            self.stall -= 1;
            self.add_cycles(1);
            return Ok(1);
        }

        match self.pending {
            Interrupt::Nmi => {
                self.pending = Interrupt::None;
                return Ok(self.enter_interrupt(bus, vectors::NMI));
            }
            Interrupt::Irq if !self.status.contains(Status::I) => {
                self.pending = Interrupt::None;
                return Ok(self.enter_interrupt(bus, vectors::IRQ));
            }
            _ => {}
        }

        let opcode = bus.read(self.pc);
        let op = DECODE[opcode as usize].ok_or(CpuError::UnknownOpcode {
            opcode,
            pc: self.pc,
        })?;

        let (operand, page_crossed) = self.resolve(bus, op.mode);

        self.jumped = false;
        self.execute(bus, op.instr, operand);

        let mut penalty = 0;
        match op.penalty {
            Penalty::Branch => {
                if self.jumped {
                    penalty += 1;
                    if page_crossed {
                        penalty += 1;
                    }
                }
            }
            Penalty::PageCross => {
                if page_crossed {
                    penalty += 1;
                }
            }
            Penalty::None => {}
        }

        if !self.jumped {
            self.pc = self.pc.wrapping_add(1 + op.mode.operand_size());
        }

        let cycles = u32::from(op.cycles) + penalty;
        self.add_cycles(cycles);
        Ok(cycles)
    }

    /// Advance the dot-normalized counter by `cycles` CPU cycles.
    fn add_cycles(&mut self, cycles: u32) {
        self.cycle = ((u32::from(self.cycle) + cycles * 3) % u32::from(CYCLE_WRAP)) as u16;
    }

    /// Push PC and status, mask IRQs, jump through `vector`. 7 cycles.
    fn enter_interrupt(&mut self, bus: &mut impl Bus, vector: u16) -> u32 {
        self.push_u16(bus, self.pc);
        self.push(bus, self.status.to_pushed_byte(false));
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vector);
        log::trace!("interrupt through ${vector:04X} -> ${:04X}", self.pc);
        self.add_cycles(7);
        7
    }

    /// Resolve the instruction target for `mode`, reporting whether an
    /// indexed form crossed a 256-byte page.
    fn resolve(&mut self, bus: &mut impl Bus, mode: AddrMode) -> (Operand, bool) {
        let arg = self.pc.wrapping_add(1);
        match mode {
            AddrMode::Implied => (Operand::None, false),
            AddrMode::Accumulator => (Operand::Accumulator, false),
            AddrMode::Immediate => (Operand::Addr(arg), false),
            AddrMode::Relative => {
                let offset = bus.read(arg) as i8;
                let next = self.pc.wrapping_add(2);
                let target = next.wrapping_add(offset as u16);
                (Operand::Addr(target), pages_differ(next, target))
            }
            AddrMode::ZeroPage => (Operand::Addr(u16::from(bus.read(arg))), false),
            AddrMode::ZeroPageX => {
                let addr = bus.read(arg).wrapping_add(self.x);
                (Operand::Addr(u16::from(addr)), false)
            }
            AddrMode::ZeroPageY => {
                let addr = bus.read(arg).wrapping_add(self.y);
                (Operand::Addr(u16::from(addr)), false)
            }
            AddrMode::Absolute => (Operand::Addr(bus.read_u16(arg)), false),
            AddrMode::AbsoluteX => {
                let base = bus.read_u16(arg);
                let addr = base.wrapping_add(u16::from(self.x));
                (Operand::Addr(addr), pages_differ(base, addr))
            }
            AddrMode::AbsoluteY => {
                let base = bus.read_u16(arg);
                let addr = base.wrapping_add(u16::from(self.y));
                (Operand::Addr(addr), pages_differ(base, addr))
            }
            AddrMode::Indirect => {
                let ptr = bus.read_u16(arg);
                (Operand::Addr(read_u16_page_wrapped(bus, ptr)), false)
            }
            AddrMode::IndirectX => {
                let ptr = bus.read(arg).wrapping_add(self.x);
                let lo = bus.read(u16::from(ptr));
                let hi = bus.read(u16::from(ptr.wrapping_add(1)));
                (Operand::Addr(u16::from_le_bytes([lo, hi])), false)
            }
            AddrMode::IndirectY => {
                let ptr = bus.read(arg);
                let lo = bus.read(u16::from(ptr));
                let hi = bus.read(u16::from(ptr.wrapping_add(1)));
                let base = u16::from_le_bytes([lo, hi]);
                let addr = base.wrapping_add(u16::from(self.y));
                (Operand::Addr(addr), pages_differ(base, addr))
            }
        }
    }

    fn load(&self, bus: &mut impl Bus, operand: Operand) -> u8 {
        match operand {
            Operand::Accumulator => self.a,
            Operand::Addr(addr) => bus.read(addr),
            Operand::None => 0,
        }
    }

    fn store(&mut self, bus: &mut impl Bus, operand: Operand, value: u8) {
        match operand {
            Operand::Accumulator => self.a = value,
            Operand::Addr(addr) => bus.write(addr, value),
            Operand::None => {}
        }
    }

    /// Execute one decoded instruction against its resolved target.
    #[allow(clippy::too_many_lines)]
    fn execute(&mut self, bus: &mut impl Bus, instr: Instr, operand: Operand) {
        match instr {
            // Loads and stores
            Instr::Lda => {
                self.a = self.load(bus, operand);
                self.status.set_zn(self.a);
            }
            Instr::Ldx => {
                self.x = self.load(bus, operand);
                self.status.set_zn(self.x);
            }
            Instr::Ldy => {
                self.y = self.load(bus, operand);
                self.status.set_zn(self.y);
            }
            Instr::Sta => self.store(bus, operand, self.a),
            Instr::Stx => self.store(bus, operand, self.x),
            Instr::Sty => self.store(bus, operand, self.y),

            // Register transfers
            Instr::Tax => {
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Instr::Tay => {
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Instr::Txa => {
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Instr::Tya => {
                self.a = self.y;
                self.status.set_zn(self.a);
            }
            Instr::Tsx => {
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Instr::Txs => self.sp = self.x,

            // Stack
            Instr::Pha => self.push(bus, self.a),
            Instr::Php => {
                let p = self.status.to_pushed_byte(true);
                self.push(bus, p);
            }
            Instr::Pla => {
                self.a = self.pull(bus);
                self.status.set_zn(self.a);
            }
            Instr::Plp => {
                let p = self.pull(bus);
                self.status = Status::from_pulled_byte(p);
            }

            // Arithmetic
            Instr::Adc => {
                let m = self.load(bus, operand);
                self.adc(m);
            }
            Instr::Sbc => {
                let m = self.load(bus, operand);
                self.adc(m ^ 0xFF);
            }
            Instr::Cmp => {
                let m = self.load(bus, operand);
                self.compare(self.a, m);
            }
            Instr::Cpx => {
                let m = self.load(bus, operand);
                self.compare(self.x, m);
            }
            Instr::Cpy => {
                let m = self.load(bus, operand);
                self.compare(self.y, m);
            }

            // Increments and decrements
            Instr::Inc => {
                let v = self.load(bus, operand).wrapping_add(1);
                self.store(bus, operand, v);
                self.status.set_zn(v);
            }
            Instr::Dec => {
                let v = self.load(bus, operand).wrapping_sub(1);
                self.store(bus, operand, v);
                self.status.set_zn(v);
            }
            Instr::Inx => {
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Instr::Iny => {
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }
            Instr::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Instr::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }

            // Logic
            Instr::And => {
                self.a &= self.load(bus, operand);
                self.status.set_zn(self.a);
            }
            Instr::Ora => {
                self.a |= self.load(bus, operand);
                self.status.set_zn(self.a);
            }
            Instr::Eor => {
                self.a ^= self.load(bus, operand);
                self.status.set_zn(self.a);
            }
            Instr::Bit => {
                let m = self.load(bus, operand);
                self.status.set(Status::Z, self.a & m == 0);
                self.status.set(Status::V, m & 0x40 != 0);
                self.status.set(Status::N, m & 0x80 != 0);
            }

            // Shifts and rotates
            Instr::Asl => {
                let v = self.load(bus, operand);
                self.status.set(Status::C, v & 0x80 != 0);
                let v = v << 1;
                self.store(bus, operand, v);
                self.status.set_zn(v);
            }
            Instr::Lsr => {
                let v = self.load(bus, operand);
                self.status.set(Status::C, v & 0x01 != 0);
                let v = v >> 1;
                self.store(bus, operand, v);
                self.status.set_zn(v);
            }
            Instr::Rol => {
                let v = self.load(bus, operand);
                let carry_in = u8::from(self.status.contains(Status::C));
                self.status.set(Status::C, v & 0x80 != 0);
                let v = (v << 1) | carry_in;
                self.store(bus, operand, v);
                self.status.set_zn(v);
            }
            Instr::Ror => {
                let v = self.load(bus, operand);
                let carry_in = u8::from(self.status.contains(Status::C));
                self.status.set(Status::C, v & 0x01 != 0);
                let v = (v >> 1) | (carry_in << 7);
                self.store(bus, operand, v);
                self.status.set_zn(v);
            }

            // Branches
            Instr::Bcc => self.branch(operand, !self.status.contains(Status::C)),
            Instr::Bcs => self.branch(operand, self.status.contains(Status::C)),
            Instr::Bne => self.branch(operand, !self.status.contains(Status::Z)),
            Instr::Beq => self.branch(operand, self.status.contains(Status::Z)),
            Instr::Bpl => self.branch(operand, !self.status.contains(Status::N)),
            Instr::Bmi => self.branch(operand, self.status.contains(Status::N)),
            Instr::Bvc => self.branch(operand, !self.status.contains(Status::V)),
            Instr::Bvs => self.branch(operand, self.status.contains(Status::V)),

            // Jumps and returns
            Instr::Jmp => {
                if let Operand::Addr(target) = operand {
                    self.pc = target;
                }
                self.jumped = true;
            }
            Instr::Jsr => {
                if let Operand::Addr(target) = operand {
                    let ret = self.pc.wrapping_add(2);
                    self.push_u16(bus, ret);
                    self.pc = target;
                }
                self.jumped = true;
            }
            Instr::Rts => {
                self.pc = self.pull_u16(bus).wrapping_add(1);
                self.jumped = true;
            }
            Instr::Rti => {
                let p = self.pull(bus);
                self.status = Status::from_pulled_byte(p);
                self.pc = self.pull_u16(bus);
                self.jumped = true;
            }
            Instr::Brk => {
                let ret = self.pc.wrapping_add(2);
                self.push_u16(bus, ret);
                let p = self.status.to_pushed_byte(true);
                self.push(bus, p);
                self.status.insert(Status::I);
                self.pc = bus.read_u16(vectors::IRQ);
                self.jumped = true;
            }

            // Flag operations
            Instr::Clc => self.status.remove(Status::C),
            Instr::Sec => self.status.insert(Status::C),
            Instr::Cli => self.status.remove(Status::I),
            Instr::Sei => self.status.insert(Status::I),
            Instr::Clv => self.status.remove(Status::V),
            Instr::Cld => self.status.remove(Status::D),
            Instr::Sed => self.status.insert(Status::D),

            // NOP still performs the operand read of its addressing mode.
            Instr::Nop => {
                if let Operand::Addr(addr) = operand {
                    let _ = bus.read(addr);
                }
            }
        }
    }

    fn branch(&mut self, operand: Operand, taken: bool) {
        if taken {
            if let Operand::Addr(target) = operand {
                self.pc = target;
                self.jumped = true;
            }
        }
    }

    /// sum = A + M + C; C from bit 8, V from the sign rule.
    fn adc(&mut self, m: u8) {
        let carry = u16::from(self.status.contains(Status::C));
        let sum = u16::from(self.a) + u16::from(m) + carry;
        let result = sum as u8;

        self.status.set(Status::C, sum > 0xFF);
        self.status
            .set(Status::V, (!(self.a ^ m) & (self.a ^ result)) & 0x80 != 0);
        self.a = result;
        self.status.set_zn(self.a);
    }

    fn compare(&mut self, reg: u8, m: u8) {
        self.status.set(Status::C, reg >= m);
        self.status.set_zn(reg.wrapping_sub(m));
    }

    pub(crate) fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(crate) fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    fn push_u16(&mut self, bus: &mut impl Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, (value & 0xFF) as u8);
    }

    fn pull_u16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn pages_differ(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}

/// 16-bit read where the high byte wraps within the pointer's page
/// (the JMP ($xxFF) hardware bug).
fn read_u16_page_wrapped(bus: &mut impl Bus, addr: u16) -> u16 {
    let lo = bus.read(addr);
    let hi = bus.read((addr & 0xFF00) | u16::from((addr as u8).wrapping_add(1)));
    u16::from_le_bytes([lo, hi])
}
