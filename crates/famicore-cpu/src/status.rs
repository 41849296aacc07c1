//! The processor status register (P).
//!
//! ```text
//! 7  6  5  4  3  2  1  0
//! N  V  U  B  D  I  Z  C
//! │  │  │  │  │  │  │  └─ Carry
//! │  │  │  │  │  │  └──── Zero
//! │  │  │  │  │  └─────── Interrupt disable
//! │  │  │  │  └────────── Decimal (flag latches but ADC/SBC stay binary)
//! │  │  │  └───────────── Break (1 in PHP/BRK pushes, 0 in IRQ/NMI pushes)
//! │  │  └──────────────── Unused (reads as 1 in every pushed copy)
//! │  └─────────────────── Overflow
//! └────────────────────── Negative
//! ```

use bitflags::bitflags;

bitflags! {
    /// Processor status flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u8 {
        /// Carry.
        const C = 1 << 0;
        /// Zero.
        const Z = 1 << 1;
        /// Interrupt disable. Masks IRQ, never NMI.
        const I = 1 << 2;
        /// Decimal mode. Latched but without effect on the NES ALU.
        const D = 1 << 3;
        /// Break marker. Only meaningful in pushed copies.
        const B = 1 << 4;
        /// Unused bit, reads as 1.
        const U = 1 << 5;
        /// Signed overflow.
        const V = 1 << 6;
        /// Negative (bit 7 of the last result).
        const N = 1 << 7;
    }
}

impl Status {
    /// Power-on/reset value ($24: I and U set).
    pub const POWER_ON: Self = Self::I.union(Self::U);

    /// Set Z and N from a result byte.
    #[inline]
    pub fn set_zn(&mut self, value: u8) {
        self.set(Self::Z, value == 0);
        self.set(Self::N, value & 0x80 != 0);
    }

    /// Byte image for a stack push. Bit 5 is forced on; bit 4 is set only
    /// for BRK/PHP pushes.
    #[inline]
    #[must_use]
    pub const fn to_pushed_byte(self, software: bool) -> u8 {
        let mut bits = self.bits() | Self::U.bits();
        if software {
            bits |= Self::B.bits();
        }
        bits
    }

    /// Rebuild P from a byte pulled off the stack. The pushed B marker is
    /// discarded and U forced on.
    #[inline]
    #[must_use]
    pub fn from_pulled_byte(value: u8) -> Self {
        Self::from_bits_truncate((value & !Self::B.bits()) | Self::U.bits())
    }
}
