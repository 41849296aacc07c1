//! PPUCTRL, PPUMASK and PPUSTATUS bit definitions.

use bitflags::bitflags;

bitflags! {
    /// PPUCTRL ($2000, write-only).
    ///
    /// ```text
    /// 7  bit  0
    /// VPHB SINN
    /// |||| ||++- base nametable (0=$2000, 1=$2400, 2=$2800, 3=$2C00)
    /// |||| |+--- VRAM increment per PPUDATA access (0: +1, 1: +32)
    /// |||| +---- sprite pattern table for 8x8 sprites
    /// |||+------ background pattern table
    /// ||+------- sprite size (0: 8x8, 1: 8x16)
    /// |+-------- master/slave select (unused)
    /// +--------- NMI at vblank start
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuCtrl: u8 {
        /// Nametable select bit 0.
        const NAMETABLE_LO = 0x01;
        /// Nametable select bit 1.
        const NAMETABLE_HI = 0x02;
        /// VRAM address increment: +32 when set, +1 otherwise.
        const INCREMENT_32 = 0x04;
        /// Sprite pattern table at $1000 (8x8 mode only).
        const SPRITE_TABLE = 0x08;
        /// Background pattern table at $1000.
        const BG_TABLE = 0x10;
        /// 8x16 sprites.
        const TALL_SPRITES = 0x20;
        /// Master/slave select. Latched, otherwise ignored.
        const MASTER_SLAVE = 0x40;
        /// Raise NMI at the start of vertical blank.
        const NMI_ENABLE = 0x80;
    }
}

impl PpuCtrl {
    /// PPUDATA auto-increment step (1 or 32).
    #[inline]
    pub fn vram_increment(self) -> u16 {
        if self.contains(Self::INCREMENT_32) { 32 } else { 1 }
    }

    /// Pattern table base for 8x8 sprites.
    #[inline]
    pub fn sprite_table(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Pattern table base for the background.
    #[inline]
    pub fn bg_table(self) -> u16 {
        if self.contains(Self::BG_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Sprite height in scanlines (8 or 16).
    #[inline]
    pub fn sprite_height(self) -> u16 {
        if self.contains(Self::TALL_SPRITES) { 16 } else { 8 }
    }

    /// Whether vblank raises NMI.
    #[inline]
    pub fn nmi_enabled(self) -> bool {
        self.contains(Self::NMI_ENABLE)
    }
}

bitflags! {
    /// PPUMASK ($2001, write-only).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuMask: u8 {
        /// Greyscale output.
        const GREYSCALE = 0x01;
        /// Show background in the leftmost 8 columns.
        const SHOW_LEFT_BG = 0x02;
        /// Show sprites in the leftmost 8 columns.
        const SHOW_LEFT_SPRITES = 0x04;
        /// Background enable.
        const SHOW_BG = 0x08;
        /// Sprite enable.
        const SHOW_SPRITES = 0x10;
        /// Emphasize red.
        const EMPHASIZE_RED = 0x20;
        /// Emphasize green.
        const EMPHASIZE_GREEN = 0x40;
        /// Emphasize blue.
        const EMPHASIZE_BLUE = 0x80;
    }
}

impl PpuMask {
    /// Rendering is on when either layer is enabled.
    #[inline]
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Self::SHOW_BG | Self::SHOW_SPRITES)
    }

    /// Background layer enabled.
    #[inline]
    pub fn show_background(self) -> bool {
        self.contains(Self::SHOW_BG)
    }

    /// Sprite layer enabled.
    #[inline]
    pub fn show_sprites(self) -> bool {
        self.contains(Self::SHOW_SPRITES)
    }
}

bitflags! {
    /// PPUSTATUS ($2002, read-only). The low five bits are open bus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuStatus: u8 {
        /// More than eight sprites matched a scanline.
        const SPRITE_OVERFLOW = 0x20;
        /// An opaque pixel of sprite 0 overlapped an opaque background
        /// pixel this frame.
        const SPRITE_ZERO_HIT = 0x40;
        /// Vertical blank has started.
        const VBLANK = 0x80;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_accessors() {
        assert_eq!(PpuCtrl::empty().vram_increment(), 1);
        assert_eq!(PpuCtrl::INCREMENT_32.vram_increment(), 32);
        assert_eq!(PpuCtrl::empty().bg_table(), 0x0000);
        assert_eq!(PpuCtrl::BG_TABLE.bg_table(), 0x1000);
        assert_eq!(PpuCtrl::SPRITE_TABLE.sprite_table(), 0x1000);
        assert_eq!(PpuCtrl::empty().sprite_height(), 8);
        assert_eq!(PpuCtrl::TALL_SPRITES.sprite_height(), 16);
        assert!(PpuCtrl::NMI_ENABLE.nmi_enabled());
    }

    #[test]
    fn mask_rendering_enabled() {
        assert!(!PpuMask::empty().rendering_enabled());
        assert!(PpuMask::SHOW_BG.rendering_enabled());
        assert!(PpuMask::SHOW_SPRITES.rendering_enabled());
        assert!(!PpuMask::GREYSCALE.rendering_enabled());
    }

    #[test]
    fn status_bits_sit_in_the_top_three() {
        let all = PpuStatus::SPRITE_OVERFLOW | PpuStatus::SPRITE_ZERO_HIT | PpuStatus::VBLANK;
        assert_eq!(all.bits(), 0xE0);
    }
}
