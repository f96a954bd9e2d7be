//! System control registers at $2000-$2009.

use intbits::Bits;
use log::warn;

use crate::components::gamepad::GamePadPorts;

/// $2005: memory banking.
#[derive(Default, Clone, Copy, Debug)]
pub struct BankingRegister(pub u8);

impl BankingRegister {
    pub fn vram_page(self) -> usize {
        self.0.bits(0..=2) as usize
    }

    pub fn framebuffer(self) -> usize {
        self.0.bit(3) as usize
    }

    pub fn clip_blits_h(self) -> bool {
        self.0.bit(4)
    }

    pub fn clip_blits_v(self) -> bool {
        self.0.bit(5)
    }

    pub fn ram_bank(self) -> usize {
        self.0.bits(6..=7) as usize
    }
}

/// $2007: DMA/blitter control flags.
#[derive(Default, Clone, Copy, Debug)]
pub struct DmaFlags(pub u8);

impl DmaFlags {
    pub fn dma_enable(self) -> bool {
        self.0.bit(0)
    }

    pub fn page_out(self) -> usize {
        self.0.bit(1) as usize
    }

    pub fn vblank_nmi(self) -> bool {
        self.0.bit(2)
    }

    pub fn colorfill(self) -> bool {
        self.0.bit(3)
    }

    pub fn cpu_to_vram(self) -> bool {
        self.0.bit(5)
    }

    pub fn blit_irq(self) -> bool {
        self.0.bit(6)
    }

    pub fn opaque(self) -> bool {
        self.0.bit(7)
    }
}

/// Routing of the $4000-$7FFF graphics window, decided by the DMA flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicsWindow {
    Framebuffer,
    Vram,
    BlitRegisters,
}

pub struct SystemControl {
    pub banking: BankingRegister,
    pub dma_flags: DmaFlags,
    /// Bit 7 enables the audio coprocessor; bits 6-0 divide the sample rate.
    pub audio_enable_sample_rate: u8,
    pub gamepads: GamePadPorts,

    acp_reset_pending: bool,
    acp_nmi_pending: bool,
}

impl Default for SystemControl {
    fn default() -> Self {
        Self {
            banking: BankingRegister(0),
            // Only the colorfill flag is set at power-on.
            dma_flags: DmaFlags(0b0000_1000),
            audio_enable_sample_rate: 0,
            gamepads: GamePadPorts::default(),
            acp_reset_pending: false,
            acp_nmi_pending: false,
        }
    }
}

impl SystemControl {
    pub fn graphics_window(&self) -> GraphicsWindow {
        if self.dma_flags.dma_enable() {
            return GraphicsWindow::BlitRegisters;
        }

        if self.dma_flags.cpu_to_vram() {
            return GraphicsWindow::Framebuffer;
        }

        GraphicsWindow::Vram
    }

    pub fn acp_enabled(&self) -> bool {
        self.audio_enable_sample_rate.bit(7)
    }

    pub fn sample_rate_divider(&self) -> u8 {
        self.audio_enable_sample_rate
    }

    /// Framebuffer page currently wired to the video output.
    pub fn framebuffer_out(&self) -> usize {
        self.dma_flags.page_out()
    }

    /// Takes a pending ACP reset request ($2000 write).
    pub fn take_acp_reset(&mut self) -> bool {
        std::mem::take(&mut self.acp_reset_pending)
    }

    /// Takes a pending ACP NMI request ($2001 write).
    pub fn take_acp_nmi(&mut self) -> bool {
        std::mem::take(&mut self.acp_nmi_pending)
    }

    pub fn write_byte(&mut self, address: u16, data: u8) {
        match address {
            0x2000 => self.acp_reset_pending = true,
            0x2001 => self.acp_nmi_pending = true,
            0x2005 => self.banking = BankingRegister(data),
            0x2006 => self.audio_enable_sample_rate = data,
            0x2007 => self.dma_flags = DmaFlags(data),
            _ => {
                warn!("Write to read-only system control register ${address:04X}");
            }
        }
    }

    pub fn read_byte(&mut self, address: u16) -> u8 {
        match address {
            0x2008 => self.gamepads.read_port(0),
            0x2009 => self.gamepads.read_port(1),
            _ => {
                warn!("Read from write-only system control register ${address:04X}");
                0
            }
        }
    }
}
