//! Memory map of the main W65C02S.

use log::warn;
use w65c02s::System;
use w65c02s::W65C02S;

use crate::components::blitter::BlitRegisters;
use crate::components::cartridge::Cartridge;
use crate::components::system_control::GraphicsWindow;
use crate::components::system_control::SystemControl;

/// Bytes in one 128x128 indexed-color framebuffer.
pub const FRAMEBUFFER_SIZE: usize = 128 * 128;

/// Bytes in one VRAM page: four framebuffer-sized quadrants.
pub const VRAM_PAGE_SIZE: usize = 4 * FRAMEBUFFER_SIZE;

/// Audio RAM shared between the main CPU and the audio coprocessor.
pub const ARAM_SIZE: usize = 0x1000;

pub type Aram = Box<[u8; ARAM_SIZE]>;

pub struct MainBus {
    cycles: u8,

    pub zero_page: [u8; 0x100],
    pub stack: [u8; 0x100],

    pub system_control: SystemControl,
    pub blit_regs: BlitRegisters,
    pub ram_banks: Box<[[u8; 0x2000 - 0x200]; 4]>,
    pub framebuffers: [Box<[u8; FRAMEBUFFER_SIZE]>; 2],
    pub vram_pages: Box<[[u8; VRAM_PAGE_SIZE]; 8]>,
    /// Taken by the scheduler while the audio coprocessor runs.
    pub aram: Option<Aram>,
    pub cartridge: Cartridge,
}

impl MainBus {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            cycles: 0,
            zero_page: [0; 0x100],
            stack: [0; 0x100],
            system_control: SystemControl::default(),
            blit_regs: BlitRegisters::default(),
            ram_banks: Box::new([[0; 0x2000 - 0x200]; 4]),
            // Fixed power-on fill keeps first frames reproducible.
            framebuffers: [
                Box::new([0x00; FRAMEBUFFER_SIZE]),
                Box::new([0xFF; FRAMEBUFFER_SIZE]),
            ],
            vram_pages: Box::new([[0; VRAM_PAGE_SIZE]; 8]),
            aram: Some(Box::new([0; ARAM_SIZE])),
            cartridge,
        }
    }

    /// Framebuffer currently wired to the video output.
    pub fn framebuffer_out(&self) -> &[u8; FRAMEBUFFER_SIZE] {
        &self.framebuffers[self.system_control.framebuffer_out()]
    }

    /// Cycles consumed since the last call. Every bus access is one cycle.
    pub fn take_cycles(&mut self) -> u8 {
        std::mem::take(&mut self.cycles)
    }

    pub fn vblank_nmi_enabled(&self) -> bool {
        self.system_control.dma_flags.vblank_nmi()
    }

    pub fn write_byte(&mut self, address: u16, data: u8) {
        match address {
            // zero page
            0x0000..=0x00FF => {
                self.zero_page[address as usize] = data;
            }

            // cpu stack
            0x0100..=0x01FF => {
                self.stack[address as usize - 0x100] = data;
            }

            // system RAM, banked
            0x0200..=0x1FFF => {
                let bank = self.system_control.banking.ram_bank();
                self.ram_banks[bank][address as usize - 0x200] = data;
            }

            // system control registers
            0x2000..=0x2009 => {
                self.system_control.write_byte(address, data);
            }

            // versatile interface adapter (GPIO, timers), not implemented
            0x2800..=0x280F => {
                warn!("Write to unimplemented VIA register ${address:04X}");
            }

            // audio RAM
            0x3000..=0x3FFF => {
                if let Some(aram) = &mut self.aram {
                    aram[(address - 0x3000) as usize] = data;
                }
            }

            // VRAM/framebuffer/blitter window
            0x4000..=0x7FFF => {
                let offset = address as usize - 0x4000;
                match self.system_control.graphics_window() {
                    GraphicsWindow::Framebuffer => {
                        let fb = self.system_control.banking.framebuffer();
                        self.framebuffers[fb][offset] = data;
                    }
                    GraphicsWindow::Vram => {
                        let page = self.system_control.banking.vram_page();
                        let quadrant = self.blit_regs.vram_quadrant();
                        self.vram_pages[page][offset + quadrant * FRAMEBUFFER_SIZE] = data;
                    }
                    GraphicsWindow::BlitRegisters => {
                        self.blit_regs.write_byte(address, data);
                    }
                }
            }

            _ => {
                warn!("Write to read-only memory at ${address:04X}");
            }
        }
    }

    pub fn read_byte(&mut self, address: u16) -> u8 {
        match address {
            // zero page
            0x0000..=0x00FF => self.zero_page[address as usize],

            // cpu stack
            0x0100..=0x01FF => self.stack[address as usize - 0x100],

            // system RAM, banked
            0x0200..=0x1FFF => {
                let bank = self.system_control.banking.ram_bank();
                self.ram_banks[bank][address as usize - 0x200]
            }

            // system control registers
            0x2000..=0x2009 => self.system_control.read_byte(address),

            // versatile interface adapter (GPIO, timers), not implemented
            0x2800..=0x280F => {
                warn!("Read from unimplemented VIA register ${address:04X}");
                0
            }

            // audio RAM
            0x3000..=0x3FFF => match &self.aram {
                Some(aram) => aram[(address - 0x3000) as usize],
                None => 0,
            },

            // VRAM/framebuffer/blitter window
            0x4000..=0x7FFF => {
                let offset = address as usize - 0x4000;
                match self.system_control.graphics_window() {
                    GraphicsWindow::Framebuffer => {
                        let fb = self.system_control.banking.framebuffer();
                        self.framebuffers[fb][offset]
                    }
                    GraphicsWindow::Vram => {
                        let page = self.system_control.banking.vram_page();
                        let quadrant = self.blit_regs.vram_quadrant();
                        self.vram_pages[page][offset + quadrant * FRAMEBUFFER_SIZE]
                    }
                    GraphicsWindow::BlitRegisters => {
                        warn!("Read from write-only blitter register ${address:04X}");
                        0
                    }
                }
            }

            // cartridge ROM window
            0x8000..=0xFFFF => self.cartridge.read_window(address as usize - 0x8000),

            _ => {
                warn!("Read from unmapped memory at ${address:04X}");
                0
            }
        }
    }
}

impl System for MainBus {
    fn read(&mut self, _: &mut W65C02S, addr: u16) -> u8 {
        self.cycles += 1;
        self.read_byte(addr)
    }

    fn write(&mut self, _: &mut W65C02S, addr: u16, data: u8) {
        self.cycles += 1;
        self.write_byte(addr, data);
    }
}
