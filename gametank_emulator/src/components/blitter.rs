//! The blitter copies rectangles from VRAM into a framebuffer, one pixel per
//! CPU cycle.

use log::trace;
use log::warn;

use crate::components::main_bus::FRAMEBUFFER_SIZE;
use crate::components::main_bus::MainBus;

/// Blitter registers at $4000-$4007 (visible while DMA is enabled).
#[derive(Debug, Default)]
pub struct BlitRegisters {
    /// Destination (framebuffer) origin.
    pub vx: u8,
    pub vy: u8,
    /// Source (VRAM) origin.
    pub gx: u8,
    pub gy: u8,
    pub width: u8,
    pub height: u8,
    pub start: u8,
    pub color: u8,
}

impl BlitRegisters {
    /// VRAM quadrant addressed by the source origin.
    pub fn vram_quadrant(&self) -> usize {
        let mut quadrant = 0;
        if self.gx >= 128 {
            quadrant += 1;
        }
        if self.gy >= 128 {
            quadrant += 2;
        }
        quadrant
    }

    pub fn write_byte(&mut self, address: u16, data: u8) {
        match address {
            0x4000 => self.vx = data,
            0x4001 => self.vy = data,
            0x4002 => self.gx = data,
            0x4003 => self.gy = data,
            0x4004 => self.width = data,
            0x4005 => self.height = data,
            0x4006 => self.start = data,
            0x4007 => self.color = data,
            _ => {
                warn!("Write to unmapped blitter register ${address:04X}");
            }
        }
    }
}

/// Pixel-stepped blit engine.
///
/// A write to the start register latches the vertical parameters; the
/// horizontal ones are re-read every cycle, matching how the counters are
/// wired in hardware.
#[derive(Debug, Default)]
pub struct Blitter {
    src_y: u8,
    dst_y: u8,
    height: u8,

    offset_x: u8,
    offset_y: u8,

    color_fill: bool,
    color: u8,
    blitting: bool,
    irq_trigger: bool,
}

impl Blitter {
    /// Level of the blit-complete IRQ line.
    pub fn irq_pending(&self) -> bool {
        self.irq_trigger
    }

    pub fn cycle(&mut self, bus: &mut MainBus) {
        if !self.blitting && bus.blit_regs.start != 0 {
            bus.blit_regs.start = 0;
            self.src_y = bus.blit_regs.gy;
            self.dst_y = bus.blit_regs.vy;
            self.height = bus.blit_regs.height;
            self.color = !bus.blit_regs.color;
            self.color_fill = bus.system_control.dma_flags.colorfill();
            self.offset_x = 0;
            self.offset_y = 0;
            self.blitting = true;
            self.irq_trigger = false;

            trace!(
                target: "blitter",
                "blit start: {}x{} at ({}, {}), colorfill={}",
                bus.blit_regs.width,
                bus.blit_regs.height,
                bus.blit_regs.vx,
                bus.blit_regs.vy,
                self.color_fill
            );
        }

        if !self.blitting {
            return;
        }

        let src_x = bus.blit_regs.gx;
        let dst_x = bus.blit_regs.vx;
        let width = bus.blit_regs.width;

        if self.offset_x >= width {
            self.offset_x = 0;
            self.offset_y += 1;
        }

        if self.offset_y >= self.height {
            self.offset_y = 0;
            self.blitting = false;
            if bus.system_control.dma_flags.blit_irq() {
                self.irq_trigger = true;
            }
            return;
        }

        // Counters keep running while DMA access is disabled, but nothing is
        // written.
        if !bus.system_control.dma_flags.dma_enable() {
            self.offset_x += 1;
            return;
        }

        let color = if self.color_fill {
            self.color
        } else {
            let page = bus.system_control.banking.vram_page();
            let quadrant = bus.blit_regs.vram_quadrant();
            // Source counters wrap within the quadrant.
            let local_x = (src_x as usize % 128 + self.offset_x as usize) % 128;
            let local_y = (self.src_y as usize % 128 + self.offset_y as usize) % 128;
            bus.vram_pages[page][quadrant * FRAMEBUFFER_SIZE + local_x + local_y * 128]
        };

        let out_x = dst_x as usize + self.offset_x as usize;
        let out_y = self.dst_y as usize + self.offset_y as usize;
        if out_x >= 128 || out_y >= 128 {
            self.offset_x += 1;
            return;
        }

        // Color 0 is transparent unless the opaque flag is set.
        if bus.system_control.dma_flags.opaque() || color != 0 {
            let fb = bus.system_control.banking.framebuffer();
            bus.framebuffers[fb][out_x + out_y * 128] = color;
        }

        self.offset_x += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::components::cartridge::Cartridge;

    fn test_bus() -> MainBus {
        MainBus::new(Cartridge::from_gtr_data(&vec![0; 0x8000]).unwrap())
    }

    fn start_blit(bus: &mut MainBus, flags: u8, regs: [u8; 8]) {
        bus.system_control.write_byte(0x2007, flags);
        let [vx, vy, gx, gy, width, height, start, color] = regs;
        bus.blit_regs = BlitRegisters {
            vx,
            vy,
            gx,
            gy,
            width,
            height,
            start,
            color,
        };
    }

    #[test]
    fn test_colorfill_rect() {
        let mut bus = test_bus();
        let mut blitter = Blitter::default();
        // enable | colorfill | opaque
        start_blit(&mut bus, 0b1000_1001, [2, 3, 0, 0, 4, 2, 1, !0x2A]);

        for _ in 0..64 {
            blitter.cycle(&mut bus);
        }

        for y in 0..8 {
            for x in 0..8 {
                let expected = if (2..6).contains(&x) && (3..5).contains(&y) {
                    0x2A
                } else {
                    0x00
                };
                assert_eq!(bus.framebuffers[0][x + y * 128], expected, "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_vram_copy_respects_transparency() {
        let mut bus = test_bus();
        let mut blitter = Blitter::default();
        bus.vram_pages[0][0] = 0x11;
        bus.vram_pages[0][1] = 0x00; // transparent
        bus.framebuffers[0][1] = 0x99;
        // enable only: copy mode, transparent color 0
        start_blit(&mut bus, 0b0000_0001, [0, 0, 0, 0, 2, 1, 1, 0]);

        for _ in 0..8 {
            blitter.cycle(&mut bus);
        }

        assert_eq!(bus.framebuffers[0][0], 0x11);
        assert_eq!(bus.framebuffers[0][1], 0x99);
    }

    #[test]
    fn test_irq_raised_at_completion() {
        let mut bus = test_bus();
        let mut blitter = Blitter::default();
        // enable | irq | opaque
        start_blit(&mut bus, 0b1100_0001, [0, 0, 0, 0, 1, 1, 1, 0]);

        assert!(!blitter.irq_pending());
        for _ in 0..4 {
            blitter.cycle(&mut bus);
        }
        assert!(blitter.irq_pending());

        // Starting the next blit clears the line.
        bus.blit_regs.start = 1;
        blitter.cycle(&mut bus);
        assert!(!blitter.irq_pending());
    }

    #[test]
    fn test_clips_at_framebuffer_edge() {
        let mut bus = test_bus();
        let mut blitter = Blitter::default();
        // enable | colorfill | opaque, destination in the bottom-right corner
        start_blit(&mut bus, 0b1000_1001, [126, 126, 0, 0, 4, 4, 1, !0x2A]);

        for _ in 0..32 {
            blitter.cycle(&mut bus);
        }

        assert_eq!(bus.framebuffers[0][126 + 126 * 128], 0x2A);
        assert_eq!(bus.framebuffers[0][127 + 127 * 128], 0x2A);
        // No wrap-around into the left column.
        assert_eq!(bus.framebuffers[0][126 * 128], 0x00);
    }
}
