//! Gamepad ports and their multiplexed register protocol.

use intbits::Bits;

/// An 8-button controller: d-pad, A/B/C and Start.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GamePad {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub a: bool,
    pub b: bool,
    pub c: bool,
    pub start: bool,
}

/// Per-port latch of the button multiplexer.
///
/// The hardware reports each pad over a single byte in two phases, selected
/// by a flip-flop that toggles on every read of the port and is cleared by a
/// read of the other port.
#[derive(Debug, Default, Clone, Copy)]
pub struct GamePadPort {
    pub pad: GamePad,
    select: bool,
}

impl GamePadPort {
    /// Button lines for the current phase. Active-low: a pressed button
    /// pulls its bit to 0.
    ///
    /// Phase A (select clear): bit 5 = start, bit 4 = A.
    /// Phase B (select set): bit 5 = C, bit 4 = B, bits 3-0 = d-pad.
    fn report(&self) -> u8 {
        let pad = &self.pad;
        let mut byte = 0xFF_u8;
        if !self.select {
            byte.set_bit(5, !pad.start);
            byte.set_bit(4, !pad.a);
        } else {
            byte.set_bit(5, !pad.c);
            byte.set_bit(4, !pad.b);
            byte.set_bit(3, !pad.up);
            byte.set_bit(2, !pad.down);
            byte.set_bit(1, !pad.left);
            byte.set_bit(0, !pad.right);
        }
        byte
    }
}

#[derive(Debug, Default)]
pub struct GamePadPorts(pub [GamePadPort; 2]);

impl GamePadPorts {
    /// Reads the register of port `port` (0 or 1), advancing the multiplexer:
    /// the read port toggles its phase, the other port resets to phase A.
    pub fn read_port(&mut self, port: usize) -> u8 {
        let byte = self.0[port].report();
        self.0[1 - port].select = false;
        self.0[port].select = !self.0[port].select;
        byte
    }

    pub fn set_pads(&mut self, pad1: GamePad, pad2: GamePad) {
        self.0[0].pad = pad1;
        self.0[1].pad = pad2;
    }
}
