//! Cycle and frame bookkeeping for the 3.58 MHz system clock.

/// CPU cycles between two vblank events.
///
/// 3,579,545 Hz / ~60 Hz refresh, as counted by the video timing chain.
pub const CYCLES_PER_FRAME: u64 = 59659;

/// Nominal CPU frequency in Hz. Used to derive audio sample rates.
pub const CPU_FREQUENCY_HZ: f64 = 3_579_545.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FrameClock {
    pub master_cycle: u64,
    pub frame: u64,
    cycles_to_vblank: i64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            master_cycle: 0,
            frame: 0,
            cycles_to_vblank: CYCLES_PER_FRAME as i64,
        }
    }
}

impl FrameClock {
    /// Advances the clock by `cycles`. Returns true if a vblank boundary was
    /// crossed.
    pub fn advance(&mut self, cycles: u64) -> bool {
        self.master_cycle += cycles;
        self.cycles_to_vblank -= cycles as i64;
        if self.cycles_to_vblank <= 0 {
            self.cycles_to_vblank += CYCLES_PER_FRAME as i64;
            self.frame += 1;
            true
        } else {
            false
        }
    }
}
