//! Audio coprocessor: a second W65C02S with 4 KiB of RAM and an 8-bit DAC.

use std::collections::VecDeque;

use intbits::Bits;
use log::warn;
use w65c02s::State;
use w65c02s::System;
use w65c02s::W65C02S;

use crate::components::main_bus::Aram;
use crate::error::EmulationFault;

/// Samples buffered for the host before the oldest are dropped.
const SAMPLE_QUEUE_LIMIT: usize = 4096;

/// Address space of the coprocessor: ARAM mirrored through the lower half,
/// any write with A15 set latches the DAC.
#[derive(Default)]
pub struct AcpBus {
    cycles: u8,
    pub aram: Option<Aram>,
    pub sample: u8,
    pub irq_counter: i32,
}

impl AcpBus {
    pub fn take_cycles(&mut self) -> u8 {
        std::mem::take(&mut self.cycles)
    }
}

impl System for AcpBus {
    fn read(&mut self, _: &mut W65C02S, addr: u16) -> u8 {
        self.cycles += 1;
        self.irq_counter -= 1;
        match &self.aram {
            Some(aram) => aram[addr as usize & 0x0FFF],
            None => 0,
        }
    }

    fn write(&mut self, _: &mut W65C02S, addr: u16, data: u8) {
        self.cycles += 1;
        self.irq_counter -= 1;
        if addr.bit(15) {
            self.sample = data;
        } else if let Some(aram) = &mut self.aram {
            aram[addr as usize & 0x0FFF] = data;
        }
    }
}

/// The coprocessor and its IRQ-paced sample generation.
///
/// Runs at 4x the cycle accounting of the main CPU. An IRQ fires every
/// `sample_rate_divider * 4` cycles; the DAC byte latched at that moment
/// becomes one output sample.
pub struct Acp {
    pub cpu: W65C02S,
    pub bus: AcpBus,
    cycle_debt: i32,
    samples: VecDeque<f32>,
}

impl Acp {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            cpu: W65C02S::new(),
            bus: AcpBus::default(),
            cycle_debt: 0,
            samples: VecDeque::new(),
        }
    }

    /// Converted DAC output accumulated since the last call, one f32 in
    /// [-1, 1] per sample period.
    pub fn take_samples(&mut self) -> Vec<f32> {
        self.samples.drain(..).collect()
    }

    /// Runs the coprocessor to cover `main_cycles` cycles of the main CPU.
    ///
    /// `aram` is borrowed from the main bus for the duration of the call;
    /// `reset` and `nmi` are the latched $2000/$2001 requests.
    pub fn catch_up(
        &mut self,
        main_cycles: u64,
        sample_rate_divider: u8,
        aram: &mut Option<Aram>,
        reset: bool,
        nmi: bool,
    ) -> Result<(), EmulationFault> {
        self.bus.aram = aram.take();

        if reset {
            self.cpu.reset();
        }
        if nmi {
            self.cpu.set_nmi(true);
        }

        self.cycle_debt += main_cycles as i32 * 4;
        while self.cycle_debt > 0 {
            if self.cpu.get_state() == State::Stopped {
                *aram = self.bus.aram.take();
                return Err(EmulationFault::AcpStopped);
            }

            self.cpu.step(&mut self.bus);
            self.cycle_debt -= self.bus.take_cycles().max(1) as i32;

            self.cpu.set_irq(false);
            self.cpu.set_nmi(false);

            if self.bus.irq_counter <= 0 {
                self.bus.irq_counter = sample_rate_divider as i32 * 4;
                self.cpu.set_irq(true);
                self.push_sample(self.bus.sample);
            }
        }

        *aram = self.bus.aram.take();
        Ok(())
    }

    fn push_sample(&mut self, sample: u8) {
        if self.samples.len() >= SAMPLE_QUEUE_LIMIT {
            warn!("audio sample queue full, dropping oldest sample");
            self.samples.pop_front();
        }
        self.samples.push_back((sample as f32 / 255.0) * 2.0 - 1.0);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dac_write_latches_sample() {
        let mut bus = AcpBus {
            aram: Some(Box::new([0; 0x1000])),
            ..Default::default()
        };
        let mut cpu = W65C02S::new();
        System::write(&mut bus, &mut cpu, 0x8000, 0x7F);
        assert_eq!(bus.sample, 0x7F);
        // ARAM untouched by DAC writes.
        assert_eq!(bus.aram.as_ref().unwrap()[0], 0);
    }

    #[test]
    fn test_aram_is_mirrored() {
        let mut bus = AcpBus {
            aram: Some(Box::new([0; 0x1000])),
            ..Default::default()
        };
        let mut cpu = W65C02S::new();
        System::write(&mut bus, &mut cpu, 0x0010, 0x42);
        assert_eq!(System::read(&mut bus, &mut cpu, 0x1010), 0x42);
        assert_eq!(System::read(&mut bus, &mut cpu, 0x7010), 0x42);
    }

    #[test]
    fn test_sample_centering() {
        let mut acp = Acp::new();
        acp.push_sample(0);
        acp.push_sample(255);
        let samples = acp.take_samples();
        assert_eq!(samples[0], -1.0);
        assert_eq!(samples[1], 1.0);
        assert!(acp.take_samples().is_empty());
    }
}
