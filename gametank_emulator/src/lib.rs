//! Emulator core for the GameTank, an 8-bit console built around two
//! W65C02S processors, a VRAM blitter and a 128x128 indexed-color
//! framebuffer.
//!
//! The host owns a [Console], initializes it once, and pulls frames out of
//! it one at a time:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use gametank_emulator::{Console, RenderTarget};
//!
//! let rom = std::fs::read("game.gtr")?;
//! let mut console = Console::new(rom);
//! console.initialize()?;
//!
//! let mut target = RenderTarget::default();
//! console.run_frame(&mut target)?;
//! # Ok(())
//! # }
//! ```
//!
//! Emulation is fully deterministic: the same cartridge and the same input
//! sequence produce byte-identical frames on every run.

pub mod common;
pub mod components;
pub mod error;

use itertools::iproduct;
use log::info;
use log::warn;
use w65c02s::State;
use w65c02s::W65C02S;

use crate::common::clock::FrameClock;
use crate::common::clock::CPU_FREQUENCY_HZ;
use crate::common::image::Image;
use crate::common::image::NATIVE_SIZE;
use crate::common::image::TARGET_SIZE;
use crate::components::acp::Acp;
use crate::components::blitter::Blitter;
use crate::components::cartridge::Cartridge;
use crate::components::main_bus::MainBus;
use crate::components::palette::Palette;

pub use crate::common::image::RenderTarget;
pub use crate::common::image::Rgba32;
pub use crate::components::gamepad::GamePad;
pub use crate::error::EmulationFault;
pub use crate::error::InitializationError;
pub use crate::error::RunError;

/// A GameTank console owned by the host.
///
/// Construction is cheap; [Console::initialize] performs the one-time setup
/// (cartridge parsing, palette construction) and must complete before
/// [Console::run_frame] is called. A stopped or faulted console stays halted
/// until dropped.
pub struct Console {
    rom_image: Vec<u8>,
    machine: Option<Machine>,
    stopped: bool,
    fault: Option<EmulationFault>,
}

impl Console {
    pub fn new(rom_image: Vec<u8>) -> Self {
        Self {
            rom_image,
            machine: None,
            stopped: false,
            fault: None,
        }
    }

    /// One-time setup. Parses the cartridge image and powers on the machine.
    ///
    /// Calling this on an already initialized console is a logged no-op; the
    /// running machine state is untouched.
    pub fn initialize(&mut self) -> Result<(), InitializationError> {
        if self.machine.is_some() {
            info!("Console is already initialized");
            return Ok(());
        }

        let cartridge = Cartridge::from_gtr_data(&self.rom_image)
            .map_err(InitializationError::InvalidCartridge)?;
        info!("Powering on with a {} cartridge", cartridge.kind);

        self.machine = Some(Machine::new(cartridge));
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.machine.is_some()
    }

    /// Emulates exactly one video frame and writes it into `target`.
    ///
    /// The target must be exactly [TARGET_SIZE]x[TARGET_SIZE] pixels; the
    /// full raster is rewritten on success and untouched on any error.
    /// Errors are checked in order: not initialized, halted, incompatible
    /// target.
    pub fn run_frame(&mut self, target: &mut RenderTarget) -> Result<(), RunError> {
        let machine = self.machine.as_mut().ok_or(RunError::NotInitialized)?;

        if self.stopped || self.fault.is_some() {
            return Err(RunError::Halted);
        }

        if target.width() != TARGET_SIZE || target.height() != TARGET_SIZE {
            return Err(RunError::IncompatibleTarget {
                width: target.width(),
                height: target.height(),
                expected: TARGET_SIZE,
            });
        }

        if let Err(fault) = machine.run_frame() {
            warn!("Emulation fault in frame {}: {fault}", machine.clock.frame);
            self.fault = Some(fault);
            return Err(RunError::Fault(fault));
        }

        machine.render_into(target);
        Ok(())
    }

    /// Halts the console. Further [Console::run_frame] calls fail with
    /// [RunError::Halted].
    pub fn stop(&mut self) {
        if !self.stopped {
            info!("Console stopped by host");
        }
        self.stopped = true;
    }

    /// Latches the gamepad state sampled by the next frames. A no-op before
    /// initialization.
    pub fn update_gamepads(&mut self, pad1: GamePad, pad2: GamePad) {
        if let Some(machine) = &mut self.machine {
            machine.bus.system_control.gamepads.set_pads(pad1, pad2);
        }
    }

    /// Audio samples produced since the last call, one f32 in [-1, 1] per
    /// sample period.
    pub fn take_audio_samples(&mut self) -> Vec<f32> {
        match &mut self.machine {
            Some(machine) => machine.acp.take_samples(),
            None => Vec::new(),
        }
    }

    /// Sample rate of the audio output in Hz, derived from the divider the
    /// cartridge programmed. None while audio is disabled.
    pub fn audio_sample_rate(&self) -> Option<f64> {
        let control = &self.machine.as_ref()?.bus.system_control;
        if control.acp_enabled() {
            Some(CPU_FREQUENCY_HZ / control.sample_rate_divider() as f64)
        } else {
            None
        }
    }

    /// Number of completed frames.
    pub fn frame_count(&self) -> u64 {
        match &self.machine {
            Some(machine) => machine.clock.frame,
            None => 0,
        }
    }
}

/// The powered-on machine: both CPUs, the bus, the blitter and the clock.
struct Machine {
    cpu: W65C02S,
    bus: MainBus,
    blitter: Blitter,
    acp: Acp,
    clock: FrameClock,
    palette: Palette,
    nmi_pending: bool,
}

impl Machine {
    fn new(cartridge: Cartridge) -> Self {
        let mut cpu = W65C02S::new();
        let mut bus = MainBus::new(cartridge);
        // One step runs the reset sequence and fetches the reset vector, so
        // the first frame starts at the cartridge entry point.
        cpu.step(&mut bus);
        bus.take_cycles();
        Self {
            cpu,
            bus,
            blitter: Blitter::default(),
            acp: Acp::new(),
            clock: FrameClock::default(),
            palette: Palette::new(),
            nmi_pending: false,
        }
    }

    /// Advances emulation until the next vblank boundary.
    fn run_frame(&mut self) -> Result<(), EmulationFault> {
        loop {
            if self.cpu.get_state() == State::Stopped {
                return Err(EmulationFault::CpuStopped);
            }

            if self.nmi_pending {
                self.cpu.set_nmi(true);
            }
            self.cpu.step(&mut self.bus);
            if self.nmi_pending {
                self.cpu.set_nmi(false);
                self.nmi_pending = false;
            }

            // A waiting CPU consumes no bus cycles, but time still passes.
            let cycles = self.bus.take_cycles().max(1) as u64;

            for _ in 0..cycles {
                self.blitter.cycle(&mut self.bus);
            }
            self.cpu.set_irq(self.blitter.irq_pending());

            let reset = self.bus.system_control.take_acp_reset();
            let nmi = self.bus.system_control.take_acp_nmi();
            if self.bus.system_control.acp_enabled() {
                let divider = self.bus.system_control.sample_rate_divider();
                self.acp
                    .catch_up(cycles, divider, &mut self.bus.aram, reset, nmi)?;
            }

            if self.clock.advance(cycles) {
                if self.bus.vblank_nmi_enabled() {
                    self.nmi_pending = true;
                }
                return Ok(());
            }
        }
    }

    /// Maps the output framebuffer through the palette and scales it 2x into
    /// `target`.
    fn render_into(&self, target: &mut impl Image) {
        let framebuffer = self.bus.framebuffer_out();
        for (y, x) in iproduct!(0..NATIVE_SIZE, 0..NATIVE_SIZE) {
            let color = self.palette.rgba(framebuffer[(x + y * NATIVE_SIZE) as usize]);
            for (dy, dx) in iproduct!(0..2, 0..2) {
                target.set_pixel((x * 2 + dx, y * 2 + dy), color);
            }
        }
    }
}
