//! High level testing of the host-facing console contract.
//!
//! Tests drive small hand-assembled cartridges through whole frames and check
//! the rendered output, including a comparison against a previously stored
//! golden image.

use std::path::Path;
use std::path::PathBuf;

use gametank_emulator::common::logging;
use gametank_emulator::Console;
use gametank_emulator::EmulationFault;
use gametank_emulator::GamePad;
use gametank_emulator::RenderTarget;
use gametank_emulator::Rgba32;
use gametank_emulator::RunError;
use image::RgbaImage;
use pretty_assertions::assert_eq;

/// 32K image with `program` at $8000 and all vectors wired up. The NMI and
/// IRQ vectors are parked on an infinite loop at $802A.
fn rom_with_program(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0_u8; 0x8000];
    rom[..program.len()].copy_from_slice(program);
    rom[0x7FFA..].copy_from_slice(&[0x2A, 0x80, 0x00, 0x80, 0x2A, 0x80]);
    rom
}

/// Fills a 127x127 rectangle of framebuffer 0 with color $A3 via a colorfill
/// blit, then spins.
fn blit_demo_rom() -> Vec<u8> {
    rom_with_program(&[
        0xA9, 0x00, 0x8D, 0x05, 0x20, // banking: bank 0, framebuffer 0
        0xA9, 0x89, 0x8D, 0x07, 0x20, // dma flags: enable | colorfill | opaque
        0xA9, 0x00, 0x8D, 0x00, 0x40, // vx = 0
        0x8D, 0x01, 0x40, // vy = 0
        0x8D, 0x02, 0x40, // gx = 0
        0x8D, 0x03, 0x40, // gy = 0
        0xA9, 0x7F, 0x8D, 0x04, 0x40, // width = 127
        0x8D, 0x05, 0x40, // height = 127
        0xA9, 0x5C, 0x8D, 0x07, 0x40, // color = !$A3
        0xA9, 0x01, 0x8D, 0x06, 0x40, // start
        0x4C, 0x2A, 0x80, // spin
    ])
}

/// Reads both multiplexer phases of gamepad port 1 and stores the reports in
/// the first two framebuffer pixels, then spins.
fn gamepad_readout_rom() -> Vec<u8> {
    rom_with_program(&[
        0xA9, 0x00, 0x8D, 0x05, 0x20, // banking: bank 0, framebuffer 0
        0xA9, 0x20, 0x8D, 0x07, 0x20, // dma flags: cpu-to-vram access
        0xAD, 0x08, 0x20, // read port 1, phase A
        0x8D, 0x00, 0x40,
        0xAD, 0x08, 0x20, // read port 1, phase B
        0x8D, 0x01, 0x40,
        0x4C, 0x16, 0x80, // spin
    ])
}

/// Enables the audio coprocessor with sample-rate divider 192, then spins.
fn audio_rom() -> Vec<u8> {
    rom_with_program(&[
        0xA9, 0xC0, 0x8D, 0x06, 0x20, // audio enable | divider 192
        0x4C, 0x05, 0x80, // spin
    ])
}

/// Color $A3 has saturation 0, so it falls on the gray ramp at value 3.
const BLIT_GRAY: Rgba32 = Rgba32([109, 109, 109, 255]);
const BLACK: Rgba32 = Rgba32([0, 0, 0, 255]);

#[test]
fn test_run_before_initialize_fails() {
    logging::test_init(false);

    let mut console = Console::new(blit_demo_rom());
    let mut target = RenderTarget::default();
    assert!(matches!(
        console.run_frame(&mut target),
        Err(RunError::NotInitialized)
    ));
    // The target is untouched by a failed call.
    assert!(target.data().iter().all(|byte| *byte == 0));
}

#[test]
fn test_invalid_cartridge_image() {
    logging::test_init(false);

    let mut console = Console::new(vec![0; 100]);
    assert!(console.initialize().is_err());
    assert!(!console.is_initialized());
}

#[test]
fn test_initialize_twice_is_noop() {
    logging::test_init(false);

    let mut console = Console::new(blit_demo_rom());
    console.initialize().unwrap();
    let mut target = RenderTarget::default();
    console.run_frame(&mut target).unwrap();

    // The second call must not reset the running machine.
    console.initialize().unwrap();
    assert_eq!(console.frame_count(), 1);
}

#[test]
fn test_incompatible_render_target() {
    logging::test_init(false);

    let mut console = Console::new(blit_demo_rom());
    console.initialize().unwrap();

    let mut target = RenderTarget::with_size(128, 128);
    assert!(matches!(
        console.run_frame(&mut target),
        Err(RunError::IncompatibleTarget {
            width: 128,
            height: 128,
            expected: 256,
        })
    ));
    assert!(target.data().iter().all(|byte| *byte == 0));
}

#[test]
fn test_stop_halts_the_console() {
    logging::test_init(false);

    let mut console = Console::new(blit_demo_rom());
    console.initialize().unwrap();
    let mut target = RenderTarget::default();
    console.run_frame(&mut target).unwrap();

    console.stop();
    assert!(matches!(
        console.run_frame(&mut target),
        Err(RunError::Halted)
    ));
}

#[test]
fn test_stopped_cpu_latches_fault() {
    logging::test_init(false);

    // STP as the first instruction.
    let mut console = Console::new(rom_with_program(&[0xDB]));
    console.initialize().unwrap();

    let mut target = RenderTarget::default();
    assert!(matches!(
        console.run_frame(&mut target),
        Err(RunError::Fault(EmulationFault::CpuStopped))
    ));
    // The fault is latched; later calls report a halted console.
    assert!(matches!(
        console.run_frame(&mut target),
        Err(RunError::Halted)
    ));
}

#[test]
fn test_blit_demo_frame_pixels() {
    logging::test_init(false);

    let mut console = Console::new(blit_demo_rom());
    console.initialize().unwrap();
    let mut target = RenderTarget::default();
    console.run_frame(&mut target).unwrap();
    assert_eq!(console.frame_count(), 1);

    // The 127x127 native rectangle covers 254x254 target pixels.
    assert_eq!(target.pixel(0, 0), BLIT_GRAY);
    assert_eq!(target.pixel(253, 253), BLIT_GRAY);
    assert_eq!(target.pixel(254, 254), BLACK);
    assert_eq!(target.pixel(255, 0), BLACK);

    // The full raster is written: alpha is opaque everywhere.
    assert!(target.data().chunks_exact(4).all(|pixel| pixel[3] == 255));
}

#[test]
fn test_frames_are_deterministic() {
    logging::test_init(false);

    let run = || {
        let mut console = Console::new(blit_demo_rom());
        console.initialize().unwrap();
        let mut target = RenderTarget::default();
        for _ in 0..5 {
            console.run_frame(&mut target).unwrap();
        }
        target.data().to_vec()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_gamepad_input_reaches_the_cartridge() {
    logging::test_init(false);

    let mut console = Console::new(gamepad_readout_rom());
    console.initialize().unwrap();
    console.update_gamepads(
        GamePad {
            start: true,
            right: true,
            ..Default::default()
        },
        GamePad::default(),
    );

    let mut target = RenderTarget::default();
    console.run_frame(&mut target).unwrap();

    // Phase A reads $DF (start pulls bit 5 low): hue 6 at full
    // saturation/value, pure blue.
    assert_eq!(target.pixel(0, 0), Rgba32([0, 0, 255, 255]));
    // Phase B reads $FE (right pulls bit 0 low): hue 7 at value 6.
    assert_eq!(target.pixel(2, 0), Rgba32([218, 0, 218, 255]));
}

#[test]
fn test_audio_samples_are_produced_when_enabled() {
    logging::test_init(false);

    let mut console = Console::new(audio_rom());
    console.initialize().unwrap();
    // Audio is off until the cartridge enables it.
    assert_eq!(console.audio_sample_rate(), None);
    assert!(console.take_audio_samples().is_empty());

    let mut target = RenderTarget::default();
    console.run_frame(&mut target).unwrap();

    assert_eq!(console.audio_sample_rate(), Some(3_579_545.0 / 192.0));
    let samples = console.take_audio_samples();
    // One sample per 192 * 4 coprocessor cycles over a 59,659 cycle frame.
    assert!(samples.len() >= 300, "got {} samples", samples.len());
    // The cartridge never writes the DAC, so output sits at the bottom of
    // the range.
    assert!(samples.iter().all(|sample| *sample == -1.0));
    // Taking the queue drains it.
    assert!(console.take_audio_samples().is_empty());
}

#[test]
fn test_blit_demo_golden_frame() {
    logging::test_init(true);

    let mut console = Console::new(blit_demo_rom());
    console.initialize().unwrap();
    let mut target = RenderTarget::default();
    console.run_frame(&mut target).unwrap();

    compare_to_golden(&target, &test_dir().join("blit_demo-frame1"));
}

fn test_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/console_tests")
}

fn compare_to_golden(target: &RenderTarget, path_prefix: &Path) {
    let actual =
        RgbaImage::from_raw(target.width(), target.height(), target.data().to_vec()).unwrap();
    let golden_path = path_prefix.with_extension("png");
    if golden_path.exists() {
        let golden: RgbaImage = image::open(&golden_path).unwrap().into_rgba8();
        if golden != actual {
            let actual_path = golden_path.with_extension("actual.png");
            actual.save(&actual_path).unwrap();
            panic!("Image does not match golden. See {:?}", actual_path);
        }
    } else {
        std::fs::create_dir_all(golden_path.parent().unwrap()).unwrap();
        actual.save(golden_path).unwrap();
    }
}
