//! Parsing and mapping of .gtr cartridge images.

use std::path::Path;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;

/// Size of the ROM window visible at $8000-$FFFF.
pub const WINDOW_SIZE: usize = 0x8000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum CartridgeKind {
    #[strum(serialize = "8K")]
    Cart8K,
    #[strum(serialize = "32K")]
    Cart32K,
    #[strum(serialize = "2M")]
    Cart2M,
}

/// A cartridge with its ROM mapped into the CPU-visible window.
///
/// 8K images sit at the top of the window so the interrupt vectors at
/// $FFFA-$FFFF come from the image. 2M images expose their final 32K bank;
/// bank switching through the VIA is not implemented, matching the
/// capabilities of the machine being emulated here.
pub struct Cartridge {
    pub kind: CartridgeKind,
    window: Box<[u8; WINDOW_SIZE]>,
}

impl Cartridge {
    pub fn from_gtr_data(data: &[u8]) -> Result<Cartridge> {
        let kind = match data.len() {
            0x2000 => CartridgeKind::Cart8K,
            0x8000 => CartridgeKind::Cart32K,
            0x200000 => CartridgeKind::Cart2M,
            other => bail!("unsupported cartridge image size: {other} bytes"),
        };

        let mut window = Box::new([0_u8; WINDOW_SIZE]);
        match kind {
            CartridgeKind::Cart8K => window[WINDOW_SIZE - 0x2000..].copy_from_slice(data),
            CartridgeKind::Cart32K => window.copy_from_slice(data),
            CartridgeKind::Cart2M => window.copy_from_slice(&data[data.len() - WINDOW_SIZE..]),
        }

        Ok(Cartridge { kind, window })
    }

    pub fn from_gtr_file(path: &Path) -> Result<Cartridge> {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read cartridge {}", path.display()))?;
        Self::from_gtr_data(&data)
    }

    /// Byte at `offset` into the $8000-$FFFF window.
    pub fn read_window(&self, offset: usize) -> u8 {
        self.window[offset]
    }
}
