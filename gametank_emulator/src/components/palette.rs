//! Color lookup table for the 8-bit indexed framebuffer.
//!
//! A framebuffer byte encodes hue in bits 7-5, saturation in bits 4-3 and
//! value in bits 2-0. Hue 0 or saturation 0 select a pure gray ramp. The
//! table is built with integer math only, so the mapping is identical on
//! every platform and run.

use intbits::Bits;

use crate::common::image::Rgba32;

/// Full-intensity RGB poles for the seven chroma hues. Hue 0 is gray.
const HUE_POLES: [[u8; 3]; 8] = [
    [255, 255, 255], // 0: unused (gray ramp)
    [255, 0, 0],     // 1: red
    [255, 128, 0],   // 2: orange
    [255, 255, 0],   // 3: yellow
    [0, 255, 0],     // 4: green
    [0, 255, 255],   // 5: cyan
    [0, 0, 255],     // 6: blue
    [255, 0, 255],   // 7: magenta
];

pub struct Palette {
    entries: Box<[Rgba32; 256]>,
}

impl Palette {
    /// Builds the 256-entry lookup table.
    pub fn new() -> Self {
        let mut entries = Box::new([Rgba32::default(); 256]);
        for (index, entry) in entries.iter_mut().enumerate() {
            *entry = Self::entry_for_index(index as u8);
        }
        Self { entries }
    }

    pub fn rgba(&self, color: u8) -> Rgba32 {
        self.entries[color as usize]
    }

    fn entry_for_index(index: u8) -> Rgba32 {
        let hue = index.bits(5..=7) as usize;
        let saturation = index.bits(3..=4) as u32;
        let value = index.bits(0..=2) as u32;

        // Value ramp: 0..7 maps onto 0..255.
        let gray = (value * 255 / 7) as u8;
        if hue == 0 || saturation == 0 {
            return Rgba32([gray, gray, gray, 255]);
        }

        let mut rgb = [0_u8; 3];
        for (channel, out) in rgb.iter_mut().enumerate() {
            let pole = HUE_POLES[hue][channel] as u32;
            // Channel at full saturation, scaled by value.
            let chroma = pole * gray as u32 / 255;
            // Blend towards gray for the lower saturation steps.
            *out = ((chroma * (saturation + 1) + gray as u32 * (3 - saturation)) / 4) as u8;
        }
        Rgba32([rgb[0], rgb[1], rgb[2], 255])
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}
