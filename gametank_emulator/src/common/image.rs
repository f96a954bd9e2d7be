//! Pixel formats and the host-facing render surface.

/// Width and height of the native, indexed-color framebuffer.
pub const NATIVE_SIZE: u32 = 128;

/// Width and height a [RenderTarget] must have to receive video output.
/// The native framebuffer is scaled 2x into it.
pub const TARGET_SIZE: u32 = 256;

/// 32-bit RGBA format used on modern machines for interop with image-rs and
/// canvas-style surfaces.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgba32(pub [u8; 4]);

/// Abstract interface for pixel surfaces (image::RgbaImage in tests, GUI
/// texture types in hosts).
pub trait Image {
    fn new(width: u32, height: u32) -> Self;
    fn set_pixel(&mut self, index: (u32, u32), value: Rgba32);
}

/// The surface the console writes video output into.
///
/// Pixel format is fixed: RGBA8888, row-major, 4 bytes per pixel in R,G,B,A
/// order. The console only accepts targets of exactly
/// [TARGET_SIZE]x[TARGET_SIZE] pixels and always writes the full raster at a
/// frame boundary.
pub struct RenderTarget {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RenderTarget {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8888 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba32 {
        let offset = ((y * self.width + x) * 4) as usize;
        Rgba32([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }
}

impl Default for RenderTarget {
    /// A target of the required 256x256 shape.
    fn default() -> Self {
        Self::with_size(TARGET_SIZE, TARGET_SIZE)
    }
}

impl Image for RenderTarget {
    fn new(width: u32, height: u32) -> Self {
        Self::with_size(width, height)
    }

    fn set_pixel(&mut self, index: (u32, u32), value: Rgba32) {
        let offset = ((index.1 * self.width + index.0) * 4) as usize;
        self.data[offset..offset + 4].copy_from_slice(&value.0);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_render_target_layout() {
        let mut target = RenderTarget::with_size(4, 4);
        target.set_pixel((1, 2), Rgba32([1, 2, 3, 4]));
        assert_eq!(target.pixel(1, 2), Rgba32([1, 2, 3, 4]));
        let offset = (2 * 4 + 1) * 4;
        assert_eq!(&target.data()[offset..offset + 4], &[1, 2, 3, 4]);
    }
}
