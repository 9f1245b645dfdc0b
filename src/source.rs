//! Source image decoding.  Everything downstream sees a tightly packed
//! RGBA8 grid that never changes after load.

use std::path::Path;

use image::RgbaImage;

use crate::error::TileResult;

#[derive(Clone, Debug)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    /// Decode any format the `image` crate understands.
    pub fn load(path: &Path) -> TileResult<Self> {
        let pixels = image::open(path)?.into_rgba8();
        tracing::info!(
            path = %path.display(),
            width = pixels.width(),
            height = pixels.height(),
            "source image loaded"
        );
        Ok(Self { pixels })
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Mid-grey checkerboard with `cell`-sized squares; used when no file
    /// is given on the command line.
    pub fn checkerboard(size: u32, cell: u32) -> Self {
        let cell = cell.max(1);
        let pixels = RgbaImage::from_fn(size, size, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                image::Rgba([200, 200, 200, 255])
            } else {
                image::Rgba([60, 60, 60, 255])
            }
        });
        Self { pixels }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}
