// ============================================================================
// DISPLAY — egui side of presentation: readback pixels -> texture -> blit
// ============================================================================

use std::sync::Arc;

use egui::{Color32, ColorImage, Pos2, Rect, TextureFilter, TextureHandle, TextureOptions};
use rayon::prelude::*;

use crate::error::TileResult;
use crate::gpu::OutputSurface;
use crate::gpu::readback::{AsyncReadback, ReadbackFrame};
use crate::present::{SurfacePresenter, Viewport};

/// Convert linear float RGBA to 8-bit, clamping to [0, 1].
pub fn to_color32(frame: &ReadbackFrame) -> Vec<Color32> {
    frame
        .pixels
        .par_chunks_exact(4)
        .map(|px| {
            let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
            Color32::from_rgba_unmultiplied(q(px[0]), q(px[1]), q(px[2]), q(px[3]))
        })
        .collect()
}

/// egui sampling matching [`OutputSurface::FILTER`].  egui textures always
/// clamp at the edges.
pub fn texture_options() -> TextureOptions {
    let filter = match OutputSurface::FILTER {
        wgpu::FilterMode::Nearest => TextureFilter::Nearest,
        wgpu::FilterMode::Linear => TextureFilter::Linear,
    };
    TextureOptions {
        magnification: filter,
        minification: filter,
    }
}

/// Persistent presentation state: staging buffers and the egui texture.
pub struct SurfaceDisplay {
    readback: AsyncReadback,
    texture: Option<TextureHandle>,
}

impl SurfaceDisplay {
    pub fn new() -> Self {
        Self {
            readback: AsyncReadback::new(),
            texture: None,
        }
    }

    fn upload(&mut self, ctx: &egui::Context, frame: &ReadbackFrame) {
        let image = ColorImage {
            size: [frame.width as usize, frame.height as usize],
            pixels: to_color32(frame),
        };
        match &mut self.texture {
            Some(tex) => tex.set(image, texture_options()),
            None => {
                self.texture = Some(ctx.load_texture("tile_output", image, texture_options()));
            }
        }
    }
}

impl Default for SurfaceDisplay {
    fn default() -> Self {
        Self::new()
    }
}

/// Presenter for one egui frame.
pub struct EguiPresenter<'a> {
    pub display: &'a mut SurfaceDisplay,
    pub ctx: &'a egui::Context,
    pub painter: &'a egui::Painter,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl SurfacePresenter<OutputSurface> for EguiPresenter<'_> {
    fn present(&mut self, surface: &OutputSurface, viewport: &Viewport) -> TileResult<()> {
        if let Some(frame) = self.display.readback.try_read(&self.device) {
            self.display.upload(self.ctx, &frame);
        }
        // Copy is submitted after this frame's dispatch on the same queue.
        self.display
            .readback
            .enqueue_copy(&self.device, &self.queue, surface);

        if let Some(tex) = &self.display.texture {
            let fit = viewport.fit();
            let rect = Rect::from_min_size(
                Pos2::new(fit.x, fit.y),
                egui::vec2(fit.width, fit.height),
            );
            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
            self.painter.image(tex.id(), rect, uv, Color32::WHITE);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_are_clamped_and_rounded() {
        let frame = ReadbackFrame {
            width: 2,
            height: 1,
            pixels: vec![0.0, 0.5, 1.0, 1.0, -3.0, 2.0, 0.25, 1.0],
        };
        let out = to_color32(&frame);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Color32::from_rgba_unmultiplied(0, 128, 255, 255));
        assert_eq!(out[1], Color32::from_rgba_unmultiplied(0, 255, 64, 255));
    }

    #[test]
    fn presentation_is_point_sampled() {
        assert_eq!(texture_options(), TextureOptions::NEAREST);
    }
}
