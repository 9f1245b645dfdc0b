use std::sync::Arc;

use tileviz::gpu::readback::{AsyncReadback, ReadbackFrame};
use tileviz::gpu::{GpuBackend, GpuContext, OutputSurface, SourceTexture};
use tileviz::source::SourceImage;
use tileviz::{
    KernelParameters, LifecycleController, Phase, ScreenSize, SurfacePresenter, TileError,
    TileResult, Viewport, VisualizeMode,
};

/// Copies the surface out so the test can inspect it.
struct CapturePresenter {
    ctx: Arc<GpuContext>,
    readback: AsyncReadback,
}

impl SurfacePresenter<OutputSurface> for CapturePresenter {
    fn present(&mut self, surface: &OutputSurface, _viewport: &Viewport) -> TileResult<()> {
        self.readback
            .enqueue_copy(&self.ctx.device, &self.ctx.queue, surface);
        Ok(())
    }
}

impl CapturePresenter {
    fn wait(&mut self) -> ReadbackFrame {
        loop {
            self.ctx.device.poll(wgpu::Maintain::Wait);
            if let Some(frame) = self.readback.try_read(&self.ctx.device) {
                return frame;
            }
        }
    }
}

fn context() -> Option<Arc<GpuContext>> {
    match GpuContext::new("Auto") {
        Ok(ctx) => Some(Arc::new(ctx)),
        Err(TileError::NoAdapter | TileError::UnsupportedAdapter(_)) => None,
        Err(e) => panic!("unexpected gpu init error: {e}"),
    }
}

fn run_frame(
    ctx: &Arc<GpuContext>,
    image: &SourceImage,
    params: &KernelParameters,
) -> ReadbackFrame {
    let source = SourceTexture::upload(ctx, image).unwrap();
    let mut controller =
        LifecycleController::new(GpuBackend::new(ctx.clone())).with_source(Arc::new(source));
    controller.initialize().unwrap();

    let mut presenter = CapturePresenter {
        ctx: ctx.clone(),
        readback: AsyncReadback::new(),
    };
    controller
        .tick(params, ScreenSize::new(800, 600), &mut presenter)
        .unwrap();
    let frame = presenter.wait();
    controller.teardown();
    assert_eq!(controller.phase(), Phase::TornDown);
    frame
}

fn pixel(frame: &ReadbackFrame, x: u32, y: u32) -> [f32; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.pixels[i],
        frame.pixels[i + 1],
        frame.pixels[i + 2],
        frame.pixels[i + 3],
    ]
}

fn solid(size: u32, rgba: [u8; 4]) -> SourceImage {
    SourceImage::from_rgba(image::RgbaImage::from_pixel(size, size, image::Rgba(rgba)))
}

#[test]
fn gpu_filter_keeps_solid_color() {
    let Some(ctx) = context() else { return };
    let params = KernelParameters {
        tile_kernel_radius: 3,
        ..Default::default()
    };
    let frame = run_frame(&ctx, &solid(64, [255, 0, 0, 255]), &params);
    assert_eq!((frame.width, frame.height), (64, 64));
    for (x, y) in [(0, 0), (31, 31), (32, 0), (63, 63)] {
        let p = pixel(&frame, x, y);
        assert!((p[0] - 1.0).abs() < 1e-4, "red at ({x},{y}) = {p:?}");
        assert!(p[1].abs() < 1e-4 && p[2].abs() < 1e-4);
        assert!((p[3] - 1.0).abs() < 1e-4);
    }
}

#[test]
fn gpu_group_thread_id_visualization() {
    let Some(ctx) = context() else { return };
    let mut params = KernelParameters::default();
    params.set(VisualizeMode::GroupThreadId, true);
    let frame = run_frame(&ctx, &SourceImage::checkerboard(64, 8), &params);
    for (x, y) in [(0u32, 0u32), (5, 9), (33, 40), (63, 31)] {
        let p = pixel(&frame, x, y);
        let ex = (x % 32) as f32 / 32.0;
        let ey = (y % 32) as f32 / 32.0;
        assert!((p[0] - ex).abs() < 1e-4 && (p[1] - ey).abs() < 1e-4, "({x},{y}) = {p:?}");
        assert_eq!(p[2], 0.0);
    }
}

#[test]
fn gpu_small_image_still_dispatches() {
    let Some(ctx) = context() else { return };
    let mut params = KernelParameters::default();
    params.set(VisualizeMode::GroupIndex, true);
    let frame = run_frame(&ctx, &solid(10, [0, 0, 0, 255]), &params);
    assert_eq!((frame.width, frame.height), (10, 10));
    // group index = y * 32 + x inside the single group
    let p = pixel(&frame, 3, 2);
    assert!((p[0] - (2.0 * 32.0 + 3.0) / 1024.0).abs() < 1e-4, "{p:?}");
}

#[test]
fn gpu_unknown_entry_point_halts_startup() {
    let Some(ctx) = context() else { return };
    let source = SourceTexture::upload(&ctx, &solid(32, [0, 0, 0, 255])).unwrap();
    let mut controller = LifecycleController::new(GpuBackend::new(ctx.clone()))
        .with_source(Arc::new(source))
        .with_entry_point("K_DoesNotExist");
    assert!(matches!(
        controller.initialize(),
        Err(TileError::KernelNotFound(_))
    ));
    assert_eq!(controller.backend().live_surfaces(), 0);
}
