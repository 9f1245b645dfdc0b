// ============================================================================
// SURFACES — read-only source texture and the kernel's output surface
// ============================================================================

use crate::error::{TileError, TileResult};
use crate::lifecycle::SurfaceDesc;
use crate::source::SourceImage;

use super::context::GpuContext;

/// Storage format of the output surface: four f32 channels.
pub const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

fn check_extent(ctx: &GpuContext, width: u32, height: u32) -> TileResult<()> {
    if width == 0 || height == 0 {
        return Err(TileError::EmptySource { width, height });
    }
    if !ctx.supports_size(width, height) {
        return Err(TileError::gpu(format!(
            "{width}x{height} exceeds max texture dimension {}",
            ctx.max_texture_dim
        )));
    }
    Ok(())
}

// ============================================================================
// SOURCE TEXTURE
// ============================================================================

/// The source image uploaded once as an `Rgba8Unorm` sampled texture.
pub struct SourceTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl SourceTexture {
    pub fn upload(ctx: &GpuContext, image: &SourceImage) -> TileResult<Self> {
        let (width, height) = image.dimensions();
        check_extent(ctx, width, height)?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("SourceTexture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        tracing::debug!(width, height, "source texture uploaded");

        Ok(Self {
            texture,
            view,
            width,
            height,
        })
    }
}

// ============================================================================
// OUTPUT SURFACE
// ============================================================================

/// GPU-writable result of the tile kernel, sized to the source.  Single
/// mip level, point sampled, clamped at the edges.
///
/// Created once by the lifecycle controller and released through
/// [`OutputSurface::release`]; there is no other way to free it early.
pub struct OutputSurface {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub desc: SurfaceDesc,
}

impl OutputSurface {
    /// Point sampling for whoever displays the surface.  The kernel itself
    /// only writes it.
    pub const FILTER: wgpu::FilterMode = wgpu::FilterMode::Nearest;

    pub fn new(ctx: &GpuContext, desc: SurfaceDesc) -> TileResult<Self> {
        check_extent(ctx, desc.width, desc.height)?;

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ResultTexture"),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            texture,
            view,
            desc,
        })
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    /// Free the GPU storage now rather than when the last reference drops.
    /// Work already submitted against the texture still completes.
    pub fn release(self) {
        self.texture.destroy();
    }
}
