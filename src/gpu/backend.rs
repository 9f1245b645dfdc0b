// ============================================================================
// GPU BACKEND — wgpu implementation of the lifecycle's ComputeBackend
// ============================================================================

use std::sync::Arc;

use crate::dispatch::DispatchPlan;
use crate::error::TileResult;
use crate::lifecycle::{ComputeBackend, SurfaceDesc};
use crate::params::KernelParameters;

use super::binder::KernelBinder;
use super::context::GpuContext;
use super::program::ComputeProgram;
use super::shaders::TILES_SHADER;
use super::surface::{OutputSurface, SourceTexture};

/// The compute program the backend resolves kernels from.
pub const TILES_PROGRAM: ComputeProgram = ComputeProgram::new("tiles_compute_shader", TILES_SHADER);

pub struct GpuBackend {
    pub ctx: Arc<GpuContext>,
    program: ComputeProgram,
    /// Output surfaces currently alive; at most one in normal operation.
    live_surfaces: usize,
}

impl GpuBackend {
    pub fn new(ctx: Arc<GpuContext>) -> Self {
        Self::with_program(ctx, TILES_PROGRAM)
    }

    pub fn with_program(ctx: Arc<GpuContext>, program: ComputeProgram) -> Self {
        Self {
            ctx,
            program,
            live_surfaces: 0,
        }
    }

    pub fn live_surfaces(&self) -> usize {
        self.live_surfaces
    }
}

impl ComputeBackend for GpuBackend {
    type Source = SourceTexture;
    type Surface = OutputSurface;
    type Kernel = KernelBinder;

    fn source_extent(&self, source: &SourceTexture) -> (u32, u32) {
        (source.width, source.height)
    }

    fn resolve_kernel(&mut self, entry_point: &str) -> TileResult<KernelBinder> {
        KernelBinder::new(&self.ctx, &self.program, entry_point)
    }

    fn create_surface(&mut self, desc: SurfaceDesc) -> TileResult<OutputSurface> {
        let surface = OutputSurface::new(&self.ctx, desc)?;
        self.live_surfaces += 1;
        Ok(surface)
    }

    fn bind_and_dispatch(
        &mut self,
        kernel: &KernelBinder,
        source: &SourceTexture,
        surface: &OutputSurface,
        params: &KernelParameters,
        plan: DispatchPlan,
    ) -> TileResult<()> {
        kernel.bind_and_dispatch(&self.ctx, source, surface, params, plan);
        Ok(())
    }

    fn release_surface(&mut self, surface: OutputSurface) {
        surface.release();
        self.live_surfaces = self.live_surfaces.saturating_sub(1);
    }
}
