// ============================================================================
// LIFECYCLE CONTROLLER — Uninitialized -> Active -> TornDown
// ============================================================================
//
// The host calls `initialize` once at start of life, `tick` every frame and
// `teardown` at end of life.  The output surface lives inside the `Active`
// state, so it cannot be reached before allocation or after release.

use std::sync::Arc;

use crate::dispatch::{self, DispatchPlan, GroupRounding, THREADS_PER_GROUP};
use crate::error::{TileError, TileResult};
use crate::params::KernelParameters;
use crate::present::{ScreenSize, SurfacePresenter, Viewport};

/// Entry point resolved from the compute program at initialization.
pub const DEFAULT_ENTRY_POINT: &str = "K_Tiles";

/// Extent of the output surface in pixels; always equal to the source's.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
}

impl SurfaceDesc {
    /// Four f32 channels per pixel.
    pub const BYTES_PER_PIXEL: u64 = 16;

    pub fn byte_size(&self) -> u64 {
        self.width as u64 * self.height as u64 * Self::BYTES_PER_PIXEL
    }
}

/// GPU operations the controller sequences.  Implemented by
/// [`crate::gpu::GpuBackend`]; tests use a recording fake.
pub trait ComputeBackend {
    /// Read-only source image as resident on the device.
    type Source;
    /// Writable output surface.
    type Surface;
    /// Resolved kernel plus whatever it caches for binding.
    type Kernel;

    fn source_extent(&self, source: &Self::Source) -> (u32, u32);

    fn resolve_kernel(&mut self, entry_point: &str) -> TileResult<Self::Kernel>;

    fn create_surface(&mut self, desc: SurfaceDesc) -> TileResult<Self::Surface>;

    fn bind_and_dispatch(
        &mut self,
        kernel: &Self::Kernel,
        source: &Self::Source,
        surface: &Self::Surface,
        params: &KernelParameters,
        plan: DispatchPlan,
    ) -> TileResult<()>;

    fn release_surface(&mut self, surface: Self::Surface);
}

enum State<K, S> {
    Uninitialized,
    Active { kernel: K, surface: S, desc: SurfaceDesc },
    TornDown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Active,
    TornDown,
}

/// What one `tick` did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    pub plan: DispatchPlan,
    pub viewport: Viewport,
}

pub struct LifecycleController<B: ComputeBackend> {
    backend: B,
    source: Option<Arc<B::Source>>,
    entry_point: String,
    rounding: GroupRounding,
    state: State<B::Kernel, B::Surface>,
}

impl<B: ComputeBackend> LifecycleController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            source: None,
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            rounding: GroupRounding::Floor,
            state: State::Uninitialized,
        }
    }

    pub fn with_source(mut self, source: Arc<B::Source>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    pub fn with_rounding(mut self, rounding: GroupRounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Uninitialized => Phase::Uninitialized,
            State::Active { .. } => Phase::Active,
            State::TornDown => Phase::TornDown,
        }
    }

    /// The live output surface, if Active.
    pub fn surface(&self) -> Option<&B::Surface> {
        match &self.state {
            State::Active { surface, .. } => Some(surface),
            _ => None,
        }
    }

    /// Allocate the output surface and resolve the kernel.  All-or-nothing:
    /// on error the controller stays Uninitialized and nothing is allocated.
    #[tracing::instrument(skip(self), fields(entry_point = %self.entry_point))]
    pub fn initialize(&mut self) -> TileResult<()> {
        match self.state {
            State::Uninitialized => {}
            State::Active { .. } => {
                return Err(TileError::precondition(
                    "initialize called twice without teardown",
                ));
            }
            State::TornDown => {
                return Err(TileError::precondition("initialize called after teardown"));
            }
        }

        let source = self.source.as_ref().ok_or(TileError::MissingSource)?;
        let (width, height) = self.backend.source_extent(source);
        if width == 0 || height == 0 {
            return Err(TileError::EmptySource { width, height });
        }

        let kernel = self.backend.resolve_kernel(&self.entry_point)?;
        let desc = SurfaceDesc { width, height };
        let surface = self.backend.create_surface(desc)?;

        let plan = dispatch::plan_extent(width, height, THREADS_PER_GROUP, self.rounding);
        if plan.under_covers(width, height) {
            let (cx, cy) = plan.covered_extent();
            tracing::warn!(
                width,
                height,
                covered_x = cx,
                covered_y = cy,
                "image size is not a multiple of the group size; trailing pixels stay unprocessed"
            );
        }
        tracing::info!(width, height, bytes = desc.byte_size(), "output surface allocated");

        self.state = State::Active { kernel, surface, desc };
        Ok(())
    }

    /// Plan, bind + dispatch, present.  Runs every frame regardless of
    /// whether anything changed.
    pub fn tick<P>(
        &mut self,
        params: &KernelParameters,
        screen: ScreenSize,
        presenter: &mut P,
    ) -> TileResult<FrameReport>
    where
        P: SurfacePresenter<B::Surface>,
    {
        let State::Active { kernel, surface, desc } = &self.state else {
            return Err(TileError::precondition("tick called while not active"));
        };
        let source = self.source.as_ref().ok_or(TileError::MissingSource)?;

        let (width, height) = self.backend.source_extent(source);
        let plan = dispatch::plan_extent(width, height, THREADS_PER_GROUP, self.rounding);

        self.backend
            .bind_and_dispatch(kernel, source, surface, params, plan)?;

        let aspect = desc.width as f32 / desc.height as f32;
        let viewport = Viewport::centered(screen, aspect);
        presenter.present(surface, &viewport)?;

        Ok(FrameReport { plan, viewport })
    }

    /// Release the output surface.  Safe to call repeatedly.
    pub fn teardown(&mut self) {
        match std::mem::replace(&mut self.state, State::TornDown) {
            State::Active { surface, desc, .. } => {
                self.backend.release_surface(surface);
                tracing::info!(
                    width = desc.width,
                    height = desc.height,
                    "output surface released"
                );
            }
            State::Uninitialized | State::TornDown => {}
        }
    }
}

impl<B: ComputeBackend> Drop for LifecycleController<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
