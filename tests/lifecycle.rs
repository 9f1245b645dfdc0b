use std::sync::Arc;

use tileviz::{
    ComputeBackend, DispatchPlan, FrameReport, GroupRounding, KernelParameters, LifecycleController,
    Phase, ScreenSize, SurfaceDesc, SurfacePresenter, TileError, TileResult, Viewport,
    VisualizeMode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FakeSource {
    width: u32,
    height: u32,
}

#[derive(Debug, PartialEq, Eq)]
struct FakeSurface {
    id: u32,
    desc: SurfaceDesc,
}

#[derive(Debug)]
struct Dispatch {
    surface: u32,
    params: KernelParameters,
    plan: DispatchPlan,
}

#[derive(Default)]
struct Recorder {
    allocations: u32,
    releases: Vec<u32>,
    kernels_resolved: Vec<String>,
    dispatches: Vec<Dispatch>,
}

struct FakeBackend {
    log: Recorder,
    known_kernels: Vec<&'static str>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            log: Recorder::default(),
            known_kernels: vec!["K_Tiles"],
        }
    }
}

impl ComputeBackend for FakeBackend {
    type Source = FakeSource;
    type Surface = FakeSurface;
    type Kernel = String;

    fn source_extent(&self, source: &FakeSource) -> (u32, u32) {
        (source.width, source.height)
    }

    fn resolve_kernel(&mut self, entry_point: &str) -> TileResult<String> {
        if !self.known_kernels.iter().any(|k| *k == entry_point) {
            return Err(TileError::KernelNotFound(entry_point.to_string()));
        }
        self.log.kernels_resolved.push(entry_point.to_string());
        Ok(entry_point.to_string())
    }

    fn create_surface(&mut self, desc: SurfaceDesc) -> TileResult<FakeSurface> {
        self.log.allocations += 1;
        Ok(FakeSurface {
            id: self.log.allocations,
            desc,
        })
    }

    fn bind_and_dispatch(
        &mut self,
        _kernel: &String,
        _source: &FakeSource,
        surface: &FakeSurface,
        params: &KernelParameters,
        plan: DispatchPlan,
    ) -> TileResult<()> {
        self.log.dispatches.push(Dispatch {
            surface: surface.id,
            params: *params,
            plan,
        });
        Ok(())
    }

    fn release_surface(&mut self, surface: FakeSurface) {
        self.log.releases.push(surface.id);
    }
}

#[derive(Default)]
struct FakePresenter {
    presented: Vec<(u32, Viewport)>,
}

impl SurfacePresenter<FakeSurface> for FakePresenter {
    fn present(&mut self, surface: &FakeSurface, viewport: &Viewport) -> TileResult<()> {
        self.presented.push((surface.id, *viewport));
        Ok(())
    }
}

fn controller(width: u32, height: u32) -> LifecycleController<FakeBackend> {
    LifecycleController::new(FakeBackend::new()).with_source(Arc::new(FakeSource { width, height }))
}

const SCREEN: ScreenSize = ScreenSize {
    width: 1920,
    height: 1080,
};

#[test]
fn initialize_allocates_surface_matching_source() {
    for (w, h) in [(1, 1), (32, 32), (1000, 1000), (640, 480), (7, 3000)] {
        let mut c = controller(w, h);
        assert_eq!(c.phase(), Phase::Uninitialized);
        assert!(c.surface().is_none());
        c.initialize().unwrap();
        assert_eq!(c.phase(), Phase::Active);
        let surface = c.surface().expect("surface while active");
        assert_eq!(surface.desc, SurfaceDesc { width: w, height: h });
        assert_eq!(c.backend().log.allocations, 1);
        assert_eq!(c.backend().log.kernels_resolved, vec!["K_Tiles".to_string()]);
    }
}

#[test]
fn missing_source_fails_before_allocation() {
    let mut c = LifecycleController::new(FakeBackend::new());
    assert!(matches!(c.initialize(), Err(TileError::MissingSource)));
    assert_eq!(c.phase(), Phase::Uninitialized);
    assert_eq!(c.backend().log.allocations, 0);
    assert!(c.backend().log.kernels_resolved.is_empty());
}

#[test]
fn zero_sized_source_fails_before_allocation() {
    let mut c = controller(0, 64);
    assert!(matches!(
        c.initialize(),
        Err(TileError::EmptySource { width: 0, height: 64 })
    ));
    assert_eq!(c.backend().log.allocations, 0);
}

#[test]
fn unknown_kernel_fails_before_allocation() {
    let mut c = controller(64, 64).with_entry_point("K_Missing");
    match c.initialize() {
        Err(TileError::KernelNotFound(name)) => assert_eq!(name, "K_Missing"),
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(c.phase(), Phase::Uninitialized);
    assert_eq!(c.backend().log.allocations, 0);
}

#[test]
fn double_initialize_is_a_precondition_error() {
    let mut c = controller(64, 64);
    c.initialize().unwrap();
    assert!(matches!(c.initialize(), Err(TileError::Precondition(_))));
    assert_eq!(c.backend().log.allocations, 1);
    assert_eq!(c.phase(), Phase::Active);
}

#[test]
fn teardown_twice_releases_once() {
    let mut c = controller(64, 64);
    c.initialize().unwrap();
    c.teardown();
    assert_eq!(c.phase(), Phase::TornDown);
    assert!(c.surface().is_none());
    c.teardown();
    assert_eq!(c.backend().log.releases, vec![1]);
}

#[test]
fn torn_down_is_terminal() {
    let mut c = controller(64, 64);
    c.initialize().unwrap();
    c.teardown();
    assert!(matches!(c.initialize(), Err(TileError::Precondition(_))));
    let mut presenter = FakePresenter::default();
    assert!(matches!(
        c.tick(&KernelParameters::default(), SCREEN, &mut presenter),
        Err(TileError::Precondition(_))
    ));
    assert!(c.backend().log.dispatches.is_empty());
    assert!(presenter.presented.is_empty());
}

#[test]
fn tick_before_initialize_dispatches_nothing() {
    let mut c = controller(64, 64);
    let mut presenter = FakePresenter::default();
    assert!(c
        .tick(&KernelParameters::default(), SCREEN, &mut presenter)
        .is_err());
    assert!(c.backend().log.dispatches.is_empty());
}

#[test]
fn tick_plans_dispatches_and_presents() {
    let mut c = controller(1000, 1000);
    c.initialize().unwrap();
    let mut presenter = FakePresenter::default();
    let report: FrameReport = c
        .tick(&KernelParameters::default(), SCREEN, &mut presenter)
        .unwrap();

    assert_eq!(report.plan.groups(), (31, 31));
    assert_eq!(report.viewport.side, 1024);
    assert_eq!(c.backend().log.dispatches.len(), 1);
    assert_eq!(c.backend().log.dispatches[0].surface, 1);
    assert_eq!(presenter.presented, vec![(1, report.viewport)]);
}

#[test]
fn every_tick_dispatches_even_without_changes() {
    let mut c = controller(256, 256);
    c.initialize().unwrap();
    let params = KernelParameters::default();
    let mut presenter = FakePresenter::default();
    for _ in 0..5 {
        c.tick(&params, SCREEN, &mut presenter).unwrap();
    }
    assert_eq!(c.backend().log.dispatches.len(), 5);
    assert_eq!(presenter.presented.len(), 5);
    assert_eq!(c.backend().log.allocations, 1);
}

#[test]
fn toggling_visualization_changes_only_uniforms() {
    let mut c = controller(512, 512);
    c.initialize().unwrap();
    let mut presenter = FakePresenter::default();
    let mut params = KernelParameters::default();

    c.tick(&params, SCREEN, &mut presenter).unwrap();
    for mode in [
        VisualizeMode::DispatchId,
        VisualizeMode::GroupId,
        VisualizeMode::GroupThreadId,
        VisualizeMode::GroupIndex,
    ] {
        params.toggle(mode);
        c.tick(&params, SCREEN, &mut presenter).unwrap();
    }

    let log = &c.backend().log;
    assert_eq!(log.allocations, 1);
    assert_eq!(log.dispatches.len(), 5);
    let first = &log.dispatches[0];
    for d in &log.dispatches[1..] {
        assert_eq!(d.plan, first.plan);
        assert_eq!(d.surface, first.surface);
    }
    assert!(!first.params.visualize_dispatch_thread_id);
    let last = &log.dispatches[4].params;
    assert!(last.visualize_dispatch_thread_id);
    assert!(last.visualize_group_id);
    assert!(last.visualize_group_thread_id);
    assert!(last.visualize_group_index);
}

#[test]
fn parameters_are_read_fresh_and_unvalidated() {
    let mut c = controller(64, 64);
    c.initialize().unwrap();
    let mut presenter = FakePresenter::default();
    let mut params = KernelParameters::default();
    params.tile_kernel_radius = 3;
    c.tick(&params, SCREEN, &mut presenter).unwrap();
    params.tile_kernel_radius = 42;
    c.tick(&params, SCREEN, &mut presenter).unwrap();

    let radii: Vec<i32> = c
        .backend()
        .log
        .dispatches
        .iter()
        .map(|d| d.params.tile_kernel_radius)
        .collect();
    assert_eq!(radii, vec![3, 42]);
}

#[test]
fn ceil_rounding_covers_partial_groups() {
    let mut c = controller(1000, 1000).with_rounding(GroupRounding::Ceil);
    c.initialize().unwrap();
    let mut presenter = FakePresenter::default();
    let report = c
        .tick(&KernelParameters::default(), SCREEN, &mut presenter)
        .unwrap();
    assert_eq!(report.plan.groups(), (32, 32));
}

#[test]
fn viewport_follows_screen_each_frame() {
    let mut c = controller(64, 64);
    c.initialize().unwrap();
    let mut presenter = FakePresenter::default();
    let params = KernelParameters::default();
    let a = c.tick(&params, ScreenSize::new(1920, 1080), &mut presenter).unwrap();
    let b = c.tick(&params, ScreenSize::new(800, 600), &mut presenter).unwrap();
    assert_eq!(a.viewport.side, 1024);
    assert_eq!(b.viewport.side, 600);
    assert_eq!(a.plan, b.plan);
}

struct CountingBackend<'a> {
    inner: FakeBackend,
    released: &'a std::cell::Cell<u32>,
}

impl ComputeBackend for CountingBackend<'_> {
    type Source = FakeSource;
    type Surface = FakeSurface;
    type Kernel = String;

    fn source_extent(&self, source: &FakeSource) -> (u32, u32) {
        self.inner.source_extent(source)
    }

    fn resolve_kernel(&mut self, entry_point: &str) -> TileResult<String> {
        self.inner.resolve_kernel(entry_point)
    }

    fn create_surface(&mut self, desc: SurfaceDesc) -> TileResult<FakeSurface> {
        self.inner.create_surface(desc)
    }

    fn bind_and_dispatch(
        &mut self,
        kernel: &String,
        source: &FakeSource,
        surface: &FakeSurface,
        params: &KernelParameters,
        plan: DispatchPlan,
    ) -> TileResult<()> {
        self.inner
            .bind_and_dispatch(kernel, source, surface, params, plan)
    }

    fn release_surface(&mut self, surface: FakeSurface) {
        self.released.set(self.released.get() + 1);
        self.inner.release_surface(surface);
    }
}

#[test]
fn drop_releases_active_surface() {
    let released = std::cell::Cell::new(0);
    {
        let mut c = LifecycleController::new(CountingBackend {
            inner: FakeBackend::new(),
            released: &released,
        })
        .with_source(Arc::new(FakeSource {
            width: 64,
            height: 64,
        }));
        c.initialize().unwrap();
    }
    assert_eq!(released.get(), 1);

    {
        let mut c = LifecycleController::new(CountingBackend {
            inner: FakeBackend::new(),
            released: &released,
        })
        .with_source(Arc::new(FakeSource {
            width: 64,
            height: 64,
        }));
        c.initialize().unwrap();
        c.teardown();
    }
    assert_eq!(released.get(), 2);
}
