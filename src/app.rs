// ============================================================================
// APP — eframe host: start / per-frame / exit hooks drive the lifecycle
// ============================================================================

use std::sync::Arc;

use eframe::egui;

use crate::config::AppConfig;
use crate::display::{EguiPresenter, SurfaceDisplay};
use crate::error::{TileError, TileResult};
use crate::gpu::{GpuBackend, GpuContext, SourceTexture};
use crate::lifecycle::{FrameReport, LifecycleController, Phase};
use crate::params::{KernelParameters, VisualizeMode};
use crate::present::ScreenSize;
use crate::source::SourceImage;

/// Why nothing is being drawn.
enum Halt {
    Startup(TileError),
    Frame(TileError),
}

pub struct TileVizApp {
    controller: Option<LifecycleController<GpuBackend>>,
    display: SurfaceDisplay,
    /// Live configuration owned by the settings window.
    params: KernelParameters,
    adapter_name: Option<String>,
    last_report: Option<FrameReport>,
    halt: Option<Halt>,
}

impl TileVizApp {
    /// Start-of-life hook: build the GPU context, upload the source and
    /// initialize the controller.  Failures halt startup; the window still
    /// opens to show the error.
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig, source: Option<SourceImage>) -> Self {
        let mut app = Self {
            controller: None,
            display: SurfaceDisplay::new(),
            params: config.kernel,
            adapter_name: None,
            last_report: None,
            halt: None,
        };
        match Self::start(&config, source) {
            Ok((controller, adapter)) => {
                app.controller = Some(controller);
                app.adapter_name = Some(adapter);
            }
            Err(e) => {
                tracing::error!(error = %e, "startup halted");
                app.halt = Some(Halt::Startup(e));
            }
        }
        app
    }

    fn start(
        config: &AppConfig,
        source: Option<SourceImage>,
    ) -> TileResult<(LifecycleController<GpuBackend>, String)> {
        Self::start_with(config, source, GpuContext::new)
    }

    fn start_with(
        config: &AppConfig,
        source: Option<SourceImage>,
        open_gpu: impl FnOnce(&str) -> TileResult<GpuContext>,
    ) -> TileResult<(LifecycleController<GpuBackend>, String)> {
        // Nothing touches the GPU until there is something to process.
        let image = source.ok_or(TileError::MissingSource)?;

        let ctx = Arc::new(open_gpu(&config.preferred_gpu)?);
        let adapter = ctx.adapter_name.clone();

        let texture = SourceTexture::upload(&ctx, &image)?;
        let mut controller = LifecycleController::new(GpuBackend::new(ctx.clone()))
            .with_entry_point(config.entry_point.clone())
            .with_rounding(config.group_rounding)
            .with_source(Arc::new(texture));
        controller.initialize()?;
        Ok((controller, adapter))
    }

    /// External configuration surface: radius slider + visualisation toggles.
    fn settings_panel(&mut self, ctx: &egui::Context) {
        // Floating window so the central panel (and the blit) spans the screen.
        egui::Window::new("Kernel settings")
            .resizable(false)
            .default_pos(egui::pos2(12.0, 12.0))
            .show(ctx, |ui| {
                ui.add(
                    egui::Slider::new(
                        &mut self.params.tile_kernel_radius,
                        KernelParameters::RADIUS_RANGE,
                    )
                    .clamp_to_range(false)
                    .text("kernel size"),
                );
                ui.separator();
                ui.label("Visualize threads");
                for (mode, label) in [
                    (VisualizeMode::DispatchId, "Dispatch thread ID"),
                    (VisualizeMode::GroupId, "Group ID"),
                    (VisualizeMode::GroupThreadId, "Group thread ID"),
                    (VisualizeMode::GroupIndex, "Group index"),
                ] {
                    let mut on = self.params.is_set(mode);
                    if ui.checkbox(&mut on, label).changed() {
                        self.params.set(mode, on);
                    }
                }
                ui.separator();
                if let Some(name) = &self.adapter_name {
                    ui.label(format!("GPU: {name}"));
                }
                if let Some(report) = &self.last_report {
                    let (gx, gy) = report.plan.groups();
                    ui.label(format!("groups: {gx} x {gy}"));
                    ui.label(format!("viewport: {} px", report.viewport.side));
                }
            });
    }
}

impl eframe::App for TileVizApp {
    /// Per-frame hook.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.settings_panel(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(halt) = &self.halt {
                let msg = match halt {
                    Halt::Startup(e) => format!("Startup halted: {e}"),
                    Halt::Frame(e) => format!("Frame failed: {e}"),
                };
                ui.colored_label(egui::Color32::LIGHT_RED, msg);
                return;
            }
            let Some(controller) = self.controller.as_mut() else {
                return;
            };
            if controller.phase() != Phase::Active {
                return;
            }

            let screen_rect = ctx.screen_rect();
            let screen = ScreenSize::new(
                screen_rect.width().max(1.0) as u32,
                screen_rect.height().max(1.0) as u32,
            );
            let backend = controller.backend();
            let mut presenter = EguiPresenter {
                display: &mut self.display,
                ctx,
                painter: ui.painter(),
                device: backend.ctx.device.clone(),
                queue: backend.ctx.queue.clone(),
            };
            match controller.tick(&self.params, screen, &mut presenter) {
                Ok(report) => self.last_report = Some(report),
                Err(e) => {
                    tracing::error!(error = %e, "frame failed");
                    self.halt = Some(Halt::Frame(e));
                }
            }
        });

        // Recompute every frame, inputs changed or not.
        ctx.request_repaint();
    }

    /// End-of-life hook.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(controller) = self.controller.as_mut() {
            controller.teardown();
        }
    }
}
