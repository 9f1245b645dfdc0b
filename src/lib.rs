//! tileviz: drives a tiled compute kernel over an image and presents the
//! result, with toggleable thread/group identifier visualisation.
//!
//! The GPU-independent core is [`lifecycle`], [`dispatch`] and [`present`];
//! [`gpu`] implements it on wgpu and [`app`] hosts it in an eframe window.

pub mod app;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod gpu;
pub mod lifecycle;
pub mod logger;
pub mod params;
pub mod present;
pub mod source;

pub use dispatch::{DispatchPlan, GroupRounding, THREADS_PER_GROUP, plan, plan_extent};
pub use error::{TileError, TileResult};
pub use lifecycle::{ComputeBackend, FrameReport, LifecycleController, Phase, SurfaceDesc};
pub use params::{KernelParameters, VisualizeMode};
pub use present::{ScreenSize, SurfacePresenter, Viewport};
