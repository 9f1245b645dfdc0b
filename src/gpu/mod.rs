// ============================================================================
// GPU MODULE — wgpu compute + readback for the tile kernel
// ============================================================================
//
// Architecture:
//   context.rs  — wgpu Device, Queue, adapter init + limit checks
//   shaders.rs  — WGSL source (inline strings)
//   program.rs  — kernel / binding lookup by name
//   surface.rs  — source texture upload, output surface allocation/release
//   binder.rs   — pipeline, cached slots, per-frame bind + dispatch
//   readback.rs — double-buffered async readback for presentation
//   backend.rs  — ComputeBackend implementation tying the above together
// ============================================================================

pub mod backend;
pub mod binder;
pub mod context;
pub mod program;
pub mod readback;
pub mod shaders;
pub mod surface;

pub use backend::{GpuBackend, TILES_PROGRAM};
pub use context::GpuContext;
pub use surface::{OutputSurface, SourceTexture};
