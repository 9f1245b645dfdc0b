// ============================================================================
// GPU CONTEXT — wgpu Device, Queue, and adapter initialization
// ============================================================================

use std::sync::Arc;

use crate::dispatch::THREADS_PER_GROUP;
use crate::error::{TileError, TileResult};

/// Workgroup memory the tile kernel needs: a (32 + 2*5)^2 tile of vec4<f32>.
pub const TILE_SHARED_BYTES: u32 = 42 * 42 * 16;

/// Holds the core wgpu resources shared by the backend and the presenter.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_name: String,
    /// Maximum texture dimension supported by this device.
    pub max_texture_dim: u32,
}

impl GpuContext {
    /// Create a GPU context.  Tries hardware first, then falls back to a
    /// software adapter (`force_fallback_adapter`).
    ///
    /// eframe doesn't expose its device to application code, so we run our
    /// own and block on the async setup with `pollster`.
    pub fn new(preferred_gpu: &str) -> TileResult<Self> {
        match pollster::block_on(Self::new_async(preferred_gpu, false)) {
            Err(TileError::NoAdapter) => {
                tracing::warn!("hardware adapter unavailable, trying software fallback");
                pollster::block_on(Self::new_async(preferred_gpu, true))
            }
            other => other,
        }
    }

    async fn new_async(preferred_gpu: &str, force_fallback: bool) -> TileResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let power = match preferred_gpu.to_lowercase().as_str() {
            "low power" | "integrated" => wgpu::PowerPreference::LowPower,
            _ => wgpu::PowerPreference::HighPerformance,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: power,
                compatible_surface: None, // headless, compute + readback only
                force_fallback_adapter: force_fallback,
            })
            .await
            .ok_or(TileError::NoAdapter)?;

        let adapter_name = adapter.get_info().name.clone();
        let limits = adapter.limits();

        let threads = THREADS_PER_GROUP.get();
        if limits.max_compute_invocations_per_workgroup < threads * threads
            || limits.max_compute_workgroup_size_x < threads
            || limits.max_compute_workgroup_size_y < threads
        {
            return Err(TileError::UnsupportedAdapter(format!(
                "{adapter_name}: needs {threads}x{threads} threads per group, adapter allows {}",
                limits.max_compute_invocations_per_workgroup
            )));
        }
        if limits.max_compute_workgroup_storage_size < TILE_SHARED_BYTES {
            return Err(TileError::UnsupportedAdapter(format!(
                "{adapter_name}: needs {TILE_SHARED_BYTES} bytes of workgroup memory, adapter allows {}",
                limits.max_compute_workgroup_storage_size
            )));
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("tileviz GPU"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: limits.max_texture_dimension_2d,
                        max_compute_workgroup_size_x: limits.max_compute_workgroup_size_x,
                        max_compute_workgroup_size_y: limits.max_compute_workgroup_size_y,
                        max_compute_workgroup_size_z: limits.max_compute_workgroup_size_z,
                        max_compute_invocations_per_workgroup: limits
                            .max_compute_invocations_per_workgroup,
                        max_compute_workgroup_storage_size: limits
                            .max_compute_workgroup_storage_size,
                        max_compute_workgroups_per_dimension: limits
                            .max_compute_workgroups_per_dimension,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                },
                None,
            )
            .await
            .map_err(|e| TileError::gpu(format!("request_device failed: {e}")))?;

        // Validation errors outside an error scope are logged, not panicked on.
        device.on_uncaptured_error(Box::new(|err| {
            tracing::error!(error = %err, "uncaptured wgpu error");
        }));

        tracing::info!(adapter = %adapter_name, fallback = force_fallback, "gpu context ready");

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name,
            max_texture_dim: limits.max_texture_dimension_2d,
        })
    }

    /// Check if a texture of the given dimensions can be created.
    pub fn supports_size(&self, width: u32, height: u32) -> bool {
        width <= self.max_texture_dim && height <= self.max_texture_dim
    }

    /// Submit a single encoder's commands.
    pub fn submit_one(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
