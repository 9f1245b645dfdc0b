// ============================================================================
// KERNEL BINDER — per-frame resource binding, uniforms, and dispatch
// ============================================================================

use bytemuck::{Pod, Zeroable};

use crate::dispatch::{DispatchPlan, THREADS_PER_GROUP};
use crate::error::{TileError, TileResult};
use crate::params::KernelParameters;

use super::context::GpuContext;
use super::program::{ComputeProgram, KernelHandle, ProgramReflection};
use super::surface::{OUTPUT_FORMAT, OutputSurface, SourceTexture};

/// Uniform block layout of `TileParams` in the tile shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct TileUniforms {
    pub kernel_size: i32,
    pub visualize_dispatch_thread_id: u32,
    pub visualize_group_id: u32,
    pub visualize_group_thread_id: u32,
    pub visualize_group_index: u32,
    _pad: [u32; 3],
}

impl From<&KernelParameters> for TileUniforms {
    fn from(p: &KernelParameters) -> Self {
        Self {
            kernel_size: p.tile_kernel_radius,
            visualize_dispatch_thread_id: p.visualize_dispatch_thread_id as u32,
            visualize_group_id: p.visualize_group_id as u32,
            visualize_group_thread_id: p.visualize_group_thread_id as u32,
            visualize_group_index: p.visualize_group_index as u32,
            _pad: [0; 3],
        }
    }
}

/// Binding indices looked up by variable name, once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelSlots {
    pub source: u32,
    pub result: u32,
    pub params: u32,
}

impl KernelSlots {
    pub fn resolve(program: &ProgramReflection) -> TileResult<Self> {
        Ok(Self {
            source: program.binding_slot("SourceTexture")?,
            result: program.binding_slot("ResultTexture")?,
            params: program.binding_slot("Params")?,
        })
    }
}

/// The planner launches square groups of `THREADS_PER_GROUP` threads per
/// axis; a kernel declaring any other shape would index the shared tile
/// wrongly.
pub fn check_workgroup(handle: &KernelHandle) -> TileResult<()> {
    let side = THREADS_PER_GROUP.get();
    if handle.workgroup_size() != [side, side, 1] {
        return Err(TileError::kernel(format!(
            "{}: workgroup size {:?}, expected [{side}, {side}, 1]",
            handle.name(),
            handle.workgroup_size()
        )));
    }
    Ok(())
}

/// A resolved kernel with everything it needs cached for binding.
pub struct KernelBinder {
    slots: KernelSlots,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
}

impl KernelBinder {
    /// Resolve `entry_point` in `program` and build its pipeline.
    pub fn new(ctx: &GpuContext, program: &ComputeProgram, entry_point: &str) -> TileResult<Self> {
        let reflection = program.reflect()?;
        let handle = reflection.find_kernel(entry_point)?;
        check_workgroup(&handle)?;
        let slots = KernelSlots::resolve(&reflection)?;
        let device = &ctx.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(program.label()),
            source: wgpu::ShaderSource::Wgsl(program.source().into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tiles_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: slots.source,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: slots.result,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: OUTPUT_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: slots.params,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<TileUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tiles_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(handle.name()),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: handle.name(),
            compilation_options: Default::default(),
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(TileError::kernel(format!("{}: {err}", handle.name())));
        }

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tiles_params"),
            size: std::mem::size_of::<TileUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        tracing::info!(kernel = handle.name(), ?slots, "kernel resolved");

        Ok(Self {
            slots,
            pipeline,
            bind_group_layout,
            params_buffer,
        })
    }

    /// Bind source + output + uniforms and enqueue one dispatch of
    /// `plan.groups() x 1`.  Returns as soon as the work is submitted.
    pub fn bind_and_dispatch(
        &self,
        ctx: &GpuContext,
        source: &SourceTexture,
        surface: &OutputSurface,
        params: &KernelParameters,
        plan: DispatchPlan,
    ) {
        let device = &ctx.device;

        let uniforms = TileUniforms::from(params);
        ctx.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&uniforms));

        let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tiles_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: self.slots.source,
                    resource: wgpu::BindingResource::TextureView(&source.view),
                },
                wgpu::BindGroupEntry {
                    binding: self.slots.result,
                    resource: wgpu::BindingResource::TextureView(&surface.view),
                },
                wgpu::BindGroupEntry {
                    binding: self.slots.params,
                    resource: self.params_buffer.as_entire_binding(),
                },
            ],
        });

        let (groups_x, groups_y) = plan.groups();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tiles_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("tiles_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bg, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        ctx.submit_one(encoder);
    }
}
