//! Trajectory tracing on the GPU with `trace.wgsl`.

use bytemuck::{Pod, Zeroable};
use log::{info, trace};

use crate::{
    command_buffer,
    command_encoder::CommandEncoderExt,
    complex::Complex,
    compute,
    error::Error,
    source::{TrajectoryBatch, TrajectorySource},
    typed_buffer::{self, Buffer},
    var::{self, Var},
};

/// A compute-only device, independent of whatever device draws to the window.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub fn new() -> Result<Self, Error> {
        let instance = wgpu::Instance::new(wgpu::Backends::all());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or(Error::NoAdapter)?;

        let adapter_info = adapter.get_info();
        info!(
            "compute adapter: {} ({:?}, {:?})",
            adapter_info.name, adapter_info.backend, adapter_info.device_type
        );
        let limits = adapter.limits();
        info!(
            "compute limits: workgroup size x {}, invocations per workgroup {}, storage binding {} bytes",
            limits.max_compute_workgroup_size_x,
            limits.max_compute_invocations_per_workgroup,
            limits.max_storage_buffer_binding_size
        );

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("trajectory-device"),
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::default(),
            },
            None,
        ))?;

        Ok(Self { device, queue })
    }

    fn with_validation<A>(&self, function: impl FnOnce() -> A) -> Result<A, Error> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = function();
        match pollster::block_on(self.device.pop_error_scope()) {
            None => Ok(value),
            Some(error) => Err(Error::Backend(error.to_string())),
        }
    }
}

/// Uniforms for `trace.wgsl`. Layout matches `trace.wgsl#Params`.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, Default)]
struct Params {
    limit: u32,
    escape_radius_squared: f32,
    seed_count: u32,
    padding: u32,
}

pub struct GpuSource {
    context: GpuContext,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    params: Var<Params>,
    seeds: Buffer<Complex>,
    steps: Buffer<u32>,
    orbits: Buffer<Complex>,
    staging_steps: Buffer<u32>,
    staging_orbits: Buffer<Complex>,
    escape_radius_squared: f32,
    capacity_seeds: usize,
    capacity_limit: u32,
}

impl GpuSource {
    /// Builds the kernel and allocates device buffers for batches of up to
    /// `capacity_seeds` seeds at up to `max_limit` iterations.
    pub fn new(
        context: GpuContext,
        capacity_seeds: usize,
        max_limit: u32,
        escape_radius: f32,
    ) -> Result<Self, Error> {
        let orbit_len = capacity_seeds as u64 * max_limit as u64;
        let orbit_bytes = orbit_len * std::mem::size_of::<Complex>() as u64;
        let max_binding = context.device.limits().max_storage_buffer_binding_size as u64;
        if orbit_bytes > max_binding {
            return Err(Error::Backend(format!(
                "orbit buffer of {orbit_bytes} bytes exceeds storage binding limit of {max_binding} bytes"
            )));
        }

        let device = &context.device;
        let (pipeline, bind_group, params, seeds, steps, orbits, staging_steps, staging_orbits) =
            context.with_validation(|| {
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("trace-shader"),
                    source: wgpu::ShaderSource::Wgsl(include_str!("trace.wgsl").into()),
                });

                let storage = |binding, read_only| wgpu::BindGroupLayoutEntry {
                    binding,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                };

                let bind_group_layout =
                    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        label: Some("trace-bind-group-layout"),
                        entries: &[
                            wgpu::BindGroupLayoutEntry {
                                binding: 0,
                                visibility: wgpu::ShaderStages::COMPUTE,
                                ty: wgpu::BindingType::Buffer {
                                    ty: wgpu::BufferBindingType::Uniform,
                                    has_dynamic_offset: false,
                                    min_binding_size: None,
                                },
                                count: None,
                            },
                            storage(1, true),
                            storage(2, false),
                            storage(3, false),
                        ],
                    });

                let pipeline_layout =
                    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some("trace-pipeline-layout"),
                        bind_group_layouts: &[&bind_group_layout],
                        push_constant_ranges: &[],
                    });

                let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some("trace-pipeline"),
                    layout: Some(&pipeline_layout),
                    module: &module,
                    entry_point: "trace",
                });

                let params = var::Builder::new(Params::default())
                    .with_label("trace-params")
                    .create(device);

                let seeds = typed_buffer::Builder::<Complex>::new(capacity_seeds as u64)
                    .with_label("trace-seeds")
                    .with_usage(wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST)
                    .create(device);

                let steps = typed_buffer::Builder::<u32>::new(capacity_seeds as u64)
                    .with_label("trace-steps")
                    .with_usage(wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC)
                    .create(device);

                let orbits = typed_buffer::Builder::<Complex>::new(orbit_len)
                    .with_label("trace-orbits")
                    .with_usage(wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC)
                    .create(device);

                let staging_steps = typed_buffer::Builder::<u32>::new(capacity_seeds as u64)
                    .with_label("trace-staging-steps")
                    .with_usage(wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST)
                    .create(device);

                let staging_orbits = typed_buffer::Builder::<Complex>::new(orbit_len)
                    .with_label("trace-staging-orbits")
                    .with_usage(wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST)
                    .create(device);

                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("trace-bind-group"),
                    layout: &bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: params.binding_resource(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: seeds.binding_resource(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: steps.binding_resource(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: orbits.binding_resource(),
                        },
                    ],
                });

                (
                    pipeline,
                    bind_group,
                    params,
                    seeds,
                    steps,
                    orbits,
                    staging_steps,
                    staging_orbits,
                )
            })?;

        Ok(Self {
            context,
            pipeline,
            bind_group,
            params,
            seeds,
            steps,
            orbits,
            staging_steps,
            staging_orbits,
            escape_radius_squared: escape_radius * escape_radius,
            capacity_seeds,
            capacity_limit: max_limit,
        })
    }
}

impl TrajectorySource for GpuSource {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn trace(
        &mut self,
        seeds: &[Complex],
        limit: u32,
        batch: &mut TrajectoryBatch,
    ) -> Result<(), Error> {
        let too_large = || Error::BatchTooLarge {
            seeds: seeds.len(),
            limit,
            capacity_seeds: self.capacity_seeds,
            capacity_limit: self.capacity_limit,
        };
        if seeds.len() > self.capacity_seeds || limit > self.capacity_limit {
            return Err(too_large());
        }
        let (x, y, z) = compute::trace_dispatch_size(seeds.len()).ok_or_else(too_large)?;

        let (steps, points) = batch.prepare(seeds.len(), limit)?;
        if seeds.is_empty() {
            return Ok(());
        }
        if limit == 0 {
            steps.fill(0);
            return Ok(());
        }

        trace!("begin gpu trace (limit {}, {} seeds)", limit, seeds.len());

        let context = &self.context;
        context.with_validation(|| {
            self.seeds.write(&context.queue, seeds);
            self.params.write(
                &context.queue,
                Params {
                    limit,
                    escape_radius_squared: self.escape_radius_squared,
                    seed_count: seeds.len() as u32,
                    padding: 0,
                },
            );

            let command_buffer = command_buffer::create(&context.device, "trace", |encoder| {
                encoder.with_compute_pass("trace-pass", |compute_pass| {
                    compute_pass.set_pipeline(&self.pipeline);
                    compute_pass.set_bind_group(0, &self.bind_group, &[]);
                    compute_pass.dispatch_workgroups(x, y, z);
                });
                typed_buffer::copy_buffer_to_buffer(
                    encoder,
                    &self.steps,
                    &self.staging_steps,
                    seeds.len() as u64,
                );
                typed_buffer::copy_buffer_to_buffer(
                    encoder,
                    &self.orbits,
                    &self.staging_orbits,
                    points.len() as u64,
                );
            });
            context.queue.submit([command_buffer]);
        })?;

        self.staging_steps.read_into(&context.device, steps)?;
        self.staging_orbits.read_into(&context.device, points)?;

        trace!("end gpu trace");
        Ok(())
    }
}
