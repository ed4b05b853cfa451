use std::time::Instant;
use wgpu::util::DeviceExt;
use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use vis_core::{
    ndc_from_pixels, AudioLevel, FpsCounter, Instance, RenderUniforms, SharedVisualiser,
    Visualiser, VisualiserParams, DEFAULT_SEED, PARTICLE_WGSL,
};

mod controls;
use controls::{action_for_key, ControlAction};

const INITIAL_INSTANCE_CAPACITY: usize = 1024;

struct GpuState<'w> {
    window: &'w winit::window::Window,
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    quad_vb: wgpu::Buffer,
    instance_vb: wgpu::Buffer,
    instance_capacity: usize,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
    last_frame: Instant,
    fps: FpsCounter,
    shared: SharedVisualiser,
}

impl<'w> GpuState<'w> {
    async fn new(
        window: &'w winit::window::Window,
        shared: SharedVisualiser,
    ) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Surface reports no formats"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("particle_shader"),
            source: wgpu::ShaderSource::Wgsl(PARTICLE_WGSL.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniforms"),
            size: std::mem::size_of::<RenderUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        // Billboard corners for two triangles; the shader scales them by particle size
        let quad_vertices: [f32; 12] = [
            -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0,
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vb"),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let instance_vb = create_instance_buffer(&device, INITIAL_INSTANCE_CAPACITY);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffers = [
            // slot 0: quad corners
            wgpu::VertexBufferLayout {
                array_stride: (std::mem::size_of::<f32>() * 2) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                }],
            },
            // slot 1: one Instance per particle
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Instance>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 1,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x4,
                        offset: 12,
                        shader_location: 2,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32,
                        offset: 28,
                        shader_location: 3,
                    },
                ],
            },
        ];
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("particle_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        shared.resize(size.width, size.height);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            pipeline,
            uniform_buffer,
            quad_vb,
            instance_vb,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            bind_group,
            width: size.width,
            height: size.height,
            last_frame: Instant::now(),
            fps: FpsCounter::default(),
            shared,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.shared.resize(new_size.width, new_size.height);
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.width = new_size.width;
        self.height = new_size.height;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    fn cursor_moved(&self, position: winit::dpi::PhysicalPosition<f64>) {
        let ndc = ndc_from_pixels(position.x, position.y, self.width, self.height);
        self.shared.set_mouse(ndc);
    }

    fn key_pressed(&self, key: &Key) {
        let Some(action) = key_name(key).and_then(action_for_key) else {
            return;
        };
        match action {
            ControlAction::Reset => self.shared.reset(),
            ControlAction::Nudge { id, delta } => {
                self.shared
                    .update_params(|params| match controls::nudge(params, id, delta) {
                        Ok(value) => log::info!("[controls] {id} = {value}"),
                        Err(e) => log::warn!("[controls] {e}"),
                    })
            }
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;
        self.fps.begin_frame(now);

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Simulate and upload while holding the visualiser lock
        let shared = self.shared.clone();
        let count = shared.frame_with(dt.as_secs_f32(), |instances, uniforms| {
            if instances.len() > self.instance_capacity {
                self.instance_capacity = instances.len().next_power_of_two();
                self.instance_vb = create_instance_buffer(&self.device, self.instance_capacity);
                log::debug!("[render] instance buffer grown to {}", self.instance_capacity);
            }
            self.queue
                .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
            if !instances.is_empty() {
                self.queue
                    .write_buffer(&self.instance_vb, 0, bytemuck::cast_slice(instances));
            }
            instances.len() as u32
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rpass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if count > 0 {
                rpass.set_pipeline(&self.pipeline);
                rpass.set_bind_group(0, &self.bind_group, &[]);
                rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
                rpass.set_vertex_buffer(1, self.instance_vb.slice(..));
                rpass.draw(0..6, 0..count);
            }
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();

        if let Some(reading) = self.fps.end_frame(Instant::now()) {
            log::info!(
                "[render] {} fps, {:.1} ms cpu/s, {} particles",
                reading.fps,
                reading.cpu_seconds * 1000.0,
                count
            );
        }
        Ok(())
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_vb"),
        size: (std::mem::size_of::<Instance>() * capacity) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn key_name(key: &Key) -> Option<&str> {
    match key {
        Key::Named(NamedKey::ArrowUp) => Some("ArrowUp"),
        Key::Named(NamedKey::ArrowDown) => Some("ArrowDown"),
        Key::Named(NamedKey::ArrowLeft) => Some("ArrowLeft"),
        Key::Named(NamedKey::ArrowRight) => Some("ArrowRight"),
        Key::Character(c) => Some(c.as_str()),
        _ => None,
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let shared = SharedVisualiser::new(Visualiser::new(VisualiserParams::default(), DEFAULT_SEED));

    // Keep the stream alive for the lifetime of the window
    let _input_stream = match start_input_meter(shared.audio_level()) {
        Ok(stream) => stream,
        Err(e) => {
            log::warn!("[audio] input meter unavailable: {e}");
            None
        }
    };

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Particle Sphere Visualiser")
        .build(&event_loop)?;

    let mut state = pollster::block_on(GpuState::new(&window, shared))?;
    log::info!("[native] ready: R resets, arrows nudge movement/force, +/- change count");

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::CursorMoved { position, .. } => state.cursor_moved(position),
            WindowEvent::CursorLeft { .. } => state.shared.set_mouse(None),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                state.key_pressed(&event.logical_key)
            }
            _ => {}
        },
        Event::AboutToWait => match state.render() {
            Ok(_) => state.window.request_redraw(),
            Err(wgpu::SurfaceError::Lost) => state.resize(state.window.inner_size()),
            Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
            Err(e) => log::error!("[render] surface error: {e:?}"),
        },
        _ => {}
    })?;
    Ok(())
}

// ---------------- Native audio input (cpal) ----------------

/// Meter the default input device, publishing the per-callback peak.
///
/// `Ok(None)` when there is no input device; the level then stays at silence.
fn start_input_meter(level: AudioLevel) -> anyhow::Result<Option<cpal::Stream>> {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        log::warn!("[audio] no input device; visualiser will stay at rest");
        return Ok(None);
    };
    let config = device.default_input_config()?;
    log::info!(
        "[audio] metering {} ({} Hz, {} ch, {:?})",
        device.name().unwrap_or_else(|_| "unknown device".into()),
        config.sample_rate().0,
        config.channels(),
        config.sample_format()
    );

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_meter_stream::<f32>(&device, &config.into(), level)?,
        cpal::SampleFormat::I16 => build_meter_stream::<i16>(&device, &config.into(), level)?,
        cpal::SampleFormat::U16 => build_meter_stream::<u16>(&device, &config.into(), level)?,
        other => anyhow::bail!("unsupported input sample format {other:?}"),
    };
    stream.play()?;
    Ok(Some(stream))
}

fn build_meter_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    level: AudioLevel,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    device.build_input_stream(
        config,
        move |data: &[T], _| level.store(peak(data)),
        |err| log::error!("[audio] input stream error: {err}"),
        None,
    )
}

fn peak<T>(data: &[T]) -> f32
where
    T: SizedSample,
    f32: FromSample<T>,
{
    data.iter()
        .map(|&s| f32::from_sample(s).abs())
        .fold(0.0, f32::max)
}
