/*
MIT License

Copyright (c) 2021, 2022, 2024, 2025 Vincent Hiribarren

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use bytemuck::NoUninit;
use log::{debug, info};
use pollster::FutureExt;
use wgpu::util::DeviceExt;
use winit::window::Window;

const SAMPLE_COUNT: u32 = 4;
const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};
const VERTEX_ENTRY_POINT: &str = "vtx_main";
const FRAGMENT_ENTRY_POINT: &str = "frg_main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn surface_ratio(&self) -> f32 {
        if self.height > 0 {
            self.width as f32 / self.height as f32
        } else {
            1.0
        }
    }
}

/// Host value with the byte layout WGSL expects in the uniform address space.
pub trait UniformType {
    type AlignedType: NoUninit;
    fn apply_alignment(&self) -> Self::AlignedType;
}

impl UniformType for [[f32; 4]; 4] {
    type AlignedType = Self;
    fn apply_alignment(&self) -> Self::AlignedType {
        *self
    }
}

// vec3 is 16 bytes aligned.
impl UniformType for [f32; 3] {
    type AlignedType = [f32; 4];
    fn apply_alignment(&self) -> Self::AlignedType {
        [self[0], self[1], self[2], 0.]
    }
}

// mat3x3 columns have a vec4 stride.
impl UniformType for [[f32; 3]; 3] {
    type AlignedType = [[f32; 4]; 3];
    fn apply_alignment(&self) -> Self::AlignedType {
        self.map(|[x, y, z]| [x, y, z, 0.])
    }
}

pub struct Uniform<T> {
    buffer: wgpu::Buffer,
    queue: Rc<wgpu::Queue>,
    _type: PhantomData<T>,
}

impl<T: UniformType> Uniform<T> {
    pub fn new(context: &DrawContext, value: T) -> Self {
        let buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Uniform Buffer"),
                contents: bytemuck::bytes_of(&value.apply_alignment()),
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::UNIFORM,
            });
        Self {
            buffer,
            queue: Rc::clone(&context.queue),
            _type: PhantomData,
        }
    }

    pub fn write_uniform(&mut self, value: T) {
        self.queue
            .write_buffer(&self.buffer, 0, bytemuck::bytes_of(&value.apply_alignment()));
    }
}

pub trait AsBindingResource {
    fn binding_resource(&self) -> wgpu::BindingResource;
    fn binding_type(&self) -> wgpu::BindingType;
}

impl<T: UniformType> AsBindingResource for Uniform<T> {
    fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
    fn binding_type(&self) -> wgpu::BindingType {
        wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        }
    }
}

/// A resource placed at `@group(bind_group) @binding(binding)`.
pub struct BindingSlot<'a> {
    pub bind_group: u32,
    pub binding: u32,
    pub resource: &'a dyn AsBindingResource,
}

/// Vertex data for one shader location, uploaded as its own buffer.
pub struct VertexStream<'a> {
    location: u32,
    format: wgpu::VertexFormat,
    bytes: &'a [u8],
}

impl<'a> VertexStream<'a> {
    pub fn new<T: NoUninit>(location: u32, format: wgpu::VertexFormat, data: &'a [T]) -> Self {
        Self {
            location,
            format,
            bytes: bytemuck::cast_slice(data),
        }
    }
}

/// Geometry of a drawable, drawn indexed when `indices` is present.
pub struct Mesh<'a> {
    pub streams: Vec<VertexStream<'a>>,
    pub indices: Option<&'a [u16]>,
}

impl Mesh<'_> {
    /// Number of vertices the draw call consumes.
    pub fn draw_count(&self) -> anyhow::Result<u32> {
        let count = match (self.indices, self.streams.first()) {
            (Some(indices), _) => indices.len(),
            (None, Some(stream)) => {
                let stride = usize::try_from(stream.format.size())?;
                stream.bytes.len() / stride
            }
            (None, None) => bail!("Mesh has no vertex stream"),
        };
        u32::try_from(count).context("Vertex count should fit in u32")
    }

    fn check_locations(&self) -> anyhow::Result<()> {
        let mut used = BTreeSet::new();
        for stream in &self.streams {
            if !used.insert(stream.location) {
                bail!("Location {} already used", stream.location);
            }
        }
        Ok(())
    }
}

/// Checks slots are unique and groups contiguous from 0, returns the group count.
fn count_bind_groups(slots: &[BindingSlot]) -> anyhow::Result<u32> {
    let mut used = BTreeSet::new();
    for slot in slots {
        if !used.insert((slot.bind_group, slot.binding)) {
            bail!(
                "Binding {} of group {} already used",
                slot.binding,
                slot.bind_group
            );
        }
    }
    let groups: BTreeSet<u32> = used.iter().map(|(group, _)| *group).collect();
    let Some(&last) = groups.last() else {
        return Ok(0);
    };
    if !groups.iter().copied().eq(0..=last) {
        bail!("Bind groups should be contiguous from 0, got {groups:?}");
    }
    Ok(last + 1)
}

enum DrawCall {
    Direct { vertex_count: u32 },
    Indexed { buffer: wgpu::Buffer, index_count: u32 },
}

/// One render pipeline with its bind groups and vertex buffers.
pub struct Drawable {
    pipeline: wgpu::RenderPipeline,
    bind_groups: Vec<wgpu::BindGroup>,
    vertex_buffers: Vec<wgpu::Buffer>,
    draw_call: DrawCall,
}

impl Drawable {
    /// The shader must expose `vtx_main` and `frg_main`.
    pub fn new(
        context: &DrawContext,
        shader: &wgpu::ShaderModule,
        mesh: &Mesh,
        slots: &[BindingSlot],
    ) -> anyhow::Result<Self> {
        mesh.check_locations()?;
        let device = &context.device;

        let mut layouts = Vec::new();
        let mut bind_groups = Vec::new();
        for group in 0..count_bind_groups(slots)? {
            let members: Vec<&BindingSlot> =
                slots.iter().filter(|slot| slot.bind_group == group).collect();
            let layout_entries: Vec<_> = members
                .iter()
                .map(|slot| wgpu::BindGroupLayoutEntry {
                    binding: slot.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: slot.resource.binding_type(),
                    count: None,
                })
                .collect();
            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Playground Bind Group Layout"),
                entries: &layout_entries,
            });
            let entries: Vec<_> = members
                .iter()
                .map(|slot| wgpu::BindGroupEntry {
                    binding: slot.binding,
                    resource: slot.resource.binding_resource(),
                })
                .collect();
            bind_groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Playground Bind Group"),
                layout: &layout,
                entries: &entries,
            }));
            layouts.push(layout);
        }

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = mesh
            .streams
            .iter()
            .map(|stream| {
                [wgpu::VertexAttribute {
                    format: stream.format,
                    offset: 0,
                    shader_location: stream.location,
                }]
            })
            .collect();
        let buffer_layouts: Vec<_> = mesh
            .streams
            .iter()
            .zip(&attributes)
            .map(|(stream, attributes)| wgpu::VertexBufferLayout {
                array_stride: stream.format.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Playground Pipeline Layout"),
            bind_group_layouts: &layouts.iter().collect::<Vec<_>>(),
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Playground Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(VERTEX_ENTRY_POINT),
                buffers: &buffer_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(FRAGMENT_ENTRY_POINT),
                targets: &[Some(wgpu::ColorTargetState {
                    format: context.color_format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            // Triangle lists without culling, whatever the winding.
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DrawContext::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: SAMPLE_COUNT,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        });

        let vertex_buffers = mesh
            .streams
            .iter()
            .map(|stream| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Vertex Buffer"),
                    contents: stream.bytes,
                    usage: wgpu::BufferUsages::VERTEX,
                })
            })
            .collect();
        let draw_call = match mesh.indices {
            Some(indices) => DrawCall::Indexed {
                buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Index Buffer"),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                index_count: mesh.draw_count()?,
            },
            None => DrawCall::Direct {
                vertex_count: mesh.draw_count()?,
            },
        };
        Ok(Self {
            pipeline,
            bind_groups,
            vertex_buffers,
            draw_call,
        })
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        for (index, bind_group) in (0u32..).zip(&self.bind_groups) {
            pass.set_bind_group(index, bind_group, &[]);
        }
        for (slot, buffer) in (0u32..).zip(&self.vertex_buffers) {
            pass.set_vertex_buffer(slot, buffer.slice(..));
        }
        match &self.draw_call {
            DrawCall::Direct { vertex_count } => pass.draw(0..*vertex_count, 0..1),
            DrawCall::Indexed {
                buffer,
                index_count,
            } => {
                pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..*index_count, 0, 0..1);
            }
        }
    }
}

enum FrameTarget {
    Window(wgpu::Surface<'static>),
    Offscreen(wgpu::Texture),
}

/// Multisampled color and depth buffers, resolved into the frame target.
struct FrameAttachments {
    color: wgpu::TextureView,
    depth: wgpu::TextureView,
}

impl FrameAttachments {
    fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        let attachment = |format: wgpu::TextureFormat, label: &'static str| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: extent(config),
                    mip_level_count: 1,
                    sample_count: SAMPLE_COUNT,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };
        Self {
            color: attachment(config.format, "Multisampled Color"),
            depth: attachment(DrawContext::DEPTH_FORMAT, "Depth"),
        }
    }
}

fn extent(config: &wgpu::SurfaceConfiguration) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: config.width,
        height: config.height,
        depth_or_array_layers: 1,
    }
}

fn offscreen_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Frame"),
        size: extent(config),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// GPU device and frame target, either a window surface or an offscreen texture.
pub struct DrawContext {
    pub window: Option<Arc<Window>>,
    pub device: wgpu::Device,
    pub queue: Rc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    target: FrameTarget,
    attachments: FrameAttachments,
}

impl DrawContext {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Renders offscreen when `window` is `None`.
    pub async fn new(
        window: Option<Arc<Window>>,
        size: Dimensions,
        backends: wgpu::Backends,
    ) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface = match &window {
            Some(window) => Some(instance.create_surface(Arc::clone(window))?),
            None => None,
        };
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: surface.as_ref(),
            })
            .await
            .ok_or_else(|| anyhow!("Could not find a graphics adapter for {backends:?}"))?;
        info!("Using adapter {:?}", adapter.get_info());
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Playground Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;
        debug!("Device limits: {:?}", device.limits());

        let format = match &surface {
            Some(surface) => {
                let capabilities = surface.get_capabilities(&adapter);
                capabilities
                    .formats
                    .iter()
                    .find(|format| format.is_srgb())
                    .or_else(|| capabilities.formats.first())
                    .copied()
                    .ok_or_else(|| anyhow!("Surface is not compatible with the adapter"))?
            }
            None => OFFSCREEN_FORMAT,
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        };
        let target = match surface {
            Some(surface) => {
                surface.configure(&device, &config);
                FrameTarget::Window(surface)
            }
            None => FrameTarget::Offscreen(offscreen_texture(&device, &config)),
        };
        let attachments = FrameAttachments::new(&device, &config);
        Ok(Self {
            window,
            device,
            queue: Rc::new(queue),
            config,
            target,
            attachments,
        })
    }

    #[must_use]
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    #[must_use]
    pub fn surface_dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.config.width,
            height: self.config.height,
        }
    }

    #[must_use]
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub fn create_shader_module(&self, wgsl: &str) -> wgpu::ShaderModule {
        self.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Playground Shader"),
                source: wgpu::ShaderSource::Wgsl(wgsl.into()),
            })
    }

    /// Runs `build` in a validation error scope, so GPU validation failures
    /// come back as errors instead of reaching the uncaptured error handler.
    pub fn validated<T>(&self, build: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let built = build();
        if let Some(err) = self.device.pop_error_scope().block_on() {
            bail!("GPU validation failed: {err}");
        }
        built
    }

    /// A zero sized area (minimized window) keeps the current buffers.
    pub fn resize(&mut self, size: Dimensions) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        match &mut self.target {
            FrameTarget::Window(surface) => surface.configure(&self.device, &self.config),
            FrameTarget::Offscreen(texture) => {
                *texture = offscreen_texture(&self.device, &self.config);
            }
        }
        self.attachments = FrameAttachments::new(&self.device, &self.config);
    }

    /// Clears the frame, lets `draw` record into the pass, then submits and presents.
    pub fn draw_frame<F>(&self, draw: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut wgpu::RenderPass<'_>),
    {
        let (frame, resolve_view) = match &self.target {
            FrameTarget::Window(surface) => {
                let frame = surface.get_current_texture()?;
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                (Some(frame), view)
            }
            FrameTarget::Offscreen(texture) => (
                None,
                texture.create_view(&wgpu::TextureViewDescriptor::default()),
            ),
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.attachments.color,
                    resolve_target: Some(&resolve_view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Discard,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.attachments.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            draw(&mut pass);
        }
        self.queue.submit(Some(encoder.finish()));
        if let Some(frame) = frame {
            frame.present();
        }
        Ok(())
    }
}
