//! wgpu implementation of [`GraphicsContext`]
//!
//! Resources are created immediately. Binds only update the tracked
//! [`BoundState`]; each draw snapshots that state, including the current
//! contents of every bound constant buffer, into a list. `end_frame` uploads
//! the snapshots, resolves a pipeline per draw and replays the list in one
//! render pass, followed by an optional overlay pass for the UI.

use std::{collections::HashMap, path::Path, sync::Arc};

use cgmath::{Matrix4, SquareMatrix};
use wgpu::TextureFormat;

use super::{
    pipeline_manager::{BindSignature, PipelineKey, PipelineManager, PipelineSource},
    uniform_arena::{UniformArena, UniformSlice},
};
use crate::{
    error::{GfxError, GfxResult},
    gfx::{
        context::{
            BoundState, DepthStencilMode, GraphicsContext, IdAllocator, ResourceId, ShaderProgram,
            ShaderStage, TextureInfo, Topology, MAX_CONSTANT_SLOTS, MAX_TEXTURE_SLOTS,
            SAMPLER_BINDING, TEXTURE_BINDING_BASE,
        },
        resources::{create_material_sampler, TextureResource},
        vertex::VertexLayout,
    },
};

const STENCIL_REFERENCE: u32 = 0xFF;

#[derive(Debug)]
enum GpuResource {
    VertexBuffer(wgpu::Buffer),
    IndexBuffer(wgpu::Buffer),
    Shader { stage: ShaderStage, program: ShaderProgram },
    Texture(TextureResource),
    Sampler(wgpu::Sampler),
    ConstantBuffer { contents: Vec<u8> },
    Rasterizer { two_sided: bool },
    DepthStencil(DepthStencilMode),
    InputLayout(VertexLayout),
}

impl GpuResource {
    fn kind(&self) -> &'static str {
        match self {
            GpuResource::VertexBuffer(_) => "vertex buffer",
            GpuResource::IndexBuffer(_) => "index buffer",
            GpuResource::Shader { stage: ShaderStage::Vertex, .. } => "vertex shader",
            GpuResource::Shader { stage: ShaderStage::Pixel, .. } => "pixel shader",
            GpuResource::Texture(_) => "texture",
            GpuResource::Sampler(_) => "sampler",
            GpuResource::ConstantBuffer { .. } => "constant buffer",
            GpuResource::Rasterizer { .. } => "rasterizer state",
            GpuResource::DepthStencil(_) => "depth-stencil state",
            GpuResource::InputLayout(_) => "input layout",
        }
    }
}

/// One recorded draw with its constant buffers already snapshotted
#[derive(Debug)]
struct PendingDraw {
    key: PipelineKey,
    vertex_buffer: ResourceId,
    index_buffer: ResourceId,
    index_count: u32,
    vertex_constants: Vec<(u32, UniformSlice)>,
    pixel_constants: Vec<(u32, UniformSlice)>,
    textures: Vec<(u32, ResourceId)>,
    sampler: Option<ResourceId>,
}

/// Core rendering engine: surface, device, resources and frame submission
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pipeline_manager: PipelineManager,

    ids: IdAllocator,
    resources: HashMap<ResourceId, GpuResource>,
    bound: BoundState,
    uniforms: UniformArena,
    draws: Vec<PendingDraw>,
    clear_color: Option<wgpu::Color>,

    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl RenderEngine {
    /// Creates a render engine drawing into `window`
    ///
    /// Requests an adapter compatible with the window, prefers an sRGB surface
    /// format and allocates the depth-stencil target used by every draw.
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `vsync` - Present with `AutoVsync` when true, `AutoNoVsync` otherwise
    ///
    /// # Errors
    /// [`GfxError::SurfaceCreationFailed`], [`GfxError::AdapterRequestFailed`]
    /// or [`GfxError::DeviceCreationFailed`] for whichever setup step failed.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> GfxResult<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| GfxError::SurfaceCreationFailed(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| GfxError::AdapterRequestFailed(e.to_string()))?;
        log::info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Trellis Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| GfxError::DeviceCreationFailed(e.to_string()))?;

        // material colors are authored in sRGB
        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| GfxError::SurfaceCreationFailed("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let device: Arc<wgpu::Device> = device.into();
        let queue: Arc<wgpu::Queue> = queue.into();
        let aspect = config.width as f32 / config.height as f32;

        Ok(RenderEngine {
            pipeline_manager: PipelineManager::new(device.clone(), format),
            surface,
            device,
            queue,
            config,
            depth_texture,
            format,
            ids: IdAllocator::default(),
            resources: HashMap::new(),
            bound: BoundState::default(),
            uniforms: UniformArena::new(alignment),
            draws: Vec::new(),
            clear_color: None,
            view: Matrix4::identity(),
            projection: crate::gfx::camera::projection(60.0, aspect, 0.5, 400.0),
        })
    }

    /// Reconfigures the surface and recreates the depth target
    ///
    /// Zero-sized requests (a minimised window) are ignored so the surface is
    /// never configured with an empty extent.
    ///
    /// # Arguments
    /// * `width` - New surface width in pixels
    /// * `height` - New surface height in pixels
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Switches the present mode and reconfigures the surface immediately
    ///
    /// # Arguments
    /// * `enable` - Wait for vertical blank when true
    pub fn set_vsync(&mut self, enable: bool) {
        self.config.present_mode = present_mode(enable);
        self.surface.configure(&self.device, &self.config);
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Width over height of the current surface
    pub fn aspect_ratio(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.format
    }

    /// Number of render pipelines built so far
    pub fn pipeline_count(&self) -> usize {
        self.pipeline_manager.pipeline_count()
    }

    fn insert(&mut self, resource: GpuResource) -> ResourceId {
        let id = self.ids.allocate();
        self.resources.insert(id, resource);
        id
    }

    fn resource(&self, id: ResourceId) -> GfxResult<&GpuResource> {
        self.resources.get(&id).ok_or(GfxError::UnknownResource(id))
    }

    fn check_kind(&self, id: ResourceId, expected: &'static str) -> GfxResult<()> {
        let resource = self.resource(id)?;
        if resource.kind() != expected {
            return Err(GfxError::WrongResourceKind { id, expected });
        }
        Ok(())
    }

    fn snapshot_constants(&mut self, stage: ShaderStage) -> GfxResult<Vec<(u32, UniformSlice)>> {
        let mut slices = Vec::new();
        for (&slot, &id) in self.bound.constants(stage) {
            match self.resources.get(&id) {
                Some(GpuResource::ConstantBuffer { contents }) => {
                    slices.push((slot, self.uniforms.push(contents)));
                }
                Some(_) => {
                    return Err(GfxError::WrongResourceKind {
                        id,
                        expected: "constant buffer",
                    })
                }
                None => return Err(GfxError::UnknownResource(id)),
            }
        }
        Ok(slices)
    }

    fn shader_program(&self, id: ResourceId, what: &'static str) -> GfxResult<ShaderProgram> {
        match self.resource(id)? {
            GpuResource::Shader { program, .. } => Ok(*program),
            _ => Err(GfxError::WrongResourceKind { id, expected: what }),
        }
    }

    /// Presents everything drawn since [`begin_frame`](GraphicsContext::begin_frame),
    /// then lets `overlay` record extra passes (the UI) on the same target
    ///
    /// Pipelines missing from the cache are built first. All constant buffers
    /// snapshotted by the frame's draws go up in a single upload, then the
    /// scene is recorded into one render pass that clears color and depth.
    /// The overlay runs on the same encoder before submission.
    ///
    /// # Arguments
    /// * `overlay` - Records additional passes; receives the device, queue,
    ///   encoder and the surface view being presented
    ///
    /// # Errors
    /// * [`GfxError::NoActiveFrame`] if no frame was begun
    /// * [`GfxError::SurfaceLost`] if the surface was lost or outdated; it has
    ///   been reconfigured and the frame was dropped without running `overlay`
    /// * [`GfxError::OutOfMemory`] if the surface could not be acquired
    ///
    /// Other acquire failures, such as timeouts, skip the frame and return `Ok`
    /// without running `overlay`.
    pub fn end_frame_with_overlay<F>(&mut self, overlay: F) -> GfxResult<()>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let clear_color = self.clear_color.take().ok_or(GfxError::NoActiveFrame)?;
        let draws = std::mem::take(&mut self.draws);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Err(GfxError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(GfxError::OutOfMemory),
            Err(error) => {
                log::warn!("Skipping frame: {error}");
                return Ok(());
            }
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        for draw in &draws {
            let vertex = self.shader_program(draw.key.vertex_shader, "vertex shader")?;
            let pixel = self.shader_program(draw.key.pixel_shader, "pixel shader")?;
            let GpuResource::InputLayout(layout) = self.resource(draw.key.input_layout)? else {
                return Err(GfxError::WrongResourceKind {
                    id: draw.key.input_layout,
                    expected: "input layout",
                });
            };
            let layout = layout.clone();
            self.pipeline_manager.prepare(
                &draw.key,
                PipelineSource {
                    vertex: &vertex,
                    pixel: &pixel,
                    layout: &layout,
                },
            )?;
        }

        let arena = self.uniforms.upload(&self.device, &self.queue).cloned();
        let mut bind_groups = Vec::with_capacity(draws.len());
        for draw in &draws {
            bind_groups.push(self.create_bind_groups(draw, arena.as_ref())?);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_stencil_reference(STENCIL_REFERENCE);

            for (draw, (vertex_group, pixel_group)) in draws.iter().zip(&bind_groups) {
                let (
                    Some(cached),
                    Some(GpuResource::VertexBuffer(vertices)),
                    Some(GpuResource::IndexBuffer(indices)),
                ) = (
                    self.pipeline_manager.get(&draw.key),
                    self.resources.get(&draw.vertex_buffer),
                    self.resources.get(&draw.index_buffer),
                )
                else {
                    continue;
                };
                pass.set_pipeline(&cached.pipeline);
                pass.set_bind_group(0, vertex_group, &[]);
                pass.set_bind_group(1, pixel_group, &[]);
                pass.set_vertex_buffer(0, vertices.slice(..));
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        overlay(self.device.as_ref(), self.queue.as_ref(), &mut encoder, &surface_view);

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    fn create_bind_groups(
        &self,
        draw: &PendingDraw,
        arena: Option<&wgpu::Buffer>,
    ) -> GfxResult<(wgpu::BindGroup, wgpu::BindGroup)> {
        let cached = self
            .pipeline_manager
            .get(&draw.key)
            .ok_or(GfxError::IncompletePipeline("pipeline"))?;

        let mut vertex_entries = Vec::new();
        let mut pixel_entries = Vec::new();
        if !draw.vertex_constants.is_empty() || !draw.pixel_constants.is_empty() {
            let buffer = arena.ok_or(GfxError::IncompletePipeline("constant buffer"))?;
            vertex_entries.extend(
                draw.vertex_constants
                    .iter()
                    .map(|&(slot, slice)| uniform_binding(buffer, slot, slice)),
            );
            pixel_entries.extend(
                draw.pixel_constants
                    .iter()
                    .map(|&(slot, slice)| uniform_binding(buffer, slot, slice)),
            );
        }
        for &(slot, id) in &draw.textures {
            let GpuResource::Texture(texture) = self.resource(id)? else {
                return Err(GfxError::WrongResourceKind { id, expected: "texture" });
            };
            pixel_entries.push(wgpu::BindGroupEntry {
                binding: TEXTURE_BINDING_BASE + slot,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
        }
        if let Some(id) = draw.sampler {
            let GpuResource::Sampler(sampler) = self.resource(id)? else {
                return Err(GfxError::WrongResourceKind { id, expected: "sampler" });
            };
            pixel_entries.push(wgpu::BindGroupEntry {
                binding: SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        let vertex_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Vertex Constants"),
            layout: &cached.vertex_group,
            entries: &vertex_entries,
        });
        let pixel_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Pixel Resources"),
            layout: &cached.pixel_group,
            entries: &pixel_entries,
        });
        Ok((vertex_group, pixel_group))
    }
}

fn uniform_binding(buffer: &wgpu::Buffer, slot: u32, slice: UniformSlice) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding: slot,
        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer,
            offset: slice.offset,
            size: wgpu::BufferSize::new(slice.size),
        }),
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

impl GraphicsContext for RenderEngine {
    fn create_vertex_buffer(&mut self, _layout: &VertexLayout, data: &[u8]) -> GfxResult<ResourceId> {
        use wgpu::util::DeviceExt;
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: data,
            usage: wgpu::BufferUsages::VERTEX,
        });
        Ok(self.insert(GpuResource::VertexBuffer(buffer)))
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> GfxResult<ResourceId> {
        use wgpu::util::DeviceExt;
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Ok(self.insert(GpuResource::IndexBuffer(buffer)))
    }

    fn create_shader(&mut self, stage: ShaderStage, program: &ShaderProgram) -> GfxResult<ResourceId> {
        self.pipeline_manager.load_shader(program)?;
        Ok(self.insert(GpuResource::Shader {
            stage,
            program: *program,
        }))
    }

    fn create_texture(&mut self, path: &Path, srgb: bool) -> GfxResult<TextureInfo> {
        let (texture, has_alpha) = TextureResource::from_image(&self.device, &self.queue, path, srgb)?;
        log::debug!("Loaded texture {}", path.display());
        Ok(TextureInfo {
            id: self.insert(GpuResource::Texture(texture)),
            has_alpha,
        })
    }

    fn create_sampler(&mut self) -> GfxResult<ResourceId> {
        let sampler = create_material_sampler(&self.device);
        Ok(self.insert(GpuResource::Sampler(sampler)))
    }

    fn create_constant_buffer(&mut self, _stage: ShaderStage, data: &[u8]) -> GfxResult<ResourceId> {
        Ok(self.insert(GpuResource::ConstantBuffer {
            contents: data.to_vec(),
        }))
    }

    fn update_constant_buffer(&mut self, id: ResourceId, data: &[u8]) -> GfxResult<()> {
        match self.resources.get_mut(&id) {
            Some(GpuResource::ConstantBuffer { contents }) => {
                contents.clear();
                contents.extend_from_slice(data);
                Ok(())
            }
            Some(_) => Err(GfxError::WrongResourceKind {
                id,
                expected: "constant buffer",
            }),
            None => Err(GfxError::UnknownResource(id)),
        }
    }

    fn create_rasterizer(&mut self, two_sided: bool) -> GfxResult<ResourceId> {
        Ok(self.insert(GpuResource::Rasterizer { two_sided }))
    }

    fn create_depth_stencil(&mut self, mode: DepthStencilMode) -> GfxResult<ResourceId> {
        Ok(self.insert(GpuResource::DepthStencil(mode)))
    }

    fn create_input_layout(&mut self, layout: &VertexLayout, vertex_shader: ResourceId) -> GfxResult<ResourceId> {
        self.check_kind(vertex_shader, "vertex shader")?;
        Ok(self.insert(GpuResource::InputLayout(layout.clone())))
    }

    fn bind_vertex_buffer(&mut self, id: ResourceId) -> GfxResult<()> {
        self.check_kind(id, "vertex buffer")?;
        self.bound.vertex_buffer = Some(id);
        Ok(())
    }

    fn bind_index_buffer(&mut self, id: ResourceId) -> GfxResult<()> {
        self.check_kind(id, "index buffer")?;
        self.bound.index_buffer = Some(id);
        Ok(())
    }

    fn bind_vertex_shader(&mut self, id: ResourceId) -> GfxResult<()> {
        self.check_kind(id, "vertex shader")?;
        self.bound.vertex_shader = Some(id);
        Ok(())
    }

    fn bind_pixel_shader(&mut self, id: ResourceId) -> GfxResult<()> {
        self.check_kind(id, "pixel shader")?;
        self.bound.pixel_shader = Some(id);
        Ok(())
    }

    fn bind_texture(&mut self, slot: u32, id: ResourceId) -> GfxResult<()> {
        self.check_kind(id, "texture")?;
        if slot >= MAX_TEXTURE_SLOTS {
            return Err(GfxError::ResourceCreationFailed {
                kind: "texture binding",
                reason: format!("slot {slot} exceeds {MAX_TEXTURE_SLOTS}"),
            });
        }
        self.bound.textures.insert(slot, id);
        Ok(())
    }

    fn bind_sampler(&mut self, id: ResourceId) -> GfxResult<()> {
        self.check_kind(id, "sampler")?;
        self.bound.sampler = Some(id);
        Ok(())
    }

    fn bind_constant_buffer(&mut self, stage: ShaderStage, slot: u32, id: ResourceId) -> GfxResult<()> {
        self.check_kind(id, "constant buffer")?;
        if slot >= MAX_CONSTANT_SLOTS {
            return Err(GfxError::ResourceCreationFailed {
                kind: "constant buffer binding",
                reason: format!("slot {slot} exceeds {MAX_CONSTANT_SLOTS}"),
            });
        }
        self.bound.constants_mut(stage).insert(slot, id);
        Ok(())
    }

    fn bind_rasterizer(&mut self, id: ResourceId) -> GfxResult<()> {
        self.check_kind(id, "rasterizer state")?;
        self.bound.rasterizer = Some(id);
        Ok(())
    }

    fn bind_depth_stencil(&mut self, id: ResourceId) -> GfxResult<()> {
        self.check_kind(id, "depth-stencil state")?;
        self.bound.depth_stencil = Some(id);
        Ok(())
    }

    fn bind_input_layout(&mut self, id: ResourceId) -> GfxResult<()> {
        self.check_kind(id, "input layout")?;
        self.bound.input_layout = Some(id);
        Ok(())
    }

    fn set_topology(&mut self, topology: Topology) -> GfxResult<()> {
        self.bound.topology = topology;
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> GfxResult<()> {
        if self.clear_color.is_none() {
            return Err(GfxError::NoActiveFrame);
        }
        self.bound.check_drawable()?;

        let two_sided = match self.bound.rasterizer.map(|id| self.resource(id)).transpose()? {
            Some(GpuResource::Rasterizer { two_sided }) => *two_sided,
            _ => false,
        };
        let depth_stencil = match self.bound.depth_stencil.map(|id| self.resource(id)).transpose()? {
            Some(GpuResource::DepthStencil(mode)) => *mode,
            _ => DepthStencilMode::Off,
        };

        let bound = &self.bound;
        let (
            Some(vertex_buffer),
            Some(index_buffer),
            Some(vertex_shader),
            Some(pixel_shader),
            Some(input_layout),
        ) = (
            bound.vertex_buffer,
            bound.index_buffer,
            bound.vertex_shader,
            bound.pixel_shader,
            bound.input_layout,
        )
        else {
            return Err(GfxError::IncompletePipeline("pipeline state"));
        };

        let signature = BindSignature {
            vertex_constants: bound.vertex_constants.keys().copied().collect(),
            pixel_constants: bound.pixel_constants.keys().copied().collect(),
            textures: bound.textures.keys().copied().collect(),
            sampler: bound.sampler.is_some(),
        };
        let textures = bound.textures.iter().map(|(&slot, &id)| (slot, id)).collect();
        let sampler = bound.sampler;
        let key = PipelineKey {
            vertex_shader,
            pixel_shader,
            input_layout,
            two_sided,
            depth_stencil,
            topology: bound.topology,
            signature,
        };

        let vertex_constants = self.snapshot_constants(ShaderStage::Vertex)?;
        let pixel_constants = self.snapshot_constants(ShaderStage::Pixel)?;
        self.draws.push(PendingDraw {
            key,
            vertex_buffer,
            index_buffer,
            index_count,
            vertex_constants,
            pixel_constants,
            textures,
            sampler,
        });
        Ok(())
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> GfxResult<()> {
        let [r, g, b, a] = clear_color.map(f64::from);
        self.clear_color = Some(wgpu::Color { r, g, b, a });
        self.draws.clear();
        self.uniforms.clear();
        Ok(())
    }

    fn end_frame(&mut self) -> GfxResult<()> {
        self.end_frame_with_overlay(|_, _, _, _| {})
    }

    fn camera(&self) -> Matrix4<f32> {
        self.view
    }

    fn set_camera(&mut self, view: Matrix4<f32>) {
        self.view = view;
    }

    fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    fn set_projection(&mut self, projection: Matrix4<f32>) {
        self.projection = projection;
    }
}
