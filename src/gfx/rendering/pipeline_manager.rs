//! Render pipeline cache for the wgpu backend
//!
//! A D3D-style context binds shaders, input layout and fixed-function state
//! separately; wgpu bakes them into one immutable pipeline. The manager maps
//! every distinct combination seen at draw time to a pipeline, creating it on
//! first use, and compiles each WGSL module once no matter how many entry
//! points are taken from it.

use std::{collections::HashMap, sync::Arc};

use wgpu::*;

use crate::{
    error::{GfxError, GfxResult},
    gfx::{
        context::{
            DepthStencilMode, ResourceId, ShaderProgram, Topology, SAMPLER_BINDING,
            TEXTURE_BINDING_BASE,
        },
        resources::TextureResource,
        vertex::VertexLayout,
    },
};

/// Which slots a draw has bound; decides the bind group layouts
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BindSignature {
    pub vertex_constants: Vec<u32>,
    pub pixel_constants: Vec<u32>,
    pub textures: Vec<u32>,
    pub sampler: bool,
}

impl BindSignature {
    /// Entries of `@group(0)`: vertex-stage constant buffers
    pub fn vertex_entries(&self) -> Vec<BindGroupLayoutEntry> {
        self.vertex_constants.iter().map(|&slot| uniform_entry(slot)).collect()
    }

    /// Entries of `@group(1)`: pixel constants, textures and the sampler
    pub fn pixel_entries(&self) -> Vec<BindGroupLayoutEntry> {
        let mut entries: Vec<_> = self.pixel_constants.iter().map(|&slot| uniform_entry(slot)).collect();
        entries.extend(self.textures.iter().map(|&slot| BindGroupLayoutEntry {
            binding: TEXTURE_BINDING_BASE + slot,
            visibility: ShaderStages::FRAGMENT,
            ty: BindingType::Texture {
                multisampled: false,
                view_dimension: TextureViewDimension::D2,
                sample_type: TextureSampleType::Float { filterable: true },
            },
            count: None,
        }));
        if self.sampler {
            entries.push(BindGroupLayoutEntry {
                binding: SAMPLER_BINDING,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            });
        }
        entries
    }
}

fn uniform_entry(binding: u32) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::VERTEX_FRAGMENT,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Everything that makes two draws need different pipelines
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub vertex_shader: ResourceId,
    pub pixel_shader: ResourceId,
    pub input_layout: ResourceId,
    pub two_sided: bool,
    pub depth_stencil: DepthStencilMode,
    pub topology: Topology,
    pub signature: BindSignature,
}

/// Programs and vertex format a [`PipelineKey`] resolves to
#[derive(Debug, Clone)]
pub struct PipelineSource<'a> {
    pub vertex: &'a ShaderProgram,
    pub pixel: &'a ShaderProgram,
    pub layout: &'a VertexLayout,
}

/// A created pipeline with the layouts its bind groups must use
#[derive(Debug)]
pub struct CachedPipeline {
    pub pipeline: RenderPipeline,
    pub vertex_group: BindGroupLayout,
    pub pixel_group: BindGroupLayout,
}

pub fn depth_stencil_state(mode: DepthStencilMode) -> DepthStencilState {
    let stencil_face = |compare, pass_op| StencilFaceState {
        compare,
        fail_op: StencilOperation::Keep,
        depth_fail_op: StencilOperation::Keep,
        pass_op,
    };
    let (depth_write_enabled, depth_compare, stencil) = match mode {
        DepthStencilMode::Off => (true, CompareFunction::Less, StencilState::default()),
        DepthStencilMode::Write => {
            let face = stencil_face(CompareFunction::Always, StencilOperation::Replace);
            (
                false,
                CompareFunction::Less,
                StencilState {
                    front: face,
                    back: face,
                    read_mask: 0xFF,
                    write_mask: 0xFF,
                },
            )
        }
        DepthStencilMode::Mask => {
            let face = stencil_face(CompareFunction::NotEqual, StencilOperation::Keep);
            (
                false,
                CompareFunction::Always,
                StencilState {
                    front: face,
                    back: face,
                    read_mask: 0xFF,
                    write_mask: 0,
                },
            )
        }
    };
    DepthStencilState {
        format: TextureResource::DEPTH_FORMAT,
        depth_write_enabled,
        depth_compare,
        stencil,
        bias: DepthBiasState::default(),
    }
}

pub struct PipelineManager {
    device: Arc<Device>,
    color_format: TextureFormat,
    shader_modules: HashMap<&'static str, ShaderModule>,
    group_layouts: HashMap<Vec<BindGroupLayoutEntry>, BindGroupLayout>,
    pipelines: HashMap<PipelineKey, CachedPipeline>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>, color_format: TextureFormat) -> Self {
        Self {
            device,
            color_format,
            shader_modules: HashMap::new(),
            group_layouts: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    /// Compiles `program`'s module unless a module of that name exists
    ///
    /// Validation errors are caught in an error scope and returned instead of
    /// reaching the device's uncaptured error handler.
    pub fn load_shader(&mut self, program: &ShaderProgram) -> GfxResult<()> {
        if self.shader_modules.contains_key(program.name) {
            return Ok(());
        }

        self.device.push_error_scope(ErrorFilter::Validation);
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(program.name),
            source: ShaderSource::Wgsl(program.source.into()),
        });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GfxError::ResourceCreationFailed {
                kind: "shader module",
                reason: error.to_string(),
            });
        }

        log::debug!("Compiled shader module '{}'", program.name);
        self.shader_modules.insert(program.name, module);
        Ok(())
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&CachedPipeline> {
        self.pipelines.get(key)
    }

    /// Creates the pipeline for `key` if it does not exist yet
    pub fn prepare(&mut self, key: &PipelineKey, source: PipelineSource<'_>) -> GfxResult<()> {
        if self.pipelines.contains_key(key) {
            return Ok(());
        }
        self.load_shader(source.vertex)?;
        self.load_shader(source.pixel)?;

        let vertex_group = self.group_layout("Vertex Constants", key.signature.vertex_entries());
        let pixel_group = self.group_layout("Pixel Resources", key.signature.pixel_entries());
        let (Some(vs_module), Some(ps_module)) = (
            self.shader_modules.get(source.vertex.name),
            self.shader_modules.get(source.pixel.name),
        ) else {
            return Err(GfxError::ResourceCreationFailed {
                kind: "render pipeline",
                reason: "shader module missing".into(),
            });
        };

        let pipeline_layout = self.device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&vertex_group, &pixel_group],
            push_constant_ranges: &[],
        });

        let attributes = source.layout.attributes();
        let vertex_buffer = VertexBufferLayout {
            array_stride: source.layout.stride() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: &attributes,
        };
        let label = format!("{} / {}", source.vertex.name, source.pixel.name);

        self.device.push_error_scope(ErrorFilter::Validation);
        let pipeline = self.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: vs_module,
                entry_point: Some(source.vertex.entry_point),
                buffers: &[vertex_buffer],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: ps_module,
                entry_point: Some(source.pixel.entry_point),
                targets: &[Some(ColorTargetState {
                    format: self.color_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: PrimitiveState {
                topology: key.topology.to_wgpu(),
                strip_index_format: match key.topology {
                    Topology::TriangleStrip => Some(IndexFormat::Uint32),
                    _ => None,
                },
                front_face: FrontFace::Ccw,
                cull_mode: if key.two_sided { None } else { Some(Face::Back) },
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(depth_stencil_state(key.depth_stencil)),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GfxError::ResourceCreationFailed {
                kind: "render pipeline",
                reason: error.to_string(),
            });
        }

        log::debug!("Created pipeline '{label}' ({} cached)", self.pipelines.len() + 1);
        self.pipelines.insert(
            key.clone(),
            CachedPipeline {
                pipeline,
                vertex_group,
                pixel_group,
            },
        );
        Ok(())
    }

    fn group_layout(&mut self, label: &str, entries: Vec<BindGroupLayoutEntry>) -> BindGroupLayout {
        let device = &self.device;
        self.group_layouts
            .entry(entries)
            .or_insert_with_key(|entries| {
                device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                    label: Some(label),
                    entries,
                })
            })
            .clone()
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn clear(&mut self) {
        self.pipelines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_entries_follow_binding_model() {
        let signature = BindSignature {
            vertex_constants: vec![0],
            pixel_constants: vec![1],
            textures: vec![0, 2],
            sampler: true,
        };
        let bindings: Vec<u32> = signature.pixel_entries().iter().map(|e| e.binding).collect();
        assert_eq!(bindings, [1, 4, 6, 8]);
        assert_eq!(signature.vertex_entries()[0].binding, 0);
    }

    #[test]
    fn test_depth_stencil_modes() {
        let off = depth_stencil_state(DepthStencilMode::Off);
        assert!(off.depth_write_enabled);
        assert!(!off.stencil.is_enabled());

        let write = depth_stencil_state(DepthStencilMode::Write);
        assert!(!write.depth_write_enabled);
        assert_eq!(write.stencil.front.pass_op, StencilOperation::Replace);

        let mask = depth_stencil_state(DepthStencilMode::Mask);
        assert_eq!(mask.depth_compare, CompareFunction::Always);
        assert_eq!(mask.stencil.front.compare, CompareFunction::NotEqual);
        assert_eq!(mask.stencil.write_mask, 0);
    }
}
