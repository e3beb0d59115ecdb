//! Headless graphics context
//!
//! [`RecordingContext`] implements [`GraphicsContext`] without a GPU. It hands
//! out resource ids, validates every bind against the kind of resource it was
//! created as, and records what was bound at each draw. Tests use it to observe
//! resource sharing through handle identity.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::{Path, PathBuf},
};

use cgmath::{Matrix4, SquareMatrix};

use super::{
    context::{
        BoundState, DepthStencilMode, GraphicsContext, IdAllocator, ResourceId, ShaderProgram,
        ShaderStage, TextureInfo, Topology,
    },
    vertex::VertexLayout,
};
use crate::error::{GfxError, GfxResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    VertexBuffer,
    IndexBuffer,
    VertexShader,
    PixelShader,
    Texture,
    Sampler,
    ConstantBuffer,
    Rasterizer,
    DepthStencil,
    InputLayout,
}

impl ResourceKind {
    fn name(self) -> &'static str {
        match self {
            ResourceKind::VertexBuffer => "vertex buffer",
            ResourceKind::IndexBuffer => "index buffer",
            ResourceKind::VertexShader => "vertex shader",
            ResourceKind::PixelShader => "pixel shader",
            ResourceKind::Texture => "texture",
            ResourceKind::Sampler => "sampler",
            ResourceKind::ConstantBuffer => "constant buffer",
            ResourceKind::Rasterizer => "rasterizer state",
            ResourceKind::DepthStencil => "depth-stencil state",
            ResourceKind::InputLayout => "input layout",
        }
    }
}

#[derive(Debug, Clone)]
struct RecordedResource {
    kind: ResourceKind,
    data: Vec<u8>,
}

/// A draw call and the state it was issued with
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub index_count: u32,
    pub bound: BoundState,
    /// Contents of every bound constant buffer at the time of the draw
    pub constants: BTreeMap<(u32, bool), Vec<u8>>,
}

impl DrawCall {
    /// Contents of the vertex-stage constant buffer at `slot`
    pub fn vertex_constant(&self, slot: u32) -> Option<&[u8]> {
        self.constants.get(&(slot, false)).map(|d| d.as_slice())
    }

    /// Contents of the pixel-stage constant buffer at `slot`
    pub fn pixel_constant(&self, slot: u32) -> Option<&[u8]> {
        self.constants.get(&(slot, true)).map(|d| d.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginFrame,
    Draw(DrawCall),
    EndFrame,
}

/// Graphics context that records instead of rendering
///
/// Unlike the GPU backend, draws are accepted outside `begin_frame`/`end_frame`
/// so tests can drive drawables directly.
#[derive(Debug)]
pub struct RecordingContext {
    ids: IdAllocator,
    resources: HashMap<ResourceId, RecordedResource>,
    texture_paths: HashMap<ResourceId, PathBuf>,
    alpha_textures: HashSet<PathBuf>,
    bound: BoundState,
    commands: Vec<Command>,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            ids: IdAllocator::default(),
            resources: HashMap::new(),
            texture_paths: HashMap::new(),
            alpha_textures: HashSet::new(),
            bound: BoundState::default(),
            commands: Vec::new(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
        }
    }

    /// Makes textures loaded from `path` report an alpha channel
    pub fn with_alpha_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.alpha_textures.insert(path.into());
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|c| match c {
            Command::Draw(draw) => Some(draw),
            _ => None,
        })
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of resources of `kind` created so far
    pub fn created(&self, kind: ResourceKind) -> usize {
        self.resources.values().filter(|r| r.kind == kind).count()
    }

    pub fn kind_of(&self, id: ResourceId) -> Option<ResourceKind> {
        self.resources.get(&id).map(|r| r.kind)
    }

    pub fn texture_path(&self, id: ResourceId) -> Option<&Path> {
        self.texture_paths.get(&id).map(|p| p.as_path())
    }

    /// Current contents of a constant buffer
    pub fn constant_data(&self, id: ResourceId) -> Option<&[u8]> {
        self.resources
            .get(&id)
            .filter(|r| r.kind == ResourceKind::ConstantBuffer)
            .map(|r| r.data.as_slice())
    }

    fn insert(&mut self, kind: ResourceKind, data: Vec<u8>) -> ResourceId {
        let id = self.ids.allocate();
        self.resources.insert(id, RecordedResource { kind, data });
        id
    }

    fn expect_kind(&self, id: ResourceId, kind: ResourceKind) -> GfxResult<()> {
        match self.resources.get(&id) {
            None => Err(GfxError::UnknownResource(id)),
            Some(r) if r.kind != kind => Err(GfxError::WrongResourceKind {
                id,
                expected: kind.name(),
            }),
            Some(_) => Ok(()),
        }
    }
}

impl GraphicsContext for RecordingContext {
    fn create_vertex_buffer(&mut self, _layout: &VertexLayout, data: &[u8]) -> GfxResult<ResourceId> {
        Ok(self.insert(ResourceKind::VertexBuffer, data.to_vec()))
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> GfxResult<ResourceId> {
        Ok(self.insert(
            ResourceKind::IndexBuffer,
            bytemuck::cast_slice(indices).to_vec(),
        ))
    }

    fn create_shader(
        &mut self,
        stage: ShaderStage,
        _program: &ShaderProgram,
    ) -> GfxResult<ResourceId> {
        let kind = match stage {
            ShaderStage::Vertex => ResourceKind::VertexShader,
            ShaderStage::Pixel => ResourceKind::PixelShader,
        };
        Ok(self.insert(kind, Vec::new()))
    }

    fn create_texture(&mut self, path: &Path, _srgb: bool) -> GfxResult<TextureInfo> {
        let id = self.insert(ResourceKind::Texture, Vec::new());
        self.texture_paths.insert(id, path.to_path_buf());
        Ok(TextureInfo {
            id,
            has_alpha: self.alpha_textures.contains(path),
        })
    }

    fn create_sampler(&mut self) -> GfxResult<ResourceId> {
        Ok(self.insert(ResourceKind::Sampler, Vec::new()))
    }

    fn create_constant_buffer(&mut self, _stage: ShaderStage, data: &[u8]) -> GfxResult<ResourceId> {
        Ok(self.insert(ResourceKind::ConstantBuffer, data.to_vec()))
    }

    fn update_constant_buffer(&mut self, id: ResourceId, data: &[u8]) -> GfxResult<()> {
        self.expect_kind(id, ResourceKind::ConstantBuffer)?;
        if let Some(resource) = self.resources.get_mut(&id) {
            resource.data = data.to_vec();
        }
        Ok(())
    }

    fn create_rasterizer(&mut self, two_sided: bool) -> GfxResult<ResourceId> {
        Ok(self.insert(ResourceKind::Rasterizer, vec![two_sided as u8]))
    }

    fn create_depth_stencil(&mut self, mode: DepthStencilMode) -> GfxResult<ResourceId> {
        Ok(self.insert(ResourceKind::DepthStencil, vec![mode as u8]))
    }

    fn create_input_layout(
        &mut self,
        _layout: &VertexLayout,
        vertex_shader: ResourceId,
    ) -> GfxResult<ResourceId> {
        self.expect_kind(vertex_shader, ResourceKind::VertexShader)?;
        Ok(self.insert(ResourceKind::InputLayout, Vec::new()))
    }

    fn bind_vertex_buffer(&mut self, id: ResourceId) -> GfxResult<()> {
        self.expect_kind(id, ResourceKind::VertexBuffer)?;
        self.bound.vertex_buffer = Some(id);
        Ok(())
    }

    fn bind_index_buffer(&mut self, id: ResourceId) -> GfxResult<()> {
        self.expect_kind(id, ResourceKind::IndexBuffer)?;
        self.bound.index_buffer = Some(id);
        Ok(())
    }

    fn bind_vertex_shader(&mut self, id: ResourceId) -> GfxResult<()> {
        self.expect_kind(id, ResourceKind::VertexShader)?;
        self.bound.vertex_shader = Some(id);
        Ok(())
    }

    fn bind_pixel_shader(&mut self, id: ResourceId) -> GfxResult<()> {
        self.expect_kind(id, ResourceKind::PixelShader)?;
        self.bound.pixel_shader = Some(id);
        Ok(())
    }

    fn bind_texture(&mut self, slot: u32, id: ResourceId) -> GfxResult<()> {
        self.expect_kind(id, ResourceKind::Texture)?;
        self.bound.textures.insert(slot, id);
        Ok(())
    }

    fn bind_sampler(&mut self, id: ResourceId) -> GfxResult<()> {
        self.expect_kind(id, ResourceKind::Sampler)?;
        self.bound.sampler = Some(id);
        Ok(())
    }

    fn bind_constant_buffer(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        id: ResourceId,
    ) -> GfxResult<()> {
        self.expect_kind(id, ResourceKind::ConstantBuffer)?;
        self.bound.constants_mut(stage).insert(slot, id);
        Ok(())
    }

    fn bind_rasterizer(&mut self, id: ResourceId) -> GfxResult<()> {
        self.expect_kind(id, ResourceKind::Rasterizer)?;
        self.bound.rasterizer = Some(id);
        Ok(())
    }

    fn bind_depth_stencil(&mut self, id: ResourceId) -> GfxResult<()> {
        self.expect_kind(id, ResourceKind::DepthStencil)?;
        self.bound.depth_stencil = Some(id);
        Ok(())
    }

    fn bind_input_layout(&mut self, id: ResourceId) -> GfxResult<()> {
        self.expect_kind(id, ResourceKind::InputLayout)?;
        self.bound.input_layout = Some(id);
        Ok(())
    }

    fn set_topology(&mut self, topology: Topology) -> GfxResult<()> {
        self.bound.topology = topology;
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> GfxResult<()> {
        self.bound.check_drawable()?;

        let mut constants = BTreeMap::new();
        for (stage, pixel) in [(ShaderStage::Vertex, false), (ShaderStage::Pixel, true)] {
            for (slot, id) in self.bound.constants(stage) {
                if let Some(data) = self.constant_data(*id) {
                    constants.insert((*slot, pixel), data.to_vec());
                }
            }
        }

        self.commands.push(Command::Draw(DrawCall {
            index_count,
            bound: self.bound.clone(),
            constants,
        }));
        Ok(())
    }

    fn begin_frame(&mut self, _clear_color: [f32; 4]) -> GfxResult<()> {
        self.commands.push(Command::BeginFrame);
        Ok(())
    }

    fn end_frame(&mut self) -> GfxResult<()> {
        self.commands.push(Command::EndFrame);
        self.bound = BoundState::default();
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::vertex::ElementType;

    const PROGRAM: ShaderProgram = ShaderProgram {
        name: "test",
        source: "",
        entry_point: "vs_main",
    };

    #[test]
    fn test_bind_rejects_wrong_kind() {
        let mut ctx = RecordingContext::new();
        let sampler = ctx.create_sampler().unwrap();
        let err = ctx.bind_vertex_buffer(sampler).unwrap_err();
        assert!(matches!(err, GfxError::WrongResourceKind { .. }));
    }

    #[test]
    fn test_bind_rejects_unknown_id() {
        let mut ctx = RecordingContext::new();
        let err = ctx.bind_sampler(ResourceId(99)).unwrap_err();
        assert!(matches!(err, GfxError::UnknownResource(ResourceId(99))));
    }

    #[test]
    fn test_draw_requires_complete_state() {
        let mut ctx = RecordingContext::new();
        let layout = VertexLayout::new().append(ElementType::Position3D);
        let vb = ctx.create_vertex_buffer(&layout, &[0; 12]).unwrap();
        ctx.bind_vertex_buffer(vb).unwrap();
        let err = ctx.draw_indexed(3).unwrap_err();
        assert!(matches!(err, GfxError::IncompletePipeline("index buffer")));
    }

    #[test]
    fn test_draw_snapshots_constant_contents() {
        let mut ctx = RecordingContext::new();
        let layout = VertexLayout::new().append(ElementType::Position3D);
        let vb = ctx.create_vertex_buffer(&layout, &[0; 36]).unwrap();
        let ib = ctx.create_index_buffer(&[0, 1, 2]).unwrap();
        let vs = ctx.create_shader(ShaderStage::Vertex, &PROGRAM).unwrap();
        let ps = ctx.create_shader(ShaderStage::Pixel, &PROGRAM).unwrap();
        let il = ctx.create_input_layout(&layout, vs).unwrap();
        let cb = ctx.create_constant_buffer(ShaderStage::Pixel, &[1, 2, 3, 4]).unwrap();
        for bind in [
            ctx.bind_vertex_buffer(vb),
            ctx.bind_index_buffer(ib),
            ctx.bind_vertex_shader(vs),
            ctx.bind_pixel_shader(ps),
            ctx.bind_input_layout(il),
            ctx.bind_constant_buffer(ShaderStage::Pixel, 1, cb),
        ] {
            bind.unwrap();
        }

        ctx.draw_indexed(3).unwrap();
        ctx.update_constant_buffer(cb, &[9, 9, 9, 9]).unwrap();
        ctx.draw_indexed(3).unwrap();

        let draws: Vec<_> = ctx.draw_calls().collect();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].pixel_constant(1), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(draws[1].pixel_constant(1), Some(&[9u8, 9, 9, 9][..]));
        assert_eq!(ctx.created(ResourceKind::ConstantBuffer), 1);
    }
}
