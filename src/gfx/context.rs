//! Rendering context abstraction
//!
//! Bindables and drawables never talk to wgpu directly. They create and bind
//! resources through [`GraphicsContext`], which hands out opaque
//! [`ResourceId`] handles. The wgpu [`RenderEngine`](super::RenderEngine)
//! implements it for real rendering and [`RecordingContext`](super::RecordingContext)
//! implements it headlessly for tests and dry runs.
//!
//! Binding model (mirrors what the shaders in `gfx/shaders` declare):
//!
//! | Resource              | Stage    | WGSL location                  |
//! |-----------------------|----------|--------------------------------|
//! | constant buffer slot n| vertex   | `@group(0) @binding(n)`        |
//! | constant buffer slot n| pixel    | `@group(1) @binding(n)`        |
//! | texture slot n        | pixel    | `@group(1) @binding(4 + n)`    |
//! | sampler               | pixel    | `@group(1) @binding(8)`        |

use std::{collections::BTreeMap, path::Path};

use cgmath::Matrix4;

use super::vertex::VertexLayout;
use crate::error::{GfxError, GfxResult};

/// Number of constant buffer slots per stage
pub const MAX_CONSTANT_SLOTS: u32 = 4;
/// Number of texture slots visible to the pixel stage
pub const MAX_TEXTURE_SLOTS: u32 = 4;
/// Bind group binding of the first texture slot
pub const TEXTURE_BINDING_BASE: u32 = MAX_CONSTANT_SLOTS;
/// Bind group binding of the sampler
pub const SAMPLER_BINDING: u32 = TEXTURE_BINDING_BASE + MAX_TEXTURE_SLOTS;

/// Handle to a resource owned by a [`GraphicsContext`]
///
/// Two bindables that hold the same id share the same GPU object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) u64);

impl ResourceId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Monotonic id source shared by context implementations
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn allocate(&mut self) -> ResourceId {
        self.next += 1;
        ResourceId(self.next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    #[default]
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

impl Topology {
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
            Topology::LineList => wgpu::PrimitiveTopology::LineList,
            Topology::PointList => wgpu::PrimitiveTopology::PointList,
        }
    }
}

/// Depth-stencil state
///
/// `Off` disables the stencil and keeps the ordinary depth test and depth write.
/// `Write` marks covered pixels in the stencil buffer without writing depth.
/// `Mask` only draws where the stencil was not marked and ignores depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthStencilMode {
    #[default]
    Off,
    Write,
    Mask,
}

/// A shader entry point compiled from WGSL source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderProgram {
    /// Module name, used to share one compiled module between entry points
    pub name: &'static str,
    pub source: &'static str,
    pub entry_point: &'static str,
}

/// Result of a texture load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub id: ResourceId,
    /// True when any texel has alpha below 1.0
    pub has_alpha: bool,
}

/// Resource creation, binding and draw submission
///
/// Every method that can fail reports a [`GfxError`](crate::error::GfxError);
/// callers do not retry.
pub trait GraphicsContext {
    fn create_vertex_buffer(&mut self, layout: &VertexLayout, data: &[u8]) -> GfxResult<ResourceId>;
    fn create_index_buffer(&mut self, indices: &[u32]) -> GfxResult<ResourceId>;
    fn create_shader(&mut self, stage: ShaderStage, program: &ShaderProgram)
        -> GfxResult<ResourceId>;
    /// Loads an image file. `srgb` selects the color-space of the GPU texture.
    fn create_texture(&mut self, path: &Path, srgb: bool) -> GfxResult<TextureInfo>;
    fn create_sampler(&mut self) -> GfxResult<ResourceId>;
    fn create_constant_buffer(&mut self, stage: ShaderStage, data: &[u8]) -> GfxResult<ResourceId>;
    /// Replaces the contents of a constant buffer without changing its id
    fn update_constant_buffer(&mut self, id: ResourceId, data: &[u8]) -> GfxResult<()>;
    fn create_rasterizer(&mut self, two_sided: bool) -> GfxResult<ResourceId>;
    fn create_depth_stencil(&mut self, mode: DepthStencilMode) -> GfxResult<ResourceId>;
    fn create_input_layout(
        &mut self,
        layout: &VertexLayout,
        vertex_shader: ResourceId,
    ) -> GfxResult<ResourceId>;

    fn bind_vertex_buffer(&mut self, id: ResourceId) -> GfxResult<()>;
    fn bind_index_buffer(&mut self, id: ResourceId) -> GfxResult<()>;
    fn bind_vertex_shader(&mut self, id: ResourceId) -> GfxResult<()>;
    fn bind_pixel_shader(&mut self, id: ResourceId) -> GfxResult<()>;
    fn bind_texture(&mut self, slot: u32, id: ResourceId) -> GfxResult<()>;
    fn bind_sampler(&mut self, id: ResourceId) -> GfxResult<()>;
    fn bind_constant_buffer(&mut self, stage: ShaderStage, slot: u32, id: ResourceId)
        -> GfxResult<()>;
    fn bind_rasterizer(&mut self, id: ResourceId) -> GfxResult<()>;
    fn bind_depth_stencil(&mut self, id: ResourceId) -> GfxResult<()>;
    fn bind_input_layout(&mut self, id: ResourceId) -> GfxResult<()>;
    fn set_topology(&mut self, topology: Topology) -> GfxResult<()>;

    /// Draws `index_count` indices with everything currently bound
    fn draw_indexed(&mut self, index_count: u32) -> GfxResult<()>;

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> GfxResult<()>;
    fn end_frame(&mut self) -> GfxResult<()>;

    /// View matrix used by transform constant buffers
    fn camera(&self) -> Matrix4<f32>;
    fn set_camera(&mut self, view: Matrix4<f32>);
    fn projection(&self) -> Matrix4<f32>;
    fn set_projection(&mut self, projection: Matrix4<f32>);
}

/// Pipeline state accumulated by bind calls since the last draw
///
/// Bindings persist across draws, like a device context: a draw that does not
/// rebind the pixel shader reuses the previous one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundState {
    pub vertex_buffer: Option<ResourceId>,
    pub index_buffer: Option<ResourceId>,
    pub vertex_shader: Option<ResourceId>,
    pub pixel_shader: Option<ResourceId>,
    pub input_layout: Option<ResourceId>,
    pub rasterizer: Option<ResourceId>,
    pub depth_stencil: Option<ResourceId>,
    pub sampler: Option<ResourceId>,
    pub topology: Topology,
    pub textures: BTreeMap<u32, ResourceId>,
    pub vertex_constants: BTreeMap<u32, ResourceId>,
    pub pixel_constants: BTreeMap<u32, ResourceId>,
}

impl BoundState {
    /// Checks that the state is complete enough to issue an indexed draw
    pub fn check_drawable(&self) -> GfxResult<()> {
        if self.vertex_buffer.is_none() {
            return Err(GfxError::IncompletePipeline("vertex buffer"));
        }
        if self.index_buffer.is_none() {
            return Err(GfxError::IncompletePipeline("index buffer"));
        }
        if self.vertex_shader.is_none() {
            return Err(GfxError::IncompletePipeline("vertex shader"));
        }
        if self.pixel_shader.is_none() {
            return Err(GfxError::IncompletePipeline("pixel shader"));
        }
        if self.input_layout.is_none() {
            return Err(GfxError::IncompletePipeline("input layout"));
        }
        Ok(())
    }

    pub fn constants(&self, stage: ShaderStage) -> &BTreeMap<u32, ResourceId> {
        match stage {
            ShaderStage::Vertex => &self.vertex_constants,
            ShaderStage::Pixel => &self.pixel_constants,
        }
    }

    pub fn constants_mut(&mut self, stage: ShaderStage) -> &mut BTreeMap<u32, ResourceId> {
        match stage {
            ShaderStage::Vertex => &mut self.vertex_constants,
            ShaderStage::Pixel => &mut self.pixel_constants,
        }
    }
}
