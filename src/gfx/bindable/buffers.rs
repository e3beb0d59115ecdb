use super::super::{
    context::{GraphicsContext, ResourceId},
    vertex::{VertexData, VertexLayout},
};
use crate::error::GfxResult;

/// Interleaved vertex data uploaded to the GPU
#[derive(Debug, Clone)]
pub struct VertexBuffer {
    id: ResourceId,
    layout: VertexLayout,
    vertex_count: usize,
}

impl VertexBuffer {
    pub fn new(ctx: &mut dyn GraphicsContext, data: &VertexData) -> GfxResult<Self> {
        let id = ctx.create_vertex_buffer(data.layout(), data.as_bytes())?;
        Ok(Self {
            id,
            layout: data.layout().clone(),
            vertex_count: data.len(),
        })
    }

    pub fn bind(&self, ctx: &mut dyn GraphicsContext) -> GfxResult<()> {
        ctx.bind_vertex_buffer(self.id)
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

/// 32-bit index buffer. Its length is the draw call's index count.
#[derive(Debug, Clone)]
pub struct IndexBuffer {
    id: ResourceId,
    count: u32,
}

impl IndexBuffer {
    pub fn new(ctx: &mut dyn GraphicsContext, indices: &[u32]) -> GfxResult<Self> {
        let id = ctx.create_index_buffer(indices)?;
        Ok(Self {
            id,
            count: indices.len() as u32,
        })
    }

    pub fn bind(&self, ctx: &mut dyn GraphicsContext) -> GfxResult<()> {
        ctx.bind_index_buffer(self.id)
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
