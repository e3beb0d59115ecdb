use super::super::{
    context::{GraphicsContext, ResourceId, ShaderProgram, ShaderStage},
    vertex::VertexLayout,
};
use crate::error::GfxResult;

#[derive(Debug, Clone)]
pub struct VertexShader {
    id: ResourceId,
    program: ShaderProgram,
}

impl VertexShader {
    pub fn new(ctx: &mut dyn GraphicsContext, program: ShaderProgram) -> GfxResult<Self> {
        let id = ctx.create_shader(ShaderStage::Vertex, &program)?;
        Ok(Self { id, program })
    }

    pub fn bind(&self, ctx: &mut dyn GraphicsContext) -> GfxResult<()> {
        ctx.bind_vertex_shader(self.id)
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }
}

#[derive(Debug, Clone)]
pub struct PixelShader {
    id: ResourceId,
    program: ShaderProgram,
}

impl PixelShader {
    pub fn new(ctx: &mut dyn GraphicsContext, program: ShaderProgram) -> GfxResult<Self> {
        let id = ctx.create_shader(ShaderStage::Pixel, &program)?;
        Ok(Self { id, program })
    }

    pub fn bind(&self, ctx: &mut dyn GraphicsContext) -> GfxResult<()> {
        ctx.bind_pixel_shader(self.id)
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }
}

/// Ties a vertex layout to the vertex shader that consumes it
#[derive(Debug, Clone)]
pub struct InputLayout {
    id: ResourceId,
    layout: VertexLayout,
}

impl InputLayout {
    pub fn new(
        ctx: &mut dyn GraphicsContext,
        layout: VertexLayout,
        vertex_shader: &VertexShader,
    ) -> GfxResult<Self> {
        let id = ctx.create_input_layout(&layout, vertex_shader.id())?;
        Ok(Self { id, layout })
    }

    pub fn bind(&self, ctx: &mut dyn GraphicsContext) -> GfxResult<()> {
        ctx.bind_input_layout(self.id)
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }
}
