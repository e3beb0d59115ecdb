use super::super::context::{DepthStencilMode, GraphicsContext, ResourceId};
use crate::error::GfxResult;

/// Culling state. Two-sided rasterizers disable back-face culling.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    id: ResourceId,
    two_sided: bool,
}

impl Rasterizer {
    pub fn new(ctx: &mut dyn GraphicsContext, two_sided: bool) -> GfxResult<Self> {
        Ok(Self {
            id: ctx.create_rasterizer(two_sided)?,
            two_sided,
        })
    }

    pub fn bind(&self, ctx: &mut dyn GraphicsContext) -> GfxResult<()> {
        ctx.bind_rasterizer(self.id)
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn two_sided(&self) -> bool {
        self.two_sided
    }
}

#[derive(Debug, Clone)]
pub struct DepthStencil {
    id: ResourceId,
    mode: DepthStencilMode,
}

impl DepthStencil {
    pub fn new(ctx: &mut dyn GraphicsContext, mode: DepthStencilMode) -> GfxResult<Self> {
        Ok(Self {
            id: ctx.create_depth_stencil(mode)?,
            mode,
        })
    }

    pub fn bind(&self, ctx: &mut dyn GraphicsContext) -> GfxResult<()> {
        ctx.bind_depth_stencil(self.id)
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn mode(&self) -> DepthStencilMode {
        self.mode
    }
}
