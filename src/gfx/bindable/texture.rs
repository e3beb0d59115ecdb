use std::path::Path;

use super::super::context::{GraphicsContext, ResourceId};
use crate::error::GfxResult;

/// Image texture bound to a pixel-stage slot
///
/// Slot 0 holds color data and is uploaded as sRGB; other slots hold
/// linear data (specular, normals).
#[derive(Debug, Clone)]
pub struct Texture {
    id: ResourceId,
    slot: u32,
    has_alpha: bool,
}

impl Texture {
    pub fn new(ctx: &mut dyn GraphicsContext, path: &Path, slot: u32) -> GfxResult<Self> {
        let info = ctx.create_texture(path, slot == 0)?;
        Ok(Self {
            id: info.id,
            slot,
            has_alpha: info.has_alpha,
        })
    }

    pub fn bind(&self, ctx: &mut dyn GraphicsContext) -> GfxResult<()> {
        ctx.bind_texture(self.slot, self.id)
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }
}

/// Linear-filtered, repeating sampler shared by all texture slots
#[derive(Debug, Clone)]
pub struct Sampler {
    id: ResourceId,
}

impl Sampler {
    pub fn new(ctx: &mut dyn GraphicsContext) -> GfxResult<Self> {
        Ok(Self {
            id: ctx.create_sampler()?,
        })
    }

    pub fn bind(&self, ctx: &mut dyn GraphicsContext) -> GfxResult<()> {
        ctx.bind_sampler(self.id)
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }
}
