use cgmath::Matrix4;

use super::super::context::{GraphicsContext, ResourceId, ShaderStage};
use crate::error::GfxResult;

/// Constant buffer bound to one shader stage at a fixed slot
///
/// Contents can be replaced with [`ConstantBuffer::update`]; the resource id
/// stays the same, so every drawable that shares the buffer sees the change.
#[derive(Debug, Clone)]
pub struct ConstantBuffer {
    id: ResourceId,
    stage: ShaderStage,
    slot: u32,
}

impl ConstantBuffer {
    pub fn new<T: bytemuck::Pod>(
        ctx: &mut dyn GraphicsContext,
        stage: ShaderStage,
        slot: u32,
        contents: &T,
    ) -> GfxResult<Self> {
        let id = ctx.create_constant_buffer(stage, bytemuck::bytes_of(contents))?;
        Ok(Self { id, stage, slot })
    }

    /// Shorthand for a pixel-stage buffer
    pub fn pixel<T: bytemuck::Pod>(
        ctx: &mut dyn GraphicsContext,
        slot: u32,
        contents: &T,
    ) -> GfxResult<Self> {
        Self::new(ctx, ShaderStage::Pixel, slot, contents)
    }

    /// Shorthand for a vertex-stage buffer
    pub fn vertex<T: bytemuck::Pod>(
        ctx: &mut dyn GraphicsContext,
        slot: u32,
        contents: &T,
    ) -> GfxResult<Self> {
        Self::new(ctx, ShaderStage::Vertex, slot, contents)
    }

    pub fn update<T: bytemuck::Pod>(
        &self,
        ctx: &mut dyn GraphicsContext,
        contents: &T,
    ) -> GfxResult<()> {
        ctx.update_constant_buffer(self.id, bytemuck::bytes_of(contents))
    }

    pub fn bind(&self, ctx: &mut dyn GraphicsContext) -> GfxResult<()> {
        ctx.bind_constant_buffer(self.stage, self.slot, self.id)
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }
}

/// Matrices consumed by every vertex shader at `@group(0) @binding(0)`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformConstants {
    pub model_view: [[f32; 4]; 4],
    pub model_view_proj: [[f32; 4]; 4],
}

impl TransformConstants {
    pub fn new(model: Matrix4<f32>, view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        let model_view = view * model;
        Self {
            model_view: model_view.into(),
            model_view_proj: (projection * model_view).into(),
        }
    }
}

/// Per-instance transform buffer
///
/// Refreshed from the drawable's world matrix and the context's camera and
/// projection every time it is activated. Optionally also bound into a pixel
/// slot for shaders that need view-space data in the fragment stage.
#[derive(Debug, Clone)]
pub struct TransformCbuf {
    buffer: ConstantBuffer,
    pixel_slot: Option<u32>,
}

impl TransformCbuf {
    pub const VERTEX_SLOT: u32 = 0;

    pub fn new(ctx: &mut dyn GraphicsContext) -> GfxResult<Self> {
        Self::with_slots(ctx, Self::VERTEX_SLOT, None)
    }

    pub fn with_slots(
        ctx: &mut dyn GraphicsContext,
        vertex_slot: u32,
        pixel_slot: Option<u32>,
    ) -> GfxResult<Self> {
        let initial: TransformConstants = bytemuck::Zeroable::zeroed();
        let buffer = ConstantBuffer::vertex(ctx, vertex_slot, &initial)?;
        Ok(Self { buffer, pixel_slot })
    }

    pub fn activate(&self, ctx: &mut dyn GraphicsContext, model: &Matrix4<f32>) -> GfxResult<()> {
        let constants = TransformConstants::new(*model, ctx.camera(), ctx.projection());
        self.buffer.update(ctx, &constants)?;
        self.buffer.bind(ctx)?;
        if let Some(slot) = self.pixel_slot {
            ctx.bind_constant_buffer(ShaderStage::Pixel, slot, self.buffer.id())?;
        }
        Ok(())
    }

    pub fn id(&self) -> ResourceId {
        self.buffer.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::recording::RecordingContext;
    use cgmath::Vector3;

    #[test]
    fn test_update_keeps_identity() {
        let mut ctx = RecordingContext::new();
        let cb = ConstantBuffer::pixel(&mut ctx, 1, &[1.0f32, 2.0, 3.0, 4.0]).unwrap();
        let before = cb.id();
        cb.update(&mut ctx, &[5.0f32, 6.0, 7.0, 8.0]).unwrap();
        assert_eq!(cb.id(), before);
        let data: [f32; 4] = bytemuck::pod_read_unaligned(ctx.constant_data(before).unwrap());
        assert_eq!(data, [5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_transform_constants_compose_view_and_projection() {
        let model = Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0));
        let view = Matrix4::from_translation(Vector3::new(0.0, 0.0, -5.0));
        let projection = Matrix4::from_scale(2.0);
        let constants = TransformConstants::new(model, view, projection);

        assert_eq!(constants.model_view[3], [1.0, 0.0, -5.0, 1.0]);
        assert_eq!(constants.model_view_proj[3], [2.0, 0.0, -10.0, 1.0]);
    }

    #[test]
    fn test_transform_cbuf_uploads_world_matrix() {
        let mut ctx = RecordingContext::new();
        let cbuf = TransformCbuf::with_slots(&mut ctx, 0, Some(2)).unwrap();
        let model = Matrix4::from_translation(Vector3::new(0.0, 3.0, 0.0));
        cbuf.activate(&mut ctx, &model).unwrap();

        let data: TransformConstants =
            bytemuck::pod_read_unaligned(ctx.constant_data(cbuf.id()).unwrap());
        let expected: [[f32; 4]; 4] = model.into();
        assert_eq!(data.model_view, expected);
    }
}
