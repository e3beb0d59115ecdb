//! # Bindables
//!
//! A [`Bindable`] is one fragment of pipeline state: a buffer, a shader, a
//! texture, a sampler or a piece of fixed-function state. Drawables own an
//! ordered list of them and activate each one before issuing their draw.
//!
//! Bindables are immutable once created. The only exception is constant
//! buffer contents, which can be re-uploaded through [`ConstantBuffer::update`]
//! without changing the buffer's identity.

mod buffers;
mod constant_buffer;
mod shader;
mod state;
mod texture;

use cgmath::Matrix4;

pub use buffers::{IndexBuffer, VertexBuffer};
pub use constant_buffer::{ConstantBuffer, TransformCbuf, TransformConstants};
pub use shader::{InputLayout, PixelShader, VertexShader};
pub use state::{DepthStencil, Rasterizer};
pub use texture::{Sampler, Texture};

use super::context::{GraphicsContext, Topology};
use crate::error::GfxResult;

#[derive(Debug, Clone)]
pub enum Bindable {
    VertexBuffer(VertexBuffer),
    IndexBuffer(IndexBuffer),
    VertexShader(VertexShader),
    PixelShader(PixelShader),
    Texture(Texture),
    Sampler(Sampler),
    ConstantBuffer(ConstantBuffer),
    TransformCbuf(TransformCbuf),
    Rasterizer(Rasterizer),
    DepthStencil(DepthStencil),
    InputLayout(InputLayout),
    Topology(Topology),
}

impl Bindable {
    /// Binds the resource at its slot
    ///
    /// `transform` is the world matrix of the drawable being submitted; only
    /// transform buffers read it.
    pub fn activate(
        &self,
        ctx: &mut dyn GraphicsContext,
        transform: &Matrix4<f32>,
    ) -> GfxResult<()> {
        match self {
            Bindable::VertexBuffer(b) => b.bind(ctx),
            Bindable::IndexBuffer(b) => b.bind(ctx),
            Bindable::VertexShader(b) => b.bind(ctx),
            Bindable::PixelShader(b) => b.bind(ctx),
            Bindable::Texture(b) => b.bind(ctx),
            Bindable::Sampler(b) => b.bind(ctx),
            Bindable::ConstantBuffer(b) => b.bind(ctx),
            Bindable::TransformCbuf(b) => b.activate(ctx, transform),
            Bindable::Rasterizer(b) => b.bind(ctx),
            Bindable::DepthStencil(b) => b.bind(ctx),
            Bindable::InputLayout(b) => b.bind(ctx),
            Bindable::Topology(t) => ctx.set_topology(*t),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Bindable::VertexBuffer(_) => "VertexBuffer",
            Bindable::IndexBuffer(_) => "IndexBuffer",
            Bindable::VertexShader(_) => "VertexShader",
            Bindable::PixelShader(_) => "PixelShader",
            Bindable::Texture(_) => "Texture",
            Bindable::Sampler(_) => "Sampler",
            Bindable::ConstantBuffer(_) => "ConstantBuffer",
            Bindable::TransformCbuf(_) => "TransformCbuf",
            Bindable::Rasterizer(_) => "Rasterizer",
            Bindable::DepthStencil(_) => "DepthStencil",
            Bindable::InputLayout(_) => "InputLayout",
            Bindable::Topology(_) => "Topology",
        }
    }

    pub fn as_index_buffer(&self) -> Option<&IndexBuffer> {
        match self {
            Bindable::IndexBuffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_constant_buffer(&self) -> Option<&ConstantBuffer> {
        match self {
            Bindable::ConstantBuffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&Texture> {
        match self {
            Bindable::Texture(b) => Some(b),
            _ => None,
        }
    }
}

macro_rules! impl_from_bindable {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Bindable {
                fn from(value: $ty) -> Self {
                    Bindable::$ty(value)
                }
            }
        )*
    };
}

impl_from_bindable!(
    VertexBuffer,
    IndexBuffer,
    VertexShader,
    PixelShader,
    Texture,
    Sampler,
    ConstantBuffer,
    TransformCbuf,
    Rasterizer,
    DepthStencil,
    InputLayout,
    Topology
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        context::DepthStencilMode,
        recording::{RecordingContext, ResourceKind},
    };
    use cgmath::SquareMatrix;

    #[test]
    fn test_activate_dispatches_by_kind() {
        let mut ctx = RecordingContext::new();
        let state: Vec<Bindable> = vec![
            DepthStencil::new(&mut ctx, DepthStencilMode::Off).unwrap().into(),
            Rasterizer::new(&mut ctx, true).unwrap().into(),
            Topology::LineList.into(),
        ];
        for b in &state {
            b.activate(&mut ctx, &Matrix4::identity()).unwrap();
        }
        assert_eq!(ctx.created(ResourceKind::DepthStencil), 1);
        assert_eq!(ctx.created(ResourceKind::Rasterizer), 1);
        assert_eq!(state[2].kind_name(), "Topology");
    }

    #[test]
    fn test_index_buffer_downcast() {
        let mut ctx = RecordingContext::new();
        let ib: Bindable = IndexBuffer::new(&mut ctx, &[0, 1, 2, 2, 3, 0]).unwrap().into();
        assert_eq!(ib.as_index_buffer().map(|b| b.count()), Some(6));
        assert!(ib.as_constant_buffer().is_none());
    }
}
