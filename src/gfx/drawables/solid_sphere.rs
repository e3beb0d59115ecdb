//! Unlit sphere used as a light marker

use cgmath::{Matrix4, Vector3};

use crate::{
    error::Result,
    gfx::{
        bindable::{
            ConstantBuffer, DepthStencil, IndexBuffer, InputLayout, PixelShader, Rasterizer,
            TransformCbuf, VertexBuffer, VertexShader,
        },
        context::{DepthStencilMode, GraphicsContext, Topology},
        drawable::{BindingSet, Drawable, DrawableKind, StaticBindingRegistry, StaticBindings},
        geometry::generate_sphere,
        shaders,
        vertex::{ElementType, VertexLayout},
    },
};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SolidColor {
    color: [f32; 3],
    _padding: f32,
}

const MARKER_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// A sphere whose geometry, shaders and color are shared by every instance
///
/// Only the transform buffer is per instance. The radius of the first sphere
/// built against a registry is the radius of all of them.
#[derive(Debug)]
pub struct SolidSphere {
    bindings: BindingSet,
    position: Vector3<f32>,
}

impl SolidSphere {
    pub fn new(
        ctx: &mut dyn GraphicsContext,
        registry: &mut StaticBindingRegistry,
        radius: f32,
    ) -> Result<Self> {
        let (statics, _) = registry.get_or_try_init(DrawableKind::of::<SolidSphere>(), || {
            Self::create_statics(ctx, radius)
        })?;

        let bindings = BindingSet::builder("solid sphere")
            .with_statics(statics)
            .bind(TransformCbuf::new(ctx)?)
            .build()?;

        Ok(Self {
            bindings,
            position: Vector3::new(0.0, 0.0, 0.0),
        })
    }

    fn create_statics(ctx: &mut dyn GraphicsContext, radius: f32) -> Result<StaticBindings> {
        let mut geometry = generate_sphere(24, 12);
        geometry.transform(Matrix4::from_scale(radius));
        let layout = VertexLayout::new().append(ElementType::Position3D);

        let vs = VertexShader::new(ctx, shaders::SOLID_VS)?;
        let input_layout = InputLayout::new(ctx, layout.clone(), &vs)?;
        let color = SolidColor {
            color: MARKER_COLOR,
            _padding: 0.0,
        };

        Ok(StaticBindings::new(vec![
            VertexBuffer::new(ctx, &geometry.to_vertex_data(&layout))?.into(),
            IndexBuffer::new(ctx, &geometry.indices)?.into(),
            vs.into(),
            PixelShader::new(ctx, shaders::SOLID_PS)?.into(),
            input_layout.into(),
            ConstantBuffer::pixel(ctx, 1, &color)?.into(),
            Topology::TriangleList.into(),
            Rasterizer::new(ctx, false)?.into(),
            DepthStencil::new(ctx, DepthStencilMode::Off)?.into(),
        ]))
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }
}

impl Drawable for SolidSphere {
    fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    fn transform(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
    }
}
