//! Textured, normal-mapped plane with a live material panel

use std::path::Path;

use cgmath::{Matrix4, Vector3};

use crate::{
    error::{GfxResult, Result},
    gfx::{
        bindable::{
            ConstantBuffer, DepthStencil, IndexBuffer, InputLayout, PixelShader, Rasterizer, Sampler,
            Texture, TransformCbuf, VertexBuffer, VertexShader,
        },
        context::{DepthStencilMode, GraphicsContext, Topology},
        drawable::{BindingSet, Drawable},
        geometry::generate_plane,
        shaders,
    },
    scene::{
        material::{NormalMapConstants, ShadingPermutation, MATERIAL_SLOT},
        mesh::{DIFFUSE_SLOT, NORMAL_SLOT},
        transform::{compose, Pose, Scale},
    },
    ui::widgets::{angle_slider, vec3_control, Vec3Control},
};

/// Pixel slot the plane's transform buffer is mirrored into
const TRANSFORM_PIXEL_SLOT: u32 = 2;

#[derive(Debug)]
pub struct TestPlane {
    bindings: BindingSet,
    material: NormalMapConstants,
    material_buffer: ConstantBuffer,
    pose: Pose,
}

impl TestPlane {
    pub fn new(
        ctx: &mut dyn GraphicsContext,
        size: f32,
        diffuse_map: &Path,
        normal_map: &Path,
    ) -> Result<Self> {
        let layout = ShadingPermutation::DiffuseNormal.vertex_layout();
        let geometry = generate_plane(size, size, 1, 1);
        let material = NormalMapConstants {
            specular_intensity: 0.1,
            specular_power: 20.0,
            normal_map_enabled: 1,
            _padding: 0.0,
        };
        let material_buffer = ConstantBuffer::pixel(ctx, MATERIAL_SLOT, &material)?;

        let vs = VertexShader::new(ctx, shaders::PHONG_NORMAL_MAP_VS)?;
        let input_layout = InputLayout::new(ctx, layout.clone(), &vs)?;
        let bindings = BindingSet::builder("test plane")
            .bind(Texture::new(ctx, diffuse_map, DIFFUSE_SLOT)?)
            .bind(Texture::new(ctx, normal_map, NORMAL_SLOT)?)
            .bind(Sampler::new(ctx)?)
            .bind(VertexBuffer::new(ctx, &geometry.to_vertex_data(&layout))?)
            .bind(IndexBuffer::new(ctx, &geometry.indices)?)
            .bind(vs)
            .bind(PixelShader::new(ctx, shaders::PHONG_NORMAL_MAP_PS)?)
            .bind(input_layout)
            .bind(material_buffer.clone())
            .bind(Topology::TriangleList)
            .bind(Rasterizer::new(ctx, true)?)
            .bind(DepthStencil::new(ctx, DepthStencilMode::Off)?)
            .bind(TransformCbuf::with_slots(
                ctx,
                TransformCbuf::VERTEX_SLOT,
                Some(TRANSFORM_PIXEL_SLOT),
            )?)
            .build()?;

        Ok(Self {
            bindings,
            material,
            material_buffer,
            pose: Pose::default(),
        })
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.pose.x = position.x;
        self.pose.y = position.y;
        self.pose.z = position.z;
    }

    pub fn material(&self) -> NormalMapConstants {
        self.material
    }

    /// Uploads new material constants without recreating the buffer
    pub fn set_material(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        material: NormalMapConstants,
    ) -> GfxResult<()> {
        self.material = material;
        self.material_buffer.update(ctx, &self.material)
    }

    pub fn spawn_control_window(&mut self, ui: &imgui::Ui, ctx: &mut dyn GraphicsContext) -> GfxResult<()> {
        let pose = &mut self.pose;
        let mut material = self.material;
        let mut material_changed = false;

        ui.window("Plane").build(|| {
            vec3_control(ui, "Position", [&mut pose.x, &mut pose.y, &mut pose.z], Vec3Control::default());
            angle_slider(ui, "Roll", &mut pose.roll, -180.0, 180.0);
            angle_slider(ui, "Pitch", &mut pose.pitch, -180.0, 180.0);
            angle_slider(ui, "Yaw", &mut pose.yaw, -180.0, 180.0);

            ui.separator();
            ui.text("Shading");
            material_changed |= ui.slider("Spec. Int.", 0.0, 1.0, &mut material.specular_intensity);
            material_changed |= ui
                .slider_config("Spec. Power", 1.0, 150.0)
                .flags(imgui::SliderFlags::LOGARITHMIC)
                .build(&mut material.specular_power);
            let mut enabled = material.normal_map_enabled != 0;
            if ui.checkbox("Enable Normal Map", &mut enabled) {
                material.normal_map_enabled = enabled as u32;
                material_changed = true;
            }
        });

        if material_changed {
            self.set_material(ctx, material)?;
        }
        Ok(())
    }
}

impl Drawable for TestPlane {
    fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    fn transform(&self) -> Matrix4<f32> {
        compose(&self.pose, &Scale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{context::ShaderStage, recording::RecordingContext};

    fn plane(ctx: &mut RecordingContext) -> TestPlane {
        TestPlane::new(ctx, 2.0, Path::new("images/brickwall.jpg"), Path::new("images/brickwall_normal.jpg")).unwrap()
    }

    #[test]
    fn test_plane_binds_maps_and_mirrored_transform() {
        let mut ctx = RecordingContext::new();
        let plane = plane(&mut ctx);
        plane.submit(&mut ctx).unwrap();

        let draw = ctx.draw_calls().next().unwrap();
        assert_eq!(draw.index_count, 6);
        assert_eq!(draw.bound.textures.len(), 2);
        assert_eq!(
            draw.bound.vertex_constants.get(&0),
            draw.bound.pixel_constants.get(&TRANSFORM_PIXEL_SLOT)
        );
        assert!(plane
            .bindings()
            .constant_buffer(ShaderStage::Pixel, MATERIAL_SLOT)
            .is_some());
    }

    #[test]
    fn test_material_update_keeps_buffer_identity() {
        let mut ctx = RecordingContext::new();
        let mut plane = plane(&mut ctx);
        let before = plane.material_buffer.id();
        let mut material = plane.material();
        material.normal_map_enabled = 0;
        material.specular_power = 64.0;
        plane.set_material(&mut ctx, material).unwrap();

        assert_eq!(plane.material_buffer.id(), before);
        let stored: NormalMapConstants = bytemuck::pod_read_unaligned(ctx.constant_data(before).unwrap());
        assert_eq!(stored.normal_map_enabled, 0);
        assert_eq!(stored.specular_power, 64.0);
    }

    #[test]
    fn test_pose_moves_the_plane() {
        let mut ctx = RecordingContext::new();
        let mut plane = plane(&mut ctx);
        plane.set_position(Vector3::new(0.0, 1.0, -4.0));
        assert_eq!(plane.transform().w, cgmath::Vector4::new(0.0, 1.0, -4.0, 1.0));
    }
}
