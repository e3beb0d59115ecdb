//! Material classification and per-permutation pixel constants
//!
//! A mesh's shading setup is picked from which texture channels its material
//! provides. Only five combinations are supported; anything else is an error.

use bytemuck::{Pod, Zeroable};

use crate::{
    error::{Result, SceneError},
    gfx::{
        bindable::ConstantBuffer,
        context::{GraphicsContext, ShaderProgram},
        shaders,
        vertex::{ElementType, VertexLayout},
    },
};

/// Pixel constant slot every material buffer is bound to
pub const MATERIAL_SLOT: u32 = 1;

pub const DEFAULT_SHININESS: f32 = 2.0;
pub const DEFAULT_SPECULAR_COLOR: [f32; 3] = [0.18, 0.18, 0.18];
pub const DEFAULT_DIFFUSE_COLOR: [f32; 3] = [0.45, 0.45, 0.85];

/// Shader and vertex-format variant chosen for a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadingPermutation {
    DiffuseNormalSpecular,
    DiffuseSpecular,
    DiffuseNormal,
    Diffuse,
    /// No textures: flat material color
    Flat,
}

impl ShadingPermutation {
    /// Picks the permutation for a set of texture channels
    pub fn classify(diffuse: bool, specular: bool, normal: bool) -> Result<Self> {
        match (diffuse, specular, normal) {
            (true, true, true) => Ok(Self::DiffuseNormalSpecular),
            (true, true, false) => Ok(Self::DiffuseSpecular),
            (true, false, true) => Ok(Self::DiffuseNormal),
            (true, false, false) => Ok(Self::Diffuse),
            (false, false, false) => Ok(Self::Flat),
            _ => Err(SceneError::UnsupportedMaterial {
                diffuse,
                specular,
                normal,
            }),
        }
    }

    pub fn vertex_layout(self) -> VertexLayout {
        let layout = VertexLayout::new()
            .append(ElementType::Position3D)
            .append(ElementType::Normal);
        match self {
            Self::DiffuseNormalSpecular | Self::DiffuseNormal => layout
                .append(ElementType::Tangent)
                .append(ElementType::Bitangent)
                .append(ElementType::Texture2D),
            Self::DiffuseSpecular | Self::Diffuse => layout.append(ElementType::Texture2D),
            Self::Flat => layout,
        }
    }

    pub fn shaders(self) -> (ShaderProgram, ShaderProgram) {
        match self {
            Self::DiffuseNormalSpecular => (
                shaders::PHONG_SPEC_NORMAL_MAP_VS,
                shaders::PHONG_SPEC_NORMAL_MAP_PS,
            ),
            Self::DiffuseSpecular => (shaders::PHONG_SPEC_VS, shaders::PHONG_SPEC_PS),
            Self::DiffuseNormal => (shaders::PHONG_NORMAL_MAP_VS, shaders::PHONG_NORMAL_MAP_PS),
            Self::Diffuse => (shaders::PHONG_VS, shaders::PHONG_PS),
            Self::Flat => (shaders::NO_TEX_PHONG_VS, shaders::NO_TEX_PHONG_PS),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DiffuseNormalSpecular => "diffuse + specular + normal maps",
            Self::DiffuseSpecular => "diffuse + specular maps",
            Self::DiffuseNormal => "diffuse + normal maps",
            Self::Diffuse => "diffuse map",
            Self::Flat => "flat color",
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FullMaterialConstants {
    pub normal_map_enabled: u32,
    pub specular_map_enabled: u32,
    pub has_gloss_map: u32,
    pub specular_power: f32,
    pub specular_color: [f32; 3],
    pub specular_map_weight: f32,
}

impl Default for FullMaterialConstants {
    fn default() -> Self {
        Self {
            normal_map_enabled: 1,
            specular_map_enabled: 1,
            has_gloss_map: 0,
            specular_power: 3.1,
            specular_color: [0.75, 0.75, 0.75],
            specular_map_weight: 0.671,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpecularMapConstants {
    pub specular_map_weight: f32,
    pub has_gloss: u32,
    pub specular_power: f32,
    pub _padding: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct NormalMapConstants {
    pub specular_intensity: f32,
    pub specular_power: f32,
    pub normal_map_enabled: u32,
    pub _padding: f32,
}

impl Default for NormalMapConstants {
    fn default() -> Self {
        Self {
            specular_intensity: DEFAULT_SPECULAR_COLOR[0],
            specular_power: DEFAULT_SHININESS,
            normal_map_enabled: 1,
            _padding: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DiffuseConstants {
    pub specular_intensity: f32,
    pub specular_power: f32,
    pub _padding: [f32; 2],
}

impl Default for DiffuseConstants {
    fn default() -> Self {
        Self {
            specular_intensity: DEFAULT_SPECULAR_COLOR[0],
            specular_power: DEFAULT_SHININESS,
            _padding: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FlatConstants {
    pub color: [f32; 4],
    pub specular_intensity: f32,
    pub specular_power: f32,
    pub _padding: [f32; 2],
}

/// Scalars read from the asset, with the editor's defaults filled in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialScalars {
    pub diffuse_color: [f32; 3],
    pub specular_color: [f32; 3],
    pub shininess: f32,
    /// The specular map carries a gloss exponent in its alpha channel
    pub has_alpha_gloss: bool,
}

impl Default for MaterialScalars {
    fn default() -> Self {
        Self {
            diffuse_color: DEFAULT_DIFFUSE_COLOR,
            specular_color: DEFAULT_SPECULAR_COLOR,
            shininess: DEFAULT_SHININESS,
            has_alpha_gloss: false,
        }
    }
}

/// Pixel constants of one mesh, tagged by permutation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialConstants {
    Full(FullMaterialConstants),
    SpecularMap(SpecularMapConstants),
    NormalMap(NormalMapConstants),
    Diffuse(DiffuseConstants),
    Flat(FlatConstants),
}

impl MaterialConstants {
    pub fn new(permutation: ShadingPermutation, scalars: &MaterialScalars) -> Self {
        let gloss = scalars.has_alpha_gloss as u32;
        match permutation {
            ShadingPermutation::DiffuseNormalSpecular => Self::Full(FullMaterialConstants {
                specular_power: scalars.shininess,
                has_gloss_map: gloss,
                ..Default::default()
            }),
            ShadingPermutation::DiffuseSpecular => Self::SpecularMap(SpecularMapConstants {
                specular_map_weight: 1.0,
                has_gloss: gloss,
                specular_power: scalars.shininess,
                _padding: 0.0,
            }),
            ShadingPermutation::DiffuseNormal => Self::NormalMap(NormalMapConstants::default()),
            ShadingPermutation::Diffuse => Self::Diffuse(DiffuseConstants::default()),
            ShadingPermutation::Flat => {
                let [r, g, b] = scalars.diffuse_color;
                let spec = scalars.specular_color;
                Self::Flat(FlatConstants {
                    color: [r, g, b, 1.0],
                    specular_intensity: (spec[0] + spec[1] + spec[2]) / 3.0,
                    specular_power: scalars.shininess,
                    _padding: [0.0; 2],
                })
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Full(c) => bytemuck::bytes_of(c),
            Self::SpecularMap(c) => bytemuck::bytes_of(c),
            Self::NormalMap(c) => bytemuck::bytes_of(c),
            Self::Diffuse(c) => bytemuck::bytes_of(c),
            Self::Flat(c) => bytemuck::bytes_of(c),
        }
    }

    /// Creates the pixel constant buffer at [`MATERIAL_SLOT`]
    pub fn create_buffer(&self, ctx: &mut dyn GraphicsContext) -> Result<ConstantBuffer> {
        let buffer = match self {
            Self::Full(c) => ConstantBuffer::pixel(ctx, MATERIAL_SLOT, c)?,
            Self::SpecularMap(c) => ConstantBuffer::pixel(ctx, MATERIAL_SLOT, c)?,
            Self::NormalMap(c) => ConstantBuffer::pixel(ctx, MATERIAL_SLOT, c)?,
            Self::Diffuse(c) => ConstantBuffer::pixel(ctx, MATERIAL_SLOT, c)?,
            Self::Flat(c) => ConstantBuffer::pixel(ctx, MATERIAL_SLOT, c)?,
        };
        Ok(buffer)
    }

    /// Re-uploads these values into an existing buffer
    pub fn upload(&self, ctx: &mut dyn GraphicsContext, buffer: &ConstantBuffer) -> Result<()> {
        ctx.update_constant_buffer(buffer.id(), self.as_bytes())?;
        Ok(())
    }

    /// Draws the editable scalars; returns true if any changed
    pub fn show_controls(&mut self, ui: &imgui::Ui) -> bool {
        let mut changed = false;
        match self {
            Self::Full(c) => {
                changed |= checkbox_u32(ui, "Normal Map", &mut c.normal_map_enabled);
                changed |= checkbox_u32(ui, "Specular Map", &mut c.specular_map_enabled);
                if c.specular_map_enabled != 0 {
                    changed |= ui.slider("Spec Weight", 0.0, 2.0, &mut c.specular_map_weight);
                } else {
                    changed |= ui.color_edit3("Spec Color", &mut c.specular_color);
                }
                changed |= checkbox_u32(ui, "Gloss Alpha", &mut c.has_gloss_map);
                if c.has_gloss_map == 0 {
                    changed |= power_slider(ui, &mut c.specular_power);
                }
            }
            Self::SpecularMap(c) => {
                changed |= ui.slider("Spec Weight", 0.0, 2.0, &mut c.specular_map_weight);
                changed |= checkbox_u32(ui, "Gloss Alpha", &mut c.has_gloss);
                if c.has_gloss == 0 {
                    changed |= power_slider(ui, &mut c.specular_power);
                }
            }
            Self::NormalMap(c) => {
                changed |= ui.slider("Spec Intensity", 0.0, 1.0, &mut c.specular_intensity);
                changed |= power_slider(ui, &mut c.specular_power);
                changed |= checkbox_u32(ui, "Normal Map", &mut c.normal_map_enabled);
            }
            Self::Diffuse(c) => {
                changed |= ui.slider("Spec Intensity", 0.0, 1.0, &mut c.specular_intensity);
                changed |= power_slider(ui, &mut c.specular_power);
            }
            Self::Flat(c) => {
                let mut rgb = [c.color[0], c.color[1], c.color[2]];
                if ui.color_edit3("Diffuse Color", &mut rgb) {
                    c.color[..3].copy_from_slice(&rgb);
                    changed = true;
                }
                changed |= ui.slider("Spec Intensity", 0.0, 1.0, &mut c.specular_intensity);
                changed |= power_slider(ui, &mut c.specular_power);
            }
        }
        changed
    }
}

fn power_slider(ui: &imgui::Ui, power: &mut f32) -> bool {
    ui.slider_config("Spec Power", 1.0, 150.0)
        .flags(imgui::SliderFlags::LOGARITHMIC)
        .build(power)
}

fn checkbox_u32(ui: &imgui::Ui, label: &str, value: &mut u32) -> bool {
    let mut flag = *value != 0;
    let changed = ui.checkbox(label, &mut flag);
    *value = flag as u32;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_covers_every_combination() {
        use ShadingPermutation::*;
        let cases = [
            ((true, true, true), Some(DiffuseNormalSpecular)),
            ((true, true, false), Some(DiffuseSpecular)),
            ((true, false, true), Some(DiffuseNormal)),
            ((true, false, false), Some(Diffuse)),
            ((false, false, false), Some(Flat)),
            ((false, true, true), None),
            ((false, true, false), None),
            ((false, false, true), None),
        ];
        for ((d, s, n), expected) in cases {
            let first = ShadingPermutation::classify(d, s, n).ok();
            let second = ShadingPermutation::classify(d, s, n).ok();
            assert_eq!(first, expected, "combination {:?}", (d, s, n));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_unsupported_material_reports_channels() {
        let err = ShadingPermutation::classify(false, false, true).unwrap_err();
        assert!(matches!(
            err,
            SceneError::UnsupportedMaterial {
                diffuse: false,
                specular: false,
                normal: true
            }
        ));
    }

    #[test]
    fn test_flat_layout_has_no_uv() {
        let layout = ShadingPermutation::Flat.vertex_layout();
        assert!(!layout.has(ElementType::Texture2D));
        assert!(!layout.has(ElementType::Tangent));
        assert_eq!(layout.stride(), 24);
    }

    #[test]
    fn test_normal_mapped_layouts_carry_tangent_frame() {
        for p in [
            ShadingPermutation::DiffuseNormal,
            ShadingPermutation::DiffuseNormalSpecular,
        ] {
            let layout = p.vertex_layout();
            assert!(layout.has(ElementType::Tangent));
            assert!(layout.has(ElementType::Bitangent));
            assert_eq!(layout.stride(), 56);
        }
    }

    #[test]
    fn test_constant_sizes_match_wgsl_structs() {
        assert_eq!(std::mem::size_of::<FullMaterialConstants>(), 32);
        assert_eq!(std::mem::size_of::<SpecularMapConstants>(), 16);
        assert_eq!(std::mem::size_of::<NormalMapConstants>(), 16);
        assert_eq!(std::mem::size_of::<DiffuseConstants>(), 16);
        assert_eq!(std::mem::size_of::<FlatConstants>(), 32);
    }

    #[test]
    fn test_flat_constants_average_specular_color() {
        let scalars = MaterialScalars {
            diffuse_color: [1.0, 0.5, 0.25],
            specular_color: [0.3, 0.6, 0.9],
            shininess: 8.0,
            has_alpha_gloss: false,
        };
        let MaterialConstants::Flat(c) = MaterialConstants::new(ShadingPermutation::Flat, &scalars)
        else {
            panic!("expected flat constants");
        };
        assert_eq!(c.color, [1.0, 0.5, 0.25, 1.0]);
        assert!((c.specular_intensity - 0.6).abs() < 1e-6);
        assert_eq!(c.specular_power, 8.0);
    }

    #[test]
    fn test_gloss_flag_reaches_specular_constants() {
        let scalars = MaterialScalars {
            has_alpha_gloss: true,
            ..Default::default()
        };
        match MaterialConstants::new(ShadingPermutation::DiffuseSpecular, &scalars) {
            MaterialConstants::SpecularMap(c) => assert_eq!(c.has_gloss, 1),
            other => panic!("unexpected {other:?}"),
        }
    }
}
