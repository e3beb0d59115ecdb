//! Built-in WGSL programs
//!
//! Every scene shader is prefixed with `lighting.wgsl`, which declares the
//! transform buffer at `@group(0) @binding(0)` and the shared point light.
//! Each module exposes `vs_main` and `fs_main`.

use super::context::ShaderProgram;

macro_rules! scene_shader {
    ($file:literal) => {
        concat!(
            include_str!("shaders/lighting.wgsl"),
            "\n",
            include_str!(concat!("shaders/", $file))
        )
    };
}

const PHONG_SRC: &str = scene_shader!("phong.wgsl");
const PHONG_SPEC_SRC: &str = scene_shader!("phong_spec.wgsl");
const PHONG_NORMAL_MAP_SRC: &str = scene_shader!("phong_normal_map.wgsl");
const PHONG_SPEC_NORMAL_MAP_SRC: &str = scene_shader!("phong_spec_normal_map.wgsl");
const NO_TEX_PHONG_SRC: &str = scene_shader!("no_tex_phong.wgsl");
const SOLID_SRC: &str = scene_shader!("solid.wgsl");

const fn vertex(name: &'static str, source: &'static str) -> ShaderProgram {
    ShaderProgram {
        name,
        source,
        entry_point: "vs_main",
    }
}

const fn pixel(name: &'static str, source: &'static str) -> ShaderProgram {
    ShaderProgram {
        name,
        source,
        entry_point: "fs_main",
    }
}

/// Diffuse map lighting
pub const PHONG_VS: ShaderProgram = vertex("phong", PHONG_SRC);
pub const PHONG_PS: ShaderProgram = pixel("phong", PHONG_SRC);

/// Diffuse and specular maps
pub const PHONG_SPEC_VS: ShaderProgram = vertex("phong_spec", PHONG_SPEC_SRC);
pub const PHONG_SPEC_PS: ShaderProgram = pixel("phong_spec", PHONG_SPEC_SRC);

/// Diffuse and tangent-space normal maps
pub const PHONG_NORMAL_MAP_VS: ShaderProgram = vertex("phong_normal_map", PHONG_NORMAL_MAP_SRC);
pub const PHONG_NORMAL_MAP_PS: ShaderProgram = pixel("phong_normal_map", PHONG_NORMAL_MAP_SRC);

/// Diffuse, specular and normal maps
pub const PHONG_SPEC_NORMAL_MAP_VS: ShaderProgram =
    vertex("phong_spec_normal_map", PHONG_SPEC_NORMAL_MAP_SRC);
pub const PHONG_SPEC_NORMAL_MAP_PS: ShaderProgram =
    pixel("phong_spec_normal_map", PHONG_SPEC_NORMAL_MAP_SRC);

/// Untextured material color
pub const NO_TEX_PHONG_VS: ShaderProgram = vertex("no_tex_phong", NO_TEX_PHONG_SRC);
pub const NO_TEX_PHONG_PS: ShaderProgram = pixel("no_tex_phong", NO_TEX_PHONG_SRC);

/// Unlit color, used by light markers
pub const SOLID_VS: ShaderProgram = vertex("solid", SOLID_SRC);
pub const SOLID_PS: ShaderProgram = pixel("solid", SOLID_SRC);
