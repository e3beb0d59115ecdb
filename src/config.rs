//! Configuration for model import and the editor window
//!
//! Both structs follow the same pattern: `Default` gives the values the editor
//! ships with and `with_*` methods override individual fields.

use std::path::PathBuf;

/// Options applied while converting an asset into meshes and nodes
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    /// Uniform factor applied to every vertex position
    pub mesh_scale: f32,
    /// Generate smooth normals for meshes that have none
    pub generate_normals: bool,
    /// Generate tangents and bitangents from UVs when the asset lacks them
    pub generate_tangents: bool,
    /// Reverse triangle winding (for assets authored with clockwise fronts)
    pub flip_winding: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            mesh_scale: 1.0,
            generate_normals: true,
            generate_tangents: true,
            flip_winding: false,
        }
    }
}

impl ImportConfig {
    pub fn with_mesh_scale(mut self, scale: f32) -> Self {
        self.mesh_scale = scale;
        self
    }

    pub fn with_generate_normals(mut self, enabled: bool) -> Self {
        self.generate_normals = enabled;
        self
    }

    pub fn with_generate_tangents(mut self, enabled: bool) -> Self {
        self.generate_tangents = enabled;
        self
    }

    pub fn with_flip_winding(mut self, enabled: bool) -> Self {
        self.flip_winding = enabled;
        self
    }
}

/// Window, camera and UI settings for [`EditorApp`](crate::app::EditorApp)
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f32; 4],
    pub vsync: bool,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub font_size: f32,
    pub import: ImportConfig,
    /// Diffuse and normal map of the optional test plane
    pub test_plane_maps: Option<(PathBuf, PathBuf)>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            title: "Trellis".to_string(),
            width: 1600,
            height: 900,
            clear_color: [0.07, 0.0, 0.12, 1.0],
            vsync: true,
            fov_y: 60.0,
            z_near: 0.5,
            z_far: 400.0,
            font_size: 18.0,
            import: ImportConfig::default(),
            test_plane_maps: None,
        }
    }
}

impl EditorConfig {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_clip_planes(mut self, z_near: f32, z_far: f32) -> Self {
        self.z_near = z_near;
        self.z_far = z_far;
        self
    }

    pub fn with_import(mut self, import: ImportConfig) -> Self {
        self.import = import;
        self
    }

    pub fn with_test_plane(mut self, diffuse_map: impl Into<PathBuf>, normal_map: impl Into<PathBuf>) -> Self {
        self.test_plane_maps = Some((diffuse_map.into(), normal_map.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.mesh_scale, 1.0);
        assert!(config.generate_normals);
        assert!(config.generate_tangents);
        assert!(!config.flip_winding);
    }

    #[test]
    fn test_builders_override_single_fields() {
        let config = EditorConfig::default()
            .with_size(800, 600)
            .with_import(ImportConfig::default().with_mesh_scale(0.01));
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.import.mesh_scale, 0.01);
        assert_eq!(config.title, "Trellis");
        assert!(config.test_plane_maps.is_none());
    }
}
