//! # Asset import
//!
//! Converts files on disk into an [`ImportedScene`]: flat mesh and material
//! lists plus a node tree that refers to meshes by index. Two front ends
//! produce it, Wavefront OBJ (through `tobj`) and glTF 2.0 (through `gltf`).
//! Both are followed by the same post-processing pass.
//!
//! Node transforms are stored row-major, as most interchange formats and
//! importers hand them out. Consumers transpose them into cgmath's column
//! layout.

mod gltf_asset;
mod obj;

use std::path::{Path, PathBuf};

use crate::{
    config::ImportConfig,
    error::{Result, SceneError},
    gfx::geometry::{compute_normals, compute_tangents},
};

#[rustfmt::skip]
pub const IDENTITY_ROWS: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMaterial {
    pub name: String,
    pub diffuse_texture: Option<PathBuf>,
    pub specular_texture: Option<PathBuf>,
    pub normal_texture: Option<PathBuf>,
    pub diffuse_color: Option<[f32; 3]>,
    pub specular_color: Option<[f32; 3]>,
    pub shininess: Option<f32>,
}

/// One mesh as delivered by the asset
///
/// Attribute vectors are either empty (absent) or hold one entry per
/// position. Faces are kept as the asset delivered them and validated when
/// the engine mesh is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub faces: Vec<Vec<u32>>,
    pub material: Option<usize>,
}

impl ImportedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_normals(&self) -> bool {
        !self.positions.is_empty() && self.normals.len() == self.positions.len()
    }

    pub fn has_tex_coords(&self) -> bool {
        !self.positions.is_empty() && self.tex_coords.len() == self.positions.len()
    }

    pub fn has_tangents(&self) -> bool {
        !self.positions.is_empty()
            && self.tangents.len() == self.positions.len()
            && self.bitangents.len() == self.positions.len()
    }

    /// Indices of the well-formed triangles, for attribute generation
    fn triangle_indices(&self) -> Vec<u32> {
        let count = self.positions.len() as u32;
        self.faces
            .iter()
            .filter(|f| f.len() == 3 && f.iter().all(|&i| i < count))
            .flatten()
            .copied()
            .collect()
    }

    pub fn flip_winding(&mut self) {
        for face in &mut self.faces {
            face.reverse();
        }
    }

    pub fn generate_normals(&mut self) {
        self.normals = compute_normals(&self.positions, &self.triangle_indices());
    }

    pub fn generate_tangents(&mut self) {
        let (tangents, bitangents) = compute_tangents(
            &self.positions,
            &self.normals,
            &self.tex_coords,
            &self.triangle_indices(),
        );
        self.tangents = tangents;
        self.bitangents = bitangents;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedNode {
    pub name: String,
    /// Row-major local transform
    pub transform: [[f32; 4]; 4],
    /// Indices into [`ImportedScene::meshes`]
    pub meshes: Vec<usize>,
    pub children: Vec<ImportedNode>,
}

impl ImportedNode {
    pub fn new(name: impl Into<String>, transform: [[f32; 4]; 4], meshes: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            transform,
            meshes,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: ImportedNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ImportedNode::count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedScene {
    pub source: PathBuf,
    pub meshes: Vec<ImportedMesh>,
    pub materials: Vec<ImportedMaterial>,
    pub root: ImportedNode,
}

impl ImportedScene {
    /// Reads an OBJ or glTF file and post-processes it
    pub fn load(path: impl AsRef<Path>, config: &ImportConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(import_error(path, "file not found"));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let mut scene = match extension.as_deref() {
            Some("obj") => obj::load(path)?,
            Some("gltf") | Some("glb") => gltf_asset::load(path)?,
            _ => return Err(import_error(path, "unsupported file type")),
        };

        scene.post_process(config);
        log::info!(
            "Imported {}: {} meshes, {} materials, {} nodes",
            path.display(),
            scene.meshes.len(),
            scene.materials.len(),
            scene.root.count()
        );
        Ok(scene)
    }

    /// Applies winding and attribute-generation options
    pub fn post_process(&mut self, config: &ImportConfig) {
        for mesh in &mut self.meshes {
            if config.flip_winding {
                mesh.flip_winding();
            }
            if config.generate_normals && !mesh.has_normals() {
                log::debug!("Generating normals for '{}'", mesh.name);
                mesh.generate_normals();
            }
            if config.generate_tangents
                && mesh.has_normals()
                && mesh.has_tex_coords()
                && !mesh.has_tangents()
            {
                log::debug!("Generating tangents for '{}'", mesh.name);
                mesh.generate_tangents();
            }
        }
    }

    pub fn directory(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn file_stem(&self) -> String {
        file_stem(&self.source)
    }
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_owned())
}

pub(crate) fn import_error(path: &Path, reason: impl ToString) -> SceneError {
    SceneError::Import {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> ImportedMesh {
        ImportedMesh {
            name: "quad".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            tex_coords: vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
            faces: vec![vec![0, 1, 2], vec![2, 3, 0]],
            ..Default::default()
        }
    }

    fn scene_with(mesh: ImportedMesh) -> ImportedScene {
        ImportedScene {
            source: PathBuf::from("quad.obj"),
            meshes: vec![mesh],
            materials: Vec::new(),
            root: ImportedNode::new("quad", IDENTITY_ROWS, vec![0]),
        }
    }

    #[test]
    fn test_post_process_generates_missing_attributes() {
        let mut scene = scene_with(quad());
        scene.post_process(&ImportConfig::default());
        let mesh = &scene.meshes[0];
        assert!(mesh.has_normals());
        assert!(mesh.has_tangents());
        assert!((mesh.normals[0][2] - 1.0).abs() < 1e-6);
        assert!((mesh.tangents[0][0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_post_process_respects_disabled_generation() {
        let mut scene = scene_with(quad());
        let config = ImportConfig::default()
            .with_generate_normals(false)
            .with_generate_tangents(false);
        scene.post_process(&config);
        assert!(!scene.meshes[0].has_normals());
        assert!(!scene.meshes[0].has_tangents());
    }

    #[test]
    fn test_flip_winding_reverses_faces() {
        let mut scene = scene_with(quad());
        scene.post_process(&ImportConfig::default().with_flip_winding(true));
        assert_eq!(scene.meshes[0].faces[0], vec![2, 1, 0]);
        // generated after the flip, so the normal faces away from +Z
        assert!(scene.meshes[0].normals[0][2] < 0.0);
    }

    #[test]
    fn test_generation_ignores_malformed_faces() {
        let mut mesh = quad();
        mesh.faces.push(vec![0, 1, 2, 3]);
        mesh.faces.push(vec![0, 1, 9]);
        mesh.generate_normals();
        assert_eq!(mesh.normals.len(), 4);
    }

    #[test]
    fn test_load_rejects_missing_and_unknown_files() {
        let missing = ImportedScene::load("does/not/exist.obj", &ImportConfig::default());
        assert!(matches!(missing, Err(SceneError::Import { .. })));

        let path = std::env::temp_dir().join("trellis_import_unknown.xyz");
        std::fs::write(&path, b"nothing").unwrap();
        let unknown = ImportedScene::load(&path, &ImportConfig::default());
        assert!(matches!(unknown, Err(SceneError::Import { reason, .. }) if reason.contains("unsupported")));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_node_count() {
        let root = ImportedNode::new("root", IDENTITY_ROWS, vec![])
            .with_child(ImportedNode::new("a", IDENTITY_ROWS, vec![]).with_child(ImportedNode::new(
                "b",
                IDENTITY_ROWS,
                vec![],
            )))
            .with_child(ImportedNode::new("c", IDENTITY_ROWS, vec![]));
        assert_eq!(root.count(), 4);
    }
}
