//! Wavefront OBJ/MTL front end
//!
//! The file becomes a root node named after it with one child per OBJ object.
//! tobj triangulates polygons and unifies the position/normal/UV indices.

use std::path::{Path, PathBuf};

use super::{file_stem, import_error, ImportedMaterial, ImportedMesh, ImportedNode, ImportedScene, IDENTITY_ROWS};
use crate::error::Result;

pub(super) fn load(path: &Path) -> Result<ImportedScene> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| import_error(path, e))?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            log::warn!("{}: no material library loaded ({e})", path.display());
            Vec::new()
        }
    };

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let materials: Vec<ImportedMaterial> = materials.iter().map(|m| convert_material(m, dir)).collect();

    let mut root = ImportedNode::new(file_stem(path), IDENTITY_ROWS, Vec::new());
    let mut meshes = Vec::with_capacity(models.len());
    for (i, model) in models.iter().enumerate() {
        let mut mesh = convert_mesh(model);
        if mesh.material.is_some_and(|m| m >= materials.len()) {
            log::warn!("'{}' references a missing material", mesh.name);
            mesh.material = None;
        }
        meshes.push(mesh);
        root.children
            .push(ImportedNode::new(model.name.clone(), IDENTITY_ROWS, vec![i]));
    }

    Ok(ImportedScene {
        source: path.to_path_buf(),
        meshes,
        materials,
        root,
    })
}

fn convert_mesh(model: &tobj::Model) -> ImportedMesh {
    let mesh = &model.mesh;
    let triples = |data: &[f32]| -> Vec<[f32; 3]> {
        data.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
    };

    ImportedMesh {
        name: model.name.clone(),
        positions: triples(&mesh.positions),
        normals: triples(&mesh.normals),
        tangents: Vec::new(),
        bitangents: Vec::new(),
        // OBJ puts v = 0 at the bottom of the image
        tex_coords: mesh
            .texcoords
            .chunks_exact(2)
            .map(|c| [c[0], 1.0 - c[1]])
            .collect(),
        faces: mesh.indices.chunks(3).map(<[u32]>::to_vec).collect(),
        material: mesh.material_id,
    }
}

fn convert_material(material: &tobj::Material, dir: &Path) -> ImportedMaterial {
    let normal = material
        .normal_texture
        .as_deref()
        .or_else(|| material.unknown_param.get("norm").map(String::as_str))
        .or_else(|| material.unknown_param.get("map_Bump").map(String::as_str));

    ImportedMaterial {
        name: material.name.clone(),
        diffuse_texture: material.diffuse_texture.as_deref().and_then(|t| texture_path(dir, t)),
        specular_texture: material.specular_texture.as_deref().and_then(|t| texture_path(dir, t)),
        normal_texture: normal.and_then(|t| texture_path(dir, t)),
        diffuse_color: material.diffuse,
        specular_color: material.specular,
        shininess: material.shininess,
    }
}

/// Resolves a map statement relative to the asset directory
///
/// Map options such as `-bm 1.0` precede the file name, so the last token
/// is taken.
fn texture_path(dir: &Path, statement: &str) -> Option<PathBuf> {
    let file = statement.split_whitespace().last()?;
    Some(dir.join(file.replace('\\', "/")))
}
