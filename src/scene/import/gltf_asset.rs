//! glTF 2.0 front end
//!
//! Keeps the full node hierarchy. Every triangle primitive becomes its own
//! mesh; a node that instantiates a glTF mesh refers to all of them. Only
//! textures referenced by URI are supported.

use std::path::{Path, PathBuf};

use super::{file_stem, import_error, ImportedMaterial, ImportedMesh, ImportedNode, ImportedScene, IDENTITY_ROWS};
use crate::error::Result;

pub(super) fn load(path: &Path) -> Result<ImportedScene> {
    let (document, buffers, _images) = gltf::import(path).map_err(|e| import_error(path, e))?;
    let dir = path.parent().unwrap_or_else(|| Path::new(""));

    let materials = document
        .materials()
        .map(|m| convert_material(&m, dir))
        .collect::<Vec<_>>();

    let mut meshes = Vec::new();
    let mut primitives_of_mesh = vec![Vec::new(); document.meshes().len()];
    for mesh in document.meshes() {
        let mesh_name = mesh.name().map(str::to_owned).unwrap_or_else(|| format!("mesh{}", mesh.index()));
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping {mesh_name} primitive {}: {:?} is not a triangle list",
                    primitive.index(),
                    primitive.mode()
                );
                continue;
            }
            let name = format!("{mesh_name}#{}", primitive.index());
            meshes.push(convert_primitive(&primitive, &buffers, name));
            primitives_of_mesh[mesh.index()].push(meshes.len() - 1);
        }
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| import_error(path, "file contains no scene"))?;

    let mut root = ImportedNode::new(file_stem(path), IDENTITY_ROWS, Vec::new());
    for node in scene.nodes() {
        root.children.push(convert_node(&node, &primitives_of_mesh));
    }

    Ok(ImportedScene {
        source: path.to_path_buf(),
        meshes,
        materials,
        root,
    })
}

fn convert_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    name: String,
) -> ImportedMesh {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader.read_positions().map(|p| p.collect()).unwrap_or_default();
    let normals: Vec<[f32; 3]> = reader.read_normals().map(|n| n.collect()).unwrap_or_default();
    let tex_coords: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_default();
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|i| i.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    // w carries the handedness of the bitangent
    let (tangents, bitangents) = match reader.read_tangents() {
        Some(tangents) if normals.len() == positions.len() => tangents
            .zip(&normals)
            .map(|(t, n)| {
                let b = [
                    (n[1] * t[2] - n[2] * t[1]) * t[3],
                    (n[2] * t[0] - n[0] * t[2]) * t[3],
                    (n[0] * t[1] - n[1] * t[0]) * t[3],
                ];
                ([t[0], t[1], t[2]], b)
            })
            .unzip(),
        _ => (Vec::new(), Vec::new()),
    };

    ImportedMesh {
        name,
        positions,
        normals,
        tangents,
        bitangents,
        tex_coords,
        faces: indices.chunks(3).map(<[u32]>::to_vec).collect(),
        material: primitive.material().index(),
    }
}

fn convert_node(node: &gltf::Node, primitives_of_mesh: &[Vec<usize>]) -> ImportedNode {
    let columns = node.transform().matrix();
    let mut rows = [[0.0f32; 4]; 4];
    for (c, column) in columns.iter().enumerate() {
        for (r, value) in column.iter().enumerate() {
            rows[r][c] = *value;
        }
    }

    let name = node
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("node{}", node.index()));
    let meshes = node
        .mesh()
        .and_then(|m| primitives_of_mesh.get(m.index()).cloned())
        .unwrap_or_default();

    let mut imported = ImportedNode::new(name, rows, meshes);
    for child in node.children() {
        imported.children.push(convert_node(&child, primitives_of_mesh));
    }
    imported
}

fn convert_material(material: &gltf::Material, dir: &Path) -> ImportedMaterial {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    ImportedMaterial {
        name: material.name().unwrap_or("material").to_owned(),
        diffuse_texture: pbr
            .base_color_texture()
            .and_then(|info| texture_path(&info.texture(), dir)),
        specular_texture: None,
        normal_texture: material
            .normal_texture()
            .and_then(|normal| texture_path(&normal.texture(), dir)),
        diffuse_color: Some([r, g, b]),
        specular_color: None,
        shininess: None,
    }
}

fn texture_path(texture: &gltf::Texture, dir: &Path) -> Option<PathBuf> {
    match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => Some(dir.join(uri)),
        _ => {
            log::warn!("Skipping embedded texture {}", texture.index());
            None
        }
    }
}
