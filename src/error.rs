//! Error types for the editor core
//!
//! [`GfxError`] covers failures reported by a [`GraphicsContext`](crate::gfx::GraphicsContext)
//! implementation. [`SceneError`] covers import, classification and structural
//! failures raised while building meshes and models. None of these are retried.

use std::path::PathBuf;
use thiserror::Error;

use crate::gfx::ResourceId;

/// Graphics collaborator error type
#[derive(Error, Debug)]
pub enum GfxError {
    #[error("Failed to request adapter: {0}")]
    AdapterRequestFailed(String),
    #[error("Failed to create device: {0}")]
    DeviceCreationFailed(String),
    #[error("Failed to create surface: {0}")]
    SurfaceCreationFailed(String),
    #[error("Failed to create {kind}: {reason}")]
    ResourceCreationFailed { kind: &'static str, reason: String },
    #[error("Unknown resource {0:?}")]
    UnknownResource(ResourceId),
    #[error("Resource {id:?} is not a {expected}")]
    WrongResourceKind { id: ResourceId, expected: &'static str },
    #[error("Cannot draw: no {0} bound")]
    IncompletePipeline(&'static str),
    #[error("Failed to load texture {path}: {source}")]
    TextureLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Draw issued outside of a frame")]
    NoActiveFrame,
    #[error("Surface lost")]
    SurfaceLost,
    #[error("Out of memory")]
    OutOfMemory,
}

pub type GfxResult<T> = std::result::Result<T, GfxError>;

/// Scene graph and import error type
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to import {path}: {reason}")]
    Import { path: PathBuf, reason: String },
    #[error(
        "Unsupported texture combination (diffuse: {diffuse}, specular: {specular}, normal: {normal})"
    )]
    UnsupportedMaterial {
        diffuse: bool,
        specular: bool,
        normal: bool,
    },
    #[error("Mesh '{mesh}' face {face} has {count} indices, expected 3")]
    NonTriangularFace {
        mesh: String,
        face: usize,
        count: usize,
    },
    #[error("Mesh '{mesh}' references vertex {index} but only has {vertex_count}")]
    IndexOutOfRange {
        mesh: String,
        index: u32,
        vertex_count: usize,
    },
    #[error("Mesh '{mesh}' is missing per-vertex {attribute}")]
    MissingVertexAttribute {
        mesh: String,
        attribute: &'static str,
    },
    #[error("Drawable '{0}' has no index buffer in its instance or static bindings")]
    MissingIndexBuffer(String),
    #[error("Node {0} does not exist in this model")]
    UnknownNode(u32),
    #[error(transparent)]
    Gfx(#[from] GfxError),
}

pub type Result<T> = std::result::Result<T, SceneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gfx_error_converts_into_scene_error() {
        fn fails() -> Result<()> {
            Err(GfxError::SurfaceLost)?;
            Ok(())
        }

        assert!(matches!(fails(), Err(SceneError::Gfx(GfxError::SurfaceLost))));
    }

    #[test]
    fn test_classification_message_lists_channels() {
        let err = SceneError::UnsupportedMaterial {
            diffuse: false,
            specular: false,
            normal: true,
        };
        let message = err.to_string();
        assert!(message.contains("diffuse: false"));
        assert!(message.contains("normal: true"));
    }
}
