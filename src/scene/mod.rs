//! # Scene graph
//!
//! Imported models, their node trees and meshes, and the material
//! classification that picks a shading setup for every mesh.
//!
//! ```no_run
//! use trellis::{
//!     config::ImportConfig,
//!     gfx::{drawable::StaticBindingRegistry, recording::RecordingContext},
//!     scene::{EditSession, Model},
//! };
//!
//! # fn main() -> trellis::Result<()> {
//! let mut ctx = RecordingContext::new();
//! let mut registry = StaticBindingRegistry::new();
//! let mut model = Model::load(&mut ctx, &mut registry, "assets/sponza.obj", &ImportConfig::default())?;
//! model.draw(&mut ctx, &EditSession::default())?;
//! # Ok(())
//! # }
//! ```

pub mod import;
pub mod material;
pub mod mesh;
pub mod model;
pub mod node;
pub mod transform;

pub use import::{ImportedMaterial, ImportedMesh, ImportedNode, ImportedScene};
pub use material::{MaterialConstants, ShadingPermutation};
pub use mesh::Mesh;
pub use model::{EditSession, Model};
pub use node::Node;
pub use transform::{NodeEdit, Pose, Scale};
