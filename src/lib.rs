// src/lib.rs
//! Trellis
//!
//! A hierarchical 3D model editor on wgpu, winit and imgui. Imported models
//! become a tree of nodes referencing meshes; each mesh picks a Phong shading
//! permutation from its material and renders through shared, immutable
//! pipeline state.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod prelude;
pub mod scene;
pub mod ui;

pub use app::EditorApp;
pub use config::{EditorConfig, ImportConfig};
pub use error::{GfxError, GfxResult, Result, SceneError};
