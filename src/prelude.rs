//! # Trellis Prelude
//!
//! Common imports for code that builds or edits scenes.
//!
//! ```no_run
//! use trellis::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut app = EditorApp::new(EditorConfig::default())?;
//!     app.add_model("assets/nano.gltf");
//!     app.run()
//! }
//! ```

pub use crate::app::EditorApp;
pub use crate::config::{EditorConfig, ImportConfig};
pub use crate::error::{GfxError, GfxResult, Result, SceneError};

pub use crate::gfx::{
    drawable::{Drawable, StaticBindingRegistry},
    drawables::{SolidSphere, TestPlane},
    GraphicsContext, RecordingContext, RenderEngine,
};
pub use crate::scene::{EditSession, Mesh, Model, Node, NodeEdit, Pose, Scale, ShadingPermutation};

pub use cgmath::{Matrix4, Vector3};
pub use imgui::Ui;
