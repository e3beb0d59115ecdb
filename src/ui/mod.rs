//! # User Interface Module
//!
//! Dear ImGui integration for the editor.
//!
//! - [`UiManager`] - owns the imgui context, its winit platform glue and the
//!   wgpu renderer, and draws the UI as an overlay after the scene pass
//! - [`widgets`] - composite controls shared by the model, camera and plane
//!   windows
//!
//! Input goes to imgui first. While imgui wants the mouse or keyboard, the
//! camera controller does not see those events.

pub mod manager;
pub mod widgets;

pub use manager::UiManager;
pub use widgets::{angle_slider, vec3_control, Vec3Control};
