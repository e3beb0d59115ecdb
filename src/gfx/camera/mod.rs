//! Editor camera and its input controller

pub mod controller;
pub mod fly_camera;

pub use controller::CameraController;
pub use fly_camera::{projection, Camera, OPENGL_TO_WGPU_MATRIX};
