use std::collections::HashSet;

use cgmath::{InnerSpace, Vector3, Zero};
use winit::{
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton},
    keyboard::{KeyCode, PhysicalKey},
};

use super::fly_camera::Camera;

/// Keyboard and mouse driver for [`Camera`]
///
/// Hold the right mouse button to look around; WASD moves, R and F move
/// up and down.
#[derive(Debug, Default)]
pub struct CameraController {
    held: HashSet<KeyCode>,
    looking: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_looking(&self) -> bool {
        self.looking
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Right {
            self.looking = state == ElementState::Pressed;
        }
    }

    pub fn process_device_event(&mut self, event: &DeviceEvent, camera: &mut Camera) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.looking {
                camera.rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(code) = event.physical_key {
            match event.state {
                ElementState::Pressed => {
                    self.held.insert(code);
                }
                ElementState::Released => {
                    self.held.remove(&code);
                }
            }
        }
    }

    /// Drops held keys, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        self.held.clear();
        self.looking = false;
    }

    /// Camera-local direction requested by the held keys
    pub fn direction(&self) -> Vector3<f32> {
        let mut dir = Vector3::zero();
        for (key, step) in [
            (KeyCode::KeyW, Vector3::new(0.0, 0.0, -1.0)),
            (KeyCode::KeyS, Vector3::new(0.0, 0.0, 1.0)),
            (KeyCode::KeyA, Vector3::new(-1.0, 0.0, 0.0)),
            (KeyCode::KeyD, Vector3::new(1.0, 0.0, 0.0)),
            (KeyCode::KeyR, Vector3::new(0.0, 1.0, 0.0)),
            (KeyCode::KeyF, Vector3::new(0.0, -1.0, 0.0)),
        ] {
            if self.held.contains(&key) {
                dir += step;
            }
        }
        if dir.magnitude2() > 0.0 {
            dir.normalize()
        } else {
            dir
        }
    }

    pub fn update(&self, camera: &mut Camera, dt: f32) {
        let dir = self.direction();
        if !dir.is_zero() {
            camera.translate(dir * dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_keys_no_motion() {
        let controller = CameraController::new();
        let mut camera = Camera::new();
        let before = camera;
        controller.update(&mut camera, 0.016);
        assert_eq!(camera, before);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut controller = CameraController::new();
        controller.held.insert(KeyCode::KeyW);
        controller.held.insert(KeyCode::KeyS);
        assert!(controller.direction().is_zero());
        controller.held.insert(KeyCode::KeyD);
        assert_eq!(controller.direction(), Vector3::unit_x());
    }
}
