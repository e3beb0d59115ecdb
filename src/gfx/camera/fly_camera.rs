use cgmath::{perspective, Deg, EuclideanSpace, Matrix4, Point3, Rad, Vector3};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::ui::widgets::{angle_slider, vec3_control, Vec3Control};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

const PITCH_LIMIT: f32 = 0.995 * FRAC_PI_2;
const RESET_POSITION: Vector3<f32> = Vector3::new(6.0, 5.0, 12.0);
const RESET_PITCH_DEG: f32 = 20.0;
const RESET_YAW_DEG: f32 = 26.5;
const DEFAULT_TRAVEL_SPEED: f32 = 12.0;
const DEFAULT_ROTATION_SPEED: f32 = 0.004;

/// Free-flying look-to camera
///
/// Positive pitch looks down, positive yaw turns left. At zero pitch and yaw
/// the camera looks down -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vector3<f32>,
    pub pitch: f32,
    pub yaw: f32,
    pub travel_speed: f32,
    pub rotation_speed: f32,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: RESET_POSITION,
            pitch: 0.0,
            yaw: 0.0,
            travel_speed: DEFAULT_TRAVEL_SPEED,
            rotation_speed: DEFAULT_ROTATION_SPEED,
        };
        camera.reset();
        camera
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores position and orientation; speeds are kept
    pub fn reset(&mut self) {
        self.position = RESET_POSITION;
        self.pitch = Rad::from(Deg(RESET_PITCH_DEG)).0;
        self.yaw = Rad::from(Deg(RESET_YAW_DEG)).0;
    }

    fn orientation(&self) -> Matrix4<f32> {
        Matrix4::from_angle_y(Rad(self.yaw)) * Matrix4::from_angle_x(Rad(-self.pitch))
    }

    pub fn forward(&self) -> Vector3<f32> {
        (self.orientation() * Vector3::new(0.0, 0.0, -1.0).extend(0.0)).truncate()
    }

    /// View matrix
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(
            Point3::from_vec(self.position),
            self.forward(),
            Vector3::unit_y(),
        )
    }

    /// Applies a look delta in mouse pixels
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw = wrap_angle(self.yaw - dx * self.rotation_speed);
        self.pitch = (self.pitch + dy * self.rotation_speed).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Moves along a camera-local direction (x right, y up, -z forward),
    /// scaled by the travel speed
    pub fn translate(&mut self, local: Vector3<f32>) {
        let world = (self.orientation() * local.extend(0.0)).truncate();
        self.position += world * self.travel_speed;
    }

    /// Draws the camera window; returns true if anything changed
    pub fn spawn_control_window(&mut self, ui: &imgui::Ui) -> bool {
        let mut changed = false;
        ui.window("Camera")
            .size([360.0, 220.0], imgui::Condition::FirstUseEver)
            .build(|| {
                let [x, y, z] = self.position.as_mut();
                changed |= vec3_control(ui, "Position", [x, y, z], Vec3Control::default());
                ui.separator();
                ui.text("Orientation");
                changed |= angle_slider(ui, "Pitch", &mut self.pitch, -89.5, 89.5);
                changed |= angle_slider(ui, "Yaw", &mut self.yaw, -180.0, 180.0);
                ui.separator();
                changed |= ui
                    .slider_config("Camera Speed", 0.1, 100.0)
                    .flags(imgui::SliderFlags::LOGARITHMIC)
                    .build(&mut self.travel_speed);
                if ui.button("Reset") {
                    self.reset();
                    changed = true;
                }
            });
        changed
    }
}

/// Perspective projection for wgpu's 0..1 depth range
pub fn projection(fov_y_deg: f32, aspect: f32, z_near: f32, z_far: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * perspective(Deg(fov_y_deg), aspect.max(f32::EPSILON), z_near, z_far)
}

fn wrap_angle(theta: f32) -> f32 {
    let wrapped = (theta + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped.is_nan() { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{AbsDiffEq, InnerSpace, Vector4};

    #[test]
    fn test_default_camera_faces_origin() {
        let camera = Camera::new();
        let to_origin = (-camera.position).normalize();
        assert!(camera.forward().dot(to_origin) > 0.99);
    }

    #[test]
    fn test_view_moves_position_to_origin() {
        let camera = Camera::new();
        let p = camera.matrix() * camera.position.extend(1.0);
        assert!(p.abs_diff_eq(&Vector4::new(0.0, 0.0, 0.0, 1.0), 1e-4));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::new();
        camera.rotate(0.0, 1.0e6);
        assert!((camera.pitch - PITCH_LIMIT).abs() < 1e-6);
        camera.rotate(0.0, -1.0e7);
        assert!((camera.pitch + PITCH_LIMIT).abs() < 1e-6);
    }

    #[test]
    fn test_translate_forward_follows_view() {
        let mut camera = Camera::new();
        let start = camera.position;
        let forward = camera.forward();
        camera.translate(Vector3::new(0.0, 0.0, -1.0));
        let moved = camera.position - start;
        assert!(moved.abs_diff_eq(&(forward * DEFAULT_TRAVEL_SPEED), 1e-4));
    }

    #[test]
    fn test_reset_keeps_speed() {
        let mut camera = Camera::new();
        camera.travel_speed = 3.0;
        camera.translate(Vector3::unit_x());
        camera.reset();
        assert_eq!(camera.position, RESET_POSITION);
        assert_eq!(camera.travel_speed, 3.0);
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-5);
        assert!((wrap_angle(0.25) - 0.25).abs() < 1e-6);
    }
}
