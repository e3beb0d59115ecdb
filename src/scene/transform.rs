//! Pose parameters and the compose/decompose pair used by node editing
//!
//! Matrices are column-vector (cgmath). A composed pose applies rotation,
//! then scale, then translation: `T · S · R`. The rotation is
//! `Ry(pitch) · Rx(roll) · Rz(yaw)`.

use cgmath::{Matrix4, Rad, SquareMatrix, Vector3};

/// Euler angles in radians plus a translation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Pose {
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            ..Default::default()
        }
    }

    pub fn translation(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn rotation(&self) -> Matrix4<f32> {
        rotation(self.roll, self.pitch, self.yaw)
    }
}

/// Per-axis scale factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Scale {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl Scale {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn uniform(s: f32) -> Self {
        Self::new(s, s, s)
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_nonuniform_scale(self.x, self.y, self.z)
    }

    /// Reads the diagonal of a pure scale matrix
    pub fn from_matrix(m: &Matrix4<f32>) -> Self {
        Self::new(m.x.x, m.y.y, m.z.z)
    }
}

/// User edit of one node. Pose and scale always travel together.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeEdit {
    pub pose: Pose,
    pub scale: Scale,
}

impl NodeEdit {
    /// Seeds an edit from a node's current applied transform and scale
    pub fn from_matrices(applied: &Matrix4<f32>, scale: &Matrix4<f32>) -> Self {
        Self {
            pose: decompose(applied),
            scale: Scale::from_matrix(scale),
        }
    }

    /// Returns the applied transform and the pure scale matrix
    pub fn to_matrices(&self) -> (Matrix4<f32>, Matrix4<f32>) {
        (compose(&self.pose, &self.scale), self.scale.matrix())
    }
}

pub fn rotation(roll: f32, pitch: f32, yaw: f32) -> Matrix4<f32> {
    Matrix4::from_angle_y(Rad(pitch)) * Matrix4::from_angle_x(Rad(roll)) * Matrix4::from_angle_z(Rad(yaw))
}

pub fn compose(pose: &Pose, scale: &Scale) -> Matrix4<f32> {
    Matrix4::from_translation(pose.translation()) * scale.matrix() * pose.rotation()
}

/// Recovers Euler angles and translation from a composed transform
///
/// Per-axis scale is divided out of the rows of the linear part first, so
/// any matrix produced by [`compose`] round-trips. Near `roll = ±90°` the
/// pitch and yaw are not unique; the returned pair reproduces the same
/// rotation.
pub fn decompose(m: &Matrix4<f32>) -> Pose {
    let row = |i: usize| Vector3::new(m.x[i], m.y[i], m.z[i]);
    let norms = [row(0), row(1), row(2)].map(|r| {
        let n = (r.x * r.x + r.y * r.y + r.z * r.z).sqrt();
        if n > f32::EPSILON { n } else { 1.0 }
    });
    // normalized entry at (row, col)
    let at = |row: usize, col: &cgmath::Vector4<f32>| col[row] / norms[row];

    let sin_roll = (-at(1, &m.z)).clamp(-1.0, 1.0);
    let roll = sin_roll.asin();
    let (pitch, yaw) = if sin_roll.abs() < 0.9999 {
        (
            at(0, &m.z).atan2(at(2, &m.z)),
            at(1, &m.x).atan2(at(1, &m.y)),
        )
    } else {
        // gimbal lock: fold yaw into pitch
        ((-at(2, &m.x)).atan2(at(0, &m.x)), 0.0)
    };

    Pose {
        roll,
        pitch,
        yaw,
        x: m.w.x,
        y: m.w.y,
        z: m.w.z,
    }
}

/// True when `m` is the identity within `epsilon`
pub fn is_identity(m: &Matrix4<f32>, epsilon: f32) -> bool {
    let id = Matrix4::<f32>::identity();
    let a: &[f32; 16] = m.as_ref();
    let b: &[f32; 16] = id.as_ref();
    a.iter().zip(b).all(|(x, y)| (x - y).abs() <= epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{AbsDiffEq, Vector4};
    use rand::Rng;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn assert_pose_eq(a: &Pose, b: &Pose) {
        let pairs = [
            (a.roll, b.roll),
            (a.pitch, b.pitch),
            (a.yaw, b.yaw),
            (a.x, b.x),
            (a.y, b.y),
            (a.z, b.z),
        ];
        for (l, r) in pairs {
            assert!((l - r).abs() < 1e-3, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn test_identity_pose_composes_to_identity() {
        let m = compose(&Pose::default(), &Scale::default());
        assert!(is_identity(&m, 1e-6));
    }

    #[test]
    fn test_compose_applies_rotation_then_scale_then_translation() {
        let pose = Pose {
            yaw: FRAC_PI_2,
            ..Pose::from_translation(5.0, 0.0, 0.0)
        };
        let m = compose(&pose, &Scale::uniform(2.0));
        let p = m * Vector4::new(1.0, 0.0, 0.0, 1.0);
        // x axis yawed onto y, doubled, then shifted
        assert!(p.abs_diff_eq(&Vector4::new(5.0, 2.0, 0.0, 1.0), 1e-5));
    }

    #[test]
    fn test_angle_axes() {
        let p = rotation(FRAC_PI_2, 0.0, 0.0) * Vector4::new(0.0, 1.0, 0.0, 0.0);
        assert!(p.abs_diff_eq(&Vector4::new(0.0, 0.0, 1.0, 0.0), 1e-5));
        let p = rotation(0.0, FRAC_PI_2, 0.0) * Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert!(p.abs_diff_eq(&Vector4::new(1.0, 0.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_decompose_round_trip_random() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let pose = Pose {
                roll: rng.random_range(-1.5..1.5),
                pitch: rng.random_range(-PI + 0.01..PI - 0.01),
                yaw: rng.random_range(-PI + 0.01..PI - 0.01),
                x: rng.random_range(-50.0..50.0),
                y: rng.random_range(-50.0..50.0),
                z: rng.random_range(-50.0..50.0),
            };
            let scale = Scale::new(
                rng.random_range(0.1..4.0),
                rng.random_range(0.1..4.0),
                rng.random_range(0.1..4.0),
            );
            let edit = NodeEdit { pose, scale };
            let (applied, scale_matrix) = edit.to_matrices();
            let back = NodeEdit::from_matrices(&applied, &scale_matrix);
            assert_pose_eq(&back.pose, &pose);
            assert_eq!(back.scale, scale);
        }
    }

    #[test]
    fn test_gimbal_lock_reproduces_rotation() {
        let pose = Pose {
            roll: FRAC_PI_2,
            pitch: 0.4,
            yaw: 0.3,
            ..Default::default()
        };
        let m = compose(&pose, &Scale::default());
        let again = compose(&decompose(&m), &Scale::default());
        assert!(m.abs_diff_eq(&again, 1e-4));
    }

    #[test]
    fn test_reseeding_is_stable() {
        let edit = NodeEdit {
            pose: Pose {
                roll: 0.2,
                pitch: -0.7,
                yaw: 1.1,
                ..Pose::from_translation(1.0, 2.0, 3.0)
            },
            scale: Scale::new(1.0, 2.0, 0.5),
        };
        let (applied, scale) = edit.to_matrices();
        let (again, again_scale) = NodeEdit::from_matrices(&applied, &scale).to_matrices();
        assert!(applied.abs_diff_eq(&again, 1e-5));
        assert_eq!(scale, again_scale);
    }
}
