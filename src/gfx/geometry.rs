//! # Procedural Geometry
//!
//! Primitive shapes for the built-in drawables, plus the normal and tangent
//! generators the importer uses for assets that omit them.
//!
//! All shapes use counter-clockwise front faces.

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};
use std::f32::consts::PI;

use super::vertex::{ElementType, VertexData, VertexLayout};

/// Generated geometry with optional per-vertex attributes
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Applies `matrix` to positions and its inverse-transpose to directions
    pub fn transform(&mut self, matrix: Matrix4<f32>) {
        for p in &mut self.positions {
            let v = matrix * Vector4::new(p[0], p[1], p[2], 1.0);
            *p = [v.x, v.y, v.z];
        }

        let linear = Matrix3::from_cols(matrix.x.truncate(), matrix.y.truncate(), matrix.z.truncate());
        let normal_matrix = linear.invert().map(|m| m.transpose()).unwrap_or(linear);
        for n in &mut self.normals {
            let v = (normal_matrix * Vector3::from(*n)).normalize();
            *n = v.into();
        }
        for t in self.tangents.iter_mut().chain(self.bitangents.iter_mut()) {
            let v = (linear * Vector3::from(*t)).normalize();
            *t = v.into();
        }
    }

    /// Interleaves the attributes named by `layout`
    ///
    /// Attributes missing from this geometry are filled with zeros.
    pub fn to_vertex_data(&self, layout: &VertexLayout) -> VertexData {
        let mut data = VertexData::with_capacity(layout.clone(), self.positions.len());
        let zero3 = [0.0f32; 3];
        let zero2 = [0.0f32; 2];
        for i in 0..self.positions.len() {
            let mut attributes: Vec<&[f32]> = Vec::with_capacity(layout.elements().len());
            for element in layout.elements() {
                let values: &[f32] = match element {
                    ElementType::Position3D => &self.positions[i],
                    ElementType::Normal => self.normals.get(i).unwrap_or(&zero3),
                    ElementType::Tangent => self.tangents.get(i).unwrap_or(&zero3),
                    ElementType::Bitangent => self.bitangents.get(i).unwrap_or(&zero3),
                    ElementType::Texture2D => self.tex_coords.get(i).unwrap_or(&zero2),
                };
                attributes.push(values);
            }
            data.emplace_back(&attributes);
        }
        data
    }
}

/// Generate a UV sphere of radius 1.0 centered at the origin
///
/// # Arguments
/// * `longitude_segments` - Number of vertical segments (longitude lines)
/// * `latitude_segments` - Number of horizontal segments (latitude lines)
pub fn generate_sphere(longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::default();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let p = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            data.positions.push(p);
            data.normals.push(p);
            data.tex_coords
                .push([long as f32 / long_segs as f32, lat as f32 / lat_segs as f32]);
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            data.indices.extend_from_slice(&[first, first + 1, second]);
            data.indices.extend_from_slice(&[second, first + 1, second + 1]);
        }
    }

    data
}

/// Generate a plane in the XY plane facing +Z, with tangent frame and UVs
///
/// UV (0, 0) is the top-left corner so images appear upright when viewed
/// from the front. The bitangent follows increasing V, i.e. points down.
pub fn generate_plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::default();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    for y in 0..=h_segs {
        let v = y as f32 / h_segs as f32;
        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            data.positions.push([(u - 0.5) * width, (v - 0.5) * height, 0.0]);
            data.normals.push([0.0, 0.0, 1.0]);
            data.tangents.push([1.0, 0.0, 0.0]);
            data.bitangents.push([0.0, -1.0, 0.0]);
            data.tex_coords.push([u, 1.0 - v]);
        }
    }

    for y in 0..h_segs {
        for x in 0..w_segs {
            let i = y * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;
            data.indices.extend_from_slice(&[i, i + 1, next_row]);
            data.indices.extend_from_slice(&[next_row, i + 1, next_row + 1]);
        }
    }

    data
}

/// Smooth per-vertex normals from area-weighted face normals
pub fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        let v0 = Vector3::from(positions[i0]);
        let v1 = Vector3::from(positions[i1]);
        let v2 = Vector3::from(positions[i2]);
        let face_normal = (v1 - v0).cross(v2 - v0);
        for i in [i0, i1, i2] {
            normals[i] += face_normal;
        }
    }

    normals
        .into_iter()
        .map(|n| {
            if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

/// Per-vertex tangents and bitangents from UV derivatives
///
/// Tangents are orthogonalized against the vertex normal. Degenerate UV
/// triangles are skipped; vertices that only touch such triangles get an
/// arbitrary frame perpendicular to their normal.
pub fn compute_tangents(
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    indices: &[u32],
) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let zero = Vector3::new(0.0f32, 0.0, 0.0);
    let mut tangents = vec![zero; positions.len()];
    let mut bitangents = vec![zero; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        let e1 = Vector3::from(positions[i1]) - Vector3::from(positions[i0]);
        let e2 = Vector3::from(positions[i2]) - Vector3::from(positions[i0]);
        let du1 = tex_coords[i1][0] - tex_coords[i0][0];
        let dv1 = tex_coords[i1][1] - tex_coords[i0][1];
        let du2 = tex_coords[i2][0] - tex_coords[i0][0];
        let dv2 = tex_coords[i2][1] - tex_coords[i0][1];

        let det = du1 * dv2 - du2 * dv1;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (e1 * dv2 - e2 * dv1) * r;
        let bitangent = (e2 * du1 - e1 * du2) * r;
        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    let mut out_tangents = Vec::with_capacity(positions.len());
    let mut out_bitangents = Vec::with_capacity(positions.len());
    for i in 0..positions.len() {
        let n = Vector3::from(normals[i]);
        let mut t = tangents[i] - n * n.dot(tangents[i]);
        if t.magnitude2() <= f32::EPSILON {
            // any vector perpendicular to n
            let axis = if n.x.abs() < 0.9 { Vector3::unit_x() } else { Vector3::unit_y() };
            t = axis - n * n.dot(axis);
        }
        let t = t.normalize();
        let mut b = n.cross(t);
        if b.dot(bitangents[i]) < 0.0 {
            b = -b;
        }
        out_tangents.push(t.into());
        out_bitangents.push(b.into());
    }

    (out_tangents, out_bitangents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(data: &GeometryData, triangle: usize) -> Vector3<f32> {
        let idx = &data.indices[triangle * 3..triangle * 3 + 3];
        let p = |i: u32| Vector3::from(data.positions[i as usize]);
        (p(idx[1]) - p(idx[0])).cross(p(idx[2]) - p(idx[0]))
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(8, 6);
        assert_eq!(sphere.vertex_count(), 9 * 7);
        assert_eq!(sphere.triangle_count(), 8 * 6 * 2);
        assert_eq!(sphere.positions.len(), sphere.normals.len());
    }

    #[test]
    fn test_sphere_faces_point_outward() {
        let sphere = generate_sphere(12, 8);
        // a triangle in the second band, away from the degenerate pole
        let t = 12 * 2 * 2 + 1;
        let centroid: Vector3<f32> = sphere.indices[t * 3..t * 3 + 3]
            .iter()
            .map(|&i| Vector3::from(sphere.positions[i as usize]))
            .fold(Vector3::new(0.0, 0.0, 0.0), |a, b| a + b);
        assert!(face_normal(&sphere, t).dot(centroid) > 0.0);
    }

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertex_count(), 9);
        assert_eq!(plane.indices.len(), 24);
        assert!(face_normal(&plane, 0).z > 0.0);
    }

    #[test]
    fn test_compute_normals_for_flat_quad() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = compute_normals(&positions, &[0, 1, 2, 2, 3, 0]);
        for n in normals {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_compute_tangents_follow_uv_axes() {
        let plane = generate_plane(1.0, 1.0, 1, 1);
        let (tangents, bitangents) =
            compute_tangents(&plane.positions, &plane.normals, &plane.tex_coords, &plane.indices);
        for (t, b) in tangents.iter().zip(&bitangents) {
            assert!((t[0] - 1.0).abs() < 1e-5);
            // v grows downwards in the image, so the bitangent points down the plane
            assert!((b[1] + 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_to_vertex_data_respects_layout() {
        let plane = generate_plane(1.0, 1.0, 1, 1);
        let layout = VertexLayout::new()
            .append(ElementType::Position3D)
            .append(ElementType::Texture2D);
        let data = plane.to_vertex_data(&layout);
        assert_eq!(data.len(), 4);
        assert_eq!(data.as_bytes().len(), 4 * 20);
    }
}
