/// Geometry primitives for 3D rendering
///
/// All generators work in a canonical local frame: the box spans [0,1]^3, the
/// cylinder has radius 1 around the y axis with y in [0,1], and the sphere is
/// the unit sphere at the origin. Front faces wind counter-clockwise as seen
/// from outside.
use std::f32::consts::PI;

use nalgebra::{Point3, Vector2, Vector3};

use crate::error::{SceneError, SceneResult};

/// A 3D vertex with position, texture coordinate and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub uv: Vector2<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: [f32; 3], uv: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position: Point3::from(position),
            uv: Vector2::from(uv),
            normal: Vector3::from(normal),
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's winding
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

/// Parallel attribute arrays, three vertices per triangle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexStream {
    pub positions: Vec<f32>,
    pub uvs: Vec<f32>,
    pub normals: Vec<f32>,
}

impl VertexStream {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.triangles.len() * 3
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.triangles.iter().flat_map(|t| t.vertices.iter())
    }

    /// Flatten into position/UV/normal arrays for a render sink
    pub fn to_stream(&self) -> VertexStream {
        let count = self.vertex_count();
        let mut stream = VertexStream {
            positions: Vec::with_capacity(count * 3),
            uvs: Vec::with_capacity(count * 2),
            normals: Vec::with_capacity(count * 3),
        };
        for vertex in self.vertices() {
            stream.positions.extend_from_slice(vertex.position.coords.as_slice());
            stream.uvs.extend_from_slice(vertex.uv.as_slice());
            stream.normals.extend_from_slice(vertex.normal.as_slice());
        }
        stream
    }

    /// Unit cube over [0,1]^3: 6 faces, 2 triangles each
    pub fn cube() -> Self {
        // corners listed counter-clockwise as seen from outside, with uv per corner
        const FACES: [([f32; 3], [([f32; 3], [f32; 2]); 4]); 6] = [
            // front (+z)
            (
                [0.0, 0.0, 1.0],
                [
                    ([0.0, 0.0, 1.0], [0.0, 0.0]),
                    ([1.0, 0.0, 1.0], [1.0, 0.0]),
                    ([1.0, 1.0, 1.0], [1.0, 1.0]),
                    ([0.0, 1.0, 1.0], [0.0, 1.0]),
                ],
            ),
            // back (-z)
            (
                [0.0, 0.0, -1.0],
                [
                    ([1.0, 0.0, 0.0], [0.0, 0.0]),
                    ([0.0, 0.0, 0.0], [1.0, 0.0]),
                    ([0.0, 1.0, 0.0], [1.0, 1.0]),
                    ([1.0, 1.0, 0.0], [0.0, 1.0]),
                ],
            ),
            // top (+y)
            (
                [0.0, 1.0, 0.0],
                [
                    ([0.0, 1.0, 1.0], [0.0, 0.0]),
                    ([1.0, 1.0, 1.0], [1.0, 0.0]),
                    ([1.0, 1.0, 0.0], [1.0, 1.0]),
                    ([0.0, 1.0, 0.0], [0.0, 1.0]),
                ],
            ),
            // bottom (-y)
            (
                [0.0, -1.0, 0.0],
                [
                    ([0.0, 0.0, 0.0], [0.0, 0.0]),
                    ([1.0, 0.0, 0.0], [1.0, 0.0]),
                    ([1.0, 0.0, 1.0], [1.0, 1.0]),
                    ([0.0, 0.0, 1.0], [0.0, 1.0]),
                ],
            ),
            // right (+x)
            (
                [1.0, 0.0, 0.0],
                [
                    ([1.0, 0.0, 1.0], [0.0, 0.0]),
                    ([1.0, 0.0, 0.0], [1.0, 0.0]),
                    ([1.0, 1.0, 0.0], [1.0, 1.0]),
                    ([1.0, 1.0, 1.0], [0.0, 1.0]),
                ],
            ),
            // left (-x)
            (
                [-1.0, 0.0, 0.0],
                [
                    ([0.0, 0.0, 0.0], [0.0, 0.0]),
                    ([0.0, 0.0, 1.0], [1.0, 0.0]),
                    ([0.0, 1.0, 1.0], [1.0, 1.0]),
                    ([0.0, 1.0, 0.0], [0.0, 1.0]),
                ],
            ),
        ];

        let mut mesh = Self::with_capacity(12);
        for (normal, corners) in FACES {
            let v = corners.map(|(position, uv)| Vertex::new(position, uv, normal));
            // both triangles share the 0-2 diagonal
            mesh.add_triangle(Triangle::new(v[0], v[1], v[2]));
            mesh.add_triangle(Triangle::new(v[0], v[2], v[3]));
        }
        mesh
    }

    /// Faceted cylinder of radius 1 around the y axis, y in [0,1]
    ///
    /// Each of the `segments` wedges emits a top cap triangle, a bottom cap
    /// triangle and two side triangles, in that order.
    pub fn cylinder(segments: u32) -> SceneResult<Self> {
        if segments < 3 {
            return Err(SceneError::InvalidSegments(segments));
        }
        let step = 2.0 * PI / segments as f32;
        let mut mesh = Self::with_capacity(segments as usize * 4);

        for i in 0..segments {
            let a0 = i as f32 * step;
            // close the loop exactly on the first rim point
            let a1 = if i + 1 == segments { 0.0 } else { (i + 1) as f32 * step };
            let (s0, c0) = a0.sin_cos();
            let (s1, c1) = a1.sin_cos();
            let cap_uv = |c: f32, s: f32| [c * 0.5 + 0.5, s * 0.5 + 0.5];

            let up = [0.0, 1.0, 0.0];
            mesh.add_triangle(Triangle::new(
                Vertex::new([0.0, 1.0, 0.0], [0.5, 0.5], up),
                Vertex::new([c1, 1.0, s1], cap_uv(c1, s1), up),
                Vertex::new([c0, 1.0, s0], cap_uv(c0, s0), up),
            ));

            let down = [0.0, -1.0, 0.0];
            mesh.add_triangle(Triangle::new(
                Vertex::new([0.0, 0.0, 0.0], [0.5, 0.5], down),
                Vertex::new([c0, 0.0, s0], cap_uv(c0, s0), down),
                Vertex::new([c1, 0.0, s1], cap_uv(c1, s1), down),
            ));

            let u0 = i as f32 / segments as f32;
            let u1 = (i + 1) as f32 / segments as f32;
            let b0 = Vertex::new([c0, 0.0, s0], [u0, 0.0], [c0, 0.0, s0]);
            let b1 = Vertex::new([c1, 0.0, s1], [u1, 0.0], [c1, 0.0, s1]);
            let t0 = Vertex::new([c0, 1.0, s0], [u0, 1.0], [c0, 0.0, s0]);
            let t1 = Vertex::new([c1, 1.0, s1], [u1, 1.0], [c1, 0.0, s1]);
            mesh.add_triangle(Triangle::new(b0, t0, t1));
            mesh.add_triangle(Triangle::new(b0, t1, b1));
        }

        Ok(mesh)
    }

    /// Unit UV sphere sampled every `step` radians in polar and azimuthal angle
    ///
    /// UV is the normalized (polar, azimuth) pair, so the texture seams at the
    /// poles and along azimuth zero. A step wider than a range collapses that
    /// range to a single cell.
    pub fn sphere(step: f32) -> SceneResult<Self> {
        if !step.is_finite() || step <= 0.0 {
            return Err(SceneError::InvalidSphereStep(step));
        }
        let polar_steps = steps_to_cover(PI, step);
        let azimuth_steps = steps_to_cover(2.0 * PI, step);
        let mut mesh = Self::with_capacity(polar_steps * azimuth_steps * 2);

        let point = |t: f32, r: f32| {
            let p = [t.sin() * r.cos(), t.sin() * r.sin(), t.cos()];
            Vertex::new(p, [t / PI, r / (2.0 * PI)], p)
        };

        for i in 0..polar_steps {
            let t0 = i as f32 * step;
            let t1 = (t0 + step).min(PI);
            for j in 0..azimuth_steps {
                let r0 = j as f32 * step;
                let r1 = (r0 + step).min(2.0 * PI);

                let p1 = point(t0, r0);
                let p2 = point(t1, r0);
                let p3 = point(t0, r1);
                let p4 = point(t1, r1);
                mesh.add_triangle(Triangle::new(p1, p2, p4));
                mesh.add_triangle(Triangle::new(p1, p4, p3));
            }
        }

        Ok(mesh)
    }
}

/// Number of `step`-wide cells needed to cover `[0, range)`
fn steps_to_cover(range: f32, step: f32) -> usize {
    // tolerate rounding when step divides range evenly
    ((range / step) - 1e-4).ceil().max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_outward(mesh: &Mesh) {
        for triangle in &mesh.triangles {
            let edge1 = triangle.vertices[1].position - triangle.vertices[0].position;
            let edge2 = triangle.vertices[2].position - triangle.vertices[0].position;
            let face = edge1.cross(&edge2);
            if face.norm() < 1e-7 {
                continue; // pole slivers
            }
            let outward: Vector3<f32> = triangle.vertices.iter().map(|v| v.normal).sum();
            assert!(face.dot(&outward) > 0.0, "inward triangle {:?}", triangle);
        }
    }

    #[test]
    fn test_cube_counts_and_normals() {
        let cube = Mesh::cube();
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.vertex_count(), 36);
        for vertex in cube.vertices() {
            assert!((vertex.normal.norm() - 1.0).abs() < 1e-6);
            let nonzero = vertex.normal.iter().filter(|c| **c != 0.0).count();
            assert_eq!(nonzero, 1);
        }
    }

    #[test]
    fn test_cube_spans_unit_frame() {
        let cube = Mesh::cube();
        for vertex in cube.vertices() {
            for c in vertex.position.iter().chain(vertex.uv.iter()) {
                assert!(*c == 0.0 || *c == 1.0);
            }
        }
    }

    #[test]
    fn test_cube_winding_matches_normals() {
        let cube = Mesh::cube();
        for triangle in &cube.triangles {
            let face = triangle.calculate_normal();
            assert!((face - triangle.vertices[0].normal).norm() < 1e-6);
        }
    }

    #[test]
    fn test_cylinder_counts() {
        for n in [3, 8, 12, 37] {
            let mesh = Mesh::cylinder(n).unwrap();
            assert_eq!(mesh.triangle_count(), 4 * n as usize);
        }
    }

    #[test]
    fn test_cylinder_normals() {
        let mesh = Mesh::cylinder(10).unwrap();
        for (i, triangle) in mesh.triangles.iter().enumerate() {
            for vertex in &triangle.vertices {
                assert!((vertex.normal.norm() - 1.0).abs() < 1e-6);
                match i % 4 {
                    0 => assert_eq!(vertex.normal, Vector3::y()),
                    1 => assert_eq!(vertex.normal, -Vector3::y()),
                    _ => assert!(vertex.normal.dot(&Vector3::y()).abs() < 1e-6),
                }
            }
        }
        assert_outward(&mesh);
    }

    #[test]
    fn test_cylinder_rejects_few_segments() {
        assert_eq!(Mesh::cylinder(2), Err(SceneError::InvalidSegments(2)));
        assert_eq!(Mesh::cylinder(0), Err(SceneError::InvalidSegments(0)));
    }

    #[test]
    fn test_sphere_normals_equal_positions() {
        let mesh = Mesh::sphere(PI / 10.0).unwrap();
        assert_eq!(mesh.triangle_count(), 10 * 20 * 2);
        for vertex in mesh.vertices() {
            assert!((vertex.normal - vertex.position.coords).norm() < 1e-6);
            assert!((vertex.position.coords.norm() - 1.0).abs() < 1e-5);
            assert!(vertex.uv.iter().all(|c| (0.0..=1.0).contains(c)));
        }
        assert_outward(&mesh);
    }

    #[test]
    fn test_sphere_uneven_step_closes() {
        let mesh = Mesh::sphere(0.7).unwrap();
        let max_polar = mesh
            .vertices()
            .map(|v| v.uv.x)
            .fold(0.0f32, f32::max);
        assert!((max_polar - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_rejects_bad_step() {
        for step in [0.0, -0.1, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                Mesh::sphere(step),
                Err(SceneError::InvalidSphereStep(_))
            ));
        }
    }

    #[test]
    fn test_sphere_wide_step_is_one_cell() {
        // one polar band, azimuth split at 4 rad and clamped at 2*pi
        let mesh = Mesh::sphere(4.0).unwrap();
        assert_eq!(mesh.triangle_count(), 4);
        for vertex in mesh.vertices() {
            assert!((vertex.normal - vertex.position.coords).norm() < 1e-6);
        }
        assert_eq!(Mesh::sphere(10.0).unwrap().triangle_count(), 2);
    }

    #[test]
    fn test_generators_are_deterministic() {
        assert_eq!(Mesh::cylinder(9).unwrap(), Mesh::cylinder(9).unwrap());
        assert_eq!(Mesh::sphere(0.3).unwrap(), Mesh::sphere(0.3).unwrap());
    }

    #[test]
    fn test_stream_layout() {
        let stream = Mesh::cube().to_stream();
        assert_eq!(stream.vertex_count(), 36);
        assert_eq!(stream.uvs.len(), 72);
        assert_eq!(stream.normals.len(), 108);
        assert_eq!(&stream.normals[0..3], &[0.0, 0.0, 1.0]);
    }
}
