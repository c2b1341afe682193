/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};
use rig3d_core::shading::{FrameUniforms, PartUniforms};
use rig3d_core::transform::{mvp_matrix, Transform};
use rig3d_core::{RenderSink, SceneError, SceneResult, VertexStream};
use std::io::Write;

use crate::shader::{Fragment, Shader};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: f32 = 2.0;

/// A vertex after the model and view-projection transforms
#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    clip: Vector4<f32>,
    world: Point3<f32>,
    normal: Vector3<f32>,
    uv: Vector2<f32>,
}

impl ClipVertex {
    fn lerp(&self, other: &ClipVertex, t: f32) -> ClipVertex {
        ClipVertex {
            clip: self.clip.lerp(&other.clip, t),
            world: Point3::from(self.world.coords.lerp(&other.world.coords, t)),
            normal: self.normal.lerp(&other.normal, t),
            uv: self.uv.lerp(&other.uv, t),
        }
    }

    /// Signed distance to the near plane in clip space (z >= -w)
    fn near_distance(&self) -> f32 {
        self.clip.z + self.clip.w
    }
}

/// A clip-space vertex mapped to the character grid
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
    inv_w: f32,
    source: ClipVertex,
}

/// ASCII renderer that rasterizes scene parts into terminal cells
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<[u8; 3]>,
    shader: Shader,
    frame: Option<FrameUniforms>,
    /// Model-view-projection of the pending part
    mvp: Matrix4<f32>,
    part: Option<PartUniforms>,
    normal_transform: Transform,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_shader(width, height, Shader::default())
    }

    pub fn with_shader(width: usize, height: usize, shader: Shader) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![[0, 0, 0]; size],
            shader,
            frame: None,
            mvp: Matrix4::identity(),
            part: None,
            normal_transform: Transform::identity(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        let size = width * height;
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.char_buffer = vec![' '; size];
        self.color_buffer = vec![[0, 0, 0]; size];
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill([0, 0, 0]);
    }

    pub fn char_at(&self, x: usize, y: usize) -> char {
        self.char_buffer[y * self.width + x]
    }

    pub fn color_at(&self, x: usize, y: usize) -> [u8; 3] {
        self.color_buffer[y * self.width + x]
    }

    /// Number of cells covered by geometry this frame
    pub fn covered_cells(&self) -> usize {
        self.char_buffer.iter().filter(|c| **c != ' ').count()
    }

    fn to_clip(&self, part: &PartUniforms, stream: &VertexStream, index: usize) -> ClipVertex {
        let p = &stream.positions[index * 3..index * 3 + 3];
        let n = &stream.normals[index * 3..index * 3 + 3];
        let uv = &stream.uvs[index * 2..index * 2 + 2];

        let local = Point3::new(p[0], p[1], p[2]);
        let world = part.model.transform_point(&local);
        let clip = self.mvp * local.to_homogeneous();
        ClipVertex {
            clip,
            world,
            normal: self
                .normal_transform
                .transform_normal(&Vector3::new(n[0], n[1], n[2])),
            uv: Vector2::new(uv[0], uv[1]),
        }
    }

    fn to_screen(&self, v: ClipVertex) -> ScreenVertex {
        let inv_w = 1.0 / v.clip.w;
        let ndc = v.clip.xyz() * inv_w;
        ScreenVertex {
            x: (ndc.x + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - ndc.y) * 0.5 * self.height as f32,
            depth: ndc.z,
            inv_w,
            source: v,
        }
    }

    fn render_triangle(&mut self, triangle: [ClipVertex; 3], frame: &FrameUniforms, part: &PartUniforms) {
        // Sutherland-Hodgman against the near plane only; the grid bounds
        // take care of the other sides
        let mut polygon: Vec<ClipVertex> = Vec::with_capacity(4);
        for i in 0..3 {
            let a = triangle[i];
            let b = triangle[(i + 1) % 3];
            let (da, db) = (a.near_distance(), b.near_distance());
            if da >= 0.0 {
                polygon.push(a);
            }
            if (da >= 0.0) != (db >= 0.0) {
                polygon.push(a.lerp(&b, da / (da - db)));
            }
        }
        if polygon.len() < 3 {
            return; // Triangle is clipped
        }

        let screen: Vec<ScreenVertex> = polygon
            .into_iter()
            .filter(|v| v.clip.w > 1e-6)
            .map(|v| self.to_screen(v))
            .collect();
        for i in 1..screen.len().saturating_sub(1) {
            self.rasterize_triangle([screen[0], screen[i], screen[i + 1]], frame, part);
        }
    }

    fn rasterize_triangle(&mut self, v: [ScreenVertex; 3], frame: &FrameUniforms, part: &PartUniforms) {
        let (v0, v1, v2) = (v[0], v[1], v[2]);

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as i64;
        let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i64).min(self.width as i64 - 1);
        let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as i64;
        let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i64).min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) = barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                let idx = y as usize * self.width + x as usize;
                if depth >= self.depth_buffer[idx] {
                    continue;
                }

                // perspective-correct attribute weights
                let (p0, p1, p2) = (w0 * v0.inv_w, w1 * v1.inv_w, w2 * v2.inv_w);
                let sum = p0 + p1 + p2;
                let (p0, p1, p2) = (p0 / sum, p1 / sum, p2 / sum);
                let (a, b, c) = (&v0.source, &v1.source, &v2.source);
                let fragment = Fragment {
                    world: Point3::from(a.world.coords * p0 + b.world.coords * p1 + c.world.coords * p2),
                    normal: a.normal * p0 + b.normal * p1 + c.normal * p2,
                    uv: a.uv * p0 + b.uv * p1 + c.uv * p2,
                };
                let rgb = self.shader.shade(&fragment, frame, part);

                self.depth_buffer[idx] = depth;
                self.char_buffer[idx] = luminosity_char(&rgb);
                self.color_buffer[idx] = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let [r, g, b] = self.color_buffer[idx];
                writer.queue(SetForegroundColor(Color::Rgb { r, g, b }))?;
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderSink for AsciiRenderer {
    fn begin_frame(&mut self, frame: &FrameUniforms) -> SceneResult<()> {
        self.clear();
        self.frame = Some(*frame);
        self.part = None;
        Ok(())
    }

    fn set_part_uniforms(&mut self, uniforms: &PartUniforms) -> SceneResult<()> {
        if let Some(frame) = &self.frame {
            self.mvp = mvp_matrix(&uniforms.model, &frame.view, &frame.projection);
        }
        self.normal_transform = Transform::from_matrix(uniforms.normal);
        self.part = Some(*uniforms);
        Ok(())
    }

    fn draw(&mut self, stream: &VertexStream) -> SceneResult<()> {
        let frame = self
            .frame
            .ok_or_else(|| SceneError::Sink("draw outside of a frame".to_string()))?;
        let part = self
            .part
            .take()
            .ok_or_else(|| SceneError::Sink("draw issued without part uniforms".to_string()))?;
        if stream.positions.len() % 9 != 0 {
            return Err(SceneError::Sink(format!(
                "vertex stream of {} floats is not whole triangles",
                stream.positions.len()
            )));
        }

        for t in 0..stream.vertex_count() / 3 {
            let triangle = [
                self.to_clip(&part, stream, t * 3),
                self.to_clip(&part, stream, t * 3 + 1),
                self.to_clip(&part, stream, t * 3 + 2),
            ];
            self.render_triangle(triangle, &frame, &part);
        }
        Ok(())
    }

    fn end_frame(&mut self) -> SceneResult<()> {
        self.frame = None;
        Ok(())
    }
}

/// Map a shaded color to a ramp character by its luminance
fn luminosity_char(rgb: &[f32; 3]) -> char {
    let luminance = (0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2]).clamp(0.0, 1.0);
    let index = (luminance * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
    LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)]
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig3d_core::{Camera, CameraConfig, Lighting, Primitive, ScenePart, TextureSelector};

    fn begin(renderer: &mut AsciiRenderer, camera: &Camera) {
        let lighting = Lighting::default();
        renderer
            .begin_frame(&FrameUniforms {
                view: camera.view_matrix().unwrap(),
                projection: camera.projection_matrix().unwrap(),
                light_position: lighting.position,
                light_color: lighting.color,
                camera_position: camera.eye(),
                lighting_enabled: false,
            })
            .unwrap();
    }

    fn camera_at(z: f32) -> Camera {
        Camera::new(CameraConfig {
            eye: Point3::new(0.0, 0.0, z),
            at: Point3::new(0.0, 0.0, 0.0),
            aspect: 40.0 / (20.0 * CELL_ASPECT),
            ..CameraConfig::default()
        })
        .unwrap()
    }

    fn centered_box(size: f32, color: [f32; 4]) -> ScenePart {
        ScenePart::new("box", Primitive::Box)
            .with_transform(
                Transform::identity()
                    .scale(size, size, size)
                    .translate(-0.5, -0.5, -0.5),
            )
            .with_color(color)
    }

    #[test]
    fn test_box_covers_center() {
        let mut renderer = AsciiRenderer::new(40, 20);
        begin(&mut renderer, &camera_at(4.0));
        centered_box(1.0, [1.0, 1.0, 1.0, 1.0]).draw(&mut renderer).unwrap();
        assert_ne!(renderer.char_at(20, 10), ' ');
        assert_eq!(renderer.char_at(0, 0), ' ');
    }

    #[test]
    fn test_nearer_part_wins() {
        let mut renderer = AsciiRenderer::new(40, 20);
        begin(&mut renderer, &camera_at(4.0));
        let far = ScenePart::new("far", Primitive::Box)
            .with_transform(Transform::identity().translate(-1.0, -1.0, -3.0).scale(2.0, 2.0, 1.0))
            .with_color([1.0, 0.0, 0.0, 1.0]);
        let near = centered_box(0.5, [0.0, 0.0, 1.0, 1.0]);
        near.draw(&mut renderer).unwrap();
        far.draw(&mut renderer).unwrap();
        assert_eq!(renderer.color_at(20, 10), [0, 0, 255]);
    }

    #[test]
    fn test_geometry_behind_camera_is_clipped_not_dropped() {
        let mut renderer = AsciiRenderer::new(40, 20);
        begin(&mut renderer, &camera_at(0.5));
        // floor slab running under and behind the eye
        ScenePart::new("floor", Primitive::Box)
            .with_transform(Transform::identity().translate(-5.0, -1.0, -5.0).scale(10.0, 0.1, 10.0))
            .with_texture(TextureSelector::ShowUv)
            .draw(&mut renderer)
            .unwrap();
        assert!(renderer.covered_cells() > 0);
        for x in 0..40 {
            assert_ne!(renderer.char_at(x, 19), ' ');
        }
    }

    #[test]
    fn test_draw_requires_frame_and_uniforms() {
        let mut renderer = AsciiRenderer::new(10, 10);
        let stream = rig3d_core::Mesh::cube().to_stream();
        assert!(RenderSink::draw(&mut renderer, &stream).is_err());

        begin(&mut renderer, &camera_at(4.0));
        assert!(RenderSink::draw(&mut renderer, &stream).is_err());
    }

    #[test]
    fn test_luminosity_ramp_ends() {
        assert_eq!(luminosity_char(&[0.0, 0.0, 0.0]), '.');
        assert_eq!(luminosity_char(&[2.0, 2.0, 2.0]), '@');
    }
}
