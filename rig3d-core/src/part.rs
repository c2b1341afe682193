/// Drawable scene parts and the per-part draw protocol
use crate::error::SceneResult;
use crate::geometry::Mesh;
use crate::shading::{PartUniforms, TextureSelector};
use crate::sink::RenderSink;
use crate::transform::Transform;

/// Geometry a part draws, with its tessellation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Box,
    Cylinder { segments: u32 },
    Sphere { step: f32 },
}

impl Primitive {
    pub fn generate(&self) -> SceneResult<Mesh> {
        match *self {
            Primitive::Box => Ok(Mesh::cube()),
            Primitive::Cylinder { segments } => Mesh::cylinder(segments),
            Primitive::Sphere { step } => Mesh::sphere(step),
        }
    }
}

/// A transient drawable: one primitive, one model matrix, one material
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePart {
    label: &'static str,
    primitive: Primitive,
    transform: Transform,
    color: [f32; 4],
    texture: TextureSelector,
    inward: bool,
}

impl ScenePart {
    pub fn new(label: &'static str, primitive: Primitive) -> Self {
        Self {
            label,
            primitive,
            transform: Transform::identity(),
            color: [1.0, 1.0, 1.0, 1.0],
            texture: TextureSelector::ShowColor,
            inward: false,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_texture(mut self, texture: TextureSelector) -> Self {
        self.texture = texture;
        self
    }

    /// Flip the derived normals so a part seen from inside is lit from inside
    pub fn with_inward_normals(mut self) -> Self {
        self.inward = true;
        self
    }

    /// Switch to the normal debug view when `on`
    pub fn show_normals(self, on: bool) -> Self {
        if on {
            self.with_texture(TextureSelector::ShowNormal)
        } else {
            self
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn texture(&self) -> TextureSelector {
        self.texture
    }

    /// Derived from the current model matrix; identity if it is singular
    pub fn normal_matrix(&self) -> Transform {
        let normal = self.transform.normal_matrix();
        if self.inward {
            Transform::from_matrix(-normal.into_matrix())
        } else {
            normal
        }
    }

    pub fn uniforms(&self) -> PartUniforms {
        PartUniforms {
            model: *self.transform.matrix(),
            normal: self.normal_matrix().into_matrix(),
            color: self.color,
            texture: self.texture.to_wire(),
        }
    }

    /// Push this part's uniforms, generate its geometry and draw it
    pub fn draw(&self, sink: &mut dyn RenderSink) -> SceneResult<()> {
        sink.set_part_uniforms(&self.uniforms())?;
        let mesh = self.primitive.generate()?;
        log::trace!(
            "draw {} ({} triangles, texture {:?})",
            self.label,
            mesh.triangle_count(),
            self.texture
        );
        sink.draw(&mesh.to_stream())
    }
}
