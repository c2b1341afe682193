/// RIG3D Core Library - Scene transform and rendering pipeline
///
/// This library provides the stateless core of the renderer: the matrix
/// kernel, the camera, procedural primitives, the per-part draw protocol and
/// the per-frame assembly of the articulated figure. Rendering backends plug
/// in through the `RenderSink` trait.

pub mod camera;
pub mod error;
pub mod geometry;
pub mod part;
pub mod pose;
pub mod scene;
pub mod shading;
pub mod sink;
pub mod transform;

// Re-export commonly used types
pub use camera::{Camera, CameraCommand, CameraConfig};
pub use error::{SceneError, SceneResult};
pub use geometry::{Mesh, Triangle, Vertex, VertexStream};
pub use part::{Primitive, ScenePart};
pub use pose::Pose;
pub use scene::{FigureFrames, FrameReport, SceneAssembler, SceneConfig};
pub use shading::{FrameUniforms, Lighting, PartUniforms, ShadingMode, TextureSelector};
pub use sink::{DrawCall, RecordingSink, RenderSink};
pub use transform::Transform;
