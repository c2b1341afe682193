/// Error type shared by the math kernel, camera, generators and draw protocol
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("cannot normalize a zero-length vector")]
    ZeroLengthVector,
    #[error("degenerate camera: {0}")]
    DegenerateCamera(&'static str),
    #[error("invalid projection (fov {fov_deg}, aspect {aspect}, near {near}, far {far})")]
    InvalidProjection {
        fov_deg: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    #[error("camera speeds must be finite (move {move_speed}, turn {turn_speed})")]
    InvalidSpeed { move_speed: f32, turn_speed: f32 },
    #[error("cylinder needs at least 3 segments, got {0}")]
    InvalidSegments(u32),
    #[error("sphere step must be finite and positive, got {0}")]
    InvalidSphereStep(f32),
    #[error("room size must be finite and positive, got {0}")]
    InvalidRoomSize(f32),
    #[error("rotation axis has zero length")]
    ZeroRotationAxis,
    #[error("matrix is not invertible")]
    SingularMatrix,
    #[error("render sink failure: {0}")]
    Sink(String),
}

pub type SceneResult<T> = Result<T, SceneError>;
