/// Render-state sink: the backend that receives uniforms and vertex batches
use crate::error::{SceneError, SceneResult};
use crate::geometry::VertexStream;
use crate::shading::{FrameUniforms, PartUniforms};

/// A single logical device context.
///
/// Calls arrive as `begin_frame`, then for each part exactly one
/// `set_part_uniforms` followed by one `draw`, then `end_frame`. Taking
/// `&mut self` keeps two parts from ever being mid-draw at once.
pub trait RenderSink {
    fn begin_frame(&mut self, frame: &FrameUniforms) -> SceneResult<()>;

    fn set_part_uniforms(&mut self, uniforms: &PartUniforms) -> SceneResult<()>;

    /// Draw `stream` with the uniforms most recently set
    fn draw(&mut self, stream: &VertexStream) -> SceneResult<()>;

    fn end_frame(&mut self) -> SceneResult<()> {
        Ok(())
    }
}

/// One completed draw as seen by the sink
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub uniforms: PartUniforms,
    pub stream: VertexStream,
}

/// Sink that records every frame and draw instead of rasterizing
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub frames: Vec<FrameUniforms>,
    pub draws: Vec<DrawCall>,
    pending: Option<PartUniforms>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.draws.clear();
        self.pending = None;
    }
}

impl RenderSink for RecordingSink {
    fn begin_frame(&mut self, frame: &FrameUniforms) -> SceneResult<()> {
        self.frames.push(*frame);
        Ok(())
    }

    fn set_part_uniforms(&mut self, uniforms: &PartUniforms) -> SceneResult<()> {
        self.pending = Some(*uniforms);
        Ok(())
    }

    fn draw(&mut self, stream: &VertexStream) -> SceneResult<()> {
        let uniforms = self
            .pending
            .take()
            .ok_or_else(|| SceneError::Sink("draw issued without part uniforms".to_string()))?;
        self.draws.push(DrawCall {
            uniforms,
            stream: stream.clone(),
        });
        Ok(())
    }
}
