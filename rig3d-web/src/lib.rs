/// RIG3D Web - WASM bindings for a browser-side WebGL backend
///
/// The browser owns the canvas, shaders and textures. This crate owns the
/// camera, pose and scene assembly, and hands each frame over as one flat
/// `Float32Array` the JavaScript side walks draw by draw.
use rig3d_core::shading::{FrameUniforms, PartUniforms};
use rig3d_core::{
    Camera, CameraCommand, Lighting, Pose, RenderSink, SceneAssembler, SceneConfig, SceneError,
    SceneResult, VertexStream,
};
use wasm_bindgen::prelude::*;

/// Floats preceding each draw's vertex data:
/// texture selector, rgba color, model matrix, normal matrix, vertex count
pub const DRAW_HEADER_LEN: usize = 1 + 4 + 16 + 16 + 1;

/// Sink that serializes every draw into one buffer
///
/// Per draw: the header described by [`DRAW_HEADER_LEN`], then positions,
/// UVs and normals for `vertex count` vertices. Matrices are column-major.
#[derive(Debug, Default)]
pub struct PackingSink {
    frame: Option<FrameUniforms>,
    pending: Option<PartUniforms>,
    buffer: Vec<f32>,
    draws: usize,
}

impl PackingSink {
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn frame(&self) -> Option<&FrameUniforms> {
        self.frame.as_ref()
    }
}

impl RenderSink for PackingSink {
    fn begin_frame(&mut self, frame: &FrameUniforms) -> SceneResult<()> {
        self.frame = Some(*frame);
        self.buffer.clear();
        self.draws = 0;
        Ok(())
    }

    fn set_part_uniforms(&mut self, uniforms: &PartUniforms) -> SceneResult<()> {
        self.pending = Some(*uniforms);
        Ok(())
    }

    fn draw(&mut self, stream: &VertexStream) -> SceneResult<()> {
        let part = self
            .pending
            .take()
            .ok_or_else(|| SceneError::Sink("draw issued without part uniforms".to_string()))?;
        self.buffer.push(part.texture as f32);
        self.buffer.extend_from_slice(&part.color);
        self.buffer.extend_from_slice(part.model.as_slice());
        self.buffer.extend_from_slice(part.normal.as_slice());
        self.buffer.push(stream.vertex_count() as f32);
        self.buffer.extend_from_slice(&stream.positions);
        self.buffer.extend_from_slice(&stream.uvs);
        self.buffer.extend_from_slice(&stream.normals);
        self.draws += 1;
        Ok(())
    }
}

/// Lighting uniforms of a frame: light position, rgba color, enabled flag
pub const LIGHTING_LEN: usize = 3 + 4 + 1;

pub fn pack_lighting(frame: &FrameUniforms) -> Vec<f32> {
    let mut out = Vec::with_capacity(LIGHTING_LEN);
    out.extend_from_slice(frame.light_position.coords.as_slice());
    out.extend_from_slice(&frame.light_color);
    out.push(if frame.lighting_enabled { 1.0 } else { 0.0 });
    out
}

fn parse_command(name: &str) -> Option<CameraCommand> {
    let command = match name {
        "forward" => CameraCommand::Forward,
        "backward" => CameraCommand::Backward,
        "left" => CameraCommand::Left,
        "right" => CameraCommand::Right,
        "up" => CameraCommand::Up,
        "down" => CameraCommand::Down,
        "pan_left" => CameraCommand::PanLeft,
        "pan_right" => CameraCommand::PanRight,
        _ => return None,
    };
    Some(command)
}

fn joint_mut<'a>(pose: &'a mut Pose, name: &str) -> Option<&'a mut f32> {
    let joint = match name {
        "left_arm" => &mut pose.left_arm,
        "right_arm" => &mut pose.right_arm,
        "left_hand" => &mut pose.left_hand,
        "right_hand" => &mut pose.right_hand,
        "left_leg" => &mut pose.left_leg,
        "right_leg" => &mut pose.right_leg,
        "left_foot" => &mut pose.left_foot,
        "right_foot" => &mut pose.right_foot,
        "wrist_accessory" => &mut pose.wrist_accessory,
        "left_eye" => &mut pose.left_eye,
        "right_eye" => &mut pose.right_eye,
        "left_inner_eye" => &mut pose.left_inner_eye,
        "right_inner_eye" => &mut pose.right_inner_eye,
        _ => return None,
    };
    Some(joint)
}

fn js_error(err: SceneError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WebRenderer {
    assembler: SceneAssembler,
    camera: Camera,
    pose: Pose,
    lighting: Lighting,
    sink: PackingSink,
}

#[wasm_bindgen]
impl WebRenderer {
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> Result<WebRenderer, JsValue> {
        Ok(WebRenderer {
            assembler: SceneAssembler::new(SceneConfig::default()).map_err(js_error)?,
            camera: Camera::with_viewport(width, height).map_err(js_error)?,
            pose: Pose::rest(),
            lighting: Lighting::default(),
            sink: PackingSink::default(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), JsValue> {
        self.camera
            .set_aspect(width as f32 / height.max(1) as f32)
            .map_err(js_error)
    }

    /// Apply one of the eight camera commands by name
    pub fn command(&mut self, name: &str) -> Result<(), JsValue> {
        let command = parse_command(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown camera command: {name}")))?;
        self.camera.apply(command).map_err(js_error)
    }

    /// Set a joint input: degrees for limbs, openness for eyes and pupils
    pub fn set_joint(&mut self, name: &str, value: f32) -> Result<(), JsValue> {
        let joint = joint_mut(&mut self.pose, name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown joint: {name}")))?;
        *joint = value;
        Ok(())
    }

    pub fn set_light(&mut self, x: f32, y: f32, z: f32, enabled: bool) {
        self.lighting.position = nalgebra::Point3::new(x, y, z);
        self.lighting.enabled = enabled;
    }

    pub fn set_light_color(&mut self, r: f32, g: f32, b: f32) {
        self.lighting.color = [r, g, b, 1.0];
    }

    /// Draw every lit part with the normal debug view
    pub fn set_show_normals(&mut self, on: bool) {
        self.assembler.set_show_normals(on);
    }

    /// Turn the whole scene, e.g. from a mouse drag
    pub fn set_global_rotation(&mut self, yaw_deg: f32, pitch_deg: f32) {
        self.assembler.set_global_rotation(yaw_deg, pitch_deg);
    }

    /// Assemble and pack the current frame
    pub fn render(&mut self) -> Result<Vec<f32>, JsValue> {
        let report = self
            .assembler
            .render_frame(&self.pose, &self.camera, &self.lighting, &mut self.sink)
            .map_err(js_error)?;
        if !report.failed.is_empty() {
            log::warn!("parts skipped: {:?}", report.failed);
        }
        Ok(self.sink.buffer().to_vec())
    }

    /// Column-major view and projection matrices of the last frame, 32 floats
    pub fn view_projection(&self) -> Vec<f32> {
        self.sink
            .frame()
            .map(|f| {
                let mut out = f.view.as_slice().to_vec();
                out.extend_from_slice(f.projection.as_slice());
                out
            })
            .unwrap_or_default()
    }

    /// Lighting uniforms of the last frame, `LIGHTING_LEN` floats
    pub fn lighting(&self) -> Vec<f32> {
        self.sink.frame().map(pack_lighting).unwrap_or_default()
    }

    pub fn camera_position(&self) -> Vec<f32> {
        self.camera.eye().coords.as_slice().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_frame_layout() {
        let assembler = SceneAssembler::new(SceneConfig::default()).unwrap();
        let mut sink = PackingSink::default();
        let report = assembler
            .render_frame(&Pose::rest(), &Camera::default(), &Lighting::default(), &mut sink)
            .unwrap();
        assert_eq!(sink.draws(), report.drawn);

        // walk the buffer draw by draw
        let buffer = sink.buffer();
        let mut offset = 0;
        let mut draws = 0;
        while offset < buffer.len() {
            let vertices = buffer[offset + DRAW_HEADER_LEN - 1] as usize;
            assert_eq!(vertices % 3, 0);
            offset += DRAW_HEADER_LEN + vertices * 8;
            draws += 1;
        }
        assert_eq!(offset, buffer.len());
        assert_eq!(draws, report.drawn);
        // first draw is the sky, sampling unit 0
        assert_eq!(buffer[0], 0.0);
    }

    #[test]
    fn test_frame_lighting_is_relayed() {
        let mut assembler = SceneAssembler::new(SceneConfig::default()).unwrap();
        assembler.set_show_normals(true);
        let lighting = Lighting {
            color: [0.2, 0.4, 0.6, 1.0],
            enabled: false,
            ..Lighting::default()
        };
        let mut sink = PackingSink::default();
        assembler
            .render_frame(&Pose::rest(), &Camera::default(), &lighting, &mut sink)
            .unwrap();

        let packed = pack_lighting(sink.frame().unwrap());
        assert_eq!(packed.len(), LIGHTING_LEN);
        assert_eq!(&packed[0..3], lighting.position.coords.as_slice());
        assert_eq!(&packed[3..7], &[0.2, 0.4, 0.6, 1.0]);
        assert_eq!(packed[7], 0.0);

        // the room follows the sky and shows its normals
        let sky_vertices = sink.buffer()[DRAW_HEADER_LEN - 1] as usize;
        let room = DRAW_HEADER_LEN + sky_vertices * 8;
        assert_eq!(sink.buffer()[room], -3.0);
    }

    #[test]
    fn test_names_cover_every_input() {
        for name in [
            "forward", "backward", "left", "right", "up", "down", "pan_left", "pan_right",
        ] {
            assert!(parse_command(name).is_some());
        }
        assert!(parse_command("jump").is_none());

        let mut pose = Pose::rest();
        *joint_mut(&mut pose, "right_hand").unwrap() = 42.0;
        assert_eq!(pose.right_hand, 42.0);
        assert!(joint_mut(&mut pose, "tail").is_none());
    }
}
