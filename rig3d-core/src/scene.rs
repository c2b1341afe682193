/// Per-frame scene assembly: static scenery plus the articulated figure
///
/// The whole transform tree is rebuilt from the pose every frame. At each
/// joint the pivot translate and the joint rotation are applied first, the
/// result is captured as the child frame, and only then does the part add the
/// offset and scale for its own mesh. `Transform` is `Copy`, so a captured
/// frame can never be changed by later composition on the parent side.
use std::f32::consts::PI;

use nalgebra::{Point3, Vector3};

use crate::camera::Camera;
use crate::error::{SceneError, SceneResult};
use crate::part::{Primitive, ScenePart};
use crate::pose::Pose;
use crate::shading::{FrameUniforms, Lighting, TextureSelector};
use crate::sink::RenderSink;
use crate::transform::Transform;

/// Texture units the scenery expects the backend to have bound
pub const SKY_TEXTURE: u32 = 0;
pub const FLOOR_TEXTURE: u32 = 1;
pub const WALL_TEXTURE: u32 = 2;
pub const CLOTH_TEXTURE: u32 = 3;

const SKIN: [f32; 4] = [1.0, 0.8, 0.6, 1.0];
const SHIRT: [f32; 4] = [0.3, 0.55, 0.95, 1.0];
const TROUSERS: [f32; 4] = [0.25, 0.25, 0.35, 1.0];
const SHOES: [f32; 4] = [0.35, 0.2, 0.1, 1.0];
const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const BLACK: [f32; 4] = [0.05, 0.05, 0.05, 1.0];
const ORANGE: [f32; 4] = [1.0, 0.55, 0.0, 1.0];
/// Above 1.0 so the marker reads as emissive
const LIGHT_MARKER: [f32; 4] = [2.0, 2.0, 0.0, 1.0];

/// Tessellation and placement settings for the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    pub cylinder_segments: u32,
    pub sphere_step: f32,
    /// Coarser step for the large decorative sphere
    pub orb_step: f32,
    pub figure_origin: Vector3<f32>,
    pub light_marker_size: f32,
    /// Edge length of the inside-out room around the scene
    pub room_size: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            cylinder_segments: 12,
            sphere_step: PI / 10.0,
            orb_step: PI / 8.0,
            figure_origin: Vector3::new(0.0, 0.0, 0.0),
            light_marker_size: 0.1,
            room_size: 10.0,
        }
    }
}

/// Outcome of one frame; failed parts are listed by label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub drawn: usize,
    pub failed: Vec<&'static str>,
}

/// Captured joint frames of the figure for one pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureFrames {
    pub torso: Transform,
    pub left_shoulder: Transform,
    pub left_wrist: Transform,
    pub right_shoulder: Transform,
    pub right_wrist: Transform,
    pub orange: Transform,
    pub left_hip: Transform,
    pub left_ankle: Transform,
    pub right_hip: Transform,
    pub right_ankle: Transform,
    pub left_eye: Transform,
    pub right_eye: Transform,
    pub left_pupil: Transform,
    pub right_pupil: Transform,
}

/// Shoulder pivot, relative to the torso frame
pub const SHOULDER_OFFSET: Vector3<f32> = Vector3::new(0.375, 0.35, 0.0);
/// Wrist pivot, relative to the shoulder frame
pub const WRIST_OFFSET: Vector3<f32> = Vector3::new(0.0, -0.5, 0.0);
/// Orange seat, relative to the right wrist frame
pub const ORANGE_OFFSET: Vector3<f32> = Vector3::new(0.0, -0.2, 0.12);
/// Hip pivot, relative to the torso frame
pub const HIP_OFFSET: Vector3<f32> = Vector3::new(0.15, -0.4, 0.0);
/// Ankle pivot, relative to the hip frame
pub const ANKLE_OFFSET: Vector3<f32> = Vector3::new(0.0, -0.5, 0.0);
/// Left eye socket on the face, relative to the torso frame
pub const EYE_OFFSET: Vector3<f32> = Vector3::new(0.1, 0.7, 0.25);
/// Pupils sit this far ahead of the eye socket
pub const PUPIL_LEAD: f32 = 0.025;
/// Eye and pupil length at zero openness
pub const EYE_BASE: f32 = 0.04;
pub const PUPIL_BASE: f32 = 0.02;
const EYE_RADIUS: f32 = 0.06;
const PUPIL_RADIUS: f32 = 0.03;

impl FigureFrames {
    pub fn new(origin: &Transform, pose: &Pose) -> Self {
        let torso = *origin;

        let left_shoulder = torso
            .translate(SHOULDER_OFFSET.x, SHOULDER_OFFSET.y, SHOULDER_OFFSET.z)
            .rotate_x(pose.left_arm);
        let left_wrist = left_shoulder
            .translate(WRIST_OFFSET.x, WRIST_OFFSET.y, WRIST_OFFSET.z)
            .rotate_x(pose.left_hand);

        let right_shoulder = torso
            .translate(-SHOULDER_OFFSET.x, SHOULDER_OFFSET.y, SHOULDER_OFFSET.z)
            .rotate_x(pose.right_arm);
        let right_wrist = right_shoulder
            .translate(WRIST_OFFSET.x, WRIST_OFFSET.y, WRIST_OFFSET.z)
            .rotate_x(pose.right_hand);
        let orange = right_wrist
            .translate(ORANGE_OFFSET.x, ORANGE_OFFSET.y, ORANGE_OFFSET.z)
            .rotate_y(pose.wrist_accessory);

        let left_hip = torso
            .translate(HIP_OFFSET.x, HIP_OFFSET.y, HIP_OFFSET.z)
            .rotate_x(pose.left_leg);
        let left_ankle = left_hip
            .translate(ANKLE_OFFSET.x, ANKLE_OFFSET.y, ANKLE_OFFSET.z)
            .rotate_x(pose.left_foot);

        let right_hip = torso
            .translate(-HIP_OFFSET.x, HIP_OFFSET.y, HIP_OFFSET.z)
            .rotate_x(pose.right_leg);
        let right_ankle = right_hip
            .translate(ANKLE_OFFSET.x, ANKLE_OFFSET.y, ANKLE_OFFSET.z)
            .rotate_x(pose.right_foot);

        // eye frames turn local +y out of the face, along +z
        let e = EYE_OFFSET;
        let left_eye = torso.translate(e.x, e.y, e.z).rotate_x(90.0);
        let right_eye = torso.translate(-e.x, e.y, e.z).rotate_x(90.0);
        let left_pupil = torso.translate(e.x, e.y, e.z + PUPIL_LEAD).rotate_x(90.0);
        let right_pupil = torso.translate(-e.x, e.y, e.z + PUPIL_LEAD).rotate_x(90.0);

        Self {
            torso,
            left_shoulder,
            left_wrist,
            right_shoulder,
            right_wrist,
            orange,
            left_hip,
            left_ankle,
            right_hip,
            right_ankle,
            left_eye,
            right_eye,
            left_pupil,
            right_pupil,
        }
    }
}

/// Builds and draws the scene from pose, camera and lighting
#[derive(Debug, Clone)]
pub struct SceneAssembler {
    config: SceneConfig,
    show_normals: bool,
    global_rotation: Transform,
}

impl SceneAssembler {
    pub fn new(config: SceneConfig) -> SceneResult<Self> {
        if config.cylinder_segments < 3 {
            return Err(SceneError::InvalidSegments(config.cylinder_segments));
        }
        for step in [config.sphere_step, config.orb_step] {
            if !step.is_finite() || step <= 0.0 {
                return Err(SceneError::InvalidSphereStep(step));
            }
        }
        if !config.room_size.is_finite() || config.room_size <= 0.0 {
            return Err(SceneError::InvalidRoomSize(config.room_size));
        }
        Ok(Self {
            config,
            show_normals: false,
            global_rotation: Transform::identity(),
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn show_normals(&self) -> bool {
        self.show_normals
    }

    /// Draw every lit part with the normal debug view
    pub fn set_show_normals(&mut self, on: bool) {
        self.show_normals = on;
    }

    pub fn global_rotation(&self) -> Transform {
        self.global_rotation
    }

    /// Turn the whole scene about the world origin: yaw about y, then pitch
    /// about x
    pub fn set_global_rotation(&mut self, yaw_deg: f32, pitch_deg: f32) {
        self.global_rotation = Transform::identity().rotate_y(yaw_deg).rotate_x(pitch_deg);
    }

    fn cylinder(&self) -> Primitive {
        Primitive::Cylinder {
            segments: self.config.cylinder_segments,
        }
    }

    fn sphere(&self) -> Primitive {
        Primitive::Sphere {
            step: self.config.sphere_step,
        }
    }

    /// Every part of the frame in draw order, turned by the global rotation
    pub fn compose(&self, pose: &Pose, camera: &Camera, lighting: &Lighting) -> Vec<ScenePart> {
        let mut parts = self.scenery(camera, lighting);
        parts.extend(self.figure(pose));
        parts
            .into_iter()
            .map(|part| {
                let model = self.global_rotation.then(part.transform().matrix());
                part.with_transform(model)
            })
            .collect()
    }

    /// Independent root parts with no parent relationship
    pub fn scenery(&self, camera: &Camera, lighting: &Lighting) -> Vec<ScenePart> {
        let eye = camera.eye();
        let light = lighting.position;
        let marker = self.config.light_marker_size;
        let room = -self.config.room_size;
        let debug = self.show_normals;

        vec![
            // sky follows the eye so it is never reached
            ScenePart::new("sky", Primitive::Box)
                .with_transform(
                    Transform::identity()
                        .translate(eye.x, eye.y, eye.z)
                        .scale(200.0, 200.0, 200.0)
                        .translate(-0.5, -0.5, -0.5),
                )
                .with_color([0.6, 0.8, 1.0, 1.0])
                .with_texture(TextureSelector::Sample(SKY_TEXTURE)),
            // negative scale turns the box inside out around the scene
            ScenePart::new("room", Primitive::Box)
                .with_transform(
                    Transform::identity()
                        .scale(room, room, room)
                        .translate(-0.5, -0.5, -0.5),
                )
                .with_color([0.8, 0.8, 0.8, 1.0])
                .with_inward_normals()
                .show_normals(debug),
            ScenePart::new("floor", Primitive::Box)
                .with_transform(
                    Transform::identity()
                        .translate(0.0, -1.0, 0.0)
                        .scale(24.0, 0.01, 24.0)
                        .translate(-0.5, -1.0, -0.5),
                )
                .with_color([0.9, 0.9, 0.9, 1.0])
                .with_texture(TextureSelector::Sample(FLOOR_TEXTURE)),
            ScenePart::new("wall", Primitive::Box)
                .with_transform(
                    Transform::identity()
                        .translate(0.0, -1.0, -4.0)
                        .scale(8.0, 4.0, 0.2)
                        .translate(-0.5, 0.0, -0.5),
                )
                .with_color([0.8, 0.5, 0.4, 1.0])
                .with_texture(TextureSelector::Sample(WALL_TEXTURE))
                .show_normals(debug),
            ScenePart::new("light", Primitive::Box)
                .with_transform(
                    Transform::identity()
                        .translate(light.x, light.y, light.z)
                        .scale(marker, marker, marker)
                        .translate(-0.5, -0.5, -0.5),
                )
                .with_color(LIGHT_MARKER),
            ScenePart::new("orb", Primitive::Sphere { step: self.config.orb_step })
                .with_transform(
                    Transform::identity()
                        .translate(-2.5, 0.0, -2.0)
                        .scale(0.6, 0.6, 0.6),
                )
                .with_texture(TextureSelector::ShowNormal),
            ScenePart::new("uv_crate", Primitive::Box)
                .with_transform(
                    Transform::identity()
                        .translate(2.5, -1.0, -2.0)
                        .rotate_y(30.0)
                        .scale(0.8, 0.8, 0.8)
                        .translate(-0.5, 0.0, -0.5),
                )
                .with_texture(TextureSelector::ShowUv)
                .show_normals(debug),
        ]
    }

    /// The articulated figure, parents before children
    pub fn figure(&self, pose: &Pose) -> Vec<ScenePart> {
        let origin = self.config.figure_origin;
        let frames = FigureFrames::new(
            &Transform::identity().translate(origin.x, origin.y, origin.z),
            pose,
        );
        let torso = frames.torso;
        let mut parts = Vec::with_capacity(19);

        parts.push(
            ScenePart::new("torso", Primitive::Box)
                .with_transform(torso.translate(-0.3, -0.4, -0.2).scale(0.6, 0.8, 0.4))
                .with_color(SHIRT)
                .with_texture(TextureSelector::Sample(CLOTH_TEXTURE)),
        );

        // head and face features hang off the torso at fixed offsets
        parts.push(
            ScenePart::new("head", Primitive::Box)
                .with_transform(torso.translate(-0.25, 0.4, -0.25).scale(0.5, 0.5, 0.5))
                .with_color(SKIN),
        );
        for (label, x) in [("left_ear", 0.25), ("right_ear", -0.25)] {
            parts.push(
                ScenePart::new(label, self.sphere())
                    .with_transform(torso.translate(x, 0.8, 0.0).scale(0.08, 0.1, 0.04))
                    .with_color(SKIN),
            );
        }
        // eyes and pupils grow out of the face with their openness
        for (label, frame, openness) in [
            ("left_eye", frames.left_eye, pose.left_eye),
            ("right_eye", frames.right_eye, pose.right_eye),
        ] {
            parts.push(
                ScenePart::new(label, self.cylinder())
                    .with_transform(frame.scale(EYE_RADIUS, openness + EYE_BASE, EYE_RADIUS))
                    .with_color(WHITE),
            );
        }
        for (label, frame, openness) in [
            ("left_pupil", frames.left_pupil, pose.left_inner_eye),
            ("right_pupil", frames.right_pupil, pose.right_inner_eye),
        ] {
            parts.push(
                ScenePart::new(label, self.cylinder())
                    .with_transform(frame.scale(PUPIL_RADIUS, openness + PUPIL_BASE, PUPIL_RADIUS))
                    .with_color(BLACK),
            );
        }
        parts.push(
            ScenePart::new("nose", Primitive::Box)
                .with_transform(torso.translate(-0.04, 0.56, 0.25).scale(0.08, 0.08, 0.1))
                .with_color([0.95, 0.6, 0.5, 1.0]),
        );
        parts.push(
            ScenePart::new("mouth", Primitive::Box)
                .with_transform(torso.translate(-0.1, 0.46, 0.25).scale(0.2, 0.03, 0.01))
                .with_color([0.6, 0.1, 0.1, 1.0]),
        );

        // arms hang from the shoulders, hands from the wrists
        for (arm, hand, shoulder, wrist) in [
            ("left_arm", "left_hand", frames.left_shoulder, frames.left_wrist),
            ("right_arm", "right_hand", frames.right_shoulder, frames.right_wrist),
        ] {
            parts.push(
                ScenePart::new(arm, Primitive::Box)
                    .with_transform(shoulder.translate(-0.075, -0.5, -0.075).scale(0.15, 0.5, 0.15))
                    .with_color(SHIRT)
                    .with_texture(TextureSelector::Sample(CLOTH_TEXTURE)),
            );
            parts.push(
                ScenePart::new(hand, Primitive::Box)
                    .with_transform(wrist.translate(-0.08, -0.16, -0.08).scale(0.16, 0.16, 0.16))
                    .with_color(SKIN),
            );
        }
        parts.push(
            ScenePart::new("orange", self.sphere())
                .with_transform(frames.orange.scale(0.09, 0.09, 0.09))
                .with_color(ORANGE),
        );

        for (leg, foot, hip, ankle) in [
            ("left_leg", "left_foot", frames.left_hip, frames.left_ankle),
            ("right_leg", "right_foot", frames.right_hip, frames.right_ankle),
        ] {
            parts.push(
                ScenePart::new(leg, self.cylinder())
                    .with_transform(hip.translate(0.0, -0.5, 0.0).scale(0.1, 0.5, 0.1))
                    .with_color(TROUSERS),
            );
            parts.push(
                ScenePart::new(foot, Primitive::Box)
                    .with_transform(ankle.translate(-0.1, -0.1, -0.1).scale(0.2, 0.1, 0.35))
                    .with_color(SHOES),
            );
        }

        parts
            .into_iter()
            .map(|part| part.show_normals(self.show_normals))
            .collect()
    }

    /// Draw a whole frame; a failing part is logged and skipped
    pub fn render_frame(
        &self,
        pose: &Pose,
        camera: &Camera,
        lighting: &Lighting,
        sink: &mut dyn RenderSink,
    ) -> SceneResult<FrameReport> {
        let frame = FrameUniforms {
            view: camera.view_matrix()?,
            projection: camera.projection_matrix()?,
            light_position: self.global_rotation.transform_point(&lighting.position),
            light_color: lighting.color,
            camera_position: camera.eye(),
            lighting_enabled: lighting.enabled,
        };
        sink.begin_frame(&frame)?;

        let mut report = FrameReport::default();
        for part in self.compose(pose, camera, lighting) {
            match part.draw(sink) {
                Ok(()) => report.drawn += 1,
                Err(err) => {
                    log::error!("part {} failed to draw: {}", part.label(), err);
                    report.failed.push(part.label());
                }
            }
        }

        sink.end_frame()?;
        log::debug!(
            "frame drawn: {} parts, {} failed",
            report.drawn,
            report.failed.len()
        );
        Ok(report)
    }
}

impl Default for SceneAssembler {
    fn default() -> Self {
        Self {
            config: SceneConfig::default(),
            show_normals: false,
            global_rotation: Transform::identity(),
        }
    }
}

/// World position of `offset` expressed in `frame`
pub fn attach_point(frame: &Transform, offset: &Vector3<f32>) -> Point3<f32> {
    frame.transform_point(&Point3::from(*offset))
}
