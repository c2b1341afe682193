/// Joint inputs for the articulated figure
///
/// Limb and accessory entries are angles in degrees. Eye entries are
/// openness: how far each eye cylinder extends out of the face beyond its
/// base length. Written by an animation or UI collaborator between frames;
/// the scene assembler only reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub left_arm: f32,
    pub right_arm: f32,
    pub left_hand: f32,
    pub right_hand: f32,
    pub left_leg: f32,
    pub right_leg: f32,
    pub left_foot: f32,
    pub right_foot: f32,
    /// Spin of the orange held in the right hand
    pub wrist_accessory: f32,
    pub left_eye: f32,
    pub right_eye: f32,
    /// Openness of the pupils, which sit slightly ahead of the eyes
    pub left_inner_eye: f32,
    pub right_inner_eye: f32,
}

impl Pose {
    pub fn rest() -> Self {
        Self {
            left_arm: 0.0,
            right_arm: 0.0,
            left_hand: 0.0,
            right_hand: 0.0,
            left_leg: 0.0,
            right_leg: 0.0,
            left_foot: 0.0,
            right_foot: 0.0,
            wrist_accessory: 0.0,
            left_eye: 0.0,
            right_eye: 0.0,
            left_inner_eye: 0.0,
            right_inner_eye: 0.0,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::rest()
    }
}
