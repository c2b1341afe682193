/// Animation driver: turns elapsed seconds into joint angles and light motion
use nalgebra::Point3;
use rig3d_core::Pose;
use std::f32::consts::TAU;
use std::time::{Duration, Instant};

/// Seconds per full walk cycle
const STRIDE_PERIOD: f32 = 1.25;
const ARM_SWING: f32 = 30.0;
const LEG_SWING: f32 = 25.0;
/// Every so often the eyes pop out of the face for a moment
const POP_PERIOD: f32 = 4.0;
const POP_LENGTH: f32 = 0.6;
const POP_OPENNESS: f32 = 0.5;
const LIGHT_ORBIT_RADIUS: f32 = 2.5;

/// Pausable wall clock reporting elapsed seconds
#[derive(Debug, Clone)]
pub struct Clock {
    start: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            paused_at: None,
            paused_total: Duration::ZERO,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn toggle_pause(&mut self) {
        match self.paused_at.take() {
            Some(at) => self.paused_total += at.elapsed(),
            None => self.paused_at = Some(Instant::now()),
        }
    }

    pub fn elapsed_seconds(&self) -> f32 {
        let now = self.paused_at.unwrap_or_else(Instant::now);
        (now - self.start).saturating_sub(self.paused_total).as_secs_f32()
    }
}

/// Walk cycle with a spinning orange and eyes that pop out now and then
pub fn animate_pose(t: f32) -> Pose {
    let phase = (t / STRIDE_PERIOD) * TAU;
    let swing = phase.sin();

    let popping = (t % POP_PERIOD) < POP_LENGTH;
    let eye = if popping {
        POP_OPENNESS + 0.05 * (3.0 * t).sin()
    } else {
        0.0
    };

    Pose {
        left_arm: ARM_SWING * swing,
        right_arm: -ARM_SWING * swing,
        // hands flex forward only
        left_hand: 15.0 * swing.max(0.0),
        right_hand: 15.0 * (-swing).max(0.0),
        left_leg: -LEG_SWING * swing,
        right_leg: LEG_SWING * swing,
        left_foot: 10.0 * (phase + TAU / 4.0).sin().max(0.0),
        right_foot: 10.0 * (phase - TAU / 4.0).sin().max(0.0),
        wrist_accessory: (t * 90.0) % 360.0,
        left_eye: eye,
        right_eye: eye,
        left_inner_eye: eye,
        right_inner_eye: eye,
    }
}

/// Where a light reset parks the light
pub fn light_home() -> Point3<f32> {
    Point3::new(0.0, 1.0, -2.0)
}

/// Light circling above the figure
pub fn orbit_light(t: f32) -> Point3<f32> {
    let angle = t * 0.5;
    Point3::new(
        LIGHT_ORBIT_RADIUS * angle.cos(),
        2.0,
        LIGHT_ORBIT_RADIUS * angle.sin(),
    )
}
