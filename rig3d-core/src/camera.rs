/// First-person camera and projection utilities
use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3};

use crate::error::{SceneError, SceneResult};
use crate::transform::{check_look_at, cross, normalize, Transform};

/// The eight discrete camera commands a frontend can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCommand {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    PanLeft,
    PanRight,
}

/// Startup values for a [`Camera`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub eye: Point3<f32>,
    pub at: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub move_speed: f32,
    /// Pan step in degrees
    pub turn_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Point3::new(0.0, 0.5, 4.0),
            at: Point3::new(0.0, 0.5, -96.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: 60.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            move_speed: 0.2,
            turn_speed: 5.0,
        }
    }
}

/// Camera owning eye/at/up; the view matrix is always derived on demand
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    eye: Point3<f32>,
    at: Point3<f32>,
    up: Vector3<f32>,
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    move_speed: f32,
    turn_speed: f32,
}

impl Camera {
    pub fn new(config: CameraConfig) -> SceneResult<Self> {
        check_look_at(&config.eye, &config.at, &config.up)?;
        Transform::perspective(config.fov, config.aspect, config.near, config.far)?;
        check_speeds(config.move_speed, config.turn_speed)?;
        Ok(Self {
            eye: config.eye,
            at: config.at,
            up: config.up,
            fov: config.fov,
            aspect: config.aspect,
            near: config.near,
            far: config.far,
            move_speed: config.move_speed,
            turn_speed: config.turn_speed,
        })
    }

    /// Default camera with the aspect ratio of a `width` x `height` viewport
    pub fn with_viewport(width: u32, height: u32) -> SceneResult<Self> {
        let mut camera = Self::default();
        camera.set_aspect(width as f32 / height.max(1) as f32)?;
        Ok(camera)
    }

    pub fn eye(&self) -> Point3<f32> {
        self.eye
    }

    pub fn at(&self) -> Point3<f32> {
        self.at
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn turn_speed(&self) -> f32 {
        self.turn_speed
    }

    /// Distance between eye and at
    pub fn distance(&self) -> f32 {
        (self.at - self.eye).norm()
    }

    pub fn set_aspect(&mut self, aspect: f32) -> SceneResult<()> {
        Transform::perspective(self.fov, aspect, self.near, self.far)?;
        self.aspect = aspect;
        Ok(())
    }

    pub fn set_speeds(&mut self, move_speed: f32, turn_speed: f32) -> SceneResult<()> {
        check_speeds(move_speed, turn_speed)?;
        self.move_speed = move_speed;
        self.turn_speed = turn_speed;
        Ok(())
    }

    pub fn apply(&mut self, command: CameraCommand) -> SceneResult<()> {
        match command {
            CameraCommand::Forward => self.move_forward(),
            CameraCommand::Backward => self.move_backward(),
            CameraCommand::Left => self.move_left(),
            CameraCommand::Right => self.move_right(),
            CameraCommand::Up => self.move_up(),
            CameraCommand::Down => self.move_down(),
            CameraCommand::PanLeft => self.pan_left(),
            CameraCommand::PanRight => self.pan_right(),
        }
    }

    pub fn move_forward(&mut self) -> SceneResult<()> {
        let dir = self.view_direction()?;
        self.translate(dir * self.move_speed)
    }

    pub fn move_backward(&mut self) -> SceneResult<()> {
        let dir = self.view_direction()?;
        self.translate(-dir * self.move_speed)
    }

    pub fn move_left(&mut self) -> SceneResult<()> {
        let view = check_look_at(&self.eye, &self.at, &self.up)?;
        let dir = normalize(&cross(&self.up, &view))?;
        self.translate(dir * self.move_speed)
    }

    pub fn move_right(&mut self) -> SceneResult<()> {
        let view = check_look_at(&self.eye, &self.at, &self.up)?;
        let dir = normalize(&cross(&view, &self.up))?;
        self.translate(dir * self.move_speed)
    }

    pub fn move_up(&mut self) -> SceneResult<()> {
        check_look_at(&self.eye, &self.at, &self.up)?;
        let dir = normalize(&self.up)?;
        self.translate(dir * self.move_speed)
    }

    pub fn move_down(&mut self) -> SceneResult<()> {
        check_look_at(&self.eye, &self.at, &self.up)?;
        let dir = normalize(&self.up)?;
        self.translate(-dir * self.move_speed)
    }

    pub fn pan_left(&mut self) -> SceneResult<()> {
        self.pan(self.turn_speed)
    }

    pub fn pan_right(&mut self) -> SceneResult<()> {
        self.pan(-self.turn_speed)
    }

    /// Rotate the view vector about `up`, keeping its length
    fn pan(&mut self, angle_deg: f32) -> SceneResult<()> {
        let view = check_look_at(&self.eye, &self.at, &self.up)?;
        let axis = Unit::try_new(self.up, 1e-6)
            .ok_or(SceneError::DegenerateCamera("up vector has zero length"))?;
        let rotation = Rotation3::from_axis_angle(&axis, angle_deg.to_radians());
        self.commit(self.eye, self.eye + rotation * view)
    }

    fn view_direction(&self) -> SceneResult<Vector3<f32>> {
        let view = check_look_at(&self.eye, &self.at, &self.up)?;
        normalize(&view)
    }

    fn translate(&mut self, offset: Vector3<f32>) -> SceneResult<()> {
        self.commit(self.eye + offset, self.at + offset)
    }

    /// Store a new eye/at pair only if it still yields a valid view
    fn commit(&mut self, eye: Point3<f32>, at: Point3<f32>) -> SceneResult<()> {
        check_look_at(&eye, &at, &self.up)?;
        self.eye = eye;
        self.at = at;
        Ok(())
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> SceneResult<Matrix4<f32>> {
        Transform::look_at(&self.eye, &self.at, &self.up).map(Transform::into_matrix)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> SceneResult<Matrix4<f32>> {
        Transform::perspective(self.fov, self.aspect, self.near, self.far)
            .map(Transform::into_matrix)
    }

    pub fn view_projection(&self) -> SceneResult<Matrix4<f32>> {
        Ok(self.projection_matrix()? * self.view_matrix()?)
    }
}

fn check_speeds(move_speed: f32, turn_speed: f32) -> SceneResult<()> {
    if move_speed.is_finite() && turn_speed.is_finite() {
        Ok(())
    } else {
        Err(SceneError::InvalidSpeed {
            move_speed,
            turn_speed,
        })
    }
}

impl Default for Camera {
    fn default() -> Self {
        let config = CameraConfig::default();
        Self {
            eye: config.eye,
            at: config.at,
            up: config.up,
            fov: config.fov,
            aspect: config.aspect,
            near: config.near,
            far: config.far,
            move_speed: config.move_speed,
            turn_speed: config.turn_speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tilted_camera() -> Camera {
        Camera::new(CameraConfig {
            eye: Point3::new(1.0, 2.0, 3.0),
            at: Point3::new(-2.0, 1.5, -4.0),
            up: Vector3::new(0.1, 1.0, 0.0),
            move_speed: 0.7,
            turn_speed: 12.5,
            ..CameraConfig::default()
        })
        .unwrap()
    }

    fn assert_same_place(a: &Camera, b: &Camera) {
        assert!((a.eye() - b.eye()).norm() < 1e-5);
        assert!((a.at() - b.at()).norm() < 1e-4);
    }

    #[test]
    fn test_camera_creation() {
        let camera = Camera::with_viewport(800, 600).unwrap();
        assert!((camera.aspect() - 800.0 / 600.0).abs() < 1e-6);
        assert!(camera.view_matrix().is_ok());
        assert!(camera.projection_matrix().is_ok());
    }

    #[test]
    fn test_inverse_move_pairs() {
        let pairs = [
            (CameraCommand::Forward, CameraCommand::Backward),
            (CameraCommand::Left, CameraCommand::Right),
            (CameraCommand::Up, CameraCommand::Down),
        ];
        for (there, back) in pairs {
            let original = tilted_camera();
            let mut camera = original.clone();
            camera.apply(there).unwrap();
            assert!((camera.eye() - original.eye()).norm() > 0.5);
            camera.apply(back).unwrap();
            assert_same_place(&camera, &original);
        }
    }

    #[test]
    fn test_moves_keep_distance() {
        let mut camera = tilted_camera();
        let distance = camera.distance();
        for command in [
            CameraCommand::Forward,
            CameraCommand::Left,
            CameraCommand::Down,
            CameraCommand::PanLeft,
            CameraCommand::Right,
            CameraCommand::PanRight,
            CameraCommand::Up,
        ] {
            camera.apply(command).unwrap();
            assert!((camera.distance() - distance).abs() < 1e-4);
        }
    }

    #[test]
    fn test_strafe_is_perpendicular() {
        let original = tilted_camera();
        let mut camera = original.clone();
        camera.move_left().unwrap();
        let offset = camera.eye() - original.eye();
        let view = original.at() - original.eye();
        assert!(offset.dot(&view).abs() < 1e-4);
        assert!(offset.dot(&original.up()).abs() < 1e-4);
        assert!((offset.norm() - original.move_speed()).abs() < 1e-5);
    }

    #[test]
    fn test_left_is_left() {
        let mut camera = Camera::default();
        camera.move_left().unwrap();
        assert!(camera.eye().x < 0.0);
    }

    #[test]
    fn test_pan_round_trip() {
        let original = tilted_camera();
        let mut camera = original.clone();
        camera.pan_left().unwrap();
        assert!((camera.at() - original.at()).norm() > 0.1);
        assert!((camera.distance() - original.distance()).abs() < 1e-4);
        camera.pan_right().unwrap();
        assert_same_place(&camera, &original);
    }

    #[test]
    fn test_pan_left_turns_left() {
        let mut camera = Camera::default();
        camera.pan_left().unwrap();
        assert!(camera.at().x < 0.0);
        assert_eq!(camera.eye(), Camera::default().eye());
    }

    #[test]
    fn test_rejects_parallel_up() {
        let result = Camera::new(CameraConfig {
            eye: Point3::origin(),
            at: Point3::new(0.0, 3.0, 0.0),
            ..CameraConfig::default()
        });
        assert!(matches!(result, Err(SceneError::DegenerateCamera(_))));
    }

    #[test]
    fn test_rejects_bad_aspect_unchanged() {
        let mut camera = Camera::default();
        assert!(camera.set_aspect(0.0).is_err());
        assert_eq!(camera.aspect(), 1.0);
    }

    #[test]
    fn test_rejects_non_finite_config() {
        let result = Camera::new(CameraConfig {
            eye: Point3::new(f32::NAN, 0.0, 0.0),
            ..CameraConfig::default()
        });
        assert!(matches!(result, Err(SceneError::DegenerateCamera(_))));

        let result = Camera::new(CameraConfig {
            move_speed: f32::INFINITY,
            ..CameraConfig::default()
        });
        assert!(matches!(result, Err(SceneError::InvalidSpeed { .. })));
    }

    #[test]
    fn test_non_finite_speeds_refused() {
        let mut camera = Camera::default();
        assert!(camera.set_speeds(f32::INFINITY, 5.0).is_err());
        assert!(camera.set_speeds(0.2, f32::NAN).is_err());
        assert_eq!(camera.move_speed(), 0.2);
        assert_eq!(camera.turn_speed(), 5.0);
        camera.move_forward().unwrap();
        assert!(camera.view_matrix().unwrap().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_refused_command_leaves_state_unchanged() {
        // one huge step collapses eye and at onto the same float
        let mut camera = Camera::new(CameraConfig {
            eye: Point3::new(0.0, 0.0, 1.0e18),
            at: Point3::new(0.0, 0.0, 0.0),
            move_speed: f32::MAX,
            ..CameraConfig::default()
        })
        .unwrap();
        let before = camera.clone();
        assert!(camera.move_backward().is_err());
        assert_eq!(camera, before);

        // up parallel to the view refuses every command
        let mut camera = tilted_camera();
        camera.up = camera.at() - camera.eye();
        let before = camera.clone();
        for command in [
            CameraCommand::Forward,
            CameraCommand::Backward,
            CameraCommand::Left,
            CameraCommand::Right,
            CameraCommand::Up,
            CameraCommand::Down,
            CameraCommand::PanLeft,
            CameraCommand::PanRight,
        ] {
            assert!(camera.apply(command).is_err());
            assert_eq!(camera, before);
        }
    }
}
