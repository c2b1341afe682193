/// Terminal frontend: drives the scene core with keyboard input and renders
/// it through the ASCII rasterizer
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use rig3d_core::{
    Camera, CameraCommand, Lighting, Pose, SceneAssembler, SceneConfig, SceneError,
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod animation;
pub mod renderer;
pub mod shader;

pub use animation::{animate_pose, light_home, orbit_light, Clock};
pub use renderer::{AsciiRenderer, CELL_ASPECT};
pub use shader::{ProceduralTexture, Shader};

/// Runtime settings for [`TerminalApp`]
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fps: u32,
    pub scene: SceneConfig,
    pub animate: bool,
    /// Orbit the light on its own clock
    pub animate_light: bool,
    pub lighting: bool,
    pub light_color: [f32; 4],
    pub show_normals: bool,
    pub move_speed: f32,
    pub turn_speed: f32,
    /// Exit after this many frames
    pub max_frames: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            scene: SceneConfig::default(),
            animate: true,
            animate_light: true,
            lighting: true,
            light_color: [1.0, 1.0, 1.0, 1.0],
            show_normals: false,
            move_speed: 0.2,
            turn_speed: 5.0,
            max_frames: None,
        }
    }
}

/// Degrees the scene turns per rotate key press
pub const SCENE_TURN_STEP: f32 = 10.0;

/// Light colors the color key cycles through
pub const LIGHT_COLORS: [[f32; 4]; 5] = [
    [1.0, 1.0, 1.0, 1.0],
    [1.0, 0.85, 0.6, 1.0],
    [0.6, 0.75, 1.0, 1.0],
    [1.0, 0.3, 0.3, 1.0],
    [0.3, 1.0, 0.4, 1.0],
];

/// What a key press asks the app to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Camera(CameraCommand),
    ToggleLighting,
    ToggleAnimation,
    ToggleLightAnimation,
    ResetLight,
    CycleLightColor,
    ToggleNormals,
    /// Turn the whole scene by yaw and pitch degrees
    RotateScene { yaw: f32, pitch: f32 },
    Quit,
}

/// Key bindings; anything unmapped is ignored
pub fn action_for_key(code: KeyCode) -> Option<Action> {
    let action = match code {
        KeyCode::Char('w') | KeyCode::Up => Action::Camera(CameraCommand::Forward),
        KeyCode::Char('s') | KeyCode::Down => Action::Camera(CameraCommand::Backward),
        KeyCode::Char('a') => Action::Camera(CameraCommand::Left),
        KeyCode::Char('d') => Action::Camera(CameraCommand::Right),
        KeyCode::Char('r') => Action::Camera(CameraCommand::Up),
        KeyCode::Char('f') => Action::Camera(CameraCommand::Down),
        KeyCode::Char('q') | KeyCode::Left => Action::Camera(CameraCommand::PanLeft),
        KeyCode::Char('e') | KeyCode::Right => Action::Camera(CameraCommand::PanRight),
        KeyCode::Char('l') => Action::ToggleLighting,
        KeyCode::Char(' ') => Action::ToggleAnimation,
        KeyCode::Char('o') => Action::ToggleLightAnimation,
        KeyCode::Char('p') => Action::ResetLight,
        KeyCode::Char('c') => Action::CycleLightColor,
        KeyCode::Char('n') => Action::ToggleNormals,
        KeyCode::Char('j') => Action::RotateScene {
            yaw: -SCENE_TURN_STEP,
            pitch: 0.0,
        },
        KeyCode::Char('k') => Action::RotateScene {
            yaw: SCENE_TURN_STEP,
            pitch: 0.0,
        },
        KeyCode::Char('u') => Action::RotateScene {
            yaw: 0.0,
            pitch: -SCENE_TURN_STEP,
        },
        KeyCode::Char('i') => Action::RotateScene {
            yaw: 0.0,
            pitch: SCENE_TURN_STEP,
        },
        KeyCode::Esc | KeyCode::Char('x') => Action::Quit,
        _ => return None,
    };
    Some(action)
}

fn scene_error(err: SceneError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, err)
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    config: AppConfig,
    assembler: SceneAssembler,
    camera: Camera,
    pose: Pose,
    lighting: Lighting,
    light_color_index: usize,
    clock: Clock,
    light_clock: Clock,
    scene_yaw: f32,
    scene_pitch: f32,
    renderer: AsciiRenderer,
    running: bool,
    frames_rendered: u64,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
    status: Option<String>,
}

impl TerminalApp {
    pub fn new(config: AppConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Self::with_size(config, width as usize, height as usize)
    }

    /// Build an app for a fixed grid, without touching the terminal
    pub fn with_size(config: AppConfig, width: usize, height: usize) -> io::Result<Self> {
        let mut assembler = SceneAssembler::new(config.scene).map_err(scene_error)?;
        assembler.set_show_normals(config.show_normals);
        let mut camera = Camera::default();
        camera
            .set_aspect(width.max(1) as f32 / (height.max(1) as f32 * CELL_ASPECT))
            .map_err(scene_error)?;
        camera
            .set_speeds(config.move_speed, config.turn_speed)
            .map_err(scene_error)?;

        let mut clock = Clock::start();
        if !config.animate {
            clock.toggle_pause();
        }
        let mut light_clock = Clock::start();
        if !config.animate_light {
            light_clock.toggle_pause();
        }
        let lighting = Lighting {
            enabled: config.lighting,
            color: config.light_color,
            ..Lighting::default()
        };

        log::info!("terminal renderer {}x{} at {} fps", width, height, config.fps);
        Ok(Self {
            config,
            assembler,
            camera,
            pose: Pose::rest(),
            lighting,
            light_color_index: 0,
            clock,
            light_clock,
            scene_yaw: 0.0,
            scene_pitch: 0.0,
            renderer: AsciiRenderer::new(width, height),
            running: true,
            frames_rendered: 0,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            status: None,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    pub fn assembler(&self) -> &SceneAssembler {
        &self.assembler
    }

    pub fn light_animating(&self) -> bool {
        !self.light_clock.is_paused()
    }

    pub fn renderer(&self) -> &AsciiRenderer {
        &self.renderer
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / u64::from(self.config.fps.max(1)));

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?)?;
            }

            self.update();
            self.render_frame();
            self.present()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }

            if let Some(max) = self.config.max_frames {
                if self.frames_rendered >= max {
                    self.running = false;
                }
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                if let Some(action) = action_for_key(code) {
                    self.apply(action);
                }
            }
            Event::Resize(width, height) => self.resize(width as usize, height as usize)?,
            _ => {}
        }
        Ok(())
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Camera(command) => {
                if let Err(err) = self.camera.apply(command) {
                    log::warn!("camera {:?} refused: {}", command, err);
                    self.status = Some(err.to_string());
                }
            }
            Action::ToggleLighting => self.lighting.enabled = !self.lighting.enabled,
            Action::ToggleAnimation => self.clock.toggle_pause(),
            Action::ToggleLightAnimation => self.light_clock.toggle_pause(),
            Action::ResetLight => {
                if !self.light_clock.is_paused() {
                    self.light_clock.toggle_pause();
                }
                self.lighting.position = light_home();
            }
            Action::CycleLightColor => {
                self.light_color_index = (self.light_color_index + 1) % LIGHT_COLORS.len();
                self.lighting.color = LIGHT_COLORS[self.light_color_index];
            }
            Action::ToggleNormals => {
                let on = !self.assembler.show_normals();
                self.assembler.set_show_normals(on);
            }
            Action::RotateScene { yaw, pitch } => {
                self.scene_yaw = (self.scene_yaw + yaw) % 360.0;
                self.scene_pitch = (self.scene_pitch + pitch) % 360.0;
                self.assembler
                    .set_global_rotation(self.scene_yaw, self.scene_pitch);
            }
            Action::Quit => self.running = false,
        }
    }

    fn resize(&mut self, width: usize, height: usize) -> io::Result<()> {
        self.renderer.resize(width, height);
        self.camera
            .set_aspect(width.max(1) as f32 / (height.max(1) as f32 * CELL_ASPECT))
            .map_err(scene_error)
    }

    /// Advance the pose and, while it is animating, the light
    pub fn update(&mut self) {
        self.pose_at(self.clock.elapsed_seconds());
        if !self.light_clock.is_paused() {
            self.light_at(self.light_clock.elapsed_seconds());
        }
    }

    /// Set the pose for an explicit animation time
    pub fn pose_at(&mut self, t: f32) {
        self.pose = animate_pose(t);
    }

    /// Place the light on its orbit at an explicit time
    pub fn light_at(&mut self, t: f32) {
        self.lighting.position = orbit_light(t);
    }

    /// Rasterize one frame into the renderer's buffers
    pub fn render_frame(&mut self) {
        match self
            .assembler
            .render_frame(&self.pose, &self.camera, &self.lighting, &mut self.renderer)
        {
            Ok(report) if !report.failed.is_empty() => {
                self.status = Some(format!("failed parts: {}", report.failed.join(", ")));
            }
            Ok(_) => {}
            Err(err) => {
                log::error!("frame skipped: {}", err);
                self.status = Some(err.to_string());
            }
        }
        self.frames_rendered += 1;
    }

    fn present(&mut self) -> io::Result<()> {
        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let eye = self.camera.eye();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "RIG3D | FPS: {:.1} | eye ({:.1}, {:.1}, {:.1}) | light {}{} | {}{} | WASD move R/F rise/sink Q/E pan JKUI turn L light O orbit P reset C color N normals Space pause Esc quit",
                self.fps,
                eye.x,
                eye.y,
                eye.z,
                if self.lighting.enabled { "on" } else { "off" },
                if self.light_clock.is_paused() { "" } else { " orbiting" },
                if self.clock.is_paused() { "paused" } else { "animating" },
                if self.assembler.show_normals() { " | normals" } else { "" },
            )),
            ResetColor
        )?;
        if let Some(status) = self.status.take() {
            queue!(
                stdout,
                cursor::MoveTo(0, 1),
                SetForegroundColor(Color::Red),
                Print(status),
                ResetColor
            )?;
        }

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_camera_commands_are_bound() {
        let bound: Vec<_> = "wsadrfqe"
            .chars()
            .filter_map(|c| action_for_key(KeyCode::Char(c)))
            .collect();
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
            assert!(bound.contains(&Action::Camera(command)));
        }
        assert_eq!(action_for_key(KeyCode::Char('z')), None);
        assert_eq!(action_for_key(KeyCode::Char('n')), Some(Action::ToggleNormals));
        assert_eq!(
            action_for_key(KeyCode::Char('o')),
            Some(Action::ToggleLightAnimation)
        );
    }

    #[test]
    fn test_light_controls_are_independent() {
        let config = AppConfig {
            animate_light: false,
            ..AppConfig::default()
        };
        let mut app = TerminalApp::with_size(config, 40, 20).unwrap();
        let parked = app.lighting().position;
        app.update();
        assert_eq!(app.lighting().position, parked);
        assert!(!app.light_animating());

        // pausing the figure leaves the light clock alone
        app.apply(Action::ToggleLightAnimation);
        app.apply(Action::ToggleAnimation);
        assert!(app.light_animating());

        app.apply(Action::ResetLight);
        assert!(!app.light_animating());
        assert_eq!(app.lighting().position, light_home());

        app.apply(Action::CycleLightColor);
        assert_eq!(app.lighting().color, LIGHT_COLORS[1]);
        for _ in 1..LIGHT_COLORS.len() {
            app.apply(Action::CycleLightColor);
        }
        assert_eq!(app.lighting().color, LIGHT_COLORS[0]);
    }

    #[test]
    fn test_scene_view_actions() {
        let mut app = TerminalApp::with_size(AppConfig::default(), 40, 20).unwrap();
        app.apply(Action::ToggleNormals);
        assert!(app.assembler().show_normals());
        app.apply(Action::ToggleNormals);
        assert!(!app.assembler().show_normals());

        app.apply(Action::RotateScene {
            yaw: 30.0,
            pitch: 0.0,
        });
        let g = app.assembler().global_rotation();
        let v = g.transform_vector(&nalgebra::Vector3::x());
        assert!((v.x - 30f32.to_radians().cos()).abs() < 1e-5);
    }

    #[test]
    fn test_rejects_non_finite_speed() {
        let config = AppConfig {
            move_speed: f32::INFINITY,
            ..AppConfig::default()
        };
        assert!(TerminalApp::with_size(config, 40, 20).is_err());
    }

    #[test]
    fn test_frame_paints_grid() {
        let config = AppConfig {
            animate: false,
            ..AppConfig::default()
        };
        let mut app = TerminalApp::with_size(config, 80, 30).unwrap();
        app.update();
        app.render_frame();
        // the room surrounds the eye, so nearly every cell is painted
        assert!(app.renderer().covered_cells() > 80 * 30 * 9 / 10);
    }

    #[test]
    fn test_actions_update_state() {
        let mut app = TerminalApp::with_size(AppConfig::default(), 40, 20).unwrap();
        let eye = app.camera().eye();
        app.apply(Action::Camera(CameraCommand::Forward));
        assert!(app.camera().eye().z < eye.z);

        let lit = app.lighting().enabled;
        app.apply(Action::ToggleLighting);
        assert_ne!(app.lighting().enabled, lit);

        app.apply(Action::Quit);
        assert!(!app.is_running());
    }

    #[test]
    fn test_rejects_bad_scene_config() {
        let config = AppConfig {
            scene: SceneConfig {
                cylinder_segments: 1,
                ..SceneConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(TerminalApp::with_size(config, 40, 20).is_err());
    }
}
