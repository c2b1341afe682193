/// RIG3D Terminal Demo - Walking Figure
///
/// Renders the articulated figure and its scenery with the ASCII rasterizer.
/// Controls:
///   - W/S or Up/Down: Move forward/backward
///   - A/D: Strafe left/right
///   - R/F: Rise/sink
///   - Q/E or Left/Right: Pan left/right
///   - J/K, U/I: Turn the whole scene
///   - L: Toggle lighting
///   - O: Pause/resume the light orbit
///   - P: Park the light at its home position
///   - C: Cycle light color
///   - N: Toggle normal visualization
///   - Space: Pause/resume animation
///   - Esc/X: Quit
use clap::Parser;
use rig3d_core::SceneConfig;
use rig3d_terminal::{AppConfig, TerminalApp};
use std::f32::consts::PI;
use std::io;

/// Interactive terminal renderer for the RIG3D scene
#[derive(Parser, Debug)]
#[command(name = "rig3d-terminal", version, about)]
struct Args {
    /// Target frames per second
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Radial segments for cylinders (at least 3)
    #[arg(long, default_value = "12")]
    segments: u32,

    /// Sphere step as a fraction of pi (10 means pi/10)
    #[arg(long, default_value = "10")]
    sphere_step_divisor: f32,

    /// Camera move step in world units
    #[arg(long, default_value = "0.2")]
    move_speed: f32,

    /// Camera pan step in degrees
    #[arg(long, default_value = "5.0")]
    turn_speed: f32,

    /// Start with the animation paused
    #[arg(long)]
    no_animation: bool,

    /// Start with lighting disabled
    #[arg(long)]
    no_lighting: bool,

    /// Start with the light parked instead of orbiting
    #[arg(long)]
    no_light_animation: bool,

    /// Light color as r,g,b
    #[arg(long, value_delimiter = ',', num_args = 3, default_values_t = [1.0, 1.0, 1.0])]
    light_color: Vec<f32>,

    /// Start with every lit part showing its normals
    #[arg(long)]
    show_normals: bool,

    /// Exit after rendering N frames
    #[arg(long)]
    max_frames: Option<u64>,
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        Self {
            fps: args.fps,
            scene: SceneConfig {
                cylinder_segments: args.segments,
                sphere_step: PI / args.sphere_step_divisor,
                ..SceneConfig::default()
            },
            animate: !args.no_animation,
            animate_light: !args.no_light_animation,
            lighting: !args.no_lighting,
            light_color: light_color(&args.light_color),
            show_normals: args.show_normals,
            move_speed: args.move_speed,
            turn_speed: args.turn_speed,
            max_frames: args.max_frames,
        }
    }
}

fn light_color(rgb: &[f32]) -> [f32; 4] {
    let channel = |i: usize| rgb.get(i).copied().unwrap_or(1.0);
    [channel(0), channel(1), channel(2), 1.0]
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let config = AppConfig::from(Args::parse());

    println!("RIG3D Terminal Renderer - Loading...");
    let mut app = TerminalApp::new(config)?;

    println!("Starting terminal renderer (press Esc to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));
    app.run()?;

    println!("Thank you for using RIG3D Terminal Renderer!");
    Ok(())
}
