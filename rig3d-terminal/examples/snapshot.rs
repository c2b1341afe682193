/// Example: Render a single frame of the scene to stdout without raw mode
///
/// Usage: cargo run --example snapshot -- [seconds] [width] [height]
use std::env;
use std::io::{self, Write};
use rig3d_terminal::{AppConfig, TerminalApp};

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();
    let seconds: f32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(0.0);
    let width: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let height: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(40);

    let config = AppConfig {
        animate: false,
        ..AppConfig::default()
    };
    let mut app = TerminalApp::with_size(config, width, height)?;
    app.pose_at(seconds);
    app.light_at(seconds);
    app.render_frame();

    let mut stdout = io::stdout();
    app.renderer().draw(&mut stdout)?;
    writeln!(stdout)?;
    stdout.flush()
}
