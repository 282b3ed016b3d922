//! Emberdeep - Entry Point
//!
//! Initializes logging, configuration and the terminal, then runs the
//! main loop.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use emberdeep::game::{Game, GameEvent, GameState};
use emberdeep::ui::App;
use emberdeep::GameConfig;

/// Where `--export-config` writes when no path is given
const DEFAULT_EXPORT_PATH: &str = "config.ron";

/// Torch-lit terminal dungeon crawler
#[derive(Parser, Debug)]
#[command(name = "emberdeep")]
#[command(about = "Torch-lit terminal dungeon crawler", long_about = None)]
#[command(version)]
struct Cli {
    /// Write the active configuration as RON and exit
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    export_config: Option<Option<PathBuf>>,
}

/// Target frames per second for the game loop
const TARGET_FPS: u64 = 60;
const FRAME_TIME: Duration = Duration::from_millis(1000 / TARGET_FPS);

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    log::info!("Starting Emberdeep v{}", env!("CARGO_PKG_VERSION"));

    let config = GameConfig::load();

    if let Some(target) = cli.export_config {
        let path = target.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_PATH));
        config
            .export(&path)
            .with_context(|| format!("exporting config to {}", path.display()))?;
        println!("Config written to {}", path.display());
        return Ok(());
    }

    let mut game = Game::new(config);
    game.subscribe(|event| match event {
        GameEvent::StateChanged(state) => log::debug!("State changed: {:?}", state),
        GameEvent::FloorChanged(floor) => log::info!("Now on floor {}", floor),
        other => log::trace!("{:?}", other),
    });
    let mut app = App::new();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_game_loop(&mut terminal, &mut app, &mut game);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        log::error!("Game exited with error: {}", e);
        eprintln!("Error: {}", e);
    }

    log::info!("Emberdeep shut down cleanly");
    result
}

/// Log to a file so output does not interfere with the TUI
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("emberdeep.log")
    {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

/// Main game loop
fn run_game_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    game: &mut Game,
) -> Result<()> {
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        let delta = frame_start.duration_since(last_frame);
        last_frame = frame_start;

        // Drain every pending key so held keys do not lag behind
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Release {
                    match app.handle_input(key, game) {
                        Ok(true) => return Ok(()),
                        Ok(false) => {}
                        Err(e) => log::warn!("Input handling error: {}", e),
                    }
                }
            }
        }

        game.update(delta);

        terminal.draw(|frame| {
            app.render(frame, game);
        })?;

        if matches!(game.state(), GameState::Quit) {
            break;
        }

        // Frame rate limiting
        let frame_time = frame_start.elapsed();
        if frame_time < FRAME_TIME {
            std::thread::sleep(FRAME_TIME - frame_time);
        }
    }

    Ok(())
}
