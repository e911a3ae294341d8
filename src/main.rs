//! TETRS - A Rusty Tetris
//!
//! Terminal front end for the engine: `tetrs [marathon|sprint]`

mod ui;

use anyhow::{bail, Context};
use crossterm::{
    event::{
        self, DisableFocusChange, EnableFocusChange, Event, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::{self, stdout},
    path::PathBuf,
    time::{Duration, Instant},
};
use tetrs_engine::{
    input::{Input, InputHandler, KeyBindings},
    mode::TICKS_PER_SECOND,
    Game, GameMode, GameResult, GameState, Settings,
};

const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TICKS_PER_SECOND);

/// Get the tetrs temp directory, creating it if needed
fn tetrs_temp_dir() -> anyhow::Result<PathBuf> {
    let dir = std::env::temp_dir().join("tetrs");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir)
}

fn parse_mode(arg: Option<&str>) -> anyhow::Result<GameMode> {
    match arg {
        None => Ok(GameMode::default()),
        Some(name) => match GameMode::all().iter().find(|mode| mode.key() == name) {
            Some(mode) => Ok(*mode),
            None => bail!("Unknown mode {:?}, expected marathon or sprint", name),
        },
    }
}

fn main() -> anyhow::Result<()> {
    let mode = parse_mode(std::env::args().nth(1).as_deref())?;

    // Generate session ID for this instance
    let session_id: u32 = rand::random();
    let tetrs_dir = tetrs_temp_dir()?;
    let log_file = format!("{:08x}.log", session_id);

    // Setup tracing to log file
    let file_appender = tracing_appender::rolling::never(&tetrs_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tetrs_engine=debug".parse()?)
                .add_directive("tetrs=debug".parse()?),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "TETRS starting up, session={:08x}, log={}",
        session_id,
        tetrs_dir.join(&log_file).display()
    );

    let mut settings = Settings::load();

    // Setup terminal
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, EnableFocusChange)?;
    let release_events = supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        execute!(
            stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    tracing::debug!("Key release events: {}", release_events);

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run app and capture result
    let result = run_app(&mut terminal, &mut settings, mode, release_events);

    // Restore terminal
    if release_events {
        execute!(stdout(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(stdout(), DisableFocusChange, LeaveAlternateScreen)?;

    // Save settings (including any new records)
    if let Err(e) = settings.save() {
        tracing::warn!("Could not save settings: {:#}", e);
        eprintln!("Warning: Could not save settings: {:#}", e);
    }

    if let Ok(Some(last)) = &result {
        println!("\nThanks for playing TETRS!");
        println!("Mode: {}", last.mode.name());
        println!("Final Score: {}", last.score);
        println!("Lines: {}", last.lines);
        if last.mode == GameMode::Sprint {
            println!("Time: {}", tetrs_engine::mode::format_duration(last.elapsed()));
        }
    }

    result.map(|_| ())
}

/// Drive the engine at a fixed tick rate until the player quits. Returns
/// the last finished game, if any.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: &mut Settings,
    mode: GameMode,
    release_events: bool,
) -> anyhow::Result<Option<GameResult>> {
    let mut game = Game::new(settings.timing());
    game.new_game(mode);
    let mut input = InputHandler::new(KeyBindings::from_settings(&settings.keys), release_events);
    let mut last_result = None;
    let mut next_tick = Instant::now() + FRAME_DURATION;
    let mut redraw = true;

    loop {
        if redraw {
            terminal.draw(|frame| ui::render_game(frame, &game, settings))?;
            redraw = false;
        }

        let timeout = next_tick.saturating_duration_since(Instant::now());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    for command in input.handle(key) {
                        match command {
                            Input::Quit => return Ok(last_result),
                            Input::Key(event) => game.handle(event),
                        }
                    }
                }
                // Releases are lost while unfocused, so let go of everything
                Event::FocusLost => release_all(&mut game, input.clear()),
                Event::Resize(..) => redraw = true,
                _ => {}
            }
        }
        if Instant::now() < next_tick {
            continue;
        }

        // Skip ahead after a stall instead of replaying missed ticks
        let now = Instant::now();
        next_tick += FRAME_DURATION;
        if next_tick < now {
            next_tick = now + FRAME_DURATION;
        }

        release_all(&mut game, input.expire());

        let update = game.update();
        // The Sprint clock changes every tick
        redraw |= update.changed
            || (game.mode() == GameMode::Sprint && game.state() == GameState::Active);

        if let Some(result) = update.finished {
            if result.submit(&mut *settings) {
                if let Err(e) = settings.save() {
                    tracing::warn!("Could not save record: {:#}", e);
                }
            }
            last_result = Some(result);
        }
    }
}

fn release_all(game: &mut Game, released: Vec<Input>) {
    for input in released {
        if let Input::Key(event) = input {
            game.handle(event);
        }
    }
}
