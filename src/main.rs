use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keytutor::{
    app::{App, PracticeSource},
    clock::MonotonicClock,
    config::{Config, ConfigStore, FileConfigStore},
    levels::LevelRegistry,
    logging,
    progress::{MemoryProgressStore, ProgressStore, SqliteProgressStore},
    runtime::{map_key, CrosstermEventSource, FixedTicker, Runner, TutorEvent},
    TICK_RATE_MS,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

/// Target speed for practice files that do not come from a level
const DEFAULT_FILE_TARGET_WPM: f64 = 30.0;

/// terminal typing tutor with graded levels
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing tutor for the terminal: pick a level, type the text shown, and pass by reaching the level's target speed with at least 95% accuracy."
)]
pub struct Cli {
    /// level to start on (defaults to the configured level)
    #[clap(short = 'l', long)]
    level: Option<u32>,

    /// practice a text file instead of a built-in level
    #[clap(short = 'f', long, conflicts_with = "level")]
    file: Option<PathBuf>,

    /// target speed when practicing a file
    #[clap(short = 't', long, requires = "file")]
    target_wpm: Option<f64>,

    /// number of text lines shown at once
    #[clap(short = 'c', long)]
    lines_per_chunk: Option<usize>,

    /// list levels with your best results and exit
    #[clap(long)]
    list: bool,
}

impl Cli {
    fn merged_config(&self, mut config: Config) -> Config {
        if let Some(level) = self.level {
            config.default_level = level;
        }
        if let Some(lines) = self.lines_per_chunk {
            config.lines_per_chunk = lines;
        }
        config
    }

    fn practice_source(&self, config: &Config) -> PracticeSource {
        match &self.file {
            Some(path) => PracticeSource::File {
                path: path.clone(),
                target_wpm: self.target_wpm.unwrap_or(DEFAULT_FILE_TARGET_WPM),
            },
            None => PracticeSource::Level(config.default_level),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let loaded = config_store.load();
    let config = cli.merged_config(loaded.clone());
    if let Err(e) = config.validate() {
        Cli::command().error(ErrorKind::InvalidValue, e).exit();
    }
    if cli.file.is_none() && LevelRegistry.info(config.default_level).is_none() {
        Cli::command()
            .error(
                ErrorKind::InvalidValue,
                format!("invalid level number: {}", config.default_level),
            )
            .exit();
    }

    // The last level and chunk size given on the command line become the defaults
    match config_store.save_if_changed(&loaded, &config) {
        Ok(true) => log::info!("saved settings to {:?}", config_store.path()),
        Ok(false) => {}
        Err(e) => log::warn!("could not save settings to {:?}: {}", config_store.path(), e),
    }

    let store = open_progress_store();

    if cli.list {
        print_levels(store.as_ref());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(
        cli.practice_source(&config),
        config.lines_per_chunk,
        store,
        MonotonicClock::new(),
    )?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn open_progress_store() -> Box<dyn ProgressStore> {
    match SqliteProgressStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("progress will not be saved: {}", e);
            Box::new(MemoryProgressStore::new())
        }
    }
}

fn print_levels(store: &dyn ProgressStore) {
    for level in LevelRegistry.all() {
        let progress = store.get(level.id).unwrap_or_else(|e| {
            log::warn!("could not read progress for level {}: {}", level.id, e);
            keytutor::progress::LevelProgress::new(level.id)
        });
        let mark = if progress.completed { "✓" } else { " " };
        println!(
            "{} Level {}: {} ({} WPM) - {}",
            mark, level.id, level.name, level.target_wpm, level.description
        );
        if let Some(last) = progress.last_attempt {
            println!(
                "    best {:.1} wpm / {:.1}% over {} attempt(s), last {}",
                progress.best_wpm,
                progress.best_accuracy,
                progress.attempts,
                last.format("%Y-%m-%d %H:%M")
            );
        }
    }
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match runner.step() {
            TutorEvent::Tick => {
                // Only a running session has a speed that changes without input
                if app.session.has_started() && !app.session.has_finished() {
                    app.on_tick();
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
            TutorEvent::Resize => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            TutorEvent::Key(key) => {
                if !app.handle_key(map_key(&key)) {
                    break;
                }
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
        }
    }

    Ok(())
}
