mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tabelline::{
    app_dirs::AppDirs,
    audio::{Audio, TerminalBell},
    difficulty::Difficulty,
    error::{Result as TabellineResult, TabellineError},
    feedback::{
        FeedbackProvider, GeminiConfig, GeminiFeedback, LocalFeedback, DEFAULT_GEMINI_MODEL,
    },
    game::{FeedbackTicket, Game, Phase},
    runtime::{spawn_feedback, CrosstermEventSource, FixedTicker, GameEvent, Runner},
    store::FileStore,
};

use crate::ui::screen::{current_screen, Screen};

/// Simulated "thinking" time of the offline feedback
const LOCAL_FEEDBACK_DELAY_MS: u64 = 600;

/// multiplication table practice in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practice the times tables against a countdown. Every solved cell is revealed on the grid, streaks and per-table accuracy are tracked, and the best score is kept between runs."
)]
pub struct Cli {
    /// starting difficulty
    #[clap(short = 'd', long, value_enum, default_value_t = Difficulty::Medium)]
    difficulty: Difficulty,

    /// start with sound disabled
    #[clap(long)]
    mute: bool,

    /// where encouragement messages come from
    #[clap(long, value_enum, default_value_t = FeedbackMode::Local)]
    feedback: FeedbackMode,

    /// API key for the gemini feedback provider
    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// model used by the gemini feedback provider
    #[clap(long, default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,

    /// log destination
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// directory holding the high score and timer preferences
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// seed for a reproducible question order
    #[clap(long)]
    seed: Option<u64>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FeedbackMode {
    Local,
    Gemini,
}

impl Cli {
    /// Build the configured provider. Gemini without a key degrades to local.
    fn feedback_provider(&self) -> TabellineResult<(Arc<dyn FeedbackProvider>, FeedbackMode)> {
        let local = || {
            LocalFeedback::new().with_delay(Duration::from_millis(LOCAL_FEEDBACK_DELAY_MS))
        };

        match (self.feedback, &self.gemini_api_key) {
            (FeedbackMode::Gemini, Some(key)) if !key.trim().is_empty() => {
                let mut config = GeminiConfig::new(key.trim());
                config.model = self.gemini_model.clone();
                let provider = GeminiFeedback::new(config)?;
                Ok((Arc::new(provider), FeedbackMode::Gemini))
            }
            (FeedbackMode::Gemini, _) => {
                warn!("gemini feedback requested without an API key, using local messages");
                Ok((Arc::new(local()), FeedbackMode::Local))
            }
            (FeedbackMode::Local, _) => Ok((Arc::new(local()), FeedbackMode::Local)),
        }
    }

    fn store(&self) -> FileStore {
        match &self.data_dir {
            Some(dir) => FileStore::with_dir(dir),
            None => FileStore::new(),
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn log_path(&self) -> Option<PathBuf> {
        self.log_file.clone().or_else(AppDirs::log_path)
    }
}

pub struct App {
    pub game: Game,
    pub provider: Arc<dyn FeedbackProvider>,
    pub feedback_mode: FeedbackMode,
}

/// What the event loop should do after an input
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Continue,
    Feedback(FeedbackTicket),
    Quit,
}

impl From<Option<FeedbackTicket>> for Action {
    fn from(ticket: Option<FeedbackTicket>) -> Self {
        ticket.map_or(Action::Continue, Action::Feedback)
    }
}

impl App {
    pub fn new(cli: Cli) -> TabellineResult<Self> {
        let (provider, feedback_mode) = cli.feedback_provider()?;
        let audio = Audio::new(Box::new(TerminalBell), !cli.mute);
        let game = Game::new(cli.difficulty, Box::new(cli.store()), audio, cli.rng());

        Ok(Self {
            game,
            provider,
            feedback_mode,
        })
    }

    pub fn on_tick(&mut self, elapsed: Duration) -> Action {
        self.game.advance(elapsed).into()
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        let game = &mut self.game;
        match game.phase() {
            Phase::Landing => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => game.start_game(),
                KeyCode::Char('1') => game.change_difficulty(Difficulty::Easy),
                KeyCode::Char('2') => game.change_difficulty(Difficulty::Medium),
                KeyCode::Char('3') => game.change_difficulty(Difficulty::Hard),
                KeyCode::Tab => game.cycle_difficulty(),
                KeyCode::Char('+') | KeyCode::Char('=') => game.adjust_timer(1),
                KeyCode::Char('-') => game.adjust_timer(-1),
                KeyCode::Char('s') => game.toggle_sound(),
                KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
                _ => {}
            },
            Phase::Playing => match key.code {
                KeyCode::Char(c) if c.is_ascii_digit() => game.press_digit(c),
                KeyCode::Backspace => game.backspace(),
                KeyCode::Char('c') => game.clear_input(),
                KeyCode::Enter => return game.submit().into(),
                KeyCode::Char('h') => game.request_hint(),
                KeyCode::Tab => game.cycle_difficulty(),
                KeyCode::Char('+') | KeyCode::Char('=') => game.adjust_timer(1),
                KeyCode::Char('-') => game.adjust_timer(-1),
                KeyCode::Char('s') => game.toggle_sound(),
                KeyCode::Esc => game.go_to_landing(),
                _ => {}
            },
            Phase::GameOver => match key.code {
                KeyCode::Char('r') | KeyCode::Enter => game.replay(),
                KeyCode::Char('l') | KeyCode::Esc => game.go_to_landing(),
                KeyCode::Char('q') => return Action::Quit,
                _ => {}
            },
        }
        Action::Continue
    }
}

/// Route tracing output to a file; the terminal belongs to the TUI
fn init_logging(path: Option<PathBuf>) -> TabellineResult<()> {
    let Some(path) = path else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| TabellineError::Logging(e.to_string()))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(e) = init_logging(cli.log_path()) {
        eprintln!("logging disabled: {e}");
    }
    info!("tabelline {} starting", env!("CARGO_PKG_VERSION"));

    let mut app = App::new(cli)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("exiting with high score {}", app.game.high_score());
    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let events = runner.event_source().sender();
    let mut last = Instant::now();

    terminal.draw(|f| ui(app, f))?;

    loop {
        let event = runner.step();
        let now = Instant::now();
        let elapsed = now.duration_since(last);
        last = now;

        let mut actions = vec![app.on_tick(elapsed)];
        match event {
            GameEvent::Tick | GameEvent::Resize => {}
            GameEvent::Key(key) => actions.push(app.on_key(key)),
            GameEvent::Feedback { token, feedback } => {
                app.game.resolve_feedback(token, feedback);
            }
        }

        for action in actions {
            match action {
                Action::Continue => {}
                Action::Feedback(ticket) => {
                    spawn_feedback(Arc::clone(&app.provider), ticket, events.clone());
                }
                Action::Quit => return Ok(()),
            }
        }

        terminal.draw(|f| ui(app, f))?;
    }
}

fn ui(app: &App, f: &mut Frame) {
    current_screen(app.game.phase()).render(app, f);
}
