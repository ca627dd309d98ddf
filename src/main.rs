mod ui;

use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use reckon::{
    config::{Config, ConfigStore, FileConfigStore},
    game::{GameSession, Outcome, SessionDelta},
    logging::{init_logging, LogConfig},
    runtime::{CrosstermEventSource, EventSource, FixedTicker, GameEvent, Runner, Ticker},
    Phase,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};
use tracing::{error, info};

/// reach the target with the numbers you have left, before the clock runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal arithmetic game: combine numbers from a shrinking pool with + - * / and parentheses to hit each target before the countdown expires."
)]
pub struct Cli {
    /// seconds on the clock at the start of a game
    #[clap(short = 's', long)]
    seconds: Option<u32>,

    /// seconds lost for a wrong answer
    #[clap(long)]
    penalty: Option<u32>,

    /// seconds gained when removing a random pool number (negative to lose time)
    #[clap(long, allow_hyphen_values = true)]
    bonus: Option<i32>,

    /// number of targets per game
    #[clap(short = 'r', long)]
    rounds: Option<usize>,

    /// highest number in the pool (1-100)
    #[clap(short = 'p', long)]
    pool_size: Option<u64>,

    /// smallest possible target
    #[clap(long, allow_hyphen_values = true)]
    target_min: Option<i64>,

    /// largest possible target
    #[clap(long, allow_hyphen_values = true)]
    target_max: Option<i64>,

    /// seed for a reproducible game
    #[clap(long)]
    seed: Option<u64>,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,

    /// write logs here instead of the default state directory
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// log more (-v info, -vv debug, -vvv trace)
    #[clap(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_config(&self) -> LogConfig {
        let cfg = LogConfig::from_verbosity(self.verbose);
        match &self.log_file {
            Some(path) => cfg.with_path(path.clone()),
            None => cfg,
        }
    }

    /// Overlay command line settings on a loaded config.
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(secs) = self.seconds {
            cfg.time_budget_secs = secs;
        }
        if let Some(penalty) = self.penalty {
            cfg.penalty_secs = penalty;
        }
        if let Some(bonus) = self.bonus {
            cfg.removal_bonus_secs = bonus;
        }
        if let Some(rounds) = self.rounds {
            cfg.rounds = rounds;
        }
        if let Some(size) = self.pool_size {
            cfg.pool_size = size;
        }
        if let Some(min) = self.target_min {
            cfg.target_min = min;
        }
        if let Some(max) = self.target_max {
            cfg.target_max = max;
        }
        cfg
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub session: GameSession,
    pub message: Option<String>,
    pub last_outcome: Option<Outcome>,
}

impl App {
    pub fn new(session: GameSession) -> Self {
        Self {
            session,
            message: None,
            last_outcome: None,
        }
    }

    fn apply(&mut self, delta: SessionDelta) {
        if delta.outcome == Outcome::Unchanged && delta.message.is_none() {
            return;
        }
        self.message = delta.message;
        self.last_outcome = Some(delta.outcome);
    }

    fn on_tick(&mut self) {
        let delta = self.session.tick();
        self.apply(delta);
    }

    fn on_key(&mut self, key: KeyEvent) -> Control {
        if key.kind != KeyEventKind::Press {
            return Control::Continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        let delta = match self.session.phase() {
            Phase::Setup => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.session.start(),
                KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
                _ => return Control::Continue,
            },
            Phase::Playing => match key.code {
                KeyCode::Enter => self.session.submit_input(),
                KeyCode::Esc => self.session.terminate(),
                KeyCode::Char('?') | KeyCode::F(2) => self.session.remove_random(),
                KeyCode::Backspace => {
                    self.session.backspace();
                    return Control::Continue;
                }
                KeyCode::Delete => {
                    self.session.clear_input();
                    return Control::Continue;
                }
                KeyCode::Char(c) if is_expression_char(c) => {
                    self.session.push_char(c);
                    return Control::Continue;
                }
                _ => return Control::Continue,
            },
            Phase::AwaitingRoundAdvance => match key.code {
                KeyCode::Enter | KeyCode::Tab | KeyCode::Char(' ') => self.session.advance_round(),
                KeyCode::Esc => self.session.terminate(),
                _ => return Control::Continue,
            },
            Phase::Over => match key.code {
                KeyCode::Char('r') => self.session.restart(),
                KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
                _ => return Control::Continue,
            },
        };
        self.apply(delta);
        Control::Continue
    }
}

fn is_expression_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | ' ')
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_config()) {
        eprintln!("logging disabled: {err}");
    }

    let store = FileConfigStore::new();
    let cfg = cli.apply(store.load());
    if let Err(err) = cfg.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, err).exit();
    }
    if cli.save_config {
        store.save(&cfg)?;
        info!(path = %store.path().display(), "saved config");
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(GameSession::from_config(&cfg, cli.seed));
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::every_second());
    let result = start_tui(&mut terminal, &mut app, &mut runner);
    if let Err(err) = &result {
        error!(%err, "event loop failed");
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &mut Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    // Dropping the schedule disarms the clock on every way out of this loop.
    let mut schedule = runner.schedule();

    loop {
        schedule.set_armed(app.session.is_clock_running());
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let control = match schedule.step() {
            GameEvent::Tick => {
                app.on_tick();
                Control::Continue
            }
            GameEvent::Key(key) => app.on_key(key),
            GameEvent::Resize | GameEvent::Idle => Control::Continue,
        };

        if control == Control::Quit {
            break;
        }
    }

    Ok(())
}
