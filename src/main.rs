mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
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

use keyrace::{
    bot::PaceBot,
    clock::{system_clock, SharedClock},
    config::{Config, ConfigStore, FileConfigStore},
    corpus::Corpus,
    race::{Race, RaceResult, RaceState},
    results::{ResultsDb, SessionRecord},
    scheduler::{CrosstermEventSource, EngineEvent, FixedTicker, TickScheduler},
    session::{MetricsSnapshot, Session},
    TICK_RATE_MS,
};

const COUNTDOWN_MS: u64 = 3_000;
const RACE_OPPONENT: &str = "bot";
const RACE_PLAYER: &str = "you";

/// terminal typing trainer with live metrics and countdown races
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing trainer: practice against word-list passages with live wpm/accuracy, or race a pace opponent from a synchronized countdown."
)]
pub struct Cli {
    /// number of words in the practice passage
    #[clap(short = 'w', long)]
    number_of_words: Option<usize>,

    /// end the attempt after this many seconds
    #[clap(short = 's', long)]
    number_of_secs: Option<u64>,

    /// custom prompt to type instead of a generated passage
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// word list to draw passages from
    #[clap(short = 'c', long, value_enum)]
    corpus: Option<SupportedCorpus>,

    /// race a pace opponent after a 3 second countdown
    #[clap(long)]
    race: bool,

    /// opponent pace in words per minute
    #[clap(long)]
    bot_wpm: Option<f64>,

    /// print recent results and exit
    #[clap(long)]
    history: bool,

    /// export all results as CSV to the given path and exit
    #[clap(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum SupportedCorpus {
    Common,
    Code,
}

impl SupportedCorpus {
    fn as_corpus(&self) -> Corpus {
        Corpus::new(self.to_string().to_lowercase())
    }
}

/// Effective settings: CLI flags override the stored config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub number_of_words: usize,
    pub number_of_secs: Option<u64>,
    pub prompt: Option<String>,
    pub corpus: SupportedCorpus,
    pub race: bool,
    pub bot_wpm: f64,
}

impl Settings {
    fn resolve(cli: &Cli, config: &Config) -> Self {
        let corpus = cli.corpus.unwrap_or_else(|| {
            match config.corpus.as_str() {
                "code" => SupportedCorpus::Code,
                _ => SupportedCorpus::Common,
            }
        });
        Self {
            number_of_words: cli.number_of_words.unwrap_or(config.number_of_words),
            number_of_secs: cli.number_of_secs.or(config.number_of_secs),
            prompt: cli.prompt.clone(),
            corpus,
            race: cli.race,
            bot_wpm: cli.bot_wpm.unwrap_or(config.bot_wpm),
        }
    }

    fn corpus_label(&self) -> String {
        if self.prompt.is_some() {
            "custom".to_string()
        } else {
            self.corpus.to_string().to_lowercase()
        }
    }

    fn passage(&self) -> String {
        match &self.prompt {
            Some(p) => p.clone(),
            None => self.corpus.as_corpus().passage(self.number_of_words),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Countdown,
    Typing,
    Results,
}

struct RaceMode {
    race: Race,
    bot: PaceBot,
}

pub struct App {
    pub settings: Settings,
    pub state: AppState,
    pub typed: String,
    pub final_snapshot: Option<MetricsSnapshot>,
    pub final_outcome: Option<RaceResult>,
    session: Session,
    race: Option<RaceMode>,
    clock: SharedClock,
    // None means the default state-dir database
    db_path: Option<PathBuf>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let clock = system_clock();
        let mut app = Self {
            settings,
            state: AppState::Typing,
            typed: String::new(),
            final_snapshot: None,
            final_outcome: None,
            session: Session::new(clock.clone()),
            race: None,
            clock,
            db_path: None,
        };
        app.restart();
        app
    }

    /// App persisting results to the given path instead of the user's
    /// state directory.
    #[cfg(test)]
    fn with_db_path(settings: Settings, db_path: PathBuf) -> Self {
        let mut app = Self::new(settings);
        app.db_path = Some(db_path);
        app
    }

    /// Fresh attempt with a newly sampled passage (or the same custom prompt).
    pub fn restart(&mut self) {
        let text = self.settings.passage();
        self.typed.clear();
        self.final_snapshot = None;
        self.final_outcome = None;

        if self.settings.race {
            let start = self.clock.now_ms() + COUNTDOWN_MS;
            // Start is strictly in the future by construction
            let race = Race::schedule(
                [RACE_PLAYER, RACE_OPPONENT],
                &text,
                start,
                self.clock.clone(),
            )
            .expect("countdown start must be in the future");
            let bot = PaceBot::with_jitter(&text, self.settings.bot_wpm);
            self.race = Some(RaceMode { race, bot });
            self.session.reset();
            self.state = AppState::Countdown;
        } else {
            self.session.load_text(text);
            self.race = None;
            self.state = AppState::Typing;
        }
    }

    /// Reference text currently being typed against.
    pub fn reference(&self) -> &str {
        match &self.race {
            Some(mode) => mode
                .race
                .participant(RACE_PLAYER)
                .map(|p| p.session().reference())
                .unwrap_or_default(),
            None => self.session.reference(),
        }
    }

    /// Live metrics for the player.
    pub fn live_snapshot(&self) -> MetricsSnapshot {
        match &self.race {
            Some(mode) => mode
                .race
                .participant(RACE_PLAYER)
                .map(|p| p.session().snapshot())
                .unwrap_or_else(|| self.session.snapshot()),
            None => self.session.snapshot(),
        }
    }

    /// Seconds left in the race countdown.
    pub fn countdown_remaining_secs(&self) -> f64 {
        match &self.race {
            Some(mode) => mode.race.countdown_remaining_ms() as f64 / 1000.0,
            None => 0.0,
        }
    }

    /// Player and opponent completion as fractions of the reference text.
    pub fn race_progress(&self) -> Option<(f64, f64)> {
        let mode = self.race.as_ref()?;
        let total = self.reference().chars().count().max(1) as f64;
        let progress = |id: &str| {
            mode.race
                .participant(id)
                .map(|p| p.session().typed().chars().count() as f64 / total)
                .unwrap_or(0.0)
        };
        Some((progress(RACE_PLAYER), progress(RACE_OPPONENT)))
    }

    pub fn opponent_wpm(&self) -> Option<f64> {
        self.race.as_ref().map(|mode| mode.bot.target_wpm())
    }

    /// Whether the scheduler should be emitting ticks.
    pub fn needs_ticks(&self) -> bool {
        match self.state {
            AppState::Countdown => true,
            AppState::Typing => match &self.race {
                Some(mode) => mode.race.state() == RaceState::InProgress,
                None => self.session.has_started() && !self.session.has_finished(),
            },
            AppState::Results => false,
        }
    }

    pub fn on_char(&mut self, c: char) {
        if self.state != AppState::Typing {
            return;
        }
        self.typed.push(c);
        self.dispatch_typed();
    }

    pub fn on_backspace(&mut self) {
        if self.state != AppState::Typing {
            return;
        }
        self.typed.pop();
        self.dispatch_typed();
    }

    fn dispatch_typed(&mut self) {
        let typed = self.typed.clone();
        match &mut self.race {
            Some(mode) => {
                let _ = mode.race.report_typed(RACE_PLAYER, &typed);
                self.check_race_resolution();
            }
            None => {
                self.session.update_typed(&typed);
                if self.session.has_finished() {
                    self.finish_practice("practice");
                }
            }
        }
    }

    pub fn on_tick(&mut self) {
        match self.state {
            AppState::Countdown => {
                let mode = match &mut self.race {
                    Some(mode) => mode,
                    None => return,
                };
                if mode.race.countdown_elapsed() {
                    mode.race.begin();
                    self.state = AppState::Typing;
                }
            }
            AppState::Typing => {
                if self.race.is_some() {
                    self.advance_race();
                } else {
                    self.session.tick();
                    if let Some(secs) = self.settings.number_of_secs {
                        if self.session.has_started() && self.session.elapsed_ms() >= secs * 1000 {
                            self.finish_practice("timed");
                        }
                    }
                }
            }
            AppState::Results => {}
        }
    }

    fn advance_race(&mut self) {
        if let Some(mode) = &mut self.race {
            mode.race.tick();
            let elapsed = self
                .clock
                .now_ms()
                .saturating_sub(mode.race.scheduled_start_ms());
            let bot_typed = mode.bot.typed_at(elapsed).to_string();
            let _ = mode.race.report_typed(RACE_OPPONENT, &bot_typed);
        }
        self.check_race_resolution();
    }

    fn check_race_resolution(&mut self) {
        let mode = match &mut self.race {
            Some(mode) => mode,
            None => return,
        };
        if mode.race.state() != RaceState::Resolved {
            return;
        }
        mode.race.resolve();
        let player = mode.race.participant(RACE_PLAYER);
        let snapshot = player.map(|p| p.session().snapshot());
        let outcome = player.map(|p| p.result());

        self.final_snapshot = snapshot;
        self.final_outcome = outcome;
        self.state = AppState::Results;
        self.persist_result();
    }

    fn finish_practice(&mut self, mode: &str) {
        self.final_snapshot = Some(self.session.snapshot());
        self.state = AppState::Results;
        self.persist_result_as(mode);
    }

    fn persist_result(&self) {
        self.persist_result_as("race");
    }

    fn persist_result_as(&self, mode: &str) {
        let snapshot = match &self.final_snapshot {
            Some(s) => s,
            None => return,
        };
        let mut record =
            SessionRecord::from_snapshot(snapshot, mode, self.settings.corpus_label());
        if let Some(outcome) = self.final_outcome {
            record = record.with_race_outcome(RACE_OPPONENT, outcome.to_string());
        }
        // History is best-effort; a broken state dir must not kill the app
        let db = match &self.db_path {
            Some(path) => ResultsDb::open(path),
            None => ResultsDb::new(),
        };
        if let Ok(db) = db {
            let _ = db.record(&record);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.history {
        return print_history();
    }

    if let Some(path) = &cli.export_csv {
        let db = ResultsDb::new()?;
        db.export_csv(path)?;
        println!("exported results to {}", path.display());
        return Ok(());
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

    let res = run_app(&mut terminal, &cli);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn print_history() -> Result<(), Box<dyn Error>> {
    let db = ResultsDb::new()?;
    let recent = db.recent(20)?;
    if recent.is_empty() {
        println!("no results yet");
        return Ok(());
    }
    for record in recent {
        println!("{}", record.describe());
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = FileConfigStore::new().load();
    let settings = Settings::resolve(cli, &config);
    let mut app = App::new(settings);

    let scheduler = TickScheduler::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&app, f.area()))?;

        match scheduler.step(app.needs_ticks()) {
            EngineEvent::Key(key) => match key.code {
                KeyCode::Esc => break,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Char('r') if app.state == AppState::Results => app.restart(),
                KeyCode::Char(c) => app.on_char(c),
                KeyCode::Backspace => app.on_backspace(),
                _ => {}
            },
            EngineEvent::Resize => {}
            EngineEvent::Tick => app.on_tick(),
        }
    }

    Ok(())
}
