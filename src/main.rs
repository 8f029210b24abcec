mod ui;

use breth::clock::SystemTimeSource;
use breth::config::{Config, ConfigStore, FileConfigStore};
use breth::controller::{CueEmitter, PollSnapshot, SessionController};
use breth::cues::{BellCue, SilentCue};
use breth::history::{HistoryDb, HistoryTotals, SessionLog, SessionRecord};
use breth::pattern::{self, BreathingPattern, PatternError};
use breth::runtime::{BrethEvent, CrosstermEventSource, FixedTicker, Runner};
use breth::session::{SessionConfig, SessionState};

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use crate::ui::render;

// Poll cadence for the session state machine; the controller accepts any
const TICK_RATE_MS: u64 = 100;

/// calm breathing timer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A calm breathing timer for the terminal with guided box/4-7-8/custom patterns, bell cues on phase changes, and a local session history."
)]
pub struct Cli {
    /// session length in seconds
    #[clap(short = 's', long)]
    secs: Option<u64>,

    /// breathing pattern preset
    #[clap(short = 'p', long, value_enum)]
    pattern: Option<PatternPreset>,

    /// custom dash-separated phase lengths, e.g. "4-7-8" (overrides --pattern)
    #[clap(long)]
    phases: Option<String>,

    /// side length in seconds for box breathing (the classic range is 4 to 7)
    #[clap(long)]
    box_secs: Option<u32>,

    /// disable the terminal bell cue
    #[clap(long)]
    silent: bool,

    /// export the session history to a CSV file and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum, strum_macros::Display)]
pub enum PatternPreset {
    Box,
    FourSevenEight,
    Relax,
}

impl PatternPreset {
    fn to_pattern(self, box_secs: u32) -> Result<BreathingPattern, PatternError> {
        match self {
            PatternPreset::Box => pattern::box_breathing(box_secs),
            PatternPreset::FourSevenEight => Ok(pattern::four_seven_eight()),
            PatternPreset::Relax => Ok(pattern::relaxing_breath()),
        }
    }
}

/// Settings for one run of the app: file config overridden by CLI flags
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub pattern: BreathingPattern,
    pub session_secs: f64,
    pub silent: bool,
}

impl RuntimeSettings {
    fn resolve(cli: &Cli, cfg: &Config) -> Result<Self, PatternError> {
        let box_secs = cli.box_secs.unwrap_or(cfg.box_secs);

        let pattern = if let Some(custom) = &cli.phases {
            BreathingPattern::from_dash_string(custom)?
        } else if let Some(preset) = cli.pattern {
            preset.to_pattern(box_secs)?
        } else {
            match cfg.pattern.as_str() {
                "box" => pattern::box_breathing(box_secs)?,
                "4-7-8" => pattern::four_seven_eight(),
                "relax" => pattern::relaxing_breath(),
                other => BreathingPattern::from_dash_string(other)?,
            }
        };

        Ok(Self {
            pattern,
            session_secs: cli.secs.unwrap_or(cfg.session_secs) as f64,
            silent: cli.silent || cfg.silent,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Breathing,
    Results,
    History,
}

type Controller = SessionController<SystemTimeSource, Box<dyn CueEmitter>, SessionLog>;

pub struct App {
    pub settings: RuntimeSettings,
    pub controller: Controller,
    pub snapshot: PollSnapshot,
    pub state: AppState,
    pub history: Vec<SessionRecord>,
    pub totals: Option<HistoryTotals>,
}

impl App {
    pub fn new(settings: RuntimeSettings) -> Result<Self, Box<dyn Error>> {
        let controller = build_controller(&settings)?;
        Ok(Self {
            snapshot: initial_snapshot(&settings),
            controller,
            settings,
            state: AppState::Breathing,
            history: Vec::new(),
            totals: None,
        })
    }

    /// Throw away the finished session and start a fresh one with the same
    /// settings
    pub fn reset(&mut self) -> Result<(), Box<dyn Error>> {
        self.controller = build_controller(&self.settings)?;
        self.snapshot = initial_snapshot(&self.settings);
        self.state = AppState::Breathing;
        self.controller.start()?;
        Ok(())
    }

    pub fn load_history(&mut self) {
        if let Ok(db) = HistoryDb::new() {
            self.history = db.recent(20).unwrap_or_default();
            self.totals = db.totals().ok();
        }
    }
}

fn build_controller(settings: &RuntimeSettings) -> Result<Controller, Box<dyn Error>> {
    let config = SessionConfig::new(settings.pattern.clone(), settings.session_secs)?;
    let cues: Box<dyn CueEmitter> = if settings.silent {
        Box::new(SilentCue)
    } else {
        Box::new(BellCue)
    };
    let sink = SessionLog::new(&settings.pattern, settings.session_secs);
    Ok(SessionController::new(
        config,
        SystemTimeSource::new(),
        cues,
        sink,
    ))
}

fn initial_snapshot(settings: &RuntimeSettings) -> PollSnapshot {
    PollSnapshot {
        state: SessionState::Idle,
        active_secs: 0.0,
        total_secs: settings.session_secs,
        phase_index: 0,
        phase_fraction: 0.0,
        cycle_index: 0,
        transitioned: false,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = &cli.export {
        let rows = HistoryDb::new()?.export_csv(path)?;
        println!("exported {} sessions to {}", rows, path.display());
        return Ok(());
    }

    let cfg = FileConfigStore::new().load();
    let settings = match RuntimeSettings::resolve(&cli, &cfg) {
        Ok(settings) => settings,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, e).exit();
        }
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings)?;
    start_tui(&mut terminal, &mut app)?;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    Ok(())
}

#[derive(Debug)]
enum ExitType {
    Restart,
    Quit,
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let ticker = FixedTicker::new(Duration::from_millis(TICK_RATE_MS));
    let runner = Runner::new(CrosstermEventSource::new(), ticker);

    app.controller.start()?;

    loop {
        let mut exit_type = ExitType::Quit;
        terminal.draw(|f| ui(app, f))?;

        loop {
            match runner.step() {
                BrethEvent::Tick => {
                    // The tick is the poll driver while a session is live
                    if app.state == AppState::Breathing && !app.controller.state().is_terminal() {
                        app.snapshot = app.controller.poll()?;
                        if app.snapshot.state == SessionState::Completed {
                            app.state = AppState::Results;
                        }
                        terminal.draw(|f| ui(app, f))?;
                    }
                }
                BrethEvent::Resize => {
                    terminal.draw(|f| ui(app, f))?;
                }
                BrethEvent::Key(key) => {
                    match key.code {
                        KeyCode::Esc => {
                            if app.state == AppState::Breathing
                                && !app.controller.state().is_terminal()
                            {
                                app.controller.stop()?;
                                app.snapshot.state = app.controller.state();
                                app.state = AppState::Results;
                            } else {
                                break;
                            }
                        }
                        KeyCode::Char(' ') => {
                            if app.state == AppState::Breathing {
                                match app.controller.state() {
                                    SessionState::Running => app.controller.pause()?,
                                    SessionState::Paused => app.controller.resume()?,
                                    _ => {}
                                }
                                app.snapshot.state = app.controller.state();
                            }
                        }
                        KeyCode::Char(c) => {
                            if key.modifiers.contains(KeyModifiers::CONTROL) && c == 'c' {
                                break;
                            }

                            match app.state {
                                AppState::Breathing => {}
                                AppState::Results => match c {
                                    'r' => {
                                        exit_type = ExitType::Restart;
                                        break;
                                    }
                                    'h' => {
                                        app.load_history();
                                        app.state = AppState::History;
                                    }
                                    _ => {}
                                },
                                AppState::History => match c {
                                    'r' => {
                                        exit_type = ExitType::Restart;
                                        break;
                                    }
                                    'b' => {
                                        app.state = AppState::Results;
                                    }
                                    _ => {}
                                },
                            }
                        }
                        KeyCode::Backspace => {
                            if app.state == AppState::History {
                                app.state = AppState::Results;
                            }
                        }
                        _ => {}
                    }
                    terminal.draw(|f| ui(app, f))?;
                }
            }
        }

        match exit_type {
            ExitType::Restart => {
                app.reset()?;
            }
            ExitType::Quit => {
                break;
            }
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    render(app, f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["breth"]);

        assert_eq!(cli.secs, None);
        assert_eq!(cli.pattern, None);
        assert_eq!(cli.phases, None);
        assert_eq!(cli.box_secs, None);
        assert!(!cli.silent);
        assert_eq!(cli.export, None);
    }

    #[test]
    fn test_cli_session_secs() {
        let cli = Cli::parse_from(["breth", "-s", "600"]);
        assert_eq!(cli.secs, Some(600));

        let cli = Cli::parse_from(["breth", "--secs", "90"]);
        assert_eq!(cli.secs, Some(90));
    }

    #[test]
    fn test_cli_pattern_presets() {
        let cli = Cli::parse_from(["breth", "-p", "box"]);
        assert_eq!(cli.pattern, Some(PatternPreset::Box));

        let cli = Cli::parse_from(["breth", "--pattern", "four-seven-eight"]);
        assert_eq!(cli.pattern, Some(PatternPreset::FourSevenEight));

        let cli = Cli::parse_from(["breth", "--pattern", "relax"]);
        assert_eq!(cli.pattern, Some(PatternPreset::Relax));
    }

    #[test]
    fn test_settings_default_to_config() {
        let cli = Cli::parse_from(["breth"]);
        let settings = RuntimeSettings::resolve(&cli, &Config::default()).unwrap();

        assert_eq!(settings.pattern.name(), "box 4-4-4-4");
        assert_eq!(settings.session_secs, 300.0);
        assert!(!settings.silent);
    }

    #[test]
    fn test_settings_custom_phases_override_preset() {
        let cli = Cli::parse_from(["breth", "-p", "box", "--phases", "4-7-8"]);
        let settings = RuntimeSettings::resolve(&cli, &Config::default()).unwrap();

        assert_eq!(settings.pattern.name(), "4-7-8");
        assert_eq!(settings.pattern.phases().len(), 3);
    }

    #[test]
    fn test_settings_box_secs_flows_into_preset() {
        let cli = Cli::parse_from(["breth", "-p", "box", "--box-secs", "6"]);
        let settings = RuntimeSettings::resolve(&cli, &Config::default()).unwrap();

        assert_eq!(settings.pattern.name(), "box 6-6-6-6");
        assert_eq!(settings.pattern.total_cycle_secs(), 24.0);
    }

    #[test]
    fn test_settings_bad_phase_string_is_an_error() {
        let cli = Cli::parse_from(["breth", "--phases", "4-oops-8"]);
        assert!(RuntimeSettings::resolve(&cli, &Config::default()).is_err());
    }

    #[test]
    fn test_settings_config_dash_pattern() {
        let cli = Cli::parse_from(["breth"]);
        let cfg = Config {
            pattern: "6-2-8".to_string(),
            ..Config::default()
        };
        let settings = RuntimeSettings::resolve(&cli, &cfg).unwrap();
        assert_eq!(settings.pattern.phases().len(), 3);
        assert_eq!(settings.pattern.total_cycle_secs(), 16.0);
    }
}
