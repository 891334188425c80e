use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use quizwhiz::{
    app::{App, AppAction},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    leaderboard::Leaderboard,
    logging,
    question::{category_name, Difficulty, QuizSettings, CATEGORIES},
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, Runner},
    shuffle::Shuffler,
    source::{OpenTdbProvider, QuestionSource},
    store::{KeyValueStore, SqliteStore},
    ui,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};
use tracing::{debug, info, warn};

/// timed multiple-choice trivia in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed multiple-choice trivia quiz. Questions come from the Open Trivia Database, with a built-in question set when it can't be reached. Scores are kept in a local leaderboard."
)]
pub struct Cli {
    /// trivia category id (see --list-categories)
    #[clap(short = 'c', long, value_parser = parse_category)]
    category: Option<String>,

    /// question difficulty
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// number of questions in the quiz
    #[clap(short = 'n', long)]
    amount: Option<usize>,

    /// seconds allowed per question
    #[clap(short = 't', long)]
    time_per_question: Option<u32>,

    /// skip the network and use the built-in questions
    #[clap(long)]
    offline: bool,

    /// base url of an Open Trivia Database compatible api
    #[clap(long)]
    api_url: Option<String>,

    /// seed the shuffler for a reproducible question order
    #[clap(long)]
    seed: Option<u64>,

    /// print the known categories and exit
    #[clap(long)]
    list_categories: bool,

    /// write the leaderboard to a csv file and exit
    #[clap(long, value_name = "PATH")]
    export_scores: Option<PathBuf>,
}

fn parse_category(id: &str) -> Result<String, String> {
    match category_name(id) {
        Some(_) => Ok(id.to_string()),
        None => Err(format!("unknown category '{id}', see --list-categories")),
    }
}

impl Cli {
    /// Layer the command line on top of the saved settings.
    fn apply_to(&self, settings: &mut QuizSettings) {
        if let Some(category) = &self.category {
            settings.category = category.clone();
        }
        if let Some(difficulty) = self.difficulty {
            settings.difficulty = difficulty;
        }
        if let Some(amount) = self.amount {
            settings.amount = amount.max(1);
        }
        if let Some(secs) = self.time_per_question {
            settings.time_per_question = secs.max(1);
        }
    }

    fn question_source(&self, config: &Config) -> QuestionSource {
        let shuffler = match self.seed {
            Some(seed) => Shuffler::seeded(seed),
            None => Shuffler::new(),
        };
        if self.offline {
            info!("Offline mode, using built-in questions");
            return QuestionSource::offline(shuffler);
        }

        let base_url = self
            .api_url
            .clone()
            .unwrap_or_else(|| config.api_base_url.clone());
        match OpenTdbProvider::new(base_url, config.request_timeout()) {
            Ok(provider) => QuestionSource::new(Box::new(provider), shuffler),
            Err(e) => {
                warn!("Could not build http client, using built-in questions: {e}");
                QuestionSource::offline(shuffler)
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list_categories {
        for category in CATEGORIES {
            println!("{:>3}  {}", category.id, category.name);
        }
        return Ok(());
    }

    let config_store = FileConfigStore::new();
    let config = config_store.load();
    if let Err(e) = logging::init(AppDirs::log_path(), &config.log_level) {
        eprintln!("logging disabled: {e}");
    }
    // after logging, so a failed first-run write is reported
    config_store.write_if_missing(&config);

    let store = SqliteStore::open(AppDirs::db_path())?;

    if let Some(path) = &cli.export_scores {
        let count = Leaderboard::new(&store).export_csv(path)?;
        println!("Exported {count} scores to {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(store, cli.question_source(&config));
    cli.apply_to(&mut app.settings);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let action = match runner.step() {
            QuizEvent::Tick => {
                app.on_tick();
                AppAction::None
            }
            QuizEvent::Resize => AppAction::None,
            QuizEvent::Key(key) => app.on_key(key),
        };

        match action {
            AppAction::Quit => break,
            AppAction::LoadQuiz => {
                // show the loading screen while the fetch blocks
                terminal.draw(|f| ui::draw(f, app))?;
                let action = app.load_quiz();
                let dropped = runner.discard_pending();
                if dropped > 0 {
                    debug!("Dropped {dropped} events queued while loading");
                }
                if action == AppAction::RestartTick {
                    runner.restart_tick();
                }
            }
            AppAction::RestartTick => runner.restart_tick(),
            AppAction::None => {}
        }
    }

    info!("Bye");
    Ok(())
}
