use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use reqwest::Url;
use tracing::{error, info};
use webbrowser::Browser;

use crate::leaderboard::{HighScore, Leaderboard};
use crate::question::{Difficulty, QuizSettings, AMOUNT_CHOICES, CATEGORIES, TIME_CHOICES};
use crate::result::QuizResult;
use crate::session::{Advance, Selection, SessionController, TickOutcome};
use crate::source::{Provenance, QuestionSource};
use crate::store::{KeyValueStore, RESULTS_KEY, SETTINGS_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Home,
    Setup,
    Loading,
    Quiz,
    Results,
    HighScores,
    HowToPlay,
}

/// What the event loop has to do after the app handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    None,
    Quit,
    /// Draw the loading screen, then call [`App::load_quiz`].
    LoadQuiz,
    /// A new question is up; give it a full first second.
    RestartTick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupField {
    Category,
    Difficulty,
    Amount,
    Time,
}

impl SetupField {
    pub const ALL: [SetupField; 4] = [
        SetupField::Category,
        SetupField::Difficulty,
        SetupField::Amount,
        SetupField::Time,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SetupField::Category => "Category",
            SetupField::Difficulty => "Difficulty",
            SetupField::Amount => "Number of Questions",
            SetupField::Time => "Time per Question",
        }
    }
}

pub struct App<S: KeyValueStore> {
    pub state: AppState,
    pub settings: QuizSettings,
    pub setup_field: usize,
    pub session: Option<SessionController>,
    pub last_selection: Option<Selection>,
    pub result: Option<QuizResult>,
    pub show_review: bool,
    pub review_scroll: usize,
    pub high_scores: Vec<HighScore>,
    pub notice: Option<String>,
    store: S,
    source: QuestionSource,
}

impl<S: KeyValueStore> App<S> {
    /// Starts on the home screen with the settings saved last time.
    pub fn new(store: S, source: QuestionSource) -> Self {
        let settings = match store.get_json::<QuizSettings>(SETTINGS_KEY) {
            Ok(Some(saved)) => saved,
            Ok(None) => QuizSettings::default(),
            Err(e) => {
                error!("Ignoring unreadable saved settings: {e}");
                QuizSettings::default()
            }
        };

        Self {
            state: AppState::Home,
            settings,
            setup_field: 0,
            session: None,
            last_selection: None,
            result: None,
            show_review: false,
            review_scroll: 0,
            high_scores: vec![],
            notice: None,
            store,
            source,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_setup_field(&self) -> SetupField {
        SetupField::ALL[self.setup_field % SetupField::ALL.len()]
    }

    pub fn on_tick(&mut self) {
        if self.state != AppState::Quiz {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            if session.is_timer_active() && session.tick() == TickOutcome::Expired {
                info!("Time ran out on question {}", session.state().current_index + 1);
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> AppAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppAction::Quit;
        }

        match self.state {
            AppState::Home => self.on_home_key(key),
            AppState::Setup => self.on_setup_key(key),
            AppState::Loading => AppAction::None,
            AppState::Quiz => self.on_quiz_key(key),
            AppState::Results => self.on_results_key(key),
            AppState::HighScores => self.on_high_scores_key(key),
            AppState::HowToPlay => {
                self.state = AppState::Home;
                AppAction::None
            }
        }
    }

    fn on_home_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Enter | KeyCode::Char('s') => self.state = AppState::Setup,
            KeyCode::Char('h') => self.open_high_scores(),
            KeyCode::Char('?') | KeyCode::Char('i') => self.state = AppState::HowToPlay,
            KeyCode::Esc | KeyCode::Char('q') => return AppAction::Quit,
            _ => {}
        }
        AppAction::None
    }

    fn on_setup_key(&mut self, key: KeyEvent) -> AppAction {
        let fields = SetupField::ALL.len();
        match key.code {
            KeyCode::Up => self.setup_field = (self.setup_field + fields - 1) % fields,
            KeyCode::Down | KeyCode::Tab => self.setup_field = (self.setup_field + 1) % fields,
            KeyCode::Left => self.cycle_setup_value(false),
            KeyCode::Right => self.cycle_setup_value(true),
            KeyCode::Enter => return self.begin_quiz(),
            KeyCode::Esc => self.state = AppState::Home,
            _ => {}
        }
        AppAction::None
    }

    fn cycle_setup_value(&mut self, forward: bool) {
        fn step<T: PartialEq + Copy>(choices: &[T], current: T, forward: bool) -> T {
            let len = choices.len();
            let idx = choices.iter().position(|c| *c == current);
            let next = match (idx, forward) {
                (Some(i), true) => (i + 1) % len,
                (Some(i), false) => (i + len - 1) % len,
                (None, _) => 0,
            };
            choices[next]
        }

        match self.current_setup_field() {
            SetupField::Category => {
                let ids: Vec<&str> = CATEGORIES.iter().map(|c| c.id).collect();
                self.settings.category =
                    step(&ids, self.settings.category.as_str(), forward).to_string();
            }
            SetupField::Difficulty => {
                self.settings.difficulty = step(&Difficulty::ALL, self.settings.difficulty, forward);
            }
            SetupField::Amount => {
                self.settings.amount = step(&AMOUNT_CHOICES, self.settings.amount, forward);
            }
            SetupField::Time => {
                self.settings.time_per_question =
                    step(&TIME_CHOICES, self.settings.time_per_question, forward);
            }
        }
    }

    fn begin_quiz(&mut self) -> AppAction {
        if let Err(e) = self.store.set_json(SETTINGS_KEY, &self.settings) {
            error!("Failed to save settings: {e}");
        }
        self.clear_saved_result();
        self.state = AppState::Loading;
        AppAction::LoadQuiz
    }

    /// Resolves questions and starts a session. Blocks on the network.
    pub fn load_quiz(&mut self) -> AppAction {
        let resolution = self.source.resolve_with_provenance(&self.settings);
        self.notice = match resolution.provenance {
            Provenance::Live => None,
            Provenance::Fallback => {
                Some("Couldn't reach the trivia service, using offline questions".to_string())
            }
        };

        match SessionController::new(self.settings.clone(), resolution.questions) {
            Ok(session) => {
                self.session = Some(session);
                self.last_selection = None;
                self.result = None;
                self.state = AppState::Quiz;
                AppAction::RestartTick
            }
            Err(e) => {
                error!("Could not start session: {e}");
                self.notice = Some("No questions available, please try again".to_string());
                self.state = AppState::Setup;
                AppAction::None
            }
        }
    }

    fn on_quiz_key(&mut self, key: KeyEvent) -> AppAction {
        let Some(session) = self.session.as_mut() else {
            self.state = AppState::Home;
            return AppAction::None;
        };

        if let KeyCode::Char(c) = key.code {
            if let Some(idx) = option_index(c) {
                let selection = session.select_answer(idx);
                if selection != Selection::Ignored {
                    self.last_selection = Some(selection);
                }
                return AppAction::None;
            }
        }

        match key.code {
            KeyCode::Esc => {
                session.stop();
                self.session = None;
                self.state = AppState::Home;
                AppAction::None
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('n') => match session.advance() {
                Advance::Next(_) => {
                    self.last_selection = None;
                    AppAction::RestartTick
                }
                Advance::Finished => {
                    self.finish();
                    AppAction::None
                }
                Advance::Ignored => AppAction::None,
            },
            _ => AppAction::None,
        }
    }

    fn finish(&mut self) {
        let Some(result) = self.session.take().and_then(SessionController::into_result) else {
            return;
        };

        if let Err(e) = self.store.set_json(RESULTS_KEY, &result) {
            error!("Failed to save results: {e}");
        }
        match Leaderboard::new(&self.store).record_result(&result) {
            Ok(entry) => info!("Recorded high score {} ({}%)", entry.score, entry.percentage),
            Err(e) => {
                error!("Failed to record high score: {e}");
                self.notice = Some("Couldn't save your score".to_string());
            }
        }

        self.result = Some(result);
        self.show_review = false;
        self.review_scroll = 0;
        self.state = AppState::Results;
    }

    fn on_results_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char('r') => return self.begin_quiz(),
            KeyCode::Char('n') => {
                self.clear_saved_result();
                self.state = AppState::Setup;
            }
            KeyCode::Char('s') => self.share(),
            KeyCode::Char('v') => {
                self.show_review = !self.show_review;
                self.review_scroll = 0;
            }
            KeyCode::Up => self.review_scroll = self.review_scroll.saturating_sub(1),
            KeyCode::Down => {
                let max = self.result.as_ref().map_or(0, |r| r.questions.len().saturating_sub(1));
                self.review_scroll = (self.review_scroll + 1).min(max);
            }
            KeyCode::Char('h') => self.open_high_scores(),
            KeyCode::Esc => self.state = AppState::Home,
            _ => {}
        }
        AppAction::None
    }

    fn on_high_scores_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char('c') => {
                if let Err(e) = Leaderboard::new(&self.store).clear() {
                    error!("Failed to clear high scores: {e}");
                }
                self.high_scores.clear();
            }
            KeyCode::Char('s') => self.state = AppState::Setup,
            KeyCode::Esc | KeyCode::Char('b') => self.state = AppState::Home,
            _ => {}
        }
        AppAction::None
    }

    fn open_high_scores(&mut self) {
        self.high_scores = Leaderboard::new(&self.store).entries().unwrap_or_else(|e| {
            error!("Failed to load high scores: {e}");
            vec![]
        });
        self.state = AppState::HighScores;
    }

    fn clear_saved_result(&mut self) {
        if let Err(e) = self.store.clear(RESULTS_KEY) {
            error!("Failed to clear saved results: {e}");
        }
    }

    fn share(&mut self) {
        let Some(url) = self.result.as_ref().and_then(share_url) else {
            return;
        };
        if Browser::is_available() && webbrowser::open(&url).is_ok() {
            self.notice = Some("Opened your browser to share".to_string());
        } else {
            self.notice = Some(format!("Share this link: {url}"));
        }
    }
}

/// Maps `1`-`9` and `a`-`i` to an option index.
pub fn option_index(c: char) -> Option<usize> {
    match c {
        '1'..='9' => Some(c as usize - '1' as usize),
        'a'..='i' => Some(c as usize - 'a' as usize),
        'A'..='I' => Some(c as usize - 'A' as usize),
        _ => None,
    }
}

/// Letter shown next to option `idx`; only options reachable by a key get one.
pub fn option_label(idx: usize) -> Option<char> {
    let idx = u8::try_from(idx).ok().filter(|i| *i < 9)?;
    Some(char::from(b'A' + idx))
}

pub fn share_url(result: &QuizResult) -> Option<String> {
    Url::parse_with_params(
        "https://twitter.com/intent/tweet",
        &[("text", result.share_text())],
    )
    .ok()
    .map(String::from)
}
