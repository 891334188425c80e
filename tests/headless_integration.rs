use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use quizwhiz::app::{App, AppAction, AppState};
use quizwhiz::error::SourceError;
use quizwhiz::question::{Difficulty, QuizSettings};
use quizwhiz::runtime::{FixedTicker, QuizEvent, Runner, TestEventSource};
use quizwhiz::shuffle::Shuffler;
use quizwhiz::source::{QuestionProvider, QuestionSource, RawQuestion};
use quizwhiz::store::{KeyValueStore, MemoryStore, HIGH_SCORES_KEY, RESULTS_KEY};

fn key(code: KeyCode) -> QuizEvent {
    QuizEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn app_with(settings: QuizSettings) -> App<MemoryStore> {
    let mut app = App::new(
        MemoryStore::new(),
        QuestionSource::offline(Shuffler::seeded(42)),
    );
    app.settings = settings;
    app
}

/// Drives the app the same way the binary does, minus the terminal.
fn drive(app: &mut App<MemoryStore>, runner: &mut Runner<TestEventSource, FixedTicker>, steps: u32) {
    for _ in 0..steps {
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
                let action = app.load_quiz();
                runner.discard_pending();
                if action == AppAction::RestartTick {
                    runner.restart_tick();
                }
            }
            AppAction::RestartTick => runner.restart_tick(),
            AppAction::None => {}
        }
        if app.state == AppState::Results {
            break;
        }
    }
}

// Answers every question with option A and steps through to the results.
#[test]
fn headless_quiz_flow_completes() {
    let mut app = app_with(QuizSettings {
        category: "9".to_string(),
        difficulty: Difficulty::Easy,
        amount: 3,
        time_per_question: 30,
    });

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_secs(10)),
    );

    tx.send(key(KeyCode::Enter)).unwrap(); // home -> setup
    tx.send(key(KeyCode::Enter)).unwrap(); // setup -> load
    for _ in 0..3 {
        tx.send(key(KeyCode::Char('a'))).unwrap();
        tx.send(key(KeyCode::Enter)).unwrap();
    }

    drive(&mut app, &mut runner, 100);

    assert_eq!(app.state, AppState::Results);
    let result = app.result.as_ref().expect("result after last question");
    assert_eq!(result.total_questions, 3);
    assert!(result.answers.iter().all(|a| *a == Some(0)));
    assert!(app.notice.is_some(), "offline source reports fallback");

    assert!(app.store().get(RESULTS_KEY).unwrap().is_some());
    assert!(app.store().get(HIGH_SCORES_KEY).unwrap().is_some());
}

// Nobody answers: ticks alone expire each question.
#[test]
fn headless_timeouts_expire_questions() {
    let mut app = app_with(QuizSettings {
        category: "9".to_string(),
        difficulty: Difficulty::Medium,
        amount: 2,
        time_per_question: 2,
    });

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Enter)).unwrap();
    drive(&mut app, &mut runner, 2);
    assert_eq!(app.state, AppState::Quiz);

    for _ in 0..2 {
        drive(&mut app, &mut runner, 2);
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.state().time_left, 0);
        assert!(session.state().feedback_visible);
        assert_eq!(session.current_answer(), None);
        app.on_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
    }

    assert_eq!(app.state, AppState::Results);
    let result = app.result.as_ref().unwrap();
    assert_eq!(result.score, 0);
    assert_eq!(result.answers, vec![None, None]);
}

#[test]
fn ctrl_c_quits_from_anywhere() {
    let mut app = app_with(QuizSettings::default());
    app.state = AppState::Setup;
    let action = app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert_eq!(action, AppAction::Quit);
}

/// A slow upstream: the user keeps typing while the request is in flight.
struct TypingDuringFetch {
    tx: mpsc::Sender<QuizEvent>,
}

impl QuestionProvider for TypingDuringFetch {
    fn fetch(&self, _settings: &QuizSettings) -> Result<Vec<RawQuestion>, SourceError> {
        for c in ['1', 'b'] {
            self.tx.send(key(KeyCode::Char(c))).unwrap();
        }
        Err(SourceError::Offline)
    }
}

#[test]
fn keys_typed_while_loading_do_not_answer() {
    let (tx, rx) = mpsc::channel();
    let source = QuestionSource::new(
        Box::new(TypingDuringFetch { tx: tx.clone() }),
        Shuffler::seeded(5),
    );
    let mut app = App::new(MemoryStore::new(), source);
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_secs(10)),
    );

    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Enter)).unwrap();
    drive(&mut app, &mut runner, 2);
    assert_eq!(app.state, AppState::Quiz);

    tx.send(key(KeyCode::Char('2'))).unwrap();
    drive(&mut app, &mut runner, 1);

    let session = app.session.as_ref().unwrap();
    assert_eq!(session.state().current_index, 0);
    assert_eq!(session.current_answer(), Some(1));
    assert!(app.last_selection.is_some());

    // the only answer on record is the one typed after the question appeared
    let answered: Vec<_> = session.state().answers.iter().flatten().collect();
    assert_eq!(answered, vec![&1]);
}

#[test]
fn nothing_is_answered_right_after_loading() {
    let (tx, rx) = mpsc::channel();
    let source = QuestionSource::new(
        Box::new(TypingDuringFetch { tx: tx.clone() }),
        Shuffler::seeded(6),
    );
    let mut app = App::new(MemoryStore::new(), source);
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_secs(10)),
    );

    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Enter)).unwrap();
    drive(&mut app, &mut runner, 2);

    let session = app.session.as_ref().unwrap();
    assert!(!session.state().answered);
    assert_eq!(session.current_answer(), None);
    assert_eq!(session.state().score, 0);
    assert_eq!(runner.discard_pending(), 0);
}
