use crate::error::SessionError;
use crate::question::{Question, QuizSettings};
use crate::result::QuizResult;
use tracing::{debug, info};

/// Flat points for a correct answer; the seconds left are added on top.
pub const BASE_POINTS: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub score: u32,
    pub answers: Vec<Option<usize>>,
    pub time_left: u32,
    pub answered: bool,
    pub feedback_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One second passed; seconds remaining.
    Counted(u32),
    /// The clock ran out and the question was forfeited.
    Expired,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Correct { points: u32 },
    Incorrect,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Finished,
    Ignored,
}

/// Drives one quiz from the first question to the result.
///
/// The host delivers `tick` once per second while [`is_timer_active`]
/// holds, forwards answer choices to `select_answer`, and calls `advance`
/// once feedback has been shown. Calls that do not fit the current state
/// are ignored rather than treated as errors.
///
/// [`is_timer_active`]: SessionController::is_timer_active
#[derive(Debug)]
pub struct SessionController {
    settings: QuizSettings,
    time_limit: u32,
    state: SessionState,
    stopped: bool,
    result: Option<QuizResult>,
}

impl SessionController {
    pub fn new(settings: QuizSettings, questions: Vec<Question>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }

        let time_limit = settings.time_limit();
        let n = questions.len();
        info!("Starting session with {n} questions, {time_limit}s each");

        Ok(Self {
            settings,
            time_limit,
            state: SessionState {
                questions,
                current_index: 0,
                score: 0,
                answers: vec![None; n],
                time_left: time_limit,
                answered: false,
                feedback_visible: false,
            },
            stopped: false,
            result: None,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    /// The question being shown, or `None` once finished.
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_finished() {
            None
        } else {
            self.state.questions.get(self.state.current_index)
        }
    }

    pub fn current_answer(&self) -> Option<usize> {
        self.state.answers.get(self.state.current_index).copied().flatten()
    }

    pub fn is_last_question(&self) -> bool {
        self.state.current_index + 1 >= self.state.questions.len()
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Whether the host should be delivering ticks right now.
    pub fn is_timer_active(&self) -> bool {
        !self.stopped && !self.state.answered && !self.is_finished()
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<QuizResult> {
        self.result
    }

    /// Resumes tick and answer delivery after [`stop`](Self::stop).
    pub fn start(&mut self) {
        if self.stopped {
            debug!("Session resumed at question {}", self.state.current_index);
        }
        self.stopped = false;
    }

    /// Halts the session; ticks and answers are ignored until `start`.
    pub fn stop(&mut self) {
        if !self.stopped {
            debug!("Session stopped at question {}", self.state.current_index);
        }
        self.stopped = true;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_timer_active() {
            return TickOutcome::Ignored;
        }

        if self.state.time_left > 1 {
            self.state.time_left -= 1;
            TickOutcome::Counted(self.state.time_left)
        } else {
            self.state.time_left = 0;
            self.state.answered = true;
            self.state.feedback_visible = true;
            debug!("Time expired on question {}", self.state.current_index);
            TickOutcome::Expired
        }
    }

    pub fn select_answer(&mut self, option_index: usize) -> Selection {
        if self.stopped || self.state.answered || self.is_finished() {
            return Selection::Ignored;
        }

        let idx = self.state.current_index;
        let correct_index = match self.state.questions.get(idx) {
            Some(q) if option_index < q.options.len() => q.correct_index,
            _ => return Selection::Ignored,
        };

        self.state.answers[idx] = Some(option_index);
        self.state.answered = true;
        self.state.feedback_visible = true;

        if option_index == correct_index {
            let points = BASE_POINTS + self.state.time_left;
            self.state.score += points;
            debug!("Question {idx} correct, +{points}");
            Selection::Correct { points }
        } else {
            debug!("Question {idx} incorrect");
            Selection::Incorrect
        }
    }

    pub fn advance(&mut self) -> Advance {
        if !self.state.feedback_visible || self.is_finished() {
            return Advance::Ignored;
        }

        if self.state.current_index + 1 < self.state.questions.len() {
            self.state.current_index += 1;
            self.state.time_left = self.time_limit;
            self.state.answered = false;
            self.state.feedback_visible = false;
            Advance::Next(self.state.current_index)
        } else {
            self.state.current_index = self.state.questions.len();
            let result = QuizResult {
                score: self.state.score,
                total_questions: self.state.questions.len(),
                answers: self.state.answers.clone(),
                questions: self.state.questions.clone(),
                settings: self.settings.clone(),
            };
            info!(
                "Session finished: {} points, {}/{} correct",
                result.score,
                result.correct_count(),
                result.total_questions
            );
            self.result = Some(result);
            Advance::Finished
        }
    }
}
