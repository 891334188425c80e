use crate::error::SourceError;
use crate::question::{Difficulty, Question, QuizSettings};
use crate::shuffle::Shuffler;
use include_dir::{include_dir, Dir};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

static QUESTIONS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/questions");

pub const DEFAULT_API_BASE_URL: &str = "https://opentdb.com";

/// A question as the upstream provider sends it: entity-encoded strings and
/// the correct answer kept apart from the wrong ones.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawQuestion {
    pub category: String,
    pub difficulty: String,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<RawQuestion>,
}

/// Anything that can hand back raw questions for a settings request.
pub trait QuestionProvider {
    fn fetch(&self, settings: &QuizSettings) -> Result<Vec<RawQuestion>, SourceError>;
}

/// Open Trivia DB over blocking HTTP.
#[derive(Debug, Clone)]
pub struct OpenTdbProvider {
    base_url: String,
    client: Client,
}

impl OpenTdbProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self) -> String {
        format!("{}/api.php", self.base_url)
    }
}

impl QuestionProvider for OpenTdbProvider {
    fn fetch(&self, settings: &QuizSettings) -> Result<Vec<RawQuestion>, SourceError> {
        let url = self.url();
        info!(
            "Fetching {} {} questions in category {} from {}",
            settings.question_limit(),
            settings.difficulty,
            settings.category,
            url
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("amount", settings.question_limit().to_string()),
                ("category", settings.category.clone()),
                ("difficulty", settings.difficulty.to_string()),
                ("type", "multiple".to_string()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status));
        }

        let body: ProviderResponse = response.json()?;
        if body.response_code != 0 {
            return Err(SourceError::ResponseCode(body.response_code));
        }

        Ok(body.results)
    }
}

/// Provider used when the network is switched off; every fetch fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

impl QuestionProvider for OfflineProvider {
    fn fetch(&self, _settings: &QuizSettings) -> Result<Vec<RawQuestion>, SourceError> {
        Err(SourceError::Offline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Live,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub questions: Vec<Question>,
    pub provenance: Provenance,
}

/// Decodes, merges and shuffles one upstream item.
pub fn normalize_question(
    raw: &RawQuestion,
    index: usize,
    shuffler: &mut Shuffler,
) -> Result<Question, SourceError> {
    let difficulty = Difficulty::parse(&raw.difficulty)
        .ok_or_else(|| SourceError::Malformed(format!("unknown difficulty {:?}", raw.difficulty)))?;

    if raw.incorrect_answers.is_empty() {
        return Err(SourceError::Malformed(format!(
            "question {index} has no incorrect answers"
        )));
    }

    let mut options: Vec<String> = raw.incorrect_answers.iter().map(|a| decode(a)).collect();
    let correct_index = options.len();
    options.push(decode(&raw.correct_answer));

    let (options, correct_index) = shuffler.shuffle_options(options, correct_index);

    Ok(Question {
        id: format!("question-{index}"),
        category: decode(&raw.category),
        difficulty,
        prompt: decode(&raw.question),
        options,
        correct_index,
        explanation: None,
    })
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// The hand-authored questions used whenever the provider cannot be used.
pub fn fallback_questions() -> Vec<Question> {
    let contents = QUESTIONS_DIR
        .get_file("fallback.json")
        .and_then(|f| f.contents_utf8())
        .expect("fallback questions are embedded");

    serde_json::from_str(contents).expect("embedded fallback questions are valid json")
}

/// Resolves settings into an ordered question list, degrading to the
/// fallback set on any upstream problem.
pub struct QuestionSource {
    provider: Box<dyn QuestionProvider>,
    shuffler: Shuffler,
}

impl QuestionSource {
    pub fn new(provider: Box<dyn QuestionProvider>, shuffler: Shuffler) -> Self {
        Self { provider, shuffler }
    }

    pub fn offline(shuffler: Shuffler) -> Self {
        Self::new(Box::new(OfflineProvider), shuffler)
    }

    pub fn resolve(&mut self, settings: &QuizSettings) -> Vec<Question> {
        self.resolve_with_provenance(settings).questions
    }

    pub fn resolve_with_provenance(&mut self, settings: &QuizSettings) -> Resolution {
        match self.try_live(settings) {
            Ok(questions) => {
                info!("Resolved {} questions from provider", questions.len());
                Resolution {
                    questions,
                    provenance: Provenance::Live,
                }
            }
            Err(e) => {
                warn!("Failed to fetch questions from provider, using fallback questions: {e}");
                Resolution {
                    questions: self.fallback(settings),
                    provenance: Provenance::Fallback,
                }
            }
        }
    }

    fn try_live(&mut self, settings: &QuizSettings) -> Result<Vec<Question>, SourceError> {
        let raw = self.provider.fetch(settings)?;
        if raw.is_empty() {
            return Err(SourceError::Empty);
        }

        // one bad item spoils the batch
        let mut questions = raw
            .iter()
            .enumerate()
            .map(|(i, r)| normalize_question(r, i, &mut self.shuffler))
            .collect::<Result<Vec<_>, _>>()?;

        questions.truncate(settings.question_limit());
        Ok(questions)
    }

    fn fallback(&mut self, settings: &QuizSettings) -> Vec<Question> {
        let mut questions = fallback_questions();
        self.shuffler.shuffle(&mut questions);
        questions.truncate(settings.question_limit());

        questions
            .into_iter()
            .map(|q| {
                let (options, correct_index) =
                    self.shuffler.shuffle_options(q.options, q.correct_index);
                Question {
                    options,
                    correct_index,
                    ..q
                }
            })
            .collect()
    }
}
