use crate::question::{Question, QuizSettings};
use serde::{Deserialize, Serialize};

/// Snapshot handed to presentation and persistence once a session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub score: u32,
    pub total_questions: usize,
    pub answers: Vec<Option<usize>>,
    pub questions: Vec<Question>,
    pub settings: QuizSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    pub number: usize,
    pub prompt: String,
    pub difficulty: String,
    pub your_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

impl QuizResult {
    pub fn is_correct(&self, index: usize) -> bool {
        match (self.answers.get(index), self.questions.get(index)) {
            (Some(Some(answer)), Some(q)) => *answer == q.correct_index,
            _ => false,
        }
    }

    pub fn correct_count(&self) -> usize {
        (0..self.questions.len()).filter(|&i| self.is_correct(i)).count()
    }

    /// Share of correct answers, rounded to a whole percent.
    pub fn percentage(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        ((self.correct_count() as f64 / self.total_questions as f64) * 100.0).round() as u32
    }

    pub fn message(&self) -> &'static str {
        match self.percentage() {
            90.. => "Outstanding!",
            80..=89 => "Excellent work!",
            70..=79 => "Great job!",
            60..=69 => "Good effort!",
            50..=59 => "Not bad!",
            _ => "Keep practicing!",
        }
    }

    pub fn share_text(&self) -> String {
        format!(
            "I just scored {} points on QuizWhiz! Can you beat my score?",
            self.score
        )
    }

    pub fn review(&self) -> Vec<ReviewEntry> {
        self.questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let chosen = self.answers.get(i).copied().flatten();
                ReviewEntry {
                    number: i + 1,
                    prompt: q.prompt.clone(),
                    difficulty: q.difficulty.to_string(),
                    your_answer: chosen.and_then(|a| q.options.get(a).cloned()),
                    correct_answer: q.correct_option().to_string(),
                    is_correct: self.is_correct(i),
                    explanation: q.explanation.clone(),
                }
            })
            .collect()
    }
}
