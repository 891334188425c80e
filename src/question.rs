use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// One trivia item, immutable once produced by the question source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub category: String,
    pub difficulty: Difficulty,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    pub fn is_well_formed(&self) -> bool {
        self.options.len() >= 2 && self.correct_index < self.options.len()
    }
}

/// Parameters chosen on the setup screen.
///
/// Serializes in the same record shape the settings have always been stored
/// in: numeric fields travel as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSettings {
    pub category: String,
    pub difficulty: Difficulty,
    #[serde(with = "stringly")]
    pub amount: usize,
    #[serde(with = "stringly")]
    pub time_per_question: u32,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            category: "9".to_string(),
            difficulty: Difficulty::Medium,
            amount: 10,
            time_per_question: 15,
        }
    }
}

impl QuizSettings {
    /// Requested question count, never below one.
    pub fn question_limit(&self) -> usize {
        self.amount.max(1)
    }

    /// Seconds per question, never below one.
    pub fn time_limit(&self) -> u32 {
        self.time_per_question.max(1)
    }

    pub fn category_name(&self) -> &str {
        category_name(&self.category).unwrap_or(&self.category)
    }
}

pub const AMOUNT_CHOICES: [usize; 4] = [5, 10, 15, 20];
pub const TIME_CHOICES: [u32; 4] = [10, 15, 30, 60];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
}

pub const CATEGORIES: [Category; 13] = [
    Category { id: "9", name: "General Knowledge" },
    Category { id: "10", name: "Entertainment: Books" },
    Category { id: "11", name: "Entertainment: Film" },
    Category { id: "12", name: "Entertainment: Music" },
    Category { id: "17", name: "Science & Nature" },
    Category { id: "18", name: "Science: Computers" },
    Category { id: "19", name: "Science: Mathematics" },
    Category { id: "20", name: "Mythology" },
    Category { id: "21", name: "Sports" },
    Category { id: "22", name: "Geography" },
    Category { id: "23", name: "History" },
    Category { id: "24", name: "Politics" },
    Category { id: "25", name: "Art" },
];

pub fn category_name(id: &str) -> Option<&'static str> {
    CATEGORIES.iter().find(|c| c.id == id).map(|c| c.name)
}

mod stringly {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::{fmt::Display, str::FromStr};

    pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        text.trim().parse::<T>().map_err(de::Error::custom)
    }
}
