//! Quiz request prompt
//!
//! The rendered prompt asks the model for the exact line template that
//! [`crate::quiz::extract_quiz`] parses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default number of questions requested
pub const DEFAULT_QUESTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}' (expected easy, medium or hard)", other)),
        }
    }
}

/// Parameters for a quiz request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizPrompt {
    pub questions: usize,
    pub difficulty: Difficulty,
    /// Page range to draw from, e.g. `"3-7"`
    pub pages: Option<String>,
}

impl Default for QuizPrompt {
    fn default() -> Self {
        Self {
            questions: DEFAULT_QUESTIONS,
            difficulty: Difficulty::default(),
            pages: None,
        }
    }
}

impl QuizPrompt {
    pub fn new(questions: usize, difficulty: Difficulty) -> Self {
        Self {
            questions: questions.max(1),
            difficulty,
            pages: None,
        }
    }

    pub fn with_pages(mut self, pages: impl Into<String>) -> Self {
        let pages = pages.into();
        self.pages = (!pages.trim().is_empty()).then(|| pages.trim().to_string());
        self
    }

    /// Render the message sent to the assistant
    pub fn render(&self) -> String {
        let mut prompt = format!(
            "Create {} multiple-choice quiz questions at {} difficulty level",
            self.questions, self.difficulty
        );
        if let Some(pages) = &self.pages {
            prompt.push_str(&format!(" from pages {}", pages));
        }
        prompt.push_str(&format!(
            ". Format each question EXACTLY as follows:\n\n\
             Question 1: [Your question here]\n\
             A) [First option]\n\
             B) [Second option]\n\
             C) [Third option]\n\
             D) [Fourth option]\n\
             Correct Answer: [A, B, C, or D]\n\
             Explanation: [Brief explanation]\n\n\
             Please generate all {} questions in this exact format.",
            self.questions
        ));
        prompt
    }
}
