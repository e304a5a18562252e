//! Quiz extraction from free-form assistant text
//!
//! The assistant is asked to answer in a fixed template (see
//! [`crate::prompt::QuizPrompt`]), but nothing forces it to. Extraction is a
//! best-effort pass over a small line grammar:
//!
//! ```text
//! block     := "Question" SP INT ":" question-line line*
//! option    := [A-D] (")" | ":" | ".") text          (case-insensitive)
//! answer    := line containing "correct answer"; first standalone A-D letter
//! explain   := line containing "explanation"; rest of it plus all later lines
//! ```
//!
//! Text before the first block is ignored. Each block stands alone: a block
//! that does not yield a question never affects its neighbours.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of options every question carries
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Explanation used when a block has none
pub const NO_EXPLANATION: &str = "No explanation provided";

static QUESTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)question \d+:").unwrap());

static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-D][):.]\s*(.+)$").unwrap());

static ANSWER_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)correct\s*answer").unwrap());

static ANSWER_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([A-D])\b").unwrap());

static EXPLANATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)explanation").unwrap());

static QUIZ_INTENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)create|generate|make|quiz|test|questions").unwrap());

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct_answer: usize,
    #[serde(default = "default_explanation")]
    pub explanation: String,
}

fn default_explanation() -> String {
    NO_EXPLANATION.to_string()
}

impl QuizQuestion {
    /// Whether this question can be shown and graded
    pub fn is_valid(&self) -> bool {
        !self.question.trim().is_empty()
            && self.options.len() == OPTIONS_PER_QUESTION
            && self.correct_answer < OPTIONS_PER_QUESTION
    }

    /// Option letter for an index (`0` -> `A`). `index` must be below 26.
    pub fn letter(index: usize) -> char {
        debug_assert!(index < 26, "no option letter for index {}", index);
        char::from(b'A' + (index % 26) as u8)
    }
}

/// Whether a user utterance asks for a quiz.
///
/// This is a keyword match on the user's text only. Negations are not
/// understood: "don't make a quiz" still counts.
pub fn is_quiz_request(text: &str) -> bool {
    QUIZ_INTENT.is_match(text)
}

/// Extract every well-formed question from an assistant response
pub fn extract_quiz(text: &str) -> Vec<QuizQuestion> {
    let markers: Vec<_> = QUESTION_MARKER.find_iter(text).collect();

    markers
        .iter()
        .enumerate()
        .filter_map(|(i, marker)| {
            let end = markers.get(i + 1).map_or(text.len(), |next| next.start());
            // A bold marker for the next question leaves `**` behind
            let block = text[marker.end()..end]
                .trim_end_matches(|c: char| c == '*' || c.is_whitespace());
            let question = parse_block(block);
            if question.is_none() {
                tracing::debug!("Quiz block {} did not yield a question", i + 1);
            }
            question
        })
        .collect()
}

fn parse_block(block: &str) -> Option<QuizQuestion> {
    let lines: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let question = lines
        .first()?
        .trim_start_matches(|c: char| c == ':' || c == '\u{ff1a}' || c == '*' || c.is_whitespace())
        .to_string();

    let mut options: Vec<String> = lines
        .iter()
        .filter_map(|line| OPTION_LINE.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .collect();

    if question.is_empty() || options.len() < OPTIONS_PER_QUESTION {
        return None;
    }
    options.truncate(OPTIONS_PER_QUESTION);

    let correct_answer = lines
        .iter()
        .find(|line| ANSWER_PHRASE.is_match(line))
        .and_then(|line| ANSWER_LETTER.captures(line))
        .map(|caps| answer_index(&caps[1]))
        .unwrap_or(0);

    Some(QuizQuestion {
        question,
        options,
        correct_answer,
        explanation: parse_explanation(&lines),
    })
}

fn answer_index(letter: &str) -> usize {
    match letter.to_ascii_uppercase().as_str() {
        "B" => 1,
        "C" => 2,
        "D" => 3,
        _ => 0,
    }
}

fn parse_explanation(lines: &[&str]) -> String {
    let Some(index) = lines.iter().position(|line| EXPLANATION.is_match(line)) else {
        return NO_EXPLANATION.to_string();
    };

    let line = lines[index];
    let rest = EXPLANATION
        .find(line)
        .map_or("", |m| &line[m.end()..])
        .trim_start_matches(|c: char| c == ':' || c == '\u{ff1a}' || c == '*' || c.is_whitespace());

    let explanation = std::iter::once(rest)
        .chain(lines[index + 1..].iter().copied())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if explanation.is_empty() {
        NO_EXPLANATION.to_string()
    } else {
        explanation
    }
}

/// All-or-nothing check: non-empty and every question valid
pub fn validate_quiz(questions: &[QuizQuestion]) -> bool {
    !questions.is_empty() && questions.iter().all(QuizQuestion::is_valid)
}

/// The same check over loosely typed JSON (e.g. a quiz file from disk).
///
/// Rejects a `correctAnswer` that is not a non-negative integer.
pub fn validate_quiz_value(value: &serde_json::Value) -> bool {
    let Some(questions) = value.as_array() else {
        return false;
    };
    !questions.is_empty()
        && questions.iter().all(|q| {
            let question_ok = q
                .get("question")
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.trim().is_empty());
            let options_ok = q
                .get("options")
                .and_then(|v| v.as_array())
                .is_some_and(|opts| {
                    opts.len() == OPTIONS_PER_QUESTION && opts.iter().all(|o| o.is_string())
                });
            let answer_ok = q
                .get("correctAnswer")
                .and_then(|v| v.as_u64())
                .is_some_and(|n| n < OPTIONS_PER_QUESTION as u64);
            question_ok && options_ok && answer_ok
        })
}

/// A validated quiz: at least one question, every question well-formed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quiz {
    questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// Validate a sequence of questions into a quiz
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self> {
        if questions.is_empty() {
            return Err(Error::InvalidQuiz("no questions".to_string()));
        }
        if let Some(pos) = questions.iter().position(|q| !q.is_valid()) {
            return Err(Error::InvalidQuiz(format!("question {} is malformed", pos + 1)));
        }
        Ok(Self { questions })
    }

    /// Extract and validate in one step
    pub fn from_response(text: &str) -> Option<Self> {
        Self::new(extract_quiz(text)).ok()
    }

    /// Load a quiz exported as JSON, either `{"questions": [...]}` or a bare array
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| Error::InvalidQuiz(e.to_string()))?;
        let questions = match value {
            serde_json::Value::Object(mut map) => map
                .remove("questions")
                .unwrap_or(serde_json::Value::Null),
            other => other,
        };
        if !validate_quiz_value(&questions) {
            return Err(Error::InvalidQuiz(
                "expected 1+ questions with 4 options and an integer correctAnswer in 0..=3"
                    .to_string(),
            ));
        }
        let questions: Vec<QuizQuestion> =
            serde_json::from_value(questions).map_err(|e| Error::InvalidQuiz(e.to_string()))?;
        Self::new(questions)
    }

    /// Export as `{"questions": [...]}`
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
