//! /quiz command - ask the assistant for a quiz

use super::CommandResult;
use lectern_session::{Difficulty, QuizPrompt};

pub struct QuizCommand;

impl QuizCommand {
    pub fn execute(args: &str, defaults: &QuizPrompt) -> CommandResult {
        match Self::parse(args, defaults) {
            Ok(prompt) => CommandResult::Send(prompt.render()),
            Err(msg) => CommandResult::Message(msg),
        }
    }

    /// `[n] [easy|medium|hard] [pages]`. The count and difficulty may come in
    /// either order; the first other token starts the page range.
    pub fn parse(args: &str, defaults: &QuizPrompt) -> Result<QuizPrompt, String> {
        let mut questions = None;
        let mut difficulty = None;
        let mut pages: Vec<&str> = Vec::new();
        let mut in_pages = false;

        for token in args.split_whitespace() {
            if in_pages {
                pages.push(token);
                continue;
            }
            if questions.is_none() {
                if let Ok(n) = token.parse::<usize>() {
                    if n == 0 {
                        return Err("A quiz needs at least one question.".to_string());
                    }
                    questions = Some(n);
                    continue;
                }
            }
            if difficulty.is_none() {
                if let Ok(d) = token.parse::<Difficulty>() {
                    difficulty = Some(d);
                    continue;
                }
            }
            in_pages = true;
            if !token.eq_ignore_ascii_case("pages") {
                pages.push(token);
            }
        }

        let prompt = QuizPrompt::new(
            questions.unwrap_or(defaults.questions),
            difficulty.unwrap_or(defaults.difficulty),
        );
        Ok(prompt.with_pages(pages.join(" ")))
    }
}
