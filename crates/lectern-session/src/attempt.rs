//! Taking a quiz and scoring it

use crate::quiz::{Quiz, QuizQuestion};

/// One recorded answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    pub selected: usize,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
    /// Rounded to the nearest whole percent
    pub percentage: u32,
}

impl Score {
    pub fn verdict(&self) -> &'static str {
        if self.percentage >= 70 {
            "Excellent!"
        } else if self.percentage >= 50 {
            "Good Job!"
        } else {
            "Keep Practicing!"
        }
    }
}

/// Progress through a quiz, answered strictly in order
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    quiz: Quiz,
    answers: Vec<Answer>,
}

impl QuizAttempt {
    pub fn new(quiz: Quiz) -> Self {
        Self {
            quiz,
            answers: Vec::new(),
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    /// The next question to answer, or `None` when complete
    pub fn current(&self) -> Option<&QuizQuestion> {
        self.quiz.questions().get(self.answers.len())
    }

    /// Zero-based index of the current question
    pub fn position(&self) -> usize {
        self.answers.len()
    }

    pub fn is_complete(&self) -> bool {
        self.answers.len() >= self.quiz.len()
    }

    /// Answer the current question.
    ///
    /// Returns `None` if the quiz is already complete or `selected` is not an
    /// option index.
    pub fn answer(&mut self, selected: usize) -> Option<Answer> {
        let question = self.current()?;
        if selected >= question.options.len() {
            return None;
        }
        let answer = Answer {
            selected,
            is_correct: selected == question.correct_answer,
        };
        self.answers.push(answer);
        Some(answer)
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Score over the whole quiz; unanswered questions count as wrong
    pub fn score(&self) -> Score {
        let correct = self.answers.iter().filter(|a| a.is_correct).count();
        let total = self.quiz.len();
        let percentage = if total == 0 {
            0
        } else {
            (correct as f64 / total as f64 * 100.0).round() as u32
        };
        Score {
            correct,
            total,
            percentage,
        }
    }

    pub fn restart(&mut self) {
        self.answers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(n: usize) -> Quiz {
        let questions = (0..n)
            .map(|i| QuizQuestion {
                question: format!("Q{}", i + 1),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: i % 4,
                explanation: String::new(),
            })
            .collect();
        Quiz::new(questions).unwrap()
    }

    #[test]
    fn test_answers_in_order() {
        let mut attempt = QuizAttempt::new(quiz(3));
        assert_eq!(attempt.current().unwrap().question, "Q1");

        assert!(attempt.answer(0).unwrap().is_correct);
        assert!(!attempt.answer(0).unwrap().is_correct);
        assert_eq!(attempt.position(), 2);
        assert!(attempt.answer(2).unwrap().is_correct);

        assert!(attempt.is_complete());
        assert!(attempt.current().is_none());
        assert!(attempt.answer(0).is_none());
    }

    #[test]
    fn test_out_of_range_selection_rejected() {
        let mut attempt = QuizAttempt::new(quiz(1));
        assert!(attempt.answer(4).is_none());
        assert_eq!(attempt.position(), 0);
    }

    #[test]
    fn test_score_and_verdicts() {
        let mut attempt = QuizAttempt::new(quiz(3));
        attempt.answer(0);
        attempt.answer(1);
        attempt.answer(0);
        let score = attempt.score();
        assert_eq!((score.correct, score.total, score.percentage), (2, 3, 67));
        assert_eq!(score.verdict(), "Good Job!");

        let verdict = |percentage| Score { correct: 0, total: 0, percentage }.verdict();
        assert_eq!(verdict(70), "Excellent!");
        assert_eq!(verdict(100), "Excellent!");
        assert_eq!(verdict(50), "Good Job!");
        assert_eq!(verdict(49), "Keep Practicing!");
        assert_eq!(verdict(0), "Keep Practicing!");
    }

    #[test]
    fn test_restart_clears_answers() {
        let mut attempt = QuizAttempt::new(quiz(2));
        attempt.answer(0);
        attempt.answer(1);
        assert_eq!(attempt.score().percentage, 100);

        attempt.restart();
        assert_eq!(attempt.position(), 0);
        assert!(!attempt.is_complete());
        assert_eq!(attempt.score().correct, 0);
    }
}
