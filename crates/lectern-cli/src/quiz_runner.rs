//! Taking a quiz in the terminal

use std::io::{self, BufRead, Write};

use lectern_session::{Quiz, QuizAttempt, QuizQuestion, Score};

/// Run a quiz interactively, one question at a time.
///
/// Returns the score of the last completed run, or `None` if the user quit
/// (typing `q` or closing input) before finishing the first one.
pub fn run_quiz<R: BufRead, W: Write>(
    quiz: Quiz,
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<Score>> {
    let mut attempt = QuizAttempt::new(quiz);
    let mut last_score = None;

    loop {
        while let Some(question) = attempt.current().cloned() {
            let total = attempt.quiz().len();
            writeln!(out, "\nQuestion {}/{}: {}", attempt.position() + 1, total, question.question)?;
            for (i, option) in question.options.iter().enumerate() {
                writeln!(out, "  {}) {}", QuizQuestion::letter(i), option)?;
            }

            let Some(selected) = read_choice(input, out, question.options.len())? else {
                writeln!(out, "\nQuiz stopped.")?;
                return Ok(last_score);
            };
            let Some(answer) = attempt.answer(selected) else {
                continue;
            };

            let correct = question.correct_answer;
            if answer.is_correct {
                writeln!(out, "Correct!")?;
            } else {
                writeln!(
                    out,
                    "Incorrect. The correct answer is {}) {}",
                    QuizQuestion::letter(correct),
                    question.options[correct]
                )?;
            }
            writeln!(out, "Explanation: {}", question.explanation)?;
        }

        let score = attempt.score();
        writeln!(out, "\n{} {}%", score.verdict(), score.percentage)?;
        writeln!(
            out,
            "You got {} out of {} questions correct",
            score.correct, score.total
        )?;
        last_score = Some(score);

        write!(out, "\nRetake the quiz? [y/N] ")?;
        out.flush()?;
        match read_line(input)? {
            Some(line) if line.eq_ignore_ascii_case("y") || line.eq_ignore_ascii_case("yes") => {
                attempt.restart();
            }
            _ => return Ok(last_score),
        }
    }
}

/// Prompt until a valid letter (or 1-based number) is entered; `None` on quit
fn read_choice<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    options: usize,
) -> io::Result<Option<usize>> {
    let last = QuizQuestion::letter(options.saturating_sub(1));
    loop {
        write!(out, "Your answer (A-{}, q to quit): ", last)?;
        out.flush()?;

        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
            return Ok(None);
        }
        if let Some(index) = parse_choice(&line, options) {
            return Ok(Some(index));
        }
        writeln!(out, "Please answer with a letter between A and {}.", last)?;
    }
}

fn parse_choice(line: &str, options: usize) -> Option<usize> {
    let mut chars = line.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return line.parse::<usize>().ok().filter(|n| (1..=options).contains(n)).map(|n| n - 1);
    }
    let index = match c.to_ascii_uppercase() {
        l @ 'A'..='Z' => l as usize - 'A' as usize,
        d @ '1'..='9' => d as usize - '1' as usize,
        _ => return None,
    };
    (index < options).then_some(index)
}

/// Next trimmed line, `None` at end of input
fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
