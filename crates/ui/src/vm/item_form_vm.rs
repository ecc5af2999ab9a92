use std::fmt;

use testset_core::model::{CodeSubmission, QuizAnswer};

/// Languages offered on the coding page, as `(value, label)`.
pub const CODE_LANGUAGES: &[(&str, &str)] = &[
    ("javascript", "JavaScript"),
    ("python", "Python"),
    ("java", "Java"),
    ("cpp", "C++"),
    ("rust", "Rust"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizAnswerParseError {
    Empty,
    MissingSelection { line: usize },
}

impl fmt::Display for QuizAnswerParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizAnswerParseError::Empty => write!(f, "enter at least one answer"),
            QuizAnswerParseError::MissingSelection { line } => {
                write!(f, "line {line}: expected `question: choice, choice`")
            }
        }
    }
}

/// Parses the quiz form, one `questionId: choice, choice` per line.
///
/// # Errors
///
/// Returns `QuizAnswerParseError` when no answer is given or a line has no
/// selection.
pub fn parse_quiz_answers(raw: &str) -> Result<Vec<QuizAnswer>, QuizAnswerParseError> {
    let mut answers = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (question, choices) = line
            .split_once(':')
            .ok_or(QuizAnswerParseError::MissingSelection { line: index + 1 })?;
        let selected: Vec<String> = choices
            .split(',')
            .map(str::trim)
            .filter(|choice| !choice.is_empty())
            .map(str::to_owned)
            .collect();
        if question.trim().is_empty() || selected.is_empty() {
            return Err(QuizAnswerParseError::MissingSelection { line: index + 1 });
        }
        answers.push(QuizAnswer {
            question_id: question.trim().to_owned(),
            selected,
        });
    }
    if answers.is_empty() {
        return Err(QuizAnswerParseError::Empty);
    }
    Ok(answers)
}

/// Coding form payload; `None` while the editor is blank.
#[must_use]
pub fn code_submission(language: &str, source: &str) -> Option<CodeSubmission> {
    if source.trim().is_empty() {
        return None;
    }
    Some(CodeSubmission {
        language: language.to_owned(),
        source_code: source.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_answer_per_line() {
        let answers = parse_quiz_answers("q1: a\n\n q2 : b, c \n").unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[1].question_id, "q2");
        assert_eq!(answers[1].selected, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn rejects_blank_and_malformed_input() {
        assert_eq!(parse_quiz_answers("  \n"), Err(QuizAnswerParseError::Empty));
        assert_eq!(
            parse_quiz_answers("q1: a\nq2"),
            Err(QuizAnswerParseError::MissingSelection { line: 2 })
        );
        assert_eq!(
            parse_quiz_answers("q1: ,"),
            Err(QuizAnswerParseError::MissingSelection { line: 1 })
        );
    }

    #[test]
    fn blank_source_is_not_submitted() {
        assert_eq!(code_submission("rust", "   "), None);
        let submission = code_submission("rust", "fn main() {}").unwrap();
        assert_eq!(submission.language, "rust");
    }
}
