use crate::compare::text_answer_matches;
use crate::problem::Problem;
use crate::{JudgeResult, SubmissionStatus};

/// TEXT-type submissions never execute anything: the submitted text is the
/// answer. A blank configured answer is the problem's fault, not the
/// submission's.
pub(super) fn judge_text(problem: &Problem, submitted: &str) -> JudgeResult {
    let expected = problem.text_answer.as_deref().unwrap_or("");
    if expected.trim().is_empty() {
        return JudgeResult::system_error("no answer text is configured for this problem");
    }

    if text_answer_matches(expected, submitted) {
        JudgeResult::of(SubmissionStatus::Accepted)
    } else {
        JudgeResult::of(SubmissionStatus::WrongAnswer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::SubmissionType;

    fn text_problem(answer: Option<&str>) -> Problem {
        Problem {
            time_limit_ms: 1000,
            memory_limit_mb: 256,
            submission_type: SubmissionType::Text,
            text_answer: answer.map(|a| a.to_string()),
            generator_language: None,
            generator_code: None,
            solution_language: None,
            solution_code: None,
        }
    }

    #[test]
    fn whitespace_insensitive_match() {
        let problem = text_problem(Some("hello world"));
        let result = judge_text(&problem, "hello\nworld");
        assert_eq!(result.status, SubmissionStatus::Accepted);
    }

    #[test]
    fn wrong_text() {
        let problem = text_problem(Some("hello world"));
        let result = judge_text(&problem, "hello");
        assert_eq!(result.status, SubmissionStatus::WrongAnswer);
    }

    #[test]
    fn missing_answer_is_a_system_error() {
        for problem in [text_problem(None), text_problem(Some("   "))].iter() {
            let result = judge_text(problem, "anything");
            assert_eq!(result.status, SubmissionStatus::SystemError);
        }
    }
}
