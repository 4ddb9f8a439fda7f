use crate::SubmissionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOutcome {
    Same,
    /// Content matches once all whitespace is removed; only formatting
    /// differs.
    PatternDifferent,
    Different,
}

impl From<CompareOutcome> for SubmissionStatus {
    fn from(outcome: CompareOutcome) -> Self {
        match outcome {
            CompareOutcome::Same => SubmissionStatus::Accepted,
            CompareOutcome::PatternDifferent => SubmissionStatus::PresentationError,
            CompareOutcome::Different => SubmissionStatus::WrongAnswer,
        }
    }
}

pub fn normalize_newlines(value: &str) -> String {
    value.replace("\r\n", "\n")
}

fn trim_trailing(value: &str) -> &str {
    value.trim_end_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

fn strip_whitespace(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '\r' | '\n'))
        .collect()
}

/// Comparator for program output: exact equality after newline normalization
/// and trailing-whitespace trim, then a whitespace-blind second pass that
/// separates formatting mistakes from wrong content.
pub fn compare_output(expected: &str, actual: &str) -> CompareOutcome {
    let expected = normalize_newlines(expected);
    let actual = normalize_newlines(actual);

    if trim_trailing(&expected) == trim_trailing(&actual) {
        return CompareOutcome::Same;
    }

    if strip_whitespace(&expected) == strip_whitespace(&actual) {
        CompareOutcome::PatternDifferent
    } else {
        CompareOutcome::Different
    }
}

/// Whitespace-insensitive full-text match for TEXT-type submissions.
pub fn text_answer_matches(expected: &str, submitted: &str) -> bool {
    strip_whitespace(&normalize_newlines(expected)) == strip_whitespace(&normalize_newlines(submitted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert_eq!(compare_output("3\n", "3\n"), CompareOutcome::Same);
    }

    #[test]
    fn trailing_newline_is_ignored() {
        assert_eq!(compare_output("3\n", "3"), CompareOutcome::Same);
        assert_eq!(compare_output("3", "3  \n\n"), CompareOutcome::Same);
    }

    #[test]
    fn crlf_is_normalized() {
        assert_eq!(compare_output("1\n2\n", "1\r\n2\r\n"), CompareOutcome::Same);
    }

    #[test]
    fn internal_whitespace_is_a_pattern_difference() {
        assert_eq!(compare_output("3\n", "3 \n"), CompareOutcome::Same);
        assert_eq!(compare_output("1 2\n", "1  2\n"), CompareOutcome::PatternDifferent);
        assert_eq!(compare_output("1 2\n", "1\n2\n"), CompareOutcome::PatternDifferent);
    }

    #[test]
    fn content_difference_wins() {
        assert_eq!(compare_output("3\n", "4\n"), CompareOutcome::Different);
    }

    // whitespace-equal content must never come out as Different
    #[test]
    fn pattern_difference_is_never_wrong_answer() {
        let pairs = [("a b c", "a\nb\nc"), ("1\t2", "12"), (" x ", "x")];
        for (expected, actual) in pairs.iter() {
            assert_ne!(compare_output(expected, actual), CompareOutcome::Different);
        }
    }

    #[test]
    fn outcome_maps_to_status() {
        assert_eq!(
            SubmissionStatus::from(CompareOutcome::PatternDifferent),
            SubmissionStatus::PresentationError
        );
        assert_eq!(
            SubmissionStatus::from(CompareOutcome::Different),
            SubmissionStatus::WrongAnswer
        );
    }

    #[test]
    fn text_answers_match_ignoring_whitespace() {
        assert!(text_answer_matches("hello world", "hello\nworld"));
        assert!(!text_answer_matches("hello world", "hello"));
    }
}
