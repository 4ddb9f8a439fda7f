use serde::{Deserialize, Serialize};

use crate::lang::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionType {
    #[serde(rename = "CODE")]
    Code,
    #[serde(rename = "TEXT")]
    Text,
}

/// Judging configuration for one problem. Exactly one mode is active:
/// TEXT problems carry an answer string, generated-tests mode requires the
/// full generator/solution pair, everything else judges static testcases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub time_limit_ms: u64,
    pub memory_limit_mb: u64,
    pub submission_type: SubmissionType,
    #[serde(default)]
    pub text_answer: Option<String>,
    #[serde(default)]
    pub generator_language: Option<Language>,
    #[serde(default)]
    pub generator_code: Option<String>,
    #[serde(default)]
    pub solution_language: Option<Language>,
    #[serde(default)]
    pub solution_code: Option<String>,
}

pub struct GeneratedPair<'a> {
    pub generator: (Language, &'a str),
    pub solution: (Language, &'a str),
}

impl Problem {
    /// Generated mode is active only when all four fields are present and
    /// non-empty.
    pub fn generated_pair(&self) -> Option<GeneratedPair<'_>> {
        let generator_language = self.generator_language?;
        let solution_language = self.solution_language?;
        let generator_code = self.generator_code.as_deref().filter(|c| !c.is_empty())?;
        let solution_code = self.solution_code.as_deref().filter(|c| !c.is_empty())?;
        Some(GeneratedPair {
            generator: (generator_language, generator_code),
            solution: (solution_language, solution_code),
        })
    }

    pub fn effective_time_limit_ms(&self) -> u64 {
        if self.time_limit_ms > 0 {
            self.time_limit_ms
        } else {
            1000
        }
    }

    pub fn effective_memory_limit_mb(&self) -> u64 {
        let limit = if self.memory_limit_mb > 0 {
            self.memory_limit_mb
        } else {
            256
        };
        limit.max(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_problem() -> Problem {
        Problem {
            time_limit_ms: 1000,
            memory_limit_mb: 256,
            submission_type: SubmissionType::Code,
            text_answer: None,
            generator_language: None,
            generator_code: None,
            solution_language: None,
            solution_code: None,
        }
    }

    #[test]
    fn deserializes_wire_shape() {
        let json = r#"{
            "timeLimitMs": 2000,
            "memoryLimitMb": 128,
            "submissionType": "CODE",
            "generatorLanguage": "PYTHON3",
            "generatorCode": "print(1)",
            "solutionLanguage": "PYTHON3",
            "solutionCode": "print(2)"
        }"#;
        let problem: Problem = serde_json::from_str(json).unwrap();
        assert_eq!(problem.time_limit_ms, 2000);
        assert!(problem.generated_pair().is_some());
    }

    #[test]
    fn generated_mode_requires_the_full_pair() {
        let mut problem = base_problem();
        problem.generator_language = Some(Language::Python3);
        problem.generator_code = Some("print(1)".into());
        assert!(problem.generated_pair().is_none());

        problem.solution_language = Some(Language::Python3);
        problem.solution_code = Some(String::new());
        assert!(problem.generated_pair().is_none());

        problem.solution_code = Some("print(2)".into());
        assert!(problem.generated_pair().is_some());
    }

    #[test]
    fn limit_clamps() {
        let mut problem = base_problem();
        problem.time_limit_ms = 0;
        problem.memory_limit_mb = 0;
        assert_eq!(problem.effective_time_limit_ms(), 1000);
        assert_eq!(problem.effective_memory_limit_mb(), 256);

        problem.memory_limit_mb = 16;
        assert_eq!(problem.effective_memory_limit_mb(), 64);
    }
}
