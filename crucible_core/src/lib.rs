pub mod compare;
pub mod error;
pub mod judge;
pub mod lang;
pub mod prepare;
pub mod problem;
pub mod runner;
pub mod sandbox;
pub mod testcase;

use serde::{Deserialize, Serialize};

use crate::lang::Language;

/// One judging attempt on one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub language: Language,
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Running,
    Accepted,
    WrongAnswer,
    CompileError,
    RuntimeError,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    PresentationError,
    SystemError,
}

impl SubmissionStatus {
    pub fn default_message(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "Pending",
            SubmissionStatus::Running => "Judging",
            SubmissionStatus::Accepted => "Accepted",
            SubmissionStatus::WrongAnswer => "Wrong answer",
            SubmissionStatus::CompileError => "Compile error",
            SubmissionStatus::RuntimeError => "Runtime error",
            SubmissionStatus::TimeLimitExceeded => "Time limit exceeded",
            SubmissionStatus::MemoryLimitExceeded => "Memory limit exceeded",
            SubmissionStatus::PresentationError => "Output format error",
            SubmissionStatus::SystemError => "System error",
        }
    }
}

/// Produced once per judging attempt, never mutated afterwards. `detail`
/// carries raw diagnostics (compiler output, runtime stderr) with resource
/// measurement noise already removed; it never contains workspace names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeResult {
    pub status: SubmissionStatus,
    pub message: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub runtime_ms: Option<u64>,
    #[serde(default)]
    pub memory_kb: Option<u64>,
    #[serde(default)]
    pub failed_testcase_ord: Option<u32>,
}

impl JudgeResult {
    pub fn of(status: SubmissionStatus) -> Self {
        Self {
            status,
            message: status.default_message().to_string(),
            detail: None,
            runtime_ms: None,
            memory_kb: None,
            failed_testcase_ord: None,
        }
    }

    pub fn system_error<T: Into<String>>(detail: T) -> Self {
        Self::of(SubmissionStatus::SystemError).with_detail(detail)
    }

    pub fn with_message<T: Into<String>>(mut self, message: T) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_detail<T: Into<String>>(mut self, detail: T) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn measured(mut self, runtime_ms: u64, memory_kb: Option<u64>) -> Self {
        self.runtime_ms = Some(runtime_ms);
        self.memory_kb = memory_kb;
        self
    }

    pub fn failed_at(mut self, ord: u32) -> Self {
        self.failed_testcase_ord = Some(ord);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        let encoded = serde_json::to_string(&SubmissionStatus::TimeLimitExceeded).unwrap();
        assert_eq!(encoded, "\"TIME_LIMIT_EXCEEDED\"");

        let decoded: SubmissionStatus = serde_json::from_str("\"PRESENTATION_ERROR\"").unwrap();
        assert_eq!(decoded, SubmissionStatus::PresentationError);
    }

    #[test]
    fn result_builder() {
        let result = JudgeResult::of(SubmissionStatus::WrongAnswer)
            .measured(42, Some(1024))
            .failed_at(3);

        assert_eq!(result.status, SubmissionStatus::WrongAnswer);
        assert_eq!(result.message, "Wrong answer");
        assert_eq!(result.runtime_ms, Some(42));
        assert_eq!(result.memory_kb, Some(1024));
        assert_eq!(result.failed_testcase_ord, Some(3));
        assert!(result.detail.is_none());
    }
}
