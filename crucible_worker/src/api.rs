use reqwest::StatusCode;
use serde::Deserialize;

use crucible_core::lang::Language;
use crucible_core::problem::Problem;
use crucible_core::testcase::Testcase;
use crucible_core::{JudgeResult, SubmissionStatus};

use crate::error::Result;

/// One submission as the persistence collaborator hands it out: the program,
/// its problem, and the static testcases where the problem has any.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: i64,
    pub language: Language,
    pub code: String,
    pub problem: Problem,
    #[serde(default)]
    pub testcases: Vec<Testcase>,
}

/// Read/write collaborator for submission state. Results are keyed by
/// submission id and overwritten on re-delivery, which is what makes
/// duplicate jobs harmless.
pub struct ApiClient {
    base: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn submission_url(&self, id: i64) -> String {
        format!("{}/internal/submissions/{}", self.base, id)
    }

    pub async fn fetch_submission(&self, id: i64) -> Result<Option<SubmissionRecord>> {
        let response = self.http.get(&self.submission_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record = response.error_for_status()?.json().await?;
        Ok(Some(record))
    }

    pub async fn mark_running(&self, id: i64) -> Result<()> {
        let body = serde_json::json!({
            "status": SubmissionStatus::Running,
            "message": SubmissionStatus::Running.default_message(),
        });
        self.http
            .patch(&self.submission_url(id))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn store_result(&self, id: i64, result: &JudgeResult) -> Result<()> {
        self.http
            .patch(&self.submission_url(id))
            .json(result)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_wire_shape() {
        let json = r#"{
            "id": 42,
            "language": "PYTHON3",
            "code": "print(3)",
            "problem": {
                "timeLimitMs": 1000,
                "memoryLimitMb": 256,
                "submissionType": "CODE"
            },
            "testcases": [
                { "ord": 1, "input": "1 2\n", "output": "3\n" }
            ]
        }"#;
        let record: SubmissionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.language, Language::Python3);
        assert_eq!(record.testcases.len(), 1);
    }

    #[test]
    fn testcases_default_to_empty() {
        let json = r#"{
            "id": 7,
            "language": "CPP17",
            "code": "",
            "problem": {
                "timeLimitMs": 1000,
                "memoryLimitMb": 256,
                "submissionType": "TEXT",
                "textAnswer": "42"
            }
        }"#;
        let record: SubmissionRecord = serde_json::from_str(json).unwrap();
        assert!(record.testcases.is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://api.local/");
        assert_eq!(client.submission_url(3), "http://api.local/internal/submissions/3");
    }
}
