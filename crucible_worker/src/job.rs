use log::{error, info, warn};

use crucible_core::judge::{judge, JudgeSettings};
use crucible_core::sandbox::DockerSandbox;
use crucible_core::{JudgeResult, Submission};

use crate::api::ApiClient;
use crate::error::{Result, WorkerError};

/// Everything a job needs besides its submission id. Shared read-only
/// across concurrent jobs.
pub struct JudgeContext {
    pub api: ApiClient,
    pub backend: DockerSandbox,
    pub settings: JudgeSettings,
}

/// Run one job to completion. This is the boundary that must never let a
/// bad job take the worker down: any error escaping the pipeline is turned
/// into a best-effort SYSTEM_ERROR write-back.
pub async fn process_job(context: &JudgeContext, submission_id: i64) {
    if let Err(err) = run_job(context, submission_id).await {
        error!("job for submission {} failed: {}", submission_id, err);
        let fallback = JudgeResult::system_error(err.to_string());
        if let Err(store_err) = context.api.store_result(submission_id, &fallback).await {
            error!(
                "failed to store fallback result for submission {}: {}",
                submission_id, store_err
            );
        }
    }
}

async fn run_job(context: &JudgeContext, submission_id: i64) -> Result<()> {
    let record = match context.api.fetch_submission(submission_id).await? {
        Some(record) => record,
        None => {
            warn!("submission {} no longer exists, dropping job", submission_id);
            return Ok(());
        }
    };

    context.api.mark_running(submission_id).await?;

    let backend = context.backend.clone();
    let settings = context.settings.clone();
    let result = tokio::task::spawn_blocking(move || {
        let submission = Submission {
            id: record.id,
            language: record.language,
            code: record.code,
        };
        judge(&backend, &submission, &record.problem, &record.testcases, &settings)
    })
    .await
    .map_err(|err| WorkerError::Task(err.to_string()))?;

    info!(
        "submission {} -> {:?} ({} ms)",
        submission_id,
        result.status,
        result.runtime_ms.unwrap_or(0)
    );
    context.api.store_result(submission_id, &result).await?;
    Ok(())
}
