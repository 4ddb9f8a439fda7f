use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::lang::{Language, LanguageConfig};
use crate::runner::ExecResult;
use crate::sandbox::{Execution, SandboxBackend};

static WORKSPACE_SEQ: AtomicU64 = AtomicU64::new(0);

/// A compiled (or interpreted) program bound to the workspace holding it.
#[derive(Debug)]
pub struct PreparedProgram {
    pub workspace: String,
    pub config: &'static LanguageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareStage {
    Write,
    Compile,
}

/// A classified preparation failure, carrying the raw execution result for
/// diagnostics. Write failures mean the sandbox malfunctioned; compile
/// failures are triaged further by the orchestrator.
#[derive(Debug)]
pub struct PrepareError {
    pub stage: PrepareStage,
    pub result: ExecResult,
}

#[derive(Debug)]
pub enum PrepareOutcome {
    Ready(PreparedProgram),
    Failed(PrepareError),
}

pub struct PrepareRequest<'a> {
    pub submission_id: i64,
    /// Keeps workspaces of the same attempt distinguishable: sub/gen/sol.
    pub role: &'a str,
    pub language: Language,
    pub code: &'a str,
    pub memory_limit_mb: u64,
    pub compile_timeout_ms: u64,
}

/// Workspace names carry the role, the submission id, a millisecond
/// timestamp and a process-wide sequence number, so concurrent attempts
/// never collide even on the same submission.
pub fn workspace_name(submission_id: i64, role: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let seq = WORKSPACE_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("crucible-{}-{}-{}-{}", role, submission_id, millis, seq)
}

/// Create a fresh workspace, write the source file into it and run the
/// compile command if the language has one. A failed workspace is destroyed
/// before returning; only `Ready` workspaces become the caller's to release.
pub fn prepare_program<B: SandboxBackend>(
    backend: &B,
    request: &PrepareRequest<'_>,
) -> Result<PrepareOutcome> {
    let config = request.language.config();
    let workspace = workspace_name(request.submission_id, request.role);

    if let Err(err) = backend.create_workspace(&workspace) {
        return Err(match err {
            Error::Sandbox(msg) => Error::Sandbox(msg.replace(&workspace, "<sandbox>")),
            other => other,
        });
    }

    let mut write_result = backend.write_file(&workspace, config.source_file, request.code);
    if write_result.exit_code != 0 {
        backend.destroy_workspace(&workspace);
        write_result.scrub(&workspace);
        return Ok(PrepareOutcome::Failed(PrepareError {
            stage: PrepareStage::Write,
            result: write_result,
        }));
    }

    if let Some(compile) = config.compile {
        log::debug!("compiling {} program for submission {}", request.role, request.submission_id);
        let mut compile_result = backend.execute(
            &workspace,
            Execution {
                command: compile,
                stdin: None,
                time_limit_ms: request.compile_timeout_ms,
                memory_limit_mb: request.memory_limit_mb,
                measured: false,
            },
        );
        if compile_result.exit_code != 0 || compile_result.timed_out {
            backend.destroy_workspace(&workspace);
            compile_result.scrub(&workspace);
            return Ok(PrepareOutcome::Failed(PrepareError {
                stage: PrepareStage::Compile,
                result: compile_result,
            }));
        }
    }

    Ok(PrepareOutcome::Ready(PreparedProgram { workspace, config }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_names_are_unique() {
        let first = workspace_name(7, "sub");
        let second = workspace_name(7, "sub");
        assert_ne!(first, second);
        assert!(first.starts_with("crucible-sub-7-"));
    }
}
