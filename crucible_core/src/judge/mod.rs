mod code;
mod text;

use crate::problem::{Problem, SubmissionType};
use crate::sandbox::SandboxBackend;
use crate::testcase::Testcase;
use crate::{JudgeResult, Submission};

/// Engine-level knobs the worker passes through from its configuration.
#[derive(Debug, Clone)]
pub struct JudgeSettings {
    pub compile_timeout_ms: u64,
    /// Minimum wall-clock budget for the generator run, so generation is
    /// not starved on problems with tiny time limits.
    pub generator_floor_ms: u64,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            compile_timeout_ms: 10_000,
            generator_floor_ms: 2_000,
        }
    }
}

/// Judge one submission to a terminal verdict. Never panics outward and
/// never leaks a workspace: everything created during the attempt is
/// registered in a `WorkspaceSet` and destroyed when the attempt ends,
/// whichever exit path was taken.
pub fn judge<B: SandboxBackend>(
    backend: &B,
    submission: &Submission,
    problem: &Problem,
    testcases: &[Testcase],
    settings: &JudgeSettings,
) -> JudgeResult {
    if problem.submission_type == SubmissionType::Text {
        return text::judge_text(problem, &submission.code);
    }

    let mut workspaces = WorkspaceSet::new(backend);
    let outcome = code::judge_code(
        backend,
        &mut workspaces,
        submission,
        problem,
        testcases,
        settings,
    );

    match outcome {
        Ok(result) => {
            log::info!("submission {} judged: {:?}", submission.id, result.status);
            result
        }
        Err(err) => {
            log::error!("judging submission {} failed: {}", submission.id, err);
            JudgeResult::system_error(err.to_string())
        }
    }
}

/// Scoped ownership of every workspace one attempt creates. Dropping the
/// set releases each workspace exactly once, covering success, fail-fast
/// returns and unwinding alike.
struct WorkspaceSet<'a, B: SandboxBackend> {
    backend: &'a B,
    names: Vec<String>,
}

impl<'a, B: SandboxBackend> WorkspaceSet<'a, B> {
    fn new(backend: &'a B) -> Self {
        Self {
            backend,
            names: Vec::new(),
        }
    }

    fn register(&mut self, name: String) {
        self.names.push(name);
    }
}

impl<'a, B: SandboxBackend> Drop for WorkspaceSet<'a, B> {
    fn drop(&mut self) {
        for name in &self.names {
            self.backend.destroy_workspace(name);
        }
    }
}
