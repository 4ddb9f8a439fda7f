use std::time::Instant;

use super::{JudgeSettings, WorkspaceSet};
use crate::compare::{compare_output, CompareOutcome};
use crate::error::Result;
use crate::prepare::{prepare_program, PrepareError, PrepareOutcome, PrepareRequest, PrepareStage, PreparedProgram};
use crate::problem::{GeneratedPair, Problem};
use crate::runner::ExecResult;
use crate::sandbox::{Execution, SandboxBackend, OOM_EXIT_CODE, TIMEOUT_EXIT_CODE};
use crate::testcase::{parse_generated_inputs, Testcase, MAX_GENERATED_INPUTS};
use crate::{JudgeResult, Submission, SubmissionStatus};

const GENERATION_FAILED: &str = "Testcase generation failed";
const SOLUTION_FAILED: &str = "Reference solution failed";

/// Accumulates over testcases that actually ran: summed wall time, maximum
/// peak memory.
#[derive(Debug, Default)]
struct RunStats {
    runtime_ms: u64,
    memory_kb: Option<u64>,
}

impl RunStats {
    fn absorb(&mut self, elapsed_ms: u64, memory_kb: Option<u64>) {
        self.runtime_ms += elapsed_ms;
        if let Some(kb) = memory_kb {
            self.memory_kb = Some(self.memory_kb.map_or(kb, |cur| cur.max(kb)));
        }
    }
}

pub(super) fn judge_code<B: SandboxBackend>(
    backend: &B,
    workspaces: &mut WorkspaceSet<'_, B>,
    submission: &Submission,
    problem: &Problem,
    testcases: &[Testcase],
    settings: &JudgeSettings,
) -> Result<JudgeResult> {
    let time_limit_ms = problem.effective_time_limit_ms();
    let memory_limit_mb = problem.effective_memory_limit_mb();

    let program = match prepare_program(
        backend,
        &PrepareRequest {
            submission_id: submission.id,
            role: "sub",
            language: submission.language,
            code: &submission.code,
            memory_limit_mb,
            compile_timeout_ms: settings.compile_timeout_ms,
        },
    )? {
        PrepareOutcome::Ready(program) => program,
        PrepareOutcome::Failed(error) => return Ok(prepare_verdict(error)),
    };
    workspaces.register(program.workspace.clone());

    match problem.generated_pair() {
        Some(pair) => judge_generated(
            backend,
            workspaces,
            submission.id,
            &program,
            pair,
            time_limit_ms,
            memory_limit_mb,
            settings,
        ),
        None => judge_static(backend, &program, testcases, time_limit_ms, memory_limit_mb),
    }
}

/// Write failures are the sandbox's fault; compile failures are triaged into
/// the most specific verdict the raw result supports.
fn prepare_verdict(error: PrepareError) -> JudgeResult {
    let result = &error.result;
    match error.stage {
        PrepareStage::Write => JudgeResult::system_error(result.diagnostic()),
        PrepareStage::Compile => {
            if result.timed_out || result.exit_code == TIMEOUT_EXIT_CODE {
                JudgeResult::of(SubmissionStatus::TimeLimitExceeded).with_detail(result.diagnostic())
            } else if result.exit_code == OOM_EXIT_CODE {
                JudgeResult::of(SubmissionStatus::MemoryLimitExceeded).with_detail(result.diagnostic())
            } else {
                JudgeResult::of(SubmissionStatus::CompileError).with_detail(result.diagnostic())
            }
        }
    }
}

fn judge_static<B: SandboxBackend>(
    backend: &B,
    program: &PreparedProgram,
    testcases: &[Testcase],
    time_limit_ms: u64,
    memory_limit_mb: u64,
) -> Result<JudgeResult> {
    let mut stats = RunStats::default();

    for testcase in testcases {
        let run = timed_run(backend, program, &testcase.input, time_limit_ms, memory_limit_mb, &mut stats);
        if let Some(result) = evaluate_case(&run, &testcase.output, testcase.ord, &stats) {
            return Ok(result);
        }
    }

    Ok(JudgeResult::of(SubmissionStatus::Accepted).measured(stats.runtime_ms, stats.memory_kb))
}

fn judge_generated<B: SandboxBackend>(
    backend: &B,
    workspaces: &mut WorkspaceSet<'_, B>,
    submission_id: i64,
    program: &PreparedProgram,
    pair: GeneratedPair<'_>,
    time_limit_ms: u64,
    memory_limit_mb: u64,
    settings: &JudgeSettings,
) -> Result<JudgeResult> {
    let (generator_language, generator_code) = pair.generator;
    let generator = match prepare_program(
        backend,
        &PrepareRequest {
            submission_id,
            role: "gen",
            language: generator_language,
            code: generator_code,
            memory_limit_mb,
            compile_timeout_ms: settings.compile_timeout_ms,
        },
    )? {
        PrepareOutcome::Ready(program) => program,
        PrepareOutcome::Failed(error) => return Ok(generation_failed(error.result.diagnostic())),
    };
    workspaces.register(generator.workspace.clone());

    let mut generation = backend.execute(
        &generator.workspace,
        Execution {
            command: generator.config.run,
            stdin: Some(""),
            time_limit_ms: time_limit_ms.max(settings.generator_floor_ms),
            memory_limit_mb,
            measured: false,
        },
    );
    generation.scrub(&generator.workspace);

    if generation.timed_out || generation.exit_code == TIMEOUT_EXIT_CODE {
        return Ok(generation_failed("testcase generation timed out"));
    }
    if generation.exit_code == OOM_EXIT_CODE {
        return Ok(generation_failed("testcase generation ran out of memory"));
    }
    if generation.exit_code != 0 {
        return Ok(generation_failed(generation.diagnostic()));
    }

    let inputs = parse_generated_inputs(&generation.stdout);
    if inputs.is_empty() {
        return Ok(generation_failed("no test inputs produced"));
    }
    if inputs.len() > MAX_GENERATED_INPUTS {
        return Ok(generation_failed(format!(
            "generator produced {} inputs, at most {} are allowed",
            inputs.len(),
            MAX_GENERATED_INPUTS
        )));
    }
    log::debug!("generator for submission {} produced {} inputs", submission_id, inputs.len());

    let (solution_language, solution_code) = pair.solution;
    let solution = match prepare_program(
        backend,
        &PrepareRequest {
            submission_id,
            role: "sol",
            language: solution_language,
            code: solution_code,
            memory_limit_mb,
            compile_timeout_ms: settings.compile_timeout_ms,
        },
    )? {
        PrepareOutcome::Ready(program) => program,
        PrepareOutcome::Failed(error) => return Ok(solution_failed(error.result.diagnostic())),
    };
    workspaces.register(solution.workspace.clone());

    let mut stats = RunStats::default();

    // The expected output for each input is produced on demand, so only one
    // input/answer pair is in memory at a time.
    for (index, input) in inputs.iter().enumerate() {
        let ord = index as u32 + 1;

        let mut reference = backend.execute(
            &solution.workspace,
            Execution {
                command: solution.config.run,
                stdin: Some(input),
                time_limit_ms,
                memory_limit_mb,
                measured: false,
            },
        );
        reference.scrub(&solution.workspace);
        if reference.timed_out || reference.exit_code == TIMEOUT_EXIT_CODE {
            return Ok(solution_failed(format!(
                "reference solution timed out on generated input {}",
                ord
            )));
        }
        if reference.exit_code == OOM_EXIT_CODE {
            return Ok(solution_failed(format!(
                "reference solution ran out of memory on generated input {}",
                ord
            )));
        }
        if reference.exit_code != 0 {
            return Ok(solution_failed(format!(
                "reference solution failed on generated input {}: {}",
                ord,
                reference.diagnostic()
            )));
        }

        let run = timed_run(backend, program, input, time_limit_ms, memory_limit_mb, &mut stats);
        if let Some(result) = evaluate_case(&run, &reference.stdout, ord, &stats) {
            return Ok(result);
        }
    }

    Ok(JudgeResult::of(SubmissionStatus::Accepted).measured(stats.runtime_ms, stats.memory_kb))
}

fn timed_run<B: SandboxBackend>(
    backend: &B,
    program: &PreparedProgram,
    input: &str,
    time_limit_ms: u64,
    memory_limit_mb: u64,
    stats: &mut RunStats,
) -> ExecResult {
    let started = Instant::now();
    let mut run = backend.execute(
        &program.workspace,
        Execution {
            command: program.config.run,
            stdin: Some(input),
            time_limit_ms,
            memory_limit_mb,
            measured: true,
        },
    );
    stats.absorb(started.elapsed().as_millis() as u64, run.memory_kb);
    run.scrub(&program.workspace);
    run
}

fn classify_run(result: &ExecResult) -> Option<SubmissionStatus> {
    if result.timed_out || result.exit_code == TIMEOUT_EXIT_CODE {
        Some(SubmissionStatus::TimeLimitExceeded)
    } else if result.exit_code == OOM_EXIT_CODE {
        Some(SubmissionStatus::MemoryLimitExceeded)
    } else if result.exit_code != 0 {
        Some(SubmissionStatus::RuntimeError)
    } else {
        None
    }
}

/// One testcase's verdict, or `None` when it is accepted and the loop may
/// continue. Check order: timeout, memory ceiling, nonzero exit, comparison.
fn evaluate_case(
    run: &ExecResult,
    expected: &str,
    ord: u32,
    stats: &RunStats,
) -> Option<JudgeResult> {
    if let Some(status) = classify_run(run) {
        let mut result = JudgeResult::of(status)
            .measured(stats.runtime_ms, stats.memory_kb)
            .failed_at(ord);
        if status == SubmissionStatus::RuntimeError {
            result = result.with_detail(run.diagnostic());
        }
        return Some(result);
    }

    match compare_output(expected, &run.stdout) {
        CompareOutcome::Same => None,
        outcome => {
            let mut result = JudgeResult::of(SubmissionStatus::from(outcome))
                .measured(stats.runtime_ms, stats.memory_kb)
                .failed_at(ord);
            if outcome == CompareOutcome::PatternDifferent {
                result = result.with_detail("output differs from the expected answer only in whitespace");
            }
            Some(result)
        }
    }
}

fn generation_failed<T: Into<String>>(detail: T) -> JudgeResult {
    JudgeResult::system_error(detail).with_message(GENERATION_FAILED)
}

fn solution_failed<T: Into<String>>(detail: T) -> JudgeResult {
    JudgeResult::system_error(detail).with_message(SOLUTION_FAILED)
}
