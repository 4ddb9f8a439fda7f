use std::io::{Read, Write};
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured outcome of one external process run. Never an `Err`: a command
/// that cannot even be spawned comes back as a synthetic non-zero exit with
/// the OS error folded into stderr.
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub memory_kb: Option<u64>,
}

impl ExecResult {
    fn spawn_failure(program: &str, err: std::io::Error) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: format!("failed to spawn `{}`: {}", program, err),
            timed_out: false,
            memory_kb: None,
        }
    }

    /// Remove an internal workspace name from the captured streams, so it
    /// never reaches user-facing diagnostics.
    pub fn scrub(&mut self, workspace: &str) {
        self.stdout = self.stdout.replace(workspace, "<sandbox>");
        self.stderr = self.stderr.replace(workspace, "<sandbox>");
    }

    /// The most useful text to show a user for a failed run.
    pub fn diagnostic(&self) -> &str {
        if !self.stderr.is_empty() {
            &self.stderr
        } else if !self.stdout.is_empty() {
            &self.stdout
        } else {
            "Unknown error"
        }
    }
}

/// Run `program` with piped stdio, stream the whole stdin payload, and
/// collect stdout/stderr until exit. The process is force-killed once
/// `wall_timeout` elapses; no child survives this function.
pub fn run_process(
    program: &str,
    args: &[String],
    stdin: Option<&str>,
    wall_timeout: Duration,
) -> ExecResult {
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => return ExecResult::spawn_failure(program, err),
    };

    // The child may exit without draining stdin; a broken pipe here is the
    // child's business, not ours.
    let stdin_pipe = child.stdin.take();
    let payload = stdin.map(|s| s.to_string());
    let stdin_thread = std::thread::spawn(move || {
        if let (Some(mut pipe), Some(data)) = (stdin_pipe, payload) {
            let _ = pipe.write_all(data.as_bytes());
        }
    });

    let stdout_pipe = child.stdout.take();
    let stdout_thread = std::thread::spawn(move || drain(stdout_pipe));
    let stderr_pipe = child.stderr.take();
    let stderr_thread = std::thread::spawn(move || drain(stderr_pipe));

    let deadline = Instant::now() + wall_timeout;
    let mut timed_out = false;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {}
            Err(_) => break None,
        }
        if Instant::now() >= deadline {
            timed_out = true;
            let _ = child.kill();
            break child.wait().ok();
        }
        std::thread::sleep(WAIT_POLL_INTERVAL);
    };

    let _ = stdin_thread.join();
    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    let exit_code = match status {
        Some(status) => match status.code() {
            Some(code) => code,
            None => 128 + status.signal().unwrap_or(0),
        },
        None => -1,
    };

    ExecResult {
        exit_code,
        stdout,
        stderr,
        timed_out,
        memory_kb: None,
    }
}

fn drain<R: Read>(pipe: Option<R>) -> String {
    let mut buffer = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut buffer);
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn captures_stdout_and_exit_code() {
        let result = run_process("sh", &sh("echo hello; exit 3"), None, Duration::from_secs(5));
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.exit_code, 3);
        assert!(!result.timed_out);
    }

    #[test]
    fn streams_stdin() {
        let result = run_process("sh", &sh("cat"), Some("1 2\n"), Duration::from_secs(5));
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "1 2\n");
    }

    #[test]
    fn kills_on_timeout() {
        let started = Instant::now();
        let result = run_process("sh", &sh("sleep 30"), None, Duration::from_millis(200));
        assert!(result.timed_out);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn spawn_failure_is_a_value() {
        let result = run_process("crucible-no-such-binary", &[], None, Duration::from_secs(1));
        assert_eq!(result.exit_code, -1);
        assert!(result.stderr.contains("failed to spawn"));
        assert_eq!(result.diagnostic(), result.stderr);
    }

    #[test]
    fn diagnostic_falls_back_to_stdout() {
        let result = run_process("sh", &sh("echo only-stdout; exit 1"), None, Duration::from_secs(5));
        assert_eq!(result.diagnostic(), "only-stdout\n");
    }
}
