use std::process::{Command, Stdio};
use std::time::Duration;

use regex::Regex;

use crate::error::{Error, Result};
use crate::runner::{run_process, ExecResult};

/// Exit code of a process killed by the container memory ceiling.
pub const OOM_EXIT_CODE: i32 = 137;
/// Exit code of a process stopped by the in-container `timeout` wrapper.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

const WRITE_TIMEOUT: Duration = Duration::from_secs(5);
const CONTROL_TIMEOUT: Duration = Duration::from_secs(10);
const WALL_GRACE_MS: u64 = 1000;

/// One resource-constrained run inside a workspace.
pub struct Execution<'a> {
    pub command: &'a str,
    pub stdin: Option<&'a str>,
    pub time_limit_ms: u64,
    pub memory_limit_mb: u64,
    /// Wrap in `/usr/bin/time -v` and report peak memory. The measurement
    /// lines are stripped back out of stderr before it reaches the caller.
    pub measured: bool,
}

/// Seam to the external isolation backend. Workspaces are disposable,
/// per-attempt execution contexts addressed by name; `destroy_workspace`
/// must be idempotent and safe on half-created workspaces.
pub trait SandboxBackend {
    fn create_workspace(&self, name: &str) -> Result<()>;
    fn write_file(&self, workspace: &str, filename: &str, content: &str) -> ExecResult;
    fn execute(&self, workspace: &str, exec: Execution<'_>) -> ExecResult;
    fn destroy_workspace(&self, name: &str);
}

#[derive(Debug)]
pub enum BackendStatus {
    OK { version: String, path: String },
    Missing,
}

/// Docker-backed sandbox. A workspace is a named volume mounted at
/// `/workspace`; programs run in a network-less, capability-dropped,
/// read-only-root container with hard memory and pid ceilings.
#[derive(Debug, Clone)]
pub struct DockerSandbox {
    docker_path: String,
    image: String,
}

impl DockerSandbox {
    pub fn new(image: &str) -> Result<Self> {
        match Self::check_environment() {
            BackendStatus::OK { version: _, path } => Ok(Self {
                docker_path: path,
                image: image.to_string(),
            }),
            BackendStatus::Missing => Err(Error::Environment("missing docker".into())),
        }
    }

    pub fn check_environment() -> BackendStatus {
        let path = which::which("docker");
        match path {
            Ok(path) => {
                let output = Command::new(&path)
                    .arg("--version")
                    .stdout(Stdio::piped())
                    .output();
                let version = match output {
                    Ok(output) => String::from_utf8_lossy(&output.stdout)
                        .lines()
                        .next()
                        .unwrap_or("")
                        .to_string(),
                    Err(_) => return BackendStatus::Missing,
                };

                BackendStatus::OK {
                    version,
                    path: path.to_string_lossy().to_string(),
                }
            }
            Err(_) => BackendStatus::Missing,
        }
    }
}

impl SandboxBackend for DockerSandbox {
    fn create_workspace(&self, name: &str) -> Result<()> {
        let args = vec!["volume".to_string(), "create".to_string(), name.to_string()];
        let result = run_process(&self.docker_path, &args, None, CONTROL_TIMEOUT);
        if result.exit_code != 0 {
            return Err(Error::Sandbox(result.diagnostic().to_string()));
        }
        Ok(())
    }

    fn write_file(&self, workspace: &str, filename: &str, content: &str) -> ExecResult {
        let args = write_args(&self.image, workspace, filename);
        run_process(&self.docker_path, &args, Some(content), WRITE_TIMEOUT)
    }

    fn execute(&self, workspace: &str, exec: Execution<'_>) -> ExecResult {
        let wrapped = if exec.measured {
            wrap_measured(exec.command, exec.time_limit_ms)
        } else {
            wrap_timeout(exec.command, exec.time_limit_ms)
        };
        let args = run_args(&self.image, workspace, &wrapped, exec.memory_limit_mb);
        let wall = Duration::from_millis(exec.time_limit_ms + WALL_GRACE_MS);

        let mut result = run_process(&self.docker_path, &args, exec.stdin, wall);
        if exec.measured {
            let (memory_kb, cleaned) = extract_time_stats(&result.stderr);
            result.memory_kb = memory_kb;
            result.stderr = cleaned;
        }
        result
    }

    fn destroy_workspace(&self, name: &str) {
        let args = vec![
            "volume".to_string(),
            "rm".to_string(),
            "-f".to_string(),
            name.to_string(),
        ];
        let result = run_process(&self.docker_path, &args, None, CONTROL_TIMEOUT);
        if result.exit_code != 0 {
            log::warn!("failed to remove workspace volume: {}", result.diagnostic());
        }
    }
}

fn run_args(image: &str, workspace: &str, command: &str, memory_limit_mb: u64) -> Vec<String> {
    let memory = format!("{}m", memory_limit_mb);
    let volume = format!("{}:/workspace:rw", workspace);
    let args: Vec<&str> = vec![
        "run",
        "--rm",
        "-i",
        "--network",
        "none",
        "--cap-drop",
        "ALL",
        "--security-opt",
        "no-new-privileges",
        "--pids-limit",
        "64",
        "--read-only",
        "--tmpfs",
        "/tmp:rw,noexec,nosuid,size=64m",
        "--cpus",
        "1",
        "--memory",
        memory.as_str(),
        // same ceiling for memory+swap: exceeding it means an OOM kill,
        // never silent swapping
        "--memory-swap",
        memory.as_str(),
        "-v",
        volume.as_str(),
        "-w",
        "/workspace",
        image,
        "sh",
        "-c",
        command,
    ];
    args.into_iter().map(String::from).collect()
}

fn write_args(image: &str, workspace: &str, filename: &str) -> Vec<String> {
    let volume = format!("{}:/workspace:rw", workspace);
    let write_command = format!("cat > /workspace/{}", filename);
    let args: Vec<&str> = vec![
        "run",
        "--rm",
        "-i",
        "--network",
        "none",
        "--cap-drop",
        "ALL",
        "--security-opt",
        "no-new-privileges",
        "-v",
        volume.as_str(),
        "-w",
        "/workspace",
        image,
        "sh",
        "-c",
        write_command.as_str(),
    ];
    args.into_iter().map(String::from).collect()
}

/// `timeout` reports 124 on expiry (TERM); the KILL backstop fires a second
/// later for programs that ignore TERM.
fn wrap_timeout(command: &str, timeout_ms: u64) -> String {
    format!("timeout -k 1 {}s {}", format_seconds(timeout_ms), command)
}

fn wrap_measured(command: &str, timeout_ms: u64) -> String {
    wrap_timeout(&format!("/usr/bin/time -v {}", command), timeout_ms)
}

fn format_seconds(timeout_ms: u64) -> String {
    let seconds = (timeout_ms as f64 / 1000.0).max(0.001);
    let mut text = format!("{:.3}", seconds);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}

const TIME_REPORT_PREFIXES: &[&str] = &[
    "Command being timed:",
    "User time (seconds):",
    "System time (seconds):",
    "Percent of CPU this job got:",
    "Elapsed (wall clock) time",
    "Average shared text size (kbytes):",
    "Average unshared data size (kbytes):",
    "Average stack size (kbytes):",
    "Average total size (kbytes):",
    "Maximum resident set size (kbytes):",
    "Average resident set size (kbytes):",
    "Major (requiring I/O) page faults:",
    "Minor (reclaiming a frame) page faults:",
    "Voluntary context switches:",
    "Involuntary context switches:",
    "Swaps:",
    "File system inputs:",
    "File system outputs:",
    "Socket messages sent:",
    "Socket messages received:",
    "Signals delivered:",
    "Page size (bytes):",
    "Exit status:",
    "Command exited with non-zero status",
];

/// Pull the peak RSS out of a `/usr/bin/time -v` report and drop every report
/// line, so diagnostics shown to users carry no measurement noise.
fn extract_time_stats(stderr: &str) -> (Option<u64>, String) {
    let rss_line = Regex::new(r"Maximum resident set size \(kbytes\):\s*(\d+)").unwrap();

    let mut memory_kb = None;
    let mut kept = Vec::new();
    for line in stderr.split('\n') {
        let trimmed = line.trim();
        if let Some(caps) = rss_line.captures(trimmed) {
            memory_kb = caps[1].parse().ok();
            continue;
        }
        if TIME_REPORT_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            continue;
        }
        kept.push(line);
    }
    (memory_kb, kept.join("\n").trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_formatting() {
        assert_eq!(format_seconds(1000), "1");
        assert_eq!(format_seconds(1500), "1.5");
        assert_eq!(format_seconds(2048), "2.048");
        assert_eq!(format_seconds(0), "0.001");
    }

    #[test]
    fn timeout_wrapping() {
        assert_eq!(wrap_timeout("./Main", 2000), "timeout -k 1 2s ./Main");
        assert_eq!(
            wrap_measured("./Main", 2000),
            "timeout -k 1 2s /usr/bin/time -v ./Main"
        );
    }

    #[test]
    fn run_args_carry_constraints() {
        let args = run_args("runner:latest", "ws-1", "./Main", 256);
        assert!(args.contains(&"--network".to_string()));
        assert!(args.contains(&"none".to_string()));
        assert!(args.contains(&"256m".to_string()));
        assert!(args.contains(&"ws-1:/workspace:rw".to_string()));
        assert_eq!(args.last().unwrap(), "./Main");
        // memory and memory-swap share the ceiling
        assert_eq!(args.iter().filter(|a| *a == "256m").count(), 2);
    }

    #[test]
    fn time_stats_are_stripped() {
        let stderr = concat!(
            "segfault at 0x0\n",
            "\tCommand being timed: \"./Main\"\n",
            "\tUser time (seconds): 0.01\n",
            "\tMaximum resident set size (kbytes): 2048\n",
            "\tExit status: 1\n",
        );
        let (memory_kb, cleaned) = extract_time_stats(stderr);
        assert_eq!(memory_kb, Some(2048));
        assert_eq!(cleaned, "segfault at 0x0");
    }

    #[test]
    fn missing_rss_line() {
        let (memory_kb, cleaned) = extract_time_stats("plain stderr\n");
        assert_eq!(memory_kb, None);
        assert_eq!(cleaned, "plain stderr");
    }
}
