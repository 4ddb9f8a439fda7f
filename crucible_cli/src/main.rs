use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use crucible_core::error::{Error, Result};
use crucible_core::judge::{judge, JudgeSettings};
use crucible_core::lang::Language;
use crucible_core::problem::{Problem, SubmissionType};
use crucible_core::sandbox::{BackendStatus, DockerSandbox};
use crucible_core::testcase::Testcase;
use crucible_core::Submission;

#[derive(Parser)]
#[clap(
    name = "crucible",
    about = "Judge a local submission inside the docker sandbox."
)]
struct Opts {
    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Subcommand)]
enum SubCommand {
    /// Judge a source file against a problem description
    Judge(JudgeConfig),
    /// Check that the docker backend is usable
    Check,
}

#[derive(Args, Debug)]
struct JudgeConfig {
    /// Problem description (YAML)
    problem: String,
    /// Path of the source file to judge
    src_path: String,
    /// Submission language: c99, cpp17, java11, python3, cs
    #[clap(short, long)]
    language: String,
    /// Sandbox image to run inside
    #[clap(short, long, default_value = "crucible-runner:latest")]
    image: String,
}

/// Local problem file: limits plus file-backed testcases, resolved relative
/// to the YAML's own directory.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalProblem {
    time_limit_ms: u64,
    memory_limit_mb: u64,
    #[serde(default)]
    cases: Vec<LocalCase>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalCase {
    input_file: String,
    answer_file: String,
}

impl LocalProblem {
    fn from_file(path: &str) -> Result<(Self, PathBuf)> {
        let content = fs::read_to_string(path)?;
        let problem: LocalProblem = serde_yaml::from_str(&content)
            .map_err(|err| Error::Argument(format!("invalid problem file: {}", err)))?;

        let base = Path::new(path)
            .canonicalize()?
            .parent()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| Error::Argument("problem file has no parent directory".into()))?;
        Ok((problem, base))
    }

    fn load_testcases(&self, base: &Path) -> Result<Vec<Testcase>> {
        let mut testcases = Vec::new();
        for (index, case) in self.cases.iter().enumerate() {
            let input = fs::read_to_string(base.join(&case.input_file))?;
            let output = fs::read_to_string(base.join(&case.answer_file))?;
            testcases.push(Testcase {
                ord: index as u32 + 1,
                input,
                output,
            });
        }
        Ok(testcases)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    match opts.subcmd {
        SubCommand::Judge(config) => {
            let language: Language = config.language.parse()?;
            let (local, base) = LocalProblem::from_file(&config.problem)?;
            let testcases = local.load_testcases(&base)?;

            let problem = Problem {
                time_limit_ms: local.time_limit_ms,
                memory_limit_mb: local.memory_limit_mb,
                submission_type: SubmissionType::Code,
                text_answer: None,
                generator_language: None,
                generator_code: None,
                solution_language: None,
                solution_code: None,
            };
            let submission = Submission {
                id: 0,
                language,
                code: fs::read_to_string(&config.src_path)?,
            };

            let backend = DockerSandbox::new(&config.image)?;
            let result = judge(
                &backend,
                &submission,
                &problem,
                &testcases,
                &JudgeSettings::default(),
            );
            println!("{:#?}", result);
        }
        SubCommand::Check => match DockerSandbox::check_environment() {
            BackendStatus::OK { version, path } => {
                println!("docker found at {}: {}", path, version);
            }
            BackendStatus::Missing => {
                println!("docker not found in PATH");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
