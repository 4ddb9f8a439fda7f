use std::fs;

use serde::Deserialize;

use crate::error::Result;

/// Worker settings, read from a YAML file. Every field has a default so a
/// partial (or absent) file still yields a runnable worker; `AMQP_ADDR` in
/// the environment overrides the configured queue address.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerConfig {
    #[serde(default = "default_amqp_addr")]
    pub amqp_addr: String,
    #[serde(default = "default_queue_name")]
    pub queue_name: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: u16,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_judge_image")]
    pub judge_image: String,
    #[serde(default = "default_compile_timeout_ms")]
    pub compile_timeout_ms: u64,
    #[serde(default = "default_generator_floor_ms")]
    pub generator_floor_ms: u64,
}

fn default_amqp_addr() -> String {
    "amqp://127.0.0.1:5672/%2f".to_string()
}

fn default_queue_name() -> String {
    "judge_tasks".to_string()
}

fn default_concurrency() -> u16 {
    4
}

fn default_api_base() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_judge_image() -> String {
    "crucible-runner:latest".to_string()
}

fn default_compile_timeout_ms() -> u64 {
    10_000
}

fn default_generator_floor_ms() -> u64 {
    2_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            amqp_addr: default_amqp_addr(),
            queue_name: default_queue_name(),
            concurrency: default_concurrency(),
            api_base: default_api_base(),
            judge_image: default_judge_image(),
            compile_timeout_ms: default_compile_timeout_ms(),
            generator_floor_ms: default_generator_floor_ms(),
        }
    }
}

impl WorkerConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn amqp_addr(&self) -> String {
        std::env::var("AMQP_ADDR").unwrap_or_else(|_| self.amqp_addr.clone())
    }

    pub fn effective_concurrency(&self) -> u16 {
        self.concurrency.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = r#"
            queueName: "submissions"
            concurrency: 8
        "#;
        let config: WorkerConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.queue_name, "submissions");
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.judge_image, "crucible-runner:latest");
        assert_eq!(config.compile_timeout_ms, 10_000);
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let config: WorkerConfig = serde_yaml::from_str("concurrency: 0").unwrap();
        assert_eq!(config.effective_concurrency(), 1);
    }
}
