mod api;
mod config;
mod error;
mod job;

use std::sync::Arc;

use clap::Parser;
use futures_util::stream::StreamExt;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicQosOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Connection, ConnectionProperties};
use log::{error, info, warn};
use serde::Deserialize;
use tokio_amqp::*;

use crucible_core::judge::JudgeSettings;
use crucible_core::sandbox::DockerSandbox;

use crate::api::ApiClient;
use crate::config::WorkerConfig;
use crate::error::Result;
use crate::job::JudgeContext;

#[derive(Parser)]
#[clap(
    name = "crucible_worker",
    about = "Pulls submission jobs off the queue and judges them in the docker sandbox."
)]
struct Opts {
    /// Path to the worker config file (YAML). Defaults apply when omitted.
    #[clap(short, long)]
    config: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobPayload {
    #[serde(rename = "submissionId")]
    submission_id: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let opts = Opts::parse();
    let config = match &opts.config {
        Some(path) => WorkerConfig::from_file(path)?,
        None => WorkerConfig::default(),
    };

    let backend = DockerSandbox::new(&config.judge_image)?;
    let context = Arc::new(JudgeContext {
        api: ApiClient::new(&config.api_base),
        backend,
        settings: JudgeSettings {
            compile_timeout_ms: config.compile_timeout_ms,
            generator_floor_ms: config.generator_floor_ms,
        },
    });

    let addr = config.amqp_addr();
    let conn = Connection::connect(&addr, ConnectionProperties::default().with_tokio()).await?;
    let channel = conn.create_channel().await?;

    channel
        .queue_declare(
            &config.queue_name,
            QueueDeclareOptions::default(),
            FieldTable::default(),
        )
        .await?;

    // prefetch bounds how many unacked jobs this worker holds, which is the
    // concurrency bound: each job is acked only after its verdict is stored
    let concurrency = config.effective_concurrency();
    channel
        .basic_qos(concurrency, BasicQosOptions::default())
        .await?;

    info!(
        "consuming `{}` from {} with concurrency {}",
        config.queue_name, addr, concurrency
    );

    let mut consumer = channel
        .basic_consume(
            &config.queue_name,
            "crucible_worker",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await?;

    while let Some(delivery) = consumer.next().await {
        let (_, delivery) = match delivery {
            Ok(delivery) => delivery,
            Err(err) => {
                error!("consumer error: {}", err);
                continue;
            }
        };

        let context = context.clone();
        tokio::spawn(async move {
            match serde_json::from_slice::<JobPayload>(&delivery.data) {
                Ok(payload) => job::process_job(&context, payload.submission_id).await,
                Err(err) => warn!("dropping malformed job payload: {}", err),
            }
            if let Err(err) = delivery.ack(BasicAckOptions::default()).await {
                error!("failed to ack delivery: {}", err);
            }
        });
    }

    Ok(())
}
