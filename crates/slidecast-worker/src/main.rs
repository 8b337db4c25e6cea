//! SlideCast command-line runner.

use anyhow::Context;
use chrono::{DateTime, Local, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use slidecast_models::{LogLevel, RunEvent, VoiceSettings};
use slidecast_tts::{estimate_quota, load_credentials, ElevenLabsClient, TtsConfig};
use slidecast_worker::{
    init_tracing, load_rows, Pipeline, PipelineServices, ProgressChannel, ProgressReceiver,
    RunOutcome, RunRequest, WorkerConfig, WorkerError,
};

#[derive(Debug, Parser)]
#[command(name = "slidecast", version, about = "Render narrated slideshows")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render rows into one exported video
    Run(RunArgs),
    /// Estimate remaining narration minutes across credentials
    Quota {
        /// Credential file, one key per line
        #[arg(long)]
        keys: PathBuf,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// JSON array of rows with "image name" and "text to voice"
    #[arg(long)]
    rows: PathBuf,

    /// Folder searched for <image name>.jpg|.jpeg|.png
    #[arg(long)]
    images: PathBuf,

    /// Credential file, one key per line
    #[arg(long)]
    keys: PathBuf,

    /// Export folder; without it the rendered segments are kept in scratch
    #[arg(long)]
    export: Option<PathBuf>,

    #[arg(long, env = "ELEVENLABS_VOICE_ID")]
    voice_id: Option<String>,

    #[arg(long, default_value_t = 0.5)]
    stability: f32,

    #[arg(long, default_value_t = 0.5)]
    similarity: f32,

    #[arg(long, default_value_t = 1.0)]
    speed: f32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = WorkerConfig::from_env();

    if let Some(addr) = &config.metrics_addr {
        slidecast_worker::metrics::init_metrics(addr)?;
        info!(addr = %addr, "Metrics exporter listening");
    }

    match cli.command {
        Command::Run(args) => run(config, args).await,
        Command::Quota { keys } => quota(keys).await,
    }
}

async fn run(config: WorkerConfig, args: RunArgs) -> anyhow::Result<()> {
    let settings = VoiceSettings::new(args.stability, args.similarity, args.speed)?;
    let rows = load_rows(&args.rows)
        .await
        .with_context(|| format!("loading rows from {}", args.rows.display()))?;
    let credentials = load_credentials(&args.keys)
        .await
        .with_context(|| format!("loading credentials from {}", args.keys.display()))?;

    let mut tts_config = TtsConfig::from_env();
    if let Some(voice_id) = args.voice_id {
        tts_config = tts_config.with_voice_id(voice_id);
    }
    if tts_config.voice_id.is_none() {
        return Err(WorkerError::MissingVoiceId.into());
    }
    let client = ElevenLabsClient::new(&tts_config)?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, cancelling run");
            cancel_tx.send(true).ok();
        }
    });

    let (progress, events) = ProgressChannel::new();
    let printer = tokio::spawn(print_events(events));

    info!(rows = rows.len(), credentials = credentials.len(), "Starting run");
    let services = PipelineServices::ffmpeg(&config, Arc::new(client), cancel_rx.clone());
    let pipeline = Pipeline::new(config, services)
        .with_progress(progress)
        .with_cancel(cancel_rx);

    let result = pipeline
        .run(RunRequest {
            rows,
            image_dir: args.images,
            export_dir: args.export,
            credentials,
            settings,
        })
        .await;

    // Dropping the pipeline closes the channel so the printer drains and exits
    drop(pipeline);
    printer.await.ok();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Run aborted");
            return Err(e.into());
        }
    };

    let rows_total = report.tasks.len();
    let failed = report.failed_rows();
    match &report.outcome {
        RunOutcome::Exported(path) => {
            println!(
                "Exported {} ({}/{} rows)",
                path.display(),
                rows_total - failed,
                rows_total
            );
        }
        RunOutcome::NoVideo => {
            anyhow::bail!("no video produced: all {} rows failed or were dropped", rows_total);
        }
        RunOutcome::NoExportDir { workspace } => {
            println!(
                "No export folder given; rendered segments kept in {}",
                workspace.display()
            );
        }
        RunOutcome::ConcatFailed { reason, workspace } => {
            anyhow::bail!(
                "joining segments failed: {} (segments kept in {})",
                reason,
                workspace.display()
            );
        }
    }

    Ok(())
}

async fn quota(keys: PathBuf) -> anyhow::Result<()> {
    let credentials = load_credentials(&keys)
        .await
        .with_context(|| format!("loading credentials from {}", keys.display()))?;
    let client = ElevenLabsClient::new(&TtsConfig::from_env())?;

    let estimate = estimate_quota(&client, &credentials).await;
    for entry in &estimate.credentials {
        match entry.remaining {
            Some(remaining) => println!(
                "#{} {}: {} characters",
                entry.position + 1,
                entry.fingerprint,
                remaining
            ),
            None => println!("#{} {}: unavailable", entry.position + 1, entry.fingerprint),
        }
    }
    println!(
        "Total: {} characters, about {:.1} minutes",
        estimate.total_remaining(),
        estimate.estimated_minutes()
    );
    if estimate.failed_count() > 0 {
        println!("{} credential(s) could not be queried", estimate.failed_count());
    }

    Ok(())
}

fn clock(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

async fn print_events(mut events: ProgressReceiver) {
    while let Some(event) = events.recv().await {
        let percent = event
            .progress_fraction()
            .map(|f| format!("[{:>3.0}%] ", f * 100.0))
            .unwrap_or_default();

        match event {
            RunEvent::Log {
                level,
                message,
                timestamp,
            } => {
                let tag = match level {
                    LogLevel::Info => "",
                    LogLevel::Warn => "WARN ",
                    LogLevel::Error => "ERROR ",
                };
                println!("{} {}{}", clock(timestamp), tag, message);
            }
            RunEvent::RowCompleted {
                row_index, success, ..
            } => {
                let status = if success { "done" } else { "failed" };
                println!("{} {}row {} {}", clock(Utc::now()), percent, row_index + 1, status);
            }
            RunEvent::Concatenated {
                segments, success, ..
            } => {
                let status = if success { "joined" } else { "failed to join" };
                println!("{} {}{} {} segments", clock(Utc::now()), percent, status, segments);
            }
            RunEvent::Done { output } => {
                println!("{} done: {}", clock(Utc::now()), output.display());
            }
            RunEvent::Error { message, timestamp } => {
                eprintln!("{} ERROR {}", clock(timestamp), message);
            }
        }
    }
}
