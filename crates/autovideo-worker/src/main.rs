//! Narrated video worker binary.

use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use autovideo_models::StepOutcome;
use autovideo_worker::{
    EventEmitter, JobManifest, PipelineOrchestrator, PipelineServices, WorkerConfig,
};

const USAGE: &str = "usage: autovideo-worker <manifest.json> | --schema";

#[tokio::main]
async fn main() {
    let arg = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    if arg == "--schema" {
        match serde_json::to_string_pretty(&JobManifest::schema()) {
            Ok(schema) => println!("{schema}"),
            Err(e) => {
                eprintln!("Failed to serialize schema: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting autovideo-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    match run(&config, Path::new(&arg)).await {
        Ok(output) => println!("{}", output.display()),
        Err(e) => {
            error!("Job failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,autovideo_worker=info,autovideo_media=info,autovideo_ai=info")
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run(config: &WorkerConfig, manifest_path: &Path) -> anyhow::Result<PathBuf> {
    let manifest = JobManifest::load(manifest_path).await?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let request = manifest.to_request(base_dir).await?;
    let job_id = manifest.job_id();

    let credentials = request.credentials.clone().or(config.credentials.clone());
    let services = PipelineServices::from_credentials(config, &credentials)?;
    let orchestrator = PipelineOrchestrator::new(config.clone(), services);

    let (events, mut rx) = EventEmitter::channel(job_id.clone(), config.event_buffer);
    let drain = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event.outcome {
                StepOutcome::Failed | StepOutcome::FellBack => warn!(event = %event, "Pipeline event"),
                _ => info!(event = %event, "Pipeline event"),
            }
        }
    });

    let result = orchestrator.run(&job_id, &request, &events).await;
    // Closes the channel so the drain task finishes
    drop(events);
    drain.await.ok();

    Ok(result?)
}
