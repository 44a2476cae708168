//! Encoding agent binary.

use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use optibot_clients::ApiClient;
use optibot_media::{check_ffmpeg, AccelVendor, FfmpegTranscoder};
use optibot_worker::{
    janitor, JobEngine, JobSlot, LibraryTransfer, ProgressReporter, RemoteTransfer,
    TransferBackend, TransferMode, WorkerConfig, WorkerError,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("optibot=info".parse().unwrap());

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

    info!("Starting optibot-worker");

    if let Err(exit_code) = run().await {
        std::process::exit(exit_code);
    }
}

async fn run() -> Result<(), i32> {
    let config = WorkerConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        1
    })?;
    info!("Running as agent {}", config.worker_name);

    let ffmpeg = check_ffmpeg().map_err(|e| {
        error!("ffmpeg is not usable: {}", e);
        1
    })?;
    info!("Using ffmpeg at {}", ffmpeg.display());

    let client = Arc::new(
        ApiClient::new(
            &config.api_base_url,
            &config.api_username,
            &config.api_password,
            config.http_timeout,
        )
        .map_err(|e| {
            error!("Unable to build API client: {}", e);
            1
        })?,
    );

    let transfer: Arc<dyn TransferBackend> = match config.transfer_mode {
        TransferMode::Remote => Arc::new(RemoteTransfer::new(client.clone())),
        TransferMode::Library => {
            // Presence is enforced by WorkerConfig::validate.
            let (movies, tv, import) = match (
                config.movie_library_dir.clone(),
                config.tv_library_dir.clone(),
                config.import_dir.clone(),
            ) {
                (Some(movies), Some(tv), Some(import)) => (movies, tv, import),
                _ => {
                    error!("{}", WorkerError::config("library directories missing"));
                    return Err(1);
                }
            };
            Arc::new(LibraryTransfer::new(movies, tv, import))
        }
    };

    let vendor: AccelVendor = config
        .acceleration_hardware
        .parse()
        .unwrap_or(AccelVendor::None);
    let transcoder = Arc::new(FfmpegTranscoder::new(vendor));
    info!("Video codec for this host: {}", transcoder.video_codec());

    if let Err(e) = tokio::fs::create_dir_all(&config.temp_dir).await {
        error!(
            "Unable to create temp directory {}: {}",
            config.temp_dir.display(),
            e
        );
        return Err(1);
    }
    let removed = janitor::clean_temp_dir(&config.temp_dir).await;
    if removed > 0 {
        warn!("Reclaimed {} leftover media files from a previous run", removed);
    }

    let slot = JobSlot::new();
    let engine = Arc::new(JobEngine::new(
        config.clone(),
        client.clone(),
        client.clone(),
        client.clone(),
        client.clone(),
        transfer,
        transcoder,
        slot.clone(),
    ));

    let reporter = ProgressReporter::new(client.clone(), slot, config.progress_interval);
    let reporter_handle = tokio::spawn(reporter.run());

    let mut exit_signal = engine.exit_signal();
    let mut interval = tokio::time::interval(config.fetch_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let exit_code = loop {
        tokio::select! {
            _ = interval.tick() => {
                let engine = engine.clone();
                tokio::spawn(async move { engine.tick().await });
            }
            changed = exit_signal.changed() => {
                if changed.is_err() {
                    break 0;
                }
                if let Some(code) = *exit_signal.borrow() {
                    error!("Exiting with code {}", code);
                    break code;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break 0;
            }
        }
    };

    reporter_handle.abort();
    info!("Worker shutdown complete");

    if exit_code == 0 {
        Ok(())
    } else {
        Err(exit_code)
    }
}
