//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{WorkerError, WorkerResult};

/// How source media is staged and finished output is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// Stream downloads/uploads through the backend API.
    #[default]
    Remote,
    /// Copy from a locally mounted media library and into an import tree.
    Library,
}

/// Worker configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Identity this agent claims work under.
    pub worker_name: String,
    /// Backend API base URL.
    pub api_base_url: String,
    pub api_username: String,
    pub api_password: String,
    /// Constant rate factor passed to the encoder.
    pub crf: u8,
    /// Acceleration hardware vendor hint (free text, parsed leniently).
    pub acceleration_hardware: String,
    /// Directory for staged inputs and encode outputs.
    pub temp_dir: PathBuf,
    pub transfer_mode: TransferMode,
    /// Library-mode roots; required only in that mode.
    pub movie_library_dir: Option<PathBuf>,
    pub tv_library_dir: Option<PathBuf>,
    pub import_dir: Option<PathBuf>,
    /// Lifecycle tick cadence.
    pub fetch_interval: Duration,
    /// Progress reporter cadence.
    pub progress_interval: Duration,
    /// Bound for non-streaming backend requests.
    pub http_timeout: Duration,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_required(key: &str) -> WorkerResult<String> {
    std::env::var(key).map_err(|_| WorkerError::config(format!("{} is not set", key)))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let transfer_mode = match env_or("TRANSFER_MODE", "remote").to_ascii_lowercase().as_str() {
            "remote" => TransferMode::Remote,
            "library" => TransferMode::Library,
            other => {
                return Err(WorkerError::config(format!(
                    "unknown TRANSFER_MODE: {}",
                    other
                )))
            }
        };

        let config = Self {
            worker_name: env_or(
                "WORKER_NAME",
                &format!("encoder-{}", Uuid::new_v4().simple()),
            ),
            api_base_url: env_required("API_BASE_URL")?,
            api_username: env_required("API_USERNAME")?,
            api_password: env_required("API_PASSWORD")?,
            crf: env_parse("ENCODE_CRF", 24u8),
            acceleration_hardware: env_or("ACCELERATION_HARDWARE", "none"),
            temp_dir: PathBuf::from(env_required("TEMP_DIR")?),
            transfer_mode,
            movie_library_dir: std::env::var("MOVIE_LIBRARY_DIR").ok().map(PathBuf::from),
            tv_library_dir: std::env::var("TV_LIBRARY_DIR").ok().map(PathBuf::from),
            import_dir: std::env::var("IMPORT_DIR").ok().map(PathBuf::from),
            fetch_interval: Duration::from_secs(env_parse("FETCH_INTERVAL_SECS", 60u64)),
            progress_interval: Duration::from_secs(env_parse("PROGRESS_INTERVAL_SECS", 3u64)),
            http_timeout: Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 30u64)),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> WorkerResult<()> {
        if self.transfer_mode == TransferMode::Library {
            if self.movie_library_dir.is_none() || self.tv_library_dir.is_none() {
                return Err(WorkerError::config(
                    "library transfer mode requires MOVIE_LIBRARY_DIR and TV_LIBRARY_DIR",
                ));
            }
            if self.import_dir.is_none() {
                return Err(WorkerError::config(
                    "library transfer mode requires IMPORT_DIR",
                ));
            }
        }
        Ok(())
    }

    /// Temp path the source media is staged to.
    pub fn staged_path(&self, media_id: i64, extension: &str) -> PathBuf {
        self.temp_dir.join(format!("{}-old.{}", media_id, extension))
    }

    /// Temp path the encoded output is written to.
    pub fn output_path(&self, media_id: i64) -> PathBuf {
        self.temp_dir.join(format!("{}.mkv", media_id))
    }
}
