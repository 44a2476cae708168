//! Staging and delivery backends.
//!
//! One capability, two implementations chosen at startup: streaming through
//! the backend API, or copying against a locally mounted media library.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

use optibot_clients::MetadataService;
use optibot_media::format_percentage;
use optibot_models::{MediaItem, MediaKind};

use crate::error::{WorkerError, WorkerResult};
use crate::slot::JobSlot;

/// Copy buffer for library-mode staging.
const COPY_CHUNK_SIZE: usize = 1024 * 1024;

/// Moves source media into the temp area and finished output to its
/// destination.
#[async_trait]
pub trait TransferBackend: Send + Sync {
    /// Stage the source media at `dest`, updating the slot's progress with
    /// the transferred percentage as bytes arrive.
    async fn stage(&self, media: &MediaItem, dest: &Path, slot: &JobSlot) -> WorkerResult<()>;

    /// Deliver the encoded output to its durable destination.
    async fn deliver(&self, media: &MediaItem, output: &Path) -> WorkerResult<()>;
}

fn staging_progress(transferred: u64, total: u64) -> String {
    format!(
        "downloading file: {}",
        format_percentage(transferred as i64, total as i64)
    )
}

/// Backend that streams downloads and uploads through the metadata API.
pub struct RemoteTransfer {
    metadata: std::sync::Arc<dyn MetadataService>,
}

impl RemoteTransfer {
    pub fn new(metadata: std::sync::Arc<dyn MetadataService>) -> Self {
        Self { metadata }
    }
}

#[async_trait]
impl TransferBackend for RemoteTransfer {
    async fn stage(&self, media: &MediaItem, dest: &Path, slot: &JobSlot) -> WorkerResult<()> {
        let mut download = self.metadata.download(media.kind(), media.id()).await?;

        info!("Downloading {} {}", media.kind(), media.id());

        let mut file = tokio::fs::File::create(dest).await?;
        let mut transferred: u64 = 0;

        while let Some(chunk) = download.stream.next().await {
            let chunk = chunk.map_err(|e| WorkerError::staging(e.to_string()))?;
            file.write_all(&chunk).await?;
            transferred += chunk.len() as u64;
            slot.set_progress(staging_progress(transferred, download.size));
        }
        file.flush().await?;

        if transferred != download.size {
            return Err(WorkerError::staging(format!(
                "download truncated: got {} of {} bytes",
                transferred, download.size
            )));
        }

        debug!("Download finished ({} bytes)", transferred);
        Ok(())
    }

    async fn deliver(&self, media: &MediaItem, output: &Path) -> WorkerResult<()> {
        info!("Uploading {}", output.display());
        self.metadata
            .upload(media.kind(), media.id(), output)
            .await?;
        Ok(())
    }
}

/// Backend that copies against locally mounted library and import trees.
pub struct LibraryTransfer {
    movie_dir: PathBuf,
    tv_dir: PathBuf,
    import_dir: PathBuf,
}

impl LibraryTransfer {
    pub fn new(
        movie_dir: impl Into<PathBuf>,
        tv_dir: impl Into<PathBuf>,
        import_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            movie_dir: movie_dir.into(),
            tv_dir: tv_dir.into(),
            import_dir: import_dir.into(),
        }
    }

    fn library_root(&self, kind: MediaKind) -> &Path {
        match kind {
            MediaKind::Movie => &self.movie_dir,
            MediaKind::Episode => &self.tv_dir,
        }
    }

    fn import_subdir(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Movie => "movies",
            MediaKind::Episode => "episodes",
        }
    }
}

#[async_trait]
impl TransferBackend for LibraryTransfer {
    async fn stage(&self, media: &MediaItem, dest: &Path, slot: &JobSlot) -> WorkerResult<()> {
        let source = self
            .library_root(media.kind())
            .join(media.library_relative_path());

        if !source.exists() {
            return Err(WorkerError::staging(format!(
                "source file missing: {}",
                source.display()
            )));
        }

        info!("Copying {} into the temp area", source.display());

        let mut src = tokio::fs::File::open(&source).await?;
        let total = src.metadata().await?.len();
        let mut dst = tokio::fs::File::create(dest).await?;

        let mut buf = vec![0u8; COPY_CHUNK_SIZE];
        let mut transferred: u64 = 0;
        loop {
            let read = src.read(&mut buf).await?;
            if read == 0 {
                break;
            }
            dst.write_all(&buf[..read]).await?;
            transferred += read as u64;
            slot.set_progress(staging_progress(transferred, total));
        }
        dst.flush().await?;

        Ok(())
    }

    async fn deliver(&self, media: &MediaItem, output: &Path) -> WorkerResult<()> {
        let dest_dir = self.import_dir.join(Self::import_subdir(media.kind()));
        tokio::fs::create_dir_all(&dest_dir)
            .await
            .map_err(|e| WorkerError::delivery(e.to_string()))?;

        let file_name = output
            .file_name()
            .ok_or_else(|| WorkerError::delivery("output path has no file name"))?;
        let dest = dest_dir.join(file_name);

        info!("Importing {} as {}", output.display(), dest.display());
        tokio::fs::copy(output, &dest)
            .await
            .map_err(|e| WorkerError::delivery(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optibot_models::{Movie, Show};

    fn movie() -> MediaItem {
        MediaItem::Movie(Movie {
            id: 42,
            tmdb_id: None,
            imdb_id: None,
            title: "Example".to_string(),
            year: None,
            resolution: None,
            height: None,
            width: None,
            duration: None,
            codec: None,
            filename: "Example.mp4".to_string(),
            filetype: "mp4".to_string(),
            folder_name: "Example (1999)".to_string(),
            is_optimized: false,
        })
    }

    fn episode() -> MediaItem {
        MediaItem::Episode(optibot_models::Episode {
            id: 7,
            tvdb_id: None,
            title: "Pilot".to_string(),
            date: None,
            number: 1,
            season: 1,
            show: Show {
                id: None,
                name: "Example Show".to_string(),
                folder_name: "Example Show (2008)".to_string(),
            },
            filename: "S01E01.mkv".to_string(),
            filetype: "mkv".to_string(),
            height: None,
            width: None,
            duration: None,
            codec: None,
            resolution: None,
            is_optimized: false,
        })
    }

    #[test]
    fn staging_progress_has_two_decimal_places() {
        assert_eq!(staging_progress(512, 1024), "downloading file: 50.00%");
        assert_eq!(staging_progress(1024, 1024), "downloading file: 100.00%");
    }

    #[tokio::test]
    async fn library_stage_copies_source_with_progress() {
        let library = tempfile::tempdir().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let import = tempfile::tempdir().unwrap();

        let movie_dir = library.path().join("movies");
        let source_dir = movie_dir.join("Example (1999)");
        tokio::fs::create_dir_all(&source_dir).await.unwrap();
        tokio::fs::write(source_dir.join("Example.mp4"), vec![7u8; 4096])
            .await
            .unwrap();

        let backend = LibraryTransfer::new(
            &movie_dir,
            library.path().join("tv"),
            import.path(),
        );

        let slot = JobSlot::new();
        slot.begin(optibot_models::WorkItem::claim(
            &optibot_models::QueueItem {
                id: 1,
                media_kind: MediaKind::Movie,
                media_id: 42,
            },
            "encoder-1",
        ));

        let dest = temp.path().join("42-old.mp4");
        backend.stage(&movie(), &dest, &slot).await.unwrap();

        let staged = tokio::fs::read(&dest).await.unwrap();
        assert_eq!(staged.len(), 4096);
        assert_eq!(
            slot.snapshot().unwrap().progress,
            "downloading file: 100.00%"
        );
    }

    #[tokio::test]
    async fn library_stage_fails_when_source_missing() {
        let library = tempfile::tempdir().unwrap();
        let temp = tempfile::tempdir().unwrap();

        let backend = LibraryTransfer::new(
            library.path().join("movies"),
            library.path().join("tv"),
            library.path().join("import"),
        );

        let err = backend
            .stage(&movie(), &temp.path().join("42-old.mp4"), &JobSlot::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Staging(_)));
    }

    #[tokio::test]
    async fn library_deliver_places_output_under_kind_directory() {
        let temp = tempfile::tempdir().unwrap();
        let import = tempfile::tempdir().unwrap();

        let output = temp.path().join("7.mkv");
        tokio::fs::write(&output, b"encoded").await.unwrap();

        let backend = LibraryTransfer::new(
            temp.path().join("movies"),
            temp.path().join("tv"),
            import.path(),
        );

        backend.deliver(&episode(), &output).await.unwrap();

        let delivered = import.path().join("episodes").join("7.mkv");
        assert!(delivered.exists());
    }
}
