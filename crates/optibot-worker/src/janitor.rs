//! Startup temp-area janitor.
//!
//! Reclaims media files left behind by a previous run that died mid-job.
//! Best effort: every failure is logged and skipped, and the sweep never
//! blocks startup.

use std::path::Path;
use tracing::{info, warn};

use optibot_media::is_reclaimable_media_file;

/// Delete leftover media files from the temp directory, returning how many
/// were removed.
pub async fn clean_temp_dir(temp_dir: &Path) -> usize {
    let mut entries = match tokio::fs::read_dir(temp_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Unable to read temp directory {}: {}", temp_dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Unable to walk temp directory: {}", e);
                break;
            }
        };

        let path = entry.path();
        let is_dir = match entry.file_type().await {
            Ok(file_type) => file_type.is_dir(),
            Err(e) => {
                warn!("Unable to inspect {}: {}", path.display(), e);
                continue;
            }
        };

        if !is_reclaimable_media_file(&path, is_dir) {
            continue;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Removed leftover media file {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Unable to remove {}: {}", path.display(), e),
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn removes_only_leftover_media_files() {
        let temp = tempfile::tempdir().unwrap();
        tokio::fs::write(temp.path().join("42-old.mp4"), b"stale")
            .await
            .unwrap();
        tokio::fs::write(temp.path().join("42.mkv"), b"stale")
            .await
            .unwrap();
        tokio::fs::write(temp.path().join("notes.txt"), b"keep")
            .await
            .unwrap();
        tokio::fs::write(temp.path().join(".hidden.mkv"), b"keep")
            .await
            .unwrap();
        tokio::fs::create_dir(temp.path().join("season.mkv"))
            .await
            .unwrap();

        let removed = clean_temp_dir(temp.path()).await;
        assert_eq!(removed, 2);

        assert!(!temp.path().join("42-old.mp4").exists());
        assert!(!temp.path().join("42.mkv").exists());
        assert!(temp.path().join("notes.txt").exists());
        assert!(temp.path().join(".hidden.mkv").exists());
        assert!(temp.path().join("season.mkv").exists());
    }

    #[tokio::test]
    async fn missing_directory_is_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("nope");
        assert_eq!(clean_temp_dir(&missing).await, 0);
    }
}
