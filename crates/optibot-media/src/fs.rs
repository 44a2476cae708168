//! Media file helpers for the temp area.

use std::path::Path;

/// File extensions treated as media artifacts in the temp area.
pub const MEDIA_FILE_EXTENSIONS: [&str; 9] = [
    "avi", "divx", "flv", "m4v", "mkv", "mp4", "mpeg", "mpg", "wmv",
];

/// Whether a file name carries a known media extension.
pub fn is_media_file_name(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            MEDIA_FILE_EXTENSIONS.iter().any(|known| *known == ext)
        }
        _ => false,
    }
}

/// Whether a file name is hidden (dotfile convention).
pub fn is_hidden_file_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Whether a directory entry is a media file the janitor may delete.
pub fn is_reclaimable_media_file(path: &Path, is_dir: bool) -> bool {
    if is_dir {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    !is_hidden_file_name(name) && is_media_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn recognizes_media_extensions() {
        assert!(is_media_file_name("42-old.mp4"));
        assert!(is_media_file_name("42.mkv"));
        assert!(is_media_file_name("UPPER.MKV"));
        assert!(!is_media_file_name("notes.txt"));
        assert!(!is_media_file_name("archive.srt"));
        assert!(!is_media_file_name("noextension"));
        assert!(!is_media_file_name(".mkv"));
    }

    #[test]
    fn hidden_and_directory_entries_are_not_reclaimable() {
        assert!(is_reclaimable_media_file(&PathBuf::from("/tmp/42.mkv"), false));
        assert!(!is_reclaimable_media_file(&PathBuf::from("/tmp/.42.mkv"), false));
        assert!(!is_reclaimable_media_file(&PathBuf::from("/tmp/folder.mkv"), true));
        assert!(!is_reclaimable_media_file(&PathBuf::from("/tmp/notes.txt"), false));
    }
}
