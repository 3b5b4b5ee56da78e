//! Input resolution: list the supported images in a directory.
//!
//! Only regular files whose extension (case-insensitive) is in the configured
//! list are returned; everything else is skipped without being recorded.
//! The listing is sorted by file name because `read_dir` order is
//! platform-dependent and reports should be reproducible.

use crate::error::IdExtractError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default accepted extensions, without the leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Check whether `path` has one of `extensions` (compared case-insensitively).
pub fn has_supported_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            extensions
                .iter()
                .any(|allowed| allowed.as_ref().eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// List supported images directly inside `dir` (no recursion), sorted by name.
pub fn scan_images<S: AsRef<str>>(
    dir: &Path,
    extensions: &[S],
) -> Result<Vec<PathBuf>, IdExtractError> {
    if !dir.exists() {
        return Err(IdExtractError::InputNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(IdExtractError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => IdExtractError::PermissionDenied {
            path: dir.to_path_buf(),
        },
        _ => IdExtractError::Internal(format!("Failed to list {}: {}", dir.display(), e)),
    })?;

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let keep = has_supported_extension(path, extensions);
            if !keep {
                debug!("Skipping unsupported file: {}", path.display());
            }
            keep
        })
        .collect();

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("Found {} images in {}", images.len(), dir.display());
    Ok(images)
}

/// The file name used as the ResultSet key.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(has_supported_extension(Path::new("a.PNG"), SUPPORTED_EXTENSIONS));
        assert!(has_supported_extension(Path::new("a.JpEg"), SUPPORTED_EXTENSIONS));
        assert!(has_supported_extension(Path::new("dir/a.jpg"), SUPPORTED_EXTENSIONS));
        assert!(!has_supported_extension(Path::new("a.gif"), SUPPORTED_EXTENSIONS));
        assert!(!has_supported_extension(Path::new("jpg"), SUPPORTED_EXTENSIONS));
        assert!(!has_supported_extension(Path::new("notes.txt"), SUPPORTED_EXTENSIONS));
    }

    #[test]
    fn scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.JPG", "a.png", "c.jpeg", "readme.txt", "photo.gif"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let found = scan_images(dir.path(), SUPPORTED_EXTENSIONS).unwrap();
        let names: Vec<String> = found.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, ["a.png", "b.JPG", "c.jpeg"]);
    }

    #[test]
    fn missing_dir_is_fatal() {
        let err = scan_images(Path::new("/definitely/not/a/dir"), SUPPORTED_EXTENSIONS)
            .expect_err("should fail");
        assert!(matches!(err, IdExtractError::InputNotFound { .. }));
    }

    #[test]
    fn file_path_is_not_a_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = scan_images(file.path(), SUPPORTED_EXTENSIONS).expect_err("should fail");
        assert!(matches!(err, IdExtractError::NotADirectory { .. }));
    }

    #[test]
    fn custom_extension_list() {
        let exts = vec!["webp".to_string()];
        assert!(has_supported_extension(Path::new("x.WEBP"), &exts));
        assert!(!has_supported_extension(Path::new("x.png"), &exts));
    }
}
