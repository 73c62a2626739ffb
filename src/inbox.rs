//! Inbox directory reader.
//!
//! Collects `.eml` files (extension matched case-insensitively) from a single
//! directory, without recursing. Files come back sorted by name so batch order
//! is stable across runs.

use std::path::Path;

use tracing::{debug, info};

use crate::error::InboxError;
use crate::pipeline::RawEmail;

/// Read every `.eml` file in `dir`. The email id is the file name.
pub async fn read_eml_dir(dir: &Path) -> Result<Vec<RawEmail>, InboxError> {
    let read_dir_err = |source: std::io::Error| InboxError::ReadDir {
        path: dir.display().to_string(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_err)?;
    let mut paths = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);

        if is_file && is_eml(&path) {
            paths.push(path);
        } else {
            debug!(path = %path.display(), "Skipping non-email entry");
        }
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut emails = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| InboxError::ReadFile {
                path: path.display().to_string(),
                source,
            })?;
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        emails.push(RawEmail::new(id, bytes));
    }

    info!(dir = %dir.display(), count = emails.len(), "Loaded emails from inbox");
    Ok(emails)
}

fn is_eml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("eml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_eml_files_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.eml"), b"Subject: B\r\n\r\nbody b").unwrap();
        std::fs::write(dir.path().join("a.EML"), b"Subject: A\r\n\r\nbody a").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();

        let emails = read_eml_dir(dir.path()).await.unwrap();
        let ids: Vec<_> = emails.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a.EML", "b.eml"]);
        assert_eq!(emails[1].bytes, b"Subject: B\r\n\r\nbody b");
    }

    #[tokio::test]
    async fn does_not_recurse() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("archive");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("old.eml"), b"Subject: old\r\n\r\nx").unwrap();
        std::fs::create_dir(dir.path().join("folder.eml")).unwrap();

        let emails = read_eml_dir(dir.path()).await.unwrap();
        assert!(emails.is_empty());
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_eml_dir(&dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, InboxError::ReadDir { .. }));
    }

    #[test]
    fn extension_match() {
        assert!(is_eml(Path::new("x.eml")));
        assert!(is_eml(Path::new("x.Eml")));
        assert!(!is_eml(Path::new("x.eml.bak")));
        assert!(!is_eml(Path::new("eml")));
    }
}
