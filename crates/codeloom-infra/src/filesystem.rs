//! Filesystem helpers: data directory resolution and project export.

use std::path::{Path, PathBuf};

use codeloom_types::project::{ProjectState, validate_file_name};

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `CODELOOM_DATA_DIR` environment variable
/// 2. `~/.codeloom`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CODELOOM_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".codeloom");
    }

    // Last resort: current directory
    PathBuf::from(".codeloom")
}

/// Write every file of a project under `target`, creating parent directories.
///
/// Names are re-validated before touching disk, so a state that somehow holds
/// an escaping name fails with `InvalidInput` instead of writing outside
/// `target`. Returns the number of files written.
pub async fn export_project(state: &ProjectState, target: &Path) -> std::io::Result<usize> {
    for file in &state.files {
        validate_file_name(&file.name).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
        })?;
    }

    tokio::fs::create_dir_all(target).await?;

    for file in &state.files {
        let path = target.join(&file.name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &file.content).await?;
        tracing::debug!(path = %path.display(), "exported project file");
    }

    Ok(state.files.len())
}

/// Write a single generated file under `target`.
pub async fn write_project_file(target: &Path, name: &str, content: &str) -> std::io::Result<PathBuf> {
    validate_file_name(name)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let path = target.join(name);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, content).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeloom_types::project::ProjectFile;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_export_writes_nested_files() {
        let dir = tempdir().unwrap();
        let mut state = ProjectState::default();
        state.merge_file("index.html", "<h1>Hi</h1>").unwrap();
        state.merge_file("js/app.js", "console.log(1)").unwrap();

        let target = dir.path().join("out");
        let written = export_project(&state, &target).await.unwrap();
        assert_eq!(written, 2);

        let html = tokio::fs::read_to_string(target.join("index.html")).await.unwrap();
        assert_eq!(html, "<h1>Hi</h1>");
        let js = tokio::fs::read_to_string(target.join("js").join("app.js"))
            .await
            .unwrap();
        assert_eq!(js, "console.log(1)");
    }

    #[tokio::test]
    async fn test_export_empty_project() {
        let dir = tempdir().unwrap();
        let written = export_project(&ProjectState::default(), dir.path())
            .await
            .unwrap();
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn test_export_refuses_escaping_name() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out");
        let mut state = ProjectState::default();
        // Bypass merge_file validation to simulate a tampered stored state.
        state.files.push(ProjectFile {
            name: "../escape.txt".to_string(),
            content: "x".to_string(),
        });

        let err = export_project(&state, &target).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_write_project_file() {
        let dir = tempdir().unwrap();
        let path = write_project_file(dir.path(), "css/site.css", "body{}")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("css/site.css"));
        assert!(write_project_file(dir.path(), "/etc/passwd", "x").await.is_err());
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var("CODELOOM_DATA_DIR", "/tmp/test-codeloom");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-codeloom"));
        unsafe {
            std::env::remove_var("CODELOOM_DATA_DIR");
        }
    }
}
