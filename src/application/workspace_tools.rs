//! # Workspace Tools
//!
//! The `claude_exec` action family exposed to the host's function-calling
//! layer: create/write file, read file, list files. Every path argument goes
//! through the Workspace Guard before any I/O; a rejected path leaves the
//! filesystem untouched.

use crate::domain::errors::BridgeError;
use crate::infrastructure::workspace::WorkspaceGuard;
use std::path::{Path, PathBuf};

/// One entry from a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Sandboxed file operations over the workspace.
pub struct WorkspaceTools {
    guard: WorkspaceGuard,
}

impl WorkspaceTools {
    pub fn new(guard: WorkspaceGuard) -> Self {
        Self { guard }
    }

    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    /// Create or overwrite a file. Parent directories are created as needed,
    /// but only after the full path has been authorized.
    pub async fn write_file(&self, path: &str, content: &str) -> Result<PathBuf, BridgeError> {
        let resolved = self.guard.authorize(path)?;

        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BridgeError::io("create_dir", parent, e))?;
        }
        tokio::fs::write(&resolved, content)
            .await
            .map_err(|e| BridgeError::io("write", &resolved, e))?;

        tracing::debug!(path = %resolved.display(), bytes = content.len(), "file written");
        Ok(resolved)
    }

    /// Read a file as UTF-8 text.
    pub async fn read_file(&self, path: &str) -> Result<String, BridgeError> {
        let resolved = self.guard.authorize(path)?;
        tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| BridgeError::io("read", &resolved, e))
    }

    /// List a directory, sorted by name for stable output.
    pub async fn list_files(&self, path: &str) -> Result<Vec<ListedEntry>, BridgeError> {
        let resolved = self.guard.authorize(path)?;
        let mut reader = tokio::fs::read_dir(&resolved)
            .await
            .map_err(|e| BridgeError::io("list", &resolved, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| BridgeError::io("list", &resolved, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| BridgeError::io("stat", entry.path(), e))?
                .is_dir();
            entries.push(ListedEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Render a listing the way the chat surface shows it.
pub fn format_listing(entries: &[ListedEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let kind = if entry.is_dir { "DIR" } else { "FILE" };
        out.push_str(&format!("{} [{}]\n", entry.name, kind));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tools_in(dir: &TempDir) -> WorkspaceTools {
        let guard = WorkspaceGuard::new(dir.path().join("workspace")).unwrap();
        WorkspaceTools::new(guard)
    }

    #[tokio::test]
    async fn write_then_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let tools = tools_in(&dir);

        let written = tools.write_file("notes.txt", "hello").await.unwrap();
        assert!(written.starts_with(tools.root()));
        assert_eq!(tools.read_file("notes.txt").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn write_creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let tools = tools_in(&dir);
        tools
            .write_file("site/css/style.css", "body {}")
            .await
            .unwrap();
        assert_eq!(
            tools.read_file("site/css/style.css").await.unwrap(),
            "body {}"
        );
    }

    #[tokio::test]
    async fn traversal_is_rejected_with_no_side_effect() {
        let dir = TempDir::new().unwrap();
        let tools = tools_in(&dir);

        let err = tools
            .write_file("../outside/evil.txt", "nope")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PATH_TRAVERSAL");
        assert!(!dir.path().join("outside").exists());

        let err = tools.read_file("../../etc/passwd").await.unwrap_err();
        assert_eq!(err.code(), "PATH_TRAVERSAL");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn write_through_dangling_symlink_cannot_leave_the_root() {
        let dir = TempDir::new().unwrap();
        let tools = tools_in(&dir);
        let outside_target = dir.path().join("stolen.txt");
        std::os::unix::fs::symlink(&outside_target, dir.path().join("workspace/leak")).unwrap();

        let err = tools.write_file("leak", "payload").await.unwrap_err();
        assert_eq!(err.code(), "PATH_TRAVERSAL");
        assert!(!outside_target.exists());
    }

    #[tokio::test]
    async fn listing_is_sorted_and_typed() {
        let dir = TempDir::new().unwrap();
        let tools = tools_in(&dir);
        tools.write_file("b.txt", "b").await.unwrap();
        tools.write_file("a/one.txt", "1").await.unwrap();

        let entries = tools.list_files("").await.unwrap();
        assert_eq!(
            entries,
            vec![
                ListedEntry {
                    name: "a".into(),
                    is_dir: true
                },
                ListedEntry {
                    name: "b.txt".into(),
                    is_dir: false
                },
            ]
        );

        let rendered = format_listing(&entries);
        assert!(rendered.contains("a [DIR]"));
        assert!(rendered.contains("b.txt [FILE]"));
    }

    #[tokio::test]
    async fn reading_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let tools = tools_in(&dir);
        let err = tools.read_file("ghost.txt").await.unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
    }
}
