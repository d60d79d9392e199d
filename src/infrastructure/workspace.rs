//! # Workspace Guard
//!
//! Confines every sandboxed file operation to the configured workspace root.
//! Requested paths are untrusted tool-call arguments; they are normalized
//! (collapsing `.`/`..`, following symlinks) and checked for containment
//! before any I/O happens.

use crate::domain::errors::BridgeError;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Validates that paths stay inside a fixed workspace root.
///
/// The root is created and canonicalized once at construction and is
/// immutable for the lifetime of the guard.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    root: PathBuf,
}

impl WorkspaceGuard {
    /// Create the guard. The root directory is created if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create workspace root {}", root.display()))?;
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize workspace root {}", root.display()))?;
        Ok(Self { root })
    }

    /// The canonical workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a requested path and verify it stays inside the root.
    ///
    /// On success returns the absolute resolved path for the caller to use
    /// for the actual read/write/list. On failure returns `PathTraversal`
    /// and the operation must not be attempted.
    pub fn authorize(&self, requested: &str) -> Result<PathBuf, BridgeError> {
        // A leading '/' addresses the workspace root itself, matching how
        // the tool surface presents the sandbox as its own filesystem.
        let relative = requested.trim().trim_start_matches('/');
        let candidate = self.root.join(relative);

        let normalized = self.normalize_lexically(&candidate, requested)?;
        let resolved = self.resolve_symlinks(&normalized, requested)?;

        if resolved == self.root || resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(self.rejected(requested))
        }
    }

    fn rejected(&self, requested: &str) -> BridgeError {
        tracing::warn!(requested, root = %self.root.display(), "workspace escape rejected");
        BridgeError::PathTraversal {
            requested: requested.to_string(),
        }
    }

    /// Collapse `.` and `..` without touching the filesystem.
    ///
    /// Popping past the root is already an escape, even if the final path
    /// would point back inside. Containment is checked on components, never
    /// on raw string prefixes, so a sibling like `workspace2` can never
    /// match a root named `workspace`.
    fn normalize_lexically(&self, candidate: &Path, requested: &str) -> Result<PathBuf, BridgeError> {
        let mut normalized = PathBuf::new();
        for component in candidate.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() || !normalized.starts_with(&self.root) {
                        return Err(self.rejected(requested));
                    }
                }
                other => normalized.push(other.as_os_str()),
            }
        }
        if normalized.starts_with(&self.root) {
            Ok(normalized)
        } else {
            Err(self.rejected(requested))
        }
    }

    /// Canonicalize the deepest existing ancestor and re-append the rest,
    /// so symlinks are resolved even for targets that do not exist yet.
    ///
    /// Ancestors are probed with `symlink_metadata`, which does not follow
    /// links, so a dangling symlink is still seen as a link and resolved by
    /// hand; `exists()` would report it as absent and let its target slip
    /// past the containment check.
    fn resolve_symlinks(&self, normalized: &Path, requested: &str) -> Result<PathBuf, BridgeError> {
        const MAX_LINK_HOPS: usize = 16;

        let mut existing = normalized.to_path_buf();
        let mut pending: Vec<OsString> = Vec::new();
        let mut hops = 0usize;

        loop {
            match std::fs::symlink_metadata(&existing) {
                Ok(meta) if meta.is_symlink() => {
                    hops += 1;
                    if hops > MAX_LINK_HOPS {
                        return Err(self.rejected(requested));
                    }
                    let target =
                        std::fs::read_link(&existing).map_err(|_| self.rejected(requested))?;
                    let parent = existing
                        .parent()
                        .ok_or_else(|| self.rejected(requested))?
                        .to_path_buf();
                    let joined = if target.is_absolute() {
                        target
                    } else {
                        parent.join(target)
                    };
                    existing = self.normalize_lexically(&joined, requested)?;
                }
                Ok(_) => {
                    let canonical = existing
                        .canonicalize()
                        .map_err(|_| self.rejected(requested))?;
                    let mut resolved = canonical;
                    for part in pending.iter().rev() {
                        resolved.push(part);
                    }
                    return Ok(resolved);
                }
                Err(_) => match (existing.file_name(), existing.parent()) {
                    (Some(name), Some(parent)) => {
                        pending.push(name.to_owned());
                        existing = parent.to_path_buf();
                    }
                    // Walked past the filesystem root without finding anything.
                    _ => return Err(self.rejected(requested)),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn guard_in(dir: &TempDir) -> (WorkspaceGuard, PathBuf) {
        let root = dir.path().join("workspace");
        let guard = WorkspaceGuard::new(&root).unwrap();
        let canonical = root.canonicalize().unwrap();
        (guard, canonical)
    }

    #[test]
    fn accepts_simple_relative_path() {
        let dir = TempDir::new().unwrap();
        let (guard, root) = guard_in(&dir);
        let resolved = guard.authorize("notes.txt").unwrap();
        assert_eq!(resolved, root.join("notes.txt"));
    }

    #[test]
    fn accepts_nested_path_that_does_not_exist_yet() {
        let dir = TempDir::new().unwrap();
        let (guard, root) = guard_in(&dir);
        let resolved = guard.authorize("site/css/style.css").unwrap();
        assert_eq!(resolved, root.join("site/css/style.css"));
    }

    #[test]
    fn empty_and_slash_resolve_to_root() {
        let dir = TempDir::new().unwrap();
        let (guard, root) = guard_in(&dir);
        assert_eq!(guard.authorize("").unwrap(), root);
        assert_eq!(guard.authorize("/").unwrap(), root);
    }

    #[test]
    fn rejects_parent_traversal() {
        let dir = TempDir::new().unwrap();
        let (guard, _) = guard_in(&dir);
        let err = guard.authorize("../secrets.txt").unwrap_err();
        assert_eq!(err.code(), "PATH_TRAVERSAL");
        assert!(guard.authorize("../../etc/passwd").is_err());
    }

    #[test]
    fn rejects_traversal_hidden_in_the_middle() {
        let dir = TempDir::new().unwrap();
        let (guard, _) = guard_in(&dir);
        assert!(guard.authorize("docs/../../escape.txt").is_err());
        // Dipping below the root is an escape even if the path climbs back.
        assert!(guard.authorize("../workspace/notes.txt").is_err());
    }

    #[test]
    fn dot_segments_inside_root_are_collapsed() {
        let dir = TempDir::new().unwrap();
        let (guard, root) = guard_in(&dir);
        let resolved = guard.authorize("a/./b/../c.txt").unwrap();
        assert_eq!(resolved, root.join("a/c.txt"));
    }

    #[test]
    fn rejects_sibling_directory_with_shared_prefix() {
        let dir = TempDir::new().unwrap();
        let (guard, _) = guard_in(&dir);
        std::fs::create_dir_all(dir.path().join("workspace2")).unwrap();
        std::fs::write(dir.path().join("workspace2/file"), "x").unwrap();
        assert!(guard.authorize("../workspace2/file").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_escaping_the_root() {
        let dir = TempDir::new().unwrap();
        let (guard, root) = guard_in(&dir);
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::write(outside.join("secret.txt"), "top secret").unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        let err = guard.authorize("link/secret.txt").unwrap_err();
        assert_eq!(err.code(), "PATH_TRAVERSAL");
    }

    #[cfg(unix)]
    #[test]
    fn rejects_dangling_symlink_pointing_outside() {
        let dir = TempDir::new().unwrap();
        let (guard, root) = guard_in(&dir);
        // Target does not exist; a write through the link would create it
        // outside the root.
        std::os::unix::fs::symlink(dir.path().join("stolen.txt"), root.join("leak")).unwrap();

        let err = guard.authorize("leak").unwrap_err();
        assert_eq!(err.code(), "PATH_TRAVERSAL");
        assert!(guard.authorize("leak/nested.txt").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn accepts_dangling_symlink_staying_inside() {
        let dir = TempDir::new().unwrap();
        let (guard, root) = guard_in(&dir);
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("alias.txt")).unwrap();

        let resolved = guard.authorize("alias.txt").unwrap();
        assert_eq!(resolved, root.join("real.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_loop() {
        let dir = TempDir::new().unwrap();
        let (guard, root) = guard_in(&dir);
        std::os::unix::fs::symlink(root.join("b"), root.join("a")).unwrap();
        std::os::unix::fs::symlink(root.join("a"), root.join("b")).unwrap();

        assert!(guard.authorize("a").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn accepts_symlink_staying_inside_the_root() {
        let dir = TempDir::new().unwrap();
        let (guard, root) = guard_in(&dir);
        std::fs::create_dir_all(root.join("real")).unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();

        let resolved = guard.authorize("alias/notes.txt").unwrap();
        assert_eq!(resolved, root.join("real/notes.txt"));
    }
}
