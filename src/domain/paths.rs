//! # Claude CLI Paths
//!
//! Centralized definitions for where the external CLI keeps its configuration.
//! Acts as the Single Source of Truth so the settings writer and the
//! marketplace manager never disagree about locations.

use std::path::PathBuf;

/// Resolves locations under the user's home directory.
#[derive(Debug, Clone)]
pub struct ClaudePaths {
    home: PathBuf,
}

impl ClaudePaths {
    /// Resolve from the real home directory.
    pub fn new() -> Option<Self> {
        dirs::home_dir().map(|home| Self { home })
    }

    /// Override the home directory (used by tests).
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// `~/.claude`
    pub fn claude_dir(&self) -> PathBuf {
        self.home.join(".claude")
    }

    /// `~/.claude/settings.json`
    pub fn settings_file(&self) -> PathBuf {
        self.claude_dir().join("settings.json")
    }

    /// `~/.claude.json`
    pub fn claude_json(&self) -> PathBuf {
        self.home.join(".claude.json")
    }

    /// `~/.claude/CLAUDE.md`
    pub fn global_claude_md(&self) -> PathBuf {
        self.claude_dir().join("CLAUDE.md")
    }

    /// `~/.claude/plugins`
    pub fn plugins_dir(&self) -> PathBuf {
        self.claude_dir().join("plugins")
    }

    /// `~/.claude/plugins/marketplaces`
    pub fn marketplaces_dir(&self) -> PathBuf {
        self.plugins_dir().join("marketplaces")
    }

    /// `~/.claude/plugins/known_marketplaces.json`
    pub fn known_marketplaces_file(&self) -> PathBuf {
        self.plugins_dir().join("known_marketplaces.json")
    }
}
