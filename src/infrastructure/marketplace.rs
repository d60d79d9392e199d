//! # Marketplace Manager
//!
//! Configures the official plugin marketplace and installs skills through
//! the CLI's own plugin system. Falls back to a manual git clone plus
//! `known_marketplaces.json` when the CLI command fails (fresh installs
//! sometimes reject plugin commands before onboarding completes).

use crate::domain::errors::BridgeError;
use crate::domain::paths::ClaudePaths;
use crate::infrastructure::command::CLAUDE_BIN;
use crate::infrastructure::process::ProcessRunner;
use serde_json::json;
use std::time::Duration;

const OFFICIAL_MARKETPLACE: &str = "anthropics/claude-plugins-official";
const MARKETPLACE_HTTPS_URL: &str = "https://github.com/anthropics/claude-plugins-official.git";
const MARKETPLACE_TIMEOUT: Duration = Duration::from_secs(120);
const SKILL_TIMEOUT: Duration = Duration::from_secs(60);

/// Manages the plugin marketplace and skill installation.
pub struct MarketplaceManager {
    paths: ClaudePaths,
    runner: ProcessRunner,
    ready: std::sync::atomic::AtomicBool,
}

impl MarketplaceManager {
    pub fn new(paths: ClaudePaths) -> Self {
        Self {
            paths,
            runner: ProcessRunner::new(),
            ready: std::sync::atomic::AtomicBool::new(false),
        }
    }

    async fn plugin_command(
        &self,
        args: &[&str],
        timeout: Duration,
    ) -> Result<crate::infrastructure::process::RawOutput, BridgeError> {
        let args: Vec<String> = ["plugin"]
            .iter()
            .chain(args)
            .map(|s| s.to_string())
            .collect();
        self.runner.run(CLAUDE_BIN, &args, None, timeout).await
    }

    /// Check whether the official marketplace is already configured.
    pub async fn has_marketplace(&self) -> bool {
        match self
            .plugin_command(&["marketplace", "list"], SKILL_TIMEOUT)
            .await
        {
            Ok(output) => output.stdout.contains("claude-plugins-official"),
            Err(e) => {
                tracing::warn!(error = %e, "marketplace list failed");
                false
            }
        }
    }

    /// Add the official marketplace, falling back to manual setup.
    pub async fn add_marketplace(&self) -> Result<String, BridgeError> {
        tracing::info!("adding official marketplace");

        match self
            .plugin_command(&["marketplace", "add", OFFICIAL_MARKETPLACE], MARKETPLACE_TIMEOUT)
            .await
        {
            Ok(output) if output.success() => {
                return Ok("marketplace added via claude command".to_string());
            }
            Ok(output) => {
                tracing::warn!(stderr = %output.stderr, "claude marketplace add failed, trying manual setup");
            }
            Err(e) => {
                tracing::warn!(error = %e, "claude marketplace add errored, trying manual setup");
            }
        }

        self.manual_add_marketplace().await
    }

    /// Manual fallback: shallow-clone the marketplace repo and register it.
    async fn manual_add_marketplace(&self) -> Result<String, BridgeError> {
        let marketplaces_dir = self.paths.marketplaces_dir();
        let target_dir = marketplaces_dir.join("claude-plugins-official");

        tokio::fs::create_dir_all(&marketplaces_dir)
            .await
            .map_err(|e| BridgeError::io("create_dir", &marketplaces_dir, e))?;

        if !target_dir.exists() {
            let output = self
                .runner
                .run(
                    "git",
                    &[
                        "clone".to_string(),
                        "--depth".to_string(),
                        "1".to_string(),
                        MARKETPLACE_HTTPS_URL.to_string(),
                        target_dir.to_string_lossy().to_string(),
                    ],
                    None,
                    MARKETPLACE_TIMEOUT,
                )
                .await?;
            if !output.success() {
                return Err(BridgeError::Cli {
                    message: "git clone of marketplace failed".into(),
                    stderr: output.stderr,
                });
            }
        }

        let registry = json!({
            "claude-plugins-official": {
                "source": { "source": "github", "repo": OFFICIAL_MARKETPLACE },
                "installLocation": target_dir.to_string_lossy(),
                "lastUpdated": chrono::Utc::now().to_rfc3339(),
            }
        });
        let registry_file = self.paths.known_marketplaces_file();
        let body = serde_json::to_string_pretty(&registry)
            .map_err(|e| BridgeError::Parse {
                reason: e.to_string(),
                stdout: String::new(),
            })?;
        tokio::fs::write(&registry_file, body)
            .await
            .map_err(|e| BridgeError::io("write", &registry_file, e))?;

        tracing::info!("marketplace configured manually");
        Ok("marketplace added manually".to_string())
    }

    /// Update the marketplace index.
    pub async fn update_marketplace(&self) -> Result<String, BridgeError> {
        let output = self
            .plugin_command(&["marketplace", "update"], SKILL_TIMEOUT)
            .await?;
        if output.success() {
            Ok("marketplace updated".to_string())
        } else {
            Err(BridgeError::Cli {
                message: "marketplace update failed".into(),
                stderr: output.stderr,
            })
        }
    }

    /// Ensure the marketplace is configured and fresh. Cached per process.
    pub async fn ensure_marketplace(&self) -> Result<String, BridgeError> {
        use std::sync::atomic::Ordering;

        if self.ready.load(Ordering::Relaxed) {
            return Ok("marketplace ready (cached)".to_string());
        }

        if !self.has_marketplace().await {
            let msg = self.add_marketplace().await?;
            tracing::info!(%msg, "marketplace configured");
        }

        // A stale index still resolves most skills; do not fail the install.
        let msg = match self.update_marketplace().await {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "marketplace update failed, continuing with existing index");
                "marketplace ready (update skipped)".to_string()
            }
        };
        self.ready.store(true, Ordering::Relaxed);
        Ok(msg)
    }

    /// Install one skill/plugin by name.
    pub async fn install_skill(&self, skill: &str) -> Result<String, BridgeError> {
        self.ensure_marketplace().await?;

        let output = self
            .plugin_command(&["install", skill], SKILL_TIMEOUT)
            .await?;
        if output.success() {
            tracing::info!(skill, "skill installed");
            Ok(format!("skill {skill} installed"))
        } else {
            Err(BridgeError::Cli {
                message: format!("failed to install skill {skill}"),
                stderr: output.stderr,
            })
        }
    }

    /// Install every configured skill, continuing past individual failures.
    pub async fn install_skills(&self, skills: &[String]) -> Vec<(String, Result<String, BridgeError>)> {
        let mut results = Vec::with_capacity(skills.len());
        for skill in skills {
            let result = self.install_skill(skill).await;
            if let Err(e) = &result {
                tracing::warn!(skill, error = %e, "skill installation failed");
            }
            results.push((skill.clone(), result));
        }
        results
    }
}
