//! # Settings Writer
//!
//! Applies the bridge configuration to the external CLI: the `env` block in
//! `~/.claude/settings.json`, the onboarding marker in `~/.claude.json`, and
//! the `CLAUDE.md` project instructions.

use crate::domain::config::BridgeConfig;
use crate::domain::errors::BridgeError;
use crate::domain::paths::ClaudePaths;
use serde_json::{Map, Value, json};
use std::path::Path;

/// Writes CLI-side configuration files.
pub struct SettingsWriter {
    paths: ClaudePaths,
}

impl SettingsWriter {
    pub fn new(paths: ClaudePaths) -> Self {
        Self { paths }
    }

    /// Build the env block forwarded to the CLI through settings.json.
    fn build_env(&self, config: &BridgeConfig) -> Map<String, Value> {
        let mut env = Map::new();
        env.insert(
            "API_TIMEOUT_MS".into(),
            Value::String((config.timeout_seconds * 1000).to_string()),
        );
        env.insert(
            "CLAUDE_CODE_DISABLE_NONESSENTIAL_TRAFFIC".into(),
            Value::String("1".into()),
        );

        // auth_token wins when both credentials are present
        if !config.auth_token.is_empty() {
            env.insert(
                "ANTHROPIC_AUTH_TOKEN".into(),
                Value::String(config.auth_token.clone()),
            );
        } else if !config.api_key.is_empty() {
            env.insert(
                "ANTHROPIC_API_KEY".into(),
                Value::String(config.api_key.clone()),
            );
        }

        if !config.api_base_url.is_empty() {
            env.insert(
                "ANTHROPIC_BASE_URL".into(),
                Value::String(config.api_base_url.clone()),
            );
        }

        env
    }

    async fn write_json(&self, path: &Path, value: &Value) -> Result<(), BridgeError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BridgeError::io("create_dir", parent, e))?;
        }
        let body = serde_json::to_string_pretty(value).map_err(|e| BridgeError::Parse {
            reason: e.to_string(),
            stdout: String::new(),
        })?;
        tokio::fs::write(path, body)
            .await
            .map_err(|e| BridgeError::io("write", path, e))?;
        tracing::debug!(path = %path.display(), "wrote settings file");
        Ok(())
    }

    /// Apply credentials and endpoint settings to the CLI.
    pub async fn apply(&self, config: &BridgeConfig) -> Result<(), BridgeError> {
        let settings = json!({ "env": self.build_env(config) });
        self.write_json(&self.paths.settings_file(), &settings)
            .await?;

        // Skip the interactive first-run wizard.
        let onboarding = json!({ "hasCompletedOnboarding": true });
        self.write_json(&self.paths.claude_json(), &onboarding)
            .await?;

        tracing::info!("CLI settings applied");
        Ok(())
    }

    /// Write CLAUDE.md to both the global config dir and the workspace,
    /// so -p mode runs pick the instructions up either way.
    pub async fn write_claude_md(
        &self,
        config: &BridgeConfig,
        workspace: &Path,
    ) -> Result<(), BridgeError> {
        if config.claude_md.is_empty() {
            return Ok(());
        }

        let global = self.paths.global_claude_md();
        if let Some(parent) = global.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BridgeError::io("create_dir", parent, e))?;
        }
        tokio::fs::write(&global, &config.claude_md)
            .await
            .map_err(|e| BridgeError::io("write", &global, e))?;

        let local = workspace.join("CLAUDE.md");
        tokio::fs::write(&local, &config.claude_md)
            .await
            .map_err(|e| BridgeError::io("write", &local, e))?;

        tracing::info!("CLAUDE.md written to global config and workspace");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_with(auth: &str, key: &str) -> BridgeConfig {
        BridgeConfig {
            auth_token: auth.into(),
            api_key: key.into(),
            timeout_seconds: 120,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn apply_writes_settings_and_onboarding() {
        let home = TempDir::new().unwrap();
        let writer = SettingsWriter::new(ClaudePaths::with_home(home.path()));
        writer.apply(&config_with("sk-token", "")).await.unwrap();

        let settings: Value = serde_json::from_str(
            &std::fs::read_to_string(home.path().join(".claude/settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(settings["env"]["ANTHROPIC_AUTH_TOKEN"], "sk-token");
        assert_eq!(settings["env"]["API_TIMEOUT_MS"], "120000");
        assert_eq!(settings["env"]["CLAUDE_CODE_DISABLE_NONESSENTIAL_TRAFFIC"], "1");
        assert!(settings["env"].get("ANTHROPIC_API_KEY").is_none());

        let onboarding: Value = serde_json::from_str(
            &std::fs::read_to_string(home.path().join(".claude.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(onboarding["hasCompletedOnboarding"], true);
    }

    #[tokio::test]
    async fn api_key_used_when_no_auth_token() {
        let home = TempDir::new().unwrap();
        let writer = SettingsWriter::new(ClaudePaths::with_home(home.path()));
        let mut config = config_with("", "sk-key");
        config.api_base_url = "https://proxy.example.com".into();
        writer.apply(&config).await.unwrap();

        let settings: Value = serde_json::from_str(
            &std::fs::read_to_string(home.path().join(".claude/settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(settings["env"]["ANTHROPIC_API_KEY"], "sk-key");
        assert_eq!(
            settings["env"]["ANTHROPIC_BASE_URL"],
            "https://proxy.example.com"
        );
    }

    #[tokio::test]
    async fn claude_md_written_to_both_locations() {
        let home = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        let writer = SettingsWriter::new(ClaudePaths::with_home(home.path()));
        let mut config = config_with("sk", "");
        config.claude_md = "Always answer in haiku.".into();

        writer
            .write_claude_md(&config, workspace.path())
            .await
            .unwrap();

        let global = std::fs::read_to_string(home.path().join(".claude/CLAUDE.md")).unwrap();
        let local = std::fs::read_to_string(workspace.path().join("CLAUDE.md")).unwrap();
        assert_eq!(global, "Always answer in haiku.");
        assert_eq!(local, global);
    }

    #[tokio::test]
    async fn empty_claude_md_writes_nothing() {
        let home = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        let writer = SettingsWriter::new(ClaudePaths::with_home(home.path()));
        writer
            .write_claude_md(&config_with("sk", ""), workspace.path())
            .await
            .unwrap();
        assert!(!home.path().join(".claude/CLAUDE.md").exists());
        assert!(!workspace.path().join("CLAUDE.md").exists());
    }
}
