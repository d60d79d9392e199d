//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`).
//! Carries everything the host panel exposes: credentials, tool allow/deny lists,
//! permission mode, budget, timeouts, skills and the workspace name.

use crate::domain::errors::BridgeError;
use crate::domain::types::PermissionMode;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MIN_TIMEOUT_SECS: u64 = 10;
const MAX_TIMEOUT_SECS: u64 = 600;

/// Main configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    /// Name of the sandboxed working directory, created under the data dir.
    #[serde(default = "default_workspace_name")]
    pub workspace_name: String,
    /// Freeform project instructions written to CLAUDE.md.
    #[serde(default)]
    pub claude_md: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_true")]
    pub auto_install_claude: bool,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub disallowed_tools: Vec<String>,
    #[serde(default)]
    pub permission_mode: PermissionMode,
    /// Spend ceiling forwarded to the CLI. None means no ceiling.
    #[serde(default)]
    pub max_budget_usd: Option<f64>,
    /// Additional directories the CLI may access, forwarded as --add-dir.
    #[serde(default)]
    pub add_dirs: Vec<String>,
    #[serde(default)]
    pub skills_to_install: Vec<String>,
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Port for the workspace deployment server. 0 disables it.
    #[serde(default = "default_server_port")]
    pub http_server_port: u16,
}

fn default_workspace_name() -> String {
    "workspace".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_turns() -> u32 {
    10
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_server_port() -> u16 {
    6200
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            workspace_name: default_workspace_name(),
            claude_md: String::new(),
            auth_token: String::new(),
            api_key: String::new(),
            api_base_url: String::new(),
            model: String::new(),
            auto_install_claude: true,
            allowed_tools: Vec::new(),
            disallowed_tools: Vec::new(),
            permission_mode: PermissionMode::Default,
            max_budget_usd: None,
            add_dirs: Vec::new(),
            skills_to_install: Vec::new(),
            max_turns: default_max_turns(),
            timeout_seconds: default_timeout_seconds(),
            http_server_port: default_server_port(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration. Pure check, no I/O.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.auth_token.is_empty() && self.api_key.is_empty() {
            return Err(BridgeError::InvalidConfig {
                field: "auth".into(),
                message: "either auth_token or api_key must be set".into(),
            });
        }

        if self.timeout_seconds < MIN_TIMEOUT_SECS || self.timeout_seconds > MAX_TIMEOUT_SECS {
            return Err(BridgeError::InvalidConfig {
                field: "timeout_seconds".into(),
                message: format!(
                    "must be between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS}, got {}",
                    self.timeout_seconds
                ),
            });
        }

        if let Some(budget) = self.max_budget_usd {
            if budget <= 0.0 {
                return Err(BridgeError::InvalidConfig {
                    field: "max_budget_usd".into(),
                    message: format!("must be positive, got {budget}"),
                });
            }
        }

        Ok(())
    }

    /// Absolute workspace root, derived from `workspace_name` under the data dir.
    pub fn workspace_root(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.workspace_name)
    }

    /// One-line summary for logs and status output. Never leaks credentials.
    pub fn summary(&self) -> String {
        let cred = if !self.auth_token.is_empty() {
            "auth token: configured"
        } else if !self.api_key.is_empty() {
            "api key: configured"
        } else {
            "credentials: missing"
        };
        let base = if self.api_base_url.is_empty() {
            "official"
        } else {
            self.api_base_url.as_str()
        };
        format!(
            "{cred}, base url: {base}, permission mode: {}, timeout: {}s",
            self.permission_mode, self.timeout_seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> BridgeConfig {
        BridgeConfig {
            auth_token: "sk-test".into(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_are_sensible() {
        let config = BridgeConfig::default();
        assert_eq!(config.workspace_name, "workspace");
        assert_eq!(config.timeout_seconds, 300);
        assert_eq!(config.max_turns, 10);
        assert!(config.auto_install_claude);
        assert_eq!(config.permission_mode, PermissionMode::Default);
    }

    #[test]
    fn parses_yaml_with_lists() {
        let yaml = r#"
workspace_name: sandbox
auth_token: sk-abc
allowed_tools: [Read, Write, Bash]
disallowed_tools: [WebSearch]
permission_mode: acceptEdits
add_dirs:
  - /tmp/shared
max_turns: 5
timeout_seconds: 120
"#;
        let config: BridgeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.workspace_name, "sandbox");
        assert_eq!(config.allowed_tools, vec!["Read", "Write", "Bash"]);
        assert_eq!(config.permission_mode, PermissionMode::AcceptEdits);
        assert_eq!(config.add_dirs, vec!["/tmp/shared"]);
        assert_eq!(config.max_turns, 5);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_missing_credentials() {
        let config = BridgeConfig::default();
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
        assert!(err.to_string().contains("auth"));
    }

    #[test]
    fn rejects_timeout_out_of_range() {
        let mut config = valid_config();
        config.timeout_seconds = 5;
        assert!(config.validate().is_err());
        config.timeout_seconds = 601;
        assert!(config.validate().is_err());
        config.timeout_seconds = 600;
        config.validate().unwrap();
    }

    #[test]
    fn rejects_invalid_permission_mode_in_yaml() {
        let yaml = "auth_token: x\npermission_mode: yolo\n";
        assert!(serde_yaml::from_str::<BridgeConfig>(yaml).is_err());
    }

    #[test]
    fn rejects_non_positive_budget() {
        let mut config = valid_config();
        config.max_budget_usd = Some(0.0);
        assert!(config.validate().is_err());
        config.max_budget_usd = Some(2.5);
        config.validate().unwrap();
    }

    #[test]
    fn workspace_root_joins_data_dir() {
        let config = valid_config();
        let root = config.workspace_root(Path::new("/data/plugins/claude"));
        assert_eq!(root, PathBuf::from("/data/plugins/claude/workspace"));
    }

    #[test]
    fn summary_hides_secrets() {
        let config = valid_config();
        let summary = config.summary();
        assert!(!summary.contains("sk-test"));
        assert!(summary.contains("auth token: configured"));
    }
}
