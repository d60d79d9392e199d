//! # Output Parser
//!
//! Turns raw CLI output from a blocking (`--output-format json`) run into a
//! typed outcome. Pure transformation, no I/O.

use crate::domain::errors::BridgeError;
use crate::domain::types::ExecutionOutcome;
use crate::infrastructure::process::RawOutput;
use std::time::Duration;

/// Parses the single JSON document the CLI prints in blocking mode.
#[derive(Debug, Default)]
pub struct OutputParser;

impl OutputParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(
        &self,
        raw: &RawOutput,
        duration: Duration,
    ) -> Result<ExecutionOutcome, BridgeError> {
        match serde_json::from_str::<serde_json::Value>(&raw.stdout) {
            Ok(data) => self.parse_document(data, raw, duration),
            Err(e) => self.handle_undecodable(e, raw, duration),
        }
    }

    fn parse_document(
        &self,
        data: serde_json::Value,
        raw: &RawOutput,
        duration: Duration,
    ) -> Result<ExecutionOutcome, BridgeError> {
        let result_text = data
            .get("result")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        if data.get("is_error").and_then(|v| v.as_bool()).unwrap_or(false) {
            tracing::warn!(message = %result_text, "CLI reported an error result");
            return Err(BridgeError::Cli {
                message: if result_text.is_empty() {
                    "unknown CLI error".to_string()
                } else {
                    result_text
                },
                stderr: raw.stderr.clone(),
            });
        }

        if !raw.success() {
            return Err(BridgeError::Cli {
                message: format!("CLI exited with status {:?}", raw.code),
                stderr: raw.stderr.clone(),
            });
        }

        Ok(ExecutionOutcome {
            output: result_text,
            cost_usd: data
                .get("total_cost_usd")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0),
            session_id: data
                .get("session_id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            duration,
            raw: Some(data),
        })
    }

    /// Undecodable stdout: a hard failure when the exit status or stderr
    /// says so, otherwise fall back to treating the raw text as the answer.
    fn handle_undecodable(
        &self,
        error: serde_json::Error,
        raw: &RawOutput,
        duration: Duration,
    ) -> Result<ExecutionOutcome, BridgeError> {
        tracing::warn!(%error, "CLI output was not valid JSON");

        if !raw.success() {
            return Err(BridgeError::Parse {
                reason: error.to_string(),
                stdout: raw.stdout.clone(),
            });
        }

        let stderr_lower = raw.stderr.to_lowercase();
        let stderr_signals_failure =
            stderr_lower.contains("error") || stderr_lower.contains("failed");

        if stderr_signals_failure || raw.stdout.is_empty() {
            return Err(BridgeError::Parse {
                reason: error.to_string(),
                stdout: raw.stdout.clone(),
            });
        }

        Ok(ExecutionOutcome {
            output: raw.stdout.clone(),
            duration,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(stdout: &str, stderr: &str, code: i32) -> RawOutput {
        RawOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            code: Some(code),
        }
    }

    #[test]
    fn parses_successful_document() {
        let stdout = r#"{"result":"done","total_cost_usd":0.0421,"session_id":"abc123","is_error":false}"#;
        let outcome = OutputParser::new()
            .parse(&raw(stdout, "", 0), Duration::from_secs(2))
            .unwrap();
        assert_eq!(outcome.output, "done");
        assert!((outcome.cost_usd - 0.0421).abs() < f64::EPSILON);
        assert_eq!(outcome.session_id, "abc123");
        assert!(outcome.raw.is_some());
    }

    #[test]
    fn is_error_flag_becomes_cli_error() {
        let stdout = r#"{"result":"credit exhausted","is_error":true}"#;
        let err = OutputParser::new()
            .parse(&raw(stdout, "", 0), Duration::ZERO)
            .unwrap_err();
        assert_eq!(err.code(), "CLI_ERROR");
        assert!(err.to_string().contains("credit exhausted"));
    }

    #[test]
    fn nonzero_exit_with_valid_json_is_cli_error() {
        let stdout = r#"{"result":"partial"}"#;
        let err = OutputParser::new()
            .parse(&raw(stdout, "boom", 1), Duration::ZERO)
            .unwrap_err();
        assert_eq!(err.code(), "CLI_ERROR");
    }

    #[test]
    fn plain_text_with_clean_exit_falls_back_to_success() {
        let outcome = OutputParser::new()
            .parse(&raw("just some text", "", 0), Duration::ZERO)
            .unwrap();
        assert_eq!(outcome.output, "just some text");
        assert_eq!(outcome.cost_usd, 0.0);
    }

    #[test]
    fn plain_text_with_error_in_stderr_is_parse_error() {
        let err = OutputParser::new()
            .parse(&raw("garbage", "Error: something broke", 0), Duration::ZERO)
            .unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[test]
    fn empty_stdout_is_parse_error() {
        let err = OutputParser::new()
            .parse(&raw("", "", 0), Duration::ZERO)
            .unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }
}
