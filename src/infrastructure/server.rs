//! # Deployment Server
//!
//! Manages a background static-file server over the workspace so generated
//! web pages are immediately reachable. The server itself is an external
//! process (`python3 -m http.server`); this module only owns its lifecycle.

use crate::domain::errors::BridgeError;
use std::net::{Ipv4Addr, SocketAddrV4, TcpStream};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

/// Starts and stops the workspace HTTP server.
pub struct ServerManager {
    workspace: PathBuf,
    port: u16,
    child: Option<Child>,
}

impl ServerManager {
    pub fn new(workspace: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            workspace: workspace.into(),
            port,
            child: None,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Local connect probe; also true when some other process owns the port.
    fn port_in_use(&self) -> bool {
        let addr = SocketAddrV4::new(Ipv4Addr::LOCALHOST, self.port);
        TcpStream::connect_timeout(&addr.into(), Duration::from_millis(500)).is_ok()
    }

    /// Start the server if nothing is listening yet.
    ///
    /// Returns true when a server is running afterwards, whether we started
    /// it or it was already there.
    pub async fn start(&mut self) -> Result<bool, BridgeError> {
        if self.port == 0 {
            tracing::debug!("deployment server disabled (port 0)");
            return Ok(false);
        }

        if self.port_in_use() {
            tracing::info!(port = self.port, "port already serving, leaving it alone");
            return Ok(true);
        }

        let child = Command::new("python3")
            .args([
                "-m",
                "http.server",
                &self.port.to_string(),
                "--bind",
                "0.0.0.0",
            ])
            .current_dir(&self.workspace)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| BridgeError::io("spawn", "python3", e))?;

        tracing::info!(
            port = self.port,
            workspace = %self.workspace.display(),
            "deployment server started"
        );
        self.child = Some(child);
        Ok(true)
    }

    /// Stop the server if this manager started it.
    pub async fn stop(&mut self) -> Result<(), BridgeError> {
        if let Some(mut child) = self.child.take() {
            child
                .kill()
                .await
                .map_err(|e| BridgeError::io("kill", "python3", e))?;
            let _ = child.wait().await;
            tracing::info!("deployment server stopped");
        }
        Ok(())
    }
}
