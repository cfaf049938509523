// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `replyhook` binary as a subprocess and exercises it
//! over HTTP.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Once;
use std::time::Duration;

static CRYPTO_INIT: Once = Once::new();

/// Verify token every spawned process is configured with.
pub const VERIFY_TOKEN: &str = "T1";

const REQUIRED_ENV: [(&str, &str); 4] = [
    ("REPLYHOOK_APP_ID", "spec-app"),
    ("REPLYHOOK_APP_SECRET", "spec-secret"),
    ("REPLYHOOK_REDIRECT_URI", "http://127.0.0.1/auth/callback"),
    ("REPLYHOOK_VERIFY_TOKEN", VERIFY_TOKEN),
];

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times; only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Resolve the path to the compiled `replyhook` binary.
pub fn replyhook_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("replyhook")
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// A running `replyhook` process that is killed on drop.
pub struct ReplyhookProcess {
    child: Child,
    port: u16,
}

/// Builder for the environment a [`ReplyhookProcess`] starts with.
///
/// By default every required setting is present and the platform API points
/// at a closed local port, so nothing leaves the machine.
#[derive(Default)]
pub struct ReplyhookBuilder {
    removed: Vec<String>,
    overrides: Vec<(String, String)>,
}

impl ReplyhookBuilder {
    /// Start without `var` set.
    pub fn without(mut self, var: &str) -> Self {
        self.removed.push(var.to_owned());
        self
    }

    /// Set `var` to `value`, replacing any default.
    pub fn env(mut self, var: &str, value: &str) -> Self {
        self.overrides.push((var.to_owned(), value.to_owned()));
        self
    }

    pub fn spawn(self) -> anyhow::Result<ReplyhookProcess> {
        ensure_crypto();
        let binary = replyhook_binary();
        anyhow::ensure!(binary.exists(), "replyhook binary not found at {}", binary.display());

        let port = free_port()?;
        let mut cmd = Command::new(&binary);
        cmd.args(["--host", "127.0.0.1", "--port", &port.to_string()])
            .env("REPLYHOOK_GRAPH_URL", "http://127.0.0.1:9")
            .env("REPLYHOOK_LOG_FORMAT", "text")
            .env("REPLYHOOK_LOG_LEVEL", "warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        for (var, value) in REQUIRED_ENV {
            cmd.env(var, value);
        }
        for (var, value) in &self.overrides {
            cmd.env(var, value);
        }
        for var in &self.removed {
            cmd.env_remove(var);
        }

        Ok(ReplyhookProcess { child: cmd.spawn()?, port })
    }
}

impl ReplyhookProcess {
    /// Create a builder for a custom environment.
    pub fn build() -> ReplyhookBuilder {
        ReplyhookBuilder::default()
    }

    /// Spawn with the default environment.
    pub fn start() -> anyhow::Result<Self> {
        Self::build().spawn()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL for HTTP requests.
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Poll `/health` until responsive.
    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let client = reqwest::Client::new();
        let url = format!("{}/health", self.base_url());
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("replyhook did not become healthy within {timeout:?}");
            }
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Wait for the process to exit within `timeout`.
    pub async fn wait_exit(
        &mut self,
        timeout: Duration,
    ) -> anyhow::Result<std::process::ExitStatus> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("replyhook did not exit within {timeout:?}");
            }
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Send SIGTERM.
    pub fn terminate(&self) -> anyhow::Result<()> {
        nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(self.child.id() as i32),
            nix::sys::signal::Signal::SIGTERM,
        )?;
        Ok(())
    }
}

impl Drop for ReplyhookProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
