use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, bail};
use log::warn;

use crate::feed::opt_env;

type PrepareAction = Box<dyn Fn() -> Result<()> + Send + Sync>;

// One-shot gate around external environment preparation (browser
// provisioning in the original deployment). The marker file makes the
// gate idempotent across processes; a failed preparation is a warning,
// never a reason to skip the fetch that follows.
pub struct PreparationGate {
    marker: PathBuf,
    action: PrepareAction,
}

impl PreparationGate {
    pub fn new(
        marker: impl Into<PathBuf>,
        action: impl Fn() -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            marker: marker.into(),
            action: Box::new(action),
        }
    }

    pub fn from_env() -> Option<Self> {
        let command = opt_env("PANEL_PREPARE_CMD")?;
        let marker =
            opt_env("PANEL_PREPARE_MARKER").unwrap_or_else(|| ".panel_env_ready".to_string());
        Some(Self::new(marker, move || run_prepare_command(&command)))
    }

    pub fn ensure_ready(&self) {
        if self.marker.exists() {
            return;
        }
        match (self.action)() {
            Ok(()) => {
                if let Err(err) = fs::write(&self.marker, b"ready\n") {
                    warn!(
                        "could not persist preparation marker {}: {err}",
                        self.marker.display()
                    );
                }
            }
            Err(err) => warn!("environment preparation failed, continuing anyway: {err:#}"),
        }
    }
}

fn run_prepare_command(raw: &str) -> Result<()> {
    let mut parts = raw.split_whitespace();
    let program = parts.next().context("empty preparation command")?;
    let status = Command::new(program)
        .args(parts)
        .status()
        .with_context(|| format!("failed to launch '{program}'"))?;
    if !status.success() {
        bail!("'{program}' exited with {status}");
    }
    Ok(())
}
