//! Config Exporter launched with `--run`.
//!
//! The command runs through `sh -c` with its output discarded. After a
//! successful run the process is left running for the next invocation;
//! on interrupt or a fatal error it is killed.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::error::CliError;

pub struct ExporterProcess {
    command: String,
    child: Child,
}

impl ExporterProcess {
    pub fn spawn(command: &str) -> Result<Self, CliError> {
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| CliError::ExporterLaunch {
                command: command.to_owned(),
                source,
            })?;
        info!(command, pid = ?child.id(), "launched config exporter");
        Ok(Self {
            command: command.to_owned(),
            child,
        })
    }

    /// Kill the exporter if it is still running.
    pub async fn terminate(mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                info!(command = %self.command, %status, "config exporter already exited");
            }
            _ => match self.child.kill().await {
                Ok(()) => info!(command = %self.command, "config exporter stopped"),
                Err(e) => warn!(command = %self.command, "could not stop config exporter: {e}"),
            },
        }
    }

    /// Leave the exporter running after this process exits.
    pub fn detach(self) {
        info!(
            command = %self.command,
            pid = ?self.child.id(),
            "config exporter left running"
        );
    }
}
