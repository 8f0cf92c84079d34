//! External tool invocation.
//!
//! Every radio operation the panel performs is delegated to NetworkManager's
//! `nmcli` (and `iw` for the operating mode of an interface). All of those
//! calls go through the [`CommandRunner`] trait so the rest of the crate can
//! be exercised without touching real hardware.
//!
//! # Failure classes
//!
//! - the program could not be spawned ([`PanelError::ToolSpawn`])
//! - the program did not exit within the configured timeout ([`PanelError::ToolTimeout`])
//! - the program exited non-zero ([`PanelError::ToolFailed`], only via [`query`])
//!
//! [`CommandRunner::run`] reports the first two as `Err` and hands back the raw
//! output otherwise, leaving the exit status for the caller to interpret.

use anyhow::Result;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;
use crate::error::PanelError;

/// The external programs the panel knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Nmcli,
    Iw,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Tool::Nmcli => "nmcli",
            Tool::Iw => "iw",
        }
    }
}

/// Captured result of a finished external invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `tool` with `args` to completion.
    ///
    /// Returns `Err` only when the process could not be started or timed out.
    async fn run(&self, tool: Tool, args: &[&str]) -> Result<CommandOutput>;
}

/// Run a read-only query and return its trimmed stdout.
///
/// A non-zero exit is turned into [`PanelError::ToolFailed`] carrying stderr,
/// so spawn failures, timeouts and failed exits all surface the same way.
pub async fn query(runner: &dyn CommandRunner, tool: Tool, args: &[&str]) -> Result<String> {
    let output = runner.run(tool, args).await?;

    if !output.success {
        let message = if output.stderr.trim().is_empty() {
            "exited with non-zero status".to_string()
        } else {
            output.stderr.trim().to_string()
        };
        return Err(PanelError::ToolFailed {
            program: tool.name().to_string(),
            message,
        }
        .into());
    }

    Ok(output.stdout.trim().to_string())
}

/// Runs the real programs as child processes, each bounded by a timeout.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    nmcli_path: String,
    iw_path: String,
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(nmcli_path: impl Into<String>, iw_path: impl Into<String>, timeout: Duration) -> Self {
        SystemRunner {
            nmcli_path: nmcli_path.into(),
            iw_path: iw_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.nmcli_path.clone(),
            config.iw_path.clone(),
            config.command_timeout(),
        )
    }

    fn program(&self, tool: Tool) -> &str {
        match tool {
            Tool::Nmcli => &self.nmcli_path,
            Tool::Iw => &self.iw_path,
        }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, tool: Tool, args: &[&str]) -> Result<CommandOutput> {
        let program = self.program(tool);
        debug!(program, args = ?redact_args(args), "running command");

        // kill_on_drop reaps the child when the timeout drops the future.
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Err(_) => {
                return Err(PanelError::ToolTimeout {
                    program: program.to_string(),
                    secs: self.timeout.as_secs(),
                }
                .into());
            }
            Ok(Err(e)) => {
                return Err(PanelError::ToolSpawn {
                    program: program.to_string(),
                    message: e.to_string(),
                }
                .into());
            }
            Ok(Ok(output)) => output,
        };

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Copy of `args` with the value following a `password` keyword masked.
pub fn redact_args(args: &[&str]) -> Vec<String> {
    let mut redacted = Vec::with_capacity(args.len());
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            redacted.push("******".to_string());
            mask_next = false;
        } else {
            mask_next = *arg == "password";
            redacted.push((*arg).to_string());
        }
    }
    redacted
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    enum Scripted {
        Output(CommandOutput),
        Timeout,
    }

    /// Answers commands from a script keyed by the full command line
    /// (`"nmcli -g GENERAL.STATE device show wlan0"`) and records every call.
    #[derive(Default)]
    pub(crate) struct MockRunner {
        script: Mutex<HashMap<String, Scripted>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockRunner {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        fn insert(&self, command: &str, response: Scripted) {
            self.script
                .lock()
                .unwrap()
                .insert(command.to_string(), response);
        }

        pub(crate) fn ok(self, command: &str, stdout: &str) -> Self {
            self.set_ok(command, stdout);
            self
        }

        pub(crate) fn set_ok(&self, command: &str, stdout: &str) {
            self.insert(
                command,
                Scripted::Output(CommandOutput {
                    success: true,
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                }),
            );
        }

        pub(crate) fn fail(self, command: &str, stderr: &str) -> Self {
            self.insert(
                command,
                Scripted::Output(CommandOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                }),
            );
            self
        }

        pub(crate) fn output(self, command: &str, output: CommandOutput) -> Self {
            self.insert(command, Scripted::Output(output));
            self
        }

        pub(crate) fn timeout(self, command: &str) -> Self {
            self.insert(command, Scripted::Timeout);
            self
        }

        /// Script a full inventory: the device list plus the mode and
        /// connection sub-queries of each `(name, state, iw type, connection)`.
        pub(crate) fn with_inventory(self, devices: &[(&str, &str, &str, &str)]) -> Self {
            self.set_inventory(devices);
            self
        }

        pub(crate) fn set_inventory(&self, devices: &[(&str, &str, &str, &str)]) {
            let mut listing = String::from("lo:loopback:unmanaged\neth0:ethernet:connected\n");
            for (name, state, iw_type, connection) in devices {
                listing.push_str(&format!("{name}:wifi:{state}\n"));
                self.set_ok(
                    &format!("iw dev {name} info"),
                    &format!("Interface {name}\n\tifindex 3\n\twdev 0x1\n\ttype {iw_type}\n\twiphy 0\n"),
                );
                self.set_ok(
                    &format!("nmcli -g GENERAL.CONNECTION device show {name}"),
                    &format!("{connection}\n"),
                );
            }
            self.set_ok("nmcli -t -f DEVICE,TYPE,STATE device", &listing);
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for MockRunner {
        async fn run(&self, tool: Tool, args: &[&str]) -> Result<CommandOutput> {
            let line = std::iter::once(tool.name())
                .chain(args.iter().copied())
                .collect::<Vec<_>>()
                .join(" ");
            self.calls.lock().unwrap().push(line.clone());

            let scripted = self.script.lock().unwrap().get(&line).cloned();
            match scripted {
                Some(Scripted::Output(output)) => Ok(output),
                Some(Scripted::Timeout) => Err(PanelError::ToolTimeout {
                    program: tool.name().to_string(),
                    secs: 8,
                }
                .into()),
                None => Err(PanelError::ToolSpawn {
                    program: tool.name().to_string(),
                    message: format!("no scripted response for `{line}`"),
                }
                .into()),
            }
        }
    }
}
