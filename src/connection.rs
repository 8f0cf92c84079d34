//! Connecting the selected interface to a network.
//!
//! # Command Executed
//! ```bash
//! nmcli --colors no device wifi connect <ssid> ifname <interface> [password <password>]
//! ```
//!
//! The password keyword is only passed for a non-empty password; nmcli
//! rejects `password ""` for open networks.

use serde::Serialize;
use tracing::{info, warn};

use crate::nmcli::{CommandOutput, CommandRunner, Tool};

pub const NO_DEVICE_MESSAGE: &str = "no device available";
pub const GENERIC_FAILURE_MESSAGE: &str = "failed to connect";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectResult {
    pub outcome: Outcome,
    pub message: String,
}

impl ConnectResult {
    pub fn success(message: impl Into<String>) -> Self {
        ConnectResult {
            outcome: Outcome::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ConnectResult {
            outcome: Outcome::Failure,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// Build the nmcli arguments for a connect attempt.
pub fn connect_args<'a>(interface: &'a str, ssid: &'a str, password: &'a str) -> Vec<&'a str> {
    let mut args = vec![
        "--colors", "no", "device", "wifi", "connect", ssid, "ifname", interface,
    ];
    if !password.is_empty() {
        args.push("password");
        args.push(password);
    }
    args
}

/// Ask nmcli to join `ssid` on `interface`.
///
/// The exit status is ignored: any stderr means failure (even alongside
/// stdout), otherwise any stdout means success, otherwise failure.
pub async fn connect(
    runner: &dyn CommandRunner,
    interface: &str,
    ssid: &str,
    password: &str,
) -> ConnectResult {
    if interface.is_empty() {
        return ConnectResult::failure(NO_DEVICE_MESSAGE);
    }

    let result = match runner
        .run(Tool::Nmcli, &connect_args(interface, ssid, password))
        .await
    {
        Ok(output) => classify(&output),
        Err(e) => ConnectResult::failure(e.to_string()),
    };

    if result.is_success() {
        info!(device = interface, ssid, "connected");
    } else {
        warn!(device = interface, ssid, message = %result.message, "connect failed");
    }
    result
}

fn classify(output: &CommandOutput) -> ConnectResult {
    if !output.stderr.is_empty() {
        ConnectResult::failure(output.stderr.clone())
    } else if !output.stdout.is_empty() {
        ConnectResult::success(output.stdout.clone())
    } else {
        ConnectResult::failure(GENERIC_FAILURE_MESSAGE)
    }
}
