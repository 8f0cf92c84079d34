//! Connection status of the selected interface.
//!
//! # Commands Executed
//! ```bash
//! nmcli -g GENERAL.STATE device show <interface>
//! nmcli -g GENERAL.CONNECTION device show <interface>   # only when connected
//! nmcli -g IP4.ADDRESS device show <interface>          # only when connected
//! ```

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::interface::normalize_connection;
use crate::nmcli::{query, CommandRunner, Tool};

/// Placeholder shown for the SSID and IP when there is nothing to report.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusKind {
    Connected,
    Disconnected,
    Error,
    NoDevice,
}

impl StatusKind {
    pub fn label(self) -> &'static str {
        match self {
            StatusKind::Connected => "Connected",
            StatusKind::Disconnected => "Disconnected",
            StatusKind::Error => "Error",
            StatusKind::NoDevice => "No device",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WifiStatus {
    pub status: StatusKind,
    pub ssid: String,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WifiStatus {
    pub fn no_device() -> Self {
        Self::without_details(StatusKind::NoDevice)
    }

    pub fn disconnected() -> Self {
        Self::without_details(StatusKind::Disconnected)
    }

    pub fn error(message: impl Into<String>) -> Self {
        WifiStatus {
            error: Some(message.into()),
            ..Self::without_details(StatusKind::Error)
        }
    }

    fn without_details(status: StatusKind) -> Self {
        WifiStatus {
            status,
            ssid: NOT_AVAILABLE.to_string(),
            ip: NOT_AVAILABLE.to_string(),
            error: None,
        }
    }
}

/// Whether a raw nmcli state string counts as connected.
///
/// Case-insensitive substring match, so "connected (externally)" qualifies.
/// Note that "disconnected" matches too.
pub fn state_reports_connected(state: &str) -> bool {
    state.to_lowercase().contains("connected")
}

/// Status of `interface`; an empty name means no device is selected.
pub async fn get_status(runner: &dyn CommandRunner, interface: &str) -> WifiStatus {
    if interface.is_empty() {
        return WifiStatus::no_device();
    }

    match query_status(runner, interface).await {
        Ok(status) => status,
        Err(e) => {
            warn!(device = interface, error = %e, "status query failed");
            WifiStatus::error(e.to_string())
        }
    }
}

async fn query_status(runner: &dyn CommandRunner, interface: &str) -> Result<WifiStatus> {
    let state = show_field(runner, interface, "GENERAL.STATE").await?;
    if !state_reports_connected(&state) {
        return Ok(WifiStatus::disconnected());
    }

    let (connection, ip) = tokio::try_join!(
        show_field(runner, interface, "GENERAL.CONNECTION"),
        show_field(runner, interface, "IP4.ADDRESS"),
    )?;

    Ok(WifiStatus {
        status: StatusKind::Connected,
        ssid: or_not_available(normalize_connection(&connection)),
        ip: or_not_available(ip),
        error: None,
    })
}

async fn show_field(runner: &dyn CommandRunner, interface: &str, field: &str) -> Result<String> {
    query(runner, Tool::Nmcli, &["-g", field, "device", "show", interface]).await
}

fn or_not_available(value: String) -> String {
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nmcli::mock::MockRunner;

    const STATE: &str = "nmcli -g GENERAL.STATE device show wlan0";
    const CONNECTION: &str = "nmcli -g GENERAL.CONNECTION device show wlan0";
    const ADDRESS: &str = "nmcli -g IP4.ADDRESS device show wlan0";

    #[test]
    fn connected_predicate_is_case_insensitive_substring() {
        assert!(state_reports_connected("connected"));
        assert!(state_reports_connected("100 (Connected)"));
        assert!(state_reports_connected("connected (externally)"));
        assert!(state_reports_connected("30 (disconnected)"));
        assert!(!state_reports_connected("unavailable"));
        assert!(!state_reports_connected(""));
    }

    #[tokio::test]
    async fn empty_name_is_no_device_without_queries() {
        let runner = MockRunner::new();
        let status = get_status(&runner, "").await;
        assert_eq!(status, WifiStatus::no_device());
        assert_eq!(status.ssid, "N/A");
        assert_eq!(status.ip, "N/A");
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn connected_device_reports_ssid_and_ip() {
        let runner = MockRunner::new()
            .ok(STATE, "100 (connected)\n")
            .ok(CONNECTION, "HomeNet\n")
            .ok(ADDRESS, "192.168.1.23/24\n");

        let status = get_status(&runner, "wlan0").await;
        assert_eq!(status.status, StatusKind::Connected);
        assert_eq!(status.ssid, "HomeNet");
        assert_eq!(status.ip, "192.168.1.23/24");
        assert_eq!(status.error, None);
    }

    #[tokio::test]
    async fn connected_without_address_shows_placeholder() {
        let runner = MockRunner::new()
            .ok(STATE, "100 (connected (externally))\n")
            .ok(CONNECTION, "HomeNet\n")
            .ok(ADDRESS, "\n");

        let status = get_status(&runner, "wlan0").await;
        assert_eq!(status.status, StatusKind::Connected);
        assert_eq!(status.ip, "N/A");
    }

    #[tokio::test]
    async fn other_states_are_disconnected() {
        let runner = MockRunner::new().ok(STATE, "20 (unavailable)\n");
        let status = get_status(&runner, "wlan0").await;
        assert_eq!(status, WifiStatus::disconnected());
        assert_eq!(runner.calls(), vec![STATE.to_string()]);
    }

    #[tokio::test]
    async fn query_failure_surfaces_error_message() {
        let runner = MockRunner::new().fail(STATE, "Error: Device 'wlan0' not found.");
        let status = get_status(&runner, "wlan0").await;
        assert_eq!(status.status, StatusKind::Error);
        assert_eq!(status.ssid, "N/A");
        assert_eq!(status.ip, "N/A");
        assert!(status.error.unwrap().contains("Device 'wlan0' not found"));
    }

    #[tokio::test]
    async fn failure_after_connected_state_is_still_an_error() {
        let runner = MockRunner::new()
            .ok(STATE, "100 (connected)\n")
            .ok(CONNECTION, "HomeNet\n")
            .timeout(ADDRESS);

        let status = get_status(&runner, "wlan0").await;
        assert_eq!(status.status, StatusKind::Error);
        assert!(status.error.unwrap().contains("did not finish"));
    }
}
