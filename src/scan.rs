//! Networks visible to the selected interface.
//!
//! # Command Executed
//! ```bash
//! nmcli --colors no -m multiline --get-value SSID device wifi list ifname <interface>
//! ```
//!
//! Results are returned in scan order. Hidden networks (empty SSID) are
//! dropped; duplicates reported by the scan are kept.

use anyhow::Result;
use tracing::warn;

use crate::interface::unescape_terse;
use crate::nmcli::{query, CommandRunner, Tool};

/// List the SSIDs currently visible to `interface`.
///
/// Returns an empty list for an empty interface name and when the scan fails.
pub async fn list_networks(runner: &dyn CommandRunner, interface: &str) -> Vec<String> {
    if interface.is_empty() {
        return Vec::new();
    }

    match scan_ssids(runner, interface).await {
        Ok(ssids) => ssids,
        Err(e) => {
            warn!(device = interface, error = %e, "network scan failed");
            Vec::new()
        }
    }
}

async fn scan_ssids(runner: &dyn CommandRunner, interface: &str) -> Result<Vec<String>> {
    let stdout = query(
        runner,
        Tool::Nmcli,
        &[
            "--colors", "no", "-m", "multiline", "--get-value", "SSID", "device", "wifi", "list",
            "ifname", interface,
        ],
    )
    .await?;
    Ok(parse_ssids(&stdout))
}

/// Each line is either `SSID:<name>` or a bare name depending on the nmcli
/// version; the name itself carries terse-mode escaping.
fn parse_ssids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|line| line.strip_prefix("SSID:").unwrap_or(line))
        .filter(|ssid| !ssid.is_empty())
        .map(unescape_terse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nmcli::mock::MockRunner;

    const SCAN: &str = "nmcli --colors no -m multiline --get-value SSID device wifi list ifname wlan0";

    #[test]
    fn parse_strips_prefix_and_drops_hidden() {
        let stdout = "SSID:HomeNet\nSSID:\nSSID:Cafe Guest\nHomeNet\n\n";
        assert_eq!(parse_ssids(stdout), vec!["HomeNet", "Cafe Guest", "HomeNet"]);
    }

    #[test]
    fn parse_unescapes_colons_and_backslashes() {
        let stdout = "SSID:Cafe\\:Guest\nC\\\\D\n";
        assert_eq!(parse_ssids(stdout), vec!["Cafe:Guest", "C\\D"]);
    }

    #[tokio::test]
    async fn escaped_ssid_round_trips_into_connect() {
        let runner = MockRunner::new()
            .ok(SCAN, "SSID:Cafe\\:Guest\n")
            .ok(
                "nmcli --colors no device wifi connect Cafe:Guest ifname wlan0",
                "Device 'wlan0' successfully activated.",
            );
        let networks = list_networks(&runner, "wlan0").await;
        assert_eq!(networks, vec!["Cafe:Guest"]);

        let result = crate::connection::connect(&runner, "wlan0", &networks[0], "").await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn empty_interface_skips_scan() {
        let runner = MockRunner::new();
        assert!(list_networks(&runner, "").await.is_empty());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn scan_preserves_order_and_duplicates() {
        let runner = MockRunner::new().ok(SCAN, "SSID:Zeta\nSSID:Alpha\nSSID:Zeta\n");
        assert_eq!(list_networks(&runner, "wlan0").await, vec!["Zeta", "Alpha", "Zeta"]);
    }

    #[tokio::test]
    async fn scan_failure_yields_empty_list() {
        let runner = MockRunner::new().fail(SCAN, "Error: wlan0 is unavailable");
        assert!(list_networks(&runner, "wlan0").await.is_empty());

        let runner = MockRunner::new().timeout(SCAN);
        assert!(list_networks(&runner, "wlan0").await.is_empty());
    }
}
