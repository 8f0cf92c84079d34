use serde::Serialize;
use std::fmt;
use tracing::warn;

use anyhow::Result;

use crate::nmcli::{query, CommandRunner, Tool};

/// Operating mode of a wireless interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceMode {
    Station,
    AccessPoint,
    Unknown,
}

impl DeviceMode {
    /// Map the `type` token printed by `iw dev <name> info`.
    pub fn from_iw_type(token: &str) -> Self {
        match token {
            "managed" => DeviceMode::Station,
            "AP" | "AP/VLAN" => DeviceMode::AccessPoint,
            _ => DeviceMode::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceMode::Station => "station",
            DeviceMode::AccessPoint => "access-point",
            DeviceMode::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Snapshot of one wireless interface as reported at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WirelessDevice {
    pub name: String,
    /// Raw nmcli state, e.g. "connected" or "unavailable".
    pub state: String,
    pub mode: DeviceMode,
    /// Active connection profile, empty when there is none.
    pub connection: String,
}

impl WirelessDevice {
    /// Hotspot interfaces are never managed by the panel.
    pub fn is_manageable(&self) -> bool {
        self.mode != DeviceMode::AccessPoint
    }
}

/// List every wireless device with its mode and active connection.
///
/// Never fails: if the device list itself cannot be read the result is empty,
/// and a failing mode or connection lookup only degrades that one field.
pub async fn list_wireless_devices(runner: &dyn CommandRunner) -> Vec<WirelessDevice> {
    let rows = match list_wifi_rows(runner).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "failed to enumerate network devices");
            return Vec::new();
        }
    };

    let mut devices = Vec::with_capacity(rows.len());
    for (name, state) in rows {
        let (mode, connection) =
            tokio::join!(query_mode(runner, &name), query_connection(runner, &name));
        devices.push(WirelessDevice {
            name,
            state,
            mode,
            connection,
        });
    }
    devices
}

/// Look up a device by name in an inventory snapshot.
pub fn find_device<'a>(devices: &'a [WirelessDevice], name: &str) -> Option<&'a WirelessDevice> {
    devices.iter().find(|d| d.name == name)
}

async fn list_wifi_rows(runner: &dyn CommandRunner) -> Result<Vec<(String, String)>> {
    let stdout = query(runner, Tool::Nmcli, &["-t", "-f", "DEVICE,TYPE,STATE", "device"]).await?;
    Ok(parse_device_list(&stdout))
}

/// Parse `nmcli -t -f DEVICE,TYPE,STATE device` into `(device, state)` pairs
/// for the wifi entries, in listing order.
fn parse_device_list(stdout: &str) -> Vec<(String, String)> {
    stdout
        .lines()
        .filter_map(|line| {
            let fields = split_terse(line);
            if fields.len() >= 3 && fields[1] == "wifi" && !fields[0].is_empty() {
                Some((fields[0].clone(), fields[2].clone()))
            } else {
                None
            }
        })
        .collect()
}

/// Split a terse nmcli line on unescaped colons, resolving `\:` and `\\`.
pub(crate) fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

async fn query_mode(runner: &dyn CommandRunner, name: &str) -> DeviceMode {
    match query(runner, Tool::Iw, &["dev", name, "info"]).await {
        Ok(stdout) => parse_iw_type(&stdout)
            .map(DeviceMode::from_iw_type)
            .unwrap_or(DeviceMode::Unknown),
        Err(e) => {
            warn!(device = name, error = %e, "failed to read interface mode");
            DeviceMode::Unknown
        }
    }
}

fn parse_iw_type(stdout: &str) -> Option<&str> {
    stdout.lines().find_map(|line| {
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("type"), Some(token)) => Some(token),
            _ => None,
        }
    })
}

async fn query_connection(runner: &dyn CommandRunner, name: &str) -> String {
    match query(
        runner,
        Tool::Nmcli,
        &["-g", "GENERAL.CONNECTION", "device", "show", name],
    )
    .await
    {
        Ok(stdout) => normalize_connection(&stdout),
        Err(e) => {
            warn!(device = name, error = %e, "failed to read active connection");
            String::new()
        }
    }
}

/// Resolve the `\:` and `\\` escapes nmcli applies to a single terse value.
pub(crate) fn unescape_terse(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                unescaped.push(escaped);
            }
        } else {
            unescaped.push(c);
        }
    }
    unescaped
}

/// nmcli prints `--` for "no connection" and escapes colons in `-g` output.
pub(crate) fn normalize_connection(raw: &str) -> String {
    let value = unescape_terse(raw.trim());
    if value == "--" { String::new() } else { value }
}
