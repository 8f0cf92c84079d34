//! Local web control panel for WiFi interfaces.
//!
//! The panel discovers the wireless interfaces NetworkManager knows about,
//! keeps one of them "selected" for management, and shows its connection
//! status together with the networks it can see. All radio work is done by
//! `nmcli` and `iw`; this crate only orchestrates those calls.
//!
//! # Modules
//!
//! - [`config`] - Configuration file handling
//! - [`connection`] - Connecting the selected interface to a network
//! - [`error`] - Custom error types for the library
//! - [`interface`] - Wireless device inventory
//! - [`nmcli`] - External tool invocation with timeouts
//! - [`scan`] - Listing visible networks
//! - [`selection`] - The shared selected-interface state and its reconciliation
//! - [`server`] - HTTP panel
//! - [`status`] - Connection status of the selected interface
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use wifi_panel::{get_status, DeviceSelector, SystemRunner};
//!
//! # async fn demo() {
//! let runner = Arc::new(SystemRunner::new("nmcli", "iw", Duration::from_secs(8)));
//! let selector = DeviceSelector::new(runner);
//!
//! let selected = selector.resolve_selected_device().await.unwrap_or_default();
//! let status = get_status(selector.runner(), &selected).await;
//! println!("{}: {} ({})", selected, status.status, status.ip);
//! # }
//! ```

/// Configuration loaded from a TOML file in the user's config directory.
pub mod config;

/// Connector: joins a network on the selected interface and classifies the outcome.
pub mod connection;

/// Error module defining custom error types for the library.
/// Uses `thiserror` for ergonomic error handling.
pub mod error;

/// Device inventory: wireless interfaces with their mode and active connection.
pub mod interface;

/// The `CommandRunner` seam over `nmcli`/`iw` and the real process runner.
pub mod nmcli;

/// Network listing for the selected interface.
pub mod scan;

/// Selected-interface state shared by all requests.
pub mod selection;

/// Axum server rendering the control panel with Tera templates.
pub mod server;

/// Status resolution for the selected interface.
pub mod status;

pub use connection::{connect, ConnectResult, Outcome};

pub use error::PanelError;

pub use interface::{list_wireless_devices, DeviceMode, WirelessDevice};

pub use nmcli::{CommandOutput, CommandRunner, SystemRunner, Tool};

pub use scan::list_networks;

pub use selection::{DeviceSelector, Selection};

pub use status::{get_status, state_reports_connected, StatusKind, WifiStatus};
