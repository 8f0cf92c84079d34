//! Selection of the interface the panel manages.
//!
//! The selected interface name is shared by every request. It is only ever
//! read or written while holding one async mutex, and the lock is held
//! across the inventory fetch so that a validation pass and an explicit
//! selection can never interleave.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::PanelError;
use crate::interface::{find_device, list_wireless_devices, WirelessDevice};
use crate::nmcli::CommandRunner;

/// Inventory snapshot together with the selection reconciled against it.
#[derive(Debug, Clone)]
pub struct Selection {
    pub devices: Vec<WirelessDevice>,
    pub selected: Option<String>,
}

pub struct DeviceSelector {
    runner: Arc<dyn CommandRunner>,
    state: Mutex<SelectionState>,
}

#[derive(Debug, Default)]
struct SelectionState {
    name: Option<String>,
    /// False while `name` is an unchecked seed.
    validated: bool,
}

impl DeviceSelector {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self::with_initial(runner, None)
    }

    /// Seed the selection. The seed is validated on first read like any other value.
    pub fn with_initial(runner: Arc<dyn CommandRunner>, initial: Option<String>) -> Self {
        let name = initial
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        DeviceSelector {
            runner,
            state: Mutex::new(SelectionState {
                validated: name.is_none(),
                name,
            }),
        }
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// The stored selection. Only an unchecked seed triggers an inventory read.
    pub async fn current(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        if !state.validated {
            self.reconcile_locked(&mut state).await;
        }
        state.name.clone()
    }

    pub async fn resolve_selected_device(&self) -> Option<String> {
        self.resolve().await.selected
    }

    /// Re-read the inventory and reconcile the stored selection against it.
    pub async fn resolve(&self) -> Selection {
        let mut state = self.state.lock().await;
        let devices = self.reconcile_locked(&mut state).await;
        Selection {
            devices,
            selected: state.name.clone(),
        }
    }

    async fn reconcile_locked(&self, state: &mut SelectionState) -> Vec<WirelessDevice> {
        let devices = list_wireless_devices(self.runner()).await;
        let next = reconcile(state.name.as_deref(), &devices);

        if state.name != next {
            if let Some(previous) = state.name.as_deref() {
                info!(device = previous, "selected interface is no longer usable");
            }
            match next.as_deref() {
                Some(name) => info!(device = name, "auto-selected interface"),
                None => info!("no manageable wireless interface available"),
            }
            state.name = next;
        }
        state.validated = true;

        devices
    }

    /// Explicitly select `name`, replacing any current selection, and return
    /// the stored name.
    ///
    /// Surrounding whitespace is ignored. Fails without touching the selection
    /// when `name` is not in the inventory or is serving a hotspot.
    pub async fn try_select_device(&self, name: &str) -> Result<String> {
        let name = name.trim();
        let mut state = self.state.lock().await;
        let devices = list_wireless_devices(self.runner()).await;

        match find_device(&devices, name) {
            Some(device) if device.is_manageable() => {
                state.name = Some(device.name.clone());
                state.validated = true;
                info!(device = name, "interface selected");
                Ok(device.name.clone())
            }
            Some(_) => Err(PanelError::InterfaceIsAccessPoint(name.to_string()).into()),
            None => Err(PanelError::InterfaceNotFound(name.to_string()).into()),
        }
    }

    /// Same as [`try_select_device`](Self::try_select_device), reporting only success.
    pub async fn select_device(&self, name: &str) -> bool {
        match self.try_select_device(name).await {
            Ok(_) => true,
            Err(e) => {
                info!(device = name, reason = %e, "interface selection rejected");
                false
            }
        }
    }
}

/// Keep `current` if it is still present and not an access point,
/// otherwise fall back to the first manageable device in inventory order.
pub fn reconcile(current: Option<&str>, devices: &[WirelessDevice]) -> Option<String> {
    if let Some(name) = current {
        if find_device(devices, name).is_some_and(WirelessDevice::is_manageable) {
            return Some(name.to_string());
        }
    }

    devices
        .iter()
        .find(|d| d.is_manageable())
        .map(|d| d.name.clone())
}
