use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use wifi_panel::{
    config::{self, Config},
    connection, scan, server,
    status::{self, WifiStatus},
    DeviceSelector, SystemRunner,
};

#[derive(Parser)]
#[command(name = "wifi-panel")]
#[command(about = "Local web control panel for selecting and connecting WiFi interfaces")]
#[command(version)]
struct Cli {
    /// Config file to use (defaults to <config dir>/wifi-panel/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "wifi_panel=trace" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Timeout in seconds for each nmcli/iw invocation
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web control panel
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind to
        #[arg(short, long)]
        bind: Option<String>,

        /// Interface to select initially (validated like any other selection)
        #[arg(short, long)]
        interface: Option<String>,
    },

    /// List wireless interfaces with their mode and active connection
    ListInterfaces {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show connection status
    Status {
        /// Interface to check (defaults to the auto-selected interface)
        #[arg(short, long)]
        interface: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List networks visible to an interface
    Scan {
        /// Interface to scan with (defaults to the auto-selected interface)
        #[arg(short, long)]
        interface: Option<String>,
    },

    /// Connect to a WiFi network
    Connect {
        /// SSID of the network to connect to
        ssid: String,

        /// Password for the network (omit for open networks)
        #[arg(short, long)]
        password: Option<String>,

        /// Interface to use (defaults to the auto-selected interface)
        #[arg(short, long)]
        interface: Option<String>,
    },

    /// Show the effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let mut cfg = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(secs) = cli.timeout {
        if secs == 0 {
            bail!("--timeout must be greater than zero");
        }
        cfg.command_timeout_secs = secs;
    }

    match cli.command {
        Commands::Serve {
            port,
            bind,
            interface,
        } => cmd_serve(cfg, port, bind, interface).await,
        Commands::ListInterfaces { json } => cmd_list_interfaces(&cfg, json).await,
        Commands::Status { interface, json } => {
            cmd_status(&cfg, interface.as_deref(), json).await
        }
        Commands::Scan { interface } => cmd_scan(&cfg, interface.as_deref()).await,
        Commands::Connect {
            ssid,
            password,
            interface,
        } => cmd_connect(&cfg, &ssid, password.as_deref(), interface.as_deref()).await,
        Commands::ShowConfig => cmd_show_config(&cfg, cli.config),
    }
}

/// Logs go to stderr so command output on stdout stays parseable.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wifi_panel=info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn selector_for(cfg: &Config, initial: Option<String>) -> DeviceSelector {
    DeviceSelector::with_initial(Arc::new(SystemRunner::from_config(cfg)), initial)
}

/// Select `interface` if given (failing loudly if it is rejected), otherwise auto-select.
async fn resolve_interface(selector: &DeviceSelector, interface: Option<&str>) -> Result<String> {
    match interface {
        Some(name) => selector.try_select_device(name).await,
        None => Ok(selector.resolve_selected_device().await.unwrap_or_default()),
    }
}

async fn cmd_serve(
    cfg: Config,
    port: Option<u16>,
    bind: Option<String>,
    interface: Option<String>,
) -> Result<()> {
    let selector = selector_for(&cfg, interface.or(cfg.preferred_interface.clone()));
    let config = server::ServerConfig {
        bind: bind.unwrap_or(cfg.bind),
        port: port.unwrap_or(cfg.port),
    };
    server::run_server(config, selector).await
}

async fn cmd_list_interfaces(cfg: &Config, json: bool) -> Result<()> {
    // Unseeded, so the marker shows what auto-selection picks.
    let selector = selector_for(cfg, None);
    let selection = selector.resolve().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&selection.devices)?);
        return Ok(());
    }

    if selection.devices.is_empty() {
        println!("No WiFi interfaces found.");
        return Ok(());
    }

    println!(
        "  {:<16} {:<14} {:<14} {}",
        "INTERFACE", "STATE", "MODE", "CONNECTION"
    );
    println!("{}", "-".repeat(64));

    for device in &selection.devices {
        let marker = if selection.selected.as_deref() == Some(device.name.as_str()) {
            "*"
        } else {
            " "
        };
        let connection = if device.connection.is_empty() {
            "-"
        } else {
            device.connection.as_str()
        };
        println!(
            "{} {:<16} {:<14} {:<14} {}",
            marker, device.name, device.state, device.mode, connection
        );
    }

    Ok(())
}

async fn cmd_status(cfg: &Config, interface: Option<&str>, json: bool) -> Result<()> {
    let selector = selector_for(cfg, cfg.preferred_interface.clone());
    let name = resolve_interface(&selector, interface).await?;
    let status = status::get_status(selector.runner(), &name).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        display_status(&name, &status);
    }

    Ok(())
}

fn display_status(interface: &str, status: &WifiStatus) {
    println!("Interface: {}", if interface.is_empty() { "(none)" } else { interface });
    println!("Status:    {}", status.status);
    println!("Network:   {}", status.ssid);
    println!("IP:        {}", status.ip);
    if let Some(ref error) = status.error {
        println!("Error:     {}", error);
    }
}

async fn cmd_scan(cfg: &Config, interface: Option<&str>) -> Result<()> {
    let selector = selector_for(cfg, cfg.preferred_interface.clone());
    let name = resolve_interface(&selector, interface).await?;
    if name.is_empty() {
        bail!("No manageable WiFi interface available");
    }

    println!("Scanning on interface: {}", name);
    println!();

    let networks = scan::list_networks(selector.runner(), &name).await;
    if networks.is_empty() {
        println!("No networks found.");
    }
    for ssid in networks {
        println!("{}", ssid);
    }

    Ok(())
}

async fn cmd_connect(
    cfg: &Config,
    ssid: &str,
    password: Option<&str>,
    interface: Option<&str>,
) -> Result<()> {
    let selector = selector_for(cfg, cfg.preferred_interface.clone());
    let name = resolve_interface(&selector, interface).await?;

    if !name.is_empty() {
        println!("Connecting to '{}' on interface {}...", ssid, name);
    }

    let result =
        connection::connect(selector.runner(), &name, ssid, password.unwrap_or_default()).await;

    if !result.is_success() {
        bail!("Connection failed: {}", result.message.trim());
    }
    println!("{}", result.message.trim());

    Ok(())
}

fn cmd_show_config(cfg: &Config, explicit_path: Option<PathBuf>) -> Result<()> {
    let path = match explicit_path {
        Some(path) => path,
        None => config::config_path()?,
    };
    println!("Config file: {}", path.display());
    println!();
    print!("{}", cfg.to_toml()?);

    Ok(())
}
