//! Token Gate service
//!
//! Reads configuration from TOML (~/.config/token-gate/config.toml or
//! `TOKEN_GATE_CONFIG`) and the signing secret from the environment.

use tracing::{error, info, warn};

use token_gate::config::{process_env, CONFIG_PATH_VAR};
use token_gate::{default_config_path, init_tracing, AppConfig, ServerHandle, ServerOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var(CONFIG_PATH_VAR)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());

    let (mut config, missing_file) = if config_path.exists() {
        (AppConfig::load(&config_path)?, None)
    } else {
        (AppConfig::default(), Some(config_path.display().to_string()))
    };
    config.apply_overrides(process_env)?;

    init_tracing(&config);
    match missing_file {
        None => info!("configuration loaded from {}", config_path.display()),
        Some(path) => warn!("no config file at {}, using defaults", path),
    }

    let handle = match ServerHandle::start(ServerOptions { config }, process_env).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("refusing to start: {}", e);
            return Err(e.into());
        }
    };

    handle.install_signal_handler();
    info!("press Ctrl+C to shut down");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
