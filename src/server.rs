//! Service runtime
//!
//! [`ServerHandle`] owns the whole lifecycle: validate the auth settings,
//! build the router, bind, serve with graceful shutdown. Both binaries use
//! it. Every configuration problem surfaces before a socket is bound.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tracing::{error, info};

use crate::application::identity::{IdentityService, InMemoryCredentialStore};
use crate::auth::gate::AuthenticationGate;
use crate::auth::issuer::{TokenIssuer, UuidTokenIds};
use crate::auth::verifier::TokenVerifier;
use crate::config::{AppConfig, AuthSettings, ConfigError};
use crate::interfaces::http::middleware::AuthState;
use crate::interfaces::http::{create_api_router, AppState};
use crate::shared::clock::{Clock, SystemClock};
use crate::shared::shutdown::{listen_for_shutdown_signals, ShutdownSignal};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Assemble the shared application state from validated configuration.
pub fn build_state<F>(config: &AppConfig, lookup: F) -> Result<AppState, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    state_from_settings(config, AuthSettings::from_config(config, lookup)?)
}

/// Application state for auth settings that were already validated.
pub fn state_from_settings(config: &AppConfig, settings: AuthSettings) -> Result<AppState, ConfigError> {
    let store = InMemoryCredentialStore::from_config(&config.users)?;
    if store.is_empty() {
        info!("no [[users]] configured, login will reject every attempt");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let gate = AuthenticationGate::new(
        TokenVerifier::new(settings.secret.clone()),
        settings.public_routes.clone(),
        clock.clone(),
    );
    let identity = IdentityService::new(
        Arc::new(store),
        TokenIssuer::new(settings.secret, settings.token_lifetime),
        clock,
        Arc::new(UuidTokenIds),
    );

    info!(
        expiration_minutes = settings.token_lifetime.num_minutes(),
        public_routes = ?settings.public_routes.prefixes(),
        "authentication configured"
    );

    Ok(AppState {
        auth: AuthState {
            gate: Arc::new(gate),
        },
        identity: Arc::new(identity),
    })
}

/// Router for `config`, or the configuration error that must stop startup.
pub fn build_router<F>(config: &AppConfig, lookup: F) -> Result<Router, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(create_api_router(build_state(config, lookup)?))
}

/// Options for starting the service.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    pub config: AppConfig,
}

/// Handle to a running service.
pub struct ServerHandle {
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address actually bound (useful with port 0).
    pub local_addr: SocketAddr,

    shutdown: ShutdownSignal,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Validate configuration, bind and start serving in the background.
    ///
    /// `lookup` resolves environment variables such as the secret.
    pub async fn start<F>(opts: ServerOptions, lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = opts.config;
        info!("starting token gate...");

        let router = build_router(&config, lookup)?;

        let addr = config.bind_address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!("listening on http://{}", local_addr);

        let shutdown = ShutdownSignal::new();
        let api_shutdown = shutdown.clone();
        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("http server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("http server error: {}", e);
            }
        });

        Ok(Self {
            config,
            local_addr,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        tokio::spawn(listen_for_shutdown_signals(self.shutdown.clone()));
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Wait for the server task to finish after shutdown was triggered.
    pub async fn wait(self) {
        match self.api_task.await {
            Ok(()) => info!("http server stopped"),
            Err(e) => error!("http server task panicked: {}", e),
        }
        info!("token gate shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the logging config. `RUST_LOG` wins over the
/// configured level.
///
/// Call once at process startup, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
