//! Token Gate CLI
//!
//! Runs the authentication service and provides operator tooling.
//!
//! ```sh
//! # Run with default config (~/.config/token-gate/config.toml)
//! token-gate-cli
//!
//! # Custom config path and port
//! token-gate-cli --config /etc/token-gate/config.toml --port 9000
//!
//! # Validate config (including the secret) without starting
//! token-gate-cli --check
//!
//! # Operator tools
//! token-gate-cli generate-secret
//! token-gate-cli hash-password
//! token-gate-cli issue --subject alice --role Member --user-id 42
//! token-gate-cli inspect <token>
//! ```

use std::io::BufRead;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use token_gate::auth::{generate_secret_hex, hash_password, TokenIssuer, TokenVerifier};
use token_gate::config::{process_env, AppConfig, AuthSettings};
use token_gate::server::{init_tracing, state_from_settings, ServerHandle, ServerOptions};
use token_gate::shared::clock::{Clock, SystemClock};

/// Token Gate: bearer-token authentication service.
#[derive(Parser, Debug)]
#[command(
    name = "token-gate-cli",
    version,
    about = "Bearer-token authentication service and operator tools",
    long_about = "Token Gate issues HS256 bearer tokens at login and checks them on every \
                  request.\n\nDefault config: ~/.config/token-gate/config.toml\n\
                  The signing secret is read from JWT_SECRET_KEY (see [security])."
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "TOKEN_GATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit without starting the server.
    #[arg(long)]
    check: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a random hex signing secret.
    GenerateSecret {
        /// Number of random bytes (minimum 32).
        #[arg(long, default_value_t = 32)]
        bytes: usize,
    },
    /// Print a bcrypt hash for a `[[users]]` entry. Reads stdin if no
    /// password is given.
    HashPassword { password: Option<String> },
    /// Issue a token signed with the configured secret.
    Issue {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        token_id: Option<String>,
    },
    /// Verify a token now and print its claims or the failure reason.
    Inspect { token: String },
}

fn load_config(cli: &Cli) -> Result<(AppConfig, PathBuf, bool), Box<dyn std::error::Error>> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(token_gate::default_config_path);

    let (mut config, found) = if path.exists() {
        (AppConfig::load(&path)?, true)
    } else {
        (AppConfig::default(), false)
    };

    config.apply_overrides(process_env)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    Ok((config, path, found))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Command::GenerateSecret { bytes }) => {
            println!("{}", generate_secret_hex(*bytes));
            return Ok(());
        }
        Some(Command::HashPassword { password }) => {
            let password = match password {
                Some(p) => p.clone(),
                None => {
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line)?;
                    line.trim_end_matches(['\r', '\n']).to_string()
                }
            };
            println!("{}", hash_password(&password)?);
            return Ok(());
        }
        _ => {}
    }

    let (config, config_path, found) = load_config(&cli)?;

    match cli.command {
        Some(Command::Issue {
            subject,
            role,
            user_id,
            token_id,
        }) => {
            let settings = AuthSettings::from_config(&config, process_env)?;
            let issuer = TokenIssuer::new(settings.secret, settings.token_lifetime);
            let claims = issuer.claims_for(&subject, &role, &user_id, SystemClock.now(), token_id);
            println!("{}", issuer.issue(&claims)?.as_str());
            return Ok(());
        }
        Some(Command::Inspect { token }) => {
            let settings = AuthSettings::from_config(&config, process_env)?;
            let verifier = TokenVerifier::new(settings.secret);
            match verifier.verify(token.trim(), SystemClock.now()) {
                Ok(claims) => {
                    println!("valid");
                    println!("   sub    : {}", claims.subject);
                    println!("   role   : {}", claims.role);
                    println!("   userId : {}", claims.user_id);
                    println!("   iat    : {}", claims.issued_at);
                    println!("   exp    : {}", claims.expires_at);
                    if let Some(jti) = claims.token_id {
                        println!("   jti    : {}", jti);
                    }
                    return Ok(());
                }
                Err(e) => {
                    eprintln!("invalid: {} ({})", e, e.reason());
                    std::process::exit(1);
                }
            }
        }
        _ => {}
    }

    if cli.check {
        let settings = AuthSettings::from_config(&config, process_env)?;
        state_from_settings(&config, settings.clone())?;
        println!("Configuration is valid");
        println!("   Config file   : {}", config_path.display());
        println!("   Listen address: {}", config.bind_address());
        println!("   Secret        : {} bytes", settings.secret.len());
        println!("   Token lifetime: {} min", settings.token_lifetime.num_minutes());
        println!("   Public routes : {}", settings.public_routes.prefixes().join(", "));
        println!("   Users         : {}", config.users.len());
        println!("   Log level     : {}", config.logging.level);
        return Ok(());
    }

    init_tracing(&config);
    if found {
        info!("configuration loaded from {}", config_path.display());
    } else {
        warn!("no config file at {}, using defaults", config_path.display());
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
