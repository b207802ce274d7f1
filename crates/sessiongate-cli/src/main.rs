//! sessiongate - a command-line front end for a session-gated web backend.
//!
//! Each subcommand plays the part of one page: it mounts the page, prints
//! the resulting state, then follows whatever navigation the page asked for.

mod commands;
mod render;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sessiongate_core::Config;

use commands::App;

#[derive(Parser)]
#[command(name = "sessiongate")]
#[command(version)]
#[command(about = "Log in, sign up and browse the pages of a sessiongate backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "SESSIONGATE_API_URL")]
    api_url: Option<String>,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the public home page
    Home,

    /// Show the protected service page
    Service,

    /// Log in with email and password, or through Google
    Login {
        /// Email address (prompted for when omitted)
        #[arg(long)]
        email: Option<String>,

        /// Log in with Google instead of a password
        #[arg(long)]
        google: bool,

        /// Ask the backend for the Google URL instead of the identity provider
        #[arg(long, requires = "google")]
        via_backend: bool,
    },

    /// Create an account
    Signup {
        /// Email address (prompted for when omitted)
        #[arg(long)]
        email: Option<String>,
    },

    /// Complete a login from the URL the identity provider redirected to
    Callback {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Forget the stored session
    Logout,

    /// Show whether a session is stored and whether the backend is up
    Status,

    /// Ask the backend to verify the stored token
    Verify,
}

// ============================================================================
// Logging
// ============================================================================

/// Install the subscriber. RUST_LOG controls the level (default `warn`).
/// The returned guard flushes the file log and must outlive `main`'s work.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("Log file path has no file name: {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

fn load_config(api_url: Option<String>) -> Config {
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default().with_env_overrides(|key| std::env::var(key).ok())
    });
    if api_url.is_some() {
        config.api_url = api_url;
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;
    info!("sessiongate starting");

    let config = load_config(cli.api_url);
    let mut app = App::new(&config)?;

    match cli.command {
        Commands::Home => app.home().await,
        Commands::Service => app.service().await,
        Commands::Login {
            email,
            google,
            via_backend,
        } => {
            if google {
                app.login_google(via_backend).await
            } else {
                app.login_password(email).await
            }
        }
        Commands::Signup { email } => app.signup(email).await,
        Commands::Callback { url } => app.callback(&url).await,
        Commands::Logout => app.logout(),
        Commands::Status => app.status().await,
        Commands::Verify => app.verify().await,
    }
}
