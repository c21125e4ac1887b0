//! Chatlurk - watch several live chat channels side by side
//!
//! Run with `chatlurk [CHANNEL...]` or `chatlurk --help` for usage.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use chatlurk::{
    APP_NAME, VERSION,
    config::Config,
    session::SessionCoordinator,
    source::{MessageSource, OfflineSource, TwitchCredentials, TwitchSource, ingest_queue},
    tui::App,
};

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version = VERSION)]
#[command(about = "A terminal dashboard for watching several live chat channels side by side")]
#[command(long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Channels to open in addition to the configured ones
    channels: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive dashboard (default)
    Tui,

    /// List the configured channels
    Channels,

    /// Show configuration
    Config {
        /// Initialize config file with defaults
        #[arg(long)]
        init: bool,
    },
}

fn setup_logging(debug: bool, log_file: Option<PathBuf>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        // Use info level for our crate, warn for dependencies
        EnvFilter::new("info").add_directive("tokio=warn".parse()?)
    };

    match log_file {
        Some(path) => {
            // Log to file when running TUI (so logs don't interfere with display)
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;

            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(file).with_target(false))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                .with(filter)
                .init();
        }
    }

    Ok(())
}

/// Load the config, reporting whether it came from the user's file
///
/// On failure the defaults are used and the flag is false, so the file that
/// failed to load is not written back over.
fn load_config(path: Option<&PathBuf>) -> (Config, bool) {
    let loaded = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    match loaded {
        Ok(config) => (config, true),
        Err(e) => {
            eprintln!("Warning: Failed to load config, using defaults: {}", e);
            (Config::default(), false)
        }
    }
}

/// Connect, open every startup channel and hand over to the TUI
async fn run_tui(
    config: Config,
    config_path: Option<PathBuf>,
    persist: bool,
    extra: Vec<String>,
) -> Result<()> {
    let (events, ingest) = ingest_queue(config.queue_capacity);
    let credentials = TwitchCredentials::new(config.username.clone(), config.oauth_token.clone());

    let source: Arc<dyn MessageSource> =
        match TwitchSource::connect(&config.server, credentials, events, config.connect_timeout())
            .await
        {
            Ok(source) => Arc::new(source),
            Err(e) => {
                warn!("Running offline, could not reach {}: {}", config.server, e);
                let nick = config.username.clone().unwrap_or_else(|| "me".to_string());
                Arc::new(OfflineSource::new(nick))
            }
        };

    let mut coordinator = SessionCoordinator::new(source, config.max_buffer, config.min_pane_width);
    for channel in config.channels.iter().chain(extra.iter()) {
        if let Err(e) = coordinator.add_channel(channel).await {
            warn!("Skipping channel '{}': {}", channel, e);
        }
    }

    if !persist {
        warn!("Config could not be loaded; channel changes will not be saved this session");
    }
    let mut app = App::new(config, coordinator, ingest)
        .with_config_path(config_path)
        .with_persistence(persist);
    app.run().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre error hooks
    color_eyre::install()?;

    let cli = Cli::parse();

    // Load configuration
    let (config, loaded) = load_config(cli.config.as_ref());
    let debug = cli.debug || config.debug;

    // Ensure required directories exist
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Failed to create directories: {}", e);
    }

    match cli.command {
        None | Some(Commands::Tui) => {
            // Setup logging to file for TUI mode
            setup_logging(debug, Some(config.log_file_path()?))?;

            info!("Starting Chatlurk v{}", VERSION);
            run_tui(config, cli.config, loaded, cli.channels).await?;
        }

        Some(Commands::Channels) => {
            setup_logging(debug, None)?;

            if config.channels.is_empty() {
                println!("No channels configured. Use 'chatlurk <channel>' to open one.");
                return Ok(());
            }

            println!("Channels:");
            for channel in &config.channels {
                println!("  #{}", channel.trim_start_matches('#'));
            }
        }

        Some(Commands::Config { init }) => {
            setup_logging(debug, None)?;

            let path = match cli.config {
                Some(path) => path,
                None => Config::config_file_path()?,
            };

            if init {
                if path.exists() {
                    println!("Config file already exists at {:?}, leaving it alone", path);
                    return Ok(());
                }
                // Defaults only, so environment overrides never reach disk
                Config::default().save_to(&path)?;
                println!("Configuration initialized at {:?}", path);
            } else {
                println!("Configuration:");
                println!("{}", toml::to_string_pretty(&config)?);
                println!("\nConfig file: {:?}", path);
                println!("Log file: {:?}", config.log_file_path()?);
            }
        }
    }

    Ok(())
}
