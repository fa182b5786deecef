pub mod cli;
pub mod clients;
pub mod config;
pub mod controller;
pub mod credential;
pub mod error;
pub mod models;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cli::view::TerminalView;
use cli::{Cli, Commands, KeyCommands};
use clients::registry::RegistryClient;
pub use config::Config;
use controller::{Controller, View};
use credential::{CredentialStore, FileCredentialStore, OverlayCredentialStore};
pub use error::AdminError;
use models::LicenseAction;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    if matches!(command, Commands::Init) {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| std::path::PathBuf::from(config::CONFIG_FILE));
        if Config::init_at(&path)? {
            println!("✓ Config file created. Edit {} and run again.", path.display());
        } else {
            println!("{} already exists.", path.display());
        }
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env();
    if let Some(url) = cli.url {
        config.registry.base_url = url;
    }
    config.validate()?;

    init_tracing(&config);

    let store = FileCredentialStore::new(config.credential.resolved_path());
    debug!(path = %store.path().display(), "Using credential file");
    let credentials: Arc<dyn CredentialStore> = Arc::new(OverlayCredentialStore::new(
        store,
        config::env_api_key().unwrap_or_default(),
    ));

    let client = RegistryClient::new(&config.registry, Arc::clone(&credentials))
        .context("Failed to create registry client")?;

    let assume_yes = matches!(
        command,
        Commands::Delete { yes: true, .. } | Commands::Action { yes: true, .. }
    );
    let view: Arc<dyn View> = Arc::new(TerminalView::new(assume_yes));
    let controller = Controller::new(client.clone(), Arc::clone(&credentials), view);

    match command {
        Commands::List { filter } => cli::cmd_list(&controller, filter.as_deref()).await,
        Commands::Add { email, inactive } => cli::cmd_add(&controller, &email, !inactive).await,
        Commands::Activate { email } => {
            cli::cmd_action(&controller, LicenseAction::Activate, &email).await
        }
        Commands::Deactivate { email } => {
            cli::cmd_action(&controller, LicenseAction::Deactivate, &email).await
        }
        Commands::Delete { email, .. } => {
            cli::cmd_action(&controller, LicenseAction::Delete, &email).await
        }
        Commands::Action { action, email, .. } => {
            cli::cmd_action(&controller, action, &email).await
        }
        Commands::Key { command } => match command {
            KeyCommands::Set { value } => cli::cmd_key_set(&controller, &value).await,
            KeyCommands::Show => {
                cli::cmd_key_show(credentials.as_ref());
                Ok(())
            }
            KeyCommands::Clear => cli::cmd_key_clear(&controller).await,
        },
        Commands::Health => cli::cmd_health(&client).await,
        Commands::Init => Ok(()),
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
