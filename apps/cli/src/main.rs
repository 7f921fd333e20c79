use anyhow::Context;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use clap::{Parser, Subcommand};
use parley_chats::ChatService;
use parley_config::{load_from as load_config, AppConfig};
use parley_users::AuthService;
use rand::RngCore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

mod shell;

use shell::Shell;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley chat core (interactive shell by default)")]
struct Cli {
    /// Configuration file; overrides PARLEY_CONFIG and the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin (default)
    Shell,
    /// Run commands from a script file, one per line
    Run { script: PathBuf },
    /// Print the effective configuration with secrets redacted
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing().context("failed to initialise tracing")?;

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            let mut shell = build_shell(config)?;
            info!("reading commands from stdin; type 'help' for a list");
            shell
                .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await
        }
        Commands::Run { script } => {
            let mut shell = build_shell(config)?;
            let file = tokio::fs::File::open(&script)
                .await
                .with_context(|| format!("failed to open script {}", script.display()))?;
            info!(script = %script.display(), "running script");
            shell.run(BufReader::new(file), tokio::io::stdout()).await
        }
        Commands::ShowConfig => {
            println!("{:#?}", config);
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout carries only command results.
fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = SubscriberBuilder::default()
        .with_max_level(Level::INFO)
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
}

fn build_shell(mut config: AppConfig) -> anyhow::Result<Shell> {
    if config.auth.jwt_secret.is_none() {
        warn!("no signing secret configured; tokens will not survive a restart");
        config.auth.jwt_secret = Some(ephemeral_secret());
    }

    let auth = AuthService::from_config(&config.auth).context("failed to initialise auth service")?;
    let chats = ChatService::from_config(&config.chat);

    info!(
        issuer = %config.auth.issuer,
        access_ttl = config.auth.access_token_ttl_seconds,
        "services ready"
    );
    Ok(Shell::new(Arc::new(auth), Arc::new(chats)))
}

fn ephemeral_secret() -> String {
    let mut bytes = [0u8; 48];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
