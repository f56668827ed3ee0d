//! DocChat - document question answering CLI
//!
#![doc = "DocChat - document question answering CLI"]
#![doc = "Main entry point for the docchat client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docchat::cli::{Cli, Commands};
use docchat::commands::{self, Context};
use docchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let mut ctx = Context::new(config)?;
    match run(&mut ctx, cli.command).await {
        Ok(()) => Ok(()),
        Err(e) => Err(commands::handle_failure(&mut ctx, e)),
    }
}

async fn run(ctx: &mut Context, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            tracing::info!("Starting login");
            commands::auth_cmd::login(ctx, email, password).await
        }
        Commands::Logout => commands::auth_cmd::logout(ctx),
        Commands::Whoami => commands::auth_cmd::whoami(ctx).await,
        Commands::Chat {
            session,
            new,
            collection,
        } => {
            tracing::info!("Starting interactive chat mode");
            if let Some(s) = &session {
                tracing::debug!("Opening session: {}", s);
            }
            if let Some(c) = &collection {
                tracing::debug!("Using collection override: {}", c);
            }
            commands::chat::run_chat(ctx, session, new, collection).await
        }
        Commands::Ask {
            question,
            session,
            collection,
            json,
        } => {
            tracing::info!("Asking a single question");
            commands::chat::run_ask(ctx, question, session, collection, json).await
        }
        Commands::Sessions { command } => {
            tracing::info!("Starting sessions command");
            commands::sessions::handle_sessions(ctx, command).await
        }
        Commands::Files { command } => {
            tracing::info!("Starting files command");
            commands::files::handle_files(ctx, command).await
        }
        Commands::Users { command } => {
            tracing::info!("Starting users command");
            commands::users::handle_users(ctx, command).await
        }
        Commands::Dashboard { json } => {
            tracing::info!("Showing dashboard");
            commands::dashboard::show_dashboard(ctx, json).await
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so `--json` output stays machine readable.
fn init_tracing(verbose: bool) {
    let default = if verbose { "docchat=debug" } else { "docchat=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
