use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crm_relay::integrations::http::StdinPrompt;
use crm_relay::integrations::providers;
use crm_relay::integrations::token::{demo_user_id, TokenIssuer};
use crm_relay::{AppConfig, ProviderId, RawFormFields, Session, SessionError};

#[derive(Parser)]
#[command(name = "crm-relay", version, about = "Relay contacts into a connected CRM")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "CRM_RELAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the CRMs that can be connected
    Providers,
    /// Print a freshly issued gateway token
    Token {
        #[arg(long)]
        user_name: Option<String>,
    },
    /// Connect a CRM and create one contact in it
    Send {
        #[arg(long)]
        provider: ProviderId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: String,
        #[arg(long)]
        pronouns: Option<String>,
        /// Also print the raw run result
        #[arg(long)]
        details: bool,
    },
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let path = match path {
        Some(p) => p,
        None => AppConfig::default_path()?,
    };
    log::debug!("Using config {}", path.display());
    Ok(AppConfig::load(&path))
}

async fn send(config: &AppConfig, provider: ProviderId, raw: RawFormFields, details: bool) -> anyhow::Result<()> {
    let session = Session::bootstrap(config, Arc::new(StdinPrompt)).context("failed to start session")?;

    session.connect(provider).await?;
    println!("✓ Connected to {}", provider.display_name());
    println!("Sending to {}...", provider.display_name());

    match session.submit(raw).await {
        Ok(_) => {}
        Err(SessionError::ValidationFailed(errors)) => {
            for (field, error) in errors.iter() {
                eprintln!("⚠ {}: {}", field, error.message);
            }
            anyhow::bail!("contact form is invalid");
        }
        Err(e @ SessionError::RemoteFlowError(_)) => {
            if let Some(outcome) = session.outcome() {
                eprintln!("{}", outcome.render());
            }
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    }

    if let Some(outcome) = session.outcome() {
        println!("{}", outcome.render());
        if details {
            if let Some(raw) = outcome.details() {
                println!("{}", raw);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Providers => {
            for p in providers() {
                println!("{:<10} {:<10} {}", p.id, p.name, p.description);
            }
        }
        Command::Token { user_name } => {
            let config = load_config(cli.config)?;
            let issuer = TokenIssuer::from_config(&config)?;
            let user_name = user_name.unwrap_or_else(|| config.user_name.clone());
            println!("{}", issuer.issue(&demo_user_id(), &user_name)?);
        }
        Command::Send {
            provider,
            name,
            email,
            phone,
            company,
            pronouns,
            details,
        } => {
            let config = load_config(cli.config)?;
            let raw = RawFormFields {
                name,
                email,
                phone,
                company,
                pronouns,
            };
            send(&config, provider, raw, details).await?;
        }
    }

    Ok(())
}
