use clap::Parser;
use scripts::{cli::Cli, errors::ScriptError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    // A missing `.env` is fine, the environment may be set some other way
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(ScriptError::ClientInitialization(format!(
                "error loading .env: {e}"
            )));
        }
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    Cli::parse().run().await
}
