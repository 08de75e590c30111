use anyhow::Context;
use identity_store::{Config, DbContext};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Si RUST_LOG n'est pas défini, utiliser ces règles par défaut
        tracing_subscriber::EnvFilter::new("info,identity_store=debug")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// ----------------- Main -----------------

fn main() -> anyhow::Result<()> {
    setup_logging();
    tracing::info!("Starting identity-store...");

    let config = Config::from_env()?;
    let db = DbContext::from_config(&config).context("Failed to build connection pool")?;

    match std::env::args().nth(1).as_deref() {
        None | Some("create") => {
            db.ensure_created().context("Failed to create schema")?;
            tracing::info!("🚀 Schema ready");
        }
        Some("drop") => {
            if config.is_production() {
                anyhow::bail!("Refusing to drop the schema in production");
            }
            db.ensure_deleted().context("Failed to drop schema")?;
            tracing::info!("🗑️ Schema dropped");
        }
        Some(other) => anyhow::bail!("Unknown command: {other} (expected `create` or `drop`)"),
    }

    Ok(())
}
