//! Pinguin Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet die Gateways.

use anyhow::Result;
use pinguin_server::{config::ServerConfig, logging, Server};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("PINGUIN_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = ServerConfig::laden(&config_pfad)?;
    config.pruefen()?;

    logging::logging_initialisieren(&config.logging.level, &config.logging.format)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        name = %config.server.name,
        dienst_id = config.server.dienst_id,
        "Pinguin Server wird initialisiert"
    );

    let server = Server::aufbauen(&config).await?;
    server.starten().await?;

    tracing::info!("Server beendet");
    Ok(())
}
