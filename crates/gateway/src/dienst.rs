//! Dienst-Politiken
//!
//! Login- und Spiel-Gateway teilen sich die Verbindungs-Engine und
//! unterscheiden sich nur in Name, Port und dem Aufraeumen nach einer
//! Trennung.

use std::sync::Arc;

use async_trait::async_trait;
use pinguin_core::VerbindungsId;

use crate::praesenz::Praesenz;

#[async_trait]
pub trait DienstPolitik: Send + Sync {
    fn name(&self) -> &'static str;

    fn port(&self) -> u16;

    /// Laeuft genau einmal, nachdem eine Verbindung geschlossen wurde
    async fn bei_trennung(&self, verbindung: VerbindungsId);
}

/// Login-Gateway: haelt keinen Verbindungszustand
pub struct LoginDienst {
    port: u16,
}

impl LoginDienst {
    pub fn neu(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl DienstPolitik for LoginDienst {
    fn name(&self) -> &'static str {
        "login"
    }

    fn port(&self) -> u16 {
        self.port
    }

    async fn bei_trennung(&self, _verbindung: VerbindungsId) {}
}

/// Spiel-Gateway: raeumt Spielerverzeichnis und Praesenz auf
pub struct SpielDienst {
    port: u16,
    praesenz: Arc<Praesenz>,
}

impl SpielDienst {
    pub fn neu(port: u16, praesenz: Arc<Praesenz>) -> Self {
        Self { port, praesenz }
    }
}

#[async_trait]
impl DienstPolitik for SpielDienst {
    fn name(&self) -> &'static str {
        "spiel"
    }

    fn port(&self) -> u16 {
        self.port
    }

    async fn bei_trennung(&self, verbindung: VerbindungsId) {
        if let Some(spieler) = self.praesenz.trennen(verbindung).await {
            tracing::info!(
                pid = %spieler.pid(),
                username = %spieler.username(),
                "Spieler abgemeldet"
            );
        }
    }
}
