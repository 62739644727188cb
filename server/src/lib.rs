//! pinguin-server – Bibliotheks-Root
//!
//! Verdrahtet Datenbank, Kurzzeitspeicher, Handshake und die beiden Gateways
//! und stellt den Einstiegspunkt fuer Integrationstests bereit.

pub mod config;
pub mod logging;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use config::{Dienst, ServerConfig};
use pinguin_auth::{AnmeldeService, Handshake};
use pinguin_db::{SpielerRepository, SqliteDb};
use pinguin_gateway::{login_gateway, spiel_gateway, GatewayServer, Praesenz, SpielerVerzeichnis};
use pinguin_store::{EphemeralStore, MemoryStore, RedisStore};
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Oeffnet den Kurzzeitspeicher laut `[store]`
///
/// Mit `url` wird ein Redis verwendet, sonst ein Speicher im Prozess. Der
/// reicht nur, wenn beide Gateways hier laufen.
pub async fn store_oeffnen(config: &ServerConfig) -> Result<Arc<dyn EphemeralStore>> {
    match &config.store.url {
        Some(url) => {
            let store = RedisStore::verbinden(url)
                .await
                .with_context(|| format!("Kurzzeitspeicher unter {url} nicht erreichbar"))?;
            Ok(Arc::new(store))
        }
        None if config.getrennter_betrieb() => anyhow::bail!(
            "Getrennter Betrieb ohne [store] url, Handshake-Schluessel waeren nicht geteilt"
        ),
        None => {
            tracing::info!("Kurzzeitspeicher im Prozess");
            Ok(Arc::new(MemoryStore::neu()))
        }
    }
}

/// Gebundene, aber noch nicht laufende Gateways
pub struct Server {
    login: Option<GatewayServer>,
    spiel: Option<GatewayServer>,
}

impl Server {
    /// Oeffnet die Spieler-Datenbank und bindet alle aktivierten Gateways
    pub async fn aufbauen(config: &ServerConfig) -> Result<Self> {
        config.pruefen()?;
        tracing::info!(url = %config.datenbank.url, "Datenbankverbindung wird hergestellt");
        let db = SqliteDb::oeffnen(&config.datenbank_konfig())
            .await
            .context("Spieler-Datenbank nicht verfuegbar")?;
        Self::mit_repository(config, Arc::new(db)).await
    }

    /// Wie [`Server::aufbauen`], aber mit vorgegebenem Spieler-Repository
    pub async fn mit_repository(
        config: &ServerConfig,
        spieler: Arc<dyn SpielerRepository>,
    ) -> Result<Self> {
        config.pruefen()?;
        let store = store_oeffnen(config).await?;
        Self::zusammensetzen(config, spieler, store).await
    }

    /// Bindet die Gateways auf einem bereits geoeffneten Kurzzeitspeicher
    pub async fn zusammensetzen(
        config: &ServerConfig,
        spieler: Arc<dyn SpielerRepository>,
        store: Arc<dyn EphemeralStore>,
    ) -> Result<Self> {
        let handshake = Arc::new(Handshake::neu(store.clone(), config.auth_konfig()));
        let protokoll = config.protokoll();

        let login = if config.dienst_aktiv(Dienst::Login) {
            let anmeldung = Arc::new(AnmeldeService::neu(spieler.clone(), handshake.clone()));
            let zustand = login_gateway(config.netzwerk.login_port, &protokoll, anmeldung);
            let adresse = config.login_bind_adresse()?;
            let server = GatewayServer::binden(Arc::new(zustand), adresse, config.gnadenfrist())
                .await
                .with_context(|| format!("Login-Gateway kann {adresse} nicht binden"))?;
            Some(server)
        } else {
            None
        };

        let spiel = if config.dienst_aktiv(Dienst::Spiel) {
            let praesenz = Arc::new(Praesenz::neu(
                config.dienst_id(),
                Arc::new(SpielerVerzeichnis::neu()),
                store,
            ));
            let zustand =
                spiel_gateway(config.netzwerk.spiel_port, &protokoll, spieler, handshake, praesenz);
            let adresse = config.spiel_bind_adresse()?;
            let server = GatewayServer::binden(Arc::new(zustand), adresse, config.gnadenfrist())
                .await
                .with_context(|| format!("Spiel-Gateway kann {adresse} nicht binden"))?;
            Some(server)
        } else {
            None
        };

        Ok(Self { login, spiel })
    }

    pub fn login_adresse(&self) -> Option<SocketAddr> {
        self.login.as_ref().and_then(|s| s.lokale_adresse().ok())
    }

    pub fn spiel_adresse(&self) -> Option<SocketAddr> {
        self.spiel.as_ref().and_then(|s| s.lokale_adresse().ok())
    }

    /// Laeuft bis `shutdown_rx` `true` meldet und alle Gateways gestoppt sind
    pub async fn laufen(self, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        let mut gateways = JoinSet::new();
        for server in [self.login, self.spiel].into_iter().flatten() {
            gateways.spawn(server.starten(shutdown_rx.clone()));
        }
        if gateways.is_empty() {
            anyhow::bail!("Kein Gateway aktiviert ([netzwerk] dienste ist leer)");
        }

        while let Some(ergebnis) = gateways.join_next().await {
            ergebnis.context("Gateway-Task abgestuerzt")??;
        }
        Ok(())
    }

    /// Laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown-Signal empfangen, Server wird beendet"),
                Err(e) => tracing::error!(fehler = %e, "Signal-Handler fehlgeschlagen"),
            }
            let _ = shutdown_tx.send(true);
        });

        self.laufen(shutdown_rx).await
    }
}
