//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::net::SocketAddr;
use std::time::Duration;

use pinguin_auth::AuthKonfig;
use pinguin_core::DienstId;
use pinguin_db::DatenbankKonfig;
use pinguin_gateway::ProtokollKonfig;
use serde::{Deserialize, Serialize};

use crate::logging::{log_format_gueltig, log_level_gueltig};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerEinstellungen,
    pub netzwerk: NetzwerkEinstellungen,
    /// Protokoll-Parameter des Spiels (Random-Key, Client-Versionen)
    pub spiel: SpielEinstellungen,
    pub auth: AuthEinstellungen,
    pub store: StoreEinstellungen,
    pub datenbank: DatenbankEinstellungen,
    pub shutdown: ShutdownEinstellungen,
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Instanz-ID des Spiel-Gateways (Schluessel in der Population)
    pub dienst_id: u16,
    /// Kapazitaet des Spiel-Gateways fuer die Population-Buckets
    pub max_spieler: u32,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Pinguin".into(),
            dienst_id: 9913,
            max_spieler: 500,
        }
    }
}

/// Welche Gateways dieser Prozess betreibt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dienst {
    Login,
    Spiel,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    pub bind_adresse: String,
    pub login_port: u16,
    pub spiel_port: u16,
    /// Maximale Frame-Laenge ohne NUL-Terminator
    pub max_frame_bytes: usize,
    pub dienste: Vec<Dienst>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            login_port: 6112,
            spiel_port: 9913,
            max_frame_bytes: 64 * 1024,
            dienste: vec![Dienst::Login, Dienst::Spiel],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpielEinstellungen {
    pub random_key: String,
    pub vanilla_version: u16,
    pub legacy_version: u16,
    /// Tage, die ein nicht aktivierter Account spielen darf
    pub preaktivierung_tage: u32,
}

impl Default for SpielEinstellungen {
    fn default() -> Self {
        Self {
            random_key: "houdini".into(),
            vanilla_version: 153,
            legacy_version: 152,
            preaktivierung_tage: 7,
        }
    }
}

/// Lebensdauern der Handshake-Schluessel und Flood-Drosselung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEinstellungen {
    pub auth_ttl_sek: u64,
    pub loginkey_ttl_sek: u64,
    pub flood_limit: u64,
    pub flood_fenster_sek: u64,
}

impl Default for AuthEinstellungen {
    fn default() -> Self {
        Self {
            auth_ttl_sek: 180,
            loginkey_ttl_sek: 3600,
            flood_limit: 3,
            flood_fenster_sek: 3600,
        }
    }
}

/// Gemeinsamer Kurzzeitspeicher
///
/// Ohne `url` haelt der Prozess den Speicher selbst. Das reicht nur, wenn
/// Login- und Spiel-Gateway im selben Prozess laufen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreEinstellungen {
    /// z.B. `redis://127.0.0.1:6379/0`
    pub url: Option<String>,
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    pub sqlite_wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: "sqlite://pinguin.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownEinstellungen {
    /// Wartezeit fuer laufende Verbindungen nach dem Shutdown-Signal
    pub gnadenfrist_ms: u64,
}

impl Default for ShutdownEinstellungen {
    fn default() -> Self {
        Self { gnadenfrist_ms: 500 }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft Kombinationen, die serde allein nicht abfangen kann
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if self.netzwerk.dienste.is_empty() {
            anyhow::bail!("[netzwerk] dienste ist leer, kein Gateway aktiviert");
        }
        if self.getrennter_betrieb() && self.store.url.is_none() {
            anyhow::bail!(
                "Nur ein Gateway aktiviert, aber [store] url fehlt: \
                 Login- und Spiel-Gateway brauchen einen gemeinsamen Kurzzeitspeicher"
            );
        }
        if !log_level_gueltig(&self.logging.level) {
            anyhow::bail!(
                "Ungueltiger Log-Level '{}' (trace, debug, info, warn, error)",
                self.logging.level
            );
        }
        if !log_format_gueltig(&self.logging.format) {
            anyhow::bail!("Ungueltiges Log-Format '{}' (text, json)", self.logging.format);
        }
        Ok(())
    }

    /// `true` wenn dieser Prozess nur eines der beiden Gateways betreibt
    pub fn getrennter_betrieb(&self) -> bool {
        self.dienst_aktiv(Dienst::Login) != self.dienst_aktiv(Dienst::Spiel)
    }

    pub fn dienst_aktiv(&self, dienst: Dienst) -> bool {
        self.netzwerk.dienste.contains(&dienst)
    }

    pub fn dienst_id(&self) -> DienstId {
        DienstId(self.server.dienst_id)
    }

    pub fn login_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        self.bind_adresse(self.netzwerk.login_port)
    }

    pub fn spiel_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        self.bind_adresse(self.netzwerk.spiel_port)
    }

    fn bind_adresse(&self, port: u16) -> anyhow::Result<SocketAddr> {
        let text = format!("{}:{port}", self.netzwerk.bind_adresse);
        text.parse()
            .map_err(|e| anyhow::anyhow!("Ungueltige Bind-Adresse '{text}': {e}"))
    }

    pub fn gnadenfrist(&self) -> Duration {
        Duration::from_millis(self.shutdown.gnadenfrist_ms)
    }

    pub fn protokoll(&self) -> ProtokollKonfig {
        ProtokollKonfig {
            random_key: self.spiel.random_key.clone(),
            vanilla_version: self.spiel.vanilla_version,
            legacy_version: self.spiel.legacy_version,
            max_frame_bytes: self.netzwerk.max_frame_bytes,
        }
    }

    pub fn auth_konfig(&self) -> AuthKonfig {
        AuthKonfig {
            random_key: self.spiel.random_key.clone(),
            auth_ttl: Duration::from_secs(self.auth.auth_ttl_sek),
            loginkey_ttl: Duration::from_secs(self.auth.loginkey_ttl_sek),
            flood_limit: self.auth.flood_limit,
            flood_fenster: Duration::from_secs(self.auth.flood_fenster_sek),
            max_spieler: self.server.max_spieler,
            preaktivierung_tage: self.spiel.preaktivierung_tage,
        }
    }

    pub fn datenbank_konfig(&self) -> DatenbankKonfig {
        DatenbankKonfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
            sqlite_wal: self.datenbank.sqlite_wal,
        }
    }
}
