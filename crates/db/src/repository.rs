//! Repository-Traits fuer Spieler-Datensaetze
//!
//! Die Gateways lesen nur: Lookup nach Name oder ID, Buddy-Liste und aktive
//! Bans. Schreibende Operationen liegen in `SpielerVerwaltung` und werden von
//! Werkzeugen und Tests genutzt.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pinguin_core::Pid;
use serde::{Deserialize, Serialize};

use crate::error::DbError;
use crate::models::{BanRecord, NeuerBan, SpielerRecord};

/// Result-Alias fuer Datenbankoperationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration der Datenbankverbindung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankKonfig {
    /// Verbindungs-URL (z.B. "sqlite://pinguin.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatenbankKonfig {
    fn default() -> Self {
        Self {
            url: "sqlite://pinguin.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Lesender Zugriff auf Spieler (von beiden Gateways genutzt)
#[async_trait]
pub trait SpielerRepository: Send + Sync {
    /// Spieler anhand des Namens (Gross-/Kleinschreibung egal)
    async fn nach_name(&self, username: &str) -> DbResult<Option<SpielerRecord>>;

    async fn nach_id(&self, id: Pid) -> DbResult<Option<SpielerRecord>>;

    /// PIDs aller Buddies eines Spielers
    async fn buddies(&self, id: Pid) -> DbResult<Vec<Pid>>;

    /// Der am laengsten laufende Ban, der `jetzt` noch aktiv ist
    async fn aktiver_ban(&self, id: Pid, jetzt: DateTime<Utc>) -> DbResult<Option<BanRecord>>;
}

/// Schreibender Zugriff auf Spieler
#[async_trait]
pub trait SpielerVerwaltung: Send + Sync {
    async fn anlegen(&self, spieler: &SpielerRecord) -> DbResult<()>;

    async fn buddy_hinzufuegen(&self, id: Pid, buddy: Pid) -> DbResult<()>;

    async fn ban_anlegen(&self, ban: NeuerBan<'_>) -> DbResult<BanRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_konfig() {
        let cfg = DatenbankKonfig::default();
        assert!(cfg.sqlite_wal);
        assert_eq!(cfg.max_verbindungen, 5);
        assert!(cfg.url.starts_with("sqlite://"));
    }
}
