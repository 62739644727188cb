//! pinguin-store – Gemeinsamer Kurzzeitspeicher der Gateways
//!
//! Login- und Spiel-Gateway teilen sich einen Speicher fuer Einmal-Schluessel,
//! Flood-Zaehler und Population. Alle Mehrfach-Operationen laufen als
//! [`Transaktion`]: entweder werden alle Befehle angewendet oder keiner.
//!
//! [`MemoryStore`] haelt alles im Prozess, [`RedisStore`] teilt den Speicher
//! zwischen getrennt laufenden Gateway-Prozessen.

pub mod befehl;
pub mod error;
pub mod netzwerk;
pub mod schluessel;
pub mod speicher;

pub use befehl::{Befehl, Transaktion, Wert};
pub use error::{StoreError, StoreResult};
pub use netzwerk::RedisStore;
pub use speicher::MemoryStore;

use async_trait::async_trait;

/// Vertrag fuer den gemeinsamen Kurzzeitspeicher
///
/// Implementierungen muessen `ausfuehren` atomar umsetzen. Die Antwort
/// enthaelt pro Befehl genau einen [`Wert`] in Befehlsreihenfolge.
#[async_trait]
pub trait EphemeralStore: Send + Sync {
    async fn ausfuehren(&self, transaktion: Transaktion) -> StoreResult<Vec<Wert>>;

    /// Liest einen Text-Wert
    async fn lesen(&self, schluessel: &str) -> StoreResult<Option<String>> {
        let mut werte = self.ausfuehren(Transaktion::neu().get(schluessel)).await?;
        Ok(werte.pop().and_then(Wert::in_text))
    }
}
