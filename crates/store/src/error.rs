//! Fehlertypen fuer den Kurzzeitspeicher

use pinguin_core::Fehlerkategorie;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transaktion abgebrochen: {0}")]
    TransaktionAbgebrochen(String),

    #[error("Falscher Typ unter Schluessel '{0}'")]
    FalscherTyp(String),

    #[error("Kein Zahlwert unter Schluessel '{0}'")]
    KeinZahlwert(String),

    #[error("Speicher nicht erreichbar: {0}")]
    NichtErreichbar(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Jeder Store-Fehler bedeutet eine nicht angewendete Transaktion
    pub fn kategorie(&self) -> Fehlerkategorie {
        Fehlerkategorie::Transaktion
    }

    /// `true` wenn der Speicher selbst ausgefallen ist (nicht die Anfrage)
    pub fn ist_kritisch(&self) -> bool {
        matches!(self, Self::NichtErreichbar(_))
    }
}
