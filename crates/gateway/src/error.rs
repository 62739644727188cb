//! Fehlertypen fuer die Gateways

use pinguin_auth::AuthError;
use pinguin_core::{Fehlerkategorie, PinguinError};
use pinguin_db::DbError;
use pinguin_store::StoreError;
use thiserror::Error;

/// Fehlertyp fuer Verbindungen, Dispatch und Handler
#[derive(Debug, Error)]
pub enum GatewayError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Protokollfehler (Frame nicht parsebar, unbekanntes Format)
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] PinguinError),

    #[error("Authentifizierungsfehler: {0}")]
    Auth(#[from] AuthError),

    #[error("Speicherfehler: {0}")]
    Store(#[from] StoreError),

    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] DbError),

    /// Verletzte interne Invariante (z.B. doppelte Registrierung)
    #[error("Invariante verletzt: {0}")]
    Invariante(String),
}

impl GatewayError {
    pub fn invariante(msg: impl Into<String>) -> Self {
        Self::Invariante(msg.into())
    }

    /// Einordnung in die gemeinsame Taxonomie
    pub fn kategorie(&self) -> Fehlerkategorie {
        match self {
            Self::Io(_) => Fehlerkategorie::Transport,
            Self::Protokoll(e) => e.kategorie(),
            Self::Auth(e) => e.kategorie(),
            Self::Store(e) => e.kategorie(),
            Self::Datenbank(_) => Fehlerkategorie::Authentifizierung,
            Self::Invariante(_) => Fehlerkategorie::Invariante,
        }
    }

    /// `true` wenn der Kurzzeitspeicher nicht erreichbar ist
    ///
    /// Solche Fehler werden nicht in eine Antwort umgewandelt, sondern bis
    /// zur Verbindungs-Schleife eskaliert.
    pub fn ist_kritisch(&self) -> bool {
        match self {
            Self::Store(e) => e.ist_kritisch(),
            Self::Auth(e) => e.ist_kritisch(),
            _ => false,
        }
    }
}

/// Result-Typ fuer die Gateways
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kategorien() {
        let io = GatewayError::from(std::io::Error::other("weg"));
        assert_eq!(io.kategorie(), Fehlerkategorie::Transport);
        assert_eq!(
            GatewayError::from(PinguinError::UnbekanntesFormat).kategorie(),
            Fehlerkategorie::UngueltigeNachricht
        );
        assert_eq!(
            GatewayError::invariante("doppelt").kategorie(),
            Fehlerkategorie::Invariante
        );
    }

    #[test]
    fn nur_ausfall_ist_kritisch() {
        let ausfall = GatewayError::from(StoreError::NichtErreichbar("weg".into()));
        assert!(ausfall.ist_kritisch());
        let ueber_auth = GatewayError::from(AuthError::from(StoreError::NichtErreichbar("weg".into())));
        assert!(ueber_auth.ist_kritisch());
        assert!(!GatewayError::from(StoreError::FalscherTyp("k".into())).ist_kritisch());
        assert!(!GatewayError::from(AuthError::Fehlgeschlagen).ist_kritisch());
    }
}
