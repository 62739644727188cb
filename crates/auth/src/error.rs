//! Fehlertypen fuer Login und Handshake

use pinguin_core::{Fehlerkategorie, PinguinError};
use thiserror::Error;

use crate::anmeldung::Ablehnung;

/// Alle moeglichen Fehler in Login und Handshake
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Login-Pruefung ---
    #[error("Login gedrosselt")]
    Gedrosselt,

    #[error("Login abgelehnt: {0:?}")]
    Abgelehnt(Ablehnung),

    // --- Handshake ---
    /// Absichtlich ohne Details: der Client erfaehrt nie welche Pruefung scheiterte
    #[error("Authentifizierung fehlgeschlagen")]
    Fehlgeschlagen,

    #[error("Transaktion fehlgeschlagen: {0}")]
    Transaktion(String),

    #[error("Invariante verletzt: {0}")]
    Invariante(String),

    // --- Passwort ---
    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    // --- Kollaborateure ---
    #[error("Speicherfehler: {0}")]
    Store(#[from] pinguin_store::StoreError),

    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] pinguin_db::DbError),
}

impl AuthError {
    pub fn transaktion(msg: impl Into<String>) -> Self {
        Self::Transaktion(msg.into())
    }

    pub fn invariante(msg: impl Into<String>) -> Self {
        Self::Invariante(msg.into())
    }

    pub fn kategorie(&self) -> Fehlerkategorie {
        match self {
            Self::Gedrosselt => Fehlerkategorie::Drosselung,
            Self::Abgelehnt(_)
            | Self::Fehlgeschlagen
            | Self::PasswortHashing(_)
            | Self::Datenbank(_) => Fehlerkategorie::Authentifizierung,
            Self::Transaktion(_) | Self::Store(_) => Fehlerkategorie::Transaktion,
            Self::Invariante(_) => Fehlerkategorie::Invariante,
        }
    }

    /// `true` wenn der Kurzzeitspeicher selbst nicht erreichbar ist
    pub fn ist_kritisch(&self) -> bool {
        matches!(self, Self::Store(e) if e.ist_kritisch())
    }
}

impl From<AuthError> for PinguinError {
    fn from(e: AuthError) -> Self {
        match e.kategorie() {
            Fehlerkategorie::Drosselung => PinguinError::LoginGedrosselt,
            Fehlerkategorie::Transaktion => PinguinError::TransaktionFehlgeschlagen(e.to_string()),
            Fehlerkategorie::Invariante => PinguinError::InvariantenVerletzung(e.to_string()),
            _ => PinguinError::AuthentifizierungFehlgeschlagen,
        }
    }
}

/// Result-Alias fuer Login und Handshake
pub type AuthResult<T> = Result<T, AuthError>;
