//! Fehler der Spieler-Datenbank

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Spieler oder Buddy-Ziel existiert nicht
    #[error("Spieler fehlt: {0}")]
    NichtGefunden(String),

    /// Benutzername oder Spieler-ID schon vergeben
    #[error("Spieler schon registriert: {0}")]
    Eindeutigkeit(String),

    /// Gespeicherte Spalte passt nicht ins Spielermodell
    #[error("Spielerdatensatz beschaedigt: {0}")]
    UngueltigeDaten(String),

    #[error("SQLite: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Schema-Migration fehlgeschlagen: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    pub fn nicht_gefunden(wer: impl Into<String>) -> Self {
        Self::NichtGefunden(wer.into())
    }

    /// Ordnet einen Schreibfehler beim Anlegen von `username` ein
    pub fn beim_anlegen(e: sqlx::Error, username: &str) -> Self {
        let verletzt = e
            .as_database_error()
            .is_some_and(|d| d.is_unique_violation());
        if verletzt {
            Self::Eindeutigkeit(format!("'{username}'"))
        } else {
            Self::Sqlx(e)
        }
    }

    pub fn ist_eindeutigkeit(&self) -> bool {
        matches!(self, Self::Eindeutigkeit(_))
    }
}
