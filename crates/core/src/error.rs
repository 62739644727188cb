//! Fehlertaxonomie fuer die Pinguin-Gateways
//!
//! Zentraler Fehler-Enum fuer alle Fehlerzustaende, die ueber Crate-Grenzen
//! hinweg unterschieden werden muessen. Untermodule definieren eigene Fehler
//! und ordnen sie ueber `kategorie()` einer `Fehlerkategorie` zu.

use thiserror::Error;

/// Globaler Result-Alias
pub type Result<T> = std::result::Result<T, PinguinError>;

/// Alle uebergreifenden Fehler der Gateways
#[derive(Debug, Error)]
pub enum PinguinError {
    // --- Protokoll ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    #[error("Unbekanntes Nachrichtenformat")]
    UnbekanntesFormat,

    // --- Authentifizierung ---
    #[error("Authentifizierung fehlgeschlagen")]
    AuthentifizierungFehlgeschlagen,

    #[error("Login gedrosselt: zu viele Fehlversuche")]
    LoginGedrosselt,

    // --- Kurzzeitspeicher ---
    #[error("Transaktion fehlgeschlagen: {0}")]
    TransaktionFehlgeschlagen(String),

    // --- Interne Konsistenz ---
    #[error("Invariante verletzt: {0}")]
    InvariantenVerletzung(String),

    // --- Transport ---
    #[error("Transportfehler: {0}")]
    Transport(#[from] std::io::Error),
}

/// Grobe Einordnung eines Fehlers
///
/// Bestimmt wie eine Verbindung auf den Fehler reagiert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fehlerkategorie {
    /// Frame nicht parsebar – Verbindung ohne Antwort schliessen
    UngueltigeNachricht,
    /// Kein Handler registriert – ignorieren
    UnbekannterSchluessel,
    /// Generischer Fehler an den Client, dann schliessen
    Authentifizierung,
    /// Spezieller Drossel-Fehler, dann schliessen
    Drosselung,
    /// Wie Authentifizierung, nie automatisch wiederholen
    Transaktion,
    /// Schwerster Fehler, immer mit `error!` loggen
    Invariante,
    /// Socket-Fehler, Verbindungs-Task endet
    Transport,
}

impl PinguinError {
    /// Erstellt einen Invarianten-Fehler
    pub fn invariante(msg: impl Into<String>) -> Self {
        Self::InvariantenVerletzung(msg.into())
    }

    /// Erstellt einen Fehler fuer eine ungueltige Nachricht
    pub fn ungueltig(msg: impl Into<String>) -> Self {
        Self::UngueltigeNachricht(msg.into())
    }

    pub fn kategorie(&self) -> Fehlerkategorie {
        match self {
            Self::UngueltigeNachricht(_) | Self::UnbekanntesFormat => {
                Fehlerkategorie::UngueltigeNachricht
            }
            Self::AuthentifizierungFehlgeschlagen => Fehlerkategorie::Authentifizierung,
            Self::LoginGedrosselt => Fehlerkategorie::Drosselung,
            Self::TransaktionFehlgeschlagen(_) => Fehlerkategorie::Transaktion,
            Self::InvariantenVerletzung(_) => Fehlerkategorie::Invariante,
            Self::Transport(_) => Fehlerkategorie::Transport,
        }
    }

    /// Gibt true zurueck wenn die Verbindung ohne Antwort geschlossen wird
    pub fn schliesst_ohne_antwort(&self) -> bool {
        matches!(
            self.kategorie(),
            Fehlerkategorie::UngueltigeNachricht | Fehlerkategorie::Transport
        )
    }
}
