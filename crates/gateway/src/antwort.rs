//! Antworten der Handler

/// Ergebnis jedes Handler-Aufrufs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Antwort {
    /// Senden, Verbindung bleibt offen
    Regulaer(String),
    /// Senden, danach Verbindung schliessen
    Trennen(String),
    /// Nichts senden
    Nichts,
}

impl Antwort {
    pub fn regulaer(text: impl Into<String>) -> Self {
        Self::Regulaer(text.into())
    }

    pub fn trennen(text: impl Into<String>) -> Self {
        Self::Trennen(text.into())
    }

    /// Zu sendender Text, falls vorhanden
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Regulaer(t) | Self::Trennen(t) => Some(t),
            Self::Nichts => None,
        }
    }

    pub fn schliesst(&self) -> bool {
        matches!(self, Self::Trennen(_))
    }
}
