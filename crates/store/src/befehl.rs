//! Befehle, Werte und Transaktionen des Kurzzeitspeichers

use std::time::Duration;

/// Einzelner Speicherbefehl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Befehl {
    /// Text setzen, optional mit Ablaufzeit
    Set {
        schluessel: String,
        wert: String,
        ttl: Option<Duration>,
    },
    Get(String),
    /// Lesen und sofort loeschen
    GetDel(String),
    Exists(String),
    /// Zaehler erhoehen (fehlender Schluessel zaehlt als 0)
    Incr(String),
    Expire {
        schluessel: String,
        ttl: Duration,
    },
    /// Restlaufzeit in Sekunden, -1 ohne Ablauf, -2 wenn nicht vorhanden
    Ttl(String),
    HashGetAll(String),
    HashSet {
        schluessel: String,
        feld: String,
        wert: String,
    },
    SetAdd {
        schluessel: String,
        mitglied: String,
    },
    SetRem {
        schluessel: String,
        mitglied: String,
    },
    SetContains {
        schluessel: String,
        mitglied: String,
    },
}

impl Befehl {
    /// Schluessel, auf den der Befehl wirkt
    pub fn schluessel(&self) -> &str {
        match self {
            Self::Set { schluessel, .. }
            | Self::Expire { schluessel, .. }
            | Self::HashSet { schluessel, .. }
            | Self::SetAdd { schluessel, .. }
            | Self::SetRem { schluessel, .. }
            | Self::SetContains { schluessel, .. } => schluessel,
            Self::Get(s)
            | Self::GetDel(s)
            | Self::Exists(s)
            | Self::Incr(s)
            | Self::Ttl(s)
            | Self::HashGetAll(s) => s,
        }
    }
}

/// Ergebnis eines Befehls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wert {
    Nichts,
    Text(String),
    Zahl(i64),
    Bool(bool),
    Hash(Vec<(String, String)>),
}

impl Wert {
    pub fn als_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn in_text(self) -> Option<String> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn als_zahl(&self) -> Option<i64> {
        match self {
            Self::Zahl(z) => Some(*z),
            Self::Text(t) => t.parse().ok(),
            _ => None,
        }
    }

    pub fn als_bool(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    pub fn in_hash(self) -> Vec<(String, String)> {
        match self {
            Self::Hash(h) => h,
            _ => Vec::new(),
        }
    }
}

/// Geordnete Befehlsliste, die atomar ausgefuehrt wird
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaktion {
    befehle: Vec<Befehl>,
}

impl Transaktion {
    pub fn neu() -> Self {
        Self::default()
    }

    pub fn befehl(mut self, befehl: Befehl) -> Self {
        self.befehle.push(befehl);
        self
    }

    pub fn set(self, schluessel: &str, wert: &str, ttl: Option<Duration>) -> Self {
        self.befehl(Befehl::Set {
            schluessel: schluessel.to_string(),
            wert: wert.to_string(),
            ttl,
        })
    }

    pub fn get(self, schluessel: &str) -> Self {
        self.befehl(Befehl::Get(schluessel.to_string()))
    }

    pub fn get_del(self, schluessel: &str) -> Self {
        self.befehl(Befehl::GetDel(schluessel.to_string()))
    }

    pub fn exists(self, schluessel: &str) -> Self {
        self.befehl(Befehl::Exists(schluessel.to_string()))
    }

    pub fn incr(self, schluessel: &str) -> Self {
        self.befehl(Befehl::Incr(schluessel.to_string()))
    }

    pub fn expire(self, schluessel: &str, ttl: Duration) -> Self {
        self.befehl(Befehl::Expire {
            schluessel: schluessel.to_string(),
            ttl,
        })
    }

    pub fn ttl(self, schluessel: &str) -> Self {
        self.befehl(Befehl::Ttl(schluessel.to_string()))
    }

    pub fn hash_get_all(self, schluessel: &str) -> Self {
        self.befehl(Befehl::HashGetAll(schluessel.to_string()))
    }

    pub fn hash_set(self, schluessel: &str, feld: &str, wert: &str) -> Self {
        self.befehl(Befehl::HashSet {
            schluessel: schluessel.to_string(),
            feld: feld.to_string(),
            wert: wert.to_string(),
        })
    }

    pub fn set_add(self, schluessel: &str, mitglied: &str) -> Self {
        self.befehl(Befehl::SetAdd {
            schluessel: schluessel.to_string(),
            mitglied: mitglied.to_string(),
        })
    }

    pub fn set_rem(self, schluessel: &str, mitglied: &str) -> Self {
        self.befehl(Befehl::SetRem {
            schluessel: schluessel.to_string(),
            mitglied: mitglied.to_string(),
        })
    }

    pub fn set_contains(self, schluessel: &str, mitglied: &str) -> Self {
        self.befehl(Befehl::SetContains {
            schluessel: schluessel.to_string(),
            mitglied: mitglied.to_string(),
        })
    }

    pub fn befehle(&self) -> &[Befehl] {
        &self.befehle
    }

    pub fn len(&self) -> usize {
        self.befehle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.befehle.is_empty()
    }

    pub(crate) fn in_befehle(self) -> Vec<Befehl> {
        self.befehle
    }
}
