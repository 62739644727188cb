//! Datensatz-Modelle
//!
//! Ein `SpielerRecord` ist ein Schnappschuss zum Zeitpunkt des Logins. Die
//! Gateways halten ihn im Spieler-Verzeichnis, er wird nicht live
//! nachgeladen.

use chrono::{DateTime, Utc};
use pinguin_core::Pid;
use serde::{Deserialize, Serialize};

/// Client-Sprachen fuer Freigabe- und Ablehnungsmasken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sprache {
    En,
    Pt,
    Fr,
    Es,
    De,
    Ru,
}

impl Sprache {
    /// Bit-Position in der Maske (Bit 4 ist unbelegt)
    pub fn bit(&self) -> u8 {
        match self {
            Self::En => 1 << 0,
            Self::Pt => 1 << 1,
            Self::Fr => 1 << 2,
            Self::Es => 1 << 3,
            Self::De => 1 << 5,
            Self::Ru => 1 << 6,
        }
    }

    /// Baut eine Maske aus einer Menge von Sprachen
    pub fn maske(sprachen: &[Sprache]) -> u8 {
        sprachen.iter().fold(0, |m, s| m | s.bit())
    }
}

/// Spieler-Datensatz aus der Datenbank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpielerRecord {
    pub id: Pid,
    pub username: String,
    /// Argon2-PHC-String
    pub password_hash: String,
    pub email: String,
    pub aktiv: bool,
    pub registriert_am: DateTime<Utc>,
    pub permaban: bool,
    pub hausarrest: bool,
    pub approval: u8,
    pub rejection: u8,
    pub coins: u32,
    pub safe_chat: bool,
    pub moderator: bool,
    pub stealth_moderator: bool,
    pub charakter: Option<u32>,
    pub agent_status: bool,
    pub minuten_gespielt: u32,
    pub playercard_geoeffnet: bool,
    pub map_kategorie: u8,
    pub status_feld: u32,
    pub buch_geaendert: u8,
}

impl SpielerRecord {
    /// Neuer aktiver Spieler mit Standardwerten
    pub fn neu(id: Pid, username: &str, password_hash: &str) -> Self {
        Self {
            id,
            username: username.to_lowercase(),
            password_hash: password_hash.to_string(),
            email: String::new(),
            aktiv: true,
            registriert_am: Utc::now(),
            permaban: false,
            hausarrest: false,
            approval: 0,
            rejection: 0,
            coins: 500,
            safe_chat: false,
            moderator: false,
            stealth_moderator: false,
            charakter: None,
            agent_status: false,
            minuten_gespielt: 0,
            playercard_geoeffnet: false,
            map_kategorie: 0,
            status_feld: 0,
            buch_geaendert: 0,
        }
    }

    /// Moderationsstufe fuer den Client (3 Charakter, 2 Stealth, 1 Moderator)
    pub fn moderator_status(&self) -> u8 {
        if self.charakter.is_some() {
            3
        } else if self.stealth_moderator {
            2
        } else if self.moderator {
            1
        } else {
            0
        }
    }

    /// Alter des Accounts in ganzen Tagen
    pub fn alter_in_tagen(&self, jetzt: DateTime<Utc>) -> i64 {
        (jetzt - self.registriert_am).num_days()
    }
}

/// Zeitlich begrenzter Ban
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecord {
    pub id: i64,
    pub spieler_id: Pid,
    pub grund: String,
    pub laeuft_ab: DateTime<Utc>,
    pub erstellt_am: DateTime<Utc>,
}

/// Daten fuer einen neuen Ban
#[derive(Debug, Clone)]
pub struct NeuerBan<'a> {
    pub spieler_id: Pid,
    pub grund: &'a str,
    pub laeuft_ab: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn sprachmaske() {
        assert_eq!(Sprache::maske(&[]), 0);
        assert_eq!(Sprache::maske(&[Sprache::En]), 1);
        assert_eq!(Sprache::maske(&[Sprache::En, Sprache::De]), 0b0010_0001);
        assert_eq!(Sprache::maske(&[Sprache::Ru]), 64);
    }

    #[test]
    fn moderator_stufen() {
        let mut s = SpielerRecord::neu(Pid(101), "Pingu", "hash");
        assert_eq!(s.username, "pingu");
        assert_eq!(s.moderator_status(), 0);
        s.moderator = true;
        assert_eq!(s.moderator_status(), 1);
        s.stealth_moderator = true;
        assert_eq!(s.moderator_status(), 2);
        s.charakter = Some(1);
        assert_eq!(s.moderator_status(), 3);
    }

    #[test]
    fn alter() {
        let mut s = SpielerRecord::neu(Pid(1), "a", "h");
        let jetzt = Utc::now();
        s.registriert_am = jetzt - Duration::days(3) - Duration::hours(1);
        assert_eq!(s.alter_in_tagen(jetzt), 3);
    }
}
