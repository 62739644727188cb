//! pinguin-auth – Authentifizierung ueber beide Gateways
//!
//! Dieses Crate implementiert:
//! - Schluessel-Hash, Verschleierung und Zufallsschluessel (`krypto`)
//! - Passwort-Pruefung mit Argon2id
//! - Flood-Schutz pro Host
//! - Population-Buckets und Buddy-Presence
//! - Handshake: Phase A (Ausstellen, Login-Gateway) und Phase B
//!   (Verifizieren, Spiel-Gateway)
//! - `AnmeldeService`: komplette Login-Pruefung des Login-Gateways

pub mod anmeldung;
pub mod error;
pub mod flood;
pub mod handshake;
pub mod krypto;
pub mod password;
pub mod population;

use std::time::Duration;

pub use anmeldung::{Ablehnung, AnmeldeService, Anmeldung};
pub use error::{AuthError, AuthResult};
pub use flood::{host_von, FloodSchutz};
pub use handshake::{Ausgestellt, ClientNachweis, Handshake};
pub use password::{passwort_hashen, passwort_verifizieren};
pub use population::{bucket_berechnen, Population};

/// Laufzeit-Parameter fuer Login und Handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthKonfig {
    /// Gemeinsamer Zufallsschluessel, den der Client fuer den Client-Key nutzt
    pub random_key: String,
    /// Lebensdauer von `{username}.lkey` / `.ckey`
    pub auth_ttl: Duration,
    /// Lebensdauer von `{username}.loginkey`
    pub loginkey_ttl: Duration,
    /// Fehlversuche, ab deren Ueberschreitung gedrosselt wird
    pub flood_limit: u64,
    pub flood_fenster: Duration,
    /// Kapazitaet pro Dienst-Instanz fuer die Population-Buckets
    pub max_spieler: u32,
    /// Tage, die ein nicht aktivierter Account spielen darf
    pub preaktivierung_tage: u32,
}

impl Default for AuthKonfig {
    fn default() -> Self {
        Self {
            random_key: "houdini".into(),
            auth_ttl: Duration::from_secs(180),
            loginkey_ttl: Duration::from_secs(3600),
            flood_limit: 3,
            flood_fenster: Duration::from_secs(3600),
            max_spieler: 500,
            preaktivierung_tage: 7,
        }
    }
}
