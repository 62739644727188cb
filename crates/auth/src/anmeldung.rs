//! Login-Pruefung des Login-Gateways
//!
//! Reihenfolge der Pruefungen: Flood → Spieler vorhanden → Passwort →
//! Aktivierung → Permaban → befristeter Ban → Hausarrest → Phase A →
//! Buddy-Presence. Die erste fehlschlagende Pruefung beendet den Login.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use pinguin_core::DienstId;
use pinguin_db::{SpielerRecord, SpielerRepository};

use crate::error::{AuthError, AuthResult};
use crate::flood::FloodSchutz;
use crate::handshake::{Ausgestellt, Handshake};
use crate::password::passwort_verifizieren;
use crate::population::buddies_lokalisieren;

/// Grund fuer einen abgelehnten Login (wird als Fehlercode gemeldet)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ablehnung {
    SpielerNichtGefunden,
    PasswortFalsch,
    NichtAktiviert,
    Permaban,
    /// Befristeter Ban mit ganzen Reststunden (0 = unter einer Stunde)
    Gebannt { stunden: i64 },
    Hausarrest,
}

/// Erfolgreicher Login
#[derive(Debug, Clone)]
pub struct Anmeldung {
    pub spieler: SpielerRecord,
    pub schluessel: Ausgestellt,
    /// Instanzen mit mindestens einem Buddy online
    pub buddy_dienste: Vec<DienstId>,
    /// Reststunden der Voraktivierung bei nicht aktivierten Accounts
    pub preaktivierung_stunden: Option<i64>,
}

pub struct AnmeldeService {
    spieler: Arc<dyn SpielerRepository>,
    flood: FloodSchutz,
    handshake: Arc<Handshake>,
}

impl AnmeldeService {
    pub fn neu(spieler: Arc<dyn SpielerRepository>, handshake: Arc<Handshake>) -> Self {
        let konfig = handshake.konfig();
        let flood = FloodSchutz::neu(
            handshake.store().clone(),
            konfig.flood_limit,
            konfig.flood_fenster,
        );
        Self {
            spieler,
            flood,
            handshake,
        }
    }

    /// Fuehrt alle Login-Pruefungen und Phase A aus
    pub async fn anmelden(
        &self,
        host: &str,
        username: &str,
        passwort: &str,
        jetzt: DateTime<Utc>,
    ) -> AuthResult<Anmeldung> {
        self.flood.pruefen(host).await?;

        let spieler = self
            .spieler
            .nach_name(username)
            .await?
            .ok_or_else(|| {
                tracing::warn!(host = %host, username = %username, "Spieler nicht gefunden");
                AuthError::Abgelehnt(Ablehnung::SpielerNichtGefunden)
            })?;

        if !self.passwort_pruefen(passwort, &spieler.password_hash).await? {
            tracing::warn!(host = %host, username = %spieler.username, "Falsches Passwort");
            self.flood.fehlversuch(host).await?;
            return Err(AuthError::Abgelehnt(Ablehnung::PasswortFalsch));
        }

        let preaktivierung_stunden = self.aktivierung_pruefen(&spieler, jetzt)?;
        self.sperren_pruefen(&spieler, jetzt).await?;

        let schluessel = self.handshake.ausstellen(&spieler.username).await?;
        let buddies = self.spieler.buddies(spieler.id).await?;
        let buddy_dienste =
            buddies_lokalisieren(self.handshake.store(), &schluessel.population, &buddies).await?;

        tracing::info!(host = %host, pid = %spieler.id, username = %spieler.username, "Login erfolgreich");
        Ok(Anmeldung {
            spieler,
            schluessel,
            buddy_dienste,
            preaktivierung_stunden,
        })
    }

    async fn passwort_pruefen(&self, passwort: &str, hash: &str) -> AuthResult<bool> {
        let passwort = passwort.to_string();
        let hash = hash.to_string();
        // Argon2 ist CPU-lastig und laeuft ausserhalb der Runtime-Threads
        tokio::task::spawn_blocking(move || passwort_verifizieren(&passwort, &hash))
            .await
            .map_err(|e| AuthError::PasswortHashing(e.to_string()))?
    }

    fn aktivierung_pruefen(
        &self,
        spieler: &SpielerRecord,
        jetzt: DateTime<Utc>,
    ) -> AuthResult<Option<i64>> {
        if spieler.aktiv {
            return Ok(None);
        }

        let tage = i64::from(self.handshake.konfig().preaktivierung_tage);
        let ablauf = spieler.registriert_am + ChronoDuration::days(tage);
        if jetzt > ablauf {
            tracing::warn!(username = %spieler.username, "Account nicht aktiviert");
            return Err(AuthError::Abgelehnt(Ablehnung::NichtAktiviert));
        }
        Ok(Some((ablauf - jetzt).num_hours()))
    }

    async fn sperren_pruefen(&self, spieler: &SpielerRecord, jetzt: DateTime<Utc>) -> AuthResult<()> {
        if spieler.permaban {
            tracing::warn!(username = %spieler.username, "Account dauerhaft gesperrt");
            return Err(AuthError::Abgelehnt(Ablehnung::Permaban));
        }

        if let Some(ban) = self.spieler.aktiver_ban(spieler.id, jetzt).await? {
            let stunden = (ban.laeuft_ab - jetzt).num_hours();
            tracing::warn!(username = %spieler.username, stunden, "Account befristet gesperrt");
            return Err(AuthError::Abgelehnt(Ablehnung::Gebannt { stunden }));
        }

        if spieler.hausarrest {
            tracing::warn!(username = %spieler.username, "Hausarrest");
            return Err(AuthError::Abgelehnt(Ablehnung::Hausarrest));
        }
        Ok(())
    }
}
