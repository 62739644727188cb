//! `j#js` – Beitritt zur Spielwelt
//!
//! `%xt%s%j#js%-1%{pid}%{login_key}%{sprache}%`: PID und Sitzungsmarker
//! muessen zur Sitzung der Verbindung passen. Danach bekommt der Client
//! `activefeatures`, `js` und `lp` und wird online gemeldet.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pinguin_auth::Handshake;
use pinguin_core::Pid;
use pinguin_protocol::{xt, Nachricht};

use crate::antwort::Antwort;
use crate::error::GatewayResult;
use crate::handler::NachrichtenHandler;
use crate::kontext::VerbindungsKontext;
use crate::praesenz::Praesenz;
use crate::verzeichnis::Spieler;

/// Minuten fuer den Eieruhr-Timer (ohne Elternkontrolle: ein Tag)
const EIERUHR_MINUTEN: u32 = 24 * 60;
/// Verbleibende Mitgliedstage, die der Client anzeigt
const MITGLIED_TAGE: u32 = 100;
/// Server laeuft auf GMT
const ZEITZONEN_VERSATZ: u32 = 0;

pub struct BeitrittsHandler {
    handshake: Arc<Handshake>,
    praesenz: Arc<Praesenz>,
}

impl BeitrittsHandler {
    pub fn neu(handshake: Arc<Handshake>, praesenz: Arc<Praesenz>) -> Self {
        Self {
            handshake,
            praesenz,
        }
    }
}

fn flag(wert: bool) -> String {
    let text = if wert { "1" } else { "0" };
    text.to_string()
}

fn js_paket(spieler: &Spieler) -> String {
    let p = spieler.profil();
    xt::nachricht_erstellen(
        "js",
        &[
            flag(p.agent_status),
            "0".to_string(),
            p.moderator_status().to_string(),
            p.buch_geaendert.to_string(),
        ],
    )
}

fn lp_paket(spieler: &Spieler) -> String {
    let p = spieler.profil();
    let jetzt = Utc::now();
    xt::nachricht_erstellen(
        "lp",
        &[
            String::new(),
            p.coins.to_string(),
            flag(p.safe_chat),
            EIERUHR_MINUTEN.to_string(),
            (jetzt.timestamp() * 1000).to_string(),
            p.alter_in_tagen(jetzt).to_string(),
            "0".to_string(),
            p.minuten_gespielt.to_string(),
            MITGLIED_TAGE.to_string(),
            ZEITZONEN_VERSATZ.to_string(),
            flag(p.playercard_geoeffnet),
            p.map_kategorie.to_string(),
            p.status_feld.to_string(),
        ],
    )
}

#[async_trait]
impl NachrichtenHandler for BeitrittsHandler {
    fn name(&self) -> &'static str {
        "beitritt"
    }

    async fn verarbeiten(
        &self,
        nachricht: &Nachricht,
        kontext: &mut VerbindungsKontext,
    ) -> GatewayResult<Antwort> {
        let befehl = nachricht.als_xt();
        let pid = befehl
            .and_then(|b| b.argument(1))
            .and_then(|a| a.parse::<Pid>().ok());
        let login_key = befehl.and_then(|b| b.argument(2)).unwrap_or_default();

        let spieler = match (self.praesenz.verzeichnis().nach_verbindung(kontext.id()), pid) {
            (Some(s), Some(pid)) if s.pid() == pid => s,
            _ => {
                tracing::warn!(peer = %kontext.peer_addr(), "Beitritt ohne gueltige PID");
                return Ok(Antwort::Trennen(xt::unbekannter_fehler()));
            }
        };

        if !self
            .handshake
            .sitzung_pruefen(spieler.username(), login_key)
            .await?
        {
            tracing::warn!(
                pid = %spieler.pid(),
                username = %spieler.username(),
                "Beitritt ohne gueltigen Login-Key"
            );
            return Ok(Antwort::Trennen(xt::unbekannter_fehler()));
        }

        kontext
            .senden(&xt::nachricht_erstellen::<&str>("activefeatures", &[]))
            .await?;
        kontext.senden(&js_paket(&spieler)).await?;
        kontext.senden(&lp_paket(&spieler)).await?;

        self.praesenz.beigetreten(&spieler).await?;

        tracing::info!(pid = %spieler.pid(), username = %spieler.username(), "Welt beigetreten");
        Ok(Antwort::Nichts)
    }
}
