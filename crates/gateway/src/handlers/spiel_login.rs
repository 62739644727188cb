//! `login` auf dem Spiel-Gateway (Phase B)
//!
//! ```text
//! nick  = {pid}|{pid}|{username}|{lkey}|{random_key}|{approval}|{rejection}
//! pword = {client_key}#{confirm_hash}
//! ```
//!
//! Nach erfolgreicher Pruefung wird eine bestehende Sitzung derselben PID
//! getrennt (der letzte Login gewinnt) und die neue Sitzung registriert.

use std::sync::Arc;

use async_trait::async_trait;
use pinguin_auth::{AuthError, ClientNachweis, Handshake};
use pinguin_core::{Pid, PinguinError};
use pinguin_db::SpielerRepository;
use pinguin_protocol::{xt, FehlerCode, Nachricht};

use crate::antwort::Antwort;
use crate::error::GatewayResult;
use crate::handler::NachrichtenHandler;
use crate::kontext::VerbindungsKontext;
use crate::praesenz::Praesenz;
use crate::verzeichnis::Spieler;

/// Felder aus `nick` und `pword`
#[derive(Debug, PartialEq, Eq)]
struct Anmeldedaten<'a> {
    pid: &'a str,
    pid_kontrolle: &'a str,
    username: &'a str,
    login_key: &'a str,
    client_key: &'a str,
    confirm_hash: &'a str,
}

fn zerlegen<'a>(nick: &'a str, pword: &'a str) -> Option<Anmeldedaten<'a>> {
    let mut n = nick.split('|');
    let (pid, pid_kontrolle, username, login_key) = (n.next()?, n.next()?, n.next()?, n.next()?);
    let (client_key, confirm_hash) = pword.split_once('#')?;
    Some(Anmeldedaten {
        pid,
        pid_kontrolle,
        username,
        login_key,
        client_key,
        confirm_hash,
    })
}

pub struct SpielLoginHandler {
    spieler: Arc<dyn SpielerRepository>,
    handshake: Arc<Handshake>,
    praesenz: Arc<Praesenz>,
}

impl SpielLoginHandler {
    pub fn neu(
        spieler: Arc<dyn SpielerRepository>,
        handshake: Arc<Handshake>,
        praesenz: Arc<Praesenz>,
    ) -> Self {
        Self {
            spieler,
            handshake,
            praesenz,
        }
    }

    /// Trennt eine alte Sitzung und raeumt sie sofort auf
    async fn abloesen(&self, alt: &Spieler) {
        tracing::info!(
            pid = %alt.pid(),
            alt = %alt.verbindung().id(),
            "Doppelter Login – alte Sitzung wird getrennt"
        );
        self.praesenz.trennen(alt.verbindung().id()).await;
        alt.verbindung().trennen();
    }
}

#[async_trait]
impl NachrichtenHandler for SpielLoginHandler {
    fn name(&self) -> &'static str {
        "spiel_login"
    }

    async fn verarbeiten(
        &self,
        nachricht: &Nachricht,
        kontext: &mut VerbindungsKontext,
    ) -> GatewayResult<Antwort> {
        let login = nachricht
            .xml_body()
            .and_then(|body| body.kind("login"))
            .ok_or_else(|| PinguinError::ungueltig("login ohne <login>-Element"))?;
        let (Some(nick), Some(pword)) = (login.kind("nick"), login.kind("pword")) else {
            return Err(PinguinError::ungueltig("login ohne nick/pword").into());
        };
        let daten = zerlegen(nick.text(), pword.text())
            .ok_or_else(|| PinguinError::ungueltig("nick/pword unvollstaendig"))?;

        let (Ok(pid), Ok(kontrolle)) = (daten.pid.parse::<Pid>(), daten.pid_kontrolle.parse::<Pid>())
        else {
            return Err(PinguinError::ungueltig("PID keine Zahl").into());
        };
        if pid != kontrolle {
            tracing::warn!(peer = %kontext.peer_addr(), %pid, %kontrolle, "Zwei verschiedene PIDs im Login");
            return Ok(Antwort::Trennen(xt::unbekannter_fehler()));
        }

        let Some(profil) = self.spieler.nach_name(daten.username).await? else {
            tracing::warn!(peer = %kontext.peer_addr(), username = %daten.username, "Spieler nicht gefunden");
            return Ok(Antwort::Trennen(xt::fehler_erstellen::<&str>(
                FehlerCode::SpielerNichtGefunden,
                &[],
            )));
        };
        if profil.id != pid {
            tracing::warn!(peer = %kontext.peer_addr(), %pid, datensatz = %profil.id, "PID passt nicht zum Spieler");
            return Ok(Antwort::Trennen(xt::unbekannter_fehler()));
        }

        let nachweis = ClientNachweis {
            login_key: daten.login_key,
            client_key: daten.client_key,
            confirm_hash: daten.confirm_hash,
        };
        match self.handshake.verifizieren(&profil.username, nachweis).await {
            Ok(()) => {}
            Err(AuthError::Fehlgeschlagen) => {
                tracing::warn!(peer = %kontext.peer_addr(), username = %profil.username, "Handshake fehlgeschlagen");
                return Ok(Antwort::Trennen(xt::unbekannter_fehler()));
            }
            Err(e) => return Err(e.into()),
        }

        let verzeichnis = self.praesenz.verzeichnis();
        if let Some(alt) = verzeichnis.nach_pid(pid) {
            self.abloesen(&alt).await;
        }

        let username = profil.username.clone();
        let spieler = Arc::new(Spieler::neu(profil, kontext.handle()));
        if let Some(verdraengt) = verzeichnis.hinzufuegen(spieler)? {
            // Gleichzeitiger Login derselben PID zwischen Nachschlagen und Eintragen
            self.abloesen(&verdraengt).await;
        }

        tracing::info!(peer = %kontext.peer_addr(), %pid, username = %username, "Spieler angemeldet");
        Ok(Antwort::Regulaer(xt::nachricht_erstellen::<&str>("l", &[])))
    }
}
