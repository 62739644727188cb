//! `login` auf dem Login-Gateway
//!
//! Fuehrt die komplette Login-Pruefung aus, stellt die Einmal-Schluessel
//! aus (Phase A) und schickt dem Client Schluessel, Population und
//! Buddy-Instanzen:
//!
//! ```text
//! %xt%l%-1%{pid}|{pid}|{user}|{lkey}|{rk}|{approval}|{rejection}%{ckey}%%{dienst,bucket|..}%{dienst|..}%{email}%[{stunden}%]
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pinguin_auth::{host_von, Ablehnung, AnmeldeService, Anmeldung, AuthError};
use pinguin_core::PinguinError;
use pinguin_protocol::{xt, FehlerCode, Nachricht};

use crate::antwort::Antwort;
use crate::error::GatewayResult;
use crate::handler::NachrichtenHandler;
use crate::kontext::VerbindungsKontext;

pub struct LoginHandler {
    anmeldung: Arc<AnmeldeService>,
    random_key: String,
}

impl LoginHandler {
    pub fn neu(anmeldung: Arc<AnmeldeService>, random_key: impl Into<String>) -> Self {
        Self {
            anmeldung,
            random_key: random_key.into(),
        }
    }

    fn erfolg(&self, a: &Anmeldung) -> String {
        let s = &a.spieler;
        let login_daten = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            s.id, s.id, s.username, a.schluessel.login_key, self.random_key, s.approval, s.rejection
        );
        let population = a
            .schluessel
            .population
            .iter()
            .map(|p| format!("{},{}", p.dienst, p.bucket))
            .collect::<Vec<_>>()
            .join("|");
        let buddies = a
            .buddy_dienste
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("|");

        let mut paket = xt::nachricht_erstellen(
            "l",
            &[
                login_daten.as_str(),
                a.schluessel.confirm_key.as_str(),
                "",
                population.as_str(),
                buddies.as_str(),
                s.email.as_str(),
            ],
        );
        if let Some(stunden) = a.preaktivierung_stunden {
            paket.push_str(&format!("{stunden}%"));
        }
        paket
    }
}

/// Fehlerpaket fuer eine Ablehnung
fn ablehnung_senden(ablehnung: Ablehnung) -> String {
    match ablehnung {
        Ablehnung::SpielerNichtGefunden => xt::fehler_erstellen::<&str>(FehlerCode::SpielerNichtGefunden, &[]),
        Ablehnung::PasswortFalsch => xt::fehler_erstellen::<&str>(FehlerCode::PasswortFalsch, &[]),
        Ablehnung::NichtAktiviert => xt::fehler_erstellen::<&str>(FehlerCode::NichtAktiviert, &[]),
        Ablehnung::Permaban => xt::fehler_erstellen::<&str>(FehlerCode::Permaban, &[]),
        Ablehnung::Gebannt { stunden } if stunden < 1 => {
            xt::fehler_erstellen::<&str>(FehlerCode::BanUnterStunde, &[])
        }
        Ablehnung::Gebannt { stunden } => {
            xt::fehler_erstellen(FehlerCode::BanStunden, &[stunden.to_string()])
        }
        Ablehnung::Hausarrest => xt::fehler_erstellen::<&str>(FehlerCode::Hausarrest, &[]),
    }
}

#[async_trait]
impl NachrichtenHandler for LoginHandler {
    fn name(&self) -> &'static str {
        "login"
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

        let host = host_von(&kontext.peer_addr());
        tracing::info!(peer = %kontext.peer_addr(), username = %nick.text(), "Login-Anfrage");

        match self
            .anmeldung
            .anmelden(&host, nick.text(), pword.text(), Utc::now())
            .await
        {
            Ok(anmeldung) => Ok(Antwort::Regulaer(self.erfolg(&anmeldung))),
            Err(AuthError::Gedrosselt) => Ok(Antwort::Trennen(xt::fehler_erstellen::<&str>(
                FehlerCode::ZuVieleVersuche,
                &[],
            ))),
            Err(AuthError::Abgelehnt(ablehnung)) => Ok(Antwort::Trennen(ablehnung_senden(ablehnung))),
            Err(e) => Err(e.into()),
        }
    }
}
