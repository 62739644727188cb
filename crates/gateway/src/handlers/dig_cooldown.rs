//! `p#getdigcooldown` – Restzeit bis zum naechsten Graben

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pinguin_protocol::{xt, Nachricht};
use pinguin_store::schluessel;

use crate::antwort::Antwort;
use crate::error::{GatewayError, GatewayResult};
use crate::handler::NachrichtenHandler;
use crate::kontext::VerbindungsKontext;
use crate::praesenz::Praesenz;

pub const DIG_COOLDOWN_SEK: i64 = 120;

/// Restzeit in Sekunden, nie negativ
pub fn restzeit(letzter_dig: i64, jetzt: i64) -> i64 {
    (DIG_COOLDOWN_SEK - (jetzt - letzter_dig)).max(0)
}

pub struct DigCooldownHandler {
    praesenz: Arc<Praesenz>,
}

impl DigCooldownHandler {
    pub fn neu(praesenz: Arc<Praesenz>) -> Self {
        Self { praesenz }
    }
}

#[async_trait]
impl NachrichtenHandler for DigCooldownHandler {
    fn name(&self) -> &'static str {
        "dig_cooldown"
    }

    async fn verarbeiten(
        &self,
        _nachricht: &Nachricht,
        kontext: &mut VerbindungsKontext,
    ) -> GatewayResult<Antwort> {
        let Some(spieler) = self.praesenz.verzeichnis().nach_verbindung(kontext.id()) else {
            tracing::error!(peer = %kontext.peer_addr(), "Spieler zur Verbindung nicht gefunden");
            return Ok(Antwort::Trennen(xt::unbekannter_fehler()));
        };

        // Speicherausfall geht als kritischer Fehler nach oben
        let gespeichert = self
            .praesenz
            .store()
            .lesen(&schluessel::letzter_dig(spieler.pid()))
            .await?;

        let rest = match gespeichert {
            None => 0,
            Some(text) => {
                let letzter: i64 = text.trim().parse().map_err(|_| {
                    GatewayError::invariante(format!("last_dig '{text}' keine Zahl"))
                })?;
                restzeit(letzter, Utc::now().timestamp())
            }
        };

        tracing::trace!(pid = %spieler.pid(), rest, "Dig-Cooldown");
        Ok(Antwort::Regulaer(xt::nachricht_erstellen(
            "getdigcooldown",
            &[rest.to_string()],
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testhilfe::TestVerbindung;
    use crate::verzeichnis::{Spieler, SpielerVerzeichnis};
    use pinguin_core::{DienstId, Pid};
    use pinguin_db::SpielerRecord;
    use pinguin_protocol::aufloesen;
    use pinguin_store::{EphemeralStore, MemoryStore, Transaktion};

    fn anfrage() -> Nachricht {
        aufloesen("%xt%s%p#getdigcooldown%-1%").unwrap()
    }

    fn aufbau() -> (Arc<MemoryStore>, Arc<Praesenz>, DigCooldownHandler) {
        let store = Arc::new(MemoryStore::neu());
        let praesenz = Arc::new(Praesenz::neu(
            DienstId(9913),
            Arc::new(SpielerVerzeichnis::neu()),
            store.clone(),
        ));
        (store, praesenz.clone(), DigCooldownHandler::neu(praesenz))
    }

    fn anmelden(praesenz: &Praesenz, v: &TestVerbindung) {
        praesenz
            .verzeichnis()
            .hinzufuegen(Arc::new(Spieler::neu(
                SpielerRecord::neu(Pid(101), "basil", "hash"),
                v.kontext.handle(),
            )))
            .unwrap();
    }

    #[test]
    fn restzeit_berechnen() {
        assert_eq!(restzeit(1000, 1000), 120);
        assert_eq!(restzeit(1000, 1100), 20);
        assert_eq!(restzeit(1000, 1120), 0);
        assert_eq!(restzeit(1000, 5000), 0);
    }

    #[tokio::test]
    async fn ohne_eintrag_null() {
        let (_store, praesenz, handler) = aufbau();
        let mut v = TestVerbindung::neu("10.0.0.1:1");
        anmelden(&praesenz, &v);

        let a = handler.verarbeiten(&anfrage(), &mut v.kontext).await.unwrap();
        assert_eq!(a, Antwort::regulaer("%xt%getdigcooldown%-1%0%"));
    }

    #[tokio::test]
    async fn mit_letztem_dig() {
        let (store, praesenz, handler) = aufbau();
        let mut v = TestVerbindung::neu("10.0.0.1:1");
        anmelden(&praesenz, &v);
        let vor_30 = (Utc::now().timestamp() - 30).to_string();
        store
            .ausfuehren(Transaktion::neu().set(&schluessel::letzter_dig(Pid(101)), &vor_30, None))
            .await
            .unwrap();

        let Antwort::Regulaer(text) = handler.verarbeiten(&anfrage(), &mut v.kontext).await.unwrap()
        else {
            panic!("Regulaere Antwort erwartet");
        };
        let rest: i64 = text
            .trim_start_matches("%xt%getdigcooldown%-1%")
            .trim_end_matches('%')
            .parse()
            .unwrap();
        assert!((89..=90).contains(&rest), "{rest}");
    }

    #[tokio::test]
    async fn ohne_spieler_trennen() {
        let (_store, _praesenz, handler) = aufbau();
        let mut v = TestVerbindung::neu("10.0.0.1:1");
        let a = handler.verarbeiten(&anfrage(), &mut v.kontext).await.unwrap();
        assert_eq!(a, Antwort::trennen("%xt%e%-1%0%"));
    }

    #[tokio::test]
    async fn speicherausfall_eskaliert() {
        let (store, praesenz, handler) = aufbau();
        let mut v = TestVerbindung::neu("10.0.0.1:1");
        anmelden(&praesenz, &v);
        store.verfuegbar_setzen(false);

        let e = handler.verarbeiten(&anfrage(), &mut v.kontext).await.unwrap_err();
        assert!(e.ist_kritisch());
    }
}
