//! Nachrichten-Prozessor
//!
//! Sucht die Handler fuer den Routing-Schluessel einer Nachricht, ruft sie
//! nacheinander auf und sendet jede Antwort, bevor der naechste Handler
//! laeuft. Nach einer gesendeten `Trennen`-Antwort werden die restlichen
//! Handler nicht mehr aufgerufen.

use pinguin_core::Fehlerkategorie;
use pinguin_protocol::{xt, Nachricht};

use crate::antwort::Antwort;
use crate::error::{GatewayError, GatewayResult};
use crate::kontext::VerbindungsKontext;
use crate::registry::HandlerRegistry;

/// Wie es nach einer Nachricht mit der Verbindung weitergeht
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fortsetzung {
    Weiter,
    Trennen,
}

pub struct NachrichtenProzessor {
    registry: HandlerRegistry,
}

impl NachrichtenProzessor {
    pub fn neu(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Verarbeitet eine Nachricht
    ///
    /// `Err` nur bei Transportfehlern und kritischen Speicherfehlern.
    pub async fn verarbeiten(
        &self,
        nachricht: &Nachricht,
        kontext: &mut VerbindungsKontext,
    ) -> GatewayResult<Fortsetzung> {
        let schluessel = nachricht.routenschluessel();
        let handler = self.registry.aufloesen(&schluessel);

        if handler.is_empty() {
            tracing::warn!(
                peer = %kontext.peer_addr(),
                schluessel = %schluessel,
                "Kein Handler registriert"
            );
            return Ok(Fortsetzung::Weiter);
        }

        for h in handler {
            let antwort = match h.verarbeiten(nachricht, kontext).await {
                Ok(antwort) => antwort,
                Err(e) if e.ist_kritisch() => {
                    // Client bekommt trotzdem den generischen Fehler
                    let _ = kontext.senden(&xt::unbekannter_fehler()).await;
                    return Err(e);
                }
                Err(GatewayError::Io(e)) => return Err(GatewayError::Io(e)),
                Err(e) => {
                    fehler_loggen(h.name(), kontext, &e);
                    Antwort::Trennen(xt::unbekannter_fehler())
                }
            };

            match antwort {
                Antwort::Regulaer(text) => kontext.senden(&text).await?,
                Antwort::Trennen(text) => {
                    kontext.senden(&text).await?;
                    tracing::info!(
                        peer = %kontext.peer_addr(),
                        handler = h.name(),
                        "Trennung auf Anfrage des Handlers"
                    );
                    return Ok(Fortsetzung::Trennen);
                }
                Antwort::Nichts => {}
            }
        }

        Ok(Fortsetzung::Weiter)
    }
}

fn fehler_loggen(handler: &str, kontext: &VerbindungsKontext, fehler: &GatewayError) {
    match fehler.kategorie() {
        Fehlerkategorie::Invariante | Fehlerkategorie::Transaktion => {
            tracing::error!(peer = %kontext.peer_addr(), handler, fehler = %fehler, "Handler fehlgeschlagen");
        }
        _ => {
            tracing::warn!(peer = %kontext.peer_addr(), handler, fehler = %fehler, "Handler fehlgeschlagen");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::NachrichtenHandler;
    use crate::registry::HandlerEintrag;
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use pinguin_protocol::{aufloesen, NulCodec, Routenschluessel};
    use pinguin_store::StoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::DuplexStream;
    use tokio_util::codec::FramedRead;

    enum Verhalten {
        Antwort(Antwort),
        Fehler,
        Ausfall,
    }

    struct Test {
        verhalten: Verhalten,
        aufrufe: AtomicUsize,
    }

    impl Test {
        fn neu(verhalten: Verhalten) -> Arc<Self> {
            Arc::new(Self {
                verhalten,
                aufrufe: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl NachrichtenHandler for Test {
        fn name(&self) -> &'static str {
            "test"
        }

        async fn verarbeiten(
            &self,
            _nachricht: &Nachricht,
            _kontext: &mut VerbindungsKontext,
        ) -> GatewayResult<Antwort> {
            self.aufrufe.fetch_add(1, Ordering::SeqCst);
            match &self.verhalten {
                Verhalten::Antwort(a) => Ok(a.clone()),
                Verhalten::Fehler => Err(GatewayError::invariante("kaputt")),
                Verhalten::Ausfall => Err(StoreError::NichtErreichbar("weg".into()).into()),
            }
        }
    }

    fn aufbau(
        eintraege: Vec<HandlerEintrag>,
    ) -> (NachrichtenProzessor, VerbindungsKontext, FramedRead<DuplexStream, NulCodec>) {
        let (client, server) = tokio::io::duplex(4096);
        let kontext = VerbindungsKontext::neu("127.0.0.1:5000".parse().unwrap(), server, 4096);
        (
            NachrichtenProzessor::neu(HandlerRegistry::aufbauen(eintraege)),
            kontext,
            FramedRead::new(client, NulCodec::new()),
        )
    }

    async fn gesendet(
        mut kontext: VerbindungsKontext,
        mut frames: FramedRead<DuplexStream, NulCodec>,
    ) -> Vec<String> {
        kontext.schliessen().await;
        let mut alle = Vec::new();
        while let Some(Ok(f)) = frames.next().await {
            alle.push(f);
        }
        alle
    }

    fn rndk() -> Nachricht {
        aufloesen("<msg t='sys'><body action='rndK' r='-1'></body></msg>").unwrap()
    }

    #[tokio::test]
    async fn handler_in_reihenfolge() {
        let a = Test::neu(Verhalten::Antwort(Antwort::regulaer("eins")));
        let b = Test::neu(Verhalten::Antwort(Antwort::Nichts));
        let c = Test::neu(Verhalten::Antwort(Antwort::regulaer("drei")));
        let k = Routenschluessel::xml("rndK");
        let (p, mut kontext, frames) = aufbau(vec![
            HandlerEintrag::anhaengen(k.clone(), a.clone()),
            HandlerEintrag::anhaengen(k.clone(), b.clone()),
            HandlerEintrag::anhaengen(k, c.clone()),
        ]);

        let f = p.verarbeiten(&rndk(), &mut kontext).await.unwrap();
        assert_eq!(f, Fortsetzung::Weiter);
        assert_eq!(gesendet(kontext, frames).await, vec!["eins", "drei"]);
        assert_eq!(b.aufrufe.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn trennen_ueberspringt_rest() {
        let a = Test::neu(Verhalten::Antwort(Antwort::trennen("tschuess")));
        let b = Test::neu(Verhalten::Antwort(Antwort::regulaer("nie")));
        let k = Routenschluessel::xml("rndK");
        let (p, mut kontext, frames) = aufbau(vec![
            HandlerEintrag::anhaengen(k.clone(), a),
            HandlerEintrag::anhaengen(k, b.clone()),
        ]);

        let f = p.verarbeiten(&rndk(), &mut kontext).await.unwrap();
        assert_eq!(f, Fortsetzung::Trennen);
        assert_eq!(b.aufrufe.load(Ordering::SeqCst), 0);
        assert_eq!(gesendet(kontext, frames).await, vec!["tschuess"]);
    }

    #[tokio::test]
    async fn ohne_handler_weiter() {
        let (p, mut kontext, frames) = aufbau(vec![]);
        let leer = aufloesen("<msg t='sys'><body r='0'></body></msg>").unwrap();
        let f = p.verarbeiten(&leer, &mut kontext).await.unwrap();
        assert_eq!(f, Fortsetzung::Weiter);
        assert!(gesendet(kontext, frames).await.is_empty());
    }

    #[tokio::test]
    async fn handlerfehler_wird_generische_trennung() {
        let (p, mut kontext, frames) = aufbau(vec![HandlerEintrag::anhaengen(
            Routenschluessel::xml("rndK"),
            Test::neu(Verhalten::Fehler),
        )]);
        let f = p.verarbeiten(&rndk(), &mut kontext).await.unwrap();
        assert_eq!(f, Fortsetzung::Trennen);
        assert_eq!(gesendet(kontext, frames).await, vec!["%xt%e%-1%0%"]);
    }

    #[tokio::test]
    async fn speicherausfall_wird_eskaliert() {
        let (p, mut kontext, frames) = aufbau(vec![HandlerEintrag::anhaengen(
            Routenschluessel::xml("rndK"),
            Test::neu(Verhalten::Ausfall),
        )]);
        let e = p.verarbeiten(&rndk(), &mut kontext).await.unwrap_err();
        assert!(e.ist_kritisch());
        assert_eq!(gesendet(kontext, frames).await, vec!["%xt%e%-1%0%"]);
    }
}
