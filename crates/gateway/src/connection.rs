//! Verbindungs-Engine – verarbeitet eine einzelne Client-Verbindung
//!
//! Jede akzeptierte Verbindung laeuft in einem eigenen tokio-Task. Frames
//! werden strikt nacheinander verarbeitet: erst wenn alle Antworten einer
//! Nachricht gesendet sind, wird der naechste Frame gelesen.
//!
//! Die Schleife endet bei
//! - Stream-Ende oder Lesefehler
//! - leerem Frame
//! - ungueltigem oder unbekanntem Nachrichtenformat (ohne Antwort)
//! - `Trennen`-Antwort eines Handlers
//! - Abbruch von aussen (doppelter Login) oder Shutdown
//!
//! Danach wird die Schreibseite geschlossen und die Dienst-Politik raeumt auf.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::StreamExt;
use pinguin_protocol::{aufloesen, NulCodec};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio_util::codec::FramedRead;

use crate::dienst::DienstPolitik;
use crate::kontext::VerbindungsKontext;
use crate::processor::{Fortsetzung, NachrichtenProzessor};

/// Gemeinsamer Zustand aller Verbindungen eines Gateways
pub struct GatewayZustand {
    pub politik: Arc<dyn DienstPolitik>,
    pub prozessor: NachrichtenProzessor,
    pub max_frame_bytes: usize,
}

impl GatewayZustand {
    pub fn neu(
        politik: Arc<dyn DienstPolitik>,
        prozessor: NachrichtenProzessor,
        max_frame_bytes: usize,
    ) -> Self {
        Self {
            politik,
            prozessor,
            max_frame_bytes,
        }
    }
}

/// Warum eine Verbindung endete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trennungsgrund {
    StreamEnde,
    LeererFrame,
    Transportfehler,
    UngueltigeNachricht,
    Handler,
    Abgeloest,
    Shutdown,
    Eskaliert,
}

pub struct Verbindung {
    zustand: Arc<GatewayZustand>,
    peer_addr: SocketAddr,
}

impl Verbindung {
    pub fn neu(zustand: Arc<GatewayZustand>, peer_addr: SocketAddr) -> Self {
        Self { zustand, peer_addr }
    }

    /// Verarbeitet den Stream bis zur Trennung
    pub async fn verarbeiten<S>(
        self,
        stream: S,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Trennungsgrund
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let peer_addr = self.peer_addr;
        let dienst = self.zustand.politik.name();
        let max = self.zustand.max_frame_bytes;

        let (leser, schreiber) = tokio::io::split(stream);
        let mut frames = FramedRead::new(leser, NulCodec::with_max_size(max));
        let mut kontext = VerbindungsKontext::neu(peer_addr, schreiber, max);
        let abbruch = kontext.abbruch().clone();

        tracing::info!(peer = %peer_addr, dienst, verbindung = %kontext.id(), "Neue Verbindung");

        let grund = loop {
            tokio::select! {
                _ = abbruch.cancelled() => {
                    tracing::info!(peer = %peer_addr, "Verbindung von aussen beendet");
                    break Trennungsgrund::Abgeloest;
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        break Trennungsgrund::Shutdown;
                    }
                }

                frame = frames.next() => {
                    let text = match frame {
                        Some(Ok(text)) => text,
                        Some(Err(e)) => {
                            tracing::warn!(peer = %peer_addr, fehler = %e, "Frame-Lesefehler");
                            break Trennungsgrund::Transportfehler;
                        }
                        None => {
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break Trennungsgrund::StreamEnde;
                        }
                    };

                    tracing::trace!(peer = %peer_addr, frame = %text, "Empfangen");

                    if text.trim().is_empty() {
                        tracing::debug!(peer = %peer_addr, "Leerer Frame");
                        break Trennungsgrund::LeererFrame;
                    }

                    let nachricht = match aufloesen(&text) {
                        Ok(n) => n,
                        Err(e) => {
                            tracing::warn!(peer = %peer_addr, fehler = %e, "Nachricht nicht lesbar");
                            break Trennungsgrund::UngueltigeNachricht;
                        }
                    };

                    match self.zustand.prozessor.verarbeiten(&nachricht, &mut kontext).await {
                        Ok(Fortsetzung::Weiter) => {}
                        Ok(Fortsetzung::Trennen) => break Trennungsgrund::Handler,
                        Err(e) if e.ist_kritisch() => {
                            tracing::error!(
                                target: "pinguin::alarm",
                                peer = %peer_addr,
                                dienst,
                                fehler = %e,
                                "Kurzzeitspeicher nicht erreichbar"
                            );
                            break Trennungsgrund::Eskaliert;
                        }
                        Err(e) => {
                            tracing::warn!(peer = %peer_addr, fehler = %e, "Senden fehlgeschlagen");
                            break Trennungsgrund::Transportfehler;
                        }
                    }
                }
            }
        };

        kontext.schliessen().await;
        self.zustand.politik.bei_trennung(kontext.id()).await;

        tracing::info!(peer = %peer_addr, dienst, grund = ?grund, "Verbindungs-Task beendet");
        grund
    }
}
