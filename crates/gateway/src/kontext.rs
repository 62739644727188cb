//! Verbindungs-Kontext fuer Handler
//!
//! Gehoert exklusiv dem Task der Verbindung. Handler bekommen ihn als
//! `&mut` und koennen darueber beliebig viele Nachrichten senden. Das
//! Spielerverzeichnis haelt nur ein [`VerbindungsHandle`].

use std::net::SocketAddr;

use futures_util::SinkExt;
use pinguin_core::VerbindungsId;
use pinguin_protocol::NulCodec;
use tokio::io::AsyncWrite;
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;

use crate::error::GatewayResult;

type Schreiber = FramedWrite<Box<dyn AsyncWrite + Send + Unpin>, NulCodec>;

/// Nicht-besitzende Referenz auf eine Verbindung
#[derive(Debug, Clone)]
pub struct VerbindungsHandle {
    id: VerbindungsId,
    peer_addr: SocketAddr,
    abbruch: CancellationToken,
}

impl VerbindungsHandle {
    pub fn id(&self) -> VerbindungsId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Beendet die Verbindung von aussen (z.B. doppelter Login)
    pub fn trennen(&self) {
        self.abbruch.cancel();
    }

    pub fn ist_getrennt(&self) -> bool {
        self.abbruch.is_cancelled()
    }
}

pub struct VerbindungsKontext {
    id: VerbindungsId,
    peer_addr: SocketAddr,
    schreiber: Schreiber,
    abbruch: CancellationToken,
}

impl VerbindungsKontext {
    pub fn neu<W>(peer_addr: SocketAddr, schreiber: W, max_frame_bytes: usize) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let schreiber: Box<dyn AsyncWrite + Send + Unpin> = Box::new(schreiber);
        Self {
            id: VerbindungsId::new(),
            peer_addr,
            schreiber: FramedWrite::new(schreiber, NulCodec::with_max_size(max_frame_bytes)),
            abbruch: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> VerbindungsId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn handle(&self) -> VerbindungsHandle {
        VerbindungsHandle {
            id: self.id,
            peer_addr: self.peer_addr,
            abbruch: self.abbruch.clone(),
        }
    }

    pub fn abbruch(&self) -> &CancellationToken {
        &self.abbruch
    }

    /// Sendet eine Nachricht und flusht sofort
    pub async fn senden(&mut self, text: &str) -> GatewayResult<()> {
        tracing::trace!(peer = %self.peer_addr, nachricht = %text, "Sende");
        self.schreiber.send(text.to_string()).await?;
        Ok(())
    }

    /// Schliesst die Schreibseite; Fehler sind hier egal
    pub async fn schliessen(&mut self) {
        if let Err(e) = self.schreiber.close().await {
            tracing::debug!(peer = %self.peer_addr, fehler = %e, "Schliessen fehlgeschlagen");
        }
    }
}
