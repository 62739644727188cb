//! TCP-Listener – bindet den Port eines Gateways und akzeptiert Verbindungen
//!
//! Jede Verbindung bekommt einen eigenen Task im `JoinSet` des Servers. Beim
//! Shutdown stoppt zuerst der Accept-Loop, danach haben die laufenden
//! Verbindungen eine Gnadenfrist. Was dann noch laeuft, wird abgebrochen.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::connection::{GatewayZustand, Verbindung};

pub struct GatewayServer {
    zustand: Arc<GatewayZustand>,
    listener: TcpListener,
    gnadenfrist: Duration,
}

impl GatewayServer {
    /// Bindet den Socket; Port 0 waehlt einen freien Port
    pub async fn binden(
        zustand: Arc<GatewayZustand>,
        bind_addr: SocketAddr,
        gnadenfrist: Duration,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        Ok(Self {
            zustand,
            listener,
            gnadenfrist,
        })
    }

    pub fn lokale_adresse(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Akzeptiert Verbindungen bis `shutdown_rx` `true` meldet
    pub async fn starten(self, mut shutdown_rx: watch::Receiver<bool>) -> std::io::Result<()> {
        let dienst = self.zustand.politik.name();
        let adresse = self.listener.local_addr()?;
        let mut verbindungen = JoinSet::new();

        tracing::info!(dienst, adresse = %adresse, "Gateway gestartet");

        if !*shutdown_rx.borrow() {
            loop {
                tokio::select! {
                    result = self.listener.accept() => {
                        match result {
                            Ok((stream, peer_addr)) => {
                                if let Err(e) = stream.set_nodelay(true) {
                                    tracing::debug!(peer = %peer_addr, fehler = %e, "TCP_NODELAY nicht gesetzt");
                                }
                                tracing::debug!(dienst, peer = %peer_addr, "Verbindung akzeptiert");

                                let verbindung = Verbindung::neu(Arc::clone(&self.zustand), peer_addr);
                                verbindungen.spawn(verbindung.verarbeiten(stream, shutdown_rx.clone()));
                            }
                            Err(e) => {
                                tracing::error!(dienst, fehler = %e, "TCP-Accept-Fehler");
                                tokio::time::sleep(Duration::from_millis(10)).await;
                            }
                        }
                    }

                    // Beendete Tasks einsammeln
                    Some(_) = verbindungen.join_next(), if !verbindungen.is_empty() => {}

                    Ok(()) = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!(dienst, "Shutdown-Signal empfangen");
                            break;
                        }
                    }
                }
            }
        }

        drop(self.listener);

        let offen = verbindungen.len();
        let beendet = tokio::time::timeout(self.gnadenfrist, async {
            while verbindungen.join_next().await.is_some() {}
        })
        .await;

        if beendet.is_err() {
            tracing::warn!(
                dienst,
                offen = verbindungen.len(),
                "Gnadenfrist abgelaufen – Verbindungen werden abgebrochen"
            );
            verbindungen.shutdown().await;
        }

        tracing::info!(dienst, verbindungen = offen, "Gateway gestoppt");
        Ok(())
    }
}
