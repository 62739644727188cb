//! Flood-Schutz fuer das Login-Gateway
//!
//! Zaehlt fehlgeschlagene Logins pro Host (nur Adresse, kein Port). Zaehler
//! und Ablaufzeit werden in einer Transaktion gesetzt, damit ein Zaehler nie
//! ohne Fenster stehen bleibt.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pinguin_store::{schluessel, EphemeralStore, Transaktion};

use crate::error::{AuthError, AuthResult};

/// Host-Teil einer Peer-Adresse
pub fn host_von(addr: &SocketAddr) -> String {
    addr.ip().to_string()
}

pub struct FloodSchutz {
    store: Arc<dyn EphemeralStore>,
    limit: u64,
    fenster: Duration,
}

impl FloodSchutz {
    pub fn neu(store: Arc<dyn EphemeralStore>, limit: u64, fenster: Duration) -> Self {
        Self {
            store,
            limit,
            fenster,
        }
    }

    /// Lehnt ab, wenn der Zaehler des Hosts das Limit ueberschreitet
    pub async fn pruefen(&self, host: &str) -> AuthResult<()> {
        let stand = self.store.lesen(&schluessel::flood(host)).await?;

        let versuche = match stand {
            Some(text) => text
                .parse::<u64>()
                .map_err(|_| AuthError::invariante(format!("Flood-Zaehler '{text}' keine Zahl")))?,
            None => return Ok(()),
        };

        if versuche > self.limit {
            tracing::warn!(host = %host, versuche, "Login gedrosselt");
            return Err(AuthError::Gedrosselt);
        }
        Ok(())
    }

    /// Zaehlt einen Fehlversuch und setzt das Fenster neu
    ///
    /// Gibt den neuen Zaehlerstand zurueck.
    pub async fn fehlversuch(&self, host: &str) -> AuthResult<i64> {
        let key = schluessel::flood(host);
        let werte = self
            .store
            .ausfuehren(
                Transaktion::neu()
                    .incr(&key)
                    .expire(&key, self.fenster)
                    .ttl(&key),
            )
            .await
            .map_err(|e| AuthError::transaktion(format!("Flood-Zaehler {key}: {e}")))?;

        let stand = werte
            .first()
            .and_then(|w| w.als_zahl())
            .ok_or_else(|| AuthError::transaktion(format!("Flood-Zaehler {key}: keine Antwort")))?;
        let restzeit = werte.get(2).and_then(|w| w.als_zahl()).unwrap_or(-1);

        tracing::info!(key = %key, stand, restzeit, "Flood-Zaehler erhoeht");
        Ok(stand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinguin_store::MemoryStore;

    fn schutz(store: Arc<MemoryStore>) -> FloodSchutz {
        FloodSchutz::neu(store, 3, Duration::from_secs(3600))
    }

    #[test]
    fn host_ohne_port() {
        let addr: SocketAddr = "10.1.2.3:50123".parse().unwrap();
        assert_eq!(host_von(&addr), "10.1.2.3");
    }

    #[tokio::test(start_paused = true)]
    async fn sperre_nach_vier_fehlversuchen_und_freigabe_nach_fenster() {
        let store = Arc::new(MemoryStore::neu());
        let flood = schutz(store.clone());

        for i in 1..=4 {
            flood.pruefen("1.2.3.4").await.expect("noch nicht gedrosselt");
            assert_eq!(flood.fehlversuch("1.2.3.4").await.unwrap(), i);
        }

        // Fuenfter Versuch wird vor der Passwortpruefung abgelehnt
        assert!(matches!(
            flood.pruefen("1.2.3.4").await,
            Err(AuthError::Gedrosselt)
        ));
        // Andere Hosts sind nicht betroffen
        flood.pruefen("5.6.7.8").await.unwrap();

        tokio::time::advance(Duration::from_secs(3601)).await;
        flood.pruefen("1.2.3.4").await.expect("Fenster abgelaufen");
    }

    #[tokio::test]
    async fn ausfall_beim_zaehlen_ist_transaktionsfehler() {
        let store = Arc::new(MemoryStore::neu());
        let flood = schutz(store.clone());
        store.verfuegbar_setzen(false);

        assert!(matches!(
            flood.fehlversuch("1.2.3.4").await,
            Err(AuthError::Transaktion(_))
        ));
    }
}
