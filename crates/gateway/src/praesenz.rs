//! Online-Praesenz einer Spiel-Instanz im Kurzzeitspeicher
//!
//! Haelt `houdini.players.{dienst}` (Online-PIDs) und den Zaehler der
//! Instanz in `houdini.population` passend zum Spielerverzeichnis. Beide
//! werden immer in einer Transaktion geschrieben. Zaehlen und Schreiben
//! laufen unter `schreibsperre`, damit kein aelterer Zaehlerstand einen
//! neueren ueberschreibt.

use std::sync::Arc;

use pinguin_core::{DienstId, VerbindungsId};
use pinguin_store::{schluessel, EphemeralStore, Transaktion};
use tokio::sync::Mutex;

use crate::error::GatewayResult;
use crate::verzeichnis::{Spieler, SpielerVerzeichnis};

pub struct Praesenz {
    dienst: DienstId,
    verzeichnis: Arc<SpielerVerzeichnis>,
    store: Arc<dyn EphemeralStore>,
    schreibsperre: Mutex<()>,
}

impl Praesenz {
    pub fn neu(
        dienst: DienstId,
        verzeichnis: Arc<SpielerVerzeichnis>,
        store: Arc<dyn EphemeralStore>,
    ) -> Self {
        Self {
            dienst,
            verzeichnis,
            store,
            schreibsperre: Mutex::new(()),
        }
    }

    pub fn dienst(&self) -> DienstId {
        self.dienst
    }

    pub fn verzeichnis(&self) -> &Arc<SpielerVerzeichnis> {
        &self.verzeichnis
    }

    pub fn store(&self) -> &Arc<dyn EphemeralStore> {
        &self.store
    }

    /// Markiert den Spieler als beigetreten und meldet ihn online
    pub async fn beigetreten(&self, spieler: &Spieler) -> GatewayResult<()> {
        let _sperre = self.schreibsperre.lock().await;
        spieler.beitritt_setzen(true);
        let anzahl = self.verzeichnis.beigetreten_anzahl();

        self.store
            .ausfuehren(
                Transaktion::neu()
                    .set_add(&schluessel::spieler_set(self.dienst), &spieler.pid().to_string())
                    .hash_set(
                        schluessel::POPULATION,
                        &self.dienst.to_string(),
                        &anzahl.to_string(),
                    ),
            )
            .await?;

        tracing::debug!(pid = %spieler.pid(), dienst = %self.dienst, anzahl, "Spieler online gemeldet");
        Ok(())
    }

    /// Entfernt die Sitzung einer Verbindung und raeumt die Praesenz auf
    ///
    /// Fehler beim Aufraeumen werden nur geloggt.
    pub async fn trennen(&self, verbindung: VerbindungsId) -> Option<Arc<Spieler>> {
        let spieler = self.verzeichnis.entfernen(verbindung)?;
        self.abmelden(&spieler).await;
        Some(spieler)
    }

    async fn abmelden(&self, spieler: &Spieler) {
        if !spieler.ist_beigetreten() {
            return;
        }
        let _sperre = self.schreibsperre.lock().await;
        spieler.beitritt_setzen(false);

        // Eine neuere Sitzung derselben PID bleibt in der Menge
        let pid_noch_online = self
            .verzeichnis
            .nach_pid(spieler.pid())
            .is_some_and(|s| s.ist_beigetreten());
        let anzahl = self.verzeichnis.beigetreten_anzahl();

        let mut transaktion = Transaktion::neu();
        if !pid_noch_online {
            transaktion =
                transaktion.set_rem(&schluessel::spieler_set(self.dienst), &spieler.pid().to_string());
        }
        transaktion =
            transaktion.hash_set(schluessel::POPULATION, &self.dienst.to_string(), &anzahl.to_string());

        match self.store.ausfuehren(transaktion).await {
            Ok(_) => {
                tracing::debug!(pid = %spieler.pid(), dienst = %self.dienst, anzahl, "Spieler offline gemeldet");
            }
            Err(e) if e.ist_kritisch() => {
                tracing::error!(
                    target: "pinguin::alarm",
                    pid = %spieler.pid(),
                    fehler = %e,
                    "Kurzzeitspeicher beim Abmelden nicht erreichbar"
                );
            }
            Err(e) => {
                tracing::warn!(pid = %spieler.pid(), fehler = %e, "Abmelden im Kurzzeitspeicher fehlgeschlagen");
            }
        }
    }
}
