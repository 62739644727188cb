//! Spielerverzeichnis – wer ist auf dieser Instanz online
//!
//! Zwei Indizes (PID und Verbindung) ueber dieselben Sitzungen, beide hinter
//! einem einzigen Mutex. Geaendert wird nur ueber `hinzufuegen` und
//! `entfernen`.
//!
//! - Eine Verbindung gehoert zu hoechstens einer Sitzung. Eine zweite
//!   Registrierung derselben Verbindung ist ein Invariantenfehler.
//! - Eine PID zeigt auf hoechstens eine Sitzung. Kommt dieselbe PID erneut,
//!   ersetzt die neue Sitzung den PID-Eintrag und die verdraengte Sitzung
//!   wird zurueckgegeben. Der Aufrufer muss sie trennen.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pinguin_core::{Pid, VerbindungsId};
use pinguin_db::SpielerRecord;

use crate::error::{GatewayError, GatewayResult};
use crate::kontext::VerbindungsHandle;

/// Sitzung eines eingeloggten Spielers
#[derive(Debug)]
pub struct Spieler {
    pid: Pid,
    /// Profil zum Login-Zeitpunkt, wird nicht aktualisiert
    profil: SpielerRecord,
    verbindung: VerbindungsHandle,
    beigetreten: AtomicBool,
}

impl Spieler {
    pub fn neu(profil: SpielerRecord, verbindung: VerbindungsHandle) -> Self {
        Self {
            pid: profil.id,
            profil,
            verbindung,
            beigetreten: AtomicBool::new(false),
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn username(&self) -> &str {
        &self.profil.username
    }

    pub fn profil(&self) -> &SpielerRecord {
        &self.profil
    }

    pub fn verbindung(&self) -> &VerbindungsHandle {
        &self.verbindung
    }

    pub fn ist_beigetreten(&self) -> bool {
        self.beigetreten.load(Ordering::Acquire)
    }

    pub(crate) fn beitritt_setzen(&self, wert: bool) {
        self.beigetreten.store(wert, Ordering::Release);
    }
}

#[derive(Default)]
struct Indizes {
    nach_pid: HashMap<Pid, Arc<Spieler>>,
    nach_verbindung: HashMap<VerbindungsId, Arc<Spieler>>,
}

#[derive(Default)]
pub struct SpielerVerzeichnis {
    inneres: Mutex<Indizes>,
}

impl SpielerVerzeichnis {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert eine Sitzung
    ///
    /// Gibt die verdraengte Sitzung mit derselben PID zurueck, falls es eine
    /// gab.
    pub fn hinzufuegen(&self, spieler: Arc<Spieler>) -> GatewayResult<Option<Arc<Spieler>>> {
        let mut indizes = self.inneres.lock();
        let verbindung = spieler.verbindung.id();

        if indizes.nach_verbindung.contains_key(&verbindung) {
            tracing::error!(
                pid = %spieler.pid,
                verbindung = %verbindung,
                "Verbindung doppelt im Spielerverzeichnis"
            );
            return Err(GatewayError::invariante(format!(
                "{verbindung} ist bereits registriert"
            )));
        }

        indizes.nach_verbindung.insert(verbindung, spieler.clone());
        let verdraengt = indizes.nach_pid.insert(spieler.pid, spieler.clone());

        if let Some(alt) = &verdraengt {
            // Die alte Verbindung bleibt bis zur Trennung nachschlagbar,
            // zeigt aber nicht mehr auf die PID
            tracing::warn!(
                pid = %spieler.pid,
                alt = %alt.verbindung.id(),
                neu = %verbindung,
                "PID bereits registriert, alte Sitzung verdraengt"
            );
        }

        tracing::debug!(pid = %spieler.pid, verbindung = %verbindung, "Spieler registriert");
        Ok(verdraengt)
    }

    /// Entfernt die Sitzung einer Verbindung aus beiden Indizes
    pub fn entfernen(&self, verbindung: VerbindungsId) -> Option<Arc<Spieler>> {
        let mut indizes = self.inneres.lock();
        let spieler = indizes.nach_verbindung.remove(&verbindung)?;

        let gehoert_pid = indizes
            .nach_pid
            .get(&spieler.pid)
            .is_some_and(|s| s.verbindung.id() == verbindung);
        if gehoert_pid {
            indizes.nach_pid.remove(&spieler.pid);
        }

        tracing::debug!(pid = %spieler.pid, verbindung = %verbindung, "Spieler entfernt");
        Some(spieler)
    }

    pub fn nach_pid(&self, pid: Pid) -> Option<Arc<Spieler>> {
        self.inneres.lock().nach_pid.get(&pid).cloned()
    }

    pub fn nach_verbindung(&self, verbindung: VerbindungsId) -> Option<Arc<Spieler>> {
        self.inneres.lock().nach_verbindung.get(&verbindung).cloned()
    }

    pub fn alle(&self) -> Vec<Arc<Spieler>> {
        self.inneres.lock().nach_pid.values().cloned().collect()
    }

    pub fn anzahl(&self) -> usize {
        self.inneres.lock().nach_pid.len()
    }

    /// Spieler, die der Welt beigetreten sind
    pub fn beigetreten_anzahl(&self) -> usize {
        self.inneres
            .lock()
            .nach_pid
            .values()
            .filter(|s| s.ist_beigetreten())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kontext::VerbindungsKontext;
    use tokio::io::DuplexStream;

    fn verbindung() -> (VerbindungsKontext, DuplexStream) {
        let (client, server) = tokio::io::duplex(64);
        (
            VerbindungsKontext::neu("127.0.0.1:1".parse().unwrap(), server, 64),
            client,
        )
    }

    fn spieler(pid: u32, name: &str, kontext: &VerbindungsKontext) -> Arc<Spieler> {
        Arc::new(Spieler::neu(
            SpielerRecord::neu(Pid(pid), name, "hash"),
            kontext.handle(),
        ))
    }

    #[tokio::test]
    async fn hinzufuegen_und_nachschlagen() {
        let verzeichnis = SpielerVerzeichnis::neu();
        let (c1, _r1) = verbindung();
        verzeichnis.hinzufuegen(spieler(101, "basil", &c1)).unwrap();

        assert_eq!(verzeichnis.nach_pid(Pid(101)).unwrap().username(), "basil");
        assert_eq!(verzeichnis.nach_verbindung(c1.id()).unwrap().pid(), Pid(101));
        assert!(verzeichnis.nach_pid(Pid(7)).is_none());
        assert_eq!(verzeichnis.anzahl(), 1);
    }

    #[tokio::test]
    async fn doppelte_verbindung_ist_invariantenfehler() {
        let verzeichnis = SpielerVerzeichnis::neu();
        let (c1, _r1) = verbindung();
        verzeichnis.hinzufuegen(spieler(101, "basil", &c1)).unwrap();

        let e = verzeichnis.hinzufuegen(spieler(102, "andere", &c1)).unwrap_err();
        assert!(matches!(e, GatewayError::Invariante(_)));
        // Verzeichnis unveraendert
        assert!(verzeichnis.nach_pid(Pid(102)).is_none());
        assert_eq!(verzeichnis.nach_verbindung(c1.id()).unwrap().pid(), Pid(101));
    }

    #[tokio::test]
    async fn gleiche_pid_auf_neuer_verbindung() {
        let verzeichnis = SpielerVerzeichnis::neu();
        let (c1, _r1) = verbindung();
        let (c2, _r2) = verbindung();

        verzeichnis.hinzufuegen(spieler(101, "basil", &c1)).unwrap();
        let verdraengt = verzeichnis
            .hinzufuegen(spieler(101, "basil", &c2))
            .unwrap()
            .expect("alte Sitzung erwartet");
        assert_eq!(verdraengt.verbindung().id(), c1.id());

        // Aufrufer trennt und entfernt die alte Sitzung
        verdraengt.verbindung().trennen();
        assert!(c1.abbruch().is_cancelled());
        verzeichnis.entfernen(c1.id());

        assert_eq!(verzeichnis.nach_pid(Pid(101)).unwrap().verbindung().id(), c2.id());
        assert!(verzeichnis.nach_verbindung(c1.id()).is_none());
        assert_eq!(verzeichnis.anzahl(), 1);
    }

    #[tokio::test]
    async fn erst_entfernen_dann_neu() {
        let verzeichnis = SpielerVerzeichnis::neu();
        let (c1, _r1) = verbindung();
        let (c2, _r2) = verbindung();

        verzeichnis.hinzufuegen(spieler(101, "basil", &c1)).unwrap();
        verzeichnis.entfernen(c1.id()).unwrap();
        assert!(verzeichnis
            .hinzufuegen(spieler(101, "basil", &c2))
            .unwrap()
            .is_none());

        assert_eq!(verzeichnis.nach_pid(Pid(101)).unwrap().verbindung().id(), c2.id());
        assert!(verzeichnis.nach_verbindung(c1.id()).is_none());
        assert!(verzeichnis.entfernen(c1.id()).is_none());
    }

    #[tokio::test]
    async fn beigetreten_zaehlen() {
        let verzeichnis = SpielerVerzeichnis::neu();
        let (c1, _r1) = verbindung();
        let (c2, _r2) = verbindung();
        let a = spieler(1, "a", &c1);
        verzeichnis.hinzufuegen(a.clone()).unwrap();
        verzeichnis.hinzufuegen(spieler(2, "b", &c2)).unwrap();

        assert_eq!(verzeichnis.beigetreten_anzahl(), 0);
        a.beitritt_setzen(true);
        assert_eq!(verzeichnis.beigetreten_anzahl(), 1);
        assert_eq!(verzeichnis.alle().len(), 2);
    }
}
