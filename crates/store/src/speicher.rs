//! In-Prozess-Implementierung des Kurzzeitspeichers
//!
//! Ein einzelner Mutex schuetzt alle Eintraege, damit eine Transaktion
//! vollstaendig isoliert laeuft. Schlaegt ein Befehl fehl, werden alle in
//! dieser Transaktion beruehrten Schluessel auf ihren Ausgangszustand
//! zurueckgesetzt.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::befehl::{Befehl, Transaktion, Wert};
use crate::error::{StoreError, StoreResult};
use crate::EphemeralStore;

/// Nach so vielen Transaktionen werden abgelaufene Eintraege entfernt
const AUFRAEUM_INTERVALL: u64 = 1024;

#[derive(Debug, Clone)]
enum Daten {
    Text(String),
    Hash(BTreeMap<String, String>),
    Menge(BTreeSet<String>),
}

#[derive(Debug, Clone)]
struct Eintrag {
    daten: Daten,
    ablauf: Option<Instant>,
}

impl Eintrag {
    fn neu(daten: Daten) -> Self {
        Self {
            daten,
            ablauf: None,
        }
    }

    fn abgelaufen(&self, jetzt: Instant) -> bool {
        self.ablauf.is_some_and(|a| a <= jetzt)
    }
}

/// Kurzzeitspeicher im Prozess
pub struct MemoryStore {
    eintraege: Mutex<HashMap<String, Eintrag>>,
    verfuegbar: AtomicBool,
    transaktionen: AtomicU64,
}

impl MemoryStore {
    pub fn neu() -> Self {
        Self {
            eintraege: Mutex::new(HashMap::new()),
            verfuegbar: AtomicBool::new(true),
            transaktionen: AtomicU64::new(0),
        }
    }

    /// Schaltet den Speicher ab oder wieder an
    ///
    /// Solange er abgeschaltet ist, scheitert jede Transaktion mit
    /// `NichtErreichbar`.
    pub fn verfuegbar_setzen(&self, verfuegbar: bool) {
        self.verfuegbar.store(verfuegbar, Ordering::SeqCst);
    }

    /// Anzahl nicht abgelaufener Eintraege
    pub fn anzahl(&self) -> usize {
        let jetzt = Instant::now();
        self.eintraege
            .lock()
            .values()
            .filter(|e| !e.abgelaufen(jetzt))
            .count()
    }

    fn befehl_anwenden(
        eintraege: &mut HashMap<String, Eintrag>,
        sicherung: &mut HashMap<String, Option<Eintrag>>,
        befehl: Befehl,
        jetzt: Instant,
    ) -> StoreResult<Wert> {
        let schluessel = befehl.schluessel().to_string();

        if eintraege.get(&schluessel).is_some_and(|e| e.abgelaufen(jetzt)) {
            eintraege.remove(&schluessel);
        }
        sicherung
            .entry(schluessel.clone())
            .or_insert_with(|| eintraege.get(&schluessel).cloned());

        match befehl {
            Befehl::Set { wert, ttl, .. } => {
                let mut eintrag = Eintrag::neu(Daten::Text(wert));
                eintrag.ablauf = ttl.map(|t| jetzt + t);
                eintraege.insert(schluessel, eintrag);
                Ok(Wert::Bool(true))
            }
            Befehl::Get(_) => match eintraege.get(&schluessel) {
                None => Ok(Wert::Nichts),
                Some(Eintrag {
                    daten: Daten::Text(t),
                    ..
                }) => Ok(Wert::Text(t.clone())),
                Some(_) => Err(StoreError::FalscherTyp(schluessel)),
            },
            Befehl::GetDel(_) => match eintraege.get(&schluessel) {
                None => Ok(Wert::Nichts),
                Some(Eintrag {
                    daten: Daten::Text(_),
                    ..
                }) => match eintraege.remove(&schluessel).map(|e| e.daten) {
                    Some(Daten::Text(t)) => Ok(Wert::Text(t)),
                    _ => Ok(Wert::Nichts),
                },
                Some(_) => Err(StoreError::FalscherTyp(schluessel)),
            },
            Befehl::Exists(_) => Ok(Wert::Bool(eintraege.contains_key(&schluessel))),
            Befehl::Incr(_) => {
                let eintrag = eintraege
                    .entry(schluessel.clone())
                    .or_insert_with(|| Eintrag::neu(Daten::Text("0".into())));
                match &mut eintrag.daten {
                    Daten::Text(t) => {
                        let zahl: i64 = t
                            .parse()
                            .map_err(|_| StoreError::KeinZahlwert(schluessel.clone()))?;
                        let neu = zahl
                            .checked_add(1)
                            .ok_or_else(|| StoreError::KeinZahlwert(schluessel.clone()))?;
                        *t = neu.to_string();
                        Ok(Wert::Zahl(neu))
                    }
                    _ => Err(StoreError::FalscherTyp(schluessel)),
                }
            }
            Befehl::Expire { ttl, .. } => match eintraege.get_mut(&schluessel) {
                Some(eintrag) => {
                    eintrag.ablauf = Some(jetzt + ttl);
                    Ok(Wert::Bool(true))
                }
                None => Ok(Wert::Bool(false)),
            },
            Befehl::Ttl(_) => match eintraege.get(&schluessel) {
                None => Ok(Wert::Zahl(-2)),
                Some(Eintrag { ablauf: None, .. }) => Ok(Wert::Zahl(-1)),
                Some(Eintrag {
                    ablauf: Some(a), ..
                }) => Ok(Wert::Zahl(a.saturating_duration_since(jetzt).as_secs() as i64)),
            },
            Befehl::HashGetAll(_) => match eintraege.get(&schluessel) {
                None => Ok(Wert::Hash(Vec::new())),
                Some(Eintrag {
                    daten: Daten::Hash(h),
                    ..
                }) => Ok(Wert::Hash(
                    h.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                )),
                Some(_) => Err(StoreError::FalscherTyp(schluessel)),
            },
            Befehl::HashSet { feld, wert, .. } => {
                let eintrag = eintraege
                    .entry(schluessel.clone())
                    .or_insert_with(|| Eintrag::neu(Daten::Hash(BTreeMap::new())));
                match &mut eintrag.daten {
                    Daten::Hash(h) => Ok(Wert::Bool(h.insert(feld, wert).is_none())),
                    _ => Err(StoreError::FalscherTyp(schluessel)),
                }
            }
            Befehl::SetAdd { mitglied, .. } => {
                let eintrag = eintraege
                    .entry(schluessel.clone())
                    .or_insert_with(|| Eintrag::neu(Daten::Menge(BTreeSet::new())));
                match &mut eintrag.daten {
                    Daten::Menge(m) => Ok(Wert::Bool(m.insert(mitglied))),
                    _ => Err(StoreError::FalscherTyp(schluessel)),
                }
            }
            Befehl::SetRem { mitglied, .. } => match eintraege.get_mut(&schluessel) {
                None => Ok(Wert::Bool(false)),
                Some(Eintrag {
                    daten: Daten::Menge(m),
                    ..
                }) => Ok(Wert::Bool(m.remove(&mitglied))),
                Some(_) => Err(StoreError::FalscherTyp(schluessel)),
            },
            Befehl::SetContains { mitglied, .. } => match eintraege.get(&schluessel) {
                None => Ok(Wert::Bool(false)),
                Some(Eintrag {
                    daten: Daten::Menge(m),
                    ..
                }) => Ok(Wert::Bool(m.contains(&mitglied))),
                Some(_) => Err(StoreError::FalscherTyp(schluessel)),
            },
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::neu()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("eintraege", &self.eintraege.lock().len())
            .field("verfuegbar", &self.verfuegbar.load(Ordering::SeqCst))
            .finish()
    }
}

#[async_trait]
impl EphemeralStore for MemoryStore {
    async fn ausfuehren(&self, transaktion: Transaktion) -> StoreResult<Vec<Wert>> {
        if !self.verfuegbar.load(Ordering::SeqCst) {
            return Err(StoreError::NichtErreichbar("Speicher abgeschaltet".into()));
        }

        let jetzt = Instant::now();
        let mut eintraege = self.eintraege.lock();

        if self.transaktionen.fetch_add(1, Ordering::Relaxed) % AUFRAEUM_INTERVALL == 0 {
            eintraege.retain(|_, e| !e.abgelaufen(jetzt));
        }

        let mut sicherung: HashMap<String, Option<Eintrag>> = HashMap::new();
        let mut ergebnisse = Vec::with_capacity(transaktion.len());

        for befehl in transaktion.in_befehle() {
            match Self::befehl_anwenden(&mut eintraege, &mut sicherung, befehl, jetzt) {
                Ok(wert) => ergebnisse.push(wert),
                Err(e) => {
                    // Alle beruehrten Schluessel zuruecksetzen
                    for (schluessel, alt) in sicherung {
                        match alt {
                            Some(eintrag) => {
                                eintraege.insert(schluessel, eintrag);
                            }
                            None => {
                                eintraege.remove(&schluessel);
                            }
                        }
                    }
                    tracing::debug!(fehler = %e, "Transaktion zurueckgerollt");
                    return Err(StoreError::TransaktionAbgebrochen(e.to_string()));
                }
            }
        }

        Ok(ergebnisse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn set_und_get() {
        let store = MemoryStore::neu();
        let werte = store
            .ausfuehren(Transaktion::neu().set("a", "1", None).get("a").get("b"))
            .await
            .unwrap();
        assert_eq!(
            werte,
            vec![Wert::Bool(true), Wert::Text("1".into()), Wert::Nichts]
        );
    }

    #[tokio::test]
    async fn get_del_ist_einmalig() {
        let store = MemoryStore::neu();
        store
            .ausfuehren(Transaktion::neu().set("pingu.lkey", "abc", None))
            .await
            .unwrap();

        let erstes = store
            .ausfuehren(Transaktion::neu().get_del("pingu.lkey"))
            .await
            .unwrap();
        assert_eq!(erstes, vec![Wert::Text("abc".into())]);

        let zweites = store
            .ausfuehren(Transaktion::neu().get_del("pingu.lkey"))
            .await
            .unwrap();
        assert_eq!(zweites, vec![Wert::Nichts]);
    }

    #[tokio::test]
    async fn incr_und_ttl() {
        let store = MemoryStore::neu();
        let werte = store
            .ausfuehren(
                Transaktion::neu()
                    .incr("h.flood")
                    .expire("h.flood", Duration::from_secs(3600))
                    .ttl("h.flood")
                    .ttl("fehlt"),
            )
            .await
            .unwrap();
        assert_eq!(werte[0], Wert::Zahl(1));
        assert_eq!(werte[1], Wert::Bool(true));
        assert_eq!(werte[2], Wert::Zahl(3600));
        assert_eq!(werte[3], Wert::Zahl(-2));
    }

    #[tokio::test(start_paused = true)]
    async fn ablauf_entfernt_eintrag() {
        let store = MemoryStore::neu();
        store
            .ausfuehren(Transaktion::neu().set("k", "v", Some(Duration::from_secs(180))))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(179)).await;
        assert_eq!(store.lesen("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.lesen("k").await.unwrap(), None);
        assert_eq!(store.anzahl(), 0);
    }

    #[tokio::test]
    async fn fehler_rollt_alles_zurueck() {
        let store = MemoryStore::neu();
        store
            .ausfuehren(Transaktion::neu().hash_set("h", "f", "1").set("x", "alt", None))
            .await
            .unwrap();

        // Incr auf einen Hash scheitert, vorherige Befehle duerfen nicht bleiben
        let ergebnis = store
            .ausfuehren(
                Transaktion::neu()
                    .set("x", "neu", None)
                    .set("y", "neu", None)
                    .incr("h"),
            )
            .await;
        assert!(matches!(
            ergebnis,
            Err(StoreError::TransaktionAbgebrochen(_))
        ));

        assert_eq!(store.lesen("x").await.unwrap().as_deref(), Some("alt"));
        assert_eq!(store.lesen("y").await.unwrap(), None);
    }

    #[tokio::test]
    async fn mengen_und_hashes() {
        let store = MemoryStore::neu();
        let werte = store
            .ausfuehren(
                Transaktion::neu()
                    .set_add("houdini.players.1", "101")
                    .set_add("houdini.players.1", "101")
                    .set_contains("houdini.players.1", "101")
                    .set_contains("houdini.players.1", "102")
                    .hash_set("houdini.population", "1", "1")
                    .hash_get_all("houdini.population")
                    .set_rem("houdini.players.1", "101")
                    .set_contains("houdini.players.1", "101"),
            )
            .await
            .unwrap();
        assert_eq!(
            werte,
            vec![
                Wert::Bool(true),
                Wert::Bool(false),
                Wert::Bool(true),
                Wert::Bool(false),
                Wert::Bool(true),
                Wert::Hash(vec![("1".into(), "1".into())]),
                Wert::Bool(true),
                Wert::Bool(false),
            ]
        );
    }

    #[tokio::test]
    async fn abgeschaltet() {
        let store = MemoryStore::neu();
        store.verfuegbar_setzen(false);
        let err = store.lesen("a").await.unwrap_err();
        assert!(err.ist_kritisch());

        store.verfuegbar_setzen(true);
        assert_eq!(store.lesen("a").await.unwrap(), None);
    }
}
