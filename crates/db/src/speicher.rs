//! In-Memory-Repository fuer Tests und lokale Entwicklung

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use pinguin_core::Pid;

use crate::error::DbError;
use crate::models::{BanRecord, NeuerBan, SpielerRecord};
use crate::repository::{DbResult, SpielerRepository, SpielerVerwaltung};

#[derive(Debug, Default)]
struct Inhalt {
    spieler: HashMap<Pid, SpielerRecord>,
    buddies: HashMap<Pid, BTreeSet<Pid>>,
    bans: Vec<BanRecord>,
}

/// Spieler-Repository ohne Datenbank
#[derive(Debug, Default)]
pub struct SpeicherRepository {
    inhalt: RwLock<Inhalt>,
}

impl SpeicherRepository {
    pub fn neu() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpielerRepository for SpeicherRepository {
    async fn nach_name(&self, username: &str) -> DbResult<Option<SpielerRecord>> {
        let name = username.to_lowercase();
        Ok(self
            .inhalt
            .read()
            .spieler
            .values()
            .find(|s| s.username == name)
            .cloned())
    }

    async fn nach_id(&self, id: Pid) -> DbResult<Option<SpielerRecord>> {
        Ok(self.inhalt.read().spieler.get(&id).cloned())
    }

    async fn buddies(&self, id: Pid) -> DbResult<Vec<Pid>> {
        Ok(self
            .inhalt
            .read()
            .buddies
            .get(&id)
            .map(|b| b.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn aktiver_ban(&self, id: Pid, jetzt: DateTime<Utc>) -> DbResult<Option<BanRecord>> {
        Ok(self
            .inhalt
            .read()
            .bans
            .iter()
            .filter(|b| b.spieler_id == id && b.laeuft_ab > jetzt)
            .max_by_key(|b| b.laeuft_ab)
            .cloned())
    }
}

#[async_trait]
impl SpielerVerwaltung for SpeicherRepository {
    async fn anlegen(&self, spieler: &SpielerRecord) -> DbResult<()> {
        let mut inhalt = self.inhalt.write();
        let name = spieler.username.to_lowercase();
        if inhalt.spieler.contains_key(&spieler.id)
            || inhalt.spieler.values().any(|s| s.username == name)
        {
            return Err(DbError::Eindeutigkeit(format!("'{}'", spieler.username)));
        }
        let mut neu = spieler.clone();
        neu.username = name;
        inhalt.spieler.insert(neu.id, neu);
        Ok(())
    }

    async fn buddy_hinzufuegen(&self, id: Pid, buddy: Pid) -> DbResult<()> {
        let mut inhalt = self.inhalt.write();
        if !inhalt.spieler.contains_key(&id) || !inhalt.spieler.contains_key(&buddy) {
            return Err(DbError::nicht_gefunden(format!("Spieler {id} oder {buddy}")));
        }
        inhalt.buddies.entry(id).or_default().insert(buddy);
        Ok(())
    }

    async fn ban_anlegen(&self, ban: NeuerBan<'_>) -> DbResult<BanRecord> {
        let mut inhalt = self.inhalt.write();
        let record = BanRecord {
            id: inhalt.bans.len() as i64 + 1,
            spieler_id: ban.spieler_id,
            grund: ban.grund.to_string(),
            laeuft_ab: ban.laeuft_ab,
            erstellt_am: Utc::now(),
        };
        inhalt.bans.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn anlegen_und_laden() {
        let repo = SpeicherRepository::neu();
        repo.anlegen(&SpielerRecord::neu(Pid(101), "Basil", "hash"))
            .await
            .unwrap();

        let s = repo.nach_name("BASIL").await.unwrap().unwrap();
        assert_eq!(s.id, Pid(101));
        assert!(repo.nach_id(Pid(102)).await.unwrap().is_none());

        let err = repo
            .anlegen(&SpielerRecord::neu(Pid(102), "basil", "x"))
            .await
            .unwrap_err();
        assert!(err.ist_eindeutigkeit());
    }

    #[tokio::test]
    async fn laengster_aktiver_ban() {
        let repo = SpeicherRepository::neu();
        repo.anlegen(&SpielerRecord::neu(Pid(1), "a", "h")).await.unwrap();
        let jetzt = Utc::now();

        for stunden in [-2, 5, 30] {
            repo.ban_anlegen(NeuerBan {
                spieler_id: Pid(1),
                grund: "test",
                laeuft_ab: jetzt + Duration::hours(stunden),
            })
            .await
            .unwrap();
        }

        let ban = repo.aktiver_ban(Pid(1), jetzt).await.unwrap().unwrap();
        assert_eq!(ban.laeuft_ab, jetzt + Duration::hours(30));
        assert!(repo
            .aktiver_ban(Pid(1), jetzt + Duration::hours(31))
            .await
            .unwrap()
            .is_none());
    }
}
