//! Netzwerk-Backend des Kurzzeitspeichers (Redis)
//!
//! Jede [`Transaktion`] wird als eine MULTI/EXEC-Pipeline gesendet, so dass
//! Login- und Spiel-Gateway auch aus getrennten Prozessen dieselben
//! Schluessel sehen. Verbindungsfehler gelten als Ausfall
//! (`NichtErreichbar`), alles andere als abgebrochene Transaktion.
//!
//! Redis verwirft eine MULTI-Queue nur bei Fehlern beim Einreihen. Ein
//! Typfehler zur Laufzeit laesst die uebrigen Befehle stehen; die festen
//! Schluesselmuster aus [`crate::schluessel`] schliessen solche Konflikte aus.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{RedisError, Value};

use crate::befehl::{Befehl, Transaktion, Wert};
use crate::error::{StoreError, StoreResult};
use crate::EphemeralStore;

#[derive(Clone)]
pub struct RedisStore {
    verbindung: ConnectionManager,
    url: String,
}

impl RedisStore {
    /// Baut die Verbindung auf (mit automatischem Reconnect)
    pub async fn verbinden(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url).map_err(fehler_umwandeln)?;
        let verbindung = ConnectionManager::new(client)
            .await
            .map_err(fehler_umwandeln)?;

        tracing::info!(url = %url, "Kurzzeitspeicher verbunden");
        Ok(Self {
            verbindung,
            url: url.to_string(),
        })
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EphemeralStore for RedisStore {
    async fn ausfuehren(&self, transaktion: Transaktion) -> StoreResult<Vec<Wert>> {
        if transaktion.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for befehl in transaktion.befehle() {
            pipe.add_command(befehl_kodieren(befehl));
        }

        let mut verbindung = self.verbindung.clone();
        let antworten: Vec<Value> = pipe
            .query_async(&mut verbindung)
            .await
            .map_err(fehler_umwandeln)?;

        if antworten.len() != transaktion.len() {
            return Err(StoreError::TransaktionAbgebrochen(format!(
                "{} Antworten auf {} Befehle",
                antworten.len(),
                transaktion.len()
            )));
        }

        transaktion
            .befehle()
            .iter()
            .zip(antworten)
            .map(|(befehl, antwort)| wert_umwandeln(befehl, antwort))
            .collect()
    }
}

fn fehler_umwandeln(e: RedisError) -> StoreError {
    if e.is_io_error()
        || e.is_connection_refusal()
        || e.is_connection_dropped()
        || e.is_timeout()
    {
        StoreError::NichtErreichbar(e.to_string())
    } else {
        StoreError::TransaktionAbgebrochen(e.to_string())
    }
}

fn millis(ttl: std::time::Duration) -> u64 {
    // PX/PEXPIRE lehnen 0 ab
    (ttl.as_millis() as u64).max(1)
}

fn befehl_kodieren(befehl: &Befehl) -> redis::Cmd {
    match befehl {
        Befehl::Set {
            schluessel,
            wert,
            ttl,
        } => {
            let mut cmd = redis::cmd("SET");
            cmd.arg(schluessel).arg(wert);
            if let Some(ttl) = ttl {
                cmd.arg("PX").arg(millis(*ttl));
            }
            cmd
        }
        Befehl::Get(s) => redis::cmd("GET").arg(s).clone(),
        Befehl::GetDel(s) => redis::cmd("GETDEL").arg(s).clone(),
        Befehl::Exists(s) => redis::cmd("EXISTS").arg(s).clone(),
        Befehl::Incr(s) => redis::cmd("INCR").arg(s).clone(),
        Befehl::Expire { schluessel, ttl } => redis::cmd("PEXPIRE")
            .arg(schluessel)
            .arg(millis(*ttl))
            .clone(),
        Befehl::Ttl(s) => redis::cmd("TTL").arg(s).clone(),
        Befehl::HashGetAll(s) => redis::cmd("HGETALL").arg(s).clone(),
        Befehl::HashSet {
            schluessel,
            feld,
            wert,
        } => redis::cmd("HSET").arg(schluessel).arg(feld).arg(wert).clone(),
        Befehl::SetAdd {
            schluessel,
            mitglied,
        } => redis::cmd("SADD").arg(schluessel).arg(mitglied).clone(),
        Befehl::SetRem {
            schluessel,
            mitglied,
        } => redis::cmd("SREM").arg(schluessel).arg(mitglied).clone(),
        Befehl::SetContains {
            schluessel,
            mitglied,
        } => redis::cmd("SISMEMBER").arg(schluessel).arg(mitglied).clone(),
    }
}

fn text(wert: Value) -> Option<String> {
    match wert {
        Value::BulkString(bytes) => String::from_utf8(bytes).ok(),
        Value::SimpleString(s) => Some(s),
        Value::Int(n) => Some(n.to_string()),
        _ => None,
    }
}

fn hash_paare(wert: Value) -> Option<Vec<(String, String)>> {
    let mut paare = match wert {
        Value::Map(paare) => paare
            .into_iter()
            .map(|(k, v)| Some((text(k)?, text(v)?)))
            .collect::<Option<Vec<_>>>()?,
        Value::Array(flach) => {
            if flach.len() % 2 != 0 {
                return None;
            }
            let mut paare = Vec::with_capacity(flach.len() / 2);
            let mut iter = flach.into_iter();
            while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
                paare.push((text(k)?, text(v)?));
            }
            paare
        }
        Value::Nil => Vec::new(),
        _ => return None,
    };
    // Gleiche Reihenfolge wie im MemoryStore
    paare.sort();
    Some(paare)
}

/// Uebersetzt eine Redis-Antwort in den `Wert`, den auch der MemoryStore liefert
fn wert_umwandeln(befehl: &Befehl, antwort: Value) -> StoreResult<Wert> {
    let falscher_typ = || StoreError::FalscherTyp(befehl.schluessel().to_string());

    match befehl {
        Befehl::Set { .. } => match antwort {
            Value::Okay | Value::SimpleString(_) => Ok(Wert::Bool(true)),
            Value::Nil => Ok(Wert::Bool(false)),
            _ => Err(falscher_typ()),
        },
        Befehl::Get(_) | Befehl::GetDel(_) => match antwort {
            Value::Nil => Ok(Wert::Nichts),
            andere => text(andere).map(Wert::Text).ok_or_else(falscher_typ),
        },
        Befehl::Incr(_) | Befehl::Ttl(_) => match antwort {
            Value::Int(n) => Ok(Wert::Zahl(n)),
            _ => Err(falscher_typ()),
        },
        Befehl::HashGetAll(_) => hash_paare(antwort)
            .map(Wert::Hash)
            .ok_or_else(falscher_typ),
        Befehl::Exists(_)
        | Befehl::Expire { .. }
        | Befehl::HashSet { .. }
        | Befehl::SetAdd { .. }
        | Befehl::SetRem { .. }
        | Befehl::SetContains { .. } => match antwort {
            Value::Int(n) => Ok(Wert::Bool(n > 0)),
            Value::Boolean(b) => Ok(Wert::Bool(b)),
            _ => Err(falscher_typ()),
        },
    }
}
