//! Auth-Handshake zwischen Login- und Spiel-Gateway
//!
//! Phase A (Login-Gateway): nach erfolgreicher Passwortpruefung werden
//! `{username}.lkey` und `{username}.ckey` mit kurzer TTL gesetzt und im
//! selben Roundtrip die Population gelesen.
//!
//! Phase B (Spiel-Gateway): beide Schluessel werden in einer Transaktion
//! gelesen und geloescht, gegen den Client-Nachweis geprueft und danach
//! `{username}.loginkey` fuer den Welt-Beitritt gesetzt.

use std::sync::Arc;

use pinguin_store::{schluessel, EphemeralStore, Transaktion, Wert};

use crate::error::{AuthError, AuthResult};
use crate::krypto;
use crate::population::{population_auswerten, Population};
use crate::AuthKonfig;

/// Laenge des Zufallsgeheimnisses fuer den Login-Key
const LOGIN_GEHEIMNIS_BYTES: usize = 16;
/// Laenge des Zufallsgeheimnisses fuer den Confirm-Key
const CONFIRM_GEHEIMNIS_BYTES: usize = 24;

/// Ergebnis von Phase A
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ausgestellt {
    pub login_key: String,
    pub confirm_key: String,
    pub population: Vec<Population>,
}

/// Was der Client dem Spiel-Gateway vorlegt
#[derive(Debug, Clone, Copy)]
pub struct ClientNachweis<'a> {
    /// Login-Key aus dem `nick`-Feld
    pub login_key: &'a str,
    /// `verschleiern(hash(lkey + random_key)) + lkey`
    pub client_key: &'a str,
    pub confirm_hash: &'a str,
}

pub struct Handshake {
    store: Arc<dyn EphemeralStore>,
    konfig: AuthKonfig,
}

impl Handshake {
    pub fn neu(store: Arc<dyn EphemeralStore>, konfig: AuthKonfig) -> Self {
        Self { store, konfig }
    }

    pub fn store(&self) -> &Arc<dyn EphemeralStore> {
        &self.store
    }

    pub fn konfig(&self) -> &AuthKonfig {
        &self.konfig
    }

    /// Phase A: Einmal-Schluessel ausstellen und Population lesen
    pub async fn ausstellen(&self, username: &str) -> AuthResult<Ausgestellt> {
        let login_key = krypto::hash(&krypto::zufallsschluessel(LOGIN_GEHEIMNIS_BYTES));
        let confirm_key = krypto::hash(&krypto::zufallsschluessel(CONFIRM_GEHEIMNIS_BYTES));
        let ttl = Some(self.konfig.auth_ttl);

        let mut werte = self
            .store
            .ausfuehren(
                Transaktion::neu()
                    .set(&schluessel::login_key(username), &login_key, ttl)
                    .set(&schluessel::confirm_key(username), &confirm_key, ttl)
                    .hash_get_all(schluessel::POPULATION),
            )
            .await
            .map_err(|e| {
                tracing::error!(username = %username, fehler = %e, "Schluessel konnten nicht ausgestellt werden");
                AuthError::transaktion(format!("Schluessel ausstellen: {e}"))
            })?;

        if werte.len() != 3 || !werte[0].als_bool() || !werte[1].als_bool() {
            return Err(AuthError::transaktion("Schluessel ausstellen: unvollstaendig"));
        }

        let roh = werte.pop().map(Wert::in_hash).unwrap_or_default();
        let population = population_auswerten(roh, self.konfig.max_spieler)?;

        tracing::debug!(username = %username, "Einmal-Schluessel ausgestellt");
        Ok(Ausgestellt {
            login_key,
            confirm_key,
            population,
        })
    }

    /// Phase B: Schluessel einmalig verbrauchen und pruefen
    ///
    /// Jede Abweichung ergibt denselben `Fehlgeschlagen`-Fehler.
    pub async fn verifizieren(&self, username: &str, nachweis: ClientNachweis<'_>) -> AuthResult<()> {
        let werte = self
            .store
            .ausfuehren(
                Transaktion::neu()
                    .get_del(&schluessel::login_key(username))
                    .get_del(&schluessel::confirm_key(username)),
            )
            .await
            .map_err(|e| {
                tracing::error!(username = %username, fehler = %e, "Schluessel konnten nicht gelesen werden");
                AuthError::transaktion(format!("Schluessel verbrauchen: {e}"))
            })?;

        let mut werte = werte.into_iter();
        let (Some(login_key), Some(confirm_key)) = (
            werte.next().and_then(Wert::in_text),
            werte.next().and_then(Wert::in_text),
        ) else {
            tracing::warn!(username = %username, "Keine ausgestellten Schluessel vorhanden");
            return Err(AuthError::Fehlgeschlagen);
        };

        let erwartet = krypto::client_key_berechnen(&login_key, &self.konfig.random_key)
            .ok_or(AuthError::Fehlgeschlagen)?;
        if erwartet != nachweis.client_key {
            tracing::warn!(username = %username, "Client-Key stimmt nicht");
            return Err(AuthError::Fehlgeschlagen);
        }
        if login_key != nachweis.login_key {
            tracing::warn!(username = %username, "Login-Key stimmt nicht");
            return Err(AuthError::Fehlgeschlagen);
        }
        if confirm_key != nachweis.confirm_hash {
            tracing::warn!(username = %username, "Confirm-Key stimmt nicht");
            return Err(AuthError::Fehlgeschlagen);
        }

        self.store
            .ausfuehren(Transaktion::neu().set(
                &schluessel::sitzungs_key(username),
                &login_key,
                Some(self.konfig.loginkey_ttl),
            ))
            .await
            .map_err(|e| AuthError::transaktion(format!("Sitzungsmarker setzen: {e}")))?;

        tracing::debug!(username = %username, "Handshake verifiziert");
        Ok(())
    }

    /// Prueft den Sitzungsmarker beim Welt-Beitritt
    pub async fn sitzung_pruefen(&self, username: &str, login_key: &str) -> AuthResult<bool> {
        let gespeichert = self.store.lesen(&schluessel::sitzungs_key(username)).await?;
        Ok(gespeichert.as_deref() == Some(login_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinguin_store::MemoryStore;
    use std::time::Duration;

    fn handshake(store: Arc<MemoryStore>) -> Handshake {
        Handshake::neu(store, AuthKonfig::default())
    }

    fn nachweis_fuer<'a>(a: &'a Ausgestellt, client_key: &'a str) -> ClientNachweis<'a> {
        ClientNachweis {
            login_key: &a.login_key,
            client_key,
            confirm_hash: &a.confirm_key,
        }
    }

    #[tokio::test]
    async fn ausstellen_und_einmal_verifizieren() {
        let store = Arc::new(MemoryStore::neu());
        let hs = handshake(store.clone());

        let a = hs.ausstellen("basil").await.unwrap();
        assert_eq!(a.login_key.len(), 32);
        assert_eq!(a.confirm_key.len(), 32);
        assert_ne!(a.login_key, a.confirm_key);

        let ck = krypto::client_key_berechnen(&a.login_key, "houdini").unwrap();
        hs.verifizieren("basil", nachweis_fuer(&a, &ck)).await.unwrap();
        assert!(hs.sitzung_pruefen("basil", &a.login_key).await.unwrap());

        // Wiederholung mit denselben (jetzt geloeschten) Schluesseln scheitert
        let err = hs.verifizieren("basil", nachweis_fuer(&a, &ck)).await.unwrap_err();
        assert!(matches!(err, AuthError::Fehlgeschlagen));
    }

    #[tokio::test]
    async fn falscher_client_key_verbraucht_trotzdem() {
        let store = Arc::new(MemoryStore::neu());
        let hs = handshake(store.clone());
        let a = hs.ausstellen("basil").await.unwrap();

        let falsch = "0".repeat(64);
        assert!(matches!(
            hs.verifizieren("basil", nachweis_fuer(&a, &falsch)).await,
            Err(AuthError::Fehlgeschlagen)
        ));

        let ck = krypto::client_key_berechnen(&a.login_key, "houdini").unwrap();
        assert!(matches!(
            hs.verifizieren("basil", nachweis_fuer(&a, &ck)).await,
            Err(AuthError::Fehlgeschlagen)
        ));
        assert!(!hs.sitzung_pruefen("basil", &a.login_key).await.unwrap());
    }

    #[tokio::test]
    async fn falscher_confirm_key() {
        let store = Arc::new(MemoryStore::neu());
        let hs = handshake(store);
        let a = hs.ausstellen("basil").await.unwrap();
        let ck = krypto::client_key_berechnen(&a.login_key, "houdini").unwrap();

        let nachweis = ClientNachweis {
            login_key: &a.login_key,
            client_key: &ck,
            confirm_hash: "ffffffffffffffffffffffffffffffff",
        };
        assert!(matches!(
            hs.verifizieren("basil", nachweis).await,
            Err(AuthError::Fehlgeschlagen)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn schluessel_laufen_ab() {
        let store = Arc::new(MemoryStore::neu());
        let hs = handshake(store);
        let a = hs.ausstellen("basil").await.unwrap();
        let ck = krypto::client_key_berechnen(&a.login_key, "houdini").unwrap();

        tokio::time::advance(Duration::from_secs(181)).await;
        assert!(matches!(
            hs.verifizieren("basil", nachweis_fuer(&a, &ck)).await,
            Err(AuthError::Fehlgeschlagen)
        ));
    }

    #[tokio::test]
    async fn ausstellen_liest_population() {
        let store = Arc::new(MemoryStore::neu());
        store
            .ausfuehren(Transaktion::neu().hash_set(schluessel::POPULATION, "9913", "500"))
            .await
            .unwrap();
        let hs = handshake(store);

        let a = hs.ausstellen("basil").await.unwrap();
        assert_eq!(a.population.len(), 1);
        assert_eq!(a.population[0].bucket, 7);
    }

    #[tokio::test]
    async fn ausfall_ist_transaktionsfehler() {
        let store = Arc::new(MemoryStore::neu());
        let hs = handshake(store.clone());
        store.verfuegbar_setzen(false);

        let err = hs.ausstellen("basil").await.unwrap_err();
        assert!(matches!(err, AuthError::Transaktion(_)));
    }
}
