//! Integration-Tests gegen einen laufenden Redis
//!
//! Laeuft nur, wenn `PINGUIN_TEST_REDIS` gesetzt ist (z.B.
//! `redis://127.0.0.1:6379/15`).

use std::time::Duration;

use pinguin_store::{schluessel, EphemeralStore, RedisStore, StoreError, Transaktion, Wert};

async fn verbinden() -> Option<RedisStore> {
    let url = std::env::var("PINGUIN_TEST_REDIS").ok()?;
    Some(RedisStore::verbinden(&url).await.unwrap())
}

#[tokio::test]
async fn login_key_zwischen_zwei_verbindungen() {
    let Some(login) = verbinden().await else {
        return;
    };
    let Some(spiel) = verbinden().await else {
        return;
    };
    let ttl = Some(Duration::from_secs(180));

    login
        .ausfuehren(
            Transaktion::neu()
                .set(&schluessel::login_key("redis_basil"), "lk", ttl)
                .set(&schluessel::confirm_key("redis_basil"), "ck", ttl),
        )
        .await
        .unwrap();

    let werte = spiel
        .ausfuehren(
            Transaktion::neu()
                .get_del(&schluessel::login_key("redis_basil"))
                .get_del(&schluessel::confirm_key("redis_basil")),
        )
        .await
        .unwrap();
    assert_eq!(werte, vec![Wert::Text("lk".into()), Wert::Text("ck".into())]);

    // Einmalig
    let nochmal = spiel
        .lesen(&schluessel::login_key("redis_basil"))
        .await
        .unwrap();
    assert_eq!(nochmal, None);
}

#[tokio::test]
async fn flood_zaehler_mit_ablauf() {
    let Some(store) = verbinden().await else {
        return;
    };
    let key = schluessel::flood("10.9.9.9");
    store
        .ausfuehren(Transaktion::neu().befehl(pinguin_store::Befehl::GetDel(key.clone())))
        .await
        .unwrap();

    for _ in 0..3 {
        store
            .ausfuehren(
                Transaktion::neu()
                    .incr(&key)
                    .expire(&key, Duration::from_secs(60)),
            )
            .await
            .unwrap();
    }
    let werte = store
        .ausfuehren(Transaktion::neu().get(&key).ttl(&key))
        .await
        .unwrap();
    assert_eq!(werte[0], Wert::Text("3".into()));
    assert!(matches!(werte[1], Wert::Zahl(n) if n > 0 && n <= 60));
}

#[tokio::test]
async fn unerreichbarer_server_ist_kritisch() {
    if std::env::var("PINGUIN_TEST_REDIS").is_err() {
        return;
    }
    // Port 1 ist auf Testmaschinen nicht belegt
    let e = RedisStore::verbinden("redis://127.0.0.1:1/")
        .await
        .unwrap_err();
    assert!(matches!(e, StoreError::NichtErreichbar(_)));
    assert!(e.ist_kritisch());
}
