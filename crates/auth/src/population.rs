//! Population-Buckets und Buddy-Presence
//!
//! `houdini.population` haelt pro Dienst-Instanz die rohe Spielerzahl. Der
//! Client zeigt davon nur einen Bucket 0–7. Buddy-Presence fragt fuer jede
//! belegte Instanz ab, ob einer der Buddies in deren Online-Menge steht.

use std::sync::Arc;

use pinguin_core::{DienstId, Pid};
use pinguin_store::{schluessel, EphemeralStore, Transaktion};

use crate::error::{AuthError, AuthResult};

/// Hoechster Bucket (Instanz voll)
pub const MAX_BUCKET: i64 = 7;

/// Belegung einer Dienst-Instanz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Population {
    pub dienst: DienstId,
    pub bucket: u8,
    pub anzahl: i64,
}

/// Bucket aus roher Spielerzahl
///
/// `7` ab voller Kapazitaet (oder bei Kapazitaet 0), sonst gleichmaessig
/// `floor(anzahl * 7 / max)`. Ein Ergebnis ausserhalb 0..=7 bedeutet
/// kaputte Daten und wird nicht geklemmt.
pub fn bucket_berechnen(anzahl: i64, max_spieler: u32) -> AuthResult<u8> {
    let max = i64::from(max_spieler);
    let bucket = if max == 0 || anzahl >= max {
        MAX_BUCKET
    } else {
        anzahl.saturating_mul(MAX_BUCKET).div_euclid(max)
    };

    if !(0..=MAX_BUCKET).contains(&bucket) {
        tracing::error!(anzahl, max_spieler, bucket, "Population-Bucket ausserhalb 0..=7");
        return Err(AuthError::invariante(format!(
            "Population-Bucket {bucket} fuer {anzahl} Spieler ausserhalb 0..=7"
        )));
    }
    Ok(bucket as u8)
}

/// Wertet den Population-Hash aus, sortiert nach Dienst-ID
pub fn population_auswerten(
    roh: Vec<(String, String)>,
    max_spieler: u32,
) -> AuthResult<Vec<Population>> {
    let mut ergebnis = Vec::with_capacity(roh.len());
    for (feld, wert) in roh {
        let dienst: DienstId = feld
            .parse()
            .map_err(|_| AuthError::invariante(format!("Dienst-ID '{feld}' in Population ungueltig")))?;
        let anzahl: i64 = wert.parse().map_err(|_| {
            AuthError::invariante(format!("Spielerzahl '{wert}' fuer Dienst {dienst} ungueltig"))
        })?;
        let bucket = bucket_berechnen(anzahl, max_spieler)?;
        ergebnis.push(Population {
            dienst,
            bucket,
            anzahl,
        });
    }
    ergebnis.sort_by_key(|p| p.dienst);
    Ok(ergebnis)
}

/// Dienst-Instanzen, auf denen mindestens ein Buddy online ist
///
/// Alle Abfragen laufen in einer Transaktion. Instanzen ohne Spieler werden
/// nicht abgefragt.
pub async fn buddies_lokalisieren(
    store: &Arc<dyn EphemeralStore>,
    population: &[Population],
    buddies: &[Pid],
) -> AuthResult<Vec<DienstId>> {
    let belegt: Vec<DienstId> = population
        .iter()
        .filter(|p| p.anzahl > 0)
        .map(|p| p.dienst)
        .collect();

    if belegt.is_empty() || buddies.is_empty() {
        return Ok(Vec::new());
    }

    let mut transaktion = Transaktion::neu();
    for dienst in &belegt {
        let key = schluessel::spieler_set(*dienst);
        for buddy in buddies {
            transaktion = transaktion.set_contains(&key, &buddy.to_string());
        }
    }

    let werte = store
        .ausfuehren(transaktion)
        .await
        .map_err(|e| AuthError::transaktion(format!("Buddy-Abfrage: {e}")))?;

    if werte.len() != belegt.len() * buddies.len() {
        return Err(AuthError::transaktion("Buddy-Abfrage unvollstaendig"));
    }

    Ok(belegt
        .iter()
        .zip(werte.chunks(buddies.len()))
        .filter(|(_, antworten)| antworten.iter().any(|w| w.als_bool()))
        .map(|(dienst, _)| *dienst)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinguin_store::MemoryStore;

    #[test]
    fn buckets_im_bereich() {
        for anzahl in 0..=600 {
            let b = bucket_berechnen(anzahl, 500).unwrap();
            assert!(b <= 7);
        }
        assert_eq!(bucket_berechnen(0, 500).unwrap(), 0);
        assert_eq!(bucket_berechnen(71, 500).unwrap(), 0);
        assert_eq!(bucket_berechnen(72, 500).unwrap(), 1);
        assert_eq!(bucket_berechnen(499, 500).unwrap(), 6);
        assert_eq!(bucket_berechnen(500, 500).unwrap(), 7);
        assert_eq!(bucket_berechnen(9000, 500).unwrap(), 7);
        assert_eq!(bucket_berechnen(0, 0).unwrap(), 7);
    }

    #[test]
    fn negativer_wert_ist_invariantenverletzung() {
        assert!(matches!(
            bucket_berechnen(-1, 500),
            Err(AuthError::Invariante(_))
        ));
    }

    #[test]
    fn hash_auswerten() {
        let roh = vec![
            ("9913".to_string(), "250".to_string()),
            ("3100".to_string(), "0".to_string()),
        ];
        let pop = population_auswerten(roh, 500).unwrap();
        assert_eq!(
            pop,
            vec![
                Population {
                    dienst: DienstId(3100),
                    bucket: 0,
                    anzahl: 0,
                },
                Population {
                    dienst: DienstId(9913),
                    bucket: 3,
                    anzahl: 250,
                },
            ]
        );

        let kaputt = vec![("9913".to_string(), "viele".to_string())];
        assert!(matches!(
            population_auswerten(kaputt, 500),
            Err(AuthError::Invariante(_))
        ));
    }

    #[tokio::test]
    async fn buddies_auf_belegten_instanzen() {
        let speicher = Arc::new(MemoryStore::neu());
        let store: Arc<dyn EphemeralStore> = speicher.clone();
        store
            .ausfuehren(
                Transaktion::neu()
                    .set_add(&schluessel::spieler_set(DienstId(1)), "7")
                    .set_add(&schluessel::spieler_set(DienstId(2)), "8")
                    .set_add(&schluessel::spieler_set(DienstId(3)), "9"),
            )
            .await
            .unwrap();

        let population = vec![
            Population {
                dienst: DienstId(1),
                bucket: 0,
                anzahl: 1,
            },
            Population {
                dienst: DienstId(2),
                bucket: 0,
                anzahl: 1,
            },
            // Instanz 3 meldet 0 Spieler und wird nicht abgefragt
            Population {
                dienst: DienstId(3),
                bucket: 0,
                anzahl: 0,
            },
        ];

        let gefunden = buddies_lokalisieren(&store, &population, &[Pid(8), Pid(9)])
            .await
            .unwrap();
        assert_eq!(gefunden, vec![DienstId(2)]);

        let keine = buddies_lokalisieren(&store, &population, &[]).await.unwrap();
        assert!(keine.is_empty());

        speicher.verfuegbar_setzen(false);
        assert!(matches!(
            buddies_lokalisieren(&store, &population, &[Pid(8)]).await,
            Err(AuthError::Transaktion(_))
        ));
    }
}
