//! Handler-Plugins beider Gateways
//!
//! Jeder Handler bekommt seine Abhaengigkeiten im Konstruktor. Welche
//! Handler unter welchem Schluessel laufen, legt `aufbau` fest.

pub mod beitritt;
pub mod dig_cooldown;
pub mod login;
pub mod richtlinie;
pub mod spiel_login;
pub mod version;
pub mod zufallsschluessel;

pub use beitritt::BeitrittsHandler;
pub use dig_cooldown::DigCooldownHandler;
pub use login::LoginHandler;
pub use richtlinie::RichtlinienHandler;
pub use spiel_login::SpielLoginHandler;
pub use version::VersionsHandler;
pub use zufallsschluessel::ZufallsschluesselHandler;

#[cfg(test)]
pub(crate) mod testhilfe {
    use futures_util::StreamExt;
    use pinguin_protocol::NulCodec;
    use tokio::io::DuplexStream;
    use tokio_util::codec::FramedRead;

    use crate::kontext::VerbindungsKontext;

    pub struct TestVerbindung {
        pub kontext: VerbindungsKontext,
        pub client: FramedRead<DuplexStream, NulCodec>,
    }

    impl TestVerbindung {
        pub fn neu(peer: &str) -> Self {
            let (client, server) = tokio::io::duplex(64 * 1024);
            Self {
                kontext: VerbindungsKontext::neu(peer.parse().unwrap(), server, 64 * 1024),
                client: FramedRead::new(client, NulCodec::new()),
            }
        }

        /// Schliesst die Schreibseite und liefert alles Gesendete
        pub async fn gesendet(mut self) -> Vec<String> {
            self.kontext.schliessen().await;
            let mut alle = Vec::new();
            while let Some(Ok(f)) = self.client.next().await {
                alle.push(f);
            }
            alle
        }
    }
}
