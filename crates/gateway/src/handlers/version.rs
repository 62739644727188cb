//! `verChk` – Versionspruefung des Clients
//!
//! Nur die Vanilla-Version wird zugelassen. Legacy-Clients und alle anderen
//! Versionen bekommen `apiKO` und werden getrennt.

use async_trait::async_trait;
use pinguin_protocol::Nachricht;

use crate::antwort::Antwort;
use crate::error::GatewayResult;
use crate::handler::NachrichtenHandler;
use crate::kontext::VerbindungsKontext;

const API_OK: &str = "<msg t='sys'><body action='apiOK' r='0' /></msg>";
const API_KO: &str = "<msg t='sys'><body action='apiKO' r='0' /></msg>";

pub struct VersionsHandler {
    vanilla: u16,
    legacy: u16,
}

impl VersionsHandler {
    pub fn neu(vanilla: u16, legacy: u16) -> Self {
        Self { vanilla, legacy }
    }
}

#[async_trait]
impl NachrichtenHandler for VersionsHandler {
    fn name(&self) -> &'static str {
        "version"
    }

    async fn verarbeiten(
        &self,
        nachricht: &Nachricht,
        kontext: &mut VerbindungsKontext,
    ) -> GatewayResult<Antwort> {
        let version = nachricht
            .xml_body()
            .and_then(|body| body.kind("ver"))
            .and_then(|ver| ver.attribut("v"))
            .and_then(|v| v.trim().parse::<u16>().ok());

        match version {
            Some(v) if v == self.vanilla => {
                tracing::debug!(peer = %kontext.peer_addr(), version = v, "Vanilla-Client");
                Ok(Antwort::regulaer(API_OK))
            }
            Some(v) if v == self.legacy => {
                tracing::warn!(peer = %kontext.peer_addr(), version = v, "Legacy-Client abgelehnt");
                Ok(Antwort::trennen(API_KO))
            }
            andere => {
                tracing::warn!(peer = %kontext.peer_addr(), version = ?andere, "Ungueltige Client-Version");
                Ok(Antwort::trennen(API_KO))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testhilfe::TestVerbindung;
    use pinguin_protocol::aufloesen;

    async fn pruefen(v: &str) -> Antwort {
        let mut t = TestVerbindung::neu("127.0.0.1:1");
        let n = aufloesen(&format!(
            "<msg t='sys'><body action='verChk' r='0'><ver v='{v}' /></body></msg>"
        ))
        .unwrap();
        VersionsHandler::neu(153, 152)
            .verarbeiten(&n, &mut t.kontext)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn versionen() {
        assert_eq!(pruefen("153").await, Antwort::regulaer(API_OK));
        assert_eq!(pruefen("152").await, Antwort::trennen(API_KO));
        assert_eq!(pruefen("999").await, Antwort::trennen(API_KO));
        assert_eq!(pruefen("abc").await, Antwort::trennen(API_KO));
    }
}
