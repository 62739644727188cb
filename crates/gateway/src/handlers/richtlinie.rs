//! Antwort auf die Policy-Anfrage

use async_trait::async_trait;
use pinguin_protocol::Nachricht;

use crate::antwort::Antwort;
use crate::error::GatewayResult;
use crate::handler::NachrichtenHandler;
use crate::kontext::VerbindungsKontext;

pub const RICHTLINIE: &str =
    "<cross-domain-policy><allow-access-from domain=\"*\" to-ports=\"*\" /></cross-domain-policy>";

pub struct RichtlinienHandler;

#[async_trait]
impl NachrichtenHandler for RichtlinienHandler {
    fn name(&self) -> &'static str {
        "richtlinie"
    }

    async fn verarbeiten(
        &self,
        _nachricht: &Nachricht,
        kontext: &mut VerbindungsKontext,
    ) -> GatewayResult<Antwort> {
        tracing::debug!(peer = %kontext.peer_addr(), "Policy angefragt");
        Ok(Antwort::trennen(RICHTLINIE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testhilfe::TestVerbindung;

    #[tokio::test]
    async fn richtlinie_und_trennen() {
        let mut v = TestVerbindung::neu("127.0.0.1:1");
        let a = RichtlinienHandler
            .verarbeiten(&Nachricht::Richtlinie, &mut v.kontext)
            .await
            .unwrap();
        assert!(a.schliesst());
        assert!(a.text().unwrap().contains("allow-access-from domain=\"*\""));
    }
}
