//! Handler-Trait fuer Nachrichten-Plugins

use async_trait::async_trait;
use pinguin_protocol::Nachricht;

use crate::antwort::Antwort;
use crate::error::GatewayResult;
use crate::kontext::VerbindungsKontext;

/// Ein Plugin, das Nachrichten eines Routing-Schluessels verarbeitet
///
/// Abhaengigkeiten (Store, Repository, Konfiguration) bekommt der Handler
/// bei der Konstruktion. Ein `Err` wird vom Prozessor in eine generische
/// Fehlerantwort mit Trennung umgewandelt, ausser der Fehler ist kritisch.
#[async_trait]
pub trait NachrichtenHandler: Send + Sync {
    /// Name fuer Logs
    fn name(&self) -> &'static str;

    async fn verarbeiten(
        &self,
        nachricht: &Nachricht,
        kontext: &mut VerbindungsKontext,
    ) -> GatewayResult<Antwort>;
}
