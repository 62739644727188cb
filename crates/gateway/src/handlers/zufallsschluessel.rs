//! `rndK` – gemeinsamer Zufallsschluessel fuer den Client-Key

use async_trait::async_trait;
use pinguin_protocol::Nachricht;

use crate::antwort::Antwort;
use crate::error::GatewayResult;
use crate::handler::NachrichtenHandler;
use crate::kontext::VerbindungsKontext;

pub struct ZufallsschluesselHandler {
    random_key: String,
}

impl ZufallsschluesselHandler {
    pub fn neu(random_key: impl Into<String>) -> Self {
        Self {
            random_key: random_key.into(),
        }
    }
}

#[async_trait]
impl NachrichtenHandler for ZufallsschluesselHandler {
    fn name(&self) -> &'static str {
        "zufallsschluessel"
    }

    async fn verarbeiten(
        &self,
        _nachricht: &Nachricht,
        _kontext: &mut VerbindungsKontext,
    ) -> GatewayResult<Antwort> {
        Ok(Antwort::Regulaer(format!(
            "<msg t='sys'><body action='rndK' r='-1'><k>{}</k></body></msg>",
            self.random_key
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testhilfe::TestVerbindung;
    use pinguin_protocol::aufloesen;

    #[tokio::test]
    async fn schluessel_im_body() {
        let mut v = TestVerbindung::neu("127.0.0.1:1");
        let n = aufloesen("<msg t='sys'><body action='rndK' r='-1'></body></msg>").unwrap();
        let a = ZufallsschluesselHandler::neu("houdini")
            .verarbeiten(&n, &mut v.kontext)
            .await
            .unwrap();
        assert_eq!(
            a,
            Antwort::regulaer("<msg t='sys'><body action='rndK' r='-1'><k>houdini</k></body></msg>")
        );
    }
}
