//! Handler-Registry
//!
//! Wird einmal beim Start aus einer festen Liste von Eintraegen aufgebaut
//! und ist danach nur noch lesbar. Die Eintraege werden in Listenreihenfolge
//! verarbeitet:
//!
//! - `Anhaengen`: Handler hinten an die Liste des Schluessels haengen
//! - `Ueberschreiben`: bisherige Liste des Schluessels leeren, dann anhaengen
//!
//! `Ueberschreiben` wirkt nur auf Eintraege, die *vorher* registriert wurden.
//! Die Reihenfolge der Liste ist damit Teil des Vertrags.

use std::collections::HashMap;
use std::sync::Arc;

use pinguin_protocol::Routenschluessel;

use crate::handler::NachrichtenHandler;

/// Registrierungs-Politik eines Eintrags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Politik {
    Anhaengen,
    Ueberschreiben,
}

/// Ein Eintrag der Registrierungstabelle
pub struct HandlerEintrag {
    pub schluessel: Routenschluessel,
    pub politik: Politik,
    pub handler: Arc<dyn NachrichtenHandler>,
}

impl HandlerEintrag {
    pub fn anhaengen(schluessel: Routenschluessel, handler: Arc<dyn NachrichtenHandler>) -> Self {
        Self {
            schluessel,
            politik: Politik::Anhaengen,
            handler,
        }
    }

    pub fn ueberschreiben(
        schluessel: Routenschluessel,
        handler: Arc<dyn NachrichtenHandler>,
    ) -> Self {
        Self {
            schluessel,
            politik: Politik::Ueberschreiben,
            handler,
        }
    }
}

#[derive(Default)]
pub struct HandlerRegistry {
    routen: HashMap<Routenschluessel, Vec<Arc<dyn NachrichtenHandler>>>,
}

impl HandlerRegistry {
    pub fn aufbauen(eintraege: impl IntoIterator<Item = HandlerEintrag>) -> Self {
        let mut routen: HashMap<Routenschluessel, Vec<Arc<dyn NachrichtenHandler>>> =
            HashMap::new();

        for eintrag in eintraege {
            tracing::debug!(
                schluessel = %eintrag.schluessel,
                handler = eintrag.handler.name(),
                politik = ?eintrag.politik,
                "Handler registriert"
            );
            let liste = routen.entry(eintrag.schluessel).or_default();
            if eintrag.politik == Politik::Ueberschreiben {
                liste.clear();
            }
            liste.push(eintrag.handler);
        }

        Self { routen }
    }

    /// Handler fuer einen Schluessel in Registrierungsreihenfolge
    ///
    /// Leer, wenn nichts registriert ist.
    pub fn aufloesen(&self, schluessel: &Routenschluessel) -> &[Arc<dyn NachrichtenHandler>] {
        self.routen.get(schluessel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Anzahl registrierter Schluessel
    pub fn len(&self) -> usize {
        self.routen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::antwort::Antwort;
    use crate::error::GatewayResult;
    use crate::kontext::VerbindungsKontext;
    use async_trait::async_trait;
    use pinguin_protocol::Nachricht;

    struct Benannt(&'static str);

    #[async_trait]
    impl NachrichtenHandler for Benannt {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn verarbeiten(
            &self,
            _nachricht: &Nachricht,
            _kontext: &mut VerbindungsKontext,
        ) -> GatewayResult<Antwort> {
            Ok(Antwort::Nichts)
        }
    }

    fn namen(registry: &HandlerRegistry, schluessel: &Routenschluessel) -> Vec<&'static str> {
        registry.aufloesen(schluessel).iter().map(|h| h.name()).collect()
    }

    #[test]
    fn ueberschreiben_wirkt_nur_rueckwaerts() {
        let k = Routenschluessel::xt("j", "js");
        let registry = HandlerRegistry::aufbauen([
            HandlerEintrag::anhaengen(k.clone(), Arc::new(Benannt("A"))),
            HandlerEintrag::ueberschreiben(k.clone(), Arc::new(Benannt("B"))),
            HandlerEintrag::anhaengen(k.clone(), Arc::new(Benannt("C"))),
        ]);
        assert_eq!(namen(&registry, &k), vec!["B", "C"]);
    }

    #[test]
    fn anhaengen_behaelt_reihenfolge() {
        let k = Routenschluessel::xml("login");
        let registry = HandlerRegistry::aufbauen([
            HandlerEintrag::anhaengen(k.clone(), Arc::new(Benannt("erster"))),
            HandlerEintrag::anhaengen(k.clone(), Arc::new(Benannt("zweiter"))),
            HandlerEintrag::anhaengen(Routenschluessel::xml("rndK"), Arc::new(Benannt("andere"))),
        ]);
        assert_eq!(namen(&registry, &k), vec!["erster", "zweiter"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unbekannter_schluessel_ist_leer() {
        let registry = HandlerRegistry::aufbauen([HandlerEintrag::anhaengen(
            Routenschluessel::Richtlinie,
            Arc::new(Benannt("policy")),
        )]);
        assert!(registry.aufloesen(&Routenschluessel::xml("")).is_empty());
        // XML und XT teilen sich keinen Namensraum
        assert!(registry.aufloesen(&Routenschluessel::xt("rndK", "")).is_empty());
        assert!(HandlerRegistry::default().is_empty());
    }
}
