//! Registrierungstabellen der beiden Gateways
//!
//! Die Reihenfolge der Eintraege ist Teil des Vertrags der Registry
//! (`Ueberschreiben` wirkt nur rueckwaerts). Zusaetzliche Plugins werden
//! hinten an die Tabelle gehaengt.

use std::sync::Arc;

use pinguin_auth::{AnmeldeService, Handshake};
use pinguin_db::SpielerRepository;
use pinguin_protocol::Routenschluessel;

use crate::connection::GatewayZustand;
use crate::dienst::{LoginDienst, SpielDienst};
use crate::handlers::{
    BeitrittsHandler, DigCooldownHandler, LoginHandler, RichtlinienHandler, SpielLoginHandler,
    VersionsHandler, ZufallsschluesselHandler,
};
use crate::praesenz::Praesenz;
use crate::processor::NachrichtenProzessor;
use crate::registry::{HandlerEintrag, HandlerRegistry};

/// Protokoll-Parameter, die beide Gateways teilen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtokollKonfig {
    pub random_key: String,
    pub vanilla_version: u16,
    pub legacy_version: u16,
    pub max_frame_bytes: usize,
}

impl Default for ProtokollKonfig {
    fn default() -> Self {
        Self {
            random_key: "houdini".into(),
            vanilla_version: 153,
            legacy_version: 152,
            max_frame_bytes: pinguin_protocol::wire::DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Policy, `rndK` und `verChk` – auf beiden Gateways gleich
fn standard_eintraege(konfig: &ProtokollKonfig) -> Vec<HandlerEintrag> {
    vec![
        HandlerEintrag::anhaengen(Routenschluessel::Richtlinie, Arc::new(RichtlinienHandler)),
        HandlerEintrag::anhaengen(
            Routenschluessel::xml("rndK"),
            Arc::new(ZufallsschluesselHandler::neu(&konfig.random_key)),
        ),
        HandlerEintrag::anhaengen(
            Routenschluessel::xml("verChk"),
            Arc::new(VersionsHandler::neu(konfig.vanilla_version, konfig.legacy_version)),
        ),
    ]
}

pub fn login_tabelle(konfig: &ProtokollKonfig, anmeldung: Arc<AnmeldeService>) -> Vec<HandlerEintrag> {
    let mut tabelle = standard_eintraege(konfig);
    tabelle.push(HandlerEintrag::anhaengen(
        Routenschluessel::xml("login"),
        Arc::new(LoginHandler::neu(anmeldung, &konfig.random_key)),
    ));
    tabelle
}

pub fn spiel_tabelle(
    konfig: &ProtokollKonfig,
    spieler: Arc<dyn SpielerRepository>,
    handshake: Arc<Handshake>,
    praesenz: Arc<Praesenz>,
) -> Vec<HandlerEintrag> {
    let mut tabelle = standard_eintraege(konfig);
    tabelle.extend([
        HandlerEintrag::anhaengen(
            Routenschluessel::xml("login"),
            Arc::new(SpielLoginHandler::neu(spieler, handshake.clone(), praesenz.clone())),
        ),
        HandlerEintrag::anhaengen(
            Routenschluessel::xt("j", "js"),
            Arc::new(BeitrittsHandler::neu(handshake, praesenz.clone())),
        ),
        HandlerEintrag::anhaengen(
            Routenschluessel::xt("p", "getdigcooldown"),
            Arc::new(DigCooldownHandler::neu(praesenz)),
        ),
    ]);
    tabelle
}

/// Zustand des Login-Gateways
pub fn login_gateway(
    port: u16,
    konfig: &ProtokollKonfig,
    anmeldung: Arc<AnmeldeService>,
) -> GatewayZustand {
    let registry = HandlerRegistry::aufbauen(login_tabelle(konfig, anmeldung));
    GatewayZustand::neu(
        Arc::new(LoginDienst::neu(port)),
        NachrichtenProzessor::neu(registry),
        konfig.max_frame_bytes,
    )
}

/// Zustand des Spiel-Gateways
pub fn spiel_gateway(
    port: u16,
    konfig: &ProtokollKonfig,
    spieler: Arc<dyn SpielerRepository>,
    handshake: Arc<Handshake>,
    praesenz: Arc<Praesenz>,
) -> GatewayZustand {
    let registry =
        HandlerRegistry::aufbauen(spiel_tabelle(konfig, spieler, handshake, praesenz.clone()));
    GatewayZustand::neu(
        Arc::new(SpielDienst::neu(port, praesenz)),
        NachrichtenProzessor::neu(registry),
        konfig.max_frame_bytes,
    )
}
