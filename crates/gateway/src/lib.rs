//! pinguin-gateway – Login- und Spiel-Gateway
//!
//! Beide Gateways teilen dieselbe Verbindungs-Engine und unterscheiden sich
//! nur in ihrer `DienstPolitik` und ihrer Registrierungstabelle.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (GatewayServer)
//!     |
//!     v
//! Verbindung (pro Verbindung ein Task)
//!     |  NulCodec -> aufloesen -> Routenschluessel
//!     v
//! NachrichtenProzessor
//!     |  HandlerRegistry (einmal beim Start aufgebaut)
//!     |
//!     +-- RichtlinienHandler        (Policy-Anfrage)
//!     +-- ZufallsschluesselHandler  (rndK)
//!     +-- VersionsHandler           (verChk)
//!     +-- LoginHandler              (login, Login-Gateway, Phase A)
//!     +-- SpielLoginHandler         (login, Spiel-Gateway, Phase B)
//!     +-- BeitrittsHandler          (j#js)
//!     +-- DigCooldownHandler        (p#getdigcooldown)
//!
//! SpielerVerzeichnis – wer ist auf dieser Instanz online
//! Praesenz           – Online-Menge und Population im Kurzzeitspeicher
//! ```

pub mod antwort;
pub mod aufbau;
pub mod connection;
pub mod dienst;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod kontext;
pub mod praesenz;
pub mod processor;
pub mod registry;
pub mod tcp;
pub mod verzeichnis;

pub use antwort::Antwort;
pub use aufbau::{login_gateway, spiel_gateway, ProtokollKonfig};
pub use connection::{GatewayZustand, Trennungsgrund, Verbindung};
pub use dienst::{DienstPolitik, LoginDienst, SpielDienst};
pub use error::{GatewayError, GatewayResult};
pub use handler::NachrichtenHandler;
pub use kontext::{VerbindungsHandle, VerbindungsKontext};
pub use praesenz::Praesenz;
pub use processor::{Fortsetzung, NachrichtenProzessor};
pub use registry::{HandlerEintrag, HandlerRegistry, Politik};
pub use tcp::GatewayServer;
pub use verzeichnis::{Spieler, SpielerVerzeichnis};
