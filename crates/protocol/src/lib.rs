//! pinguin-protocol – Wire-Protokoll der Gateways
//!
//! Jede Nachricht ist UTF-8-Text, abgeschlossen durch ein einzelnes
//! 0x00-Byte. Es existieren drei Varianten:
//!
//! - Policy-Anfrage: `<policy-file-request/>`
//! - XML: `<msg t='sys'><body action='NAME'>...</body></msg>`
//! - XT: `%xt%{gruppe}%{id}#{erweiterung}%{arg1}%...%`

pub mod nachricht;
pub mod wire;
pub mod xml;
pub mod xt;

pub use nachricht::{aufloesen, Format, Nachricht, Routenschluessel, XtBefehl};
pub use wire::NulCodec;
pub use xml::XmlElement;
pub use xt::FehlerCode;
