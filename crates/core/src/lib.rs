//! pinguin-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Pinguin-Crates gemeinsam genutzt werden: ID-Newtypes fuer Spieler,
//! Verbindungen und Dienst-Instanzen sowie die gemeinsame Fehlertaxonomie.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{Fehlerkategorie, PinguinError, Result};
pub use types::{DienstId, Pid, VerbindungsId};
