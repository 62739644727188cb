//! pinguin-db – Spieler-Datensaetze
//!
//! Repository-Pattern fuer den Spieler-Lookup der Gateways. SQLite (sqlx)
//! fuer den Betrieb, `SpeicherRepository` fuer Tests und Entwicklung.

pub mod error;
pub mod models;
pub mod repository;
pub mod speicher;
pub mod sqlite;

pub use error::DbError;
pub use models::{BanRecord, NeuerBan, Sprache, SpielerRecord};
pub use repository::{DatenbankKonfig, DbResult, SpielerRepository, SpielerVerwaltung};
pub use speicher::SpeicherRepository;
pub use sqlite::SqliteDb;
