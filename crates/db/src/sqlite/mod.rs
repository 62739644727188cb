//! SQLite-Backend fuer die Spieler-Repositories

pub mod pool;
pub mod spieler;

pub use pool::SqliteDb;
