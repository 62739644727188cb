//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `PINGUIN_LOG_LEVEL`: Filter-Direktive (z.B. `debug` oder
//!   `info,pinguin_gateway=trace`), ueberschreibt `[logging] level`.
//!   In der Konfigurationsdatei ist nur ein einfacher Level erlaubt.
//! - `PINGUIN_LOG_FORMAT`: `text` oder `json`, ueberschreibt `[logging] format`
//!
//! Eskalierte Store-Fehler laufen unter dem Target `pinguin::alarm` und
//! lassen sich so getrennt filtern.

use tracing_subscriber::{fmt, EnvFilter};

pub const LEVEL_VARIABLE: &str = "PINGUIN_LOG_LEVEL";
pub const FORMAT_VARIABLE: &str = "PINGUIN_LOG_FORMAT";

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Aufgeloeste Logging-Einstellung (Umgebung vor Konfiguration)
#[derive(Debug)]
pub struct LogEinstellung {
    pub filter: EnvFilter,
    pub format: LogFormat,
}

impl LogEinstellung {
    /// Ungueltige Werte fallen auf `info` bzw. `text` zurueck
    pub fn bestimmen(
        level: &str,
        format: &str,
        env_level: Option<&str>,
        env_format: Option<&str>,
    ) -> Self {
        let filter = env_level
            .and_then(|l| EnvFilter::try_new(l).ok())
            .or_else(|| EnvFilter::try_new(level).ok())
            .unwrap_or_else(|| EnvFilter::new("info"));

        let format = match env_format.unwrap_or(format) {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self { filter, format }
    }

    /// Liest `PINGUIN_LOG_LEVEL` / `PINGUIN_LOG_FORMAT` aus der Umgebung
    pub fn aus_umgebung(level: &str, format: &str) -> Self {
        let env_level = std::env::var(LEVEL_VARIABLE).ok();
        let env_format = std::env::var(FORMAT_VARIABLE).ok();
        Self::bestimmen(level, format, env_level.as_deref(), env_format.as_deref())
    }
}

/// Initialisiert das Logging-System.
///
/// Schlaegt fehl, wenn bereits ein globaler Subscriber gesetzt ist.
pub fn logging_initialisieren(level: &str, format: &str) -> anyhow::Result<()> {
    let LogEinstellung { filter, format } = LogEinstellung::aus_umgebung(level, format);

    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    ergebnis.map_err(|e| anyhow::anyhow!("Logging nicht initialisierbar: {e}"))
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
