//! Format-Erkennung und Routing-Schluessel
//!
//! Klassifiziert einen dekodierten Frame in eine der drei Varianten.
//! Reihenfolge, erster Treffer gewinnt:
//!
//! 1. exakt `<policy-file-request/>` → [`Nachricht::Richtlinie`]
//! 2. beginnt mit `<` → [`Nachricht::Xml`]
//! 3. beginnt mit `%xt%` → [`Nachricht::Xt`]
//! 4. alles andere → `UnbekanntesFormat`

use pinguin_core::{PinguinError, Result};

use crate::xml::{dokument_parsen, XmlElement};

/// Die Policy-Anfrage des Clients
pub const RICHTLINIEN_ANFRAGE: &str = "<policy-file-request/>";

/// Praefix aller XT-Nachrichten
pub const XT_PRAEFIX: &str = "%xt%";

/// Protokollvariante einer Nachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Richtlinie,
    Xml,
    Xt,
}

/// Geparster XT-Befehl `%xt%{gruppe}%{id}#{erweiterung}%{args..}%`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XtBefehl {
    pub gruppe: String,
    pub id: String,
    pub erweiterung: String,
    /// Positionsargumente ab Feld 4, ohne das leere Feld nach dem letzten `%`
    pub argumente: Vec<String>,
    pub roh: String,
}

impl XtBefehl {
    /// Argument an Position `index`, falls vorhanden
    pub fn argument(&self, index: usize) -> Option<&str> {
        self.argumente.get(index).map(String::as_str)
    }
}

/// Dekodierte, unveraenderliche Nachricht
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nachricht {
    Richtlinie,
    Xml {
        aktion: String,
        dokument: XmlElement,
        roh: String,
    },
    Xt(XtBefehl),
}

/// Schluessel unter dem Handler registriert und gesucht werden
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Routenschluessel {
    Richtlinie,
    Xml(String),
    Xt { id: String, erweiterung: String },
}

impl Routenschluessel {
    pub fn xml(aktion: impl Into<String>) -> Self {
        Self::Xml(aktion.into())
    }

    pub fn xt(id: impl Into<String>, erweiterung: impl Into<String>) -> Self {
        Self::Xt {
            id: id.into(),
            erweiterung: erweiterung.into(),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Self::Richtlinie => Format::Richtlinie,
            Self::Xml(_) => Format::Xml,
            Self::Xt { .. } => Format::Xt,
        }
    }
}

impl std::fmt::Display for Routenschluessel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Richtlinie => write!(f, "policy"),
            Self::Xml(aktion) => write!(f, "xml:{}", aktion),
            Self::Xt { id, erweiterung } => write!(f, "xt:{}#{}", id, erweiterung),
        }
    }
}

impl Nachricht {
    pub fn format(&self) -> Format {
        match self {
            Self::Richtlinie => Format::Richtlinie,
            Self::Xml { .. } => Format::Xml,
            Self::Xt(_) => Format::Xt,
        }
    }

    pub fn routenschluessel(&self) -> Routenschluessel {
        match self {
            Self::Richtlinie => Routenschluessel::Richtlinie,
            Self::Xml { aktion, .. } => Routenschluessel::Xml(aktion.clone()),
            Self::Xt(befehl) => Routenschluessel::xt(&befehl.id, &befehl.erweiterung),
        }
    }

    /// `body`-Element einer XML-Nachricht
    pub fn xml_body(&self) -> Option<&XmlElement> {
        match self {
            Self::Xml { dokument, .. } => dokument.kind("body"),
            _ => None,
        }
    }

    pub fn als_xt(&self) -> Option<&XtBefehl> {
        match self {
            Self::Xt(befehl) => Some(befehl),
            _ => None,
        }
    }
}

/// Klassifiziert einen Frame und extrahiert den Routing-Schluessel
pub fn aufloesen(roh: &str) -> Result<Nachricht> {
    if roh == RICHTLINIEN_ANFRAGE {
        return Ok(Nachricht::Richtlinie);
    }

    if roh.starts_with('<') {
        return xml_aufloesen(roh);
    }

    if roh.starts_with(XT_PRAEFIX) {
        return xt_aufloesen(roh).map(Nachricht::Xt);
    }

    Err(PinguinError::UnbekanntesFormat)
}

fn xml_aufloesen(roh: &str) -> Result<Nachricht> {
    let dokument = dokument_parsen(roh)?;

    // Fehlende body- oder action-Angabe ergibt einen leeren Schluessel
    let aktion = dokument
        .kind("body")
        .and_then(|body| body.attribut("action"))
        .unwrap_or_default()
        .to_string();

    Ok(Nachricht::Xml {
        aktion,
        dokument,
        roh: roh.to_string(),
    })
}

fn xt_aufloesen(roh: &str) -> Result<XtBefehl> {
    let mut felder: Vec<&str> = roh.split('%').collect();

    // Abschliessendes `%` erzeugt ein leeres letztes Feld
    if roh.ends_with('%') {
        felder.pop();
    }

    let gruppe = felder
        .get(2)
        .ok_or_else(|| PinguinError::ungueltig("XT: Gruppe fehlt"))?;
    let befehl = felder
        .get(3)
        .ok_or_else(|| PinguinError::ungueltig("XT: Befehl fehlt"))?;
    // Nur das zweite `#`-Segment zaehlt, weitere werden ignoriert
    let mut segmente = befehl.split('#');
    let id = segmente.next().unwrap_or_default();
    let erweiterung = segmente
        .next()
        .ok_or_else(|| PinguinError::ungueltig("XT: Befehl ohne '#'"))?;

    Ok(XtBefehl {
        gruppe: gruppe.to_string(),
        id: id.to_string(),
        erweiterung: erweiterung.to_string(),
        argumente: felder.iter().skip(4).map(|f| f.to_string()).collect(),
        roh: roh.to_string(),
    })
}
