//! Ausgehende XT-Nachrichten
//!
//! Format: `%xt%{gruppe}%-1%{arg1}%...%`. Ausgehende Nachrichten tragen immer
//! die interne ID `-1`. Fehler: `%xt%e%-1%{code}%{args..}%`.

use std::fmt;

/// Interne ID aller ausgehenden Nachrichten
pub const INTERNE_ID: i32 = -1;

/// Numerische Fehlercodes, die der Client kennt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FehlerCode {
    Unbekannt,
    SpielerNichtGefunden,
    PasswortFalsch,
    ZuVieleVersuche,
    BanStunden,
    BanUnterStunde,
    Permaban,
    NichtAktiviert,
    Hausarrest,
}

impl FehlerCode {
    pub fn code(&self) -> u16 {
        match self {
            Self::Unbekannt => 0,
            Self::SpielerNichtGefunden => 100,
            Self::PasswortFalsch => 101,
            Self::ZuVieleVersuche => 150,
            Self::BanStunden => 601,
            Self::BanUnterStunde => 602,
            Self::Permaban => 603,
            Self::NichtAktiviert => 900,
            Self::Hausarrest => 913,
        }
    }
}

impl fmt::Display for FehlerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Baut `%xt%{gruppe}%-1%{args}%`
pub fn nachricht_erstellen<S: AsRef<str>>(gruppe: &str, argumente: &[S]) -> String {
    let mut ausgabe = format!("%xt%{}%{}%", gruppe, INTERNE_ID);
    for arg in argumente {
        ausgabe.push_str(arg.as_ref());
        ausgabe.push('%');
    }
    ausgabe
}

/// Baut eine Fehlerantwort `%xt%e%-1%{code}%{args}%`
pub fn fehler_erstellen<S: AsRef<str>>(code: FehlerCode, argumente: &[S]) -> String {
    let mut alle = Vec::with_capacity(argumente.len() + 1);
    alle.push(code.code().to_string());
    alle.extend(argumente.iter().map(|a| a.as_ref().to_string()));
    nachricht_erstellen("e", &alle)
}

/// Generischer Fehler ohne Details
pub fn unbekannter_fehler() -> String {
    fehler_erstellen::<&str>(FehlerCode::Unbekannt, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leere_nachricht() {
        assert_eq!(nachricht_erstellen::<&str>("l", &[]), "%xt%l%-1%");
    }

    #[test]
    fn nachricht_mit_argumenten() {
        assert_eq!(
            nachricht_erstellen("getdigcooldown", &["120"]),
            "%xt%getdigcooldown%-1%120%"
        );
        assert_eq!(
            nachricht_erstellen("js", &["1", "0", "1", "0"]),
            "%xt%js%-1%1%0%1%0%"
        );
    }

    #[test]
    fn fehler_codes() {
        assert_eq!(unbekannter_fehler(), "%xt%e%-1%0%");
        assert_eq!(
            fehler_erstellen::<&str>(FehlerCode::ZuVieleVersuche, &[]),
            "%xt%e%-1%150%"
        );
        assert_eq!(
            fehler_erstellen(FehlerCode::BanStunden, &["12"]),
            "%xt%e%-1%601%12%"
        );
        assert_eq!(FehlerCode::Hausarrest.to_string(), "913");
    }
}
