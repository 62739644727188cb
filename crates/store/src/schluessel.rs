//! Schluessel-Muster im Kurzzeitspeicher

use pinguin_core::{DienstId, Pid};

/// Hash: Dienst-ID → aktuelle Spielerzahl
pub const POPULATION: &str = "houdini.population";

/// Einmal-Login-Schluessel `{username}.lkey`
pub fn login_key(username: &str) -> String {
    format!("{}.lkey", username)
}

/// Einmal-Bestaetigungs-Schluessel `{username}.ckey`
pub fn confirm_key(username: &str) -> String {
    format!("{}.ckey", username)
}

/// Sitzungsmarker nach erfolgreicher Verifikation `{username}.loginkey`
pub fn sitzungs_key(username: &str) -> String {
    format!("{}.loginkey", username)
}

/// Fehlversuch-Zaehler pro Host (ohne Port)
pub fn flood(host: &str) -> String {
    format!("{}.flood", host)
}

/// Menge der online PIDs einer Dienst-Instanz
pub fn spieler_set(dienst: DienstId) -> String {
    format!("houdini.players.{}", dienst)
}

pub fn letzter_dig(pid: Pid) -> String {
    format!("houdini.last_dig.{}", pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muster() {
        assert_eq!(login_key("pingu"), "pingu.lkey");
        assert_eq!(confirm_key("pingu"), "pingu.ckey");
        assert_eq!(sitzungs_key("pingu"), "pingu.loginkey");
        assert_eq!(flood("10.0.0.1"), "10.0.0.1.flood");
        assert_eq!(spieler_set(DienstId(3100)), "houdini.players.3100");
        assert_eq!(letzter_dig(Pid(101)), "houdini.last_dig.101");
    }
}
