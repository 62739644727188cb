//! Schluessel-Primitive des Handshakes
//!
//! MD5 wird hier nur als Schluessel-Ableitung des Client-Protokolls genutzt,
//! nicht fuer Passwoerter.

use std::fmt::Write as _;

use md5::{Digest, Md5};
use rand::RngCore;

/// MD5 eines Strings als 32 Zeichen lowercase hex
pub fn hash(eingabe: &str) -> String {
    let digest = Md5::digest(eingabe.as_bytes());
    hex(&digest)
}

/// Vertauscht die Haelften eines 32-stelligen Hex-Strings
///
/// Liefert `None` wenn die Eingabe keine 32 Zeichen hat.
pub fn verschleiern(hash: &str) -> Option<String> {
    if hash.len() != 32 {
        return None;
    }
    let vorne = hash.get(..16)?;
    let hinten = hash.get(16..32)?;
    Some(format!("{hinten}{vorne}"))
}

/// `laenge` zufaellige Bytes als lowercase hex
pub fn zufallsschluessel(laenge: usize) -> String {
    let mut bytes = vec![0u8; laenge];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex(&bytes)
}

/// Erwarteter Client-Key: `verschleiern(hash(login_key + random_key)) + login_key`
pub fn client_key_berechnen(login_key: &str, random_key: &str) -> Option<String> {
    let verschleiert = verschleiern(&hash(&format!("{login_key}{random_key}")))?;
    Some(format!("{verschleiert}{login_key}"))
}

fn hex(bytes: &[u8]) -> String {
    let mut ausgabe = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Schreiben in einen String schlaegt nicht fehl
        let _ = write!(ausgabe, "{b:02x}");
    }
    ausgabe
}
