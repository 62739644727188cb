//! Wire-Format fuer TCP-Verbindungen
//!
//! Text-basiertes Protokoll: UTF-8-Payload + Terminator-Byte (0x00).
//! Es gibt kein Laengen-Feld.
//!
//! ## Frame-Format
//!
//! ```text
//! +----...----+------+
//! | Payload   | 0x00 |
//! +----...----+------+
//! ```
//!
//! Endet der Stream ohne Terminator, wird der bis dahin gelesene Rest als
//! letzter Frame geliefert (moeglicherweise leer) und das Stream-Ende
//! signalisiert.

use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Frame-Groesse (64 KiB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Terminator-Byte am Ende jeder Nachricht
pub const TERMINATOR: u8 = 0x00;

// ---------------------------------------------------------------------------
// NulCodec
// ---------------------------------------------------------------------------

/// tokio-util Codec fuer NUL-terminierte Text-Nachrichten
///
/// Implementiert `Encoder<String>` und `Decoder` fuer die Verwendung mit
/// `FramedRead` / `FramedWrite`.
#[derive(Debug, Clone)]
pub struct NulCodec {
    /// Maximale erlaubte Frame-Groesse in Bytes (ohne Terminator)
    max_frame_size: usize,
    /// Bis zu diesem Index wurde der Buffer bereits nach 0x00 durchsucht
    naechster_index: usize,
}

impl NulCodec {
    /// Erstellt einen neuen `NulCodec` mit Standard-Limits
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Erstellt einen `NulCodec` mit benutzerdefinierter maximaler Frame-Groesse
    pub fn with_max_size(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            naechster_index: 0,
        }
    }

    /// Gibt die konfigurierte maximale Frame-Groesse zurueck
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    fn zu_gross(&self, laenge: usize) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Frame zu gross: {} Bytes (Maximum: {} Bytes)",
                laenge, self.max_frame_size
            ),
        )
    }
}

impl Default for NulCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Dekodiert Frame-Bytes als UTF-8
fn utf8_dekodieren(bytes: BytesMut) -> io::Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Frame ist kein gueltiges UTF-8: {}", e),
        )
    })
}

// ---------------------------------------------------------------------------
// Decoder-Implementierung
// ---------------------------------------------------------------------------

impl Decoder for NulCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let start = self.naechster_index.min(src.len());
        match src[start..].iter().position(|b| *b == TERMINATOR) {
            Some(versatz) => {
                let ende = start + versatz;
                self.naechster_index = 0;

                if ende > self.max_frame_size {
                    return Err(self.zu_gross(ende));
                }

                let payload = src.split_to(ende);
                // Terminator verbrauchen
                src.advance(1);
                utf8_dekodieren(payload).map(Some)
            }
            None => {
                if src.len() > self.max_frame_size {
                    return Err(self.zu_gross(src.len()));
                }
                self.naechster_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            return Ok(None);
        }

        // Stream-Ende ohne Terminator: Rest als letzten Frame liefern
        self.naechster_index = 0;
        let rest = src.split_to(src.len());
        utf8_dekodieren(rest).map(Some)
    }
}

// ---------------------------------------------------------------------------
// Encoder-Implementierung
// ---------------------------------------------------------------------------

impl Encoder<String> for NulCodec {
    type Error = io::Error;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_frame_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Nachricht zu gross: {} Bytes (Maximum: {} Bytes)",
                    item.len(),
                    self.max_frame_size
                ),
            ));
        }

        dst.reserve(item.len() + 1);
        dst.put_slice(item.as_bytes());
        dst.put_u8(TERMINATOR);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::codec::{Decoder, Encoder};

    #[test]
    fn encode_haengt_terminator_an() {
        let mut codec = NulCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("%xt%l%-1%".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"%xt%l%-1%\0");
    }

    #[test]
    fn decode_unvollstaendiger_frame() {
        let mut codec = NulCodec::new();
        let mut buf = BytesMut::from(&b"<msg t='sys'>"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        // Rest nachliefern
        buf.extend_from_slice(b"</msg>\0");
        let frame = codec.decode(&mut buf).unwrap().expect("Frame erwartet");
        assert_eq!(frame, "<msg t='sys'></msg>");
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_mehrere_nachrichten_im_buffer() {
        let mut codec = NulCodec::new();
        let mut buf = BytesMut::from(&b"eins\0zwei\0drei"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("eins"));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("zwei"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        // Stream-Ende liefert den Rest
        assert_eq!(codec.decode_eof(&mut buf).unwrap().as_deref(), Some("drei"));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn decode_eof_ohne_rest() {
        let mut codec = NulCodec::new();
        let mut buf = BytesMut::new();
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn decode_ablehnung_zu_grosser_frame() {
        let mut codec = NulCodec::with_max_size(8);
        let mut buf = BytesMut::from(&b"0123456789"[..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn decode_ablehnung_ungueltiges_utf8() {
        let mut codec = NulCodec::new();
        let mut buf = BytesMut::from(&[0xff, 0xfe, 0x00][..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn encode_ablehnung_zu_grosse_nachricht() {
        let mut codec = NulCodec::with_max_size(4);
        let mut buf = BytesMut::new();
        assert!(codec.encode("zu lang".to_string(), &mut buf).is_err());
    }
}
