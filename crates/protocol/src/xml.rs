//! Minimaler XML-Baum fuer `<msg>`-Nachrichten
//!
//! Die Gateways brauchen nur wenige Zugriffe (Root → `body` → `action`,
//! `body/login/nick`, `body/ver@v`). Ein kleiner Elementbaum reicht dafuer.

use pinguin_core::{PinguinError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Ein XML-Element mit Attributen, Kindern und zusammengefuegtem Text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attribute: Vec<(String, String)>,
    pub kinder: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    /// Wert eines Attributs, falls vorhanden
    pub fn attribut(&self, name: &str) -> Option<&str> {
        self.attribute
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Erstes Kind-Element mit dem Namen
    pub fn kind(&self, name: &str) -> Option<&XmlElement> {
        self.kinder.iter().find(|k| k.name == name)
    }

    /// Text des Elements (inkl. CDATA)
    pub fn text(&self) -> &str {
        &self.text
    }
}

fn element_aus_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attribute = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| PinguinError::ungueltig(format!("Attribut: {}", e)))?;
        let schluessel = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let wert = attr
            .unescape_value()
            .map_err(|e| PinguinError::ungueltig(format!("Attributwert: {}", e)))?
            .into_owned();
        attribute.push((schluessel, wert));
    }
    Ok(XmlElement {
        name,
        attribute,
        kinder: Vec::new(),
        text: String::new(),
    })
}

/// Parst ein XML-Dokument mit genau einem Root-Element
///
/// # Fehler
/// `UngueltigeNachricht` wenn kein Root-Element existiert, mehrere
/// Root-Elemente vorkommen oder Elemente nicht geschlossen werden.
pub fn dokument_parsen(eingabe: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(eingabe);
    reader.config_mut().trim_text(true);

    let mut stapel: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    let mut abschliessen = |element: XmlElement, stapel: &mut Vec<XmlElement>| -> Result<()> {
        match stapel.last_mut() {
            Some(eltern) => {
                eltern.kinder.push(element);
                Ok(())
            }
            None if root.is_none() => {
                root = Some(element);
                Ok(())
            }
            None => Err(PinguinError::ungueltig("mehrere Root-Elemente")),
        }
    };

    loop {
        let event = reader
            .read_event()
            .map_err(|e| PinguinError::ungueltig(format!("XML: {}", e)))?;
        match event {
            Event::Start(start) => {
                stapel.push(element_aus_start(&start)?);
            }
            Event::Empty(start) => {
                let element = element_aus_start(&start)?;
                abschliessen(element, &mut stapel)?;
            }
            Event::End(_) => {
                let element = stapel
                    .pop()
                    .ok_or_else(|| PinguinError::ungueltig("unerwartetes End-Tag"))?;
                abschliessen(element, &mut stapel)?;
            }
            Event::Text(text) => {
                if let Some(aktuell) = stapel.last_mut() {
                    let inhalt = text
                        .unescape()
                        .map_err(|e| PinguinError::ungueltig(format!("Text: {}", e)))?;
                    aktuell.text.push_str(&inhalt);
                }
            }
            Event::CData(cdata) => {
                if let Some(aktuell) = stapel.last_mut() {
                    aktuell
                        .text
                        .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stapel.is_empty() {
        return Err(PinguinError::ungueltig("Element nicht geschlossen"));
    }

    root.ok_or_else(|| PinguinError::ungueltig("kein Root-Element"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_nachricht_parsen() {
        let xml = "<msg t='sys'><body action='login' r='0'><login z='w1'>\
                   <nick><![CDATA[101|101|pingu|abc]]></nick>\
                   <pword><![CDATA[key#hash]]></pword></login></body></msg>";
        let root = dokument_parsen(xml).unwrap();
        assert_eq!(root.name, "msg");
        assert_eq!(root.attribut("t"), Some("sys"));

        let body = root.kind("body").unwrap();
        assert_eq!(body.attribut("action"), Some("login"));

        let login = body.kind("login").unwrap();
        assert_eq!(login.kind("nick").unwrap().text(), "101|101|pingu|abc");
        assert_eq!(login.kind("pword").unwrap().text(), "key#hash");
    }

    #[test]
    fn leeres_element_als_root() {
        let root = dokument_parsen("<policy-file-request/>").unwrap();
        assert_eq!(root.name, "policy-file-request");
        assert!(root.kinder.is_empty());
    }

    #[test]
    fn attribute_werden_entschluesselt() {
        let root = dokument_parsen("<a b='x &amp; y'/>").unwrap();
        assert_eq!(root.attribut("b"), Some("x & y"));
        assert_eq!(root.attribut("c"), None);
    }

    #[test]
    fn kein_root_element() {
        assert!(dokument_parsen("").is_err());
        assert!(dokument_parsen("   ").is_err());
    }

    #[test]
    fn nicht_geschlossen() {
        assert!(dokument_parsen("<msg><body>").is_err());
    }

    #[test]
    fn mehrere_roots() {
        assert!(dokument_parsen("<a/><b/>").is_err());
    }
}
