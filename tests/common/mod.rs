//! Helpers to pick apart written documents in integration tests
#![allow(dead_code)]

use gridformat::{Codec, FieldData, Precision};
use quick_xml::events::Event;
use quick_xml::Reader;

/// An element of the document's markup with its attributes
#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// text content, only recorded for inline `DataArray`s
    pub text: Option<String>,
}

impl Element {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
pub struct Document {
    pub head: String,
    pub appendix: Option<Vec<u8>>,
    pub elements: Vec<Element>,
}

impl Document {
    pub fn parse(bytes: &[u8]) -> Self {
        let (head, appendix) = match find(bytes, b"<AppendedData") {
            Some(start) => {
                let underscore = start + bytes[start..].iter().position(|b| *b == b'_').unwrap();
                let end = rfind(bytes, b"\n  </AppendedData>").unwrap();
                (&bytes[..start], Some(bytes[underscore + 1..end].to_vec()))
            }
            None => (bytes, None),
        };

        let head = String::from_utf8(head.to_vec()).unwrap();
        let elements = elements(&head);

        Self {
            head,
            appendix,
            elements,
        }
    }

    pub fn all(&self, name: &str) -> Vec<&Element> {
        self.elements.iter().filter(|e| e.name == name).collect()
    }

    pub fn first(&self, name: &str) -> &Element {
        self.elements
            .iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("no {} element", name))
    }

    pub fn data_array(&self, name: &str) -> &Element {
        self.all("DataArray")
            .into_iter()
            .find(|e| e.attribute("Name") == Some(name))
            .unwrap_or_else(|| panic!("no data array {}", name))
    }

    /// offsets of all appended arrays, in document order
    pub fn offsets(&self) -> Vec<usize> {
        self.all("DataArray")
            .iter()
            .filter_map(|e| e.attribute("offset"))
            .map(|o| o.parse().unwrap())
            .collect()
    }

    /// the encoded bytes of an array, taken from the appended section or the
    /// element's text
    pub fn encoded(&self, array: &Element) -> Vec<u8> {
        match array.attribute("offset") {
            Some(offset) => {
                let appendix = self.appendix.as_ref().unwrap();
                let offset: usize = offset.parse().unwrap();
                let end = self
                    .offsets()
                    .into_iter()
                    .filter(|o| *o > offset)
                    .min()
                    .unwrap_or(appendix.len());
                appendix[offset..end].to_vec()
            }
            None => array.text.clone().unwrap_or_default().into_bytes(),
        }
    }

    pub fn decode(&self, name: &str, codec: &Codec) -> FieldData {
        let array = self.data_array(name);
        let precision = precision(array.attribute("type").unwrap());
        codec.decode(&self.encoded(array), precision).unwrap()
    }
}

pub fn precision(name: &str) -> Precision {
    [
        Precision::INT8,
        Precision::INT16,
        Precision::INT32,
        Precision::INT64,
        Precision::UINT8,
        Precision::UINT16,
        Precision::UINT32,
        Precision::UINT64,
        Precision::FLOAT32,
        Precision::FLOAT64,
    ]
    .into_iter()
    .find(|p| p.vtk_name() == name)
    .unwrap_or_else(|| panic!("unknown type {}", name))
}

fn elements(head: &str) -> Vec<Element> {
    let mut reader = Reader::from_str(head);
    reader.trim_text(true);

    let mut elements: Vec<Element> = Vec::new();
    let mut open_array = None;

    loop {
        match reader.read_event() {
            Ok(event @ Event::Start(_)) | Ok(event @ Event::Empty(_)) => {
                let (e, has_content) = match event {
                    Event::Start(e) => (e, true),
                    Event::Empty(e) => (e, false),
                    _ => unreachable!(),
                };
                let name = String::from_utf8(e.name().as_ref().to_vec()).unwrap();
                let attributes = e
                    .attributes()
                    .map(|a| {
                        let a = a.unwrap();
                        let key = String::from_utf8(a.key.as_ref().to_vec()).unwrap();
                        (key, a.unescape_value().unwrap().into_owned())
                    })
                    .collect();

                if has_content && name == "DataArray" {
                    open_array = Some(elements.len());
                }
                elements.push(Element {
                    name,
                    attributes,
                    text: None,
                });
            }
            Ok(Event::Text(t)) => {
                if let Some(index) = open_array {
                    elements[index].text = Some(t.unescape().unwrap().into_owned());
                }
            }
            Ok(Event::End(_)) => open_array = None,
            Ok(Event::Eof) => break,
            Ok(_) => (),
            Err(e) => panic!("invalid markup: {}", e),
        }
    }

    elements
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
