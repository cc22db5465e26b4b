//! Flattened view of an XML document used by the metadata parsers.
//!
//! Every text node becomes an [`XmlLeaf`] carrying its slash-joined element path
//! (namespace prefixes stripped) and the attributes of all its ancestors, so that
//! lookups like `Tile_Geocoding/Size[@resolution=10]/NROWS` reduce to a filter
//! over leaves.
use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::io::sentinel2::MetadataError;

#[derive(Debug, Clone)]
pub struct XmlLeaf {
    pub path: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
}

impl XmlLeaf {
    /// Innermost attribute with this name along the leaf's ancestry
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn matches(&self, suffix: &str) -> bool {
        self.path == suffix
            || (self.path.ends_with(suffix)
                && self.path[..self.path.len() - suffix.len()].ends_with('/'))
    }
}

#[derive(Debug, Clone, Default)]
pub struct XmlDocument {
    leaves: Vec<XmlLeaf>,
}

fn read_attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, MetadataError> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::InvalidAttr)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

impl XmlDocument {
    pub fn parse(xml: &str) -> Result<Self, MetadataError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut stack: Vec<(String, Vec<(String, String)>)> = Vec::new();
        let mut leaves = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    stack.push((tag, read_attributes(e)?));
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(e) => {
                    let text = e.unescape()?.trim().to_string();
                    if !text.is_empty() {
                        let path = stack
                            .iter()
                            .map(|(tag, _)| tag.as_str())
                            .collect::<Vec<_>>()
                            .join("/");
                        let attributes = stack
                            .iter()
                            .flat_map(|(_, attrs)| attrs.iter().cloned())
                            .collect();
                        leaves.push(XmlLeaf {
                            path,
                            attributes,
                            text,
                        });
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { leaves })
    }

    /// All leaves whose path ends with `suffix` on an element boundary
    pub fn leaves<'a>(&'a self, suffix: &'a str) -> impl Iterator<Item = &'a XmlLeaf> + 'a {
        self.leaves.iter().filter(move |leaf| leaf.matches(suffix))
    }

    /// First leaf at `suffix` whose ancestry carries `attr=value`
    pub fn leaf_with_attribute(&self, suffix: &str, attr: &str, value: &str) -> Option<&XmlLeaf> {
        self.leaves
            .iter()
            .find(|leaf| leaf.matches(suffix) && leaf.attribute(attr) == Some(value))
    }

    pub fn text(&self, suffix: &str) -> Option<&str> {
        self.leaves
            .iter()
            .find(|leaf| leaf.matches(suffix))
            .map(|leaf| leaf.text.as_str())
    }

    pub fn required_text(&self, suffix: &str) -> Result<&str, MetadataError> {
        self.text(suffix)
            .ok_or_else(|| MetadataError::MissingField(suffix.to_string()))
    }

    pub fn required<T: FromStr>(&self, suffix: &str) -> Result<T, MetadataError> {
        parse_value(suffix, self.required_text(suffix)?)
    }

    /// Absent is fine, present-but-malformed is not
    pub fn optional<T: FromStr>(&self, suffix: &str) -> Result<Option<T>, MetadataError> {
        self.text(suffix)
            .map(|text| parse_value(suffix, text))
            .transpose()
    }
}

pub fn parse_value<T: FromStr>(field: &str, text: &str) -> Result<T, MetadataError> {
    text.trim()
        .parse::<T>()
        .map_err(|_| MetadataError::InvalidValue {
            field: field.to_string(),
            value: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<n1:Root xmlns:n1="urn:test">
  <Geo>
    <Size resolution="10"><NROWS>10980</NROWS></Size>
    <Size resolution="20"><NROWS>5490</NROWS></Size>
    <Empty/>
    <Value unit="deg"> 42.5 </Value>
  </Geo>
</n1:Root>"#;

    #[test]
    fn test_paths_strip_namespace_and_keep_attributes() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.text("Root/Geo/Value"), Some("42.5"));
        let leaf = doc.leaf_with_attribute("Size/NROWS", "resolution", "20").unwrap();
        assert_eq!(leaf.text, "5490");
        assert_eq!(doc.leaves("NROWS").count(), 2);
        // "ROWS" must not match "NROWS"
        assert_eq!(doc.leaves("ROWS").count(), 0);
    }

    #[test]
    fn test_required_and_optional_values() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let v: f64 = doc.required("Geo/Value").unwrap();
        assert_eq!(v, 42.5);
        assert!(matches!(
            doc.required::<f64>("Geo/Missing"),
            Err(MetadataError::MissingField(_))
        ));
        assert_eq!(doc.optional::<f64>("Geo/Missing").unwrap(), None);

        let bad = XmlDocument::parse("<A><B>abc</B></A>").unwrap();
        assert!(matches!(
            bad.optional::<f64>("A/B"),
            Err(MetadataError::InvalidValue { .. })
        ));
    }
}
