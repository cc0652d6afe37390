//! Flat record extraction from the service's XML documents.
//!
//! Every document the service returns is a root element holding a list of
//! record elements (`entry`, `anime`, `manga`, `myinfo`) whose children are
//! plain text fields. `read_records` collects those children by tag name.

use std::borrow::Cow;
use std::collections::HashMap;

use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{MalError, Result};

/// Text fields of one record element, keyed by child tag name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlRecord {
    fields: HashMap<String, String>,
}

impl XmlRecord {
    /// Trimmed text of a field; `None` when missing or blank.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Trimmed text of a field, empty when missing.
    pub fn text(&self, field: &str) -> String {
        self.get(field).unwrap_or_default().to_string()
    }

    /// Unsigned count; 0 when missing or not a number.
    pub fn count(&self, field: &str) -> u32 {
        self.get(field).and_then(|s| s.parse().ok()).unwrap_or(0)
    }

    /// Decimal value; `None` when missing or not a number.
    pub fn decimal(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(|s| s.parse().ok())
    }

    fn push_text(&mut self, field: &str, text: &str) {
        self.fields.entry(field.to_string()).or_default().push_str(text);
    }

    fn touch(&mut self, field: String) {
        self.fields.entry(field).or_default();
    }
}

impl<const N: usize> From<[(&str, &str); N]> for XmlRecord {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Collect every element named `tag` as a record.
///
/// Only direct children of a record become fields; deeper nesting is
/// ignored.
pub fn read_records(xml: &str, tag: &str) -> Result<Vec<XmlRecord>> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut buf = Vec::new();

    let mut current: Option<XmlRecord> = None;
    let mut field: Option<String> = None;
    // Element depth below the open record
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if current.is_some() {
                    depth += 1;
                    if depth == 1 {
                        field = Some(name);
                    }
                } else if name == tag {
                    current = Some(XmlRecord::default());
                    depth = 0;
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match current.as_mut() {
                    Some(record) if depth == 0 => record.touch(name),
                    Some(_) => {}
                    None if name == tag => records.push(XmlRecord::default()),
                    None => {}
                }
            }
            Ok(Event::Text(e)) => {
                if let (Some(record), Some(name), 1) = (current.as_mut(), field.as_deref(), depth) {
                    let raw = String::from_utf8_lossy(&e);
                    record.push_text(name, &html_unescape(&raw));
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some(record), Some(name), 1) = (current.as_mut(), field.as_deref(), depth) {
                    record.push_text(name, &String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                if current.is_some() {
                    if depth == 0 {
                        records.extend(current.take());
                    } else {
                        depth -= 1;
                        if depth == 0 {
                            field = None;
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MalError::Parse(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

/// Text of the first `<error>` element, if the document carries one.
pub fn read_error(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut in_error = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => in_error = e.name().as_ref() == b"error",
            Ok(Event::Text(e)) if in_error => {
                let raw = String::from_utf8_lossy(&e);
                return Ok(Some(html_unescape(&raw).into_owned()));
            }
            Ok(Event::End(e)) if in_error && e.name().as_ref() == b"error" => {
                return Ok(Some(String::new()));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(MalError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
}

/// Longest entity body (`&...;`) worth looking up
const MAX_ENTITY_LEN: usize = 32;

/// Resolve named and numeric HTML entities one at a time. A run that does not
/// resolve (a bare `&`, an unknown name) is copied through as-is.
pub fn html_unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];

        let resolved = tail
            .find(';')
            .filter(|&end| end > 0 && end <= MAX_ENTITY_LEN)
            .and_then(|end| resolve_entity(&tail[..end]).map(|value| (value, end)));

        match resolved {
            Some((value, end)) => {
                out.push_str(&value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

fn resolve_entity(name: &str) -> Option<Cow<'static, str>> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) if hex.chars().all(|c| c.is_ascii_hexdigit()) => {
                u32::from_str_radix(hex, 16).ok()?
            }
            Some(_) => return None,
            None if number.chars().all(|c| c.is_ascii_digit()) => number.parse().ok()?,
            None => return None,
        };
        return char::from_u32(code).map(|c| Cow::Owned(c.to_string()));
    }
    resolve_html5_entity(name).map(Cow::Borrowed)
}

/// Strip line-break markup and resolve HTML entities in a synopsis.
pub fn clean_synopsis(raw: &str) -> String {
    let stripped = raw
        .replace("<br />", "")
        .replace("<br/>", "")
        .replace("<br>", "");
    html_unescape(stripped.trim()).into_owned()
}

/// Split a `;`-delimited synonym field, appending the English title when it
/// is not already listed.
pub fn split_synonyms(raw: Option<&str>, english: Option<&str>) -> Vec<String> {
    let mut synonyms: Vec<String> = raw
        .unwrap_or_default()
        .split(';')
        .map(|s| html_unescape(s.trim()).into_owned())
        .filter(|s| !s.is_empty())
        .collect();

    if let Some(english) = english.map(str::trim).filter(|s| !s.is_empty()) {
        if !synonyms.iter().any(|s| s == english) {
            synonyms.push(english.to_string());
        }
    }

    synonyms
}
