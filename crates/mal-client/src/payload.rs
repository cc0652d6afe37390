//! XML payloads for the add/update list endpoints.

use std::fmt::Write;

use chrono::NaiveDate;
use quick_xml::escape::escape;

use crate::models::{Anime, AnimeEntry, Manga, MangaEntry};

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Builds the `<entry>` document one child element at a time
struct EntryWriter {
    out: String,
}

impl EntryWriter {
    fn new() -> Self {
        let mut out = String::from(DECLARATION);
        out.push_str("<entry>");
        Self { out }
    }

    fn field(&mut self, tag: &str, value: impl std::fmt::Display) -> &mut Self {
        let text = value.to_string();
        // Writing to a String cannot fail
        let _ = write!(self.out, "<{tag}>{}</{tag}>", escape(text.as_str()));
        self
    }

    fn optional<T: std::fmt::Display>(&mut self, tag: &str, value: Option<T>) -> &mut Self {
        match value {
            Some(value) => self.field(tag, value),
            None => self.field(tag, ""),
        }
    }

    fn date(&mut self, tag: &str, value: Option<NaiveDate>) -> &mut Self {
        self.optional(tag, value.map(|d| d.format("%m%d%Y")))
    }

    fn flag(&mut self, tag: &str, value: bool) -> &mut Self {
        self.field(tag, if value { 1 } else { 0 })
    }

    fn finish(mut self) -> String {
        self.out.push_str("</entry>");
        self.out
    }
}

impl AnimeEntry {
    /// Serialize to the service's anime list payload
    pub fn to_xml(&self) -> String {
        let mut w = EntryWriter::new();
        w.field("episode", self.episode)
            .optional("status", self.status.map(|s| s.code()))
            .field("score", self.score)
            .field("times_rewatched", self.times_rewatched)
            .optional("rewatch_value", self.rewatch_value)
            .date("date_start", self.date_start)
            .date("date_finish", self.date_finish)
            .optional("priority", self.priority)
            .flag("enable_discussion", self.enable_discussion)
            .flag("enable_rewatching", self.enable_rewatching)
            .field("comments", &self.comments)
            .field("tags", self.tags.join(", "));
        w.finish()
    }
}

impl MangaEntry {
    /// Serialize to the service's manga list payload
    pub fn to_xml(&self) -> String {
        let mut w = EntryWriter::new();
        w.field("chapter", self.chapter)
            .field("volume", self.volume)
            .optional("status", self.status.map(|s| s.code()))
            .field("score", self.score)
            .field("times_reread", self.times_reread)
            .optional("reread_value", self.reread_value)
            .date("date_start", self.date_start)
            .date("date_finish", self.date_finish)
            .optional("priority", self.priority)
            .flag("enable_discussion", self.enable_discussion)
            .flag("enable_rereading", self.enable_rereading)
            .field("comments", &self.comments)
            .field("scan_group", &self.scan_group)
            .field("tags", self.tags.join(", "));
        w.finish()
    }
}

impl Anime {
    pub fn to_xml(&self) -> String {
        self.entry.to_xml()
    }
}

impl Manga {
    pub fn to_xml(&self) -> String {
        self.entry.to_xml()
    }
}
