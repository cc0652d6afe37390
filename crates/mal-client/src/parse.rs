//! Mapping of XML records onto typed Anime/Manga records.
//!
//! Search results (`<entry>` elements) use catalog tag names directly; the
//! profile endpoint (`<anime>`/`<manga>` elements) prefixes catalog fields
//! with `series_` and list values with `my_`.

use chrono::NaiveDate;

use crate::error::{MalError, Result};
use crate::models::{Anime, AnimeEntry, ListStatus, ListSummary, Manga, MangaEntry, MediaKind};
use crate::xml::{clean_synopsis, read_error, read_records, split_synonyms, XmlRecord};

/// A record kind that can be searched for and stored on a list.
pub trait ListItem: Sized {
    const KIND: MediaKind;

    fn id(&self) -> u32;

    /// Payload for the add/update endpoints
    fn payload(&self) -> String;

    /// Build from one `<entry>` of a search response
    fn from_search_record(record: &XmlRecord) -> Self;

    /// Build from one element of a profile list response
    fn from_list_record(record: &XmlRecord) -> Self;
}

/// Catalog date text; the service's zero date means unknown
fn catalog_date(record: &XmlRecord, field: &str) -> Option<String> {
    record
        .get(field)
        .filter(|s| *s != "0000-00-00")
        .map(str::to_string)
}

/// A `YYYY-MM-DD` list date; zero or partial dates are unset
fn list_date(record: &XmlRecord, field: &str) -> Option<NaiveDate> {
    record
        .get(field)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn list_status(record: &XmlRecord, field: &str) -> Option<ListStatus> {
    record.get(field).and_then(|s| s.parse().ok())
}

fn small(record: &XmlRecord, field: &str) -> u8 {
    record.get(field).and_then(|s| s.parse().ok()).unwrap_or(0)
}

fn tags(record: &XmlRecord, field: &str) -> Vec<String> {
    record
        .get(field)
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl ListItem for Anime {
    const KIND: MediaKind = MediaKind::Anime;

    fn id(&self) -> u32 {
        self.id
    }

    fn payload(&self) -> String {
        self.to_xml()
    }

    fn from_search_record(record: &XmlRecord) -> Self {
        Anime {
            id: record.count("id"),
            title: record.text("title"),
            synonyms: split_synonyms(record.get("synonyms"), record.get("english")),
            episodes: record.count("episodes"),
            average: record.decimal("score"),
            start_date: catalog_date(record, "start_date"),
            end_date: catalog_date(record, "end_date"),
            synopsis: clean_synopsis(&record.text("synopsis")),
            image: record.get("image").map(str::to_string),
            status: record.text("status"),
            media_type: record.text("type"),
            entry: AnimeEntry::default(),
        }
    }

    fn from_list_record(record: &XmlRecord) -> Self {
        Anime {
            id: record.count("series_animedb_id"),
            title: record.text("series_title"),
            synonyms: split_synonyms(record.get("series_synonyms"), None),
            episodes: record.count("series_episodes"),
            average: None,
            start_date: catalog_date(record, "series_start"),
            end_date: catalog_date(record, "series_end"),
            synopsis: String::new(),
            image: record.get("series_image").map(str::to_string),
            status: record.text("series_status"),
            media_type: record.text("series_type"),
            entry: AnimeEntry {
                episode: record.count("my_watched_episodes"),
                status: list_status(record, "my_status"),
                score: small(record, "my_score"),
                times_rewatched: record.count("my_rewatching_ep"),
                date_start: list_date(record, "my_start_date"),
                date_finish: list_date(record, "my_finish_date"),
                enable_rewatching: record.count("my_rewatching") > 0,
                tags: tags(record, "my_tags"),
                ..Default::default()
            },
        }
    }
}

impl ListItem for Manga {
    const KIND: MediaKind = MediaKind::Manga;

    fn id(&self) -> u32 {
        self.id
    }

    fn payload(&self) -> String {
        self.to_xml()
    }

    fn from_search_record(record: &XmlRecord) -> Self {
        Manga {
            id: record.count("id"),
            title: record.text("title"),
            synonyms: split_synonyms(record.get("synonyms"), record.get("english")),
            chapters: record.count("chapters"),
            volumes: record.count("volumes"),
            average: record.decimal("score"),
            start_date: catalog_date(record, "start_date"),
            end_date: catalog_date(record, "end_date"),
            synopsis: clean_synopsis(&record.text("synopsis")),
            image: record.get("image").map(str::to_string),
            status: record.text("status"),
            media_type: record.text("type"),
            entry: MangaEntry::default(),
        }
    }

    fn from_list_record(record: &XmlRecord) -> Self {
        Manga {
            id: record.count("series_mangadb_id"),
            title: record.text("series_title"),
            synonyms: split_synonyms(record.get("series_synonyms"), None),
            chapters: record.count("series_chapters"),
            volumes: record.count("series_volumes"),
            average: None,
            start_date: catalog_date(record, "series_start"),
            end_date: catalog_date(record, "series_end"),
            synopsis: String::new(),
            image: record.get("series_image").map(str::to_string),
            status: record.text("series_status"),
            media_type: record.text("series_type"),
            entry: MangaEntry {
                chapter: record.count("my_read_chapters"),
                volume: record.count("my_read_volumes"),
                status: list_status(record, "my_status"),
                score: small(record, "my_score"),
                times_reread: record.count("my_rereading_chap"),
                date_start: list_date(record, "my_start_date"),
                date_finish: list_date(record, "my_finish_date"),
                // The service spells this tag `my_rereadingg`
                enable_rereading: record.count("my_rereadingg") > 0
                    || record.count("my_rereading") > 0,
                tags: tags(record, "my_tags"),
                ..Default::default()
            },
        }
    }
}

/// Parse a search response into records of the requested kind
pub fn parse_search_results<T: ListItem>(xml: &str) -> Result<Vec<T>> {
    Ok(read_records(xml, "entry")?
        .iter()
        .map(T::from_search_record)
        .collect())
}

/// Account owner fields of a profile document's `myinfo` block
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileOwner {
    pub id: u32,
    pub name: String,
}

/// A parsed profile document: its owner plus one list summary
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileList<T> {
    pub owner: ProfileOwner,
    pub summary: ListSummary<T>,
}

fn parse_profile<T: ListItem>(xml: &str, watching: &str, planned: &str) -> Result<ProfileList<T>> {
    if let Some(message) = read_error(xml)? {
        return Err(MalError::Service(message));
    }

    let info = read_records(xml, "myinfo")?
        .into_iter()
        .next()
        .ok_or_else(|| MalError::Parse("profile document has no myinfo block".to_string()))?;

    let entries = read_records(xml, T::KIND.as_str())?
        .iter()
        .map(T::from_list_record)
        .collect();

    Ok(ProfileList {
        owner: ProfileOwner {
            id: info.count("user_id"),
            name: info.text("user_name"),
        },
        summary: ListSummary {
            entries,
            completed: info.count("user_completed"),
            on_hold: info.count("user_onhold"),
            dropped: info.count("user_dropped"),
            planned: info.count(planned),
            watching: info.count(watching),
            days_spent: info.decimal("user_days_spent_watching").unwrap_or(0.0),
        },
    })
}

/// Parse a profile document requested with `type=anime`
pub fn parse_anime_list(xml: &str) -> Result<ProfileList<Anime>> {
    parse_profile(xml, "user_watching", "user_plantowatch")
}

/// Parse a profile document requested with `type=manga`
pub fn parse_manga_list(xml: &str) -> Result<ProfileList<Manga>> {
    parse_profile(xml, "user_reading", "user_plantoread")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANIME_SEARCH: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<anime>
  <entry>
    <id>1</id>
    <title>Cowboy Bebop</title>
    <english>Cowboy Bebop</english>
    <synonyms>Kaubōi Bibappu; CB</synonyms>
    <episodes>26</episodes>
    <score>8.78</score>
    <type>TV</type>
    <status>Finished Airing</status>
    <start_date>1998-04-03</start_date>
    <end_date>1999-04-24</end_date>
    <synopsis>In the year 2071, humanity has colonized several of the planets.&lt;br /&gt;&lt;br /&gt;Spike &amp;amp; Jet &amp;mdash; bounty hunters &amp;quot;cowboys&amp;quot;.</synopsis>
    <image>https://myanimelist.cdn-dena.com/images/anime/4/19644.jpg</image>
  </entry>
  <entry>
    <id>5</id>
    <title>Cowboy Bebop: Tengoku no Tobira</title>
    <english></english>
    <synonyms></synonyms>
    <episodes>1</episodes>
    <score>8.41</score>
    <type>Movie</type>
    <status>Finished Airing</status>
    <start_date>2001-09-01</start_date>
    <end_date>0000-00-00</end_date>
    <synopsis></synopsis>
    <image>https://myanimelist.cdn-dena.com/images/anime/1439/93480.jpg</image>
  </entry>
</anime>"#;

    const MANGA_SEARCH: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manga>
  <entry>
    <id>2</id>
    <title>Berserk</title>
    <english>Berserk</english>
    <synonyms>Berserk: The Prototype</synonyms>
    <chapters>0</chapters>
    <volumes>0</volumes>
    <score>9.38</score>
    <type>Manga</type>
    <status>Publishing</status>
    <start_date>1989-08-25</start_date>
    <end_date>0000-00-00</end_date>
    <synopsis>Guts, a former mercenary&lt;br /&gt;now known as the &amp;quot;Black Swordsman.&amp;quot;</synopsis>
    <image>https://myanimelist.cdn-dena.com/images/manga/1/157931.jpg</image>
  </entry>
</manga>"#;

    const ANIME_PROFILE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<myanimelist>
  <myinfo>
    <user_id>1234</user_id>
    <user_name>spike</user_name>
    <user_watching>3</user_watching>
    <user_completed>120</user_completed>
    <user_onhold>4</user_onhold>
    <user_dropped>7</user_dropped>
    <user_plantowatch>15</user_plantowatch>
    <user_days_spent_watching>42.18</user_days_spent_watching>
  </myinfo>
  <anime>
    <series_animedb_id>1</series_animedb_id>
    <series_title>Cowboy Bebop</series_title>
    <series_synonyms>; CB</series_synonyms>
    <series_type>1</series_type>
    <series_episodes>26</series_episodes>
    <series_status>2</series_status>
    <series_start>1998-04-03</series_start>
    <series_end>1999-04-24</series_end>
    <series_image>https://myanimelist.cdn-dena.com/images/anime/4/19644.jpg</series_image>
    <my_id>0</my_id>
    <my_watched_episodes>26</my_watched_episodes>
    <my_start_date>2017-01-02</my_start_date>
    <my_finish_date>0000-00-00</my_finish_date>
    <my_score>10</my_score>
    <my_status>2</my_status>
    <my_rewatching>0</my_rewatching>
    <my_rewatching_ep>0</my_rewatching_ep>
    <my_last_updated>1493164800</my_last_updated>
    <my_tags>space, jazz</my_tags>
  </anime>
</myanimelist>"#;

    #[test]
    fn test_parse_anime_search() {
        let results: Vec<Anime> = parse_search_results(ANIME_SEARCH).unwrap();
        assert_eq!(results.len(), 2);

        let bebop = &results[0];
        assert_eq!(bebop.id, 1);
        assert_eq!(bebop.title, "Cowboy Bebop");
        assert_eq!(bebop.synonyms, vec!["Kaubōi Bibappu", "CB", "Cowboy Bebop"]);
        assert_eq!(bebop.episodes, 26);
        assert_eq!(bebop.average, Some(8.78));
        assert_eq!(bebop.media_type, "TV");
        assert_eq!(bebop.status, "Finished Airing");
        assert_eq!(bebop.start_date.as_deref(), Some("1998-04-03"));
        assert_eq!(bebop.end_date.as_deref(), Some("1999-04-24"));
        assert_eq!(
            bebop.synopsis,
            "In the year 2071, humanity has colonized several of the planets.\
             Spike & Jet \u{2014} bounty hunters \"cowboys\"."
        );
        assert_eq!(
            bebop.image.as_deref(),
            Some("https://myanimelist.cdn-dena.com/images/anime/4/19644.jpg")
        );

        let movie = &results[1];
        assert!(movie.synonyms.is_empty());
        assert_eq!(movie.end_date, None);
        assert_eq!(movie.synopsis, "");
    }

    #[test]
    fn test_parse_manga_search() {
        let results: Vec<Manga> = parse_search_results(MANGA_SEARCH).unwrap();
        assert_eq!(results.len(), 1);

        let berserk = &results[0];
        assert_eq!(berserk.id, 2);
        assert_eq!(berserk.chapters, 0);
        assert_eq!(berserk.volumes, 0);
        assert_eq!(berserk.average, Some(9.38));
        assert_eq!(berserk.media_type, "Manga");
        assert_eq!(berserk.synonyms, vec!["Berserk: The Prototype", "Berserk"]);
        assert_eq!(
            berserk.synopsis,
            "Guts, a former mercenarynow known as the \"Black Swordsman.\""
        );
    }

    #[test]
    fn test_parse_empty_search() {
        let results: Vec<Anime> = parse_search_results("<anime></anime>").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_anime_profile() {
        let profile = parse_anime_list(ANIME_PROFILE).unwrap();
        assert_eq!(profile.owner.id, 1234);
        assert_eq!(profile.owner.name, "spike");

        let summary = profile.summary;
        assert_eq!(summary.watching, 3);
        assert_eq!(summary.completed, 120);
        assert_eq!(summary.on_hold, 4);
        assert_eq!(summary.dropped, 7);
        assert_eq!(summary.planned, 15);
        assert_eq!(summary.days_spent, 42.18);
        assert_eq!(summary.entries.len(), 1);

        let bebop = &summary.entries[0];
        assert_eq!(bebop.id, 1);
        assert_eq!(bebop.synonyms, vec!["CB"]);
        assert_eq!(bebop.entry.episode, 26);
        assert_eq!(bebop.entry.status, Some(ListStatus::Completed));
        assert_eq!(bebop.entry.score, 10);
        assert_eq!(bebop.entry.date_start, NaiveDate::from_ymd_opt(2017, 1, 2));
        assert_eq!(bebop.entry.date_finish, None);
        assert_eq!(bebop.entry.tags, vec!["space", "jazz"]);
    }

    #[test]
    fn test_profile_error_document() {
        let xml = "<myanimelist><error>Invalid username</error></myanimelist>";
        match parse_manga_list(xml) {
            Err(MalError::Service(message)) => assert_eq!(message, "Invalid username"),
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[test]
    fn test_profile_without_myinfo() {
        let result = parse_anime_list("<myanimelist></myanimelist>");
        assert!(matches!(result, Err(MalError::Parse(_))));
    }
}
