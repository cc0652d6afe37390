//! Data models for MyAnimeList records.
//!
//! Catalog fields come straight from the service's XML; the `entry` part of
//! each record holds the user's list values that add/update transmit.

use chrono::NaiveDate;

/// Which half of the catalog a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Anime,
    Manga,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Anime => "anime",
            MediaKind::Manga => "manga",
        }
    }

    /// Path segment of the list endpoints (`animelist`, `mangalist`)
    pub fn list_path(&self) -> &'static str {
        match self {
            MediaKind::Anime => "animelist",
            MediaKind::Manga => "mangalist",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a record on a user's list, with the service's numeric codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    /// Watching (anime) or reading (manga)
    Current,
    Completed,
    OnHold,
    Dropped,
    /// Plan to watch / plan to read
    Planned,
}

impl ListStatus {
    pub fn code(&self) -> u8 {
        match self {
            ListStatus::Current => 1,
            ListStatus::Completed => 2,
            ListStatus::OnHold => 3,
            ListStatus::Dropped => 4,
            ListStatus::Planned => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ListStatus::Current),
            2 => Some(ListStatus::Completed),
            3 => Some(ListStatus::OnHold),
            4 => Some(ListStatus::Dropped),
            6 => Some(ListStatus::Planned),
            _ => None,
        }
    }
}

impl std::str::FromStr for ListStatus {
    type Err = String;

    /// Accepts numeric codes as well as the service's status words.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| format!("Invalid list status: {}", s));
        }
        match s.to_ascii_lowercase().replace(['-', ' ', '_'], "").as_str() {
            "watching" | "reading" => Ok(ListStatus::Current),
            "completed" => Ok(ListStatus::Completed),
            "onhold" => Ok(ListStatus::OnHold),
            "dropped" => Ok(ListStatus::Dropped),
            "plantowatch" | "plantoread" => Ok(ListStatus::Planned),
            _ => Err(format!("Invalid list status: {}", s)),
        }
    }
}

/// The user's list values for an anime
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimeEntry {
    /// Episodes watched
    pub episode: u32,
    pub status: Option<ListStatus>,
    /// 0 (unscored) to 10
    pub score: u8,
    pub times_rewatched: u32,
    pub rewatch_value: Option<u8>,
    pub date_start: Option<NaiveDate>,
    pub date_finish: Option<NaiveDate>,
    pub priority: Option<u8>,
    pub enable_discussion: bool,
    pub enable_rewatching: bool,
    pub comments: String,
    pub tags: Vec<String>,
}

/// The user's list values for a manga
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MangaEntry {
    /// Chapters read
    pub chapter: u32,
    /// Volumes read
    pub volume: u32,
    pub status: Option<ListStatus>,
    pub score: u8,
    pub times_reread: u32,
    pub reread_value: Option<u8>,
    pub date_start: Option<NaiveDate>,
    pub date_finish: Option<NaiveDate>,
    pub priority: Option<u8>,
    pub enable_discussion: bool,
    pub enable_rereading: bool,
    pub comments: String,
    pub scan_group: String,
    pub tags: Vec<String>,
}

/// Anime record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Anime {
    pub id: u32,
    pub title: String,
    /// Alternative titles, English title last
    pub synonyms: Vec<String>,
    pub episodes: u32,
    /// Catalog average score
    pub average: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub synopsis: String,
    pub image: Option<String>,
    /// Airing status as reported by the service
    pub status: String,
    /// TV, Movie, OVA, ...
    pub media_type: String,
    pub entry: AnimeEntry,
}

impl Anime {
    /// A bare record, enough to add or delete by id
    pub fn new(id: u32, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_entry(self, entry: AnimeEntry) -> Self {
        Self { entry, ..self }
    }
}

/// Manga record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manga {
    pub id: u32,
    pub title: String,
    pub synonyms: Vec<String>,
    pub chapters: u32,
    pub volumes: u32,
    pub average: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub synopsis: String,
    pub image: Option<String>,
    /// Publishing status as reported by the service
    pub status: String,
    /// Manga, Novel, One-shot, ...
    pub media_type: String,
    pub entry: MangaEntry,
}

impl Manga {
    pub fn new(id: u32, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_entry(self, entry: MangaEntry) -> Self {
        Self { entry, ..self }
    }
}

/// A record of either kind, for callers that pick the kind at runtime
#[derive(Debug, Clone, PartialEq)]
pub enum Media {
    Anime(Anime),
    Manga(Manga),
}

impl Media {
    pub fn kind(&self) -> MediaKind {
        match self {
            Media::Anime(_) => MediaKind::Anime,
            Media::Manga(_) => MediaKind::Manga,
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            Media::Anime(anime) => anime.id,
            Media::Manga(manga) => manga.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Media::Anime(anime) => &anime.title,
            Media::Manga(manga) => &manga.title,
        }
    }
}

impl From<Anime> for Media {
    fn from(anime: Anime) -> Self {
        Media::Anime(anime)
    }
}

impl From<Manga> for Media {
    fn from(manga: Manga) -> Self {
        Media::Manga(manga)
    }
}

/// One half of a user's profile: the list plus the `myinfo` counters
#[derive(Debug, Clone, PartialEq)]
pub struct ListSummary<T> {
    pub entries: Vec<T>,
    pub completed: u32,
    pub on_hold: u32,
    pub dropped: u32,
    pub planned: u32,
    /// Watching (anime) or reading (manga)
    pub watching: u32,
    pub days_spent: f64,
}

impl<T> Default for ListSummary<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            completed: 0,
            on_hold: 0,
            dropped: 0,
            planned: 0,
            watching: 0,
            days_spent: 0.0,
        }
    }
}

/// A user's profile with both lists
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub anime: ListSummary<Anime>,
    pub manga: ListSummary<Manga>,
}
