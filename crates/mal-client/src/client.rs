//! Blocking client for the MyAnimeList XML API.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use shared::{Config, MalConfig};
use tracing::{debug, info, warn};

use crate::error::{MalError, Result};
use crate::models::{Anime, Manga, Media, MediaKind, User};
use crate::parse::{parse_anime_list, parse_manga_list, parse_search_results, ListItem};

/// Mutations on a user's list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListAction {
    Add,
    Update,
    Delete,
}

impl ListAction {
    fn as_str(&self) -> &'static str {
        match self {
            ListAction::Add => "add",
            ListAction::Update => "update",
            ListAction::Delete => "delete",
        }
    }

    fn success_status(&self) -> StatusCode {
        match self {
            ListAction::Add => StatusCode::CREATED,
            ListAction::Update | ListAction::Delete => StatusCode::OK,
        }
    }
}

/// MyAnimeList XML API client
///
/// Construction verifies the credentials, so a client value always holds a
/// login the service accepted.
pub struct MalClient {
    /// HTTP client (carries the User-Agent header)
    http: Client,
    /// Endpoint URLs
    config: MalConfig,
    username: String,
    password: String,
}

impl std::fmt::Debug for MalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MalClient")
            .field("api_url", &self.config.api_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl MalClient {
    /// Create a client against the public service and verify the credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::with_config(&MalConfig::default(), username, password)
    }

    /// Create a client using the `[mal]` section of a loaded configuration
    pub fn from_config(
        config: &Config,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        Self::with_config(&config.mal, username, password)
    }

    /// Create a client with explicit endpoint settings and verify the credentials
    pub fn with_config(
        config: &MalConfig,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        let client = Self {
            http,
            config: config.clone(),
            username: username.into(),
            password: password.into(),
        };
        client.verify_credentials()?;

        Ok(client)
    }

    /// Name of the verified account
    pub fn username(&self) -> &str {
        &self.username
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }

    fn verify_credentials(&self) -> Result<()> {
        let url = self.config.endpoint("account/verify_credentials.xml");
        debug!(url = %url, username = %self.username, "Verifying credentials");

        let resp = self.authed(self.http.get(&url)).send()?;
        if resp.status() != StatusCode::OK {
            warn!(
                status = resp.status().as_u16(),
                username = %self.username,
                "Credential verification failed"
            );
            return Err(MalError::Authentication);
        }

        info!(username = %self.username, "Credentials verified");
        Ok(())
    }

    /// Pass the response through if it has the expected status, otherwise
    /// turn it into a server error carrying the body.
    fn expect_status(resp: Response, expected: StatusCode) -> Result<Response> {
        if resp.status() == expected {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let body = resp.text()?;
        warn!(status, expected = expected.as_u16(), body = %body, "MAL API error");
        Err(MalError::Server { status, body })
    }

    fn search<T: ListItem>(&self, term: &str) -> Result<Vec<T>> {
        let url = self.config.endpoint(&format!("{}/search.xml", T::KIND));
        debug!(url = %url, term = term, "Searching catalog");

        let resp = self
            .authed(self.http.get(&url))
            .query(&[("q", term)])
            .send()?;

        // The service answers 204 when nothing matches
        if resp.status() != StatusCode::OK {
            debug!(status = resp.status().as_u16(), term = term, "Search returned no results");
            return Ok(Vec::new());
        }

        let body = resp.text()?;
        let results = parse_search_results(&body)?;
        debug!(kind = %T::KIND, term = term, count = results.len(), "Search complete");
        Ok(results)
    }

    /// POST an add/update/delete for `item`. The `<entry>` document travels
    /// as the `data` query parameter; deletes carry no document.
    fn modify_list<T: ListItem>(&self, action: ListAction, item: &T) -> Result<()> {
        let url = self.config.endpoint(&format!(
            "{}/{}/{}.xml",
            T::KIND.list_path(),
            action.as_str(),
            item.id()
        ));
        debug!(url = %url, action = action.as_str(), "Sending list request");

        let mut request = self.authed(self.http.post(&url));
        if action != ListAction::Delete {
            request = request.query(&[("data", item.payload())]);
        }

        let resp = request.send()?;
        Self::expect_status(resp, action.success_status())?;

        info!(
            kind = %T::KIND,
            id = item.id(),
            action = action.as_str(),
            "List updated"
        );
        Ok(())
    }

    /// Search the anime catalog; any non-200 answer yields an empty list
    pub fn search_anime(&self, term: &str) -> Result<Vec<Anime>> {
        self.search(term)
    }

    /// Search the manga catalog; any non-200 answer yields an empty list
    pub fn search_manga(&self, term: &str) -> Result<Vec<Manga>> {
        self.search(term)
    }

    /// Add an anime to the user's list (expects 201 Created)
    pub fn add_anime(&self, anime: &Anime) -> Result<()> {
        self.modify_list(ListAction::Add, anime)
    }

    /// Add a manga to the user's list (expects 201 Created)
    pub fn add_manga(&self, manga: &Manga) -> Result<()> {
        self.modify_list(ListAction::Add, manga)
    }

    /// Update an anime already on the user's list (expects 200 OK)
    pub fn update_anime(&self, anime: &Anime) -> Result<()> {
        self.modify_list(ListAction::Update, anime)
    }

    /// Update a manga already on the user's list (expects 200 OK)
    pub fn update_manga(&self, manga: &Manga) -> Result<()> {
        self.modify_list(ListAction::Update, manga)
    }

    /// Remove an anime from the user's list (expects 200 OK)
    pub fn delete_anime(&self, anime: &Anime) -> Result<()> {
        self.modify_list(ListAction::Delete, anime)
    }

    /// Remove a manga from the user's list (expects 200 OK)
    pub fn delete_manga(&self, manga: &Manga) -> Result<()> {
        self.modify_list(ListAction::Delete, manga)
    }

    fn dispatch(&self, action: ListAction, kind: MediaKind, media: &Media) -> Result<()> {
        match (kind, media) {
            (MediaKind::Anime, Media::Anime(anime)) => self.modify_list(action, anime),
            (MediaKind::Manga, Media::Manga(manga)) => self.modify_list(action, manga),
            _ => Err(MalError::WrongKind {
                expected: kind,
                found: media.kind(),
            }),
        }
    }

    /// Add a record to the `kind` list; a record of the other kind is rejected
    /// before any request is made.
    pub fn add(&self, kind: MediaKind, media: &Media) -> Result<()> {
        self.dispatch(ListAction::Add, kind, media)
    }

    /// Runtime-typed counterpart of `update_anime`/`update_manga`
    pub fn update(&self, kind: MediaKind, media: &Media) -> Result<()> {
        self.dispatch(ListAction::Update, kind, media)
    }

    /// Runtime-typed counterpart of `delete_anime`/`delete_manga`
    pub fn delete(&self, kind: MediaKind, media: &Media) -> Result<()> {
        self.dispatch(ListAction::Delete, kind, media)
    }

    fn fetch_profile(&self, name: &str, kind: MediaKind) -> Result<String> {
        debug!(user = name, kind = %kind, "Fetching profile list");

        let resp = self
            .http
            .get(&self.config.profile_url)
            .query(&[("u", name), ("status", "all"), ("type", kind.as_str())])
            .send()?;

        let resp = Self::expect_status(resp, StatusCode::OK)?;
        Ok(resp.text()?)
    }

    /// Fetch a user's anime and manga lists with their summary counters
    pub fn get_user(&self, name: &str) -> Result<User> {
        let anime = parse_anime_list(&self.fetch_profile(name, MediaKind::Anime)?)?;
        let manga = parse_manga_list(&self.fetch_profile(name, MediaKind::Manga)?)?;

        info!(
            user = name,
            anime = anime.summary.entries.len(),
            manga = manga.summary.entries.len(),
            "Fetched user lists"
        );

        Ok(User {
            id: anime.owner.id,
            name: anime.owner.name,
            anime: anime.summary,
            manga: manga.summary,
        })
    }
}
