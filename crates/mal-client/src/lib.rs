//! Client library for MyAnimeList's XML API.
//!
//! This library verifies a user's credentials, searches the anime and manga
//! catalogs, adds/updates/deletes entries on the user's lists, and fetches a
//! user's full lists with their summary counters. All calls are blocking.
//!
//! ```rust,no_run
//! use mal_client::{AnimeEntry, ListStatus, MalClient};
//!
//! fn main() -> mal_client::Result<()> {
//!     let client = MalClient::new("username", "password")?;
//!
//!     if let Some(anime) = client.search_anime("cowboy bebop")?.into_iter().next() {
//!         let anime = anime.with_entry(AnimeEntry {
//!             status: Some(ListStatus::Planned),
//!             ..Default::default()
//!         });
//!         client.add_anime(&anime)?;
//!     }
//!
//!     let user = client.get_user("username")?;
//!     println!("{} completed {} anime", user.name, user.anime.completed);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod parse;
pub mod payload;
pub mod xml;

pub use client::MalClient;
pub use error::{MalError, Result};
pub use models::{
    Anime, AnimeEntry, ListStatus, ListSummary, Manga, MangaEntry, Media, MediaKind, User,
};
pub use parse::{parse_anime_list, parse_manga_list, parse_search_results, ListItem};
