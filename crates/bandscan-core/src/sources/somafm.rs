//! SomaFM directory adapter (flat `channels.json` listing).
//!
//! SomaFM is one flat list of channels, each tagged with `|`-separated
//! genres. The adapter presents it as a two-level tree: the root category
//! (`genres`) lists one category per genre in first-appearance order, and
//! `genre:<name>` lists that genre's channels as stations. A channel with
//! several genres appears under each of them.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{DirectoryError, Result};
use crate::node::{Node, SourceId};
use crate::source::{fetch_text, DirectorySource};

const ROOT_CATEGORY: &str = "genres";
const GENRE_PREFIX: &str = "genre:";

pub struct SomaFm {
    client: reqwest::Client,
    base_url: String,
}

impl SomaFm {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn channels_url(&self) -> String {
        format!("{}/channels.json", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_channels(&self, category_id: &str) -> Result<Vec<Channel>> {
        let body = fetch_text(&self.client, &self.channels_url()).await?;
        let doc: ChannelsDoc = serde_json::from_str(&body)
            .map_err(|e| DirectoryError::parse(category_id, e.to_string()))?;
        Ok(doc.channels)
    }
}

#[async_trait]
impl DirectorySource for SomaFm {
    fn id(&self) -> SourceId {
        SourceId::SomaFm
    }

    fn display_name(&self) -> &'static str {
        "SomaFM"
    }

    fn root_category(&self) -> String {
        ROOT_CATEGORY.to_string()
    }

    async fn list_category(&self, category_id: &str) -> Result<Vec<Node>> {
        if category_id == ROOT_CATEGORY {
            let channels = self.fetch_channels(category_id).await?;
            return Ok(genre_categories(&channels));
        }
        if let Some(genre) = category_id.strip_prefix(GENRE_PREFIX) {
            let channels = self.fetch_channels(category_id).await?;
            return Ok(genre_stations(&channels, genre, category_id));
        }
        Err(DirectoryError::parse(
            category_id,
            "unknown SomaFM category id",
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ChannelsDoc {
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    playlists: Vec<PlaylistRef>,
}

#[derive(Debug, Deserialize)]
struct PlaylistRef {
    url: String,
}

impl Channel {
    fn genres(&self) -> impl Iterator<Item = &str> {
        self.genre.split('|').filter(|g| !g.is_empty())
    }
}

/// Genres in order of first appearance in the feed.
fn genre_categories(channels: &[Channel]) -> Vec<Node> {
    let mut seen = std::collections::HashSet::new();
    let mut nodes = Vec::new();
    for channel in channels {
        for genre in channel.genres() {
            if seen.insert(genre.to_string()) {
                nodes.push(Node::Category {
                    source: SourceId::SomaFm,
                    id: format!("{GENRE_PREFIX}{genre}"),
                    name: genre.to_string(),
                    parent: ROOT_CATEGORY.to_string(),
                });
            }
        }
    }
    nodes
}

fn genre_stations(channels: &[Channel], genre: &str, parent_id: &str) -> Vec<Node> {
    channels
        .iter()
        .filter(|c| c.genres().any(|g| g == genre))
        .filter_map(|c| {
            // Playlists are listed best-quality first; take the first.
            let playlist = c.playlists.first()?;
            Some(Node::Station {
                source: SourceId::SomaFm,
                id: c.id.clone(),
                name: c.title.clone(),
                playlist_url: playlist.url.clone(),
                parent: parent_id.to_string(),
                bitrate: None,
                reliability: None,
                subtext: c.description.clone(),
            })
        })
        .collect()
}
