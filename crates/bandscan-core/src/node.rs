use serde::{Deserialize, Serialize};

/// The supported remote directory services. Adding a service means adding
/// a variant here plus an adapter under `sources/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    TuneIn,
    SomaFm,
}

impl SourceId {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TuneIn => "tunein",
            Self::SomaFm => "somafm",
        }
    }
}

/// One entry in a directory listing: either an expandable category or a
/// playable station leaf.
///
/// `id` is unique within its source's namespace. `parent` is the category
/// id the node was listed under. Stations carry a *playlist pointer* URL
/// (a small file listing the actual stream URLs) plus optional display
/// metadata as provided by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    Category {
        source: SourceId,
        id: String,
        name: String,
        parent: String,
    },
    Station {
        source: SourceId,
        id: String,
        name: String,
        playlist_url: String,
        parent: String,
        #[serde(default)]
        bitrate: Option<u32>,
        #[serde(default)]
        reliability: Option<u32>,
        #[serde(default)]
        subtext: String,
    },
}

impl Node {
    pub fn source(&self) -> SourceId {
        match self {
            Self::Category { source, .. } | Self::Station { source, .. } => *source,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Category { id, .. } | Self::Station { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Category { name, .. } | Self::Station { name, .. } => name,
        }
    }

    pub fn is_station(&self) -> bool {
        matches!(self, Self::Station { .. })
    }

    pub fn playlist_url(&self) -> Option<&str> {
        match self {
            Self::Station { playlist_url, .. } => Some(playlist_url),
            Self::Category { .. } => None,
        }
    }
}
