//! The lazy, navigable directory tree the front-end pulls from.

use crate::cache::DirectoryCache;
use crate::error::{DirectoryError, Result};
use crate::node::Node;
use crate::source::SourceSet;

/// One expanded level of the tree, plus whether it came from a stale cache
/// entry that could not be refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub nodes: Vec<Node>,
    pub stale: bool,
}

impl Listing {
    fn fresh(nodes: Vec<Node>) -> Self {
        Self { nodes, stale: false }
    }
}

/// Root → categories → stations, backed by the cache and the source
/// adapters. The UI never sees network or cache details; it asks for the
/// children of a path and renders what it gets.
pub struct DirectoryModel {
    sources: SourceSet,
    cache: DirectoryCache,
}

impl DirectoryModel {
    pub fn new(sources: SourceSet, cache: DirectoryCache) -> Self {
        Self { sources, cache }
    }

    /// Synthetic root: one category per enabled source.
    pub fn roots(&self) -> Vec<Node> {
        self.sources
            .iter()
            .map(|source| Node::Category {
                source: source.id(),
                id: source.root_category(),
                name: source.display_name().to_string(),
                parent: String::new(),
            })
            .collect()
    }

    /// Children of the node at `path` (the chain of nodes from the root;
    /// empty for the top level). Navigation must keep working over network
    /// trouble once a listing has been cached, so the cache is asked with
    /// `allow_stale = true`; a cold fetch failure surfaces as an error for
    /// the UI to render in place.
    pub async fn children(&self, path: &[Node]) -> Result<Listing> {
        let Some(node) = path.last() else {
            return Ok(Listing::fresh(self.roots()));
        };

        match node {
            // Stations are leaves.
            Node::Station { .. } => Ok(Listing::fresh(Vec::new())),
            Node::Category { source, id, .. } => {
                let adapter = self
                    .sources
                    .get(*source)
                    .ok_or(DirectoryError::SourceUnavailable(*source))?;
                let (nodes, stale) = self.cache.get(adapter.as_ref(), id, true).await?;
                Ok(Listing { nodes, stale })
            }
        }
    }
}
