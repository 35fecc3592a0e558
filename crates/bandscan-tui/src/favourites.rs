//! Favourite stations, persisted as JSON under the per-user data dir.

use std::path::PathBuf;

use bandscan_core::node::Node;
use tracing::warn;

pub struct Favourites {
    path: PathBuf,
    stations: Vec<Node>,
    dirty: bool,
}

impl Favourites {
    /// Load favourites; a missing or unreadable file just means none yet.
    pub fn load(path: PathBuf) -> Self {
        let stations = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(stations) => stations,
                Err(err) => {
                    warn!("ignoring unreadable favourites file {path:?}: {err}");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self {
            path,
            stations,
            dirty: false,
        }
    }

    pub fn stations(&self) -> &[Node] {
        &self.stations
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.stations
            .iter()
            .any(|s| s.source() == node.source() && s.id() == node.id())
    }

    /// Add the station, or remove it if already present.
    pub fn toggle(&mut self, node: &Node) {
        if !node.is_station() {
            return;
        }
        self.dirty = true;
        if let Some(pos) = self
            .stations
            .iter()
            .position(|s| s.source() == node.source() && s.id() == node.id())
        {
            self.stations.remove(pos);
        } else {
            self.stations.push(node.clone());
        }
    }

    pub fn remove_at(&mut self, index: usize) {
        if index < self.stations.len() {
            self.stations.remove(index);
            self.dirty = true;
        }
    }

    pub fn save_if_dirty(&mut self) -> anyhow::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.stations)?;
        std::fs::write(&self.path, json)?;
        self.dirty = false;
        Ok(())
    }
}
