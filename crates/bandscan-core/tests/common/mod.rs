//! Shared fixture source for cache/model integration tests.
#![allow(dead_code)] // each test binary uses a different subset

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bandscan_core::error::{DirectoryError, Result};
use bandscan_core::node::{Node, SourceId};
use bandscan_core::source::DirectorySource;

pub const ROOT: &str = "root";

/// A scriptable in-memory directory service: serves a fixed listing for
/// every category, counts invocations, and can be switched into a failure
/// mode that simulates a network error.
pub struct FixtureSource {
    children: Vec<Node>,
    calls: AtomicUsize,
    fail: AtomicBool,
    delay: Duration,
}

impl FixtureSource {
    pub fn with_categories(names: &[&str]) -> Self {
        let children = names
            .iter()
            .map(|name| Node::Category {
                source: SourceId::TuneIn,
                id: format!("cat:{name}"),
                name: (*name).to_string(),
                parent: ROOT.to_string(),
            })
            .collect();
        Self {
            children,
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay: Duration::ZERO,
        }
    }

    /// Adds an artificial fetch latency so concurrent gets overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectorySource for FixtureSource {
    fn id(&self) -> SourceId {
        SourceId::TuneIn
    }

    fn display_name(&self) -> &'static str {
        "Fixture"
    }

    fn root_category(&self) -> String {
        ROOT.to_string()
    }

    async fn list_category(&self, category_id: &str) -> Result<Vec<Node>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DirectoryError::Fetch {
                url: category_id.to_string(),
                reason: "simulated network error".to_string(),
            });
        }
        Ok(self.children.clone())
    }
}
