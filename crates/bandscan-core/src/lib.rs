//! Directory model for browsable internet-radio catalogs.
//!
//! The pipeline, leaf-first:
//!
//! ```text
//!   resolver    playlist pointer URL -> concrete stream URLs
//!   sources     one adapter per remote directory service (TuneIn OPML,
//!               SomaFM channels.json), each normalising its listing
//!               format into uniform `Node`s
//!   cache       persistent on-disk tree cache with per-source staleness
//!               windows; the only place that decides fetch-vs-reuse
//!   model       lazy pull-based tree the front-end navigates
//! ```
//!
//! The front-end (see the `bandscan-tui` crate) only ever talks to
//! [`model::DirectoryModel`] and [`resolver::PlaylistResolver`].

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod node;
pub mod platform;
pub mod resolver;
pub mod source;
pub mod sources;

pub use error::{DirectoryError, Result};
pub use node::{Node, SourceId};
