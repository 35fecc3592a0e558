//! TuneIn directory adapter (OPML listing pages).
//!
//! Category ids are OPML page URLs. TuneIn pages also contain *inline*
//! outline groups (a URL-less `<outline>` wrapping its children); those get
//! synthetic ids of the form `page_url#Group Text` so the lazy tree can
//! address them; listing such an id refetches the page and descends into
//! the named group.

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::{DirectoryError, Result};
use crate::node::{Node, SourceId};
use crate::source::{fetch_text, DirectorySource};

pub struct TuneIn {
    client: reqwest::Client,
    base_url: String,
}

impl TuneIn {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl DirectorySource for TuneIn {
    fn id(&self) -> SourceId {
        SourceId::TuneIn
    }

    fn display_name(&self) -> &'static str {
        "TuneIn"
    }

    fn root_category(&self) -> String {
        self.base_url.clone()
    }

    async fn list_category(&self, category_id: &str) -> Result<Vec<Node>> {
        let (page_url, group) = split_category_id(category_id);
        let body = fetch_text(&self.client, page_url).await?;
        let outlines =
            parse_opml(&body).map_err(|reason| DirectoryError::parse(category_id, reason))?;

        let selected: &[RawOutline] = match group {
            Some(name) => {
                let group = find_group(&outlines, name).ok_or_else(|| {
                    DirectoryError::parse(
                        category_id,
                        format!("outline group {name:?} not present on page"),
                    )
                })?;
                &group.children
            }
            None => &outlines,
        };

        Ok(outlines_to_nodes(selected, page_url, category_id))
    }
}

/// `page_url` or `page_url#Group Text`.
fn split_category_id(category_id: &str) -> (&str, Option<&str>) {
    match category_id.split_once('#') {
        Some((url, group)) if !group.is_empty() => (url, Some(group)),
        _ => (category_id, None),
    }
}

/// Depth-first search for an inline group by its display text.
fn find_group<'a>(outlines: &'a [RawOutline], name: &str) -> Option<&'a RawOutline> {
    for outline in outlines {
        if outline.url.is_none() && outline.text == name {
            return Some(outline);
        }
        if let Some(found) = find_group(&outline.children, name) {
            return Some(found);
        }
    }
    None
}

fn outlines_to_nodes(outlines: &[RawOutline], page_url: &str, parent_id: &str) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(outlines.len());
    let mut seen = std::collections::HashSet::new();
    for outline in outlines {
        let Some(node) = outline_to_node(outline, page_url, parent_id) else {
            debug!(text = %outline.text, "skipping unrecognised outline");
            continue;
        };
        // Children lists carry no duplicate ids; first occurrence wins.
        if seen.insert(node.id().to_string()) {
            nodes.push(node);
        }
    }
    nodes
}

fn outline_to_node(outline: &RawOutline, page_url: &str, parent_id: &str) -> Option<Node> {
    match (outline.kind.as_deref(), &outline.url) {
        (Some("audio"), Some(url)) => Some(Node::Station {
            source: SourceId::TuneIn,
            id: upgrade_http(url),
            name: outline.text.clone(),
            playlist_url: upgrade_http(url),
            parent: parent_id.to_string(),
            bitrate: outline.bitrate,
            reliability: outline.reliability,
            subtext: outline.subtext.clone(),
        }),
        (Some("link"), Some(url)) | (None, Some(url)) => Some(Node::Category {
            source: SourceId::TuneIn,
            id: upgrade_http(url),
            name: outline.text.clone(),
            parent: parent_id.to_string(),
        }),
        // Inline group ("outline"/"text" or untyped wrapper): synthesise an
        // addressable id from the page it lives on.
        (Some("outline"), None) | (Some("text"), None) | (None, None) => Some(Node::Category {
            source: SourceId::TuneIn,
            id: format!("{}#{}", page_url, outline.text),
            name: outline.text.clone(),
            parent: parent_id.to_string(),
        }),
        _ => None,
    }
}

/// TuneIn still hands out plain-http URLs; the streams answer on https.
fn upgrade_http(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

// ── OPML parsing ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
struct RawOutline {
    text: String,
    kind: Option<String>,
    url: Option<String>,
    bitrate: Option<u32>,
    reliability: Option<u32>,
    subtext: String,
    children: Vec<RawOutline>,
}

impl RawOutline {
    fn from_attrs(e: &BytesStart) -> std::result::Result<Self, String> {
        let mut outline = Self::default();
        let mut current_track = None;
        for attr in e.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let value = attr
                .unescape_value()
                .map_err(|e| e.to_string())?
                .into_owned();
            match attr.key.as_ref() {
                b"text" => outline.text = value,
                b"type" => outline.kind = Some(value),
                b"URL" => outline.url = Some(value),
                b"bitrate" => outline.bitrate = value.parse().ok(),
                b"reliability" => outline.reliability = value.parse().ok(),
                b"subtext" => outline.subtext = value,
                b"current_track" => current_track = Some(value),
                _ => {}
            }
        }
        // The currently playing track is the more informative subtitle.
        if let Some(track) = current_track {
            outline.subtext = track;
        }
        Ok(outline)
    }
}

/// Parse the `<outline>` forest under `/opml/body`. Returns a plain error
/// string; the adapter attaches the offending category id.
fn parse_opml(xml: &str) -> std::result::Result<Vec<RawOutline>, String> {
    let mut reader = Reader::from_str(xml);
    let mut saw_opml = false;
    let mut in_body = false;
    let mut stack: Vec<RawOutline> = Vec::new();
    let mut top: Vec<RawOutline> = Vec::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => match e.name().as_ref() {
                b"opml" => saw_opml = true,
                b"body" if saw_opml => in_body = true,
                b"outline" if in_body => stack.push(RawOutline::from_attrs(&e)?),
                _ => {}
            },
            Event::Empty(e) => {
                if in_body && e.name().as_ref() == b"outline" {
                    let outline = RawOutline::from_attrs(&e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(outline),
                        None => top.push(outline),
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"body" => in_body = false,
                b"outline" if in_body => {
                    let outline = stack.pop().ok_or("mismatched </outline>")?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(outline),
                        None => top.push(outline),
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_opml {
        return Err("not an OPML document".to_string());
    }
    if !stack.is_empty() {
        return Err("unterminated <outline> element".to_string());
    }
    Ok(top)
}
