//! Flattened-tree browser over the directory model.
//!
//! Controls: Up/Down/PgUp/PgDn/Home/End navigate, Enter expands/collapses a
//! category or plays a station, Left collapses (or jumps to the parent),
//! Right expands, `k` stops playback, `f` toggles favourite, `q` quits.
//!
//! The loop is strictly sequential: expanding a node blocks on its fetch
//! with a loading message in the status row. Errors render in place and
//! never end the session.

use bandscan_core::model::DirectoryModel;
use bandscan_core::node::Node;
use bandscan_core::resolver::PlaylistResolver;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem};
use ratatui::{DefaultTerminal, Frame};
use tracing::{error, info};

use crate::favourites::Favourites;
use crate::player::Player;

/// One node of the on-screen tree. `children: None` means never expanded;
/// expanding it asks the model (which asks the cache).
struct Entry {
    node: Node,
    expanded: bool,
    stale: bool,
    children: Option<Vec<Entry>>,
}

impl Entry {
    fn new(node: Node) -> Self {
        Self {
            node,
            expanded: false,
            stale: false,
            children: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RowKind {
    FavHeader,
    FavStation(usize),
    /// Index path into the entry tree (roots → children → …).
    Tree(Vec<usize>),
}

struct Row {
    kind: RowKind,
    depth: usize,
}

pub struct App {
    model: DirectoryModel,
    resolver: PlaylistResolver,
    player: Player,
    favourites: Favourites,
    rt: tokio::runtime::Handle,
    roots: Vec<Entry>,
    fav_expanded: bool,
    selected: usize,
    top: usize,
    page: usize,
    status: String,
    quit: bool,
}

impl App {
    pub fn new(
        model: DirectoryModel,
        resolver: PlaylistResolver,
        player: Player,
        favourites: Favourites,
        rt: tokio::runtime::Handle,
    ) -> Self {
        let roots = model.roots().into_iter().map(Entry::new).collect();
        Self {
            model,
            resolver,
            player,
            favourites,
            rt,
            roots,
            fav_expanded: false,
            selected: 0,
            top: 0,
            page: 1,
            status: String::new(),
            quit: false,
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> anyhow::Result<()> {
        loop {
            let rows = self.rows();
            self.clamp_selection(rows.len());
            terminal.draw(|f| self.draw(f, &rows))?;

            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    self.handle_key(key, &rows, &mut terminal)?;
                }
                _ => {}
            }

            // Reap a player that exited on its own.
            if !self.player.is_playing() && self.status.starts_with("Playing") {
                self.status.clear();
            }

            if self.quit {
                break;
            }
        }

        self.player.stop();
        self.favourites.save_if_dirty()?;
        Ok(())
    }

    fn handle_key(
        &mut self,
        key: KeyEvent,
        rows: &[Row],
        terminal: &mut DefaultTerminal,
    ) -> anyhow::Result<()> {
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Up => self.move_selection(-1, rows.len()),
            KeyCode::Down => self.move_selection(1, rows.len()),
            KeyCode::PageUp => self.move_selection(-(self.page as isize), rows.len()),
            KeyCode::PageDown => self.move_selection(self.page as isize, rows.len()),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = rows.len().saturating_sub(1),
            KeyCode::Enter => self.activate(rows, terminal)?,
            KeyCode::Right => self.expand_selected(rows, terminal)?,
            KeyCode::Left => self.collapse_or_parent(rows),
            KeyCode::Char('k') => {
                self.player.stop();
                self.status = "Playback stopped".to_string();
            }
            KeyCode::Char('f') => self.toggle_favourite(rows),
            _ => {}
        }
        Ok(())
    }

    // ── tree bookkeeping ──────────────────────────────────────────────────

    fn rows(&self) -> Vec<Row> {
        let mut rows = vec![Row {
            kind: RowKind::FavHeader,
            depth: 0,
        }];
        if self.fav_expanded {
            for i in 0..self.favourites.stations().len() {
                rows.push(Row {
                    kind: RowKind::FavStation(i),
                    depth: 1,
                });
            }
        }
        for (i, entry) in self.roots.iter().enumerate() {
            flatten_into(entry, vec![i], 0, &mut rows);
        }
        rows
    }

    fn entry(&self, path: &[usize]) -> &Entry {
        let mut entry = &self.roots[path[0]];
        for &i in &path[1..] {
            entry = &entry.children.as_ref().expect("row paths follow expansions")[i];
        }
        entry
    }

    fn entry_mut(&mut self, path: &[usize]) -> &mut Entry {
        let mut entry = &mut self.roots[path[0]];
        for &i in &path[1..] {
            entry = &mut entry.children.as_mut().expect("row paths follow expansions")[i];
        }
        entry
    }

    /// The chain of nodes from a root down to `path`, as the model wants it.
    fn node_path(&self, path: &[usize]) -> Vec<Node> {
        let mut nodes = Vec::with_capacity(path.len());
        let mut entry = &self.roots[path[0]];
        nodes.push(entry.node.clone());
        for &i in &path[1..] {
            entry = &entry.children.as_ref().expect("row paths follow expansions")[i];
            nodes.push(entry.node.clone());
        }
        nodes
    }

    fn clamp_selection(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn move_selection(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        let target = self.selected as isize + delta;
        self.selected = target.clamp(0, len as isize - 1) as usize;
    }

    // ── actions ───────────────────────────────────────────────────────────

    fn activate(&mut self, rows: &[Row], terminal: &mut DefaultTerminal) -> anyhow::Result<()> {
        let Some(row) = rows.get(self.selected) else {
            return Ok(());
        };
        match row.kind.clone() {
            RowKind::FavHeader => self.fav_expanded = !self.fav_expanded,
            RowKind::FavStation(i) => {
                if let Some(node) = self.favourites.stations().get(i).cloned() {
                    self.play(&node, terminal)?;
                }
            }
            RowKind::Tree(path) => {
                let entry = self.entry(&path);
                if entry.node.is_station() {
                    let node = entry.node.clone();
                    self.play(&node, terminal)?;
                } else if entry.expanded {
                    self.entry_mut(&path).expanded = false;
                } else if entry.children.is_some() {
                    self.entry_mut(&path).expanded = true;
                } else {
                    self.expand(&path, terminal)?;
                }
            }
        }
        Ok(())
    }

    fn expand_selected(
        &mut self,
        rows: &[Row],
        terminal: &mut DefaultTerminal,
    ) -> anyhow::Result<()> {
        match rows.get(self.selected).map(|r| r.kind.clone()) {
            Some(RowKind::FavHeader) => self.fav_expanded = true,
            Some(RowKind::Tree(path)) => {
                let entry = self.entry(&path);
                if !entry.node.is_station() && !entry.expanded {
                    if entry.children.is_some() {
                        self.entry_mut(&path).expanded = true;
                    } else {
                        self.expand(&path, terminal)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn collapse_or_parent(&mut self, rows: &[Row]) {
        let Some(row) = rows.get(self.selected) else {
            return;
        };
        match row.kind.clone() {
            RowKind::FavHeader => self.fav_expanded = false,
            RowKind::FavStation(_) => self.selected = 0,
            RowKind::Tree(path) => {
                let entry = self.entry(&path);
                if entry.expanded && !entry.node.is_station() {
                    self.entry_mut(&path).expanded = false;
                } else if path.len() > 1 {
                    let parent = RowKind::Tree(path[..path.len() - 1].to_vec());
                    if let Some(idx) = rows.iter().position(|r| r.kind == parent) {
                        self.selected = idx;
                    }
                }
            }
        }
    }

    /// Fetch children for a never-expanded category, blocking with a
    /// loading status. Failures land in the status row.
    fn expand(&mut self, path: &[usize], terminal: &mut DefaultTerminal) -> anyhow::Result<()> {
        let node_path = self.node_path(path);
        let name = node_path
            .last()
            .map(|n| n.name().to_string())
            .unwrap_or_default();
        self.show_status(format!("Loading {name}…"), terminal)?;

        match self.rt.block_on(self.model.children(&node_path)) {
            Ok(listing) => {
                let stale = listing.stale;
                let entry = self.entry_mut(path);
                entry.children = Some(listing.nodes.into_iter().map(Entry::new).collect());
                entry.expanded = true;
                entry.stale = stale;
                self.status = if stale {
                    format!("could not refresh {name}, showing cached copy")
                } else {
                    String::new()
                };
            }
            Err(err) => {
                error!("expanding {name}: {err}");
                self.status = format!("could not load {name}: {err}");
            }
        }
        Ok(())
    }

    fn play(&mut self, node: &Node, terminal: &mut DefaultTerminal) -> anyhow::Result<()> {
        let Some(pointer) = node.playlist_url() else {
            return Ok(());
        };
        let pointer = pointer.to_string();
        let name = node.name().to_string();
        self.show_status(format!("Fetching playlist for {name}…"), terminal)?;

        match self.rt.block_on(self.resolver.resolve(&pointer)) {
            Ok(urls) => match self.player.play(&urls) {
                Ok(url) => {
                    info!(station = %name, stream = %url, "playback started");
                    self.status = format!("Playing {name}");
                }
                Err(err) => self.status = format!("could not start player: {err}"),
            },
            Err(err) => self.status = format!("playback source unavailable: {err}"),
        }
        Ok(())
    }

    fn toggle_favourite(&mut self, rows: &[Row]) {
        match rows.get(self.selected).map(|r| r.kind.clone()) {
            Some(RowKind::FavStation(i)) => self.favourites.remove_at(i),
            Some(RowKind::Tree(path)) => {
                let node = self.entry(&path).node.clone();
                self.favourites.toggle(&node);
            }
            _ => {}
        }
    }

    // ── rendering ─────────────────────────────────────────────────────────

    fn show_status(&mut self, msg: String, terminal: &mut DefaultTerminal) -> anyhow::Result<()> {
        self.status = msg;
        let rows = self.rows();
        terminal.draw(|f| self.draw(f, &rows))?;
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, rows: &[Row]) {
        let [list_area, status_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(f.area());

        self.page = (list_area.height as usize).max(1);
        if self.selected < self.top {
            self.top = self.selected;
        } else if self.selected >= self.top + self.page {
            self.top = self.selected + 1 - self.page;
        }

        let end = rows.len().min(self.top + self.page);
        let items: Vec<ListItem> = rows[self.top..end]
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut line = self.row_line(row);
                if self.top + i == self.selected {
                    line = line.style(Style::default().add_modifier(Modifier::BOLD));
                }
                ListItem::new(line)
            })
            .collect();
        f.render_widget(List::new(items), list_area);

        f.render_widget(
            Line::styled(
                self.status.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            status_area,
        );
    }

    fn row_line(&self, row: &Row) -> Line<'static> {
        let indent = "  ".repeat(row.depth);
        match &row.kind {
            RowKind::FavHeader => {
                let marker = if self.fav_expanded { "-" } else { "+" };
                Line::from(format!("{indent}{marker} Favourites"))
            }
            RowKind::FavStation(i) => match self.favourites.stations().get(*i) {
                Some(node) => station_line(&indent, node),
                None => Line::from(String::new()),
            },
            RowKind::Tree(path) => {
                let entry = self.entry(path);
                match &entry.node {
                    Node::Category { name, .. } => {
                        let marker = if entry.expanded { "-" } else { "+" };
                        let mut spans = vec![Span::from(format!("{indent}{marker} {name}"))];
                        if entry.stale {
                            spans.push(Span::styled(
                                "  (cached copy)",
                                Style::default().add_modifier(Modifier::DIM),
                            ));
                        }
                        Line::from(spans)
                    }
                    node @ Node::Station { .. } => station_line(&indent, node),
                }
            }
        }
    }
}

fn station_line(indent: &str, node: &Node) -> Line<'static> {
    let Node::Station {
        name,
        bitrate,
        reliability,
        subtext,
        ..
    } = node
    else {
        return Line::from(format!("{indent}?"));
    };
    let dim = Style::default().add_modifier(Modifier::DIM);
    let mut spans = vec![Span::from(format!("{indent}  {name}"))];
    if !subtext.is_empty() {
        spans.push(Span::styled(format!("  {subtext}"), dim));
    }
    if let Some(kbps) = bitrate {
        spans.push(Span::styled(format!("  {kbps}k"), dim));
    }
    if let Some(rel) = reliability {
        let bars = "|".repeat((*rel as usize / 20).min(5));
        spans.push(Span::styled(format!("  {bars}"), dim));
    }
    Line::from(spans)
}
