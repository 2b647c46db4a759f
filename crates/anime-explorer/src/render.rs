//! Rendering collaborators.
//!
//! The controller only talks to [`RenderTarget`]. The view models in this
//! module (cards, page controls, detail fields) hold the presentation rules so
//! any front-end renders the same thing; [`TerminalRenderer`] is the one used
//! by the CLI.

use crate::api::types::{AnimeDetails, AnimeEntry, Aired};
use crate::pagination::PaginationInfo;
use chrono::{DateTime, NaiveDate};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

pub const NO_RESULTS: &str = "No anime found. Try a different search.";
pub const LIST_FAILED: &str = "Failed to load anime. Please try again later.";
pub const DETAIL_FAILED: &str = "Failed to load anime details. Please try again later.";
pub const DETAIL_NOT_FOUND: &str = "Anime details not found.";

const UNKNOWN: &str = "Unknown";
const NOT_AVAILABLE: &str = "N/A";
const CARD_GENRES: usize = 3;

/// Outcome of a detail lookup, as handed to the renderer
#[derive(Debug, Clone, Copy)]
pub enum DetailView<'a> {
    Found(&'a AnimeDetails),
    NotFound,
    Failed,
}

/// Capabilities a front-end must provide
pub trait RenderTarget: Send + Sync {
    /// Show a page of results; an empty slice means "no results"
    fn render_list(&self, items: &[AnimeEntry], pagination: &PaginationInfo);

    fn render_detail(&self, detail: DetailView<'_>);

    /// Replace the result list with a message and drop the page controls
    fn render_error(&self, message: &str);

    fn set_loading_visible(&self, visible: bool);
}

/// One result card
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub mal_id: u32,
    pub title: String,
    pub image_url: Option<String>,
    pub score: String,
    pub year: String,
    pub kind: String,
    pub genres: Vec<String>,
}

impl From<&AnimeEntry> for CardView {
    fn from(entry: &AnimeEntry) -> Self {
        Self {
            mal_id: entry.mal_id,
            title: entry.title.clone(),
            image_url: entry.image_url().map(str::to_string),
            score: entry
                .score
                .filter(|s| *s > 0.0)
                .map(|s| format!("{:.1}", s))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            year: aired_year(entry.aired.as_ref())
                .map(|y| y.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            kind: or_unknown(entry.anime_type.as_deref()),
            genres: entry
                .genres
                .iter()
                .take(CARD_GENRES)
                .map(|g| g.name.clone())
                .collect(),
        }
    }
}

/// A clickable element of the page selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControl {
    Previous(u32),
    Page { number: u32, active: bool },
    Next(u32),
}

/// Page selector: optional previous button, the page window, optional next
pub fn page_controls(info: &PaginationInfo) -> Vec<PageControl> {
    let current = info.current_page();
    let mut controls = Vec::new();

    if info.has_previous() {
        controls.push(PageControl::Previous(current - 1));
    }
    controls.extend(info.window().map(|number| PageControl::Page {
        number,
        active: number == current,
    }));
    if info.has_next() {
        controls.push(PageControl::Next(current + 1));
    }

    controls
}

/// Labelled fields of the detail view, in display order
pub fn detail_fields(details: &AnimeDetails) -> Vec<(&'static str, String)> {
    let score = match details.score.filter(|s| *s > 0.0) {
        Some(score) => match details.scored_by {
            Some(votes) => format!("{} ({} votes)", score, votes),
            None => score.to_string(),
        },
        None => NOT_AVAILABLE.to_string(),
    };

    let studios = if details.studios.is_empty() {
        UNKNOWN.to_string()
    } else {
        join_names(details.studios.iter().map(|s| s.name.as_str()))
    };

    let genres = if details.genres.is_empty() {
        "No genres listed".to_string()
    } else {
        join_names(details.genres.iter().map(|g| g.name.as_str()))
    };

    vec![
        ("Type", or_unknown(details.anime_type.as_deref())),
        (
            "Episodes",
            details
                .episodes
                .filter(|e| *e > 0)
                .map(|e| e.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        ("Status", or_unknown(details.status.as_deref())),
        ("Aired", format_aired(details.aired.as_ref())),
        ("Duration", or_unknown(details.duration.as_deref())),
        ("Rating", or_unknown(details.rating.as_deref())),
        ("Score", score),
        (
            "Rank",
            details
                .rank
                .map(|r| format!("#{}", r))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ),
        ("Studios", studios),
        ("Genres", genres),
    ]
}

/// Year the anime started airing
pub fn aired_year(aired: Option<&Aired>) -> Option<i32> {
    use chrono::Datelike;

    aired
        .and_then(|a| a.from.as_deref())
        .and_then(parse_date)
        .map(|d| d.year())
}

/// "start to end", with "Present" for an open end
pub fn format_aired(aired: Option<&Aired>) -> String {
    let Some(aired) = aired else {
        return UNKNOWN.to_string();
    };
    let Some(from) = aired.from.as_deref().and_then(parse_date) else {
        return UNKNOWN.to_string();
    };

    let to = aired
        .to
        .as_deref()
        .and_then(parse_date)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Present".to_string());

    format!("{} to {}", from.format("%Y-%m-%d"), to)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            raw.get(..10)
                .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        })
}

fn or_unknown(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Plain-text renderer writing to any `Write` (stdout in the CLI)
pub struct TerminalRenderer<W> {
    out: Mutex<W>,
    loading: AtomicBool,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            loading: AtomicBool::new(false),
        }
    }

    /// Give back the writer
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            warn!(error = %e, "Failed to write output");
        }
    }
}

fn format_card(card: &CardView) -> String {
    let mut text = format!(
        "[{}] {}\n    ★ {} · {} · {}\n",
        card.mal_id, card.title, card.score, card.year, card.kind
    );
    if !card.genres.is_empty() {
        text.push_str(&format!("    {}\n", card.genres.join(" | ")));
    }
    text
}

fn format_controls(controls: &[PageControl]) -> String {
    let parts: Vec<String> = controls
        .iter()
        .map(|control| match control {
            PageControl::Previous(_) => "← Prev".to_string(),
            PageControl::Page { number, active: true } => format!("[{}]", number),
            PageControl::Page { number, .. } => number.to_string(),
            PageControl::Next(_) => "Next →".to_string(),
        })
        .collect();
    parts.join("  ")
}

impl<W: Write + Send> RenderTarget for TerminalRenderer<W> {
    fn render_list(&self, items: &[AnimeEntry], pagination: &PaginationInfo) {
        let mut text = String::new();

        if items.is_empty() {
            text.push_str(NO_RESULTS);
            text.push('\n');
        } else {
            for entry in items {
                text.push_str(&format_card(&CardView::from(entry)));
            }
        }

        text.push_str(&format!(
            "\nPage {} of {}    {}\n",
            pagination.current_page(),
            pagination.last_page(),
            format_controls(&page_controls(pagination))
        ));
        self.emit(&text);
    }

    fn render_detail(&self, detail: DetailView<'_>) {
        let details = match detail {
            DetailView::Found(details) => details,
            DetailView::NotFound => return self.emit(&format!("{}\n", DETAIL_NOT_FOUND)),
            DetailView::Failed => return self.emit(&format!("{}\n", DETAIL_FAILED)),
        };

        let mut text = format!("{}\n", details.title);
        if let Some(image) = details.large_image_url() {
            text.push_str(&format!("{}\n", image));
        }
        text.push('\n');
        for (label, value) in detail_fields(details) {
            text.push_str(&format!("{:<10}{}\n", format!("{}:", label), value));
        }

        text.push_str("\nSynopsis\n");
        text.push_str(details.synopsis.as_deref().unwrap_or("No synopsis available."));
        text.push('\n');

        if let Some(background) = details.background.as_deref().filter(|b| !b.is_empty()) {
            text.push_str("\nBackground\n");
            text.push_str(background);
            text.push('\n');
        }

        self.emit(&text);
    }

    fn render_error(&self, message: &str) {
        self.emit(&format!("{}\n", message));
    }

    fn set_loading_visible(&self, visible: bool) {
        let was_visible = self.loading.swap(visible, Ordering::Relaxed);
        if visible && !was_visible {
            self.emit("Loading...\n");
        }
    }
}
