//! Root index regeneration.
//!
//! The updater owns two sections of the root index: the body between `## Recently Added Articles`
//! and the next level-1/2 heading, and the same range after `## Statistics`. Both are fully
//! regenerated on every run; every other byte of the index is copied through unchanged.

use crate::error::{CatalogError, CatalogResult};
use crate::markdown::{parse_markdown_heading_parts, source_lines, FenceTracker};
use crate::model::{AddedDate, ArticleEntry, TopicDocument};
use crate::stats::{collect_stats, render_statistics, StatsOptions};
use chrono::NaiveDate;
use std::ops::Range;

/// Marker line that opens the recent-articles section.
pub const RECENT_ARTICLES_MARKER: &str = "## Recently Added Articles";
/// Marker line that opens the statistics section.
pub const STATISTICS_MARKER: &str = "## Statistics";
/// Number of recent entries listed when nothing else is configured.
pub const DEFAULT_RECENT_COUNT: usize = 5;
/// Line rendered when the catalog has no entries to list.
pub const EMPTY_PLACEHOLDER: &str = "_No articles added yet._";

/// Which entries make it into the recent-articles section.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cutoff {
    /// The `n` most recently added entries.
    Count(usize),
    /// Entries added on or after `since`, optionally capped at `limit`.
    Since {
        /// Earliest added date to include.
        since: NaiveDate,
        /// Optional cap on the number of entries.
        limit: Option<usize>,
    },
}

impl Default for Cutoff {
    fn default() -> Self {
        Self::Count(DEFAULT_RECENT_COUNT)
    }
}

/// Index updater settings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexOptions {
    /// Recent-section selection rule.
    pub cutoff: Cutoff,
    /// Statistics list sizes.
    pub stats: StatsOptions,
    /// Marker line for the recent-articles section.
    pub recent_marker: String,
    /// Marker line for the statistics section.
    pub statistics_marker: String,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            cutoff: Cutoff::default(),
            stats: StatsOptions::default(),
            recent_marker: RECENT_ARTICLES_MARKER.to_string(),
            statistics_marker: STATISTICS_MARKER.to_string(),
        }
    }
}

/// An entry together with the document it came from.
#[derive(Clone, Debug)]
pub struct IndexedEntry<'a> {
    /// Owning document.
    pub document: &'a TopicDocument,
    /// The entry itself.
    pub entry: &'a ArticleEntry,
    /// Zero-based position within the document.
    pub position: usize,
    /// Interpreted `**Added on:**` value.
    pub added: AddedDate,
}

/// Every entry of every document, most recently added first.
///
/// Ties are broken by document path, then by position within the document, both ascending.
pub fn sorted_entries(documents: &[TopicDocument]) -> Vec<IndexedEntry<'_>> {
    let mut all: Vec<IndexedEntry<'_>> = documents
        .iter()
        .flat_map(|document| {
            document
                .entries
                .iter()
                .enumerate()
                .map(move |(position, entry)| IndexedEntry {
                    document,
                    entry,
                    position,
                    added: entry.added_date(),
                })
        })
        .collect();
    all.sort_by(|a, b| {
        b.added
            .recency_cmp(&a.added)
            .then_with(|| a.document.rel_path.cmp(&b.document.rel_path))
            .then_with(|| a.position.cmp(&b.position))
    });
    all
}

/// Apply `cutoff` to the sorted entry list.
pub fn select_recent(documents: &[TopicDocument], cutoff: Cutoff) -> Vec<IndexedEntry<'_>> {
    let sorted = sorted_entries(documents);
    match cutoff {
        Cutoff::Count(n) => sorted.into_iter().take(n).collect(),
        Cutoff::Since { since, limit } => sorted
            .into_iter()
            .filter(|item| item.added.date().is_some_and(|date| date >= since))
            .take(limit.unwrap_or(usize::MAX))
            .collect(),
    }
}

/// Single-line listing for one entry.
pub fn render_entry_line(item: &IndexedEntry<'_>) -> String {
    let title = item.entry.title.trim();
    let link = match item.entry.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => format!("[{title}]({url})"),
        _ => title.to_string(),
    };
    let topic = item
        .document
        .location
        .display_path()
        .unwrap_or_else(|| "uncategorized".to_string());
    format!(
        "- {link} - *{topic}* (added {})",
        item.added.display_text()
    )
}

/// Body of the recent-articles section (without the marker line).
pub fn render_recent_section(items: &[IndexedEntry<'_>]) -> String {
    if items.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }
    items
        .iter()
        .map(render_entry_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result of regenerating the root index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexUpdate {
    /// Full index text after regeneration.
    pub content: String,
    /// Number of entries listed in the recent section.
    pub recent_count: usize,
    /// Number of entries across the catalog.
    pub total_articles: usize,
    /// Whether `content` differs from the input text.
    pub changed: bool,
}

/// Regenerate both owned sections of `index_text`.
///
/// # Errors
///
/// Returns [`CatalogError::MissingSection`] or [`CatalogError::DuplicateSection`] when a marker
/// line is absent or appears more than once outside fenced code.
pub fn update_index(
    index_text: &str,
    documents: &[TopicDocument],
    options: &IndexOptions,
) -> CatalogResult<IndexUpdate> {
    let recent = select_recent(documents, options.cutoff);
    let stats = collect_stats(documents, &options.stats);

    let with_recent = replace_section(
        index_text,
        &options.recent_marker,
        &render_recent_section(&recent),
    )?;
    let content = replace_section(
        &with_recent,
        &options.statistics_marker,
        &render_statistics(&stats),
    )?;

    Ok(IndexUpdate {
        changed: content != index_text,
        content,
        recent_count: recent.len(),
        total_articles: stats.total_articles,
    })
}

/// Replace the body of the section opened by `marker` with `body`.
///
/// The marker line itself and everything outside the section body are preserved byte for byte.
/// The new body is surrounded by one blank line on each side when another heading follows.
pub fn replace_section(text: &str, marker: &str, body: &str) -> CatalogResult<String> {
    let range = section_body_range(text, marker)?;
    let follows_heading = range.end < text.len();
    let mut out = String::with_capacity(text.len() + body.len());
    out.push_str(&text[..range.start]);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(body.trim_end());
    out.push('\n');
    if follows_heading {
        out.push('\n');
    }
    out.push_str(&text[range.end..]);
    Ok(out)
}

/// Byte range of the section body following `marker`.
pub fn section_body_range(text: &str, marker: &str) -> CatalogResult<Range<usize>> {
    let marker = marker.trim_end();
    let lines = source_lines(text);
    let mut fences = FenceTracker::default();
    let mut markers = Vec::new();
    let mut headings = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if fences.consume(line.text) {
            continue;
        }
        if line.text.trim_end() == marker {
            markers.push(idx);
        }
        if matches!(parse_markdown_heading_parts(line.text), Some((level, _)) if level <= 2) {
            headings.push(idx);
        }
    }

    match markers.len() {
        0 => {
            return Err(CatalogError::MissingSection {
                marker: marker.to_string(),
            })
        }
        1 => {}
        count => {
            return Err(CatalogError::DuplicateSection {
                marker: marker.to_string(),
                count,
            })
        }
    }

    let marker_idx = markers[0];
    let start = lines[marker_idx].end;
    let end = headings
        .into_iter()
        .find(|idx| *idx > marker_idx)
        .map(|idx| lines[idx].start)
        .unwrap_or(text.len());
    Ok(start..end)
}
