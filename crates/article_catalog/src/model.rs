//! Article entry data model shared by the scanner, index updater, and validator.

use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::PathBuf;

/// Date format used by the `**Date:**` and `**Added on:**` fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fenced code block attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodeSample {
    /// Notation named after the opening fence, if any.
    pub label: Option<String>,
    /// Block body without the fence lines.
    pub body: String,
}

/// One article summary block inside a topic document.
///
/// The scanner is permissive: every labeled field is optional here and only the validator
/// decides which absences matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleEntry {
    /// Link text of the entry heading (or the whole heading when it carries no link).
    pub title: String,
    /// Link target of the entry heading.
    pub url: Option<String>,
    /// `**Author:**` value.
    pub author: Option<String>,
    /// `**Date:**` value, kept as raw text.
    pub publication_date: Option<String>,
    /// `**Added on:**` value, kept as raw text.
    pub added_on: Option<String>,
    /// `**Added by:**` value.
    pub added_by: Option<String>,
    /// `**Summary:**` paragraph.
    pub summary: Option<String>,
    /// `**Key Insights:**` bullet items in document order.
    pub key_insights: Vec<String>,
    /// First fenced code block of the entry.
    pub code_sample: Option<CodeSample>,
    /// `#`-prefixed tags without the leading `#`, in display order.
    pub tags: Vec<String>,
    /// Raw text following the `**Tags:**` label.
    pub tags_line: Option<String>,
    /// A code fence opened inside the entry is still open at end of text.
    pub unclosed_fence: bool,
    /// 1-based line of the entry heading within its document.
    pub line: usize,
}

impl ArticleEntry {
    /// Interpret the `**Added on:**` field for recency ordering.
    pub fn added_date(&self) -> AddedDate {
        AddedDate::from_field(self.added_on.as_deref())
    }
}

/// Interpreted `**Added on:**` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddedDate {
    /// Well-formed `YYYY-MM-DD` date.
    Parsed(NaiveDate),
    /// Present but not a valid date; the raw text is retained for display.
    Unparsed(String),
    /// No `**Added on:**` line.
    Missing,
}

impl AddedDate {
    /// Interpret an optional raw field value.
    pub fn from_field(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Missing,
            Some(value) => match parse_date(value) {
                Some(date) => Self::Parsed(date),
                None => Self::Unparsed(value.to_string()),
            },
        }
    }

    /// Parsed date, if any.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Parsed(date) => Some(*date),
            Self::Unparsed(_) | Self::Missing => None,
        }
    }

    /// Compare by recency: `Greater` means `self` was added more recently.
    ///
    /// Unparseable and missing dates are least recent and compare equal to each other.
    pub fn recency_cmp(&self, other: &Self) -> Ordering {
        match (self.date(), other.date()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }

    /// Text shown in the generated index.
    pub fn display_text(&self) -> String {
        match self {
            Self::Parsed(date) => date.format(DATE_FORMAT).to_string(),
            Self::Unparsed(raw) => raw.clone(),
            Self::Missing => "unknown".to_string(),
        }
    }
}

/// Parse a strict `YYYY-MM-DD` date.
///
/// `chrono` accepts unpadded month and day numbers, so the shape is checked first.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Topic and subtopic derived from a document's location below the topic root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TopicLocation {
    /// First directory component.
    pub topic: Option<String>,
    /// Remaining directory components joined with `/`.
    pub subtopic: Option<String>,
}

impl TopicLocation {
    /// Derive the location from a posix-style path relative to the topic root.
    pub fn from_relative_path(rel_path: &str) -> Self {
        let mut dirs: Vec<&str> = rel_path.split('/').filter(|p| !p.is_empty()).collect();
        dirs.pop();
        let Some((topic, rest)) = dirs.split_first() else {
            return Self::default();
        };
        let subtopic = if rest.is_empty() {
            None
        } else {
            Some(rest.join("/"))
        };
        Self {
            topic: Some((*topic).to_string()),
            subtopic,
        }
    }

    /// `topic/subtopic`, `topic`, or `None` for documents at the root.
    pub fn display_path(&self) -> Option<String> {
        match (&self.topic, &self.subtopic) {
            (Some(topic), Some(sub)) => Some(format!("{topic}/{sub}")),
            (Some(topic), None) => Some(topic.clone()),
            (None, _) => None,
        }
    }
}

/// A scanned topic document and its entries in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicDocument {
    /// Absolute (or caller-relative) path the document was read from.
    pub path: PathBuf,
    /// Posix path relative to the topic root.
    pub rel_path: String,
    /// Topic/subtopic derived from `rel_path`.
    pub location: TopicLocation,
    /// Parsed entries, in document order.
    pub entries: Vec<ArticleEntry>,
}
