//! Entry template validation.
//!
//! Hard violations fail a proposed change; soft violations are reported only. The validator is
//! read-only and never errors on malformed content.

use crate::model::{parse_date, AddedDate, ArticleEntry, TopicDocument};
use serde::Serialize;
use std::fmt;

/// Whether a violation fails the run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fails the run.
    Hard,
    /// Reported, does not fail.
    Soft,
}

impl Severity {
    /// Lowercase label used in console output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hard => "hard",
            Self::Soft => "soft",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable violation identifiers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ViolationCode {
    /// Heading text is empty.
    MissingTitle,
    /// Heading carries no link.
    MissingUrl,
    /// Link is not an absolute http(s) URI.
    MalformedUrl,
    /// No `**Summary:**` label.
    MissingSummary,
    /// `**Summary:**` label without text.
    EmptySummary,
    /// No key insight items.
    MissingKeyInsights,
    /// No `**Tags:**` line or no `#` tokens on it.
    MissingTags,
    /// No author.
    MissingAuthor,
    /// No contributor.
    MissingAddedBy,
    /// No `**Added on:**` date.
    MissingAddedOn,
    /// `**Added on:**` is not `YYYY-MM-DD`.
    MalformedAddedOn,
    /// `**Date:**` is not `YYYY-MM-DD`.
    MalformedDate,
    /// Tags line holds tokens other than `#name`.
    MalformedTags,
    /// A code fence in the entry is never closed.
    MalformedFence,
    /// Entry is newer than the entry above it.
    OrderAddedOn,
    /// Topic document has no entries.
    EmptyDocument,
}

impl ViolationCode {
    /// `kind:field` identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingTitle => "missing:title",
            Self::MissingUrl => "missing:url",
            Self::MalformedUrl => "malformed:url",
            Self::MissingSummary => "missing:summary",
            Self::EmptySummary => "empty:summary",
            Self::MissingKeyInsights => "missing:key_insights",
            Self::MissingTags => "missing:tags",
            Self::MissingAuthor => "missing:author",
            Self::MissingAddedBy => "missing:added_by",
            Self::MissingAddedOn => "missing:added_on",
            Self::MalformedAddedOn => "malformed:added_on",
            Self::MalformedDate => "malformed:date",
            Self::MalformedTags => "malformed:tags",
            Self::MalformedFence => "malformed:fence",
            Self::OrderAddedOn => "order:added_on",
            Self::EmptyDocument => "empty:document",
        }
    }

    /// Severity attached to this code.
    pub fn severity(self) -> Severity {
        match self {
            Self::MissingTitle
            | Self::MissingUrl
            | Self::MalformedUrl
            | Self::MissingSummary
            | Self::EmptySummary
            | Self::MissingKeyInsights
            | Self::MissingTags => Severity::Hard,
            Self::MissingAuthor
            | Self::MissingAddedBy
            | Self::MissingAddedOn
            | Self::MalformedAddedOn
            | Self::MalformedDate
            | Self::MalformedTags
            | Self::MalformedFence
            | Self::OrderAddedOn
            | Self::EmptyDocument => Severity::Soft,
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ViolationCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One rule failure.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Violation {
    /// Violated rule.
    pub code: ViolationCode,
    /// Severity of `code`.
    pub severity: Severity,
    /// Posix path of the document.
    pub path: String,
    /// 1-based line (entry heading, or 1 for document-level findings).
    pub line: usize,
    /// Title of the offending entry, if any.
    pub title: Option<String>,
    /// Human-readable detail.
    pub message: String,
}

impl Violation {
    fn new(
        code: ViolationCode,
        path: &str,
        line: usize,
        title: Option<&str>,
        message: String,
    ) -> Self {
        Self {
            code,
            severity: code.severity(),
            path: path.to_string(),
            line,
            title: title.map(str::to_string),
            message,
        }
    }

    fn for_entry(
        code: ViolationCode,
        path: &str,
        entry: &ArticleEntry,
        message: impl Into<String>,
    ) -> Self {
        let title = Some(entry.title.as_str()).filter(|t| !t.trim().is_empty());
        Self::new(code, path, entry.line, title, message.into())
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}:{} - {}: {}",
            self.severity, self.path, self.line, self.code, self.message
        )
    }
}

/// Violations found in one document.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FileReport {
    /// Posix path of the document.
    pub path: String,
    /// Number of entries checked.
    pub entries: usize,
    /// Findings sorted by line then code.
    pub violations: Vec<Violation>,
}

impl FileReport {
    /// Whether the document has no hard violations.
    pub fn passed(&self) -> bool {
        self.violations
            .iter()
            .all(|v| v.severity != Severity::Hard)
    }
}

/// Result of validating a set of documents.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ValidationReport {
    /// One report per document, sorted by path.
    pub files: Vec<FileReport>,
}

impl ValidationReport {
    /// Validate every document.
    pub fn from_documents<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a TopicDocument>,
    {
        let mut files: Vec<FileReport> = documents.into_iter().map(validate_document).collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self { files }
    }

    /// Overall verdict: no hard violation anywhere.
    pub fn passed(&self) -> bool {
        self.files.iter().all(FileReport::passed)
    }

    /// All findings, sorted by path, line, code.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.files.iter().flat_map(|file| file.violations.iter())
    }

    /// Number of hard violations.
    pub fn hard_count(&self) -> usize {
        self.count(Severity::Hard)
    }

    /// Number of soft violations.
    pub fn soft_count(&self) -> usize {
        self.count(Severity::Soft)
    }

    fn count(&self, severity: Severity) -> usize {
        self.violations().filter(|v| v.severity == severity).count()
    }

    /// Verdict and counts alongside per-file findings.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "passed": self.passed(),
            "hard": self.hard_count(),
            "soft": self.soft_count(),
            "files": self.files,
        })
    }

    /// Pretty-printed [`to_json_value`](Self::to_json_value).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_json_value())
    }
}

/// Check one entry against the template.
pub fn validate_entry(path: &str, entry: &ArticleEntry) -> Vec<Violation> {
    let mut out = Vec::new();
    let mut push = |code: ViolationCode, message: String| {
        out.push(Violation::for_entry(code, path, entry, message));
    };

    if entry.title.trim().is_empty() {
        push(ViolationCode::MissingTitle, "entry heading has no title text".into());
    }

    match entry.url.as_deref().map(str::trim) {
        None | Some("") => push(
            ViolationCode::MissingUrl,
            "entry heading must be a `### [Title](URL)` link".into(),
        ),
        Some(url) if !is_well_formed_url(url) => push(
            ViolationCode::MalformedUrl,
            format!("`{url}` is not an absolute http(s) URL"),
        ),
        Some(_) => {}
    }

    match entry.summary.as_deref() {
        None => push(ViolationCode::MissingSummary, "no `**Summary:**` section".into()),
        Some(text) if text.trim().is_empty() => {
            push(ViolationCode::EmptySummary, "`**Summary:**` has no text".into())
        }
        Some(_) => {}
    }

    if entry.key_insights.is_empty() {
        push(
            ViolationCode::MissingKeyInsights,
            "`**Key Insights:**` needs at least one bullet".into(),
        );
    }

    match entry.tags_line.as_deref() {
        None => push(ViolationCode::MissingTags, "no `**Tags:**` line".into()),
        Some(line) => {
            if entry.tags.is_empty() {
                push(ViolationCode::MissingTags, "`**Tags:**` has no `#tag` tokens".into());
            }
            let bad: Vec<&str> = line
                .split_whitespace()
                .filter(|token| !is_tag_token(token))
                .collect();
            if !bad.is_empty() {
                push(
                    ViolationCode::MalformedTags,
                    format!("unexpected tag tokens: {}", bad.join(" ")),
                );
            }
        }
    }

    if entry.unclosed_fence {
        push(
            ViolationCode::MalformedFence,
            "code fence is never closed; headings after it are read as code".into(),
        );
    }

    if is_blank(entry.author.as_deref()) {
        push(ViolationCode::MissingAuthor, "no `**Author:**`".into());
    }
    if is_blank(entry.added_by.as_deref()) {
        push(ViolationCode::MissingAddedBy, "no `**Added by:**`".into());
    }

    match entry.added_date() {
        AddedDate::Missing => push(
            ViolationCode::MissingAddedOn,
            "no `**Added on:**` date".into(),
        ),
        AddedDate::Unparsed(raw) => push(
            ViolationCode::MalformedAddedOn,
            format!("`{raw}` is not a YYYY-MM-DD date"),
        ),
        AddedDate::Parsed(_) => {}
    }

    if let Some(raw) = entry.publication_date.as_deref().map(str::trim) {
        if !raw.is_empty() && parse_date(raw).is_none() {
            push(
                ViolationCode::MalformedDate,
                format!("`{raw}` is not a YYYY-MM-DD date"),
            );
        }
    }

    out
}

/// Check every entry of a document plus document-level rules.
pub fn validate_document(document: &TopicDocument) -> FileReport {
    let path = document.rel_path.as_str();
    let mut violations = Vec::new();

    if document.entries.is_empty() {
        violations.push(Violation::new(
            ViolationCode::EmptyDocument,
            path,
            1,
            None,
            "topic document has no `###` entries".into(),
        ));
    }

    let mut previous = None;
    for entry in &document.entries {
        violations.extend(validate_entry(path, entry));
        let added = entry.added_date().date();
        if let (Some(before), Some(current)) = (previous, added) {
            if current > before {
                violations.push(Violation::for_entry(
                    ViolationCode::OrderAddedOn,
                    path,
                    entry,
                    format!(
                        "added {current} but listed below an entry added {before}; \
                         newest entries go first"
                    ),
                ));
            }
        }
        if added.is_some() {
            previous = added;
        }
    }

    violations.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.code.cmp(&b.code)));
    FileReport {
        path: path.to_string(),
        entries: document.entries.len(),
        violations,
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// `#` followed by one or more ASCII letters, digits, `_` or `-`.
fn is_tag_token(token: &str) -> bool {
    token.strip_prefix('#').is_some_and(|name| {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    })
}

/// Absolute `http`/`https` URL with a non-empty host and no whitespace.
pub fn is_well_formed_url(url: &str) -> bool {
    if url.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return false;
    }
    let authority = rest
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    !host.is_empty()
}
