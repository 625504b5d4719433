//! Document scanner: walks the topic tree and extracts article entries.
//!
//! Extraction is deliberately permissive. Labels that do not match the template exactly are
//! treated as absent fields; the validator decides what an absence means.

use crate::error::{CatalogError, CatalogResult};
use crate::markdown::{
    first_inline_link, parse_fence_lang, parse_field_label, parse_list_item,
    parse_markdown_heading_parts, source_lines, FenceTracker,
};
use crate::model::{ArticleEntry, CodeSample, TopicDocument, TopicLocation};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// `**Author:**`
pub const LABEL_AUTHOR: &str = "Author";
/// `**Date:**`
pub const LABEL_DATE: &str = "Date";
/// `**Added by:**`
pub const LABEL_ADDED_BY: &str = "Added by";
/// `**Added on:**`
pub const LABEL_ADDED_ON: &str = "Added on";
/// `**Summary:**`
pub const LABEL_SUMMARY: &str = "Summary";
/// `**Key Insights:**`
pub const LABEL_KEY_INSIGHTS: &str = "Key Insights";
/// `**Tags:**`
pub const LABEL_TAGS: &str = "Tags";

const MARKDOWN_SUFFIX: &str = ".md";

/// Which files under the topic root count as topic documents.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanOptions {
    /// Root-relative posix paths that are configuration, not content.
    pub excluded_files: Vec<String>,
    /// Directory names skipped wherever they appear. Hidden directories are always skipped.
    pub excluded_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            excluded_files: vec!["README.md".into(), "CONTRIBUTING.md".into()],
            excluded_dirs: vec![
                "template".into(),
                "target".into(),
                "crates".into(),
                "xtask".into(),
                "tools".into(),
            ],
        }
    }
}

impl ScanOptions {
    /// Whether a root-relative posix path is excluded from scanning and validation.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        if !rel_path.ends_with(MARKDOWN_SUFFIX) {
            return true;
        }
        if self.excluded_files.iter().any(|f| f == rel_path) {
            return true;
        }
        let mut parts: Vec<&str> = rel_path.split('/').filter(|p| !p.is_empty()).collect();
        parts.pop();
        parts.iter().any(|dir| self.is_excluded_dir(dir))
    }

    fn is_excluded_dir(&self, name: &str) -> bool {
        name.starts_with('.') || self.excluded_dirs.iter().any(|d| d == name)
    }
}

/// Scanner over one topic root.
///
/// [`scan`](Self::scan) enumerates matching files eagerly and parses them lazily. Each call starts
/// a fresh pass, so a scanner can be iterated any number of times.
#[derive(Clone, Debug)]
pub struct DocumentScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl DocumentScanner {
    /// Create a scanner rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, options: ScanOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    /// Sorted paths of every topic document below the root.
    pub fn document_paths(&self) -> CatalogResult<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(CatalogError::io(&self.root, "topic root is not a directory"));
        }
        let mut out = Vec::new();
        self.collect_markdown_files(&self.root, &mut out)?;
        Ok(out)
    }

    fn collect_markdown_files(&self, dir: &Path, out: &mut Vec<PathBuf>) -> CatalogResult<()> {
        let mut entries: Vec<_> = fs::read_dir(dir)
            .map_err(|err| CatalogError::io(dir, err))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CatalogError::io(dir, err))?;
        entries.sort_by_key(|e| e.path());

        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                let name = entry.file_name();
                if self.options.is_excluded_dir(&name.to_string_lossy()) {
                    continue;
                }
                self.collect_markdown_files(&path, out)?;
            } else if path.is_file() && !self.options.is_excluded(&rel_posix(&self.root, &path)) {
                out.push(path);
            }
        }

        Ok(())
    }

    /// Start a lazy pass over the tree.
    pub fn scan(&self) -> CatalogResult<ScanIter<'_>> {
        Ok(ScanIter {
            scanner: self,
            paths: self.document_paths()?.into_iter(),
        })
    }

    /// Read and parse all documents, stopping at the first structural failure.
    pub fn scan_all(&self) -> CatalogResult<Vec<TopicDocument>> {
        self.scan()?.collect()
    }

    /// Read and parse a single document.
    pub fn read_document(&self, path: &Path) -> CatalogResult<TopicDocument> {
        let text = fs::read_to_string(path).map_err(|err| CatalogError::io(path, err))?;
        Ok(self.document_from_text(path, &text))
    }

    /// Build a document from already-loaded text.
    pub fn document_from_text(&self, path: &Path, text: &str) -> TopicDocument {
        let rel_path = rel_posix(&self.root, path);
        TopicDocument {
            path: path.to_path_buf(),
            location: TopicLocation::from_relative_path(&rel_path),
            rel_path,
            entries: parse_document(text),
        }
    }
}

/// Lazy sequence of parsed topic documents.
#[derive(Debug)]
pub struct ScanIter<'a> {
    scanner: &'a DocumentScanner,
    paths: std::vec::IntoIter<PathBuf>,
}

impl Iterator for ScanIter<'_> {
    type Item = CatalogResult<TopicDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        Some(self.scanner.read_document(&path))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.paths.size_hint()
    }
}

/// Extract entries from document text.
///
/// An entry starts at a level-3 heading outside fenced code and ends at the next level-1 to 3
/// heading or at end of text.
pub fn parse_document(text: &str) -> Vec<ArticleEntry> {
    let lines = source_lines(text);
    let mut entries = Vec::new();
    let mut current: Option<(usize, &str, Vec<&str>)> = None;
    let mut fences = FenceTracker::default();

    for line in &lines {
        if fences.consume(line.text) {
            if let Some((_, _, body)) = current.as_mut() {
                body.push(line.text);
            }
            continue;
        }
        if let Some((level, heading)) = parse_markdown_heading_parts(line.text) {
            if level <= 3 {
                if let Some((number, open_heading, body)) = current.take() {
                    entries.push(parse_entry(number, open_heading, &body));
                }
                if level == 3 {
                    current = Some((line.number, heading, Vec::new()));
                }
                continue;
            }
        }
        if let Some((_, _, body)) = current.as_mut() {
            body.push(line.text);
        }
    }

    if let Some((number, heading, body)) = current.take() {
        entries.push(parse_entry(number, heading, &body));
    }
    entries
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum OpenSection {
    None,
    Summary,
    KeyInsights,
}

fn parse_entry(line: usize, heading: &str, body: &[&str]) -> ArticleEntry {
    let mut entry = ArticleEntry {
        line,
        ..ArticleEntry::default()
    };
    match first_inline_link(heading) {
        Some((title, url)) => {
            entry.title = title.to_string();
            entry.url = Some(url.to_string());
        }
        None => entry.title = heading.trim().to_string(),
    }

    let mut section = OpenSection::None;
    let mut summary: Option<Vec<&str>> = None;
    let mut fences = FenceTracker::default();
    let mut code: Option<CodeSample> = None;
    let mut capturing_code = false;

    for raw in body {
        let was_open = fences.is_open();
        if fences.consume(raw) {
            section = OpenSection::None;
            if !was_open {
                if code.is_none() {
                    let lang = parse_fence_lang(raw).and_then(|f| f.lang);
                    code = Some(CodeSample {
                        label: lang,
                        body: String::new(),
                    });
                    capturing_code = true;
                }
            } else if !fences.is_open() {
                capturing_code = false;
            } else if capturing_code {
                if let Some(sample) = code.as_mut() {
                    if !sample.body.is_empty() {
                        sample.body.push('\n');
                    }
                    sample.body.push_str(raw);
                }
            }
            continue;
        }

        if parse_markdown_heading_parts(raw).is_some() {
            section = OpenSection::None;
            continue;
        }

        if let Some((label, value)) = parse_field_label(raw) {
            section = OpenSection::None;
            match label {
                LABEL_AUTHOR => set_once(&mut entry.author, value),
                LABEL_DATE => set_once(&mut entry.publication_date, value),
                LABEL_ADDED_BY => set_once(&mut entry.added_by, value),
                LABEL_ADDED_ON => set_once(&mut entry.added_on, value),
                LABEL_SUMMARY if summary.is_none() => {
                    summary = Some(vec![value]);
                    section = OpenSection::Summary;
                }
                LABEL_KEY_INSIGHTS if entry.key_insights.is_empty() => {
                    section = OpenSection::KeyInsights;
                }
                LABEL_TAGS if entry.tags_line.is_none() => {
                    entry.tags = parse_tags(value);
                    entry.tags_line = Some(value.to_string());
                }
                _ => {}
            }
            continue;
        }

        match section {
            OpenSection::Summary => {
                if let Some(lines) = summary.as_mut() {
                    lines.push(raw.trim());
                }
            }
            OpenSection::KeyInsights => {
                if let Some(item) = parse_list_item(raw) {
                    if !item.is_empty() {
                        entry.key_insights.push(item.to_string());
                    }
                } else if raw.trim().is_empty() {
                    continue;
                } else if raw.starts_with(char::is_whitespace) {
                    if let Some(last) = entry.key_insights.last_mut() {
                        last.push(' ');
                        last.push_str(raw.trim());
                    }
                } else {
                    section = OpenSection::None;
                }
            }
            OpenSection::None => {}
        }
    }

    entry.unclosed_fence = fences.is_open();
    entry.summary = summary.map(|lines| lines.join("\n").trim().to_string());
    entry.code_sample = code;
    entry
}

fn set_once(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

/// `#`-prefixed tokens of a tags line, without the `#`.
pub fn parse_tags(value: &str) -> Vec<String> {
    value
        .split_whitespace()
        .filter_map(|token| token.strip_prefix('#'))
        .map(|tag| tag.trim_end_matches(','))
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Posix-style path of `path` relative to `root`.
pub fn rel_posix(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::CurDir => None,
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir | Component::Prefix(_) => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{SystemTime, UNIX_EPOCH};

    const FULL_ENTRY: &str = r#"# Distributed Systems

Articles about replication and consensus.

### [Merkle Trees for Anti-Entropy](https://example.com/merkle)

**Author:** Jane Doe
**Date:** 2025-03-30
**Added by:** octocat
**Added on:** 2025-04-17

**Summary:**
Replicas compare hash trees to find divergent ranges
without shipping every key.

**Key Insights:**
- Hash ranges, not keys
- Rebuild cost grows with churn
  under heavy write load

```java
class MerkleNode {
    // ### not a heading
}
```

**Tags:** #distributed-systems #hashing
"#;

    fn unique_temp_root() -> PathBuf {
        std::env::temp_dir().join(format!(
            "article-catalog-scan-test-{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("time")
                .as_nanos()
        ))
    }

    #[test]
    fn parses_every_template_field() {
        let entries = parse_document(FULL_ENTRY);
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.title, "Merkle Trees for Anti-Entropy");
        assert_eq!(entry.url.as_deref(), Some("https://example.com/merkle"));
        assert_eq!(entry.author.as_deref(), Some("Jane Doe"));
        assert_eq!(entry.publication_date.as_deref(), Some("2025-03-30"));
        assert_eq!(entry.added_by.as_deref(), Some("octocat"));
        assert_eq!(entry.added_on.as_deref(), Some("2025-04-17"));
        assert_eq!(
            entry.summary.as_deref(),
            Some("Replicas compare hash trees to find divergent ranges\nwithout shipping every key.")
        );
        assert_eq!(
            entry.key_insights,
            vec![
                "Hash ranges, not keys".to_string(),
                "Rebuild cost grows with churn under heavy write load".to_string(),
            ]
        );
        let sample = entry.code_sample.as_ref().expect("code sample");
        assert_eq!(sample.label.as_deref(), Some("java"));
        assert_eq!(
            sample.body,
            "class MerkleNode {\n    // ### not a heading\n}"
        );
        assert_eq!(entry.tags, vec!["distributed-systems", "hashing"]);
        assert_eq!(entry.line, 5);
    }

    #[test]
    fn document_without_entries_yields_nothing() {
        assert!(parse_document("# Empty topic\n\nNothing here yet.\n").is_empty());
        assert!(parse_document("").is_empty());
    }

    #[test]
    fn unknown_labels_are_ignored_and_close_open_sections() {
        let text = "### [T](https://x.test)\n\
                    **Summary:** first line\n\
                    **Category:** misc\n\
                    dangling text\n";
        let entries = parse_document(text);
        assert_eq!(entries[0].summary.as_deref(), Some("first line"));
        assert_eq!(entries[0].author, None);
    }

    #[test]
    fn misspelled_label_is_treated_as_absent() {
        let text = "### [T](https://x.test)\n**Tag:** #oops\n";
        let entries = parse_document(text);
        assert!(entries[0].tags.is_empty());
        assert_eq!(entries[0].tags_line, None);
    }

    #[test]
    fn heading_without_link_keeps_title_and_drops_url() {
        let entries = parse_document("### Plain heading\n**Summary:** x\n");
        assert_eq!(entries[0].title, "Plain heading");
        assert_eq!(entries[0].url, None);
    }

    #[test]
    fn level_two_heading_ends_an_entry_and_level_four_does_not() {
        let text = "### [A](https://a.test)\n\
                    #### Notes\n\
                    **Tags:** #a\n\
                    ## Other section\n\
                    **Tags:** #ignored\n\
                    ### [B](https://b.test)\n";
        let entries = parse_document(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tags, vec!["a"]);
        assert_eq!(entries[1].title, "B");
        assert!(entries[1].tags.is_empty());
        assert_eq!(entries[1].line, 6);
    }

    #[test]
    fn heading_links_keep_nested_brackets_and_parentheses() {
        let entries = parse_document(
            "### [Raft](https://en.wikipedia.org/wiki/Raft_(algorithm))\n\
             ### [Array[T] in Java](https://example.com/generics)\n",
        );
        assert_eq!(
            entries[0].url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Raft_(algorithm)")
        );
        assert_eq!(entries[1].title, "Array[T] in Java");
        assert_eq!(
            entries[1].url.as_deref(),
            Some("https://example.com/generics")
        );
    }

    #[test]
    fn unclosed_fence_swallows_later_entries_and_is_flagged() {
        let text = "### [A](https://a.test)\n\
                    ```rust\n\
                    fn main() {}\n\
                    ### [B](https://b.test)\n";
        let entries = parse_document(text);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].unclosed_fence);

        let closed = parse_document(FULL_ENTRY);
        assert!(!closed[0].unclosed_fence);
    }

    #[test]
    fn malformed_dates_are_kept_as_raw_text() {
        let entries = parse_document("### [A](https://a.test)\n**Added on:** April 9th\n");
        assert_eq!(entries[0].added_on.as_deref(), Some("April 9th"));
    }

    #[test]
    fn tags_strip_hash_and_trailing_commas() {
        assert_eq!(
            parse_tags("#rust, #async plain #"),
            vec!["rust".to_string(), "async".to_string()]
        );
    }

    #[test]
    fn exclusion_rules_cover_config_documents() {
        let options = ScanOptions::default();
        assert!(options.is_excluded("README.md"));
        assert!(options.is_excluded("CONTRIBUTING.md"));
        assert!(options.is_excluded("template/README.md"));
        assert!(options.is_excluded("compilers/template/entry.md"));
        assert!(options.is_excluded(".github/PULL_REQUEST_TEMPLATE.md"));
        assert!(options.is_excluded("compilers/notes.txt"));
        assert!(!options.is_excluded("compilers/README.md"));
        assert!(!options.is_excluded("compilers/parsing/README.md"));
    }

    #[test]
    fn scan_walks_sorted_tree_and_is_restartable() {
        let root = unique_temp_root();
        fs::create_dir_all(root.join("b-topic/sub")).expect("create dirs");
        fs::create_dir_all(root.join("a-topic")).expect("create dirs");
        fs::create_dir_all(root.join("template")).expect("create dirs");
        fs::write(root.join("README.md"), "# Index\n").expect("write index");
        fs::write(root.join("template/README.md"), FULL_ENTRY).expect("write template");
        fs::write(root.join("a-topic/README.md"), FULL_ENTRY).expect("write a");
        fs::write(root.join("b-topic/sub/README.md"), "# Empty\n").expect("write b");

        let scanner = DocumentScanner::new(root.clone(), ScanOptions::default());
        let first: Vec<_> = scanner
            .scan()
            .expect("scan")
            .map(|doc| doc.expect("document"))
            .collect();
        let rel: Vec<_> = first.iter().map(|d| d.rel_path.as_str()).collect();
        assert_eq!(rel, vec!["a-topic/README.md", "b-topic/sub/README.md"]);
        assert_eq!(first[0].entries.len(), 1);
        assert!(first[1].entries.is_empty());
        assert_eq!(first[1].location.subtopic.as_deref(), Some("sub"));

        let second = scanner.scan_all().expect("rescan");
        assert_eq!(first, second);

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn scan_of_missing_root_is_a_structural_failure() {
        let root = unique_temp_root().join("missing");
        let scanner = DocumentScanner::new(root, ScanOptions::default());
        let err = scanner.scan().expect_err("missing root");
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
