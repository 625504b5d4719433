//! Repository statistics rendered into the root index.

use crate::model::{TopicDocument, DATE_FORMAT};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Label used for entries in documents at the topic root.
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Label used for entries without `**Added by:**`.
pub const UNKNOWN_CONTRIBUTOR: &str = "Unknown";

/// List sizes for the statistics section.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatsOptions {
    /// Number of topics listed under "Top Topics".
    pub top_topics: usize,
    /// Number of contributors listed under "Top Contributors".
    pub top_contributors: usize,
    /// Number of tags listed under "Popular Tags".
    pub top_tags: usize,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            top_topics: 5,
            top_contributors: 5,
            top_tags: 10,
        }
    }
}

/// Aggregate counts over every scanned entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    /// Number of entries across all documents.
    pub total_articles: usize,
    /// Most recent well-formed `**Added on:**` date.
    pub last_updated: Option<NaiveDate>,
    /// `(topic, entries)` sorted by count descending, then name.
    pub topics: Vec<(String, usize)>,
    /// `(contributor, entries)` sorted by count descending, then name.
    pub contributors: Vec<(String, usize)>,
    /// `(tag, occurrences)` sorted by count descending, then name.
    pub tags: Vec<(String, usize)>,
}

/// Count entries by topic, contributor, and tag.
pub fn collect_stats(documents: &[TopicDocument], options: &StatsOptions) -> CatalogStats {
    let mut topics: BTreeMap<String, usize> = BTreeMap::new();
    let mut contributors: BTreeMap<String, usize> = BTreeMap::new();
    let mut tags: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0usize;
    let mut last_updated: Option<NaiveDate> = None;

    for document in documents {
        let topic = document
            .location
            .topic
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        for entry in &document.entries {
            total += 1;
            *topics.entry(topic.clone()).or_default() += 1;

            let contributor = entry
                .added_by
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(UNKNOWN_CONTRIBUTOR);
            *contributors.entry(contributor.to_string()).or_default() += 1;

            for tag in &entry.tags {
                *tags.entry(tag.clone()).or_default() += 1;
            }

            if let Some(date) = entry.added_date().date() {
                last_updated = Some(last_updated.map_or(date, |current| current.max(date)));
            }
        }
    }

    CatalogStats {
        total_articles: total,
        last_updated,
        topics: top_counts(topics, options.top_topics),
        contributors: top_counts(contributors, options.top_contributors),
        tags: top_counts(tags, options.top_tags),
    }
}

fn top_counts(counts: BTreeMap<String, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(limit);
    sorted
}

/// Body of the `## Statistics` section (without the marker line).
pub fn render_statistics(stats: &CatalogStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("- **Total Articles:** {}\n", stats.total_articles));
    let last_updated = stats
        .last_updated
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "N/A".to_string());
    out.push_str(&format!("- **Last Updated:** {last_updated}\n"));

    push_ranking(&mut out, "Top Topics", &stats.topics, |name, count| {
        format!("- {name}: {count} {}", plural(count, "article", "articles"))
    });
    push_ranking(
        &mut out,
        "Top Contributors",
        &stats.contributors,
        |name, count| format!("- {name}: {count} {}", plural(count, "article", "articles")),
    );
    push_ranking(&mut out, "Popular Tags", &stats.tags, |name, count| {
        format!(
            "- #{name}: {count} {}",
            plural(count, "occurrence", "occurrences")
        )
    });

    out.trim_end().to_string()
}

fn push_ranking<F>(out: &mut String, heading: &str, rows: &[(String, usize)], render: F)
where
    F: Fn(&str, usize) -> String,
{
    out.push_str(&format!("\n### {heading}\n\n"));
    if rows.is_empty() {
        out.push_str("- none\n");
        return;
    }
    for (name, count) in rows {
        out.push_str(&render(name, *count));
        out.push('\n');
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}
