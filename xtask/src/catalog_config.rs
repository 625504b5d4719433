//! Versioned catalog configuration (`tools/catalog/catalog.toml`).

use crate::runtime::config::ConfigLoader;
use crate::runtime::error::{XtaskError, XtaskResult};
use article_catalog::model::parse_date;
use article_catalog::{Cutoff, IndexOptions, ScanOptions, StatsOptions, DEFAULT_RECENT_COUNT};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Workspace-relative location of the catalog config.
pub const CATALOG_CONFIG_PATH: &str = "tools/catalog/catalog.toml";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CatalogConfigFile {
    scan: ScanSection,
    index: IndexSection,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScanSection {
    topic_root: String,
    excluded_files: Vec<String>,
    excluded_dirs: Vec<String>,
}

impl Default for ScanSection {
    fn default() -> Self {
        let defaults = ScanOptions::default();
        Self {
            topic_root: ".".into(),
            excluded_files: defaults.excluded_files,
            excluded_dirs: defaults.excluded_dirs,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct IndexSection {
    path: String,
    recent_count: Option<usize>,
    since: Option<String>,
    top_topics: usize,
    top_contributors: usize,
    top_tags: usize,
}

impl Default for IndexSection {
    fn default() -> Self {
        let stats = StatsOptions::default();
        Self {
            path: "README.md".into(),
            recent_count: None,
            since: None,
            top_topics: stats.top_topics,
            top_contributors: stats.top_contributors,
            top_tags: stats.top_tags,
        }
    }
}

/// Resolved catalog settings with absolute paths.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CatalogSettings {
    /// Directory scanned for topic documents.
    pub topic_root: PathBuf,
    /// Root index regenerated by `cargo xtask index`.
    pub index_path: PathBuf,
    /// Scanner exclusion rules.
    pub scan: ScanOptions,
    /// Configured recent-entry count, if any.
    pub recent_count: Option<usize>,
    /// Configured recency window start, if any.
    pub since: Option<NaiveDate>,
    /// Statistics list sizes.
    pub stats: StatsOptions,
    /// Where the settings came from, for console output.
    pub source: &'static str,
}

impl CatalogSettings {
    /// Index updater options after applying CLI overrides.
    pub fn index_options(&self, count: Option<usize>, since: Option<NaiveDate>) -> IndexOptions {
        IndexOptions {
            cutoff: resolve_cutoff(count.or(self.recent_count), since.or(self.since)),
            stats: self.stats,
            ..IndexOptions::default()
        }
    }
}

/// `Since` when a window start is known (capped by an explicit count), otherwise `Count`.
pub fn resolve_cutoff(count: Option<usize>, since: Option<NaiveDate>) -> Cutoff {
    match since {
        Some(since) => Cutoff::Since {
            since,
            limit: count,
        },
        None => Cutoff::Count(count.unwrap_or(DEFAULT_RECENT_COUNT)),
    }
}

/// Load `tools/catalog/catalog.toml`, falling back to built-in defaults when the file is absent.
pub fn load_catalog_settings(root: &Path) -> XtaskResult<CatalogSettings> {
    let loader = ConfigLoader::<CatalogConfigFile>::new(root, CATALOG_CONFIG_PATH);
    let (file, source) = match loader.load_optional()? {
        Some(file) => (file, CATALOG_CONFIG_PATH),
        None => (CatalogConfigFile::default(), "built-in defaults"),
    };
    resolve_settings(root, file, source)
        .map_err(|err| err.with_operation("load catalog config").with_path(loader.path()))
}

fn resolve_settings(
    root: &Path,
    file: CatalogConfigFile,
    source: &'static str,
) -> XtaskResult<CatalogSettings> {
    if file.index.recent_count == Some(0) {
        return Err(XtaskError::config("`index.recent_count` must be at least 1"));
    }
    let since = file
        .index
        .since
        .as_deref()
        .map(|raw| {
            parse_date(raw.trim()).ok_or_else(|| {
                XtaskError::config(format!(
                    "invalid `index.since` date `{raw}` (expected YYYY-MM-DD)"
                ))
            })
        })
        .transpose()?;

    Ok(CatalogSettings {
        topic_root: resolve_relative(root, &file.scan.topic_root),
        index_path: resolve_relative(root, &file.index.path),
        scan: ScanOptions {
            excluded_files: file.scan.excluded_files,
            excluded_dirs: file.scan.excluded_dirs,
        },
        recent_count: file.index.recent_count,
        since,
        stats: StatsOptions {
            top_topics: file.index.top_topics,
            top_contributors: file.index.top_contributors,
            top_tags: file.index.top_tags,
        },
        source,
    })
}

fn resolve_relative(root: &Path, raw: &str) -> PathBuf {
    let candidate = PathBuf::from(raw);
    if candidate.is_absolute() {
        candidate
    } else if raw.trim().is_empty() || raw == "." {
        root.to_path_buf()
    } else {
        root.join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::error::XtaskErrorCategory;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_test_root() -> PathBuf {
        std::env::temp_dir().join(format!(
            "xtask-catalog-config-test-{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("time")
                .as_nanos()
        ))
    }

    fn write_config(root: &Path, body: &str) {
        let path = root.join(CATALOG_CONFIG_PATH);
        fs::create_dir_all(path.parent().expect("parent")).expect("create config dir");
        fs::write(path, body).expect("write config");
    }

    #[test]
    fn missing_config_uses_defaults() {
        let root = unique_test_root();
        fs::create_dir_all(&root).expect("create root");
        let settings = load_catalog_settings(&root).expect("settings");
        assert_eq!(settings.topic_root, root);
        assert_eq!(settings.index_path, root.join("README.md"));
        assert_eq!(settings.scan, ScanOptions::default());
        assert_eq!(settings.source, "built-in defaults");
        assert_eq!(
            settings.index_options(None, None).cutoff,
            Cutoff::Count(DEFAULT_RECENT_COUNT)
        );
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn config_values_and_cli_overrides_combine() {
        let root = unique_test_root();
        write_config(
            &root,
            "[scan]\ntopic_root = \"topics\"\n\n[index]\nrecent_count = 3\nsince = \"2025-01-01\"\ntop_tags = 4\n",
        );
        let settings = load_catalog_settings(&root).expect("settings");
        assert_eq!(settings.topic_root, root.join("topics"));
        assert_eq!(settings.stats.top_tags, 4);
        assert_eq!(settings.stats.top_topics, 5);

        let since = NaiveDate::from_ymd_opt(2025, 1, 1).expect("date");
        assert_eq!(
            settings.index_options(None, None).cutoff,
            Cutoff::Since {
                since,
                limit: Some(3)
            }
        );
        let later = NaiveDate::from_ymd_opt(2025, 4, 1).expect("date");
        assert_eq!(
            settings.index_options(Some(1), Some(later)).cutoff,
            Cutoff::Since {
                since: later,
                limit: Some(1)
            }
        );
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let root = unique_test_root();
        write_config(&root, "[index]\nsince = \"April\"\n");
        let err = load_catalog_settings(&root).expect_err("bad date");
        assert_eq!(err.category, XtaskErrorCategory::Config);
        assert!(err.to_string().contains("index.since"));

        write_config(&root, "[index]\nrecent_count = 0\n");
        assert!(load_catalog_settings(&root).is_err());

        write_config(&root, "[index]\nrecent = 3\n");
        let err = load_catalog_settings(&root).expect_err("unknown key");
        assert_eq!(err.category, XtaskErrorCategory::Config);
        let _ = fs::remove_dir_all(root);
    }
}
