use article_catalog::{
    update_index, Cutoff, DocumentScanner, IndexOptions, ScanOptions, ValidationReport,
    ViolationCode,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const ROOT_INDEX: &str = "# Article Summaries\n\
                          \n\
                          Short notes on articles worth re-reading.\n\
                          \n\
                          ## Recently Added Articles\n\
                          \n\
                          _No articles added yet._\n\
                          \n\
                          ## Statistics\n\
                          \n\
                          - **Total Articles:** 0\n\
                          \n\
                          ## How to Contribute\n\
                          \n\
                          Copy `template/README.md` into a topic directory.\n";

fn unique_temp_root(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "article-catalog-{label}-{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos()
    ))
}

fn entry(title: &str, added_on: &str, tags: Option<&str>) -> String {
    let mut text = format!(
        "### [{title}](https://example.com/{slug})\n\
         \n\
         **Author:** A. Writer\n\
         **Date:** 2025-01-15\n\
         **Added by:** reviewer\n\
         **Added on:** {added_on}\n\
         \n\
         **Summary:**\n\
         A short summary of {title}.\n\
         \n\
         **Key Insights:**\n\
         - First insight\n\
         - Second insight\n\
         \n",
        slug = title.to_lowercase().replace(' ', "-"),
    );
    if let Some(tags) = tags {
        text.push_str(&format!("**Tags:** {tags}\n\n"));
    }
    text
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
    fs::write(path, text).expect("write");
}

fn fixture_tree(label: &str) -> PathBuf {
    let root = unique_temp_root(label);
    write(&root, "README.md", ROOT_INDEX);
    write(&root, "CONTRIBUTING.md", "# Contributing\n");
    write(
        &root,
        "template/README.md",
        &entry("Template Entry", "2099-01-01", Some("#template")),
    );
    write(
        &root,
        "databases/storage/README.md",
        &format!(
            "# Storage Engines\n\n{}",
            entry("LSM Compaction", "2025-04-09", Some("#databases #lsm"))
        ),
    );
    write(
        &root,
        "networking/README.md",
        &format!(
            "# Networking\n\n{}",
            entry("QUIC Handshakes", "2025-04-17", Some("#networking #quic"))
        ),
    );
    root
}

#[test]
fn newest_entry_wins_with_count_of_one() {
    let root = fixture_tree("count-one");
    let scanner = DocumentScanner::new(root.clone(), ScanOptions::default());
    let documents = scanner.scan_all().expect("scan");
    assert_eq!(documents.len(), 2);

    let options = IndexOptions {
        cutoff: Cutoff::Count(1),
        ..IndexOptions::default()
    };
    let update = update_index(ROOT_INDEX, &documents, &options).expect("update");

    assert_eq!(update.recent_count, 1);
    assert!(update.content.contains(
        "## Recently Added Articles\n\n\
         - [QUIC Handshakes](https://example.com/quic-handshakes) - *networking* (added 2025-04-17)\n\n\
         ## Statistics"
    ));
    assert!(!update.content.contains("LSM Compaction"));
    assert!(update.content.contains("- **Total Articles:** 2"));
    assert!(update.content.contains("- **Last Updated:** 2025-04-17"));
    assert!(update
        .content
        .ends_with("## How to Contribute\n\nCopy `template/README.md` into a topic directory.\n"));
    assert!(update.content.starts_with(
        "# Article Summaries\n\nShort notes on articles worth re-reading.\n\n## Recently Added Articles\n"
    ));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn regenerating_from_disk_is_idempotent() {
    let root = fixture_tree("idempotent");
    let scanner = DocumentScanner::new(root.clone(), ScanOptions::default());
    let documents = scanner.scan_all().expect("scan");

    let first = update_index(ROOT_INDEX, &documents, &IndexOptions::default()).expect("first");
    fs::write(root.join("README.md"), &first.content).expect("write index");

    let on_disk = fs::read_to_string(root.join("README.md")).expect("read index");
    let rescanned = scanner.scan_all().expect("rescan");
    let second = update_index(&on_disk, &rescanned, &IndexOptions::default()).expect("second");

    assert_eq!(first.content, second.content);
    assert!(!second.changed);
    assert_eq!(second.recent_count, 2);
    assert!(
        second.content.find("QUIC Handshakes") < second.content.find("LSM Compaction"),
        "newest entry listed first"
    );

    let _ = fs::remove_dir_all(root);
}

#[test]
fn validation_flags_entry_without_tags() {
    let root = fixture_tree("validate");
    write(
        &root,
        "networking/transport/README.md",
        &format!("# Transport\n\n{}", entry("TCP Slow Start", "2025-04-20", None)),
    );
    let scanner = DocumentScanner::new(root.clone(), ScanOptions::default());
    let documents = scanner.scan_all().expect("scan");
    let report = ValidationReport::from_documents(&documents);

    assert!(!report.passed());
    let hard: Vec<_> = report
        .violations()
        .filter(|v| v.code.severity() == article_catalog::Severity::Hard)
        .map(|v| (v.path.as_str(), v.code))
        .collect();
    assert_eq!(
        hard,
        vec![("networking/transport/README.md", ViolationCode::MissingTags)]
    );

    let _ = fs::remove_dir_all(root);
}
