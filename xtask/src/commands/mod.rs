//! Catalog command families.

pub mod index;
pub mod stats;
pub mod validate;

use crate::catalog_config::CatalogSettings;
use crate::runtime::error::XtaskResult;
use article_catalog::{DocumentScanner, TopicDocument};

pub(crate) fn scanner_for(settings: &CatalogSettings) -> DocumentScanner {
    DocumentScanner::new(settings.topic_root.clone(), settings.scan.clone())
}

/// Scan every topic document below the configured root.
pub(crate) fn scan_documents(settings: &CatalogSettings) -> XtaskResult<Vec<TopicDocument>> {
    let scanner = scanner_for(settings);
    let documents = scanner.scan_all().map_err(|err| {
        crate::runtime::error::XtaskError::from(err).with_operation("scan topic documents")
    })?;
    let entries: usize = documents.iter().map(|doc| doc.entries.len()).sum();
    println!(
        "    scanned {} document(s), {entries} entr{} under {}",
        documents.len(),
        if entries == 1 { "y" } else { "ies" },
        settings.topic_root.display()
    );
    Ok(documents)
}
