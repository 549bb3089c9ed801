// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::detail_fetcher;
use super::helpers::mock_browser::{detail_page, MockBrowser, ScriptedSite};
use super::helpers::test_settings;
use dircrawl::domain::models::record::{FieldValue, RowRecord};
use dircrawl::infrastructure::storage::OutputLayout;
use std::collections::HashMap;

const DETAIL_URL: &str = "https://angel.co/acme";

fn row(link: &str) -> RowRecord {
    let mut record = RowRecord::new();
    record.insert("title", "Acme");
    record.insert("al_link", link);
    record
}

#[tokio::test]
async fn test_downloads_caches_and_extracts_description() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = test_settings(dir.path());
    settings.detail.visit = true;
    let layout = OutputLayout::new(dir.path());

    let browser = MockBrowser::new(ScriptedSite {
        detail_pages: HashMap::from([(DETAIL_URL.to_string(), detail_page("Builds rockets."))]),
        ..ScriptedSite::default()
    });
    let fetcher = detail_fetcher(&browser, &settings);

    // relative link resolves against the site root
    let mut record = row("/acme");
    fetcher.process(&mut record).await.unwrap();

    assert_eq!(
        record.get("product_desc").and_then(FieldValue::as_text),
        Some("Builds rockets.")
    );
    assert!(layout.detail_page_file(DETAIL_URL).exists());
    let mirror = std::fs::read_to_string(layout.detail_record_file(DETAIL_URL)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&mirror).unwrap();
    assert_eq!(json["product_desc"], "Builds rockets.");

    let log = browser.log();
    assert_eq!(log.launches, 1);
    assert_eq!(log.closes, 1);
}

#[tokio::test]
async fn test_cached_page_is_reused_unless_redownload() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = test_settings(dir.path());
    settings.detail.visit = true;
    let layout = OutputLayout::new(dir.path());

    let cache = layout.detail_page_file(DETAIL_URL);
    std::fs::create_dir_all(cache.parent().unwrap()).unwrap();
    std::fs::write(&cache, detail_page("From cache.")).unwrap();

    let browser = MockBrowser::new(ScriptedSite {
        detail_pages: HashMap::from([(DETAIL_URL.to_string(), detail_page("Fresh."))]),
        ..ScriptedSite::default()
    });

    let mut record = row(DETAIL_URL);
    detail_fetcher(&browser, &settings).process(&mut record).await.unwrap();
    assert_eq!(record.get("product_desc").and_then(FieldValue::as_text), Some("From cache."));
    assert_eq!(browser.log().launches, 0);

    settings.detail.redownload = true;
    let mut record = row(DETAIL_URL);
    detail_fetcher(&browser, &settings).process(&mut record).await.unwrap();
    assert_eq!(record.get("product_desc").and_then(FieldValue::as_text), Some("Fresh."));
    assert_eq!(browser.log().launches, 1);
    assert_eq!(std::fs::read_to_string(&cache).unwrap(), detail_page("Fresh."));
}

#[tokio::test]
async fn test_unreachable_detail_keeps_row_and_mirror() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = test_settings(dir.path());
    settings.detail.visit = true;
    let layout = OutputLayout::new(dir.path());

    let browser = MockBrowser::new(ScriptedSite {
        failing_urls: HashMap::from([(DETAIL_URL.to_string(), u32::MAX)]),
        ..ScriptedSite::default()
    });

    let mut record = row(DETAIL_URL);
    detail_fetcher(&browser, &settings).process(&mut record).await.unwrap();

    assert!(!record.contains_key("product_desc"));
    assert!(!layout.detail_page_file(DETAIL_URL).exists());
    assert!(layout.detail_record_file(DETAIL_URL).exists());
    assert_eq!(browser.log().navigations.len(), 3);
}

#[tokio::test]
async fn test_visit_disabled_only_writes_mirror() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(dir.path());
    let layout = OutputLayout::new(dir.path());
    let browser = MockBrowser::new(ScriptedSite::default());

    let mut record = row(DETAIL_URL);
    detail_fetcher(&browser, &settings).process(&mut record).await.unwrap();

    assert_eq!(browser.log().launches, 0);
    assert!(layout.detail_record_file(DETAIL_URL).exists());
}

#[tokio::test]
async fn test_interrupted_download_is_not_reused() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = test_settings(dir.path());
    settings.detail.visit = true;
    let layout = OutputLayout::new(dir.path());

    // a truncated temp file from an interrupted run
    let cache = layout.detail_page_file(DETAIL_URL);
    let partial = cache.with_file_name(format!("{}.tmp", cache.file_name().unwrap().to_string_lossy()));
    std::fs::create_dir_all(cache.parent().unwrap()).unwrap();
    std::fs::write(&partial, "<html><body><div class=\"product_").unwrap();

    let browser = MockBrowser::new(ScriptedSite {
        detail_pages: HashMap::from([(DETAIL_URL.to_string(), detail_page("Complete."))]),
        ..ScriptedSite::default()
    });

    let mut record = row(DETAIL_URL);
    detail_fetcher(&browser, &settings).process(&mut record).await.unwrap();

    assert_eq!(record.get("product_desc").and_then(FieldValue::as_text), Some("Complete."));
    assert_eq!(browser.log().launches, 1);
    assert_eq!(std::fs::read_to_string(&cache).unwrap(), detail_page("Complete."));
    assert!(!partial.exists());
}
