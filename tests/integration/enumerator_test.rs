// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::mock_browser::{MockBrowser, ScriptedSite};
use super::helpers::{test_settings, ROOT_URL};
use dircrawl::config::settings::FilterSettings;
use dircrawl::domain::services::enumerator::{
    BrowserCountProber, CountProber, SearchSpace, SearchSpaceEnumerator,
};
use dircrawl::domain::services::pacing::Pacer;
use dircrawl::domain::services::row_extractor::RowExtractor;
use dircrawl::engines::page_loader::PageLoader;
use dircrawl::infrastructure::storage::OutputLayout;
use std::collections::HashMap;
use std::sync::Arc;

fn prober(browser: &MockBrowser, layout: OutputLayout) -> BrowserCountProber {
    let settings = test_settings(layout.root());
    BrowserCountProber::new(
        Arc::new(browser.clone()),
        PageLoader::new(3, Pacer::disabled()),
        Arc::new(RowExtractor::new(&settings.site).unwrap()),
        layout,
    )
}

#[tokio::test]
async fn test_probe_reads_count_and_closes_browser() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("{}&stage=Seed", ROOT_URL);
    let browser = MockBrowser::new(ScriptedSite {
        counts: HashMap::from([(url.clone(), 1234)]),
        ..ScriptedSite::default()
    });
    let mut prober = prober(&browser, OutputLayout::new(dir.path()));

    assert_eq!(prober.probe(&url).await, 1234);
    let log = browser.log();
    assert_eq!(log.launches, 1);
    assert_eq!(log.closes, 1);
}

#[tokio::test]
async fn test_missing_heading_dumps_page() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());
    let browser = MockBrowser::new(ScriptedSite::default());
    let mut prober = prober(&browser, layout.clone());

    assert_eq!(prober.probe(&format!("{}&stage=IPO", ROOT_URL)).await, 0);

    let dumped: Vec<_> = std::fs::read_dir(layout.debug_dir()).unwrap().collect();
    assert_eq!(dumped.len(), 1);
}

#[tokio::test]
async fn test_unreachable_page_counts_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("{}&stage=IPO", ROOT_URL);
    let browser = MockBrowser::new(ScriptedSite {
        counts: HashMap::from([(url.clone(), 50)]),
        failing_urls: HashMap::from([(url.clone(), u32::MAX)]),
        ..ScriptedSite::default()
    });
    let mut prober = prober(&browser, OutputLayout::new(dir.path()));

    assert_eq!(prober.probe(&url).await, 0);
    assert_eq!(browser.log().navigations.len(), 3);
}

#[tokio::test]
async fn test_enumeration_over_browser() {
    let dir = tempfile::tempdir().unwrap();
    let filters = FilterSettings {
        skip_market: true,
        skip_featured: false,
        skip_location: false,
        skip_signal: false,
        locations: vec!["1624-California".to_string(), "1642-Europe".to_string()],
        signal_ranges: vec![(9, 10), (8, 9), (7, 8)],
        stages: vec!["Seed".to_string(), "IPO".to_string(), "Acquired".to_string()],
        raised_ranges: vec![(0, 1)],
        ..FilterSettings::default()
    };
    let space = SearchSpace::new(ROOT_URL, &filters, &[]);
    // 1 market x 2 featured x 3 locations x 3 signals
    assert_eq!(space.base_probe_count(), 18);

    let big = format!("{}&signal[min]=9&signal[max]=10", ROOT_URL);
    let mut counts = HashMap::new();
    counts.insert(big.clone(), 900);
    for stage in ["Seed", "IPO", "Acquired"] {
        counts.insert(format!("{}&stage={}", big, stage), 120);
    }
    counts.insert(format!("{}&raised[min]=0&raised[max]=1", big), 5);
    counts.insert(format!("{}&locations[]=1642-Europe&signal[min]=8&signal[max]=9", ROOT_URL), 40);
    let browser = MockBrowser::new(ScriptedSite {
        counts,
        ..ScriptedSite::default()
    });

    let mut enumerator = SearchSpaceEnumerator::new(
        space,
        prober(&browser, OutputLayout::new(dir.path())),
        Pacer::disabled(),
        400,
    );
    let queries = enumerator.enumerate().await;

    // 18 base probes, 3 stage probes and 1 raised probe for the oversized query
    assert_eq!(browser.log().launches, 22);

    let urls: Vec<&str> = queries.iter().map(|q| q.url.as_str()).collect();
    assert_eq!(queries.len(), 6);
    assert_eq!(urls[0], big);
    for stage in ["Seed", "IPO", "Acquired"] {
        assert!(urls.contains(&format!("{}&stage={}", big, stage).as_str()));
    }
    assert!(queries.iter().any(|q| q.company_count == 40 && q.signal == 9));
}
