// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::mock_browser::{MockBrowser, ScriptedSite};
use dircrawl::domain::services::pacing::Pacer;
use dircrawl::engines::page_loader::PageLoader;
use std::collections::HashMap;

const URL: &str = "https://angel.co/companies?&stage=Seed";

fn browser_failing(times: u32) -> MockBrowser {
    MockBrowser::new(ScriptedSite {
        failing_urls: HashMap::from([(URL.to_string(), times)]),
        ..ScriptedSite::default()
    })
}

#[tokio::test]
async fn test_gives_up_after_three_failures_and_closes() {
    let browser = browser_failing(u32::MAX);
    let mut driver = browser.driver();
    let loader = PageLoader::new(3, Pacer::disabled());

    assert!(!loader.load(&mut driver, URL).await);

    let log = browser.log();
    assert_eq!(log.navigations.len(), 3);
    assert_eq!(log.closes, 1);
}

#[tokio::test]
async fn test_recovers_before_limit_without_closing() {
    let browser = browser_failing(2);
    let mut driver = browser.driver();
    let loader = PageLoader::new(3, Pacer::disabled());

    assert!(loader.load(&mut driver, URL).await);

    let log = browser.log();
    assert_eq!(log.navigations.len(), 3);
    assert_eq!(log.closes, 0);
}

#[tokio::test]
async fn test_first_success_returns_immediately() {
    let browser = browser_failing(0);
    let mut driver = browser.driver();
    let loader = PageLoader::new(3, Pacer::disabled());

    assert!(loader.load(&mut driver, URL).await);
    assert_eq!(browser.log().navigations, vec![URL.to_string()]);
}
