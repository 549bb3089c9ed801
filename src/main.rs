// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use dircrawl::application::use_cases::crawl_use_case::CrawlUseCase;
use dircrawl::config::settings::Settings;
use dircrawl::domain::services::pacing::Pacer;
use dircrawl::engines::chromium_engine::ChromiumLauncher;
use dircrawl::engines::traits::BrowserLauncher;
use dircrawl::infrastructure::metrics;
use dircrawl::utils::telemetry;
use std::sync::Arc;
use tracing::{info, warn};

/// 主函数
///
/// 加载配置，运行一次完整的爬取并输出统计
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting dircrawl...");

    let metrics_handle = metrics::init_metrics();

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded, output root {}", settings.output.root.display());

    // 3. Browser launcher and pacing
    let launcher: Arc<dyn BrowserLauncher> = Arc::new(ChromiumLauncher::new(settings.browser.clone()));
    let pacer = Pacer::new(&settings.pacing);

    // 4. Run the crawl
    let use_case = CrawlUseCase::new(settings.clone(), launcher, pacer);
    let summary = use_case.run().await?;

    info!(
        "Crawl finished: {} queries, {} sessions, {} steps written, {} skipped, {} clicks, {} failed",
        summary.queries,
        summary.sessions,
        summary.steps_written,
        summary.steps_skipped,
        summary.clicks,
        summary.failed_queries
    );

    if let Some(handle) = metrics_handle {
        let path = use_case.layout().root().join("metrics.prom");
        if let Err(e) = metrics::write_snapshot(&handle, &path).await {
            warn!("Failed to write metrics snapshot: {}", e);
        }
    }

    Ok(())
}
