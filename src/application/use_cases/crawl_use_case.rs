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

use crate::{
    config::settings::Settings,
    domain::{
        models::query::Query,
        services::{
            detail_fetcher::DetailFetcher,
            enumerator::{load_market_labels, BrowserCountProber, SearchSpace, SearchSpaceEnumerator},
            pacing::Pacer,
            paginator::{PaginationReport, Paginator},
            row_extractor::RowExtractor,
        },
    },
    engines::{page_loader::PageLoader, traits::BrowserLauncher},
    infrastructure::{
        storage::OutputLayout,
        tabular::{read_queries, write_queries},
    },
};
use anyhow::Context;
use chrono::Local;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 一次完整运行的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub queries: usize,
    pub sessions: usize,
    pub steps_written: u32,
    pub steps_skipped: u32,
    pub clicks: u32,
    pub failed_queries: usize,
}

impl CrawlSummary {
    fn record(&mut self, reports: &[PaginationReport]) {
        for report in reports {
            self.sessions += 1;
            self.steps_written += report.steps_written;
            self.steps_skipped += report.steps_skipped;
            self.clicks += report.clicks;
        }
    }
}

/// 爬取用例
///
/// 枚举（或重新读取）查询列表，打乱顺序后逐个分页
pub struct CrawlUseCase {
    settings: Arc<Settings>,
    launcher: Arc<dyn BrowserLauncher>,
    layout: OutputLayout,
    pacer: Pacer,
}

impl CrawlUseCase {
    pub fn new(settings: Arc<Settings>, launcher: Arc<dyn BrowserLauncher>, pacer: Pacer) -> Self {
        let layout = OutputLayout::new(settings.output.root.clone());
        Self {
            settings,
            launcher,
            layout,
            pacer,
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub async fn run(&self) -> anyhow::Result<CrawlSummary> {
        // 1. Prepare output folders
        self.layout
            .ensure_dirs()
            .await
            .with_context(|| format!("failed to create output dirs under {}", self.layout.root().display()))?;

        let extractor = Arc::new(RowExtractor::new(&self.settings.site)?);
        let loader = PageLoader::new(self.settings.browser.max_load_attempts, self.pacer.clone());

        // 2. Build the query list
        let mut queries = self.load_or_enumerate(extractor.clone(), loader.clone()).await?;
        if self.settings.pagination.shuffle_queries {
            queries.shuffle(&mut rand::rng());
        }

        // 3. Paginate every query
        let details = DetailFetcher::new(
            self.launcher.clone(),
            loader.clone(),
            extractor.clone(),
            self.layout.clone(),
            self.pacer.clone(),
            &self.settings.site.root_url,
            self.settings.detail.visit,
            self.settings.detail.redownload,
        )?;
        let paginator = Paginator::new(
            self.launcher.clone(),
            loader,
            extractor,
            details,
            self.layout.clone(),
            self.pacer.clone(),
            self.settings.site.clone(),
            self.settings.pagination.clone(),
            self.settings.browser.element_wait(),
            self.settings.enumeration.page_size_ceiling,
        );

        let mut summary = CrawlSummary {
            queries: queries.len(),
            ..CrawlSummary::default()
        };
        for (idx, query) in queries.iter().enumerate() {
            info!("query {}/{}: {}", idx + 1, queries.len(), query.url);
            match paginator.paginate_query(query).await {
                Ok(reports) => summary.record(&reports),
                Err(e) => {
                    error!(retryable = e.is_retryable(), "failed to paginate {}: {}", query.url, e);
                    summary.failed_queries += 1;
                }
            }
        }

        Ok(summary)
    }

    /// 复用已有的URL列表，或者重新枚举并写出当天的列表
    pub async fn load_or_enumerate(
        &self,
        extractor: Arc<RowExtractor>,
        loader: PageLoader,
    ) -> anyhow::Result<Vec<Query>> {
        let today_file = self.layout.url_list_file(Local::now().date_naive());

        if self.settings.enumeration.reuse_url_list {
            let path = self
                .settings
                .enumeration
                .url_list_file
                .clone()
                .unwrap_or_else(|| today_file.clone());
            match read_queries(&path).await? {
                Some(queries) => {
                    info!("Reading url list file: {} ({} queries)", path.display(), queries.len());
                    return Ok(queries);
                }
                None => warn!("url list file {} not found, enumerating instead", path.display()),
            }
        }

        let filters = &self.settings.filters;
        let labels = match (&filters.market_label_file, filters.skip_market) {
            (Some(path), false) => load_market_labels(path)
                .await
                .with_context(|| format!("failed to read market labels {}", path.display()))?,
            (None, false) => {
                warn!("market filter enabled but no label file configured");
                Vec::new()
            }
            (_, true) => Vec::new(),
        };

        let space = SearchSpace::new(&self.settings.site.root_url, filters, &labels);
        let prober = BrowserCountProber::new(self.launcher.clone(), loader, extractor, self.layout.clone());
        let mut enumerator = SearchSpaceEnumerator::new(
            space,
            prober,
            self.pacer.clone(),
            self.settings.enumeration.page_size_ceiling,
        );
        let queries = enumerator.enumerate().await;

        info!("Writing url list file: {}", today_file.display());
        write_queries(&today_file, &queries).await?;
        Ok(queries)
    }
}
