// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::counter;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::config::settings::{PaginationSettings, SiteSettings};
use crate::domain::models::query::{Query, SortKey};
use crate::domain::models::record::RowRecord;
use crate::domain::services::detail_fetcher::DetailFetcher;
use crate::domain::services::pacing::{Pacer, PauseSchedule, PauseTier};
use crate::domain::services::row_extractor::{RowContext, RowExtractor};
use crate::engines::page_loader::PageLoader;
use crate::engines::traits::{BrowserDriver, BrowserLauncher, ElementHandle, EngineError};
use crate::infrastructure::storage::{write_file, OutputLayout};
use crate::infrastructure::tabular::write_records;
use crate::utils::errors::CrawlError;

/// 一次分页会话的状态
///
/// 第 `click` 步对应结果文件 `..._click=<click>.csv`，
/// `row_cursor` 之前的行已经处理过（第0行是表头）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationSession {
    pub sort: SortKey,
    pub click: u32,
    pub row_cursor: usize,
    pub ceiling: u32,
    /// "加载更多"按钮已不存在
    pub exhausted: bool,
}

impl PaginationSession {
    pub fn new(sort: SortKey, ceiling: u32) -> Self {
        Self {
            sort,
            click: 1,
            row_cursor: 1,
            ceiling,
            exhausted: false,
        }
    }

    pub fn has_more_steps(&self) -> bool {
        self.click < self.ceiling
    }

    /// 取出本步需要处理的行范围，并把游标移到 `row_total`
    pub fn advance_rows(&mut self, row_total: usize) -> Range<usize> {
        let range = self.row_cursor..row_total;
        self.row_cursor = row_total;
        range
    }
}

/// 分页结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationEnd {
    /// "加载更多"按钮消失
    Exhausted,
    /// 达到点击上限
    CeilingReached,
    /// 按钮无法点击
    NotClickable,
    /// 搜索页无法加载
    LoadFailed,
    /// 查询没有结果
    EmptyQuery,
    /// 页面上没有结果列表
    MissingResults,
}

impl fmt::Display for PaginationEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaginationEnd::Exhausted => "exhausted",
            PaginationEnd::CeilingReached => "ceiling reached",
            PaginationEnd::NotClickable => "load-more not clickable",
            PaginationEnd::LoadFailed => "load failed",
            PaginationEnd::EmptyQuery => "empty query",
            PaginationEnd::MissingResults => "missing results",
        };
        f.write_str(label)
    }
}

/// 单个 (查询, 排序) 的分页结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationReport {
    pub sort: SortKey,
    pub steps_written: u32,
    pub steps_skipped: u32,
    pub clicks: u32,
    pub end: PaginationEnd,
}

impl PaginationReport {
    fn new(sort: SortKey, end: PaginationEnd) -> Self {
        Self {
            sort,
            steps_written: 0,
            steps_skipped: 0,
            clicks: 0,
            end,
        }
    }
}

/// 结果页分页器
///
/// 驱动"加载更多"按钮逐步展开结果列表，每一步的新行写入一个文件。
/// 已存在的步骤文件不再提取，但仍然继续点击，因此中断后可以续跑。
pub struct Paginator {
    launcher: Arc<dyn BrowserLauncher>,
    loader: PageLoader,
    extractor: Arc<RowExtractor>,
    details: DetailFetcher,
    layout: OutputLayout,
    pacer: Pacer,
    site: SiteSettings,
    settings: PaginationSettings,
    element_wait: Duration,
    page_size_ceiling: u64,
}

impl Paginator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        loader: PageLoader,
        extractor: Arc<RowExtractor>,
        details: DetailFetcher,
        layout: OutputLayout,
        pacer: Pacer,
        site: SiteSettings,
        settings: PaginationSettings,
        element_wait: Duration,
        page_size_ceiling: u64,
    ) -> Self {
        Self {
            launcher,
            loader,
            extractor,
            details,
            layout,
            pacer,
            site,
            settings,
            element_wait,
            page_size_ceiling,
        }
    }

    /// 按查询需要的所有排序方式依次分页
    pub async fn paginate_query(&self, query: &Query) -> Result<Vec<PaginationReport>, CrawlError> {
        info!("parsing single page: {:?}", query);
        let mut reports = Vec::new();
        for sort in query.sort_orders(self.page_size_ceiling) {
            reports.push(self.paginate(query, sort).await?);
        }
        Ok(reports)
    }

    /// 用一个新的浏览器会话分页一个 (查询, 排序)
    #[instrument(skip_all, fields(url = %query.url, sort = %sort))]
    pub async fn paginate(&self, query: &Query, sort: SortKey) -> Result<PaginationReport, CrawlError> {
        if query.company_count == 0 {
            error!("empty search result with target_url=={}", query.url);
            return Ok(PaginationReport::new(sort, PaginationEnd::EmptyQuery));
        }

        let mut driver = match self.launcher.launch().await {
            Ok(driver) => driver,
            Err(e) => {
                error!("failed to launch browser: {}", e);
                return Ok(PaginationReport::new(sort, PaginationEnd::LoadFailed));
            }
        };

        if !self.loader.load(driver.as_mut(), &query.url).await {
            return Ok(PaginationReport::new(sort, PaginationEnd::LoadFailed));
        }

        let result = self.run_session(driver.as_mut(), query, sort).await;
        if let Err(e) = driver.close().await {
            warn!("failed to close browser: {}", e);
        }

        let report = result?;
        info!(
            "finished sort={} written={} skipped={} clicks={} end={}",
            report.sort, report.steps_written, report.steps_skipped, report.clicks, report.end
        );
        Ok(report)
    }

    async fn run_session(
        &self,
        driver: &mut dyn BrowserDriver,
        query: &Query,
        sort: SortKey,
    ) -> Result<PaginationReport, CrawlError> {
        let ceiling = query.click_ceiling(self.settings.rows_per_click, self.settings.click_slack);
        let mut session = PaginationSession::new(sort, ceiling);
        let mut report = PaginationReport::new(sort, PaginationEnd::CeilingReached);

        let mut load_more = self.find_load_more(driver, session.click).await;
        session.exhausted = load_more.is_none();

        if !sort.is_default() {
            if let Err(e) = self.apply_sort(driver, sort).await {
                error!("failed to click click_sort={} at {}: {}", sort, query.url, e);
            }
        }

        let mut page = self.current_page(driver).await;
        let Some(mut row_total) = self.extractor.row_count(&page) else {
            match self.layout.dump_failed_page(&page).await {
                Ok(path) => error!("failed to get results from page, saving page as {}", path.display()),
                Err(e) => error!("failed to get results from page and to save it: {}", e),
            }
            self.pacer.pause(PauseTier::VeryShort).await;
            report.end = PaginationEnd::MissingResults;
            return Ok(report);
        };

        let ctx = RowContext {
            featured: query.featured,
            score: query.signal,
        };

        while session.has_more_steps() {
            let step_file = self.layout.step_file(query, sort, session.click);
            let range = session.advance_rows(row_total);

            if tokio::fs::try_exists(&step_file).await? {
                info!("{} exists, skipping", step_file.display());
                counter!("dircrawl_steps_skipped_total").increment(1);
                report.steps_skipped += 1;
            } else {
                let records = self.extract_step(&page, range, ctx, session.click).await?;
                info!("Writing {} ({} rows)", step_file.display(), records.len());
                write_records(&step_file, &records).await?;
                counter!("dircrawl_steps_written_total").increment(1);
                report.steps_written += 1;
            }

            let Some(button) = load_more.take() else {
                info!("exhausted page length, stopping at click {}", session.click);
                self.pacer.pause(PauseTier::VeryShort).await;
                report.end = PaginationEnd::Exhausted;
                return Ok(report);
            };

            self.pacer.pause_drawn(&PauseSchedule::STEP).await;

            session.click += 1;
            if let Err(e) = driver.click(&button).await {
                error!("more button not clickable, N_click = {}: {}", session.click, e);
                self.pacer.pause(PauseTier::VeryShort).await;
                report.end = PaginationEnd::NotClickable;
                return Ok(report);
            }
            report.clicks += 1;

            (page, row_total) = self
                .wait_for_growth(driver, query, session.click, row_total)
                .await;

            load_more = self.find_load_more(driver, session.click).await;
            session.exhausted = load_more.is_none();
        }

        Ok(report)
    }

    /// 提取一步中的新行，并逐行处理详情页
    async fn extract_step(
        &self,
        page: &str,
        range: Range<usize>,
        ctx: RowContext,
        click: u32,
    ) -> Result<Vec<RowRecord>, CrawlError> {
        let mut records = self.extractor.extract_rows(page, range.clone(), ctx);
        for (offset, record) in records.iter_mut().enumerate() {
            info!(
                "N_click = {}, row = {}/{}, {}",
                click,
                range.start + offset,
                range.end.saturating_sub(1),
                record.get("title").map(|t| t.to_cell()).unwrap_or_default()
            );
            self.details.process(record).await?;
        }
        Ok(records)
    }

    /// 等待点击后行数增长，每次检查都保存页面快照；不增长也不视为错误
    async fn wait_for_growth(
        &self,
        driver: &mut dyn BrowserDriver,
        query: &Query,
        click: u32,
        previous: usize,
    ) -> (String, usize) {
        let snapshot = self.layout.index_snapshot_file(&query.url, click);
        let mut page = String::new();
        let mut rows = previous;

        for _ in 0..self.settings.growth_poll_attempts.max(1) {
            page = self.current_page(driver).await;
            if let Err(e) = write_file(&snapshot, page.as_bytes()).await {
                warn!("failed to save index page {}: {}", snapshot.display(), e);
            }

            rows = self.extractor.row_count(&page).unwrap_or(previous);
            if rows > previous {
                break;
            }
            self.pacer.sleep(self.settings.growth_poll_interval()).await;
        }

        (page, rows)
    }

    async fn find_load_more(&self, driver: &mut dyn BrowserDriver, click: u32) -> Option<ElementHandle> {
        match driver
            .find_clickable(&self.site.load_more_selector, self.element_wait)
            .await
        {
            Ok(button) => Some(button),
            Err(e) => {
                info!("exhausted page length, with N_click == {}: {}", click, e);
                None
            }
        }
    }

    async fn apply_sort(&self, driver: &mut dyn BrowserDriver, sort: SortKey) -> Result<(), EngineError> {
        let selector = self.site.sort_selector(sort.as_str());
        info!("clicking sort button: {}", selector);
        let button = driver.find_clickable(&selector, self.element_wait).await?;
        driver.click(&button).await?;
        driver.find_clickable(&selector, self.element_wait).await?;
        Ok(())
    }

    /// 当前页面HTML，读取失败时返回空页面
    async fn current_page(&self, driver: &mut dyn BrowserDriver) -> String {
        match driver.page_source().await {
            Ok(page) => page,
            Err(e) => {
                error!("failed to read page source: {}", e);
                String::new()
            }
        }
    }
}
