// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::counter;
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

use crate::domain::models::record::{FieldValue, RowRecord};
use crate::domain::services::pacing::{Pacer, PauseSchedule};
use crate::domain::services::row_extractor::RowExtractor;
use crate::engines::page_loader::PageLoader;
use crate::engines::traits::BrowserLauncher;
use crate::infrastructure::storage::{read_optional, write_atomic, write_file, OutputLayout};
use crate::utils::errors::CrawlError;
use crate::utils::url_utils::resolve_url;

/// 详情页抓取器
///
/// 详情页按URL缓存在 `company_pages/` 下，除非强制重新下载，否则直接复用。
/// 每次下载使用一个独立的短生命周期浏览器会话。
pub struct DetailFetcher {
    launcher: Arc<dyn BrowserLauncher>,
    loader: PageLoader,
    extractor: Arc<RowExtractor>,
    layout: OutputLayout,
    pacer: Pacer,
    base_url: Url,
    visit: bool,
    redownload: bool,
}

impl DetailFetcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        loader: PageLoader,
        extractor: Arc<RowExtractor>,
        layout: OutputLayout,
        pacer: Pacer,
        root_url: &str,
        visit: bool,
        redownload: bool,
    ) -> Result<Self, CrawlError> {
        let base_url = Url::parse(root_url)
            .map_err(|e| CrawlError::Config(format!("invalid root url {}: {}", root_url, e)))?;
        Ok(Self {
            launcher,
            loader,
            extractor,
            layout,
            pacer,
            base_url,
            visit,
            redownload,
        })
    }

    /// 补充一行记录的详情字段，并写出记录的JSON副本
    ///
    /// 详情页加载失败或缺少描述只记录日志，记录本身保留。
    /// 只有写文件失败才返回错误。
    pub async fn process(&self, record: &mut RowRecord) -> Result<(), CrawlError> {
        let Some(detail_url) = self.detail_url(record) else {
            warn!("row has no detail link, skipping detail page");
            return Ok(());
        };

        if self.visit {
            if let Some(page) = self.fetch_page(&detail_url).await? {
                match self.extractor.description(&page) {
                    Some(desc) => record.insert("product_desc", desc),
                    None => error!("cannot get product_desc from {}", detail_url),
                }
            }
        }

        let mirror = serde_json::to_string(record)?;
        write_file(&self.layout.detail_record_file(&detail_url), mirror.as_bytes()).await?;
        Ok(())
    }

    /// 行内链接解析为绝对地址
    fn detail_url(&self, record: &RowRecord) -> Option<String> {
        let link = record.get("al_link").and_then(FieldValue::as_text)?;
        match resolve_url(&self.base_url, link) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                warn!("invalid detail link {}: {}", link, e);
                None
            }
        }
    }

    /// 取得详情页HTML，缓存优先；无法加载时返回 `None`
    pub async fn fetch_page(&self, detail_url: &str) -> Result<Option<String>, CrawlError> {
        let cache_file = self.layout.detail_page_file(detail_url);
        if !self.redownload {
            if let Some(page) = read_optional(&cache_file).await? {
                info!("{} exists, wont re-download", cache_file.display());
                counter!("dircrawl_detail_cache_hits_total").increment(1);
                return Ok(Some(page));
            }
        }

        let mut driver = match self.launcher.launch().await {
            Ok(driver) => driver,
            Err(e) => {
                error!("failed to launch browser for detail page: {}", e);
                return Ok(None);
            }
        };
        if !self.loader.load(driver.as_mut(), detail_url).await {
            return Ok(None);
        }

        let page = driver.page_source().await;
        if let Err(e) = driver.close().await {
            warn!("failed to close detail browser: {}", e);
        }
        let page = match page {
            Ok(page) => page,
            Err(e) => {
                error!("failed to read detail page {}: {}", detail_url, e);
                return Ok(None);
            }
        };

        write_atomic(&cache_file, page.as_bytes()).await?;
        counter!("dircrawl_detail_downloads_total").increment(1);
        self.pacer.pause_drawn(&PauseSchedule::DETAIL).await;
        Ok(Some(page))
    }
}
