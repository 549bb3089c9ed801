// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use metrics::counter;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::settings::FilterSettings;
use crate::domain::models::query::Query;
use crate::domain::services::pacing::{Pacer, PauseSchedule};
use crate::domain::services::row_extractor::RowExtractor;
use crate::engines::page_loader::PageLoader;
use crate::engines::traits::BrowserLauncher;
use crate::infrastructure::storage::OutputLayout;
use crate::utils::url_utils::query_file_stem;

/// 结果数量探测器
#[async_trait]
pub trait CountProber: Send {
    /// 返回搜索页的结果数量，任何失败都视为 0
    async fn probe(&mut self, url: &str) -> u64;
}

/// 基于浏览器的结果数量探测器
///
/// 每次探测启动一个新的浏览器会话，读取结果数量后关闭
pub struct BrowserCountProber {
    launcher: Arc<dyn BrowserLauncher>,
    loader: PageLoader,
    extractor: Arc<RowExtractor>,
    layout: OutputLayout,
}

impl BrowserCountProber {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        loader: PageLoader,
        extractor: Arc<RowExtractor>,
        layout: OutputLayout,
    ) -> Self {
        Self {
            launcher,
            loader,
            extractor,
            layout,
        }
    }
}

#[async_trait]
impl CountProber for BrowserCountProber {
    async fn probe(&mut self, url: &str) -> u64 {
        info!("*** New search, target_url: {}", url);
        counter!("dircrawl_probes_total").increment(1);

        let mut driver = match self.launcher.launch().await {
            Ok(driver) => driver,
            Err(e) => {
                error!("failed to launch browser for count probe: {}", e);
                return 0;
            }
        };

        if !self.loader.load(driver.as_mut(), url).await {
            return 0;
        }

        let page = driver.page_source().await;
        if let Err(e) = driver.close().await {
            warn!("failed to close browser after count probe: {}", e);
        }

        let page = match page {
            Ok(page) => page,
            Err(e) => {
                error!("failed to read page source for {}: {}", url, e);
                return 0;
            }
        };

        match self.extractor.result_count(&page) {
            Some(count) => {
                info!("*** found {} companies", count);
                count
            }
            None => {
                match self.layout.dump_failed_page(&page).await {
                    Ok(path) => error!(
                        "failed to get company count, saving page as {}",
                        path.display()
                    ),
                    Err(e) => error!("failed to get company count and to save page: {}", e),
                }
                0
            }
        }
    }
}

/// 过滤维度组合出的搜索空间
///
/// 行业、精选和地区三个维度的第0项是空片段（不过滤）；
/// 信号分维度没有空片段，每个查询都带一个信号分。
/// 阶段和融资额只用于细分，只保存非空片段。
#[derive(Debug, Clone)]
pub struct SearchSpace {
    pub root_url: String,
    pub markets: Vec<String>,
    pub featured: Vec<(String, bool)>,
    pub locations: Vec<String>,
    /// 片段及其信号分上限
    pub signals: Vec<(String, u32)>,
    pub stages: Vec<String>,
    pub raised: Vec<String>,
}

impl SearchSpace {
    pub fn new(root_url: &str, filters: &FilterSettings, market_labels: &[String]) -> Self {
        let mut markets = vec![String::new()];
        if !filters.skip_market {
            markets.extend(market_labels.iter().map(|label| market_fragment(label)));
        }

        let mut featured = vec![(String::new(), false)];
        if !filters.skip_featured {
            featured.push(("&featured=Featured".to_string(), true));
        }

        let mut locations = vec![String::new()];
        if !filters.skip_location {
            locations.extend(filters.locations.iter().map(|l| format!("&locations[]={}", l)));
        }

        let signal_ranges = if filters.skip_signal || filters.signal_ranges.is_empty() {
            vec![filters.fallback_signal_range]
        } else {
            filters.signal_ranges.clone()
        };
        let signals = signal_ranges
            .into_iter()
            .map(|(min, max)| (format!("&signal[min]={}&signal[max]={}", min, max), max))
            .collect();

        let stages = if filters.skip_stage {
            Vec::new()
        } else {
            filters.stages.iter().map(|s| format!("&stage={}", s)).collect()
        };

        let raised = if filters.skip_raised {
            Vec::new()
        } else {
            filters
                .raised_ranges
                .iter()
                .map(|(min, max)| format!("&raised[min]={}&raised[max]={}", min, max))
                .collect()
        };

        Self {
            root_url: root_url.to_string(),
            markets,
            featured,
            locations,
            signals,
            stages,
            raised,
        }
    }

    /// 细分之前的探测次数
    pub fn base_probe_count(&self) -> usize {
        self.markets.len() * self.featured.len() * self.locations.len() * self.signals.len()
    }
}

/// 行业过滤片段：空格转为 `+`，并合并 `+++`
pub fn market_fragment(label: &str) -> String {
    format!("&markets[]={}", label.replace(' ', "+")).replace("+++", "+")
}

/// 读取行业标签文件，忽略空行
pub async fn load_market_labels(path: &Path) -> std::io::Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// 搜索空间枚举器
///
/// 对过滤维度做笛卡尔积并逐一探测结果数量。
/// 超过站点展示上限的查询按阶段和融资额继续细分。
pub struct SearchSpaceEnumerator<P: CountProber> {
    space: SearchSpace,
    prober: P,
    pacer: Pacer,
    ceiling: u64,
}

/// 当前组合的精选标记和信号分
#[derive(Clone, Copy)]
struct Origin {
    featured: bool,
    signal: u32,
}

impl<P: CountProber> SearchSpaceEnumerator<P> {
    pub fn new(space: SearchSpace, prober: P, pacer: Pacer, ceiling: u64) -> Self {
        Self {
            space,
            prober,
            pacer,
            ceiling,
        }
    }

    pub fn into_prober(self) -> P {
        self.prober
    }

    /// 枚举所有非空查询，按URL去重，先出现者优先
    #[instrument(skip(self))]
    pub async fn enumerate(&mut self) -> Vec<Query> {
        let mut queries = Vec::new();
        let space = self.space.clone();
        info!("enumerating search space with {} base probes", space.base_probe_count());

        for market in &space.markets {
            for (featured_fragment, featured) in &space.featured {
                for location in &space.locations {
                    for (signal_fragment, signal) in &space.signals {
                        let url = format!(
                            "{}{}{}{}{}",
                            space.root_url, market, featured_fragment, location, signal_fragment
                        );
                        let origin = Origin {
                            featured: *featured,
                            signal: *signal,
                        };
                        let count = self.probe_into(&url, origin, &mut queries).await;
                        if count > self.ceiling {
                            self.subdivide(&url, origin, &mut queries).await;
                        }
                    }
                }
            }
        }

        let queries = dedup_by_url(queries);
        info!("Length of url_list: {}", queries.len());
        queries
    }

    async fn subdivide(&mut self, url: &str, origin: Origin, queries: &mut Vec<Query>) {
        info!("index page too long (>{}), further dividing...", self.ceiling);
        let stages = self.space.stages.clone();
        let raised = self.space.raised.clone();

        for stage in &stages {
            let stage_url = format!("{}{}", url, stage);
            let count = self.probe_into(&stage_url, origin, queries).await;
            if count > self.ceiling {
                info!("index page still too long (>{}), further further dividing...", self.ceiling);
                for r in &raised {
                    let raised_url = format!("{}{}", stage_url, r);
                    self.probe_into(&raised_url, origin, queries).await;
                }
            }
        }

        for r in &raised {
            let raised_url = format!("{}{}", url, r);
            self.probe_into(&raised_url, origin, queries).await;
        }
    }

    /// 探测一个URL，非空时加入列表，之后按探测节奏暂停
    async fn probe_into(&mut self, url: &str, origin: Origin, queries: &mut Vec<Query>) -> u64 {
        let count = self.prober.probe(url).await;
        if count > 0 {
            queries.push(Query {
                url: url.to_string(),
                fname: query_file_stem(&self.space.root_url, url),
                company_count: count,
                featured: origin.featured,
                signal: origin.signal,
            });
        } else {
            counter!("dircrawl_empty_probes_total").increment(1);
            debug!("empty list, not adding to the url_list: {}", url);
        }
        self.pacer.pause_drawn(&PauseSchedule::PROBE).await;
        count
    }
}

fn dedup_by_url(queries: Vec<Query>) -> Vec<Query> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .filter(|q| seen.insert(q.url.clone()))
        .collect()
}
