// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// 应用程序配置设置
///
/// 构造后不可变，按引用传入各个组件
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 目标站点配置
    pub site: SiteSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 搜索过滤器配置
    pub filters: FilterSettings,
    /// 搜索空间枚举配置
    pub enumeration: EnumerationSettings,
    /// 分页配置
    pub pagination: PaginationSettings,
    /// 详情页配置
    pub detail: DetailSettings,
    /// 输出配置
    pub output: OutputSettings,
    /// 节奏控制配置
    pub pacing: PacingSettings,
}

/// 目标站点配置
///
/// 站点相关的CSS选择器集中在这里，改版时无需改代码
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    /// 搜索页根地址，过滤器片段直接拼接在其后
    pub root_url: String,
    /// 结果数量标题
    pub count_selector: String,
    /// 结果列表容器
    pub results_selector: String,
    /// 结果行
    pub row_selector: String,
    /// "加载更多"按钮
    pub load_more_selector: String,
    /// 排序按钮模板，`{}` 替换为排序键
    pub sort_selector_template: String,
    /// 详情页描述容器
    pub description_selector: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            root_url: "https://angel.co/companies?".to_string(),
            count_selector: "div.top div.count".to_string(),
            results_selector: ".results".to_string(),
            row_selector: "div[data-_tn=\"companies/row\"]".to_string(),
            load_more_selector: ".more".to_string(),
            sort_selector_template: "div.column.{}.sortable".to_string(),
            description_selector: "div.product_desc div.content".to_string(),
        }
    }
}

impl SiteSettings {
    /// 指定排序键对应的排序按钮选择器
    pub fn sort_selector(&self, sort_key: &str) -> String {
        self.sort_selector_template.replace("{}", sort_key)
    }
}

/// 浏览器配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// 远程Chrome调试地址，设置后不再本地启动浏览器
    pub remote_debugging_url: Option<String>,
    /// 是否以无头模式运行
    pub headless: bool,
    /// 窗口宽度
    pub window_width: u32,
    /// 窗口高度
    pub window_height: u32,
    /// 页面加载超时（秒）
    pub page_load_timeout_secs: u64,
    /// 等待元素可点击的超时（秒）
    pub element_wait_secs: u64,
    /// 单个URL的最大加载次数
    pub max_load_attempts: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            remote_debugging_url: None,
            headless: true,
            window_width: 1920,
            window_height: 600,
            page_load_timeout_secs: 25,
            element_wait_secs: 5,
            max_load_attempts: 3,
        }
    }
}

impl BrowserSettings {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_secs(self.element_wait_secs)
    }
}

/// 搜索过滤器配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub skip_market: bool,
    pub skip_location: bool,
    pub skip_raised: bool,
    pub skip_stage: bool,
    pub skip_signal: bool,
    pub skip_featured: bool,
    /// 行业标签文件，每行一个标签
    pub market_label_file: Option<PathBuf>,
    /// 地区过滤值，形如 `1688-United+States`
    pub locations: Vec<String>,
    /// 融资阶段过滤值
    pub stages: Vec<String>,
    /// 融资金额区间
    pub raised_ranges: Vec<(u64, u64)>,
    /// 信号分区间
    pub signal_ranges: Vec<(u32, u32)>,
    /// 关闭信号分过滤时使用的唯一区间
    pub fallback_signal_range: (u32, u32),
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            skip_market: true,
            skip_location: false,
            skip_raised: false,
            skip_stage: false,
            skip_signal: false,
            skip_featured: false,
            market_label_file: None,
            locations: [
                "1688-United+States",
                "1624-California",
                "1664-New+York+City",
                "153509-Asia",
                "1642-Europe",
                "1695-London,+GB",
                "1681-Silicon+Valley",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            stages: [
                "Series+A", "Series+B", "Acquired", "Series+C", "Series+D", "Seed", "IPO",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            raised_ranges: vec![
                (0, 1),
                (1, 400_000),
                (400_000, 10_000_000),
                (1_000_000, 1_500_000),
                (1_500_000, 2_000_000),
                (2_000_000, 2_500_000),
                (2_500_000, 3_500_000),
                (3_500_000, 5_500_000),
                (5_500_000, 8_500_000),
                (8_500_000, 12_000_000),
                (12_000_000, 20_000_000),
                (20_000_000, 30_000_000),
                (30_000_000, 50_000_000),
                (50_000_000, 100_000_000),
                (100_000_000, 1_000_000_000),
                (1_000_000_000, 1_000_000_000_000_000),
            ],
            // Highest scores first
            signal_ranges: (0..10).rev().map(|i| (i, i + 1)).collect(),
            fallback_signal_range: (7, 8),
        }
    }
}

/// 搜索空间枚举配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnumerationSettings {
    /// 复用已有的URL列表，跳过枚举
    pub reuse_url_list: bool,
    /// 指定要复用的URL列表文件，默认取当天的列表
    pub url_list_file: Option<PathBuf>,
    /// 站点单次查询最多展示的结果数
    pub page_size_ceiling: u64,
}

impl Default for EnumerationSettings {
    fn default() -> Self {
        Self {
            reuse_url_list: false,
            url_list_file: None,
            page_size_ceiling: 400,
        }
    }
}

/// 分页配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    /// 每次点击"加载更多"大约新增的行数
    pub rows_per_click: u64,
    /// 点击上限的余量
    pub click_slack: u64,
    /// 点击后检查行数增长的次数
    pub growth_poll_attempts: u32,
    /// 两次检查之间的间隔（毫秒）
    pub growth_poll_interval_ms: u64,
    /// 随机打乱查询顺序，便于从不同位置续跑
    pub shuffle_queries: bool,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            rows_per_click: 20,
            click_slack: 2,
            growth_poll_attempts: 10,
            growth_poll_interval_ms: 500,
            shuffle_queries: true,
        }
    }
}

impl PaginationSettings {
    pub fn growth_poll_interval(&self) -> Duration {
        Duration::from_millis(self.growth_poll_interval_ms)
    }
}

/// 详情页配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetailSettings {
    /// 是否访问详情页
    pub visit: bool,
    /// 忽略缓存，强制重新下载
    pub redownload: bool,
}

impl Default for DetailSettings {
    fn default() -> Self {
        Self {
            visit: true,
            redownload: false,
        }
    }
}

/// 输出配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// 输出根目录
    pub root: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./output"),
        }
    }
}

/// 节奏控制配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    /// 实际等待时长 = 采样时长 × time_scale，0 表示不等待
    pub time_scale: f64,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self { time_scale: 1.0 }
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `DIRCRAWL__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            .set_default("output.root", "./output")?
            .set_default("browser.page_load_timeout_secs", 25)?
            .set_default("browser.max_load_attempts", 3)?
            .set_default("detail.visit", true)?
            .set_default("pacing.time_scale", 1.0)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("DIRCRAWL").separator("__"));

        builder.build()?.try_deserialize()
    }
}
