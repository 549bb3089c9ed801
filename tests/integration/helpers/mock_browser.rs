// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use dircrawl::engines::traits::{BrowserDriver, BrowserLauncher, ElementHandle, EngineError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LOAD_MORE: &str = ".more";

/// 脚本化的站点内容
#[derive(Debug, Default)]
pub struct ScriptedSite {
    /// 搜索页URL -> 结果数量标题，不在表中的搜索页没有标题
    pub counts: HashMap<String, u64>,
    /// 第 n 次点击后结果列表中的行数（含表头行），超出部分取最后一项
    pub row_totals: Vec<usize>,
    /// "加载更多"在点击次数小于该值时可用
    pub load_more_clicks: usize,
    /// URL -> 剩余的失败次数
    pub failing_urls: HashMap<String, u32>,
    /// 详情页URL -> HTML
    pub detail_pages: HashMap<String, String>,
    /// 搜索页不渲染结果列表
    pub missing_results: bool,
    /// 找不到的控件选择器
    pub hidden_controls: HashSet<String>,
    /// 能找到但点击失败的控件选择器
    pub broken_controls: HashSet<String>,
}

/// 浏览器操作记录
#[derive(Debug, Default, Clone)]
pub struct BrowserLog {
    pub launches: usize,
    pub navigations: Vec<String>,
    pub clicks: Vec<String>,
    pub closes: usize,
}

impl BrowserLog {
    pub fn load_more_clicks(&self) -> usize {
        self.clicks.iter().filter(|c| c.as_str() == LOAD_MORE).count()
    }
}

/// 内存中的浏览器，所有驱动共享同一份站点和记录
#[derive(Clone, Default)]
pub struct MockBrowser {
    site: Arc<Mutex<ScriptedSite>>,
    log: Arc<Mutex<BrowserLog>>,
}

impl MockBrowser {
    pub fn new(site: ScriptedSite) -> Self {
        Self {
            site: Arc::new(Mutex::new(site)),
            log: Arc::new(Mutex::new(BrowserLog::default())),
        }
    }

    pub fn log(&self) -> BrowserLog {
        self.log.lock().unwrap().clone()
    }

    pub fn driver(&self) -> MockDriver {
        MockDriver {
            browser: self.clone(),
            current_url: None,
            clicks: 0,
        }
    }
}

#[async_trait]
impl BrowserLauncher for MockBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>, EngineError> {
        self.log.lock().unwrap().launches += 1;
        Ok(Box::new(self.driver()))
    }
}

pub struct MockDriver {
    browser: MockBrowser,
    current_url: Option<String>,
    clicks: usize,
}

impl MockDriver {
    fn load_more_available(&self) -> bool {
        self.clicks < self.browser.site.lock().unwrap().load_more_clicks
    }

    fn render(&self) -> String {
        let site = self.browser.site.lock().unwrap();
        let Some(url) = &self.current_url else {
            return "<html><body></body></html>".to_string();
        };
        if let Some(page) = site.detail_pages.get(url) {
            return page.clone();
        }

        let heading = site
            .counts
            .get(url)
            .map(|count| format!(r#"<div class="top"><div class="count">{} Companies</div></div>"#, count))
            .unwrap_or_default();
        if site.missing_results {
            return format!("<html><body>{}</body></html>", heading);
        }

        let total = site
            .row_totals
            .get(self.clicks)
            .or_else(|| site.row_totals.last())
            .copied()
            .unwrap_or(1);
        let mut rows = String::from(r#"<div data-_tn="companies/row"><div class="column">Header</div></div>"#);
        for i in 1..total {
            rows.push_str(&company_row(i));
        }
        format!(
            r#"<html><body>{}<div class="results">{}</div></body></html>"#,
            heading, rows
        )
    }
}

/// 第 `i` 行的HTML，链接为 `/company-{i}`
pub fn company_row(i: usize) -> String {
    format!(
        r#"<div data-_tn="companies/row">
             <a class="startup-link" title="Company {i}" href="/company-{i}">Company {i}</a>
             <div class="column signal"><img alt="3.{i}"></div>
             <div class="column stage"><div class="value">Seed</div></div>
             <div class="column raised"><div class="value">${i},000</div></div>
           </div>"#
    )
}

/// 带描述的详情页
pub fn detail_page(desc: &str) -> String {
    format!(
        r#"<html><body><div class="product_desc"><div class="content">{}</div></div></body></html>"#,
        desc
    )
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), EngineError> {
        self.browser.log.lock().unwrap().navigations.push(url.to_string());
        {
            let mut site = self.browser.site.lock().unwrap();
            if let Some(remaining) = site.failing_urls.get_mut(url) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(EngineError::NavigationTimeout(url.to_string()));
                }
            }
        }
        self.current_url = Some(url.to_string());
        self.clicks = 0;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, EngineError> {
        Ok(self.render())
    }

    async fn find_clickable(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<ElementHandle, EngineError> {
        if selector == LOAD_MORE && !self.load_more_available() {
            return Err(EngineError::ElementNotFound(selector.to_string()));
        }
        if self.browser.site.lock().unwrap().hidden_controls.contains(selector) {
            return Err(EngineError::ElementNotFound(selector.to_string()));
        }
        Ok(ElementHandle::new(selector))
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<(), EngineError> {
        if self.browser.site.lock().unwrap().broken_controls.contains(&element.selector) {
            return Err(EngineError::Browser(format!("{} is not clickable", element.selector)));
        }
        if element.selector == LOAD_MORE {
            if !self.load_more_available() {
                return Err(EngineError::ElementNotFound(element.selector.clone()));
            }
            self.clicks += 1;
        }
        self.browser.log.lock().unwrap().clicks.push(element.selector.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.browser.log.lock().unwrap().closes += 1;
        Ok(())
    }

    async fn set_window_size(&mut self, _width: u32, _height: u32) -> Result<(), EngineError> {
        Ok(())
    }

    fn set_page_load_timeout(&mut self, _timeout: Duration) {}

    fn name(&self) -> &'static str {
        "mock"
    }
}
