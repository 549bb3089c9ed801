// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{BrowserDriver, BrowserLauncher, ElementHandle, EngineError};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// 等待元素可点击时的轮询间隔
const CLICKABLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Chromium驱动
///
/// 基于chromiumoxide实现，每个驱动独占一个浏览器会话
pub struct ChromiumDriver {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    page_load_timeout: Duration,
    /// 远程浏览器只关闭页面，不关闭进程
    remote: bool,
}

impl ChromiumDriver {
    fn page(&self) -> Result<&Page, EngineError> {
        self.page
            .as_ref()
            .ok_or_else(|| EngineError::Browser("browser session already closed".to_string()))
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), EngineError> {
        let timeout = self.page_load_timeout;
        let page = self.page()?;

        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(EngineError::Browser(e.to_string())),
            Err(_) => Err(EngineError::NavigationTimeout(url.to_string())),
        }
    }

    async fn page_source(&mut self) -> Result<String, EngineError> {
        self.page()?
            .content()
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))
    }

    async fn find_clickable(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<ElementHandle, EngineError> {
        let page = self.page()?;
        let deadline = Instant::now() + timeout;

        loop {
            if let Ok(element) = page.find_element(selector).await {
                // An element without a clickable point is hidden or zero-sized
                if element.clickable_point().await.is_ok() {
                    return Ok(ElementHandle::new(selector));
                }
            }

            if Instant::now() >= deadline {
                return Err(EngineError::ElementNotFound(selector.to_string()));
            }
            tokio::time::sleep(CLICKABLE_POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<(), EngineError> {
        self.page()?
            .find_element(element.selector.as_str())
            .await
            .map_err(|_| EngineError::ElementNotFound(element.selector.clone()))?
            .click()
            .await
            .map_err(|e| EngineError::Browser(format!("Click failed: {}", e)))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::warn!("Failed to close page: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if !self.remote {
                browser
                    .close()
                    .await
                    .map_err(|e| EngineError::Browser(e.to_string()))?;
                browser
                    .wait()
                    .await
                    .map_err(|e| EngineError::Browser(e.to_string()))?;
            }
        }

        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        tracing::debug!("Browser session closed");
        Ok(())
    }

    async fn set_window_size(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        let params = SetDeviceMetricsOverrideParams::new(width as i64, height as i64, 1.0, false);
        self.page()?
            .execute(params)
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;
        Ok(())
    }

    fn set_page_load_timeout(&mut self, timeout: Duration) {
        self.page_load_timeout = timeout;
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        // The handler task keeps the CDP connection alive
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}

/// Chromium启动器
pub struct ChromiumLauncher {
    settings: BrowserSettings,
}

impl ChromiumLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>, EngineError> {
        let remote = self.settings.remote_debugging_url.is_some();

        let (browser, mut handler) = if let Some(ref url) = self.settings.remote_debugging_url {
            tracing::info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url.as_str())
                .await
                .map_err(|e| EngineError::Browser(format!("Failed to connect to remote Chrome: {}", e)))?
        } else {
            tracing::info!("Launching local Chrome instance");
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .window_size(self.settings.window_width, self.settings.window_height)
                .request_timeout(self.settings.page_load_timeout())
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage");
            if !self.settings.headless {
                builder = builder.with_head();
            }

            Browser::launch(builder.build().map_err(EngineError::Browser)?)
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?
        };

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        let mut driver = ChromiumDriver {
            browser: Some(browser),
            page: Some(page),
            handler_task: Some(handler_task),
            page_load_timeout: self.settings.page_load_timeout(),
            remote,
        };
        driver.set_page_load_timeout(self.settings.page_load_timeout());
        driver
            .set_window_size(self.settings.window_width, self.settings.window_height)
            .await?;

        Ok(Box::new(driver))
    }
}
