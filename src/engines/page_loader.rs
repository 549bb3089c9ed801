// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::pacing::{Pacer, PauseTier};
use crate::engines::traits::{BrowserDriver, EngineError};
use metrics::counter;
use tracing::{error, info};

/// 带重试的页面加载器
#[derive(Debug, Clone)]
pub struct PageLoader {
    max_attempts: u32,
    pacer: Pacer,
}

impl PageLoader {
    pub fn new(max_attempts: u32, pacer: Pacer) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            pacer,
        }
    }

    /// 加载页面
    ///
    /// 超时和其他导航错误同样处理：计数、短暂退避后重试。
    /// 达到上限后关闭驱动并返回 `false`，调用方应视本次会话内该URL不可达。
    pub async fn load(&self, driver: &mut dyn BrowserDriver, url: &str) -> bool {
        let mut attempts = 0;

        while attempts < self.max_attempts {
            match driver.navigate(url).await {
                Ok(()) => {
                    info!("page loaded successfully: {}", url);
                    return true;
                }
                Err(EngineError::NavigationTimeout(_)) => {
                    attempts += 1;
                    error!(engine = driver.name(), "loading page timeout {} attempt {}", url, attempts);
                }
                Err(e) => {
                    attempts += 1;
                    error!(
                        engine = driver.name(),
                        retryable = e.is_retryable(),
                        "loading page error {} attempt {}: {}",
                        url,
                        attempts,
                        e
                    );
                }
            }
            self.pacer.pause(PauseTier::VeryShort).await;
        }

        counter!("dircrawl_page_load_failures_total").increment(1);
        if let Err(e) = driver.close().await {
            error!("failed to close browser after load failure: {}", e);
        }
        error!(
            "loading page failed after {} attempts, now give up: {}",
            self.max_attempts, url
        );
        false
    }
}
