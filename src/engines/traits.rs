// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 页面加载超时
    #[error("Navigation timeout: {0}")]
    NavigationTimeout(String),
    /// 元素不存在或不可点击
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    /// 浏览器错误
    #[error("Browser error: {0}")]
    Browser(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::NavigationTimeout(_) => true,
            EngineError::Browser(_) => true,
            EngineError::ElementNotFound(_) => false,
        }
    }
}

/// 可点击元素句柄
///
/// 只记录定位方式，点击时重新定位，避免持有过期的DOM节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub selector: String,
}

impl ElementHandle {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

/// 浏览器驱动特质
///
/// 一个驱动对应一个浏览器会话，`close` 之后不应再使用
#[async_trait]
pub trait BrowserDriver: Send {
    /// 打开URL并等待加载完成
    async fn navigate(&mut self, url: &str) -> Result<(), EngineError>;

    /// 当前页面的HTML
    async fn page_source(&mut self) -> Result<String, EngineError>;

    /// 等待元素可点击，超时返回 `ElementNotFound`
    async fn find_clickable(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<ElementHandle, EngineError>;

    /// 点击元素
    async fn click(&mut self, element: &ElementHandle) -> Result<(), EngineError>;

    /// 关闭浏览器会话
    async fn close(&mut self) -> Result<(), EngineError>;

    /// 设置窗口尺寸
    async fn set_window_size(&mut self, width: u32, height: u32) -> Result<(), EngineError>;

    /// 设置页面加载超时
    fn set_page_load_timeout(&mut self, timeout: Duration);

    /// 引擎名称
    fn name(&self) -> &'static str;
}

/// 浏览器启动器特质
///
/// 每次调用返回一个新的、已按配置初始化的驱动
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>, EngineError>;
}
