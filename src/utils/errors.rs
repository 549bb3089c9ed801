// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::engines::traits::EngineError;

/// 爬取流程错误类型
///
/// 只有初始化阶段（配置、输出目录、选择器编译、URL列表读写）的错误会向上传播；
/// 单个页面或步骤的失败在本地记录日志后降级处理。
#[derive(Error, Debug)]
pub enum CrawlError {
    /// 浏览器引擎错误
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// 页面内容提取失败
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV读写错误
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON序列化错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(String),
}

impl CrawlError {
    /// 判断错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            CrawlError::Engine(e) => e.is_retryable(),
            _ => false,
        }
    }
}
