// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Local, NaiveDate};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::models::query::{Query, SortKey};
use crate::utils::url_utils::url_to_file_name;

/// 输出目录布局
///
/// ```text
/// <root>/url_lists/url_list_<date>.csv
/// <root>/results/<fname>_sort=<key>_click=<n>.csv
/// <root>/company_pages/<url-name>.html (+ .txt)
/// <root>/index_pages/<url-name>_click_<n>.html
/// <root>/debug/failed_<timestamp>.html
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_lists_dir(&self) -> PathBuf {
        self.root.join("url_lists")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root.join("results")
    }

    pub fn company_pages_dir(&self) -> PathBuf {
        self.root.join("company_pages")
    }

    pub fn index_pages_dir(&self) -> PathBuf {
        self.root.join("index_pages")
    }

    pub fn debug_dir(&self) -> PathBuf {
        self.root.join("debug")
    }

    /// 创建所有输出目录
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [
            self.root.clone(),
            self.url_lists_dir(),
            self.results_dir(),
            self.company_pages_dir(),
            self.index_pages_dir(),
            self.debug_dir(),
        ] {
            fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }

    pub fn url_list_file(&self, date: NaiveDate) -> PathBuf {
        self.url_lists_dir()
            .join(format!("url_list_{}.csv", date.format("%Y-%m-%d")))
    }

    /// 分页步骤的输出文件，存在即表示该步骤已完成
    pub fn step_file(&self, query: &Query, sort: SortKey, click: u32) -> PathBuf {
        self.results_dir().join(query.step_file_name(sort, click))
    }

    pub fn detail_page_file(&self, detail_url: &str) -> PathBuf {
        self.company_pages_dir()
            .join(format!("{}.html", url_to_file_name(detail_url)))
    }

    pub fn detail_record_file(&self, detail_url: &str) -> PathBuf {
        self.company_pages_dir()
            .join(format!("{}.txt", url_to_file_name(detail_url)))
    }

    pub fn index_snapshot_file(&self, url: &str, click: u32) -> PathBuf {
        self.index_pages_dir()
            .join(format!("{}_click_{}.html", url_to_file_name(url), click))
    }

    pub fn failed_page_file(&self, at: DateTime<Local>) -> PathBuf {
        self.debug_dir()
            .join(format!("failed_{}.html", at.format("%Y-%m-%d_%H-%M-%S%.6f")))
    }

    /// 保存无法解析的页面，便于事后排查
    pub async fn dump_failed_page(&self, html: &str) -> io::Result<PathBuf> {
        let path = self.failed_page_file(Local::now());
        write_file(&path, html.as_bytes()).await?;
        Ok(path)
    }
}

/// 直接写入文件，必要时创建父目录
pub async fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}

/// 先写临时文件再重命名，目标文件要么不存在，要么是完整内容
pub async fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    write_file(&tmp_path, data).await?;
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    Ok(())
}

/// 读取文件，不存在时返回 `None`
pub async fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read(path).await {
        Ok(data) => Ok(Some(String::from_utf8_lossy(&data).into_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
