// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 路径分隔符在文件名中的替代写法
const SLASH_REPLACEMENT: &str = "]]]";

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 将任意URL转换为可用作文件名的字符串
///
/// 同一URL总是得到同一文件名，缓存与快照都依赖这一点。
pub fn url_to_file_name(url: &str) -> String {
    url.replace('/', SLASH_REPLACEMENT)
}

/// 将搜索页URL转换为结果文件名前缀
///
/// 去掉站点根地址，`&` 替换为 `_`，例如
/// `https://angel.co/companies?&stage=Seed` -> `results__stage=Seed`
pub fn query_file_stem(root_url: &str, url: &str) -> String {
    let tail = url.strip_prefix(root_url).unwrap_or(url);
    format!("results_{}", url_to_file_name(&tail.replace('&', "_")))
}
