// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// 站点默认排序
    Signal,
    Joined,
    Raised,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Signal, SortKey::Joined, SortKey::Raised];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Signal => "signal",
            SortKey::Joined => "joined",
            SortKey::Raised => "raised",
        }
    }

    pub fn is_default(&self) -> bool {
        *self == SortKey::Signal
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 搜索查询
///
/// 一个完整拼接了过滤器的搜索页URL以及探测得到的元数据，枚举后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// 搜索页URL
    pub url: String,
    /// 结果文件名前缀
    pub fname: String,
    /// 探测到的结果数量
    pub company_count: u64,
    /// 是否带精选过滤
    pub featured: bool,
    /// 信号分区间上限
    pub signal: u32,
}

impl Query {
    /// 需要遍历的排序方式
    ///
    /// 超过站点单次展示上限时，用不同排序对同一结果集多次采样
    pub fn sort_orders(&self, page_size_ceiling: u64) -> Vec<SortKey> {
        if self.company_count > page_size_ceiling {
            SortKey::ALL.to_vec()
        } else {
            vec![SortKey::Signal]
        }
    }

    /// 点击"加载更多"的次数上限
    pub fn click_ceiling(&self, rows_per_click: u64, slack: u64) -> u32 {
        let rows_per_click = rows_per_click.max(1);
        let clicks = (self.company_count / rows_per_click).saturating_add(slack);
        u32::try_from(clicks).unwrap_or(u32::MAX)
    }

    /// 分页步骤的输出文件名
    pub fn step_file_name(&self, sort: SortKey, click: u32) -> String {
        format!("{}_sort={}_click={}.csv", self.fname, sort, click)
    }
}
