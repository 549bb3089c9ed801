// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 搜索查询（query）：带过滤器的搜索页URL及其元数据、排序方式
/// - 行记录（record）：从结果行提取出的字段映射
pub mod query;
pub mod record;
