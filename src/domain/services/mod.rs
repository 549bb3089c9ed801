// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 节奏控制（pacing）：分级随机等待和按概率抽取等级
/// - 搜索空间枚举（enumerator）：过滤器组合、数量探测与细分
/// - 分页（paginator）："加载更多"状态机，可续跑
/// - 行提取（row_extractor）：所有HTML解析
/// - 详情页（detail_fetcher）：带缓存的详情页下载与描述提取
pub mod detail_fetcher;
pub mod enumerator;
pub mod pacing;
pub mod paginator;
pub mod row_extractor;
