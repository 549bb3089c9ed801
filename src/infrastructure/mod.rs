// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 指标（metrics）：Prometheus记录器与快照
/// - 存储（storage）：输出目录布局与原子写入
/// - 表格（tabular）：CSV读写
pub mod metrics;
pub mod storage;
pub mod tabular;
