// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// - 领域模型（models）：查询、行记录
/// - 服务（services）：节奏控制、枚举、分页、行提取、详情页
pub mod models;
pub mod services;
