// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理站点、浏览器、过滤器、分页、输出等配置
pub mod settings;
