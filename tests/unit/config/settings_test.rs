// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置设置测试模块
///
/// 确保仓库自带的 `config/default.toml` 与代码中的默认值一致

#[cfg(test)]
mod tests {
    use dircrawl::config::settings::Settings;

    #[test]
    fn test_config_loading_from_default_toml() {
        let settings = Settings::new().expect("default configuration should load");
        let defaults = Settings::default();

        assert_eq!(settings.site.root_url, defaults.site.root_url);
        assert_eq!(settings.site.row_selector, defaults.site.row_selector);
        assert_eq!(settings.browser.window_width, 1920);
        assert_eq!(settings.browser.window_height, 600);
        assert_eq!(settings.browser.page_load_timeout_secs, 25);
        assert_eq!(settings.browser.max_load_attempts, 3);
        assert_eq!(settings.enumeration.page_size_ceiling, 400);
        assert_eq!(settings.filters.stages, defaults.filters.stages);
        assert_eq!(settings.filters.raised_ranges, defaults.filters.raised_ranges);
        assert_eq!(settings.filters.signal_ranges, defaults.filters.signal_ranges);
        assert_eq!(settings.pagination.rows_per_click, 20);
        assert!(settings.detail.visit);
    }
}
