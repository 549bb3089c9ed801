// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use dircrawl::utils::telemetry;

    #[test]
    fn test_telemetry_initialization() {
        // 初始化遥测系统
        telemetry::init_telemetry();

        tracing::debug!("This is a debug message");
        tracing::info!(url = "https://angel.co/companies?", click = 3, "structured message");
        tracing::error!(error = "Test error", "Operation failed");
    }
}
