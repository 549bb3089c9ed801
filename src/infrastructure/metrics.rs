// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use tracing::{info, warn};

use crate::infrastructure::storage::write_atomic;

/// 安装Prometheus记录器并登记所有计数器
///
/// 爬虫没有常驻服务，运行结束时把快照写到输出目录
pub fn init_metrics() -> Option<PrometheusHandle> {
    let handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
            return None;
        }
    };

    describe_counter!("dircrawl_probes_total", "Search pages probed for a result count");
    describe_counter!("dircrawl_empty_probes_total", "Probes that found no results");
    describe_counter!("dircrawl_page_load_failures_total", "URLs given up after all load attempts");
    describe_counter!("dircrawl_steps_written_total", "Pagination step files written");
    describe_counter!("dircrawl_steps_skipped_total", "Pagination steps skipped because the file existed");
    describe_counter!("dircrawl_detail_downloads_total", "Detail pages downloaded");
    describe_counter!("dircrawl_detail_cache_hits_total", "Detail pages served from the page cache");

    Some(handle)
}

/// 写出当前指标快照（Prometheus文本格式）
pub async fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> std::io::Result<()> {
    write_atomic(path, handle.render().as_bytes()).await?;
    info!("Metrics snapshot written to {}", path.display());
    Ok(())
}
