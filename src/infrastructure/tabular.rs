// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeSet;
use std::path::Path;

use crate::domain::models::query::Query;
use crate::domain::models::record::RowRecord;
use crate::infrastructure::storage::{read_optional, write_atomic};
use crate::utils::errors::CrawlError;

/// 将记录编码为CSV，表头为所有记录字段名的并集（按字典序）
pub fn encode_records(records: &[RowRecord]) -> Result<Vec<u8>, CrawlError> {
    let header: Vec<&str> = records
        .iter()
        .flat_map(|r| r.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    if !header.is_empty() {
        writer.write_record(&header)?;
    }
    for record in records {
        let row: Vec<String> = header
            .iter()
            .map(|key| record.get(key).map(|v| v.to_cell()).unwrap_or_default())
            .collect();
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| CrawlError::Io(e.into_error()))
}

/// 从CSV还原记录，所有值以文本形式读回
pub fn decode_records(data: &[u8]) -> Result<Vec<RowRecord>, CrawlError> {
    let mut reader = csv::Reader::from_reader(data);
    let header = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(RowRecord::from_cells(header.iter(), row.iter()));
    }
    Ok(records)
}

pub fn encode_queries(queries: &[Query]) -> Result<Vec<u8>, CrawlError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for query in queries {
        writer.serialize(query)?;
    }
    writer
        .into_inner()
        .map_err(|e| CrawlError::Io(e.into_error()))
}

pub fn decode_queries(data: &[u8]) -> Result<Vec<Query>, CrawlError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);
    let mut queries = Vec::new();
    for query in reader.deserialize() {
        queries.push(query?);
    }
    Ok(queries)
}

/// 写出一个分页步骤的全部记录
pub async fn write_records(path: &Path, records: &[RowRecord]) -> Result<(), CrawlError> {
    let data = encode_records(records)?;
    write_atomic(path, &data).await?;
    Ok(())
}

pub async fn read_records(path: &Path) -> Result<Vec<RowRecord>, CrawlError> {
    match read_optional(path).await? {
        Some(text) => decode_records(text.as_bytes()),
        None => Ok(Vec::new()),
    }
}

pub async fn write_queries(path: &Path, queries: &[Query]) -> Result<(), CrawlError> {
    let data = encode_queries(queries)?;
    write_atomic(path, &data).await?;
    Ok(())
}

/// 读取URL列表，文件不存在时返回 `None`
pub async fn read_queries(path: &Path) -> Result<Option<Vec<Query>>, CrawlError> {
    match read_optional(path).await? {
        Some(text) => Ok(Some(decode_queries(text.as_bytes())?)),
        None => Ok(None),
    }
}
