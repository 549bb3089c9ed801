// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::SiteSettings;
use crate::domain::models::record::{FieldValue, RowRecord};
use crate::utils::errors::CrawlError;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::ops::Range;

static COUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("valid count regex"));
static NON_NUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\d.]").expect("valid numeric regex"));

/// 行内各字段的选择器
struct FieldSelectors {
    startup_link: Selector,
    signal_badge: Selector,
    joined: Selector,
    location: Selector,
    market: Selector,
    website: Selector,
    size: Selector,
    stage: Selector,
    raised: Selector,
}

impl FieldSelectors {
    fn new() -> Result<Self, CrawlError> {
        Ok(Self {
            startup_link: compile("a.startup-link")?,
            signal_badge: compile("div.column.signal img")?,
            joined: compile("div.column.joined > div.value")?,
            location: compile("div.column.location div.tag")?,
            market: compile("div.column.market div.tag")?,
            website: compile("div.column.website a")?,
            size: compile("div.column.company_size div.value")?,
            stage: compile("div.column.stage div.value")?,
            raised: compile("div.column.raised div.value")?,
        })
    }
}

/// 每行都附带的查询元数据
#[derive(Debug, Clone, Copy)]
pub struct RowContext {
    pub featured: bool,
    pub score: u32,
}

/// 行提取器
///
/// 负责所有HTML解析：结果数量、行数、行字段和详情描述。
/// 选择器匹配不到元素时返回空值而不是错误。
pub struct RowExtractor {
    count: Selector,
    results: Selector,
    row: Selector,
    description: Selector,
    fields: FieldSelectors,
}

impl RowExtractor {
    pub fn new(site: &SiteSettings) -> Result<Self, CrawlError> {
        Ok(Self {
            count: compile(&site.count_selector)?,
            results: compile(&site.results_selector)?,
            row: compile(&site.row_selector)?,
            description: compile(&site.description_selector)?,
            fields: FieldSelectors::new()?,
        })
    }

    /// 搜索页标题中的结果数量
    pub fn result_count(&self, html: &str) -> Option<u64> {
        let document = Html::parse_document(html);
        let heading = document.select(&self.count).next()?;
        parse_count(&element_text(&heading))
    }

    /// 结果列表中的行数，页面上没有结果列表时返回 `None`
    pub fn row_count(&self, html: &str) -> Option<usize> {
        let document = Html::parse_document(html);
        let container = document.select(&self.results).next()?;
        Some(container.select(&self.row).count())
    }

    /// 提取 `range` 范围内的行，不会重复解析范围之前的行
    pub fn extract_rows(&self, html: &str, range: Range<usize>, ctx: RowContext) -> Vec<RowRecord> {
        let document = Html::parse_document(html);
        let Some(container) = document.select(&self.results).next() else {
            return Vec::new();
        };

        container
            .select(&self.row)
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
            .map(|row| self.extract_row(row, ctx))
            .collect()
    }

    fn extract_row(&self, row: ElementRef<'_>, ctx: RowContext) -> RowRecord {
        let f = &self.fields;
        let mut record = RowRecord::new();

        record.insert("featured", ctx.featured);
        record.insert("score", ctx.score as f64);

        if let Some(link) = row.select(&f.startup_link).next() {
            record.insert_opt("title", link.value().attr("title"));
            record.insert_opt("al_link", link.value().attr("href"));
        }
        record.insert_opt(
            "signal",
            row.select(&f.signal_badge)
                .next()
                .and_then(|img| img.value().attr("alt")),
        );

        let joined = first_text(row, &f.joined)
            .and_then(|text| parse_joined_date(&text))
            .map(FieldValue::Date)
            .unwrap_or(FieldValue::Null);
        record.insert("joined_date", joined);

        record.insert_opt("location", first_text(row, &f.location));
        record.insert_opt("market", first_text(row, &f.market));
        record.insert_opt(
            "website",
            row.select(&f.website)
                .next()
                .and_then(|a| a.value().attr("href")),
        );
        record.insert_opt("size", first_text(row, &f.size));
        record.insert_opt("stage", first_text(row, &f.stage));
        record.insert_opt(
            "raised",
            first_text(row, &f.raised).and_then(|text| parse_raised(&text)),
        );

        record
    }

    /// 详情页中的产品描述
    pub fn description(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.description)
            .next()
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty())
    }
}

fn compile(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector)
        .map_err(|e| CrawlError::ExtractionFailed(format!("invalid selector {:?}: {:?}", selector, e)))
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_text(row: ElementRef<'_>, selector: &Selector) -> Option<String> {
    row.select(selector)
        .next()
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
}

/// 解析结果数量，忽略千位分隔符
pub fn parse_count(text: &str) -> Option<u64> {
    let cleaned = text.replace(',', "");
    COUNT_RE
        .captures(&cleaned)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// 解析融资金额：去掉数字和小数点以外的所有字符
pub fn parse_raised(text: &str) -> Option<f64> {
    let digits = NON_NUMERIC_RE.replace_all(text, "");
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// 解析形如 `Jun 13` 的加入日期，取当月第一天
pub fn parse_joined_date(text: &str) -> Option<NaiveDate> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(&format!("1 {}", cleaned), "%d %b %y").ok()
}
