//! # 单行摘要
//!
//! 每个事件一行：HTTP 类别带状态、客户端地址与上传/下载字节数，其余类别只输出精简行。

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_with::{DurationNanoSeconds, serde_as};

use super::styler::{Style, Styler};
use super::units::{format_duration, format_ibytes, format_time, round_to_micros, status_text};
use crate::trace::{HttpDetail, TraceEvent};

/// 客户端地址列宽
const CLIENT_COLUMN_WIDTH: usize = 15;
/// 耗时列宽
const DURATION_COLUMN_WIDTH: usize = 12;

/// 调用统计（结构化输出）
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallStatsRecord {
    pub rx: u64,
    pub tx: u64,
    #[serde_as(as = "DurationNanoSeconds<u64>")]
    pub duration: Duration,
    #[serde(rename = "timeToFirstByte")]
    #[serde_as(as = "DurationNanoSeconds<u64>")]
    pub ttfb: Duration,
}

impl CallStatsRecord {
    pub(crate) const fn new(http: &HttpDetail, duration: Duration) -> Self {
        Self {
            rx: http.stats.input_bytes,
            tx: http.stats.output_bytes,
            duration,
            ttfb: http.stats.time_to_first_byte,
        }
    }
}

/// 单行摘要的结构化形式
#[serde_as]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortTrace<'a> {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub category: &'static str,
    pub host: &'a str,
    pub time: DateTime<Utc>,
    pub client: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_stats: Option<CallStatsRecord>,
    #[serde_as(as = "DurationNanoSeconds<u64>")]
    pub duration: Duration,
    #[serde(rename = "api")]
    pub func_name: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    pub status_code: u16,
    pub status_msg: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl<'a> ShortTrace<'a> {
    #[must_use]
    pub fn new(event: &'a TraceEvent) -> Self {
        let mut short = Self {
            status: "success",
            category: event.category().as_str(),
            host: &event.node_name,
            time: event.time,
            client: "",
            call_stats: None,
            duration: event.duration,
            func_name: &event.func_name,
            path: &event.path,
            query: "",
            status_code: 0,
            status_msg: event.message.as_deref().unwrap_or(""),
            error: event.error.as_deref().filter(|e| !e.is_empty()),
        };

        if let Some(http) = event.http() {
            short.query = &http.request.raw_query;
            short.status_code = http.response.status_code;
            short.status_msg = status_text(http.response.status_code);
            short.client = &http.request.client;
            short.call_stats = Some(CallStatsRecord::new(http, http.stats.latency));
        }
        short
    }
}

/// 渲染为文本行
#[must_use]
pub fn render_text(event: &TraceEvent, styler: &Styler) -> String {
    let mut b = String::new();
    let host = if event.node_name.is_empty() {
        String::new()
    } else {
        styler.node(&event.node_name)
    };
    let _ = write!(b, "{} ", format_time(&event.time));

    let Some(http) = event.http() else {
        let category = event.category().as_str().to_uppercase();
        let _ = write!(
            b,
            "[{}] {} {} {}",
            styler.paint(Style::RespStatus, &category),
            styler.paint(Style::FuncName, &event.func_name),
            host,
            event.path
        );
        if let Some(error) = event.error.as_deref().filter(|e| !e.is_empty()) {
            let _ = write!(b, " err='{}'", styler.paint(Style::ErrStatus, error));
        }
        let duration = format_duration(round_to_micros(event.duration));
        let _ = write!(b, " {}", styler.paint(Style::HeaderValue, &duration));
        return b;
    };

    let code = http.response.status_code;
    let status = format!("{code} {}", status_text(code));
    let status = if code >= 400 {
        styler.paint(Style::ErrStatus, &status)
    } else {
        styler.paint(Style::RespStatus, &status)
    };
    let _ = write!(b, "[{status}] {} ", styler.paint(Style::FuncName, &event.func_name));
    let _ = write!(b, "{host}{}", event.path);
    if !http.request.raw_query.is_empty() {
        let _ = write!(b, "?{} ", http.request.raw_query);
    }

    let client = &http.request.client;
    let _ = write!(b, " {client} ");
    pad(&mut b, CLIENT_COLUMN_WIDTH, client.len());

    let duration = format!("{:>2}", format_duration(round_to_micros(http.stats.latency)));
    let _ = write!(b, "{}", styler.paint(Style::HeaderValue, &format!("  {duration}")));
    pad(&mut b, DURATION_COLUMN_WIDTH, duration.len());

    let _ = write!(
        b,
        "{}{}{}{}",
        styler.paint(Style::Stat, " ↑ "),
        styler.paint(Style::HeaderValue, &format_ibytes(http.stats.input_bytes)),
        styler.paint(Style::Stat, " ↓ "),
        styler.paint(Style::HeaderValue, &format_ibytes(http.stats.output_bytes)),
    );
    b
}

/// 按字节宽度补齐到列宽，至少一个空格
fn pad(b: &mut String, width: usize, used: usize) {
    let spaces = width.saturating_sub(used).max(1);
    b.extend(std::iter::repeat_n(' ', spaces));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TraceEventFixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn error_status_uses_error_color() {
        let event = TraceEventFixture::s3().status(503).build();
        let line = render_text(&event, &Styler::new(true));
        assert!(line.contains("[\x1b[1m\x1b[31m503 Service Unavailable\x1b[0m]"));
    }

    #[test]
    fn success_status_uses_success_color() {
        let event = TraceEventFixture::s3().status(200).build();
        let line = render_text(&event, &Styler::new(true));
        assert!(line.contains("[\x1b[1m\x1b[33m200 OK\x1b[0m]"));
    }

    #[test]
    fn http_line_layout() {
        let event = TraceEventFixture::s3()
            .func("s3.GetObject")
            .node("node1")
            .path("/bucket/obj")
            .query("versionId=1")
            .client("10.0.0.1")
            .latency_micros(12_345)
            .bytes(1_024, 1_258_291)
            .build();
        let line = render_text(&event, &Styler::plain());
        let (_, rest) = line.split_once(' ').unwrap();
        assert_eq!(
            rest,
            "[200 OK] s3.GetObject node1/bucket/obj?versionId=1  10.0.0.1          12.345ms     ↑ 1.0 KiB ↓ 1.2 MiB"
        );
    }

    #[test]
    fn column_padding_counts_bytes() {
        let event = TraceEventFixture::s3().latency_micros(850).build();
        let line = render_text(&event, &Styler::plain());
        assert!(line.contains(&format!("  850µs{}↑ 0 B", " ".repeat(7))), "{line}");
    }

    #[test]
    fn non_http_line_has_no_byte_stats() {
        let event = TraceEventFixture::storage()
            .func("storage.ReadAll")
            .node("node2")
            .path("/disk1/bucket/obj/xl.meta")
            .error("file not found")
            .duration_micros(850)
            .build();
        let line = render_text(&event, &Styler::plain());
        let (_, rest) = line.split_once(' ').unwrap();
        assert_eq!(
            rest,
            "[STORAGE] storage.ReadAll node2 /disk1/bucket/obj/xl.meta err='file not found' 850µs"
        );
        assert!(!line.contains('↑'));
    }

    #[test]
    fn structured_short_record() {
        let event = TraceEventFixture::s3()
            .func("s3.PutObject")
            .node("node1")
            .status(404)
            .client("10.0.0.7")
            .bytes(10, 20)
            .build();
        let value = serde_json::to_value(ShortTrace::new(&event)).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["type"], "S3");
        assert_eq!(value["api"], "s3.PutObject");
        assert_eq!(value["host"], "node1");
        assert_eq!(value["statusCode"], 404);
        assert_eq!(value["statusMsg"], "Not Found");
        assert_eq!(value["client"], "10.0.0.7");
        assert_eq!(value["callStats"]["rx"], 10);
        assert_eq!(value["callStats"]["tx"], 20);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn structured_short_record_without_http() {
        let event = TraceEventFixture::scanner().message("scanned 42 objects").build();
        let value = serde_json::to_value(ShortTrace::new(&event)).unwrap();
        assert_eq!(value["type"], "Scanner");
        assert_eq!(value["statusMsg"], "scanned 42 objects");
        assert_eq!(value["statusCode"], 0);
        assert!(value.get("callStats").is_none());
    }
}
