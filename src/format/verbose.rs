//! # 详细记录
//!
//! HTTP 类别输出完整的请求/响应分节，每行以着色后的节点名开头；其余类别输出单行。

use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_with::{DurationNanoSeconds, serde_as};

use super::short::CallStatsRecord;
use super::styler::{Style, Styler};
use super::units::{format_duration, format_ibytes, format_time, round_to_micros, status_text};
use crate::trace::{HeaderMultiMap, HttpDetail, TraceEvent};

const HOST_HEADER: &str = "Host";

/// 请求信息（结构化输出）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord<'a> {
    pub time: DateTime<Utc>,
    pub proto: &'a str,
    pub method: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub path: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub raw_query: &'a str,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<&'a str, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
}

/// 响应信息（结构化输出）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord<'a> {
    pub time: DateTime<Utc>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<&'a str, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub status_code: u16,
}

/// 详细记录的结构化形式
#[serde_as]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerboseTrace<'a> {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub category: &'static str,
    pub host: &'a str,
    #[serde(rename = "api")]
    pub func_name: &'a str,
    pub time: DateTime<Utc>,
    #[serde_as(as = "DurationNanoSeconds<u64>")]
    pub duration: Duration,
    pub path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestRecord<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseRecord<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_stats: Option<CallStatsRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heal_result: Option<&'a serde_json::Value>,
}

impl<'a> VerboseTrace<'a> {
    #[must_use]
    pub fn new(event: &'a TraceEvent) -> Self {
        let mut verbose = Self {
            status: "success",
            category: event.category().as_str(),
            host: &event.node_name,
            func_name: &event.func_name,
            time: event.time,
            duration: event.duration,
            path: &event.path,
            error: event.error.as_deref().filter(|e| !e.is_empty()),
            message: event.message.as_deref().filter(|m| !m.is_empty()),
            request: None,
            response: None,
            call_stats: None,
            heal_result: event.heal_result.as_ref(),
        };

        if let Some(http) = event.http() {
            let rq = &http.request;
            let rs = &http.response;
            verbose.request = Some(RequestRecord {
                time: rq.time,
                proto: &rq.proto,
                method: &rq.method,
                path: &rq.path,
                raw_query: &rq.raw_query,
                headers: flatten_headers(&rq.headers),
                body: String::from_utf8_lossy(&rq.body).into_owned(),
            });
            verbose.response = Some(ResponseRecord {
                time: rs.time,
                headers: flatten_headers(&rs.headers),
                body: String::from_utf8_lossy(&rs.body).into_owned(),
                status_code: rs.status_code,
            });
            verbose.call_stats = Some(CallStatsRecord::new(http, event.duration));
        }
        verbose
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(value: &u16) -> bool {
    *value == 0
}

/// 多值头部压平为 `name → 以空格连接的值`
fn flatten_headers(headers: &HeaderMultiMap) -> IndexMap<&str, String> {
    headers
        .iter()
        .map(|(name, values)| (name.as_str(), values.join(" ")))
        .collect()
}

/// 渲染为多行文本块（不含结尾换行）
#[must_use]
pub fn render_text(event: &TraceEvent, styler: &Styler) -> String {
    let node = if event.node_name.is_empty() {
        String::new()
    } else {
        format!("{} ", styler.node(&event.node_name))
    };

    match event.http() {
        Some(http) => render_http(event, http, &node, styler),
        None => {
            let category = event.category().as_str().to_uppercase();
            let mut line = format!(
                "{node}{} [{}] {}",
                styler.paint(Style::Request, &format!("[{category} {}]", event.func_name)),
                format_time(&event.time),
                event.path
            );
            if let Some(error) = event.error.as_deref().filter(|e| !e.is_empty()) {
                line.push_str(&format!(" err='{}'", styler.paint(Style::ErrStatus, error)));
            }
            line.push_str(&format!(" {}", format_duration(event.duration)));
            line
        }
    }
}

fn render_http(event: &TraceEvent, http: &HttpDetail, node: &str, styler: &Styler) -> String {
    let rq = &http.request;
    let rs = &http.response;
    let mut lines = Vec::new();

    lines.push(format!(
        "{node}{}[{}] {}",
        styler.paint(Style::Request, &format!("[REQUEST {}] ", event.func_name)),
        format_time(&rq.time),
        styler.paint(Style::Host, &format!("[Client IP: {}]", rq.client))
    ));

    let mut request_line = styler.paint(Style::Method, &format!("{} {}", rq.method, rq.path));
    if !rq.raw_query.is_empty() {
        request_line.push_str(&format!("?{}", rq.raw_query));
    }
    lines.push(format!("{node}{request_line}"));
    lines.push(format!("{node}{}", styler.paint(Style::Method, &format!("Proto: {}", rq.proto))));

    // Host 单独成行，不再出现在通用请求头中
    let host = rq
        .headers
        .get(HOST_HEADER)
        .map(|values| values.concat())
        .unwrap_or_default();
    lines.push(format!("{node}{}", styler.paint(Style::Host, &format!("Host: {host}"))));
    for (name, values) in rq.headers.iter().filter(|(name, _)| name.as_str() != HOST_HEADER) {
        lines.push(format!(
            "{node}{}{}",
            styler.paint(Style::ReqHeaderKey, &format!("{name}: ")),
            styler.paint(Style::HeaderValue, &values.concat())
        ));
    }
    lines.push(format!("{node}{}", styler.paint(Style::Body, &String::from_utf8_lossy(&rq.body))));

    lines.push(format!(
        "{node}{}[{}] {}",
        styler.paint(Style::Response, "[RESPONSE] "),
        format_time(&rs.time),
        styler.paint(
            Style::Stat,
            &format!(
                "[ Duration {:>2}  ↑ {}  ↓ {} ]",
                format_duration(round_to_micros(http.stats.latency)),
                format_ibytes(http.stats.input_bytes),
                format_ibytes(http.stats.output_bytes)
            )
        )
    ));

    let status = format!("{} {}", rs.status_code, status_text(rs.status_code));
    let status = if rs.status_code == 200 {
        styler.paint(Style::RespStatus, &status)
    } else {
        styler.paint(Style::ErrStatus, &status)
    };
    lines.push(format!("{node}{status}"));

    for (name, values) in &rs.headers {
        lines.push(format!(
            "{node}{}{}",
            styler.paint(Style::RespHeaderKey, &format!("{name}: ")),
            styler.paint(Style::HeaderValue, &values.join(","))
        ));
    }
    lines.push(format!("{node}{}", styler.paint(Style::Body, &String::from_utf8_lossy(&rs.body))));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TraceEventFixture;
    use pretty_assertions::assert_eq;

    fn sample() -> TraceEvent {
        TraceEventFixture::s3()
            .func("s3.GetObject")
            .node("node1")
            .method("GET")
            .path("/bucket/obj")
            .query("partNumber=1")
            .client("10.0.0.1")
            .request_header("Host", "minio.local:9000")
            .request_header("X-Amz-Request-Id", "abc")
            .response_header("Content-Length", "5")
            .response_header("Vary", "Origin")
            .response_header("Vary", "Accept-Encoding")
            .response_body("hello")
            .status(200)
            .build()
    }

    #[test]
    fn host_header_gets_its_own_line() {
        let event = sample();
        let text = render_text(&event, &Styler::plain());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[1], "node1 GET /bucket/obj?partNumber=1");
        assert_eq!(lines[2], "node1 Proto: HTTP/1.1");
        assert_eq!(lines[3], "node1 Host: minio.local:9000");
        assert_eq!(lines[4], "node1 X-Amz-Request-Id: abc");
        assert_eq!(lines.iter().filter(|l| l.contains("Host:")).count(), 1);
        // 源事件保持不变
        assert!(event.http().unwrap().request.headers.contains_key("Host"));
    }

    #[test]
    fn response_section() {
        let text = render_text(&sample(), &Styler::plain());
        assert!(text.contains("node1 [RESPONSE] ["));
        assert!(text.contains("node1 200 OK\n"));
        assert!(text.contains("node1 Vary: Origin,Accept-Encoding\n"));
        assert!(text.ends_with("node1 hello"));
        assert!(text.lines().all(|line| line.starts_with("node1 ")));
    }

    #[test]
    fn non_200_status_is_error_colored() {
        let event = TraceEventFixture::s3().status(206).build();
        let text = render_text(&event, &Styler::new(true));
        assert!(text.contains("\x1b[1m\x1b[31m206 Partial Content\x1b[0m"));
    }

    #[test]
    fn empty_node_has_no_prefix() {
        let event = TraceEventFixture::s3().node("").build();
        let text = render_text(&event, &Styler::plain());
        assert!(text.starts_with("[REQUEST "));
    }

    #[test]
    fn non_http_single_line() {
        let event = TraceEventFixture::healing()
            .func("heal.Object")
            .node("node3")
            .path("/bucket/obj")
            .error("quorum lost")
            .duration_ms(3)
            .build();
        let text = render_text(&event, &Styler::plain());
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("node3 [HEALING heal.Object] ["));
        assert!(text.ends_with("/bucket/obj err='quorum lost' 3ms"));
    }

    #[test]
    fn structured_verbose_record() {
        let event = sample();
        let value = serde_json::to_value(VerboseTrace::new(&event)).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["type"], "S3");
        assert_eq!(value["request"]["method"], "GET");
        assert_eq!(value["request"]["rawQuery"], "partNumber=1");
        assert_eq!(value["request"]["headers"]["Host"], "minio.local:9000");
        assert_eq!(value["response"]["headers"]["Vary"], "Origin Accept-Encoding");
        assert_eq!(value["response"]["body"], "hello");
        assert_eq!(value["response"]["statusCode"], 200);
        assert!(value["callStats"].get("timeToFirstByte").is_some());
    }

    #[test]
    fn structured_verbose_without_http() {
        let event = TraceEventFixture::healing()
            .heal_result(serde_json::json!({"bucket": "b", "object": "o"}))
            .build();
        let value = serde_json::to_value(VerboseTrace::new(&event)).unwrap();
        assert_eq!(value["healResult"]["bucket"], "b");
        assert!(value.get("request").is_none());
        assert!(value.get("callStats").is_none());
    }
}
