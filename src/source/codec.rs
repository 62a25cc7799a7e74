//! # 追踪记录解码
//!
//! 线上格式为逐行 JSON，每行一条追踪记录。空行与 `{}` 保活行被跳过。
//! `type` 既可以是类别位，也可以是类别名称；请求/响应体为 base64 编码。

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_with::{DurationNanoSeconds, serde_as};
use tokio_util::codec::Decoder;

use crate::error::{Result, TraceError};
use crate::trace::{
    CallStats, HeaderMultiMap, HttpDetail, RequestInfo, ResponseInfo, TraceCategory, TraceEvent,
    TraceKind,
};

/// 线上类别字段
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireCategory {
    Bit(u64),
    Name(String),
}

impl Default for WireCategory {
    fn default() -> Self {
        Self::Bit(0)
    }
}

impl WireCategory {
    fn resolve(&self) -> TraceCategory {
        match self {
            Self::Bit(bit) => TraceCategory::from_bit(*bit),
            Self::Name(name) => TraceCategory::from_name(name),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WireRequest {
    #[serde(default)]
    time: Option<DateTime<Utc>>,
    #[serde(default)]
    proto: String,
    #[serde(default)]
    method: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    rawquery: String,
    #[serde(default)]
    headers: Option<HeaderMultiMap>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    client: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireResponse {
    #[serde(default)]
    time: Option<DateTime<Utc>>,
    #[serde(default)]
    headers: Option<HeaderMultiMap>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    statuscode: u16,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
struct WireStats {
    #[serde(default)]
    inputbytes: u64,
    #[serde(default)]
    outputbytes: u64,
    #[serde_as(as = "DurationNanoSeconds<u64>")]
    #[serde(default)]
    latency: Duration,
    #[serde_as(as = "DurationNanoSeconds<u64>")]
    #[serde(default)]
    timetofirstbyte: Duration,
}

#[derive(Debug, Deserialize)]
struct WireHttp {
    #[serde(default)]
    request: WireRequest,
    #[serde(default)]
    response: WireResponse,
    #[serde(default)]
    stats: WireStats,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct WireRecord {
    #[serde(rename = "type", default)]
    category: WireCategory,
    #[serde(rename = "nodename", default)]
    node_name: String,
    #[serde(rename = "funcname", default)]
    func_name: String,
    #[serde(default)]
    time: Option<DateTime<Utc>>,
    #[serde(default)]
    path: String,
    #[serde_as(as = "DurationNanoSeconds<u64>")]
    #[serde(default)]
    dur: Duration,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(rename = "healResult", default)]
    heal_result: Option<serde_json::Value>,
    #[serde(default)]
    http: Option<WireHttp>,
}

impl TryFrom<WireRecord> for TraceEvent {
    type Error = TraceError;

    fn try_from(record: WireRecord) -> Result<Self> {
        let category = record.category.resolve();
        let http = record.http.map(http_detail).transpose()?;
        let kind = TraceKind::new(category, http).ok_or_else(|| {
            TraceError::decode(format!("{category} 记录缺少 http 明细: {}", record.func_name))
        })?;

        Ok(Self {
            kind,
            node_name: record.node_name,
            func_name: record.func_name,
            path: record.path,
            time: record.time.unwrap_or_default(),
            duration: record.dur,
            error: non_empty(record.error),
            message: non_empty(record.msg),
            heal_result: record.heal_result.filter(|value| !value.is_null()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn http_detail(wire: WireHttp) -> Result<HttpDetail> {
    let WireHttp {
        request,
        response,
        stats,
    } = wire;
    Ok(HttpDetail {
        request: RequestInfo {
            time: request.time.unwrap_or_default(),
            proto: request.proto,
            method: request.method,
            path: request.path,
            raw_query: request.rawquery,
            client: request.client,
            headers: request.headers.unwrap_or_default(),
            body: decode_body(request.body)?,
        },
        response: ResponseInfo {
            time: response.time.unwrap_or_default(),
            status_code: response.statuscode,
            headers: response.headers.unwrap_or_default(),
            body: decode_body(response.body)?,
        },
        stats: CallStats {
            input_bytes: stats.inputbytes,
            output_bytes: stats.outputbytes,
            latency: stats.latency,
            time_to_first_byte: stats.timetofirstbyte,
        },
    })
}

fn decode_body(body: Option<String>) -> Result<Bytes> {
    match body.as_deref() {
        None | Some("") => Ok(Bytes::new()),
        Some(encoded) => STANDARD
            .decode(encoded)
            .map(Bytes::from)
            .map_err(|e| TraceError::decode_with_source("消息体不是有效的 base64", e)),
    }
}

/// 解析一行记录；空行与保活行返回 `None`
pub fn parse_record(line: &str) -> Result<Option<TraceEvent>> {
    let line = line.trim();
    if line.is_empty() || line == "{}" {
        return Ok(None);
    }
    let record: WireRecord = serde_json::from_str(line)
        .map_err(|e| TraceError::decode_with_source("追踪记录不是有效的 JSON", e))?;
    TraceEvent::try_from(record).map(Some)
}

/// 单条记录的默认长度上限（字节，不含换行符）
pub const MAX_RECORD_LEN: usize = 16 * 1024 * 1024;

/// 逐行 JSON 追踪记录解码器
#[derive(Debug, Clone, Copy)]
pub struct TraceRecordDecoder {
    /// 已确认不含换行的前缀长度
    scanned: usize,
    max_length: usize,
}

impl Default for TraceRecordDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceRecordDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_max_length(MAX_RECORD_LEN)
    }

    /// 指定单条记录的长度上限，超出时返回解码错误
    #[must_use]
    pub const fn with_max_length(max_length: usize) -> Self {
        Self {
            scanned: 0,
            max_length,
        }
    }

    fn take_line(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>> {
        let offset = src[self.scanned..].iter().position(|b| *b == b'\n');
        match offset {
            Some(offset) => {
                let end = self.scanned + offset;
                if end > self.max_length {
                    return Err(self.oversized());
                }
                let line = src.split_to(end + 1);
                self.scanned = 0;
                Ok(Some(line))
            }
            None if src.len() > self.max_length => Err(self.oversized()),
            None => {
                self.scanned = src.len();
                Ok(None)
            }
        }
    }

    fn oversized(&self) -> TraceError {
        TraceError::decode(format!("追踪记录超过 {} 字节上限", self.max_length))
    }
}

fn line_text(line: &[u8]) -> Result<&str> {
    std::str::from_utf8(line).map_err(|e| TraceError::decode_with_source("追踪记录不是有效的 UTF-8", e))
}

impl Decoder for TraceRecordDecoder {
    type Item = TraceEvent;
    type Error = TraceError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        while let Some(line) = self.take_line(src)? {
            if let Some(event) = parse_record(line_text(&line)?)? {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(event) = self.decode(src)? {
            return Ok(Some(event));
        }
        if src.is_empty() {
            return Ok(None);
        }
        // 最后一行没有换行符
        let rest = src.split_to(src.len());
        self.scanned = 0;
        parse_record(line_text(&rest)?)
    }
}
