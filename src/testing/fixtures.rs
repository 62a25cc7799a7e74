//! # 测试数据 Fixtures
//!
//! 提供追踪事件构建器与预设数据

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};

use crate::trace::{
    CallStats, HttpDetail, RequestInfo, ResponseInfo, TraceCategory, TraceEvent, TraceKind,
};

/// 固定的事件时间
#[must_use]
pub fn fixture_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

/// 追踪事件构建器
#[derive(Debug, Clone)]
pub struct TraceEventFixture {
    category: TraceCategory,
    node_name: String,
    func_name: String,
    path: String,
    duration: Duration,
    error: Option<String>,
    message: Option<String>,
    heal_result: Option<serde_json::Value>,
    http: HttpDetail,
}

impl TraceEventFixture {
    /// 指定类别的空白事件
    #[must_use]
    pub fn new(category: TraceCategory) -> Self {
        let time = fixture_time();
        Self {
            category,
            node_name: "node1".to_string(),
            func_name: String::new(),
            path: "/bucket/object".to_string(),
            duration: Duration::from_millis(1),
            error: None,
            message: None,
            heal_result: None,
            http: HttpDetail {
                request: RequestInfo {
                    time,
                    proto: "HTTP/1.1".to_string(),
                    method: "GET".to_string(),
                    path: "/bucket/object".to_string(),
                    client: "127.0.0.1".to_string(),
                    ..RequestInfo::default()
                },
                response: ResponseInfo {
                    time,
                    status_code: 200,
                    ..ResponseInfo::default()
                },
                stats: CallStats {
                    latency: Duration::from_millis(1),
                    ..CallStats::default()
                },
            },
        }
    }

    /// S3 调用，默认 `GET` 成功
    #[must_use]
    pub fn s3() -> Self {
        Self::new(TraceCategory::S3).func("s3.GetObject")
    }

    /// 节点间内部调用
    #[must_use]
    pub fn internal() -> Self {
        Self::new(TraceCategory::Internal).func("grid.Ping")
    }

    /// 存储层调用
    #[must_use]
    pub fn storage() -> Self {
        Self::new(TraceCategory::Storage).func("storage.ReadAll")
    }

    /// 扫描器事件
    #[must_use]
    pub fn scanner() -> Self {
        Self::new(TraceCategory::Scanner).func("scanner.ScanObject")
    }

    /// 修复事件
    #[must_use]
    pub fn healing() -> Self {
        Self::new(TraceCategory::Healing).func("heal.Object")
    }

    #[must_use]
    pub fn node(mut self, node_name: &str) -> Self {
        self.node_name = node_name.to_string();
        self
    }

    #[must_use]
    pub fn func(mut self, func_name: &str) -> Self {
        self.func_name = func_name.to_string();
        self
    }

    /// 设置事件路径与请求路径
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self.http.request.path = path.to_string();
        self
    }

    #[must_use]
    pub fn method(mut self, method: &str) -> Self {
        self.http.request.method = method.to_string();
        self
    }

    #[must_use]
    pub fn status(mut self, status_code: u16) -> Self {
        self.http.response.status_code = status_code;
        self
    }

    #[must_use]
    pub fn query(mut self, raw_query: &str) -> Self {
        self.http.request.raw_query = raw_query.to_string();
        self
    }

    #[must_use]
    pub fn client(mut self, client: &str) -> Self {
        self.http.request.client = client.to_string();
        self
    }

    #[must_use]
    pub fn request_header(mut self, name: &str, value: &str) -> Self {
        self.http
            .request
            .headers
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    #[must_use]
    pub fn response_header(mut self, name: &str, value: &str) -> Self {
        self.http
            .response
            .headers
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    #[must_use]
    pub fn request_body(mut self, body: &'static str) -> Self {
        self.http.request.body = Bytes::from_static(body.as_bytes());
        self
    }

    #[must_use]
    pub fn response_body(mut self, body: &'static str) -> Self {
        self.http.response.body = Bytes::from_static(body.as_bytes());
        self
    }

    /// 设置事件耗时（毫秒）
    #[must_use]
    pub const fn duration_ms(mut self, millis: u64) -> Self {
        self.duration = Duration::from_millis(millis);
        self
    }

    /// 设置事件耗时（微秒）
    #[must_use]
    pub const fn duration_micros(mut self, micros: u64) -> Self {
        self.duration = Duration::from_micros(micros);
        self
    }

    /// 设置 HTTP 调用延迟（微秒）
    #[must_use]
    pub const fn latency_micros(mut self, micros: u64) -> Self {
        self.http.stats.latency = Duration::from_micros(micros);
        self
    }

    /// 设置上传/下载字节数
    #[must_use]
    pub const fn bytes(mut self, input_bytes: u64, output_bytes: u64) -> Self {
        self.http.stats.input_bytes = input_bytes;
        self.http.stats.output_bytes = output_bytes;
        self
    }

    #[must_use]
    pub fn error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    #[must_use]
    pub fn message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn heal_result(mut self, heal_result: serde_json::Value) -> Self {
        self.heal_result = Some(heal_result);
        self
    }

    /// 构建事件；非 HTTP 类别不携带 HTTP 明细
    #[must_use]
    pub fn build(self) -> TraceEvent {
        let kind = TraceKind::new(self.category, Some(self.http)).unwrap_or(TraceKind::Other);
        TraceEvent {
            kind,
            node_name: self.node_name,
            func_name: self.func_name,
            path: self.path,
            time: fixture_time(),
            duration: self.duration,
            error: self.error,
            message: self.message,
            heal_result: self.heal_result,
        }
    }
}
