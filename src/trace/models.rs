//! # Trace 数据模型
//!
//! 集群节点上报的单条追踪事件。类别决定携带哪些字段：只有 S3 与内部 RPC
//! 类别带有 HTTP 明细，由 [`TraceKind`] 在类型层面保证。

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// 请求头/响应头多值映射，保持到达顺序
pub type HeaderMultiMap = IndexMap<String, Vec<String>>;

/// 追踪类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceCategory {
    /// S3 API 调用
    S3,
    /// 节点间内部 RPC
    Internal,
    /// 存储层调用
    Storage,
    /// 操作系统调用
    Os,
    /// 扫描器
    Scanner,
    /// 修复
    Healing,
    /// 下线迁移
    Decommission,
    /// 批量复制
    BatchReplication,
    /// 未知类别
    Other,
}

impl TraceCategory {
    /// 所有已知类别（不含 `Other`）
    pub const ALL: [Self; 8] = [
        Self::Os,
        Self::Storage,
        Self::S3,
        Self::Internal,
        Self::Scanner,
        Self::Decommission,
        Self::Healing,
        Self::BatchReplication,
    ];

    /// 类别名称
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S3 => "S3",
            Self::Internal => "Internal",
            Self::Storage => "Storage",
            Self::Os => "OS",
            Self::Scanner => "Scanner",
            Self::Healing => "Healing",
            Self::Decommission => "Decommission",
            Self::BatchReplication => "BatchReplication",
            Self::Other => "Other",
        }
    }

    /// 线上协议中的类别位
    #[must_use]
    pub const fn bit(self) -> u64 {
        match self {
            Self::Os => 1,
            Self::Storage => 1 << 1,
            Self::S3 => 1 << 2,
            Self::Internal => 1 << 3,
            Self::Scanner => 1 << 4,
            Self::Decommission => 1 << 5,
            Self::Healing => 1 << 6,
            Self::BatchReplication => 1 << 7,
            Self::Other => 0,
        }
    }

    /// 由类别位还原，未知位映射为 `Other`
    #[must_use]
    pub fn from_bit(bit: u64) -> Self {
        Self::ALL
            .into_iter()
            .find(|category| category.bit() == bit)
            .unwrap_or(Self::Other)
    }

    /// 由类别名称还原（大小写不敏感），未知名称映射为 `Other`
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(name))
            .unwrap_or(Self::Other)
    }

    /// 是否为携带 HTTP 明细的类别
    #[must_use]
    pub const fn is_http(self) -> bool {
        matches!(self, Self::S3 | Self::Internal)
    }
}

impl fmt::Display for TraceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 请求信息
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestInfo {
    pub time: DateTime<Utc>,
    pub proto: String,
    pub method: String,
    pub path: String,
    pub raw_query: String,
    pub client: String,
    pub headers: HeaderMultiMap,
    pub body: Bytes,
}

/// 响应信息
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseInfo {
    pub time: DateTime<Utc>,
    pub status_code: u16,
    pub headers: HeaderMultiMap,
    pub body: Bytes,
}

/// 调用统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallStats {
    /// 上传字节数
    pub input_bytes: u64,
    /// 下载字节数
    pub output_bytes: u64,
    pub latency: Duration,
    pub time_to_first_byte: Duration,
}

/// HTTP 明细，仅 S3 / 内部 RPC 类别携带
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpDetail {
    pub request: RequestInfo,
    pub response: ResponseInfo,
    pub stats: CallStats,
}

/// 按类别区分的事件载荷
#[derive(Debug, Clone, PartialEq)]
pub enum TraceKind {
    S3(Box<HttpDetail>),
    Internal(Box<HttpDetail>),
    Storage,
    Os,
    Scanner,
    Healing,
    Decommission,
    BatchReplication,
    Other,
}

impl TraceKind {
    /// 为类别构造载荷；HTTP 类别必须提供明细，非 HTTP 类别会丢弃明细
    #[must_use]
    pub fn new(category: TraceCategory, http: Option<HttpDetail>) -> Option<Self> {
        let kind = match category {
            TraceCategory::S3 => Self::S3(Box::new(http?)),
            TraceCategory::Internal => Self::Internal(Box::new(http?)),
            TraceCategory::Storage => Self::Storage,
            TraceCategory::Os => Self::Os,
            TraceCategory::Scanner => Self::Scanner,
            TraceCategory::Healing => Self::Healing,
            TraceCategory::Decommission => Self::Decommission,
            TraceCategory::BatchReplication => Self::BatchReplication,
            TraceCategory::Other => Self::Other,
        };
        Some(kind)
    }

    #[must_use]
    pub const fn category(&self) -> TraceCategory {
        match self {
            Self::S3(_) => TraceCategory::S3,
            Self::Internal(_) => TraceCategory::Internal,
            Self::Storage => TraceCategory::Storage,
            Self::Os => TraceCategory::Os,
            Self::Scanner => TraceCategory::Scanner,
            Self::Healing => TraceCategory::Healing,
            Self::Decommission => TraceCategory::Decommission,
            Self::BatchReplication => TraceCategory::BatchReplication,
            Self::Other => TraceCategory::Other,
        }
    }

    #[must_use]
    pub fn http(&self) -> Option<&HttpDetail> {
        match self {
            Self::S3(detail) | Self::Internal(detail) => Some(detail),
            _ => None,
        }
    }
}

/// 一次被观测到的操作
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    pub kind: TraceKind,
    /// 上报节点
    pub node_name: String,
    /// 处理函数名
    pub func_name: String,
    pub path: String,
    pub time: DateTime<Utc>,
    pub duration: Duration,
    pub error: Option<String>,
    /// 附加状态信息
    pub message: Option<String>,
    /// 修复结果（原样透传）
    pub heal_result: Option<serde_json::Value>,
}

impl TraceEvent {
    #[must_use]
    pub const fn category(&self) -> TraceCategory {
        self.kind.category()
    }

    #[must_use]
    pub fn http(&self) -> Option<&HttpDetail> {
        self.kind.http()
    }

    /// HTTP 响应状态码
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.http().map(|detail| detail.response.status_code)
    }

    /// 是否视为失败调用：HTTP 类别看状态码，其余类别看错误信息
    #[must_use]
    pub fn is_failure(&self) -> bool {
        match self.http() {
            Some(detail) => detail.response.status_code >= 400,
            None => self.error.as_deref().is_some_and(|e| !e.is_empty()),
        }
    }
}
