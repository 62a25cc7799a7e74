//! # 追踪源
//!
//! [`TraceSource`] 按流选项打开一条事件流，流在取消后结束。
//! 目标解析：`-` 为标准输入回放，`http(s)://` 为集群实时追踪，其余视为追踪日志文件。

pub mod codec;
pub mod http;
pub mod reader;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::config::SourceConfig;
use crate::error::{Result, TraceError};
use crate::trace::{TraceEvent, TraceStreamOptions};

pub use codec::{MAX_RECORD_LEN, TraceRecordDecoder, parse_record};
pub use http::HttpTraceSource;
pub use reader::ReaderTraceSource;

/// 事件流：事件或终止性的传输错误
pub type TraceStream = BoxStream<'static, Result<TraceEvent>>;

/// 追踪源
#[async_trait]
pub trait TraceSource: Send + Sync {
    /// 按选项打开事件流
    async fn open(&self, options: TraceStreamOptions, cancel: CancellationToken) -> Result<TraceStream>;

    /// 用于日志的目标描述
    fn describe(&self) -> String;
}

/// 观测目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceTarget {
    Stdin,
    File(PathBuf),
    Http(String),
}

impl TraceTarget {
    #[must_use]
    pub fn parse(target: &str) -> Self {
        if target == "-" {
            Self::Stdin
        } else if target.starts_with("http://") || target.starts_with("https://") {
            Self::Http(target.to_string())
        } else {
            Self::File(PathBuf::from(target))
        }
    }

    /// 为目标构造追踪源
    pub fn into_source(self, config: &SourceConfig) -> Result<Box<dyn TraceSource>> {
        let source: Box<dyn TraceSource> = match self {
            Self::Stdin => Box::new(ReaderTraceSource::stdin()),
            Self::File(path) => Box::new(ReaderTraceSource::file(path)),
            Self::Http(endpoint) => Box::new(HttpTraceSource::new(&endpoint, config)?),
        };
        Ok(source)
    }
}

impl fmt::Display for TraceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("stdin"),
            Self::File(path) => write!(f, "file:{}", path.display()),
            Self::Http(endpoint) => f.write_str(endpoint),
        }
    }
}

/// 读流过程中的 IO 错误归为传输错误
pub(crate) fn read_failure(err: TraceError) -> TraceError {
    match err {
        TraceError::Io { message, source } => TraceError::transport_with_source(message, source),
        other => other,
    }
}
