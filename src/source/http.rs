//! # 实时追踪源
//!
//! 向集群的管理接口发起长连接 `GET`，选项编码在查询串中由服务端筛选。
//! 响应体是逐行 JSON 追踪记录，读取失败与非 2xx 响应都是传输错误。

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::codec::TraceRecordDecoder;
use super::{TraceSource, TraceStream, read_failure};
use crate::config::SourceConfig;
use crate::error::{Context, Result, TraceError};
use crate::format::units::format_duration;
use crate::trace::TraceStreamOptions;
use crate::{config_error, transport_error};

/// 管理接口追踪路径
pub const TRACE_PATH: &str = "/minio/admin/v3/trace";

/// 实时追踪源
#[derive(Debug, Clone)]
pub struct HttpTraceSource {
    endpoint: Url,
    client: Client,
}

impl HttpTraceSource {
    pub fn new(endpoint: &str, config: &SourceConfig) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| TraceError::config_with_source(format!("无效的集群地址: {endpoint}"), e))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(config_error!("集群地址必须是 http 或 https: {endpoint}"));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TraceError::config_with_source("HTTP客户端创建失败", e))?;

        Ok(Self { endpoint, client })
    }

    /// 带选项查询串的追踪地址，追踪路径接在集群地址原有路径之后
    #[must_use]
    pub fn trace_url(&self, options: &TraceStreamOptions) -> Url {
        let mut url = self.endpoint.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}{TRACE_PATH}"));
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("err", bool_str(options.only_errors))
            .append_pair("threshold", &format_duration(options.threshold))
            .append_pair("s3", bool_str(options.s3))
            .append_pair("internal", bool_str(options.internal))
            .append_pair("storage", bool_str(options.storage))
            .append_pair("os", bool_str(options.os))
            .append_pair("scanner", bool_str(options.scanner))
            .append_pair("decommission", bool_str(options.decommission))
            .append_pair("healing", bool_str(options.healing))
            .append_pair("batch-replication", bool_str(options.batch_replication));
        url
    }
}

const fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

#[async_trait]
impl TraceSource for HttpTraceSource {
    async fn open(&self, options: TraceStreamOptions, cancel: CancellationToken) -> Result<TraceStream> {
        let request = self.client.get(self.trace_url(&options)).send();
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(futures::stream::empty().boxed()),
            response = request => response.with_context(|| format!("无法连接追踪端点 {}", self.endpoint))?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(transport_error!("追踪流请求被拒绝: HTTP {status} {}", body.trim()));
        }

        let body = response.bytes_stream().map_err(io::Error::other);
        let stream = FramedRead::new(StreamReader::new(body), TraceRecordDecoder::new())
            .map_err(read_failure)
            .take_until(cancel.cancelled_owned())
            .boxed();
        Ok(stream)
    }

    fn describe(&self) -> String {
        self.endpoint.to_string()
    }
}
