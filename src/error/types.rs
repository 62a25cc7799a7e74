//! # 错误类型定义

use thiserror::Error;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum TraceError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 过滤条件或参数无效
    #[error("无效的过滤条件: {message}")]
    Selector {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 追踪流传输错误（连接中断、集群不可达、非 2xx 响应）
    #[error("传输错误: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 追踪记录解码错误
    #[error("解码错误: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// 带上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<TraceError>,
    },
}

impl TraceError {
    /// 是否为终止整个会话的流错误
    #[must_use]
    pub fn is_fatal_stream_error(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Decode { .. } => true,
            Self::Context { source, .. } => source.is_fatal_stream_error(),
            _ => false,
        }
    }

    /// 错误代码，用于结构化日志
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Selector { .. } => "SELECTOR_ERROR",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Decode { .. } => "DECODE_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::Context { source, .. } => source.code(),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建过滤条件错误
    pub fn selector<T: Into<String>>(message: T) -> Self {
        Self::Selector {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的过滤条件错误
    pub fn selector_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Selector {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建传输错误
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的传输错误
    pub fn transport_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建解码错误
    pub fn decode<T: Into<String>>(message: T) -> Self {
        Self::Decode {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的解码错误
    pub fn decode_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Decode {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<std::io::Error> for TraceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "读写失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for TraceError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_json::Error> for TraceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

impl From<regex::Error> for TraceError {
    fn from(err: regex::Error) -> Self {
        Self::selector_with_source("匹配模式编译失败", err)
    }
}

// Reqwest错误转换
impl From<reqwest::Error> for TraceError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport_with_source("HTTP请求失败", err)
    }
}
