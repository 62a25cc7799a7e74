//! # 应用配置结构定义

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ensure_config;
use crate::error::{Result, TraceError};

/// 日志级别取值
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 应用主配置结构
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 输出配置
    pub output: OutputConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 追踪源配置
    pub source: SourceConfig,
}

impl AppConfig {
    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        ensure_config!(self.source.connect_timeout_secs > 0, "连接超时时间必须大于0");
        ensure_config!(!self.source.user_agent.trim().is_empty(), "User-Agent 不能为空");

        let level = self.logging.level.trim();
        ensure_config!(!level.is_empty(), "日志级别不能为空");
        ensure_config!(
            LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()),
            "无效的日志级别: {}",
            level
        );
        Ok(())
    }
}

/// 着色策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// 标准输出是终端时着色
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// 结合终端检测得出是否着色
    #[must_use]
    pub const fn enabled(self, stdout_is_terminal: bool) -> bool {
        match self {
            Self::Auto => stdout_is_terminal,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

impl FromStr for ColorMode {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => Err(crate::config_error!("无效的着色策略: {other}")),
        }
    }
}

/// 输出配置
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub color: ColorMode,
    /// 以 JSON 输出记录
    pub json: bool,
    /// JSON 多行缩进
    pub pretty_json: bool,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// 追踪源配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// 连接超时（秒）
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            user_agent: concat!("admin-trace/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
