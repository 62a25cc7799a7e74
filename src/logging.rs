//! # 日志配置模块
//!
//! 初始化 tracing 订阅器，并提供带阶段/组件标签的结构化日志宏。
//! 日志统一写到 stderr，stdout 只输出渲染后的追踪记录。

use std::env;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 会话生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    /// 启动与参数解析
    Startup,
    /// 打开追踪流
    Connect,
    /// 接收事件
    Streaming,
    /// 过滤事件
    Filtering,
    /// 渲染输出
    Rendering,
    /// 会话结束
    Shutdown,
    /// 错误处理
    Error,
}

impl LogStage {
    /// 日志字段中使用的名称
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Connect => "connect",
            Self::Streaming => "streaming",
            Self::Filtering => "filtering",
            Self::Rendering => "rendering",
            Self::Shutdown => "shutdown",
            Self::Error => "error",
        }
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    /// 主程序
    Main,
    /// 配置加载
    Config,
    /// 追踪源
    Source,
    /// 流式消费者
    Consumer,
    /// 谓词匹配器
    Filter,
    /// 记录格式化
    Formatter,
}

impl LogComponent {
    /// 日志字段中使用的名称
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Config => "config",
            Self::Source => "source",
            Self::Consumer => "consumer",
            Self::Filter => "filter",
            Self::Formatter => "formatter",
        }
    }
}

/// 结构化 info 日志
#[macro_export]
macro_rules! linfo {
    ($session:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($field:tt)+)?) => {
        ::tracing::info!(
            session = %$session,
            stage = $stage.as_str(),
            component = $component.as_str(),
            operation = %$operation,
            $($($field)+ ,)?
            "{}",
            $message
        )
    };
}

/// 结构化 warn 日志
#[macro_export]
macro_rules! lwarn {
    ($session:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($field:tt)+)?) => {
        ::tracing::warn!(
            session = %$session,
            stage = $stage.as_str(),
            component = $component.as_str(),
            operation = %$operation,
            $($($field)+ ,)?
            "{}",
            $message
        )
    };
}

/// 结构化 error 日志
#[macro_export]
macro_rules! lerror {
    ($session:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($field:tt)+)?) => {
        ::tracing::error!(
            session = %$session,
            stage = $stage.as_str(),
            component = $component.as_str(),
            operation = %$operation,
            $($($field)+ ,)?
            "{}",
            $message
        )
    };
}

/// 结构化 debug 日志
#[macro_export]
macro_rules! ldebug {
    ($session:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($field:tt)+)?) => {
        ::tracing::debug!(
            session = %$session,
            stage = $stage.as_str(),
            component = $component.as_str(),
            operation = %$operation,
            $($($field)+ ,)?
            "{}",
            $message
        )
    };
}

/// 默认过滤规则：应用自身按给定级别，HTTP 客户端只保留警告
#[must_use]
pub fn default_filter(level: &str) -> String {
    format!("{level},admin_trace={level},reqwest=warn,hyper=warn,hyper_util=warn")
}

/// 初始化日志系统
///
/// `RUST_LOG` 优先于配置中的级别。重复初始化时静默忽略。
pub fn init_optimized_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(level));

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&log_filter).unwrap_or_else(|_| EnvFilter::new(default_filter("info"))))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
