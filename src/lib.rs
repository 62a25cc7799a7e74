//! # Admin Trace Library
//!
//! 存储集群请求追踪的过滤与渲染管道：类别翻译、谓词匹配、可取消的流式消费与
//! 单行/详细两种记录格式。

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod source;
pub mod testing;
pub mod trace;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Result, TraceError};
