//! # 配置管理模块
//!
//! 处理应用配置加载、验证与环境变量覆盖

mod app_config;
mod manager;

pub use app_config::{AppConfig, ColorMode, LoggingConfig, OutputConfig, SourceConfig};
pub use manager::{CONFIG_PATH_ENV, ConfigManager};
