//! # 配置管理器
//!
//! 加载顺序：命令行 `--config`，其次环境变量 `ADMIN_TRACE_CONFIG_PATH`，都没有时使用默认值。
//! 文件加载后再应用 `ADMIN_TRACE_*` 环境变量覆盖。

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use super::app_config::{AppConfig, ColorMode};
use crate::config_error;
use crate::error::{Context, Result, TraceError};

/// 配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "ADMIN_TRACE_CONFIG_PATH";
/// 覆盖变量前缀
const ENV_PREFIX: &str = "ADMIN_TRACE_";
/// 支持覆盖的配置路径
const OVERRIDE_KEYS: [&str; 3] = ["color", "json", "log.level"];

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: AppConfig,
    config_path: Option<PathBuf>,
    env_overrides: HashMap<String, String>,
}

impl ConfigManager {
    /// 从命令行路径或进程环境加载
    pub fn new(explicit_path: Option<&Path>) -> Result<Self> {
        let config_path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        Self::with_overrides(config_path.as_deref(), Self::build_env_overrides())
    }

    /// 从指定文件加载，并应用进程环境中的覆盖
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_overrides(Some(config_path.as_ref()), Self::build_env_overrides())
    }

    /// 使用给定的覆盖映射加载
    pub fn with_overrides(
        config_path: Option<&Path>,
        env_overrides: HashMap<String, String>,
    ) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::load_config_file(path)?,
            None => AppConfig::default(),
        };
        Self::apply_env_overrides(&mut config, &env_overrides)?;
        config.validate()?;

        Ok(Self {
            config,
            config_path: config_path.map(Path::to_path_buf),
            env_overrides,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// 已应用的覆盖路径
    #[must_use]
    pub fn override_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.env_overrides.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn into_config(self) -> AppConfig {
        self.config
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Err(config_error!("配置文件不存在: {}", path.display()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            TraceError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        toml::from_str(&content).with_context(|| format!("TOML解析失败 - 配置文件: {}", path.display()))
    }

    /// 收集进程环境中的覆盖
    ///
    /// 例如 `ADMIN_TRACE_LOG_LEVEL` 对应 `log.level`。
    #[must_use]
    pub fn build_env_overrides() -> HashMap<String, String> {
        Self::collect_overrides(env::vars())
    }

    /// 从任意键值对中挑出已知的覆盖
    pub fn collect_overrides<I>(vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter_map(|(key, value)| {
                let config_key = key.strip_prefix(ENV_PREFIX)?.to_lowercase().replace('_', ".");
                OVERRIDE_KEYS
                    .contains(&config_key.as_str())
                    .then_some((config_key, value))
            })
            .collect()
    }

    /// 应用覆盖
    pub fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (path, value) in overrides {
            match path.as_str() {
                "color" => config.output.color = value.parse::<ColorMode>()?,
                "json" => config.output.json = parse_bool(value)?,
                "log.level" => config.logging.level = value.trim().to_string(),
                other => return Err(config_error!("未知的配置路径: {other}")),
            }
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(config_error!("无效的布尔值: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorMode;
    use std::io::Write;

    fn overrides(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        ConfigManager::collect_overrides(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        )
    }

    #[test]
    fn no_file_means_defaults() {
        let manager = ConfigManager::with_overrides(None, HashMap::new()).unwrap();
        assert_eq!(manager.config(), &AppConfig::default());
        assert!(manager.config_path().is_none());
    }

    #[test]
    fn loads_file_then_applies_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\ncolor = \"always\"\n\n[logging]\nlevel = \"warn\"").unwrap();

        let manager = ConfigManager::with_overrides(
            Some(file.path()),
            overrides(&[("ADMIN_TRACE_LOG_LEVEL", "debug"), ("ADMIN_TRACE_JSON", "true")]),
        )
        .unwrap();

        let config = manager.config();
        assert_eq!(config.output.color, ColorMode::Always);
        assert!(config.output.json);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(manager.override_keys(), vec!["json", "log.level"]);
    }

    #[test]
    fn unrelated_variables_are_not_collected() {
        let collected = overrides(&[
            ("ADMIN_TRACE_CONFIG_PATH", "/etc/admin-trace.toml"),
            ("ADMIN_TRACE_COLOR", "never"),
            ("PATH", "/usr/bin"),
        ]);
        assert_eq!(collected.len(), 1);
        assert_eq!(collected["color"], "never");
    }

    #[test]
    fn missing_explicit_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigManager::with_overrides(Some(&dir.path().join("nope.toml")), HashMap::new())
            .unwrap_err();
        assert!(matches!(err, TraceError::Config { .. }));
    }

    #[test]
    fn malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output\ncolor = ").unwrap();
        let err = ConfigManager::with_overrides(Some(file.path()), HashMap::new()).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn invalid_override_value_is_config_error() {
        for (key, value) in [("ADMIN_TRACE_COLOR", "rainbow"), ("ADMIN_TRACE_JSON", "maybe")] {
            let err = ConfigManager::with_overrides(None, overrides(&[(key, value)])).unwrap_err();
            assert!(matches!(err, TraceError::Config { .. }));
        }
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[source]\nconnect_timeout_secs = 0").unwrap();
        assert!(ConfigManager::with_overrides(Some(file.path()), HashMap::new()).is_err());
    }
}
