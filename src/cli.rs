//! # 命令行参数
//!
//! 将原始参数解析为类型化的 [`TraceSelectors`] 与输出开关。

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{AppConfig, ColorMode};
use crate::format::units::parse_duration;
use crate::format::{Encoding, RenderOptions, Verbosity};
use crate::trace::TraceSelectors;

/// 实时观测存储集群的请求追踪
#[derive(Debug, Clone, Parser)]
#[command(name = "admin-trace", version, about)]
pub struct Cli {
    /// 输出完整的请求/响应
    #[arg(short, long)]
    pub verbose: bool,

    /// 追踪所有类别
    #[arg(short, long)]
    pub all: bool,

    /// 追踪的类别：s3, internal, storage, os, scanner, healing, decommission, batch-replication
    #[arg(long = "call", value_name = "NAME", value_delimiter = ',')]
    pub calls: Vec<String>,

    /// 只追踪耗时不低于该值的调用，如 5ms、1.5s
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub response_threshold: Option<Duration>,

    /// 按响应状态码过滤
    #[arg(long = "status-code", value_name = "CODE")]
    pub status_codes: Vec<u16>,

    /// 按请求方法过滤
    #[arg(long = "method", value_name = "METHOD")]
    pub methods: Vec<String>,

    /// 按处理函数名过滤（通配符）
    #[arg(long = "funcname", value_name = "GLOB")]
    pub func_names: Vec<String>,

    /// 按请求路径过滤（通配符）
    #[arg(long = "path", value_name = "GLOB")]
    pub paths: Vec<String>,

    /// 按节点名过滤（通配符）
    #[arg(long = "node", value_name = "GLOB")]
    pub nodes: Vec<String>,

    /// 按请求头过滤，`!` 前缀表示不含该请求头
    #[arg(long = "request-header", value_name = "[!]PATTERN", allow_hyphen_values = true)]
    pub request_headers: Vec<String>,

    /// 只追踪失败的调用
    #[arg(short, long)]
    pub errors: bool,

    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,

    /// 着色策略
    #[arg(long, value_enum, value_name = "WHEN")]
    pub color: Option<ColorMode>,

    /// 等同于 `--color never`
    #[arg(long, conflicts_with = "color")]
    pub no_color: bool,

    /// 配置文件路径
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// `-` 为标准输入，`http(s)://` 为集群地址，其余为追踪日志文件
    #[arg(value_name = "TARGET")]
    pub target: String,
}

impl Cli {
    /// 类型化的选择条件
    #[must_use]
    pub fn selectors(&self) -> TraceSelectors {
        TraceSelectors {
            verbose: self.verbose,
            all: self.all,
            calls: self.calls.clone(),
            threshold: self.response_threshold.unwrap_or_default(),
            status_codes: self.status_codes.clone(),
            methods: self.methods.clone(),
            func_names: self.func_names.clone(),
            paths: self.paths.clone(),
            nodes: self.nodes.clone(),
            request_headers: self.request_headers.clone(),
            errors_only: self.errors,
        }
    }

    /// 命令行开关覆盖配置后的着色策略
    #[must_use]
    pub fn color_mode(&self, config: &AppConfig) -> ColorMode {
        if self.no_color {
            ColorMode::Never
        } else {
            self.color.unwrap_or(config.output.color)
        }
    }

    /// 渲染选项
    #[must_use]
    pub fn render_options(&self, config: &AppConfig, stdout_is_terminal: bool) -> RenderOptions {
        let json = self.json || config.output.json;
        RenderOptions {
            verbosity: if self.verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Short
            },
            encoding: if json {
                Encoding::Json {
                    pretty: config.output.pretty_json,
                }
            } else {
                Encoding::Text
            },
            color: self.color_mode(config).enabled(stdout_is_terminal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("admin-trace").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn repeated_and_comma_separated_calls() {
        let cli = parse(&["--call", "heal,scanner", "--call", "storage", "-"]);
        assert_eq!(cli.selectors().calls, vec!["heal", "scanner", "storage"]);
        assert_eq!(cli.target, "-");
    }

    #[test]
    fn call_names_are_case_sensitive() {
        let cli = parse(&["--call", "Storage,heal", "-"]);
        let selectors = cli.selectors();
        assert_eq!(selectors.calls, vec!["Storage", "heal"]);

        let options = selectors.stream_options();
        assert!(!options.storage);
        assert!(options.healing);
    }

    #[test]
    fn selectors_from_flags() {
        let cli = parse(&[
            "-v",
            "-e",
            "--response-threshold",
            "5ms",
            "--status-code",
            "404",
            "--status-code",
            "503",
            "--method",
            "GET",
            "--path",
            "bucket/*",
            "--node",
            "node1*",
            "--funcname",
            "s3.Get*",
            "--request-header",
            "!X-Amz-Request-Id",
            "http://localhost:9000",
        ]);
        let selectors = cli.selectors();
        assert!(selectors.verbose);
        assert!(selectors.errors_only);
        assert_eq!(selectors.threshold, Duration::from_millis(5));
        assert_eq!(selectors.status_codes, vec![404, 503]);
        assert_eq!(selectors.methods, vec!["GET"]);
        assert_eq!(selectors.paths, vec!["bucket/*"]);
        assert_eq!(selectors.request_headers, vec!["!X-Amz-Request-Id"]);
        assert!(selectors.predicate().is_ok());
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let result = Cli::try_parse_from(["admin-trace", "--response-threshold", "fast", "-"]);
        assert!(result.is_err());
    }

    #[test]
    fn target_is_required() {
        assert!(Cli::try_parse_from(["admin-trace", "-a"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let mut config = AppConfig::default();
        config.output.color = ColorMode::Always;
        config.output.pretty_json = true;

        let cli = parse(&["--no-color", "-"]);
        assert!(!cli.render_options(&config, true).color);

        let cli = parse(&["--json", "-v", "-"]);
        let options = cli.render_options(&config, true);
        assert_eq!(options.encoding, Encoding::Json { pretty: true });
        assert_eq!(options.verbosity, Verbosity::Verbose);

        let cli = parse(&["--color", "never", "-"]);
        assert!(!cli.render_options(&config, true).color);

        let cli = parse(&["-"]);
        assert!(cli.render_options(&config, false).color);
    }
}
