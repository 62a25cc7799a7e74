//! # Admin Trace 主程序
//!
//! 打开集群或追踪日志的事件流，按条件过滤后逐条渲染到标准输出。

use std::io::{self, IsTerminal};

use admin_trace::{
    AppConfig, Result,
    cli::Cli,
    config::ConfigManager,
    format::TraceRenderer,
    lerror, linfo, lwarn,
    logging::{self, LogComponent, LogStage},
    source::TraceTarget,
    trace::{EndReason, TraceConsumer},
};
use clap::Parser;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let session = format!("trace-{}", std::process::id());

    let config = match ConfigManager::new(cli.config.as_deref()) {
        Ok(manager) => {
            logging::init_optimized_logging(Some(&manager.config().logging.level));
            linfo!(
                session,
                LogStage::Startup,
                LogComponent::Config,
                "config_loaded",
                "配置已加载",
                path = ?manager.config_path(),
                overrides = ?manager.override_keys()
            );
            manager.into_config()
        }
        Err(e) => {
            logging::init_optimized_logging(None);
            lerror!(
                session,
                LogStage::Startup,
                LogComponent::Config,
                "config_failed",
                &format!("配置加载失败: {e}")
            );
            std::process::exit(1);
        }
    };

    let code = match run(&session, cli, config).await {
        Ok(()) => 0,
        Err(e) => {
            lerror!(
                session,
                LogStage::Error,
                LogComponent::Main,
                "session_failed",
                &format!("追踪会话失败: {e}"),
                code = e.code(),
                fatal = e.is_fatal_stream_error()
            );
            1
        }
    };
    // 阻塞中的标准输入读取无法取消，不等待运行时回收
    std::process::exit(code);
}

async fn run(session: &str, cli: Cli, config: AppConfig) -> Result<()> {
    let selectors = cli.selectors();
    let predicate = selectors.predicate()?;
    let options = selectors.stream_options();
    let render = cli.render_options(&config, io::stdout().is_terminal());

    if predicate.requires_http() && !options.enabled_categories().iter().any(|c| c.is_http()) {
        lwarn!(
            session,
            LogStage::Startup,
            LogComponent::Filter,
            "http_filters_unused",
            "状态码/方法/请求头条件只对 S3 与内部调用生效，当前类别下不会有事件输出",
            categories = ?options.enabled_categories()
        );
    }

    let target = TraceTarget::parse(&cli.target);
    linfo!(
        session,
        LogStage::Startup,
        LogComponent::Main,
        "session_start",
        "开始追踪",
        target = %target,
        verbose = selectors.verbose,
        filtered = !predicate.is_empty()
    );
    let source = target.into_source(&config.source)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let mut consumer = TraceConsumer::new(session, predicate, TraceRenderer::new(io::stdout(), render));
    let summary = consumer.consume(&*source, options, cancel).await?;

    if summary.end == EndReason::Cancelled {
        linfo!(
            session,
            LogStage::Shutdown,
            LogComponent::Main,
            "interrupted",
            "收到中断信号，追踪结束"
        );
    }
    Ok(())
}
