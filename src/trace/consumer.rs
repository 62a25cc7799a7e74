//! # 流式消费者
//!
//! 在可取消的上下文中逐条拉取事件，经谓词过滤后立即渲染。传输错误终止整个会话，
//! 不重试也不跳过；取消后不再产生任何输出。

use std::io::Write;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use super::filter::FilterPredicate;
use super::options::TraceStreamOptions;
use crate::error::Result;
use crate::format::TraceRenderer;
use crate::logging::{LogComponent, LogStage};
use crate::source::{TraceSource, TraceStream};
use crate::{ldebug, lerror, linfo};

/// 会话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// 追踪源关闭了事件流
    StreamClosed,
    /// 收到取消信号
    Cancelled,
}

/// 会话计数，仅用于结束日志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeSummary {
    pub received: u64,
    pub matched: u64,
    pub end: EndReason,
}

/// 流式消费者
pub struct TraceConsumer<W: Write> {
    session: String,
    predicate: FilterPredicate,
    renderer: TraceRenderer<W>,
}

impl<W: Write> TraceConsumer<W> {
    pub fn new(session: impl Into<String>, predicate: FilterPredicate, renderer: TraceRenderer<W>) -> Self {
        Self {
            session: session.into(),
            predicate,
            renderer,
        }
    }

    /// 打开追踪源并消费到结束
    pub async fn consume<S>(
        &mut self,
        source: &S,
        options: TraceStreamOptions,
        cancel: CancellationToken,
    ) -> Result<ConsumeSummary>
    where
        S: TraceSource + ?Sized,
    {
        linfo!(
            self.session,
            LogStage::Connect,
            LogComponent::Source,
            "open_stream",
            "打开追踪流",
            target = %source.describe(),
            categories = ?options.enabled_categories()
        );
        let stream = match source.open(options, cancel.clone()).await {
            Ok(stream) => stream,
            Err(err) => {
                lerror!(
                    self.session,
                    LogStage::Error,
                    LogComponent::Source,
                    "open_stream",
                    "追踪流打开失败",
                    error = %err
                );
                return Err(err);
            }
        };
        self.run(stream, &cancel).await
    }

    /// 消费已打开的事件流
    pub async fn run(&mut self, mut stream: TraceStream, cancel: &CancellationToken) -> Result<ConsumeSummary> {
        let mut received = 0u64;
        let mut matched = 0u64;

        let end = loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => break EndReason::Cancelled,
                next = stream.next() => next,
            };

            let event = match next {
                None => break EndReason::StreamClosed,
                Some(Ok(event)) => event,
                Some(Err(err)) => {
                    lerror!(
                        self.session,
                        LogStage::Streaming,
                        LogComponent::Consumer,
                        "receive",
                        "追踪流中断",
                        error = %err,
                        received = received,
                        matched = matched
                    );
                    return Err(err);
                }
            };
            received += 1;

            if let Some(group) = self.predicate.rejection(&event) {
                ldebug!(
                    self.session,
                    LogStage::Filtering,
                    LogComponent::Filter,
                    "reject",
                    "事件被过滤",
                    group = %group,
                    node = %event.node_name,
                    func = %event.func_name
                );
                continue;
            }

            if cancel.is_cancelled() {
                break EndReason::Cancelled;
            }
            if let Err(err) = self.renderer.render(&event) {
                lerror!(
                    self.session,
                    LogStage::Rendering,
                    LogComponent::Formatter,
                    "render",
                    "追踪记录输出失败",
                    error = %err,
                    func = %event.func_name
                );
                return Err(err);
            }
            matched += 1;
        };

        // 释放底层连接
        drop(stream);

        linfo!(
            self.session,
            LogStage::Shutdown,
            LogComponent::Consumer,
            "finish",
            match end {
                EndReason::StreamClosed => "追踪流已关闭",
                EndReason::Cancelled => "会话已取消",
            },
            received = received,
            matched = matched
        );
        Ok(ConsumeSummary { received, matched, end })
    }

    pub fn into_renderer(self) -> TraceRenderer<W> {
        self.renderer
    }
}
