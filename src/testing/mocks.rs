//! # 测试 Mock 对象
//!
//! 按脚本回放事件与错误的追踪源

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::source::{TraceSource, TraceStream};
use crate::trace::{TraceEvent, TraceStreamOptions};

/// Mock 追踪源
pub struct MockTraceSource {
    script: Mutex<Vec<Result<TraceEvent>>>,
    /// 脚本放完后保持挂起，直到取消
    hold_open: bool,
    opened: AtomicUsize,
    last_options: Mutex<Option<TraceStreamOptions>>,
}

impl MockTraceSource {
    #[must_use]
    pub fn new(script: Vec<Result<TraceEvent>>) -> Self {
        Self {
            script: Mutex::new(script),
            hold_open: false,
            opened: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    /// 脚本结束后不关闭流，模拟等待新事件的长连接
    #[must_use]
    pub fn pending_after(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// 被打开的次数
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// 最近一次打开时收到的选项
    pub fn last_options(&self) -> Option<TraceStreamOptions> {
        self.last_options.lock().ok().and_then(|options| *options)
    }
}

#[async_trait]
impl TraceSource for MockTraceSource {
    async fn open(&self, options: TraceStreamOptions, cancel: CancellationToken) -> Result<TraceStream> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_options.lock() {
            *last = Some(options);
        }
        let script = self
            .script
            .lock()
            .map(|mut script| std::mem::take(&mut *script))
            .unwrap_or_default();

        let scripted = stream::iter(script);
        let stream = if self.hold_open {
            scripted.chain(stream::pending()).boxed()
        } else {
            scripted.boxed()
        };
        Ok(stream.take_until(cancel.cancelled_owned()).boxed())
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
