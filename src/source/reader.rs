//! # 回放追踪源
//!
//! 从标准输入、追踪日志文件或任意异步读取器回放记录。没有服务端替我们筛选，
//! 所以类别开关、耗时阈值与只看错误都在本地应用。

use std::path::PathBuf;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, future};
use tokio::io::AsyncRead;
use tokio::sync::Mutex;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;

use super::codec::TraceRecordDecoder;
use super::{TraceSource, TraceStream, read_failure};
use crate::error::{Context, Result};
use crate::trace::TraceStreamOptions;
use crate::transport_error;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

enum Input {
    Stdin,
    File(PathBuf),
    /// 只能打开一次
    Reader(Mutex<Option<BoxedReader>>),
}

/// 回放追踪源
pub struct ReaderTraceSource {
    input: Input,
}

impl ReaderTraceSource {
    #[must_use]
    pub const fn stdin() -> Self {
        Self { input: Input::Stdin }
    }

    #[must_use]
    pub const fn file(path: PathBuf) -> Self {
        Self {
            input: Input::File(path),
        }
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            input: Input::Reader(Mutex::new(Some(Box::new(reader)))),
        }
    }

    async fn reader(&self) -> Result<BoxedReader> {
        let reader: BoxedReader = match &self.input {
            Input::Stdin => Box::new(tokio::io::stdin()),
            Input::File(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|e| read_failure(e.into()))
                    .with_context(|| format!("无法打开追踪日志 {}", path.display()))?;
                Box::new(file)
            }
            Input::Reader(slot) => slot
                .lock()
                .await
                .take()
                .ok_or_else(|| transport_error!("追踪输入已被读取"))?,
        };
        Ok(reader)
    }
}

#[async_trait]
impl TraceSource for ReaderTraceSource {
    async fn open(&self, options: TraceStreamOptions, cancel: CancellationToken) -> Result<TraceStream> {
        let reader = self.reader().await?;
        let stream = FramedRead::new(reader, TraceRecordDecoder::new())
            .map_err(read_failure)
            .try_filter(move |event| future::ready(options.admits(event)))
            .take_until(cancel.cancelled_owned())
            .boxed();
        Ok(stream)
    }

    fn describe(&self) -> String {
        match &self.input {
            Input::Stdin => "stdin".to_string(),
            Input::File(path) => format!("file:{}", path.display()),
            Input::Reader(_) => "reader".to_string(),
        }
    }
}
