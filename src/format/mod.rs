//! # 输出渲染
//!
//! 两个独立维度：详略（单行摘要 / 详细记录）与编码（彩色文本 / JSON）。
//! [`TraceRenderer`] 持有输出目标，每次调用恰好写出一条记录并刷新。

pub mod short;
pub mod styler;
pub mod units;
pub mod verbose;

use std::io::Write;

use crate::error::Result;
use crate::trace::TraceEvent;

pub use short::{CallStatsRecord, ShortTrace};
pub use styler::{Style, Styler};
pub use verbose::VerboseTrace;

/// 详略程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Short,
    Verbose,
}

/// 输出编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Text,
    Json {
        /// 多行缩进输出
        pretty: bool,
    },
}

/// 渲染选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub verbosity: Verbosity,
    pub encoding: Encoding,
    /// 文本编码是否着色；JSON 编码总是忽略
    pub color: bool,
}

/// 追踪记录渲染器
pub struct TraceRenderer<W: Write> {
    writer: W,
    options: RenderOptions,
    styler: Styler,
}

impl<W: Write> TraceRenderer<W> {
    pub fn new(writer: W, options: RenderOptions) -> Self {
        let color = options.color && matches!(options.encoding, Encoding::Text);
        Self {
            writer,
            options,
            styler: Styler::new(color),
        }
    }

    /// 渲染一条记录并写出
    pub fn render(&mut self, event: &TraceEvent) -> Result<()> {
        let record = self.render_to_string(event)?;
        writeln!(self.writer, "{record}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// 渲染为字符串（不含结尾换行）
    pub fn render_to_string(&self, event: &TraceEvent) -> Result<String> {
        let text = match (self.options.verbosity, self.options.encoding) {
            (Verbosity::Short, Encoding::Text) => short::render_text(event, &self.styler),
            (Verbosity::Verbose, Encoding::Text) => verbose::render_text(event, &self.styler),
            (Verbosity::Short, Encoding::Json { pretty }) => {
                to_json(&ShortTrace::new(event), pretty)?
            }
            (Verbosity::Verbose, Encoding::Json { pretty }) => {
                to_json(&VerboseTrace::new(event), pretty)?
            }
        };
        Ok(text)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn to_json<T: serde::Serialize>(record: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(record)?
    } else {
        serde_json::to_string(record)?
    };
    Ok(json)
}
