//! # 追踪事件管道
//!
//! 类别选项翻译、谓词匹配、节点着色与流式消费。追踪源与输出渲染分别位于
//! [`crate::source`] 与 [`crate::format`]。

pub mod color;
pub mod consumer;
pub mod filter;
pub mod glob;
pub mod models;
pub mod options;
pub mod selectors;

pub use consumer::{ConsumeSummary, EndReason, TraceConsumer};
pub use filter::{FilterGroup, FilterPredicate, HeaderMatch};
pub use models::*;
pub use options::TraceStreamOptions;
pub use selectors::TraceSelectors;
