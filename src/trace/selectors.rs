//! # 用户选择条件
//!
//! 命令行已解析好的类型化选择列表，由此派生追踪流选项与过滤谓词。

use std::time::Duration;

use super::filter::FilterPredicate;
use super::options::TraceStreamOptions;
use crate::error::Result;

/// 一次会话的全部选择条件
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TraceSelectors {
    /// 详细输出
    pub verbose: bool,
    /// 追踪所有类别
    pub all: bool,
    /// 类别名称列表
    pub calls: Vec<String>,
    /// 最小耗时
    pub threshold: Duration,
    pub status_codes: Vec<u16>,
    pub methods: Vec<String>,
    pub func_names: Vec<String>,
    pub paths: Vec<String>,
    pub nodes: Vec<String>,
    /// 请求头匹配，`!` 前缀表示取反
    pub request_headers: Vec<String>,
    /// 只追踪失败的调用
    pub errors_only: bool,
}

impl TraceSelectors {
    /// 打开追踪流的选项
    #[must_use]
    pub fn stream_options(&self) -> TraceStreamOptions {
        TraceStreamOptions::from_selectors(&self.calls, self.all, self.threshold, self.errors_only)
    }

    /// 编译过滤谓词
    pub fn predicate(&self) -> Result<FilterPredicate> {
        FilterPredicate::new(
            &self.status_codes,
            &self.methods,
            &self.func_names,
            &self.paths,
            &self.nodes,
            &self.request_headers,
        )
    }
}
