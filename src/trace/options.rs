//! # 追踪流选项
//!
//! 将用户选择的类别名称翻译为发送给追踪源的类别开关。

use std::time::Duration;

use super::models::{TraceCategory, TraceEvent};

/// 打开追踪流时使用的选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceStreamOptions {
    pub s3: bool,
    pub internal: bool,
    pub storage: bool,
    pub os: bool,
    pub scanner: bool,
    pub healing: bool,
    pub decommission: bool,
    pub batch_replication: bool,
    /// 低于该耗时的事件由追踪源排除
    pub threshold: Duration,
    /// 只追踪失败的调用
    pub only_errors: bool,
}

impl TraceStreamOptions {
    /// 根据类别名称、`all` 开关与透传参数构造选项
    ///
    /// `all` 优先于名称列表；无名称时默认只追踪 S3。无法识别的名称被忽略。
    #[must_use]
    pub fn from_selectors<S: AsRef<str>>(
        calls: &[S],
        all: bool,
        threshold: Duration,
        only_errors: bool,
    ) -> Self {
        let mut opts = Self {
            threshold,
            only_errors,
            ..Self::default()
        };

        if all {
            for category in TraceCategory::ALL {
                opts.enable(category);
            }
            return opts;
        }

        if calls.is_empty() {
            opts.s3 = true;
            return opts;
        }

        for call in calls {
            if let Some(category) = category_for_call(call.as_ref()) {
                opts.enable(category);
            }
        }
        opts
    }

    /// 打开指定类别的开关
    pub fn enable(&mut self, category: TraceCategory) {
        match category {
            TraceCategory::S3 => self.s3 = true,
            TraceCategory::Internal => self.internal = true,
            TraceCategory::Storage => self.storage = true,
            TraceCategory::Os => self.os = true,
            TraceCategory::Scanner => self.scanner = true,
            TraceCategory::Healing => self.healing = true,
            TraceCategory::Decommission => self.decommission = true,
            TraceCategory::BatchReplication => self.batch_replication = true,
            TraceCategory::Other => {}
        }
    }

    /// 类别开关是否打开
    #[must_use]
    pub const fn is_enabled(&self, category: TraceCategory) -> bool {
        match category {
            TraceCategory::S3 => self.s3,
            TraceCategory::Internal => self.internal,
            TraceCategory::Storage => self.storage,
            TraceCategory::Os => self.os,
            TraceCategory::Scanner => self.scanner,
            TraceCategory::Healing => self.healing,
            TraceCategory::Decommission => self.decommission,
            TraceCategory::BatchReplication => self.batch_replication,
            TraceCategory::Other => false,
        }
    }

    /// 已打开的类别，用于日志
    #[must_use]
    pub fn enabled_categories(&self) -> Vec<TraceCategory> {
        TraceCategory::ALL
            .into_iter()
            .filter(|category| self.is_enabled(*category))
            .collect()
    }

    /// 在本地应用选项（回放源没有服务端替我们过滤）
    #[must_use]
    pub fn admits(&self, event: &TraceEvent) -> bool {
        if !self.is_enabled(event.category()) {
            return false;
        }
        if event.duration < self.threshold {
            return false;
        }
        !self.only_errors || event.is_failure()
    }
}

/// 类别名称及同义词
fn category_for_call(call: &str) -> Option<TraceCategory> {
    let category = match call {
        "s3" => TraceCategory::S3,
        "internal" => TraceCategory::Internal,
        "storage" => TraceCategory::Storage,
        "os" => TraceCategory::Os,
        "scanner" => TraceCategory::Scanner,
        "heal" | "healing" => TraceCategory::Healing,
        "decom" | "decommission" => TraceCategory::Decommission,
        "batch-replication" => TraceCategory::BatchReplication,
        _ => return None,
    };
    Some(category)
}
