//! # 谓词匹配器
//!
//! 组内任一条件满足即可（OR），非空的组之间必须全部满足（AND），空组不构成约束。
//! 状态码、方法与请求头组需要 HTTP 明细，事件没有明细时直接判定为不匹配。

use std::fmt;

use super::glob::{Glob, NameMatcher, PathMatcher};
use super::models::{HeaderMultiMap, TraceEvent};
use crate::error::Result;

/// 单个请求头匹配条件，`!` 前缀表示取反
#[derive(Debug, Clone)]
pub struct HeaderMatch {
    pattern: Glob,
    negate: bool,
}

impl HeaderMatch {
    /// 解析 `[!]pattern` 形式的条件
    pub fn parse(raw: &str) -> Result<Self> {
        let (negate, pattern) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        Ok(Self {
            pattern: Glob::header(pattern)?,
            negate,
        })
    }

    /// 在所有请求头（`"Name: value"` 形式）中查找匹配项
    fn header_found(&self, headers: &HeaderMultiMap) -> bool {
        headers.iter().any(|(name, values)| {
            values
                .iter()
                .any(|value| self.pattern.is_match(&format!("{name}: {value}")))
        })
    }

    fn is_satisfied(&self, headers: &HeaderMultiMap) -> bool {
        self.header_found(headers) != self.negate
    }
}

/// 拒绝事件的过滤组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterGroup {
    Path,
    StatusCode,
    Method,
    FuncName,
    Node,
    RequestHeader,
}

impl fmt::Display for FilterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Path => "path",
            Self::StatusCode => "status-code",
            Self::Method => "method",
            Self::FuncName => "funcname",
            Self::Node => "node",
            Self::RequestHeader => "request-header",
        };
        f.write_str(name)
    }
}

/// 复合过滤谓词
#[derive(Debug, Clone, Default)]
pub struct FilterPredicate {
    status_codes: Vec<u16>,
    methods: Vec<String>,
    func_names: Vec<NameMatcher>,
    paths: Vec<PathMatcher>,
    nodes: Vec<NameMatcher>,
    request_headers: Vec<HeaderMatch>,
}

impl FilterPredicate {
    /// 编译所有模式；函数名与节点名中的无效字符类不报错，只按名称段完全相同匹配
    pub fn new<S: AsRef<str>>(
        status_codes: &[u16],
        methods: &[S],
        func_names: &[S],
        paths: &[S],
        nodes: &[S],
        request_headers: &[S],
    ) -> Result<Self> {
        Ok(Self {
            status_codes: status_codes.to_vec(),
            methods: methods.iter().map(|m| m.as_ref().to_string()).collect(),
            func_names: func_names.iter().map(|p| NameMatcher::new(p.as_ref())).collect(),
            paths: paths
                .iter()
                .map(|p| PathMatcher::new(p.as_ref()))
                .collect::<Result<_>>()?,
            nodes: nodes.iter().map(|p| NameMatcher::new(p.as_ref())).collect(),
            request_headers: request_headers
                .iter()
                .map(|h| HeaderMatch::parse(h.as_ref()))
                .collect::<Result<_>>()?,
        })
    }

    /// 所有组都为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status_codes.is_empty()
            && self.methods.is_empty()
            && self.func_names.is_empty()
            && self.paths.is_empty()
            && self.nodes.is_empty()
            && self.request_headers.is_empty()
    }

    /// 是否包含只对 HTTP 类别生效的条件（状态码、方法、请求头）
    #[must_use]
    pub fn requires_http(&self) -> bool {
        !self.status_codes.is_empty() || !self.methods.is_empty() || !self.request_headers.is_empty()
    }

    /// 事件是否保留
    #[must_use]
    pub fn matches(&self, event: &TraceEvent) -> bool {
        self.rejection(event).is_none()
    }

    /// 第一个拒绝该事件的过滤组，`None` 表示保留
    #[must_use]
    pub fn rejection(&self, event: &TraceEvent) -> Option<FilterGroup> {
        let http = event.http();

        if !self.paths.is_empty() && !self.paths.iter().any(|p| p.matches(&event.path)) {
            return Some(FilterGroup::Path);
        }

        if !self.status_codes.is_empty()
            && !http.is_some_and(|h| self.status_codes.contains(&h.response.status_code))
        {
            return Some(FilterGroup::StatusCode);
        }

        if !self.methods.is_empty()
            && !http.is_some_and(|h| self.methods.iter().any(|m| *m == h.request.method))
        {
            return Some(FilterGroup::Method);
        }

        if !self.func_names.is_empty()
            && !self.func_names.iter().any(|f| f.matches(&event.func_name))
        {
            return Some(FilterGroup::FuncName);
        }

        if !self.nodes.is_empty() && !self.nodes.iter().any(|n| n.matches(&event.node_name)) {
            return Some(FilterGroup::Node);
        }

        if !self.request_headers.is_empty()
            && !http.is_some_and(|h| {
                self.request_headers
                    .iter()
                    .any(|hdr| hdr.is_satisfied(&h.request.headers))
            })
        {
            return Some(FilterGroup::RequestHeader);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TraceEventFixture;
    use proptest::prelude::*;

    fn predicate(
        status_codes: &[u16],
        methods: &[&str],
        func_names: &[&str],
        paths: &[&str],
        nodes: &[&str],
        headers: &[&str],
    ) -> FilterPredicate {
        FilterPredicate::new(status_codes, methods, func_names, paths, nodes, headers).unwrap()
    }

    fn get_404() -> TraceEvent {
        TraceEventFixture::s3()
            .node("node1")
            .path("/bucket/obj")
            .method("GET")
            .status(404)
            .duration_ms(12)
            .build()
    }

    #[test]
    fn status_code_scenario() {
        let event = get_404();
        assert!(predicate(&[404], &[], &[], &[], &[], &[]).matches(&event));
        assert_eq!(
            predicate(&[200], &[], &[], &[], &[], &[]).rejection(&event),
            Some(FilterGroup::StatusCode)
        );
        assert!(predicate(&[200, 404], &[], &[], &[], &[], &[]).matches(&event));
    }

    #[test]
    fn http_groups_drop_events_without_detail() {
        let storage = TraceEventFixture::storage().node("node1").path("/disk1").build();
        assert!(!predicate(&[], &["GET"], &[], &[], &[], &[]).matches(&storage));
        assert!(!predicate(&[200], &[], &[], &[], &[], &[]).matches(&storage));
        assert!(!predicate(&[], &[], &[], &[], &[], &["!X-Foo"]).matches(&storage));
        // 节点/函数/路径组适用于所有类别
        assert!(predicate(&[], &[], &[], &["disk1"], &["node1"], &[]).matches(&storage));
    }

    #[test]
    fn groups_combine_with_and() {
        let event = get_404();
        assert!(predicate(&[404], &["GET"], &[], &["bucket/*"], &["node1"], &[]).matches(&event));
        assert_eq!(
            predicate(&[404], &["PUT"], &[], &["bucket/*"], &[], &[]).rejection(&event),
            Some(FilterGroup::Method)
        );
        assert_eq!(
            predicate(&[404], &[], &[], &["other/*"], &[], &[]).rejection(&event),
            Some(FilterGroup::Path)
        );
        assert_eq!(
            predicate(&[], &[], &[], &[], &["node2"], &[]).rejection(&event),
            Some(FilterGroup::Node)
        );
    }

    #[test]
    fn func_name_glob() {
        let event = TraceEventFixture::s3().func("s3.GetObject").build();
        assert!(predicate(&[], &[], &["s3.Get*"], &[], &[], &[]).matches(&event));
        assert!(!predicate(&[], &[], &["s3.Put*"], &[], &[], &[]).matches(&event));
    }

    #[test]
    fn header_positive_and_negated() {
        let event = TraceEventFixture::s3()
            .request_header("X-Amz-Request-Id", "abc")
            .build();
        assert!(predicate(&[], &[], &[], &[], &[], &["X-Amz-Request-Id"]).matches(&event));
        assert!(!predicate(&[], &[], &[], &[], &[], &["!X-Amz-Request-Id"]).matches(&event));

        let bare = TraceEventFixture::s3().build();
        assert!(predicate(&[], &[], &[], &[], &[], &["!X-Amz-Request-Id"]).matches(&bare));
    }

    #[test]
    fn header_entries_combine_with_or() {
        let event = TraceEventFixture::s3()
            .request_header("X-Amz-Request-Id", "abc")
            .build();
        // 正向条件不满足、取反条件满足，整组仍然通过
        let mixed = predicate(&[], &[], &[], &[], &[], &["X-Missing", "!X-Other"]);
        assert!(mixed.matches(&event));

        let both_fail = predicate(&[], &[], &[], &[], &[], &["X-Missing", "!X-Amz-Request-Id"]);
        assert!(!both_fail.matches(&event));
    }

    #[test]
    fn header_value_glob() {
        let event = TraceEventFixture::s3()
            .request_header("Content-Type", "application/xml")
            .build();
        assert!(predicate(&[], &[], &[], &[], &[], &["Content-Type: application/*"]).matches(&event));
        assert!(!predicate(&[], &[], &[], &[], &[], &["Content-Type: text/*"]).matches(&event));
    }

    #[test]
    fn header_match_parses_negation() {
        let event = TraceEventFixture::s3().request_header("X-Foo", "bar").build();
        let headers = &event.http().unwrap().request.headers;
        assert!(HeaderMatch::parse("X-Foo").unwrap().is_satisfied(headers));
        assert!(!HeaderMatch::parse("!X-Foo").unwrap().is_satisfied(headers));
        assert!(HeaderMatch::parse("!X-Bar").unwrap().is_satisfied(headers));
    }

    #[test]
    fn http_only_groups_are_reported() {
        assert!(!predicate(&[], &[], &["s3.*"], &["bucket"], &["node1"], &[]).requires_http());
        assert!(predicate(&[404], &[], &[], &[], &[], &[]).requires_http());
        assert!(predicate(&[], &["GET"], &[], &[], &[], &[]).requires_http());
        assert!(predicate(&[], &[], &[], &[], &[], &["!X-Foo"]).requires_http());
    }

    #[test]
    fn invalid_name_class_rejects_instead_of_failing() {
        let predicate = predicate(&[], &[], &["s3.[z-a]"], &[], &[], &[]);
        let event = TraceEventFixture::s3().build();
        assert_eq!(predicate.rejection(&event), Some(FilterGroup::FuncName));
    }

    proptest! {
        #[test]
        fn empty_predicate_keeps_everything(
            node in "[a-z0-9:.]{0,16}",
            path in "/[a-z0-9/]{0,24}",
            status in 100u16..600,
            storage in any::<bool>(),
        ) {
            let event = if storage {
                TraceEventFixture::storage().node(&node).path(&path).build()
            } else {
                TraceEventFixture::s3().node(&node).path(&path).status(status).build()
            };
            let empty = FilterPredicate::default();
            prop_assert!(empty.is_empty());
            prop_assert!(empty.matches(&event));
        }
    }
}
