//! # 通配符匹配
//!
//! 过滤条件中的模式在构造谓词时一次性编译为正则表达式：
//! - 路径/请求头：`*` 匹配任意字符序列（包括 `/`），`?` 匹配单个字符
//! - 函数名/节点名：shell 风格，`*` 不跨越 `/`，支持 `[...]` 字符类与 `\` 转义；
//!   模式与名称的最后一段匹配，或与名称的任一段完全相同；无法编译的模式只按后者匹配

use regex::Regex;

use crate::error::Result;

/// 已编译的通配符模式
#[derive(Debug, Clone)]
pub struct Glob {
    regex: Regex,
}

impl Glob {
    /// 扁平命名空间通配：`*` 可跨越 `/`
    pub fn wildcard(pattern: &str) -> Result<Self> {
        let body = translate_wildcard(pattern);
        Self::compile(&format!("^{body}$"))
    }

    /// 请求头通配，匹配 `"Name: value"` 形式的整行；
    /// 不含 `:` 的模式同时按请求头名称匹配
    pub fn header(pattern: &str) -> Result<Self> {
        let body = translate_wildcard(pattern);
        if pattern.contains(':') {
            Self::compile(&format!("^{body}$"))
        } else {
            Self::compile(&format!("^{body}(?::.*)?$"))
        }
    }

    /// shell 风格通配：`*` 不跨越 `/`
    pub fn shell(pattern: &str) -> Result<Self> {
        let body = translate_shell(pattern);
        Self::compile(&format!("^{body}$"))
    }

    fn compile(regex: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(&format!("(?s){regex}"))?,
        })
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// 路径匹配器，模式先被规范化为以 `/` 开头
#[derive(Debug, Clone)]
pub struct PathMatcher(Glob);

impl PathMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self(Glob::wildcard(&rooted(pattern))?))
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.0.is_match(path)
    }
}

/// 名称匹配器（函数名、节点名）
#[derive(Debug, Clone)]
pub struct NameMatcher {
    raw: String,
    /// 无效字符类（如 `[z-a]`）时为空
    glob: Option<Glob>,
}

impl NameMatcher {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            raw: pattern.to_string(),
            glob: Glob::shell(pattern).ok(),
        }
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.glob.as_ref().is_some_and(|glob| glob.is_match(base_name(name)))
            || name.split('/').any(|part| part == self.raw)
    }
}

/// 以 `/` 为根规范化路径，语义同 `path.Join("/", p)`
#[must_use]
pub fn rooted(pattern: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in pattern.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

/// 名称的最后一段
fn base_name(name: &str) -> &str {
    if name.is_empty() {
        return ".";
    }
    let trimmed = name.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

fn translate_wildcard(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => push_literal(&mut out, other),
        }
    }
    out
}

fn translate_shell(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '\\' if i + 1 < chars.len() => {
                i += 1;
                push_literal(&mut out, chars[i]);
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push_str(&translate_class(&chars[i + 1..end]));
                    i = end;
                }
                None => push_literal(&mut out, '['),
            },
            other => push_literal(&mut out, other),
        }
        i += 1;
    }
    out
}

/// 字符类结束位置；`]` 紧跟在 `[` 或取反符号后时视为普通字符
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if matches!(chars.get(i), Some('!' | '^')) {
        i += 1;
    }
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    while i < chars.len() {
        match chars[i] {
            ']' => return Some(i),
            '\\' => i += 2,
            _ => i += 1,
        }
    }
    None
}

fn translate_class(body: &[char]) -> String {
    let mut out = String::from("[");
    let mut rest = body;
    if let Some(('!' | '^', tail)) = rest.split_first() {
        out.push('^');
        rest = tail;
    }
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            '\\' if i + 1 < rest.len() => {
                i += 1;
                push_literal(&mut out, rest[i]);
            }
            '-' => out.push('-'),
            ch => push_literal(&mut out, ch),
        }
        i += 1;
    }
    out.push(']');
    out
}

fn push_literal(out: &mut String, ch: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("my-bucket/my-prefix/*", "/my-bucket/my-prefix/*")]
    #[case("/bucket/obj", "/bucket/obj")]
    #[case("bucket//a/./b/../c/", "/bucket/a/c")]
    #[case("", "/")]
    #[case("../..", "/")]
    fn rooted_patterns(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(rooted(input), expected);
    }

    #[rstest]
    #[case("bucket/*", "/bucket/a/b/c", true)]
    #[case("bucket/obj", "/bucket/obj", true)]
    #[case("bucket/obj", "/bucket/obj2", false)]
    #[case("bucket/ob?", "/bucket/obj", true)]
    #[case("*", "/anything/at/all", true)]
    #[case("bucket.v1/*", "/bucketXv1/a", false)]
    fn path_matching(#[case] pattern: &str, #[case] path: &str, #[case] expected: bool) {
        assert_eq!(PathMatcher::new(pattern).unwrap().matches(path), expected);
    }

    #[rstest]
    #[case("s3.GetObject", "s3.GetObject", true)]
    #[case("s3.*", "s3.PutObject", true)]
    #[case("s3.Get*", "s3.PutObject", false)]
    #[case("node[12]:9000", "node2:9000", true)]
    #[case("node[!12]:9000", "node2:9000", false)]
    #[case("node?", "node3", true)]
    #[case("storage", "http://storage/x", true)]
    #[case("node1", "node10", false)]
    fn name_matching(#[case] pattern: &str, #[case] name: &str, #[case] expected: bool) {
        assert_eq!(NameMatcher::new(pattern).matches(name), expected);
    }

    #[test]
    fn header_pattern_matches_name_or_full_line() {
        let by_name = Glob::header("X-Amz-Request-Id").unwrap();
        assert!(by_name.is_match("X-Amz-Request-Id: abc"));
        assert!(!by_name.is_match("X-Amz-Request-Idx: abc"));

        let by_line = Glob::header("Content-Type: application/*").unwrap();
        assert!(by_line.is_match("Content-Type: application/json"));
        assert!(!by_line.is_match("Content-Type: text/plain"));

        let wildcard_name = Glob::header("X-Amz-*").unwrap();
        assert!(wildcard_name.is_match("X-Amz-Date: 20240101"));
    }

    #[test]
    fn unterminated_class_is_literal() {
        let matcher = NameMatcher::new("node[1");
        assert!(matcher.matches("node[1"));
        assert!(!matcher.matches("node1"));
    }

    #[rstest]
    #[case("node[z-a]", "node1", false)]
    #[case("node[z-a]", "node[z-a]", true)]
    #[case("node[z-a]", "pool/node[z-a]", true)]
    fn invalid_class_only_matches_exact_segment(
        #[case] pattern: &str,
        #[case] name: &str,
        #[case] expected: bool,
    ) {
        assert!(Glob::shell(pattern).is_err());
        assert_eq!(NameMatcher::new(pattern).matches(name), expected);
    }
}
