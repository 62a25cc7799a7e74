//! # 终端着色上下文
//!
//! 每次运行持有自己的 [`Styler`]，决定是否输出 ANSI 颜色；不存在进程级的颜色注册表。

use crate::trace::color::{PALETTE_SIZE, color_for};

// ANSI escape codes.
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

/// 节点调色板：青、白、黄、绿
const NODE_PALETTE: [&str; PALETTE_SIZE] = [CYAN, WHITE, YELLOW, GREEN];

/// 具名样式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Stat,
    Request,
    Method,
    Host,
    FuncName,
    ReqHeaderKey,
    RespHeaderKey,
    HeaderValue,
    /// 成功状态
    RespStatus,
    /// 错误状态
    ErrStatus,
    Response,
    Body,
}

impl Style {
    const fn codes(self) -> (&'static str, &'static str) {
        match self {
            Self::Stat => ("", YELLOW),
            Self::Request => ("", CYAN),
            Self::Method | Self::ReqHeaderKey => (BOLD, WHITE),
            Self::Host | Self::FuncName => (BOLD, GREEN),
            Self::RespHeaderKey => (BOLD, CYAN),
            Self::HeaderValue => ("", WHITE),
            Self::RespStatus => (BOLD, YELLOW),
            Self::ErrStatus => (BOLD, RED),
            Self::Response => ("", GREEN),
            Self::Body => ("", YELLOW),
        }
    }
}

/// 着色器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Styler {
    enabled: bool,
}

impl Styler {
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// 不输出任何转义序列
    #[must_use]
    pub const fn plain() -> Self {
        Self::new(false)
    }

    /// 按样式着色
    #[must_use]
    pub fn paint(&self, style: Style, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        let (weight, color) = style.codes();
        format!("{weight}{color}{text}{RESET}")
    }

    /// 按节点名着色
    #[must_use]
    pub fn node(&self, node_name: &str) -> String {
        if !self.enabled {
            return node_name.to_string();
        }
        format!("{}{node_name}{RESET}", NODE_PALETTE[color_for(node_name)])
    }
}
