//! # 错误处理宏

/// 快速创建配置错误的宏
#[macro_export]
macro_rules! config_error {
    ($fmt:literal $(, $($arg:tt)*)?) => {
        $crate::error::TraceError::config(format!($fmt $(, $($arg)*)?))
    };
    ($msg:expr) => {
        $crate::error::TraceError::config($msg)
    };
}

/// 快速创建过滤条件错误的宏
#[macro_export]
macro_rules! selector_error {
    ($fmt:literal $(, $($arg:tt)*)?) => {
        $crate::error::TraceError::selector(format!($fmt $(, $($arg)*)?))
    };
    ($msg:expr) => {
        $crate::error::TraceError::selector($msg)
    };
}

/// 快速创建传输错误的宏
#[macro_export]
macro_rules! transport_error {
    ($fmt:literal $(, $($arg:tt)*)?) => {
        $crate::error::TraceError::transport(format!($fmt $(, $($arg)*)?))
    };
    ($msg:expr) => {
        $crate::error::TraceError::transport($msg)
    };
}

/// 确保条件成立，否则返回配置错误
#[macro_export]
macro_rules! ensure_config {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::config_error!($msg));
        }
    };
    ($cond:expr, $fmt:literal, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::config_error!($fmt, $($arg)*));
        }
    };
}
