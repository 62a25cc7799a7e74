//! # 显示单位
//!
//! 耗时、字节数、状态码文本与时间戳的人类可读形式。

use std::time::Duration;

use chrono::{DateTime, Local, Utc};

use crate::error::Result;
use crate::selector_error;

/// 追踪时间戳格式（本地时间，毫秒精度）
pub const TRACE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// 以本地时间格式化时间戳
#[must_use]
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local).format(TRACE_TIME_FORMAT).to_string()
}

/// 四舍五入到微秒
#[must_use]
pub fn round_to_micros(duration: Duration) -> Duration {
    let nanos = duration.as_nanos();
    let rounded = (nanos + NANOS_PER_MICRO / 2) / NANOS_PER_MICRO * NANOS_PER_MICRO;
    Duration::from_nanos(u64::try_from(rounded).unwrap_or(u64::MAX))
}

/// 紧凑的耗时表示，如 `850µs`、`12.345ms`、`1.5s`、`1m30s`
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", with_fraction(nanos, NANOS_PER_MICRO, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", with_fraction(nanos, NANOS_PER_MILLI, 6));
    }

    let secs = nanos / NANOS_PER_SEC;
    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    let seconds_nanos = seconds * NANOS_PER_SEC + nanos % NANOS_PER_SEC;
    out.push_str(&with_fraction(seconds_nanos, NANOS_PER_SEC, 9));
    out.push('s');
    out
}

fn with_fraction(value: u128, unit: u128, digits: usize) -> String {
    let whole = value / unit;
    let rest = value % unit;
    if rest == 0 {
        return whole.to_string();
    }
    let fraction = format!("{rest:0digits$}");
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

/// 二进制单位的字节数，如 `9 B`、`1.0 KiB`、`1.2 MiB`、`15 GiB`
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_ibytes(bytes: u64) -> String {
    const SIZES: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    if bytes < 10 {
        return format!("{bytes} B");
    }
    let value = bytes as f64;
    let exp = (value.ln() / 1024f64.ln()).floor();
    let exp = exp.clamp(0.0, (SIZES.len() - 1) as f64);
    let scaled = (value / 1024f64.powf(exp) * 10.0 + 0.5).floor() / 10.0;
    let suffix = SIZES[exp as usize];
    if scaled < 10.0 {
        format!("{scaled:.1} {suffix}")
    } else {
        format!("{scaled:.0} {suffix}")
    }
}

/// 状态码的标准文本，未知状态码返回空串
#[must_use]
pub fn status_text(code: u16) -> &'static str {
    http::StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("")
}

/// 解析 `500us`、`5ms`、`1.5s`、`1m30s` 形式的耗时
pub fn parse_duration(input: &str) -> Result<Duration> {
    let text = input.trim();
    if text == "0" {
        return Ok(Duration::ZERO);
    }
    if text.is_empty() {
        return Err(selector_error!("耗时不能为空"));
    }

    let mut total_nanos = 0f64;
    let mut rest = text;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(selector_error!("无效的耗时: {input}"));
        }
        let number: f64 = rest[..number_len]
            .parse()
            .map_err(|_| selector_error!("无效的耗时: {input}"))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(selector_error!("耗时缺少单位: {input}")),
            unit => return Err(selector_error!("未知的耗时单位 {unit}: {input}")),
        };
        total_nanos += number * scale;
        rest = &rest[unit_len..];
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Duration::ZERO, "0s")]
    #[case(Duration::from_nanos(999), "999ns")]
    #[case(Duration::from_micros(850), "850µs")]
    #[case(Duration::from_nanos(1_500), "1.5µs")]
    #[case(Duration::from_micros(12_345), "12.345ms")]
    #[case(Duration::from_millis(12), "12ms")]
    #[case(Duration::from_millis(1_500), "1.5s")]
    #[case(Duration::from_secs(90), "1m30s")]
    #[case(Duration::from_secs(3_600), "1h0m0s")]
    fn duration_display(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(duration), expected);
    }

    #[test]
    fn rounding_to_micros() {
        assert_eq!(round_to_micros(Duration::from_nanos(12_345_678)), Duration::from_nanos(12_346_000));
        assert_eq!(round_to_micros(Duration::from_nanos(1_499)), Duration::from_micros(1));
        assert_eq!(round_to_micros(Duration::from_nanos(400)), Duration::ZERO);
    }

    #[rstest]
    #[case(0, "0 B")]
    #[case(9, "9 B")]
    #[case(10, "10 B")]
    #[case(1_023, "1023 B")]
    #[case(1_024, "1.0 KiB")]
    #[case(1_258_291, "1.2 MiB")]
    #[case(15 * 1024 * 1024 * 1024, "15 GiB")]
    fn binary_bytes(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_ibytes(bytes), expected);
    }

    #[test]
    fn status_texts() {
        assert_eq!(status_text(200), "OK");
        assert_eq!(status_text(404), "Not Found");
        assert_eq!(status_text(503), "Service Unavailable");
        assert_eq!(status_text(0), "");
    }

    #[rstest]
    #[case("0", Duration::ZERO)]
    #[case("5ms", Duration::from_millis(5))]
    #[case("500us", Duration::from_micros(500))]
    #[case("1.5s", Duration::from_millis(1_500))]
    #[case("1m30s", Duration::from_secs(90))]
    #[case("2h", Duration::from_secs(7_200))]
    fn durations_parse(#[case] input: &str, #[case] expected: Duration) {
        assert_eq!(parse_duration(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("5")]
    #[case("ms")]
    #[case("5parsecs")]
    fn durations_reject(#[case] input: &str) {
        assert!(parse_duration(input).is_err());
    }
}
