//! 时间类型模块
//!
//! 提供三类工具：
//! - `Timestamp`: 可序列化的毫秒时间戳，用于写入存储
//! - `RawTime`: 从存储读出的原始时间值（存储时间戳 / 毫秒数 / 字符串）
//! - `normalize_time`: 在订阅边界把原始值转换为 `DateTime<Utc>`

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// =========================================================
// Timestamp - 可传输的时间戳类型
// =========================================================

/// 毫秒时间戳，内部存储为自 Unix 纪元以来的毫秒数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    #[inline]
    pub const fn new(ms: i64) -> Self {
        Self(ms)
    }

    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// 转换为 UTC 时间，超出可表示范围时返回 None
    pub fn to_date_time(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Self(ms)
    }
}

// =========================================================
// RawTime - 存储中的原始时间值
// =========================================================

/// 存储文档里时间字段可能出现的形态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTime {
    /// 存储原生时间戳 `{ seconds, nanoseconds }`
    Stored {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    /// Unix 纪元毫秒数
    Millis(f64),
    /// RFC 3339 字符串，或表单 `datetime-local` 产生的本地时间字符串
    Text(String),
}

/// 无时区的本地时间格式（按优先级尝试）
const LOCAL_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

impl RawTime {
    /// 转换为 UTC 时间，无法解释时返回 None
    pub fn to_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTime::Stored {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds),
            RawTime::Millis(ms) if ms.is_finite() => DateTime::from_timestamp_millis(*ms as i64),
            RawTime::Millis(_) => None,
            RawTime::Text(text) => parse_time_text(text),
        }
    }
}

fn parse_time_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    LOCAL_TIME_FORMATS.iter().find_map(|fmt| {
        let naive = NaiveDateTime::parse_from_str(text, fmt).ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// 宽松解析：缺失或无法解析的时间回落到 `now`，保证列表渲染不中断
pub fn normalize_time(raw: Option<&serde_json::Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    raw.and_then(|value| serde_json::from_value::<RawTime>(value.clone()).ok())
        .and_then(|time| time.to_date_time())
        .unwrap_or(now)
}

// =========================================================
// 显示格式
// =========================================================

/// 以本地时区渲染提醒时间，如 `Jan 5, 2026, 09:30 AM`
pub fn format_date_time(dt: &DateTime<Utc>) -> String {
    format_date_time_in(dt, &Local)
}

/// 以指定时区渲染提醒时间
pub fn format_date_time_in<Tz: TimeZone>(dt: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.with_timezone(tz).format("%b %-d, %Y, %I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fallback() -> DateTime<Utc> {
        DateTime::from_timestamp(1_000, 0).unwrap()
    }

    #[test]
    fn test_stored_timestamp_is_normalized() {
        let raw = json!({ "seconds": 1_767_225_600, "nanoseconds": 500_000_000 });
        let dt = normalize_time(Some(&raw), fallback());
        assert_eq!(dt.timestamp(), 1_767_225_600);
        assert_eq!(dt.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_underscore_timestamp_alias() {
        let raw = json!({ "_seconds": 60, "_nanoseconds": 0 });
        assert_eq!(normalize_time(Some(&raw), fallback()).timestamp(), 60);
    }

    #[test]
    fn test_millis_and_rfc3339() {
        let millis = json!(1_700_000_000_123i64);
        assert_eq!(
            normalize_time(Some(&millis), fallback()).timestamp_millis(),
            1_700_000_000_123
        );

        let text = json!("2026-01-05T09:30:00Z");
        let dt = normalize_time(Some(&text), fallback());
        assert_eq!(dt, DateTime::parse_from_rfc3339("2026-01-05T09:30:00Z").unwrap());
    }

    #[test]
    fn test_datetime_local_string_uses_local_zone() {
        let text = json!("2026-03-01T08:15");
        let expected = Local
            .from_local_datetime(
                &NaiveDateTime::parse_from_str("2026-03-01T08:15", "%Y-%m-%dT%H:%M").unwrap(),
            )
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(normalize_time(Some(&text), fallback()), expected);
    }

    #[test]
    fn test_missing_or_garbage_falls_back_to_now() {
        assert_eq!(normalize_time(None, fallback()), fallback());
        assert_eq!(normalize_time(Some(&json!(null)), fallback()), fallback());
        assert_eq!(normalize_time(Some(&json!("next tuesday")), fallback()), fallback());
        assert_eq!(normalize_time(Some(&json!({ "foo": 1 })), fallback()), fallback());
    }

    #[test]
    fn test_format_in_utc() {
        let dt = DateTime::parse_from_rfc3339("2026-01-05T21:07:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_date_time_in(&dt, &Utc), "Jan 5, 2026, 09:07 PM");
    }

    #[test]
    fn test_timestamp_round_trips_through_date_time() {
        let ts = Timestamp::new(1_700_000_000_000);
        let dt = ts.to_date_time().unwrap();
        assert_eq!(Timestamp::from(dt), ts);
    }
}
