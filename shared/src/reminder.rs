//! 提醒记录
//!
//! `RawReminder` 是存储快照里的原始文档，`ReminderRecord` 是订阅边界归一化后的本地记录。

use crate::date::{Timestamp, normalize_time};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const FIELD_TITLE: &str = "title";
const FIELD_MESSAGE: &str = "message";
const FIELD_DATE_TIME: &str = "dateTime";
const FIELD_DISMISSED: &str = "isDismissed";

/// 快照中的一条文档：文档键 + 原始字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReminder {
    pub id: String,
    #[serde(default)]
    pub data: Value,
}

impl RawReminder {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRecord {
    pub id: String,
    pub title: String,
    pub message: String,
    pub date_time: DateTime<Utc>,
    pub is_dismissed: bool,
    /// 未识别的其余字段，原样保留
    pub extra: Map<String, Value>,
}

impl ReminderRecord {
    /// 归一化一条原始文档，时间缺失或无法解析时使用 `now`
    pub fn from_raw(raw: RawReminder, now: DateTime<Utc>) -> Self {
        let mut fields = match raw.data {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let date_time = normalize_time(fields.get(FIELD_DATE_TIME), now);
        fields.remove(FIELD_DATE_TIME);
        let title = take_text(&mut fields, FIELD_TITLE);
        let message = take_text(&mut fields, FIELD_MESSAGE);
        let is_dismissed = fields
            .remove(FIELD_DISMISSED)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Self {
            id: raw.id,
            title,
            message,
            date_time,
            is_dismissed,
            extra: fields,
        }
    }

    /// 列表显示用的标签：优先标题，其次正文
    pub fn label(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.message
        } else {
            &self.title
        }
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        !self.is_dismissed && self.date_time > now
    }
}

fn take_text(fields: &mut Map<String, Value>, key: &str) -> String {
    match fields.remove(key) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// 未忽略且晚于 `now` 的记录，保持投递顺序，取前 `limit` 条
pub fn upcoming(records: &[ReminderRecord], now: DateTime<Utc>, limit: usize) -> Vec<ReminderRecord> {
    records
        .iter()
        .filter(|r| r.is_upcoming(now))
        .take(limit)
        .cloned()
        .collect()
}

// =========================================================
// 写入载荷
// =========================================================

/// 新建提醒
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReminder {
    pub title: String,
    pub message: String,
    /// 以毫秒写出，适配器负责转换为存储原生时间戳
    pub date_time: Timestamp,
    #[serde(default)]
    pub is_dismissed: bool,
}

impl NewReminder {
    pub fn new(title: impl Into<String>, message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            date_time: at.into(),
            is_dismissed: false,
        }
    }
}

/// 部分更新，只写出出现的字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_dismissed: Option<bool>,
}

impl ReminderPatch {
    pub fn dismiss() -> Self {
        Self {
            is_dismissed: Some(true),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.message.is_none()
            && self.date_time.is_none()
            && self.is_dismissed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_from_raw_keeps_unknown_fields() {
        let raw = RawReminder::new(
            "r1",
            json!({
                "title": "Metformin",
                "message": "after lunch",
                "dateTime": { "seconds": 500, "nanoseconds": 0 },
                "isDismissed": true,
                "dosage": "500mg"
            }),
        );
        let record = ReminderRecord::from_raw(raw, at(1));

        assert_eq!(record.id, "r1");
        assert_eq!(record.title, "Metformin");
        assert_eq!(record.date_time, at(500));
        assert!(record.is_dismissed);
        assert_eq!(record.extra.get("dosage"), Some(&json!("500mg")));
        assert!(!record.extra.contains_key("dateTime"));
    }

    #[test]
    fn test_missing_time_defaults_to_now() {
        let record = ReminderRecord::from_raw(RawReminder::new("r2", json!({ "message": "walk" })), at(42));
        assert_eq!(record.date_time, at(42));
        assert_eq!(record.label(), "walk");
        assert!(!record.is_dismissed);
    }

    #[test]
    fn test_upcoming_preserves_order_and_limit() {
        let make = |id: &str, secs: i64, dismissed: bool| ReminderRecord {
            id: id.into(),
            title: id.into(),
            message: String::new(),
            date_time: at(secs),
            is_dismissed: dismissed,
            extra: Map::new(),
        };
        // 故意乱序：投递顺序必须原样保留
        let records = vec![
            make("past", 5, false),
            make("c", 300, false),
            make("dismissed", 150, true),
            make("a", 100, false),
            make("b", 200, false),
            make("d", 400, false),
        ];
        let ids: Vec<_> = upcoming(&records, at(10), 3).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_patch_serializes_present_fields_only() {
        let value = serde_json::to_value(ReminderPatch::dismiss()).unwrap();
        assert_eq!(value, json!({ "isDismissed": true }));
        assert!(ReminderPatch::default().is_empty());

        let new = serde_json::to_value(NewReminder::new("t", "m", at(2))).unwrap();
        assert_eq!(new["dateTime"], json!(2000));
        assert_eq!(new["isDismissed"], json!(false));
    }
}
