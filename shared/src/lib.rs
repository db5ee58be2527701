pub mod date;
pub mod profile;
pub mod protocol;
pub mod reminder;

pub use chrono;
pub use date::{RawTime, Timestamp, format_date_time, normalize_time};
pub use profile::{EmergencyContact, REQUIRED_PROFILE_FIELDS, UserProfile};
pub use reminder::{NewReminder, RawReminder, ReminderPatch, ReminderRecord, upcoming};

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 未配置项目 ID 时使用的存储命名空间
pub const DEFAULT_APP_ID: &str = "default-app-id";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// 仪表盘首页展示的即将到来的提醒数量
pub const UPCOMING_CARD_LIMIT: usize = 3;
/// 首页新闻卡片展示的文章数量
pub const NEWS_CARD_LIMIT: usize = 5;

// =========================================================
// 存储路径 (Store paths)
// =========================================================

/// 把空命名空间替换为默认值
pub fn namespace(app_id: &str) -> &str {
    if app_id.trim().is_empty() {
        DEFAULT_APP_ID
    } else {
        app_id
    }
}

/// `artifacts/{appId}/users/{uid}/profile_data/{uid}`
pub fn profile_doc_path(app_id: &str, uid: &str) -> String {
    format!(
        "artifacts/{}/users/{uid}/profile_data/{uid}",
        namespace(app_id)
    )
}

/// `artifacts/{appId}/users/{uid}/reminders`
pub fn reminders_collection_path(app_id: &str, uid: &str) -> String {
    format!("artifacts/{}/users/{uid}/reminders", namespace(app_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_paths() {
        assert_eq!(
            profile_doc_path("medizap-prod", "u1"),
            "artifacts/medizap-prod/users/u1/profile_data/u1"
        );
        assert_eq!(
            reminders_collection_path("", "u2"),
            "artifacts/default-app-id/users/u2/reminders"
        );
    }
}
