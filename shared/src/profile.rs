use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// 完整性判定要求非空的字段（按存储字段名）
pub const REQUIRED_PROFILE_FIELDS: [&str; 3] = [
    "displayName",
    "emergencyContact.name",
    "emergencyContact.email",
];

/// 宽松读取：`null` 或类型不符的字段按默认值处理
///
/// 文档由多个客户端写入（例如用认证用户的 `displayName: null` 预填），
/// 字段形状不对只说明资料不完整，不是存储故障。
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// 可选字段写入时保留 `null`，合并写入才能清除旧值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient")]
    pub phone: Option<String>,
}

/// 用户资料文档
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, deserialize_with = "lenient")]
    pub display_name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub date_of_birth: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub blood_group: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub emergency_contact: EmergencyContact,
}

impl UserProfile {
    /// 列出仍为空白的必填字段
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let values = [
            self.display_name.as_str(),
            self.emergency_contact.name.as_str(),
            self.emergency_contact.email.as_str(),
        ];
        REQUIRED_PROFILE_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// 去掉首尾空白，空的可选字段归为 None
    pub fn normalized(mut self) -> Self {
        fn tidy(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        self.display_name = self.display_name.trim().to_string();
        self.phone_number = tidy(self.phone_number);
        self.date_of_birth = tidy(self.date_of_birth);
        self.blood_group = tidy(self.blood_group);
        self.emergency_contact.name = self.emergency_contact.name.trim().to_string();
        self.emergency_contact.email = self.emergency_contact.email.trim().to_string();
        self.emergency_contact.phone = tidy(self.emergency_contact.phone);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_document_reports_missing_fields() {
        let profile: UserProfile = serde_json::from_value(json!({
            "displayName": "Asha",
            "emergencyContact": { "name": "  " }
        }))
        .unwrap();

        assert_eq!(
            profile.missing_fields(),
            vec!["emergencyContact.name", "emergencyContact.email"]
        );
        assert!(!profile.is_complete());
    }

    #[test]
    fn test_complete_profile() {
        let profile: UserProfile = serde_json::from_value(json!({
            "displayName": "Asha",
            "bloodGroup": "O+",
            "emergencyContact": { "name": "Ravi", "email": "ravi@example.com" }
        }))
        .unwrap();
        assert!(profile.is_complete());
        assert_eq!(profile.blood_group.as_deref(), Some("O+"));
    }

    #[test]
    fn test_null_and_mistyped_fields_read_as_blank() {
        let profile: UserProfile = serde_json::from_value(json!({
            "displayName": null,
            "phoneNumber": 5551234,
            "emergencyContact": { "name": "Ravi", "email": "ravi@example.com", "phone": null }
        }))
        .unwrap();
        assert_eq!(profile.display_name, "");
        assert_eq!(profile.phone_number, None);
        assert_eq!(profile.missing_fields(), vec!["displayName"]);

        let profile: UserProfile = serde_json::from_value(json!({
            "displayName": "Asha",
            "emergencyContact": "Ravi"
        }))
        .unwrap();
        assert_eq!(
            profile.missing_fields(),
            vec!["emergencyContact.name", "emergencyContact.email"]
        );

        let profile: UserProfile =
            serde_json::from_value(json!({ "displayName": "Asha", "emergencyContact": null }))
                .unwrap();
        assert_eq!(profile.emergency_contact, EmergencyContact::default());
    }

    #[test]
    fn test_normalized_drops_blank_optionals() {
        let profile = UserProfile {
            display_name: " Asha ".into(),
            phone_number: Some("   ".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(profile.display_name, "Asha");
        assert_eq!(profile.phone_number, None);

        // 清空的字段写成 null，合并写入会覆盖旧值
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value.get("phoneNumber"), Some(&serde_json::Value::Null));
        assert_eq!(value["emergencyContact"].get("phone"), Some(&serde_json::Value::Null));
    }
}
