//! 运行时配置
//!
//! 所有配置项都通过 `ConfigSource` 读取，缺失时使用 `DEFAULT_*` 常量。
//! 浏览器端的来源是编译期环境变量，测试中是 `MockEnv`。

use crate::error::{MedResult, MedizapError};
use medizap_shared::namespace;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;

pub const VAR_FIREBASE_API_KEY: &str = "MEDIZAP_FIREBASE_API_KEY";
pub const VAR_FIREBASE_AUTH_DOMAIN: &str = "MEDIZAP_FIREBASE_AUTH_DOMAIN";
pub const VAR_FIREBASE_PROJECT_ID: &str = "MEDIZAP_FIREBASE_PROJECT_ID";
pub const VAR_FIREBASE_STORAGE_BUCKET: &str = "MEDIZAP_FIREBASE_STORAGE_BUCKET";
pub const VAR_FIREBASE_MESSAGING_SENDER_ID: &str = "MEDIZAP_FIREBASE_MESSAGING_SENDER_ID";
pub const VAR_FIREBASE_APP_ID: &str = "MEDIZAP_FIREBASE_APP_ID";
pub const VAR_API_BASE_URL: &str = "MEDIZAP_API_BASE_URL";
pub const VAR_LOG_LEVEL: &str = "MEDIZAP_LOG_LEVEL";
pub const VAR_PROFILE_FAILURE_POLICY: &str = "MEDIZAP_PROFILE_FAILURE_POLICY";

/// 配置来源：按名称读取变量
pub trait ConfigSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// 资料检查失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileFailurePolicy {
    /// 放行导航，只记录错误
    #[default]
    FailOpen,
    /// 视为需要补全资料，把用户留在资料页
    FailClosed,
}

impl ProfileFailurePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fail-open" | "open" => Some(Self::FailOpen),
            "fail-closed" | "closed" => Some(Self::FailClosed),
            _ => None,
        }
    }
}

/// Firebase Web SDK 的初始化参数
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub firebase: FirebaseConfig,
    pub api_base_url: String,
    pub log_level: log::LevelFilter,
    pub profile_failure_policy: ProfileFailurePolicy,
}

impl AppConfig {
    pub fn from_source(source: &impl ConfigSource) -> Self {
        let text = |name: &str| {
            source
                .var(name)
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        let log_level = source
            .var(VAR_LOG_LEVEL)
            .and_then(|v| v.trim().parse::<log::LevelFilter>().ok())
            .unwrap_or(DEFAULT_LOG_LEVEL);

        let profile_failure_policy = match source.var(VAR_PROFILE_FAILURE_POLICY) {
            Some(raw) => ProfileFailurePolicy::parse(&raw).unwrap_or_else(|| {
                log::warn!(
                    target: "medizap::config",
                    "Unknown {} value {:?}, using fail-open",
                    VAR_PROFILE_FAILURE_POLICY,
                    raw
                );
                ProfileFailurePolicy::FailOpen
            }),
            None => ProfileFailurePolicy::default(),
        };

        let api_base_url = source
            .var(VAR_API_BASE_URL)
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        Self {
            firebase: FirebaseConfig {
                api_key: text(VAR_FIREBASE_API_KEY),
                auth_domain: text(VAR_FIREBASE_AUTH_DOMAIN),
                project_id: text(VAR_FIREBASE_PROJECT_ID),
                storage_bucket: text(VAR_FIREBASE_STORAGE_BUCKET),
                messaging_sender_id: text(VAR_FIREBASE_MESSAGING_SENDER_ID),
                app_id: text(VAR_FIREBASE_APP_ID),
            },
            api_base_url,
            log_level,
            profile_failure_policy,
        }
    }

    pub fn validate(&self) -> MedResult<()> {
        if self.firebase.api_key.is_empty() {
            return Err(MedizapError::invalid_input(format!("{VAR_FIREBASE_API_KEY} is not set"))
                .in_op("config.validate"));
        }
        if self.firebase.project_id.is_empty() {
            return Err(
                MedizapError::invalid_input(format!("{VAR_FIREBASE_PROJECT_ID} is not set"))
                    .in_op("config.validate"),
            );
        }
        Ok(())
    }

    /// 存储路径中的 `appId`
    pub fn app_namespace(&self) -> &str {
        namespace(&self.firebase.project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::tests::MockEnv;

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_source(&MockEnv::new());
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.log_level, log::LevelFilter::Info);
        assert_eq!(config.profile_failure_policy, ProfileFailurePolicy::FailOpen);
        assert_eq!(config.app_namespace(), "default-app-id");
        assert_eq!(
            config.validate().unwrap_err().kind,
            crate::error::ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_reads_all_vars() {
        let env = MockEnv::new()
            .with_var(VAR_FIREBASE_API_KEY, "key-123")
            .with_var(VAR_FIREBASE_PROJECT_ID, "medizap-prod")
            .with_var(VAR_API_BASE_URL, "https://api.medizap.example/")
            .with_var(VAR_LOG_LEVEL, "debug")
            .with_var(VAR_PROFILE_FAILURE_POLICY, "fail-closed");
        let config = AppConfig::from_source(&env);

        assert!(config.validate().is_ok());
        assert_eq!(config.api_base_url, "https://api.medizap.example");
        assert_eq!(config.log_level, log::LevelFilter::Debug);
        assert_eq!(config.profile_failure_policy, ProfileFailurePolicy::FailClosed);
        assert_eq!(config.app_namespace(), "medizap-prod");
    }

    #[test]
    fn test_unknown_policy_falls_back_to_open() {
        let env = MockEnv::new().with_var(VAR_PROFILE_FAILURE_POLICY, "strict");
        assert_eq!(
            AppConfig::from_source(&env).profile_failure_policy,
            ProfileFailurePolicy::FailOpen
        );
    }
}
