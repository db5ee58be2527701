//! 编译期环境变量配置来源
//!
//! 浏览器里没有进程环境，`MEDIZAP_*` 在构建时通过 `option_env!` 写入产物。

use medizap::ConfigSource;
use medizap::config::{
    VAR_API_BASE_URL, VAR_FIREBASE_API_KEY, VAR_FIREBASE_APP_ID, VAR_FIREBASE_AUTH_DOMAIN,
    VAR_FIREBASE_MESSAGING_SENDER_ID, VAR_FIREBASE_PROJECT_ID, VAR_FIREBASE_STORAGE_BUCKET,
    VAR_LOG_LEVEL, VAR_PROFILE_FAILURE_POLICY,
};

pub struct BuildEnv;

impl ConfigSource for BuildEnv {
    fn var(&self, name: &str) -> Option<String> {
        let value = match name {
            VAR_FIREBASE_API_KEY => option_env!("MEDIZAP_FIREBASE_API_KEY"),
            VAR_FIREBASE_AUTH_DOMAIN => option_env!("MEDIZAP_FIREBASE_AUTH_DOMAIN"),
            VAR_FIREBASE_PROJECT_ID => option_env!("MEDIZAP_FIREBASE_PROJECT_ID"),
            VAR_FIREBASE_STORAGE_BUCKET => option_env!("MEDIZAP_FIREBASE_STORAGE_BUCKET"),
            VAR_FIREBASE_MESSAGING_SENDER_ID => option_env!("MEDIZAP_FIREBASE_MESSAGING_SENDER_ID"),
            VAR_FIREBASE_APP_ID => option_env!("MEDIZAP_FIREBASE_APP_ID"),
            VAR_API_BASE_URL => option_env!("MEDIZAP_API_BASE_URL"),
            VAR_LOG_LEVEL => option_env!("MEDIZAP_LOG_LEVEL"),
            VAR_PROFILE_FAILURE_POLICY => option_env!("MEDIZAP_PROFILE_FAILURE_POLICY"),
            _ => None,
        };
        value.map(str::to_string)
    }
}
