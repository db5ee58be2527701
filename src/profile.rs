//! 资料完整性判定
//!
//! 每次会话变化后读取用户资料文档，产出 `ProfileCheck`。
//! 路由守卫只依赖 `checked()` 与 `action_required()` 两个标记。

use log::{debug, error, info, warn};
use medizap_shared::UserProfile;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::adapter::ProfileStore;
use crate::config::ProfileFailurePolicy;
use crate::error::{MedResult, MedizapError};
use crate::session::{Session, SessionState};
use crate::subscription::Epoch;

const LOG_TARGET: &str = "medizap::profile";

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// 三态完整性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileStatus {
    Unknown,
    Incomplete,
    Complete,
}

/// 资料检查结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProfileCheck {
    /// 新会话的检查尚未完成
    #[default]
    Pending,
    /// 没有会话，无需检查
    SignedOut,
    /// 已登录用户还没有资料文档
    Missing,
    /// 文档存在但缺少必填字段
    Incomplete { missing: Vec<&'static str> },
    Complete,
    /// 无法访问资料存储；`blocking` 由失败策略决定
    Failed { reason: String, blocking: bool },
}

impl ProfileCheck {
    pub fn status(&self) -> ProfileStatus {
        match self {
            ProfileCheck::Missing | ProfileCheck::Incomplete { .. } => ProfileStatus::Incomplete,
            ProfileCheck::Complete => ProfileStatus::Complete,
            ProfileCheck::Pending | ProfileCheck::SignedOut | ProfileCheck::Failed { .. } => {
                ProfileStatus::Unknown
            }
        }
    }

    pub fn checked(&self) -> bool {
        !matches!(self, ProfileCheck::Pending)
    }

    pub fn action_required(&self) -> bool {
        match self {
            ProfileCheck::Missing | ProfileCheck::Incomplete { .. } => true,
            ProfileCheck::Failed { blocking, .. } => *blocking,
            _ => false,
        }
    }

    pub fn is_profile_complete(&self) -> bool {
        matches!(self, ProfileCheck::Complete)
    }

    pub fn has_error(&self) -> bool {
        matches!(self, ProfileCheck::Failed { .. })
    }

    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            ProfileCheck::Incomplete { missing } => missing,
            _ => &[],
        }
    }

    /// 根据读取到的文档判定
    pub fn from_record(record: Option<&UserProfile>) -> Self {
        match record {
            None => ProfileCheck::Missing,
            Some(profile) => {
                let missing = profile.missing_fields();
                if missing.is_empty() {
                    ProfileCheck::Complete
                } else {
                    ProfileCheck::Incomplete { missing }
                }
            }
        }
    }
}

/// 守卫输入的发布端
///
/// 会话事件按固定顺序发布：资料检查先于会话，守卫不会拿新会话去配旧用户的检查结果。
pub trait GateSink {
    fn publish_profile(&mut self, check: ProfileCheck);
    fn publish_session(&mut self, state: &SessionState);
}

/// 资料完整性解析器
pub struct ProfileResolver<P> {
    store: P,
    policy: ProfileFailurePolicy,
    epoch: Epoch,
}

impl<P: ProfileStore> ProfileResolver<P> {
    pub fn new(store: P, policy: ProfileFailurePolicy) -> Self {
        Self {
            store,
            policy,
            epoch: Epoch::new(),
        }
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn policy(&self) -> ProfileFailurePolicy {
        self.policy
    }

    /// 判定指定会话的资料状态（不做过期检查）
    pub async fn resolve(&self, session: Option<&Session>) -> ProfileCheck {
        let Some(session) = session else {
            return ProfileCheck::SignedOut;
        };

        match self.store.load_profile(&session.uid).await {
            Ok(record) => {
                let check = ProfileCheck::from_record(record.as_ref());
                match &check {
                    ProfileCheck::Missing => {
                        info!(target: LOG_TARGET, "No profile on file for {}", session.uid)
                    }
                    ProfileCheck::Incomplete { missing } => info!(
                        target: LOG_TARGET,
                        "Profile for {} is missing {:?}", session.uid, missing
                    ),
                    _ => debug!(target: LOG_TARGET, "Profile for {} is complete", session.uid),
                }
                check
            }
            Err(e) => {
                let e = e.in_op_with("profile.load", session.uid.clone());
                let blocking = self.policy == ProfileFailurePolicy::FailClosed;
                error!(
                    target: LOG_TARGET,
                    "Error checking profile completeness ({}): {}",
                    if blocking { "fail-closed" } else { "fail-open" },
                    e
                );
                ProfileCheck::Failed {
                    reason: e.to_string(),
                    blocking,
                }
            }
        }
    }

    /// 取得新一代票据后判定；若期间有更新的判定开始，返回 None
    pub async fn resolve_latest(&self, session: Option<&Session>) -> Option<ProfileCheck> {
        let ticket = self.epoch.advance();
        let check = self.resolve(session).await;
        if self.epoch.is_current(ticket) {
            Some(check)
        } else {
            debug!(
                target: LOG_TARGET,
                "Discarding stale profile result for {:?}",
                session.map(|s| s.uid.as_str())
            );
            None
        }
    }

    /// 作废进行中的判定（会话切换时调用）
    pub fn invalidate(&self) {
        self.epoch.advance();
    }

    /// 处理一次会话事件
    ///
    /// 身份变化（包括变为未登录）时作废进行中的判定，并先发布 `Pending`，再发布会话。
    pub fn on_session_event(&self, state: &SessionState, identity_changed: bool, sink: &mut impl GateSink) {
        if identity_changed {
            self.invalidate();
            debug!(target: LOG_TARGET, "Identity changed to {:?}, profile check reset", state.uid());
            sink.publish_profile(ProfileCheck::Pending);
        }
        sink.publish_session(state);
    }

    /// 校验并合并写入资料；调用方随后重新判定
    pub async fn save(&self, uid: &str, profile: UserProfile) -> MedResult<UserProfile> {
        let profile = profile.normalized();
        validate_profile(&profile).map_err(|e| e.in_op_with("profile.save", uid))?;

        self.store
            .save_profile(uid, &profile)
            .await
            .map_err(|e| {
                let e = e.in_op_with("profile.save", uid);
                warn!(target: LOG_TARGET, "Failed to save profile: {}", e);
                e
            })?;
        info!(target: LOG_TARGET, "Profile saved for {}", uid);
        Ok(profile)
    }
}

fn validate_profile(profile: &UserProfile) -> MedResult<()> {
    let missing = profile.missing_fields();
    if !missing.is_empty() {
        return Err(MedizapError::invalid_input(format!(
            "Please fill in: {}",
            missing.join(", ")
        )));
    }
    if !EMAIL_PATTERN.is_match(&profile.emergency_contact.email) {
        return Err(MedizapError::invalid_input(
            "Emergency contact email is not a valid address",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::tests::MockProfileStore;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use medizap_shared::EmergencyContact;
    use serde_json::json;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// 以 JSON 文档保存资料，读取时按存储适配器的方式解码
    struct JsonProfileStore {
        docs: HashMap<String, serde_json::Value>,
    }

    #[async_trait(?Send)]
    impl ProfileStore for JsonProfileStore {
        async fn load_profile(&self, uid: &str) -> MedResult<Option<UserProfile>> {
            match self.docs.get(uid) {
                Some(doc) => Ok(Some(serde_json::from_value(doc.clone())?)),
                None => Ok(None),
            }
        }

        async fn save_profile(&self, _uid: &str, _profile: &UserProfile) -> MedResult<()> {
            Ok(())
        }
    }

    /// 按顺序记录发布的守卫输入
    #[derive(Default)]
    struct RecordingSink {
        events: Vec<String>,
        check: ProfileCheck,
        uid: Option<String>,
    }

    impl GateSink for RecordingSink {
        fn publish_profile(&mut self, check: ProfileCheck) {
            self.events.push(format!("profile:{:?}", check));
            self.check = check;
        }

        fn publish_session(&mut self, state: &SessionState) {
            self.events.push(format!("session:{:?}", state.uid()));
            self.uid = state.uid().map(String::from);
        }
    }

    fn state_after(events: &[Option<&str>]) -> (SessionState, bool) {
        let mut state = SessionState::default();
        let mut changed = false;
        for uid in events {
            changed = state.apply(uid.map(Session::new));
        }
        (state, changed)
    }

    fn complete_profile() -> UserProfile {
        UserProfile {
            display_name: "Asha".into(),
            emergency_contact: EmergencyContact {
                name: "Ravi".into(),
                email: "ravi@example.com".into(),
                phone: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_check_flags() {
        let pending = ProfileCheck::Pending;
        assert!(!pending.checked());
        assert!(!pending.action_required());

        let signed_out = ProfileCheck::SignedOut;
        assert!(signed_out.checked());
        assert!(!signed_out.action_required());
        assert_eq!(signed_out.status(), ProfileStatus::Unknown);

        assert!(ProfileCheck::Missing.action_required());
        assert_eq!(ProfileCheck::Missing.status(), ProfileStatus::Incomplete);
        assert!(ProfileCheck::Complete.is_profile_complete());

        let open = ProfileCheck::Failed {
            reason: "x".into(),
            blocking: false,
        };
        assert!(open.checked() && open.has_error() && !open.action_required());
    }

    #[tokio::test]
    async fn test_resolve_states() {
        let store = MockProfileStore::new()
            .with_profile("done", complete_profile())
            .with_profile(
                "partial",
                UserProfile {
                    display_name: "Asha".into(),
                    ..Default::default()
                },
            );
        let resolver = ProfileResolver::new(store, ProfileFailurePolicy::FailOpen);

        assert_eq!(resolver.resolve(None).await, ProfileCheck::SignedOut);
        assert_eq!(
            resolver.resolve(Some(&Session::new("done"))).await,
            ProfileCheck::Complete
        );
        assert_eq!(
            resolver.resolve(Some(&Session::new("partial"))).await,
            ProfileCheck::Incomplete {
                missing: vec!["emergencyContact.name", "emergencyContact.email"]
            }
        );
        assert_eq!(
            resolver.resolve(Some(&Session::new("new-user"))).await,
            ProfileCheck::Missing
        );
        // 无会话时不访问存储
        assert_eq!(resolver.store().loads.borrow().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_policy() {
        let store = MockProfileStore::new();
        store.fail_with(MedizapError::permission_denied("rules"));
        let open = ProfileResolver::new(store, ProfileFailurePolicy::FailOpen);
        let check = open.resolve(Some(&Session::new("u1"))).await;
        assert!(check.checked() && check.has_error() && !check.action_required());

        let store = MockProfileStore::new();
        store.fail_with(MedizapError::network("offline"));
        let closed = ProfileResolver::new(store, ProfileFailurePolicy::FailClosed);
        let check = closed.resolve(Some(&Session::new("u1"))).await;
        assert!(check.checked() && check.has_error() && check.action_required());
    }

    #[tokio::test]
    async fn test_stale_resolution_is_discarded() {
        let store = MockProfileStore::new().with_profile("b", complete_profile());
        let resolver = Rc::new(ProfileResolver::new(store, ProfileFailurePolicy::FailOpen));

        // 读取 "a" 的过程中会话切换
        let epoch = resolver.epoch.clone();
        resolver.store().on_load(move |uid| {
            if uid == "a" {
                epoch.advance();
            }
        });
        assert_eq!(resolver.resolve_latest(Some(&Session::new("a"))).await, None);
        assert_eq!(
            resolver.resolve_latest(Some(&Session::new("b"))).await,
            Some(ProfileCheck::Complete)
        );
    }

    #[tokio::test]
    async fn test_save_validates_and_refresh_sees_new_record() {
        let resolver = ProfileResolver::new(MockProfileStore::new(), ProfileFailurePolicy::FailOpen);
        let session = Session::new("u1");
        assert_eq!(resolver.resolve(Some(&session)).await, ProfileCheck::Missing);

        let mut bad = complete_profile();
        bad.emergency_contact.email = "not-an-email".into();
        let err = resolver.save("u1", bad).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(resolver.store().saves.borrow().is_empty());

        let mut padded = complete_profile();
        padded.display_name = "  Asha ".into();
        let saved = resolver.save("u1", padded).await.unwrap();
        assert_eq!(saved.display_name, "Asha");
        assert_eq!(resolver.resolve(Some(&session)).await, ProfileCheck::Complete);
    }

    #[tokio::test]
    async fn test_save_rejects_missing_required_fields() {
        let resolver = ProfileResolver::new(MockProfileStore::new(), ProfileFailurePolicy::FailOpen);
        let err = resolver
            .save("u1", UserProfile::default())
            .await
            .unwrap_err();
        assert!(err.message().contains("displayName"));
    }

    #[tokio::test]
    async fn test_null_display_name_requires_action() {
        let mut docs = HashMap::new();
        docs.insert(
            "u1".to_string(),
            json!({
                "displayName": null,
                "emergencyContact": { "name": "Ravi", "email": "ravi@example.com" }
            }),
        );
        let resolver = ProfileResolver::new(JsonProfileStore { docs }, ProfileFailurePolicy::FailOpen);

        let check = resolver.resolve(Some(&Session::new("u1"))).await;
        assert_eq!(
            check,
            ProfileCheck::Incomplete {
                missing: vec!["displayName"]
            }
        );
        assert!(check.action_required());
    }

    #[test]
    fn test_identity_change_resets_check_before_session() {
        let resolver = ProfileResolver::new(MockProfileStore::new(), ProfileFailurePolicy::FailOpen);
        let mut sink = RecordingSink::default();

        let (a, changed) = state_after(&[Some("a")]);
        resolver.on_session_event(&a, changed, &mut sink);
        sink.publish_profile(ProfileCheck::Complete);
        sink.events.clear();

        // A -> B
        let (b, changed) = state_after(&[Some("a"), Some("b")]);
        resolver.on_session_event(&b, changed, &mut sink);
        assert_eq!(sink.events, vec!["profile:Pending", "session:Some(\"b\")"]);
        assert_eq!(sink.check, ProfileCheck::Pending);

        // B -> 未登录
        sink.events.clear();
        let (none, changed) = state_after(&[Some("b"), None]);
        resolver.on_session_event(&none, changed, &mut sink);
        assert_eq!(sink.events, vec!["profile:Pending", "session:None"]);
        assert_eq!(sink.uid, None);

        // 同一身份的资料更新不重置
        sink.publish_profile(ProfileCheck::SignedOut);
        sink.events.clear();
        let (same, changed) = state_after(&[None, None]);
        resolver.on_session_event(&same, changed, &mut sink);
        assert_eq!(sink.events, vec!["session:None"]);
        assert_eq!(sink.check, ProfileCheck::SignedOut);
    }

    #[tokio::test]
    async fn test_late_result_for_previous_identity_is_dropped() {
        let store = MockProfileStore::new()
            .with_profile("a", complete_profile())
            .with_profile("b", complete_profile());
        let resolver = Rc::new(ProfileResolver::new(store, ProfileFailurePolicy::FailOpen));

        // 读取 "a" 的过程中会话切换到 "b"
        let weak = Rc::downgrade(&resolver);
        resolver.store().on_load(move |uid| {
            if uid == "a" {
                if let Some(resolver) = weak.upgrade() {
                    let (b, changed) = state_after(&[Some("a"), Some("b")]);
                    resolver.on_session_event(&b, changed, &mut RecordingSink::default());
                }
            }
        });

        assert_eq!(resolver.resolve_latest(Some(&Session::new("a"))).await, None);
        assert_eq!(
            resolver.resolve_latest(Some(&Session::new("b"))).await,
            Some(ProfileCheck::Complete)
        );
    }
}
