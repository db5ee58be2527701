//! 身份会话提供者
//!
//! 包装身份后端，向其余组件推送 `SessionState`。
//! 会话对象只由这里写入，其他组件只读。

use futures::{Stream, StreamExt};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::adapter::IdentityBackend;
use crate::error::MedResult;
use crate::subscription::LiveStream;

const LOG_TARGET: &str = "medizap::session";

/// 已认证用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl Session {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
            photo_url: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// 页头问候语使用的名字
    pub fn greeting_name(&self) -> &str {
        [self.display_name.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or("User")
    }
}

/// 当前会话 + 首次事件前的加载标记
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub current: Option<Session>,
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current: None,
            loading: true,
        }
    }
}

impl SessionState {
    /// 应用一次会话事件
    ///
    /// 第一次事件（无论是否有用户）结束加载状态，之后不再进入加载。
    /// 返回值表示依赖方是否需要重新计算：首次事件或用户身份（uid）变化。
    pub fn apply(&mut self, event: Option<Session>) -> bool {
        let first = self.loading;
        let identity_changed = self.uid() != event.as_ref().map(|s| s.uid.as_str());
        self.loading = false;
        self.current = event;
        first || identity_changed
    }

    pub fn uid(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.uid.as_str())
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }
}

/// 会话提供者：持有身份后端
pub struct SessionProvider<I> {
    backend: I,
}

impl<I: IdentityBackend> SessionProvider<I> {
    pub fn new(backend: I) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &I {
        &self.backend
    }

    /// 开始监听会话变化；返回的流被丢弃时自动退订
    pub fn start(&self) -> LiveStream<Option<Session>> {
        info!(target: LOG_TARGET, "Listening for session changes");
        self.backend.watch_sessions()
    }

    /// 注销。失败只记录日志，不向调用方返回错误，也不负责导航
    pub async fn sign_out(&self) {
        match self.backend.sign_out().await {
            Ok(()) => info!(target: LOG_TARGET, "Signed out"),
            Err(e) => error!(target: LOG_TARGET, "Error signing out: {}", e.in_op("session.sign_out")),
        }
    }

    /// 下游 HTTP 调用使用的身份令牌
    pub async fn bearer_token(&self, session: &Session) -> MedResult<String> {
        self.backend
            .id_token(session)
            .await
            .map_err(|e| e.in_op_with("session.bearer_token", session.uid.clone()))
    }
}

/// 消费会话流直到结束
///
/// 每个事件都把最新状态交给 `on_change`，第二个参数即 `SessionState::apply` 的返回值。
pub async fn run_session_loop<S>(mut events: S, mut on_change: impl FnMut(&SessionState, bool))
where
    S: Stream<Item = Option<Session>> + Unpin,
{
    let mut state = SessionState::default();
    while let Some(event) = events.next().await {
        let changed = state.apply(event);
        debug!(
            target: LOG_TARGET,
            "Session event: uid={:?} identity_changed={}",
            state.uid(),
            changed
        );
        on_change(&state, changed);
    }
    debug!(target: LOG_TARGET, "Session stream closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::tests::MockIdentity;
    use crate::error::{ErrorKind, MedizapError};

    #[test]
    fn test_loading_ends_on_first_event_even_when_signed_out() {
        let mut state = SessionState::default();
        assert!(state.loading);
        assert!(state.apply(None));
        assert!(!state.loading);

        // 后续同一身份不再触发
        assert!(!state.apply(None));
        assert!(state.apply(Some(Session::new("u1"))));
        assert!(!state.apply(Some(Session::new("u1").with_display_name("Asha"))));
        assert!(!state.loading);
        assert!(state.apply(None));
        assert!(!state.loading);
    }

    #[test]
    fn test_greeting_name_fallbacks() {
        assert_eq!(Session::new("u").with_display_name("Asha").greeting_name(), "Asha");
        assert_eq!(
            Session::new("u").with_display_name(" ").with_email("a@b.co").greeting_name(),
            "a@b.co"
        );
        assert_eq!(Session::new("u").greeting_name(), "User");
    }

    #[tokio::test]
    async fn test_sign_out_failure_is_swallowed() {
        let identity = MockIdentity::new();
        identity.fail_sign_out(MedizapError::network("offline"));
        let provider = SessionProvider::new(identity);

        provider.sign_out().await;
        assert_eq!(provider.backend().sign_out_calls(), 1);
    }

    #[tokio::test]
    async fn test_bearer_token_propagates_errors_with_trace() {
        let identity = MockIdentity::new();
        identity.set_token("u1", "tok-1");
        let provider = SessionProvider::new(identity);

        assert_eq!(provider.bearer_token(&Session::new("u1")).await.unwrap(), "tok-1");
        let err = provider.bearer_token(&Session::new("u2")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthenticated);
        assert_eq!(err.spans().last().unwrap().operation, "session.bearer_token");
    }

    #[tokio::test]
    async fn test_session_loop_pushes_each_event() {
        let identity = MockIdentity::new();
        let provider = SessionProvider::new(identity);
        let stream = provider.start();

        provider.backend().emit(None);
        provider.backend().emit(Some(Session::new("u1")));
        provider.backend().close();

        let mut seen = Vec::new();
        run_session_loop(stream, |state, changed| {
            seen.push((state.loading, state.uid().map(String::from), changed))
        })
        .await;

        assert_eq!(
            seen,
            vec![(false, None, true), (false, Some("u1".to_string()), true)]
        );
    }

    #[test]
    fn test_dropping_stream_unsubscribes() {
        let provider = SessionProvider::new(MockIdentity::new());
        let stream = provider.start();
        assert_eq!(provider.backend().teardowns(), 0);
        drop(stream);
        assert_eq!(provider.backend().teardowns(), 1);
    }
}
