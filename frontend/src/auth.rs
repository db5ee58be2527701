//! 认证模块
//!
//! 会话与资料检查的响应式状态。路由服务只通过注入的信号读取它们。

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use medizap::shared::UserProfile;
use medizap::{
    GateSink, MedResult, MedizapError, ProfileCheck, ProfileFailurePolicy, ProfileResolver, Session,
    SessionProvider, SessionState, session::run_session_loop,
};

use crate::web::firebase::FirebaseApp;
use crate::web::firestore::FirestoreProfiles;
use crate::web::identity::FirebaseIdentity;

type Provider = Rc<SessionProvider<FirebaseIdentity>>;
type Resolver = Rc<ProfileResolver<FirestoreProfiles>>;

/// 会话上下文
#[derive(Clone, Copy)]
pub struct SessionContext {
    pub state: RwSignal<SessionState>,
    provider: StoredValue<Provider, leptos::prelude::LocalStorage>,
}

impl SessionContext {
    /// 当前会话（只读信号，用于路由服务注入）
    pub fn state_signal(&self) -> Signal<SessionState> {
        self.state.into()
    }

    pub fn current(&self) -> Option<Session> {
        self.state.with(|s| s.current.clone())
    }

    /// 注销；失败只记录日志。回到登录页由路由守卫的 replace 完成
    pub fn sign_out(&self) {
        let Some(provider) = self.provider.try_get_value() else {
            return;
        };
        spawn_local(async move {
            provider.sign_out().await;
        });
    }

    /// 下游 HTTP 调用的 Bearer 令牌
    pub async fn bearer_token(&self) -> MedResult<String> {
        let session = self
            .state
            .with_untracked(|s| s.current.clone())
            .ok_or_else(|| MedizapError::unauthenticated("User not authenticated"))?;
        let provider = self
            .provider
            .try_get_value()
            .ok_or_else(|| MedizapError::unauthenticated("Session provider is gone"))?;
        provider.bearer_token(&session).await
    }
}

/// 资料检查上下文
#[derive(Clone, Copy)]
pub struct ProfileContext {
    pub check: RwSignal<ProfileCheck>,
    refresh: RwSignal<u32>,
    resolver: StoredValue<Resolver, leptos::prelude::LocalStorage>,
}

impl ProfileContext {
    pub fn check_signal(&self) -> Signal<ProfileCheck> {
        self.check.into()
    }

    /// 重新读取资料文档
    pub fn refresh(&self) {
        self.refresh.update(|n| *n = n.wrapping_add(1));
    }

    /// 读取资料文档，用于填充表单
    pub async fn load(&self, uid: &str) -> MedResult<Option<UserProfile>> {
        use medizap::ProfileStore;
        let resolver = self
            .resolver
            .try_get_value()
            .ok_or_else(|| MedizapError::store("Profile store is gone"))?;
        resolver.store().load_profile(uid).await
    }

    /// 校验并保存，成功后重新检查
    pub async fn save(&self, uid: &str, profile: UserProfile) -> MedResult<UserProfile> {
        let resolver = self
            .resolver
            .try_get_value()
            .ok_or_else(|| MedizapError::store("Profile store is gone"))?;
        let saved = resolver.save(uid, profile).await?;
        self.refresh();
        Ok(saved)
    }
}

/// 把守卫输入写入两个信号
struct SignalSink {
    session: RwSignal<SessionState>,
    check: RwSignal<ProfileCheck>,
}

impl GateSink for SignalSink {
    fn publish_profile(&mut self, check: ProfileCheck) {
        self.check.set(check);
    }

    fn publish_session(&mut self, state: &SessionState) {
        self.session.set(state.clone());
    }
}

/// 从 Context 获取会话上下文
pub fn use_session() -> SessionContext {
    use_context::<SessionContext>().expect("SessionContext should be provided")
}

/// 从 Context 获取资料检查上下文
pub fn use_profile() -> ProfileContext {
    use_context::<ProfileContext>().expect("ProfileContext should be provided")
}

/// 创建会话与资料上下文并开始监听
pub fn provide_auth(app: &FirebaseApp, policy: ProfileFailurePolicy) -> (SessionContext, ProfileContext) {
    let provider: Provider = Rc::new(SessionProvider::new(FirebaseIdentity::new(app.clone())));
    let resolver: Resolver = Rc::new(ProfileResolver::new(FirestoreProfiles::new(app.clone()), policy));

    let session = SessionContext {
        state: RwSignal::new(SessionState::default()),
        provider: StoredValue::new_local(provider.clone()),
    };
    let profile = ProfileContext {
        check: RwSignal::new(ProfileCheck::Pending),
        refresh: RwSignal::new(0),
        resolver: StoredValue::new_local(resolver),
    };
    provide_context(session);
    provide_context(profile);

    // 1. 会话流：发布顺序由解析器决定
    let events = provider.start();
    let mut sink = SignalSink {
        session: session.state,
        check: profile.check,
    };
    spawn_local(run_session_loop(events, move |state, identity_changed| {
        let _ = profile
            .resolver
            .try_with_value(|r| r.on_session_event(state, identity_changed, &mut sink));
    }));

    // 2. 资料检查：随会话身份或手动刷新重新执行，过期结果被丢弃
    let identity = Memo::new(move |_| {
        session
            .state
            .with(|s| (s.loading, s.uid().map(str::to_string)))
    });
    Effect::new(move |_| {
        let (loading, uid) = identity.get();
        profile.refresh.track();
        if loading {
            return;
        }
        let Some(resolver) = profile.resolver.try_get_value() else {
            return;
        };
        spawn_local(async move {
            let session = uid.map(Session::new);
            if let Some(check) = resolver.resolve_latest(session.as_ref()).await {
                profile.check.set(check);
            }
        });
    });

    (session, profile)
}
