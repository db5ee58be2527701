//! 路由守卫
//!
//! `decide` 是 (会话, 资料检查, 路由) 的纯函数；
//! `RouteGuard` 在其上加一层去重，保证同一重定向只执行一次 replace。

use log::{debug, info};

use crate::profile::ProfileCheck;
use crate::route::AppRoute;
use crate::session::SessionState;

const LOG_TARGET: &str = "medizap::guard";

/// 守卫决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// 会话或资料检查尚未完成：渲染占位，不导航
    ShowLoading,
    RedirectLogin,
    RedirectProfile,
    /// 已登录用户离开登录页
    RedirectDashboard,
    Allow,
}

impl GateDecision {
    pub fn target(&self) -> Option<AppRoute> {
        match self {
            GateDecision::RedirectLogin => Some(AppRoute::Login),
            GateDecision::RedirectProfile => Some(AppRoute::Profile),
            GateDecision::RedirectDashboard => Some(AppRoute::Dashboard),
            GateDecision::ShowLoading | GateDecision::Allow => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        self.target().is_some()
    }
}

/// 纯决策函数
pub fn decide(session: &SessionState, profile: &ProfileCheck, route: &AppRoute) -> GateDecision {
    if session.loading {
        return GateDecision::ShowLoading;
    }

    match route {
        AppRoute::NotFound => GateDecision::RedirectLogin,
        AppRoute::Home => GateDecision::Allow,
        AppRoute::Login => {
            if !session.is_signed_in() {
                GateDecision::Allow
            } else if !profile.checked() {
                GateDecision::ShowLoading
            } else if profile.action_required() {
                GateDecision::RedirectProfile
            } else {
                GateDecision::RedirectDashboard
            }
        }
        protected => {
            if !profile.checked() {
                GateDecision::ShowLoading
            } else if !session.is_signed_in() {
                GateDecision::RedirectLogin
            } else if profile.action_required() && *protected != AppRoute::Profile {
                GateDecision::RedirectProfile
            } else {
                GateDecision::Allow
            }
        }
    }
}

/// 导航接口：守卫只做 replace，不增加历史记录
pub trait Navigator {
    fn replace(&mut self, route: &AppRoute);
}

/// 带去重的守卫
#[derive(Debug, Default)]
pub struct RouteGuard {
    /// 最近一次发出的重定向 (来源路由, 目标路由)
    pending: Option<(AppRoute, AppRoute)>,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 计算决策，必要时通过 `nav` 执行一次 replace
    pub fn evaluate(
        &mut self,
        session: &SessionState,
        profile: &ProfileCheck,
        route: &AppRoute,
        nav: &mut impl Navigator,
    ) -> GateDecision {
        let decision = decide(session, profile, route);

        match decision.target() {
            Some(target) if target != *route => {
                let key = (route.clone(), target);
                if self.pending.as_ref() == Some(&key) {
                    debug!(target: LOG_TARGET, "Redirect {} -> {} already issued", key.0, key.1);
                } else {
                    info!(target: LOG_TARGET, "{:?}: {} -> {}", decision, key.0, key.1);
                    nav.replace(&key.1);
                    self.pending = Some(key);
                }
            }
            _ => self.pending = None,
        }

        decision
    }

    /// 侧边栏链接是否可用：需要补全资料时只开放资料页
    pub fn allows_link(profile: &ProfileCheck, target: &AppRoute) -> bool {
        !profile.action_required() || *target == AppRoute::Profile
    }
}
