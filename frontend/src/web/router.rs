//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，所有对 window.history 的操作都集中在此模块。
//! 守卫逻辑在核心库 `medizap::guard` 中，这里只负责把信号接到守卫上并执行跳转。

use leptos::prelude::*;
use medizap::{AppRoute, GateDecision, Navigator, ProfileCheck, RouteGuard, SessionState, decide};
use wasm_bindgen::prelude::*;

/// 获取当前浏览器路径
fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

/// 推送 History 状态
fn push_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 替换 History 状态（用于重定向）
fn replace_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 路由器服务
///
/// 通过注入的会话与资料信号计算准入决策，与认证系统解耦。
#[derive(Clone, Copy)]
pub struct RouterService {
    current_route: RwSignal<AppRoute>,
    /// 当前路由的准入决策
    gate: Memo<GateDecision>,
}

impl RouterService {
    fn new(session: Signal<SessionState>, profile: Signal<ProfileCheck>) -> Self {
        let current_route = RwSignal::new(AppRoute::from_path(&current_path()));
        let gate = Memo::new(move |_| {
            session.with(|s| profile.with(|p| current_route.with(|r| decide(s, p, r))))
        });
        Self {
            current_route,
            gate,
        }
    }

    pub fn current_route(&self) -> RwSignal<AppRoute> {
        self.current_route
    }

    pub fn gate(&self) -> Memo<GateDecision> {
        self.gate
    }

    /// 用户发起的导航（pushState）
    pub fn navigate(&self, route: AppRoute) {
        if self.current_route.with_untracked(|r| *r == route) {
            return;
        }
        push_history_state(&route.to_path());
        self.current_route.set(route);
    }

    /// 浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let current_route = self.current_route;
        let closure = Closure::<dyn Fn()>::new(move || {
            current_route.set(AppRoute::from_path(&current_path()));
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 会话、资料或路由任一变化时重新评估守卫
    fn setup_guard(&self, session: Signal<SessionState>, profile: Signal<ProfileCheck>) {
        let router = *self;
        let mut guard = RouteGuard::new();
        Effect::new(move |_| {
            let route = router.current_route.get();
            let mut nav = router;
            session.with(|s| profile.with(|p| guard.evaluate(s, p, &route, &mut nav)));
        });
    }
}

impl Navigator for RouterService {
    fn replace(&mut self, route: &AppRoute) {
        replace_history_state(&route.to_path());
        self.current_route.set(route.clone());
    }
}

fn provide_router(session: Signal<SessionState>, profile: Signal<ProfileCheck>) -> RouterService {
    let router = RouterService::new(session, profile);
    router.init_popstate_listener();
    router.setup_guard(session, profile);
    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
#[component]
pub fn Router(
    session: Signal<SessionState>,
    profile: Signal<ProfileCheck>,
    children: Children,
) -> impl IntoView {
    provide_router(session, profile);
    children()
}

/// 路由出口组件
///
/// 根据当前路由状态渲染对应的组件。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let router = use_router();

    move || {
        let current = router.current_route().get();
        matcher(current)
    }
}

/// 站内链接；`enabled` 为 false 时渲染为不可点击
#[component]
pub fn Link(
    to: AppRoute,
    #[prop(optional, into)] class: String,
    #[prop(default = Signal::stored(true), into)] enabled: Signal<bool>,
    children: Children,
) -> impl IntoView {
    let router = use_router();
    let href = to.to_path();
    let active = {
        let to = to.clone();
        Memo::new(move |_| router.current_route().with(|r| *r == to))
    };

    let on_click = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        if enabled.get_untracked() {
            router.navigate(to.clone());
        }
    };

    let classes = move || {
        let mut classes = class.clone();
        if active.get() {
            classes.push_str(" active");
        }
        if !enabled.get() {
            classes.push_str(" pointer-events-none opacity-50");
        }
        classes
    };

    view! {
        <a
            href=href
            class=classes
            aria-disabled=move || (!enabled.get()).to_string()
            on:click=on_click
        >
            {children()}
        </a>
    }
}
