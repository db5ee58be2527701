//! Medizap 前端应用
//!
//! 采用 Context-Driven 的架构：
//! - `web::firebase` 及其适配器：实现核心库的存储与身份接口
//! - `web::router`: 路由服务，把会话与资料信号接到核心库的守卫上
//! - `auth` / `feed` / `api`: 响应式上下文
//! - `components`: UI 组件层

mod api;
mod auth;
mod components {
    pub mod add_reminder_dialog;
    pub mod dashboard;
    pub mod dashboard_home;
    pub mod home;
    pub mod login;
    pub mod profile;
    pub mod reminders;
}
mod feed;
mod serde_helper;

use crate::api::ApiContext;
use crate::auth::provide_auth;
use crate::components::dashboard::DashboardLayout;
use crate::components::dashboard_home::DashboardHome;
use crate::components::home::{HomePage, SectionPage};
use crate::components::login::LoginPage;
use crate::components::profile::ProfilePage;
use crate::components::reminders::RemindersPage;

use leptos::prelude::*;
use medizap::{AppConfig, AppRoute, GateDecision};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

// 原生 Web API 与 Firebase SDK 封装
pub(crate) mod web {
    mod env;
    pub mod firebase;
    pub mod firestore;
    pub mod http;
    pub mod identity;
    pub mod logger;
    pub mod router;
    pub mod storage;
    mod timer;

    pub use env::BuildEnv;
    pub use timer::Interval;
}

use web::firebase::FirebaseApp;
use web::router::{Router, RouterOutlet, use_router};

/// 顶层画面：仪表盘布局在子页面之间保持挂载
#[derive(Debug, Clone, PartialEq)]
enum Screen {
    Loading,
    Page(AppRoute),
    Dashboard,
}

/// 公开页面匹配函数
fn public_page(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        _ => view! { <HomePage /> }.into_any(),
    }
}

/// 仪表盘子页面匹配函数
fn dashboard_page(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Dashboard => view! { <DashboardHome /> }.into_any(),
        AppRoute::Profile => view! { <ProfilePage /> }.into_any(),
        AppRoute::Reminders => view! { <RemindersPage /> }.into_any(),
        AppRoute::Section(name) => view! { <SectionPage name=name /> }.into_any(),
        // 离开仪表盘的瞬间，外层画面随后切换
        _ => ().into_any(),
    }
}

#[component]
fn LoadingScreen() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center min-h-screen bg-base-200 gap-4">
            <span class="loading loading-spinner loading-lg text-primary"></span>
            <p class="text-base-content/70">"Authenticating user..."</p>
        </div>
    }
}

#[component]
fn Screens() -> impl IntoView {
    let router = use_router();
    let screen = Memo::new(move |_| match router.gate().get() {
        GateDecision::Allow => {
            let route = router.current_route().get();
            if route.requires_auth() {
                Screen::Dashboard
            } else {
                Screen::Page(route)
            }
        }
        _ => Screen::Loading,
    });

    move || match screen.get() {
        Screen::Loading => view! { <LoadingScreen /> }.into_any(),
        Screen::Page(route) => public_page(route),
        Screen::Dashboard => view! {
            <DashboardLayout>
                <RouterOutlet matcher=dashboard_page />
            </DashboardLayout>
        }
        .into_any(),
    }
}

#[component]
pub fn App(app: FirebaseApp, config: AppConfig) -> impl IntoView {
    // 1. 会话与资料检查上下文
    let (session, profile) = provide_auth(&app, config.profile_failure_policy);

    // 2. 下游服务与 Firebase 句柄
    provide_context(ApiContext::new(&config.api_base_url, session));
    provide_context(StoredValue::new_local(app));

    // 3. 路由器：注入会话与资料信号实现守卫
    view! {
        <Router session=session.state_signal() profile=profile.check_signal()>
            <Screens />
        </Router>
    }
}

#[component]
fn ConfigErrorPage(message: String) -> impl IntoView {
    view! {
        <div class="flex items-center justify-center min-h-screen bg-base-200">
            <div role="alert" class="alert alert-error max-w-lg">
                <span>"Medizap could not start: " {message}</span>
            </div>
        </div>
    }
}

/// 页面卸载时释放 Firebase 连接
fn register_shutdown(app: &FirebaseApp) {
    let app = app.clone();
    let on_hide = Closure::once_into_js(move || app.shutdown());
    if let Some(window) = web_sys::window() {
        let _ = window.add_event_listener_with_callback("pagehide", on_hide.unchecked_ref());
    }
}

/// 读取配置、初始化 Firebase 并挂载应用
pub fn start() {
    // 先以默认级别安装，配置解析时的警告也能输出
    web::logger::init(log::LevelFilter::Info);
    let config = AppConfig::from_source(&web::BuildEnv);
    web::logger::init(config.log_level);

    let app = match config.validate().and_then(|()| FirebaseApp::initialize(&config)) {
        Ok(app) => app,
        Err(e) => {
            log::error!(target: "medizap::config", "Startup failed: {}", e);
            let message = e.message().to_string();
            mount_to_body(move || view! { <ConfigErrorPage message=message /> });
            return;
        }
    };

    register_shutdown(&app);
    mount_to_body(move || view! { <App app=app config=config /> });
}
