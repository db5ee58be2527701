use leptos::prelude::*;
use leptos::task::spawn_local;
use medizap::{AppRoute, RouteGuard};

use crate::api::use_api;
use crate::auth::{use_profile, use_session};
use crate::feed::provide_feed;
use crate::web::firebase::FirebaseApp;
use crate::web::router::Link;
use crate::web::storage::Theme;

/// 页面通知：消息内容, 是否出错
#[derive(Clone, Copy)]
pub struct Notice(RwSignal<Option<(String, bool)>>);

impl Notice {
    pub fn success(&self, msg: impl Into<String>) {
        self.0.set(Some((msg.into(), false)));
    }

    pub fn error(&self, msg: impl Into<String>) {
        self.0.set(Some((msg.into(), true)));
    }
}

pub fn use_notice() -> Notice {
    use_context::<Notice>().expect("Notice should be provided")
}

/// 侧边栏条目
fn nav_items() -> [(&'static str, AppRoute); 5] {
    [
        ("Home", AppRoute::Dashboard),
        ("Profile", AppRoute::Profile),
        ("Reminders", AppRoute::Reminders),
        ("Upload Prescription", AppRoute::Section("upload-prescription".into())),
        ("Chatbot Page", AppRoute::Section("chatbot-page".into())),
    ]
}

#[component]
fn Sidebar() -> impl IntoView {
    let profile = use_profile();
    let session = use_session();

    let items = nav_items()
        .into_iter()
        .map(|(label, route)| {
            let enabled = {
                let route = route.clone();
                Signal::derive(move || profile.check.with(|p| RouteGuard::allows_link(p, &route)))
            };
            view! {
                <li>
                    <Link to=route enabled=enabled>
                        {label}
                    </Link>
                </li>
            }
        })
        .collect_view();

    view! {
        <aside class="w-64 min-h-full bg-base-100 shadow-xl flex flex-col">
            <div class="p-4 text-2xl font-bold text-primary">"Medizap"</div>
            <ul class="menu p-4 flex-1 gap-1">{items}</ul>
            <div class="p-4">
                <button class="btn btn-outline btn-error w-full" on:click=move |_| session.sign_out()>
                    "Logout"
                </button>
            </div>
        </aside>
    }
}

/// 仪表盘布局：问候语、紧急按钮、侧边栏与主题切换
///
/// 提供提醒列表上下文；布局卸载时退订。
#[component]
pub fn DashboardLayout(children: Children) -> impl IntoView {
    let app = use_context::<StoredValue<FirebaseApp, LocalStorage>>()
        .expect("FirebaseApp should be provided");
    let session = use_session();
    let profile = use_profile();
    let api = use_api();

    provide_feed(&app.get_value(), session);

    let notice = Notice(RwSignal::new(None));
    provide_context(notice);

    let theme = RwSignal::new(Theme::load());
    Effect::new(move |_| theme.get().apply());

    let sending = RwSignal::new(false);
    let on_emergency = move |_| {
        if sending.get_untracked() {
            return;
        }
        sending.set(true);
        spawn_local(async move {
            match api.send_emergency_alert().await {
                Ok(resp) => notice.success(resp.message),
                Err(e) => {
                    log::error!(target: "medizap::api", "Emergency alert failed: {}", e);
                    notice.error(format!("Failed to send emergency alert: {}", e.message()));
                }
            }
            sending.set(false);
        });
    };

    // 3秒后清除通知
    Effect::new(move |_| {
        if notice.0.get().is_some() {
            set_timeout(
                move || notice.0.set(None),
                std::time::Duration::from_secs(3),
            );
        }
    });

    let greeting = move || {
        session
            .state
            .with(|s| s.current.as_ref().map(|c| c.greeting_name().to_string()))
            .unwrap_or_else(|| "User".to_string())
    };

    view! {
        <div class="flex min-h-screen bg-base-200">
            <Sidebar />
            <div class="flex-1 flex flex-col">
                <div class="navbar bg-base-100 shadow">
                    <div class="flex-1">
                        <span class="text-xl font-semibold px-4">"Welcome, " {greeting}</span>
                    </div>
                    <div class="flex-none gap-2">
                        <button class="btn btn-ghost" on:click=move |_| theme.update(|t| *t = t.toggled())>
                            {move || if theme.get() == Theme::Dark { "Light mode" } else { "Dark mode" }}
                        </button>
                        <button class="btn btn-error" disabled=move || sending.get() on:click=on_emergency>
                            {move || if sending.get() { "Sending..." } else { "Emergency" }}
                        </button>
                    </div>
                </div>

                <Show when=move || profile.check.with(|p| p.action_required())>
                    <div role="alert" class="alert alert-warning m-4">
                        <span>"Please complete your profile to unlock the rest of the dashboard."</span>
                    </div>
                </Show>

                <Show when=move || notice.0.get().is_some()>
                    <div class="toast toast-top toast-end z-50">
                        <div class=move || {
                            if notice.0.with(|n| n.as_ref().is_some_and(|(_, is_err)| *is_err)) {
                                "alert alert-error shadow-lg"
                            } else {
                                "alert alert-success shadow-lg"
                            }
                        }>
                            <span>{move || notice.0.with(|n| n.as_ref().map(|(m, _)| m.clone()).unwrap_or_default())}</span>
                        </div>
                    </div>
                </Show>

                <main class="p-4 md:p-8 flex-1">{children()}</main>
            </div>
        </div>
    }
}
