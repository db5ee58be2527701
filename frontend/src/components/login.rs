use leptos::html;
use leptos::prelude::*;

use crate::web::firebase::{FirebaseApp, SignInUi};

/// 登录页：挂载托管登录界面，登录后的跳转由路由守卫负责
#[component]
pub fn LoginPage() -> impl IntoView {
    let app = use_context::<StoredValue<FirebaseApp, LocalStorage>>()
        .expect("FirebaseApp should be provided");
    let container = NodeRef::<html::Div>::new();
    let ui_shown = RwSignal::new(false);
    let error_msg = RwSignal::new(Option::<String>::None);
    let sign_in_ui = StoredValue::new_local(Option::<SignInUi>::None);

    Effect::new(move |_| {
        let Some(el) = container.get() else {
            return;
        };
        if sign_in_ui.with_value(Option::is_some) {
            return;
        }
        match app.with_value(|app| app.start_sign_in_ui(&el)) {
            Ok(ui) => {
                sign_in_ui.set_value(Some(ui));
                ui_shown.set(true);
            }
            Err(e) => {
                log::error!(target: "medizap::session", "Failed to start sign-in UI: {}", e);
                error_msg.set(Some(e.message().to_string()));
            }
        }
    });

    on_cleanup(move || {
        // drop 时重置界面
        sign_in_ui.try_update_value(|ui| ui.take());
    });

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col lg:flex-row w-full max-w-4xl gap-10">
                <div class="text-center lg:text-left flex-1">
                    <h1 class="text-4xl font-bold">"Welcome to Medizap"</h1>
                    <p class="py-4 text-base-content/70">
                        "Your comprehensive platform for modern healthcare management."
                    </p>
                </div>

                <div class="card shrink-0 w-full max-w-md shadow-2xl bg-base-100">
                    <div class="card-body">
                        <h2 class="card-title">"Sign In"</h2>
                        <p class="text-sm text-base-content/70">
                            "Please use your preferred method to access your dashboard."
                        </p>
                        <Show when=move || error_msg.get().is_some()>
                            <div role="alert" class="alert alert-error text-sm py-2">
                                <span>{move || error_msg.get().unwrap_or_default()}</span>
                            </div>
                        </Show>
                        <Show when=move || !ui_shown.get() && error_msg.get().is_none()>
                            <div class="flex items-center gap-2 text-sm">
                                <span class="loading loading-spinner loading-sm"></span>
                                "Loading authentication UI..."
                            </div>
                        </Show>
                        <div id="firebaseui-auth-container" node_ref=container></div>
                    </div>
                </div>
            </div>
        </div>
    }
}
