use leptos::prelude::*;
use medizap::AppRoute;

use crate::auth::use_session;
use crate::web::router::Link;

/// 落地页，任何人都可以访问
#[component]
pub fn HomePage() -> impl IntoView {
    let session = use_session();
    let signed_in = move || session.state.with(|s| s.is_signed_in());

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content text-center">
                <div class="max-w-xl">
                    <h1 class="text-5xl font-bold">"Medizap"</h1>
                    <p class="py-6 text-base-content/70">
                        "Your comprehensive platform for modern healthcare management."
                    </p>
                    <Show
                        when=signed_in
                        fallback=|| view! { <Link to=AppRoute::Login class="btn btn-primary">"Get Started"</Link> }
                    >
                        <Link to=AppRoute::Dashboard class="btn btn-primary">"Go to Dashboard"</Link>
                    </Show>
                </div>
            </div>
        </div>
    }
}

/// 尚未实现的仪表盘子页面
#[component]
pub fn SectionPage(name: String) -> impl IntoView {
    let title = name
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <h3 class="card-title">{title}</h3>
                <p class="text-base-content/70">"This section is coming soon."</p>
            </div>
        </div>
    }
}
