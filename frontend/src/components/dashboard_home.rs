use chrono::Utc;
use leptos::prelude::*;
use leptos::task::spawn_local;
use medizap::AppRoute;
use medizap::shared::protocol::NewsArticle;
use medizap::shared::{UPCOMING_CARD_LIMIT, format_date_time};

use crate::api::use_api;
use crate::feed::use_feed;
use crate::web::Interval;
use crate::web::router::Link;

/// "即将到来"卡片的刷新周期
const CLOCK_TICK_MS: u32 = 30_000;

#[derive(Clone)]
enum NewsState {
    Loading,
    Ready(Vec<NewsArticle>),
    Failed(String),
}

#[component]
fn UpcomingCard() -> impl IntoView {
    let feed = use_feed();
    let now = RwSignal::new(Utc::now());
    let ticker = Interval::new(CLOCK_TICK_MS, move || {
        now.try_set(Utc::now());
    });
    if ticker.is_none() {
        log::warn!(target: "medizap::feed", "Clock ticker unavailable; upcoming card will not refresh");
    }
    // drop 时清除定时器
    let _ticker = StoredValue::new_local(ticker);

    let upcoming = Memo::new(move |_| {
        let now = now.get();
        feed.state.with(|s| s.upcoming(now, UPCOMING_CARD_LIMIT))
    });

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <h3 class="card-title">"Upcoming Reminders"</h3>
                <Show when=move || feed.state.with(|s| s.loading)>
                    <span class="loading loading-spinner loading-md"></span>
                </Show>
                <Show when=move || !feed.state.with(|s| s.loading) && upcoming.with(Vec::is_empty)>
                    <p class="text-base-content/60">"No upcoming reminders."</p>
                </Show>
                <ul class="space-y-2">
                    <For
                        each=move || upcoming.get()
                        key=|r| r.id.clone()
                        children=move |r| {
                            view! {
                                <li class="flex justify-between gap-4">
                                    <span class="font-medium">{r.label().to_string()}</span>
                                    <span class="text-sm opacity-70">{format_date_time(&r.date_time)}</span>
                                </li>
                            }
                        }
                    />
                </ul>
                <div class="card-actions justify-end">
                    <Link to=AppRoute::Reminders class="btn btn-sm btn-ghost">"View all"</Link>
                </div>
            </div>
        </div>
    }
}

#[component]
fn NewsCard() -> impl IntoView {
    let api = use_api();
    let news = RwSignal::new(NewsState::Loading);

    spawn_local(async move {
        let next = match api.latest_news().await {
            Ok(articles) => NewsState::Ready(articles),
            Err(e) => {
                log::warn!(target: "medizap::api", "Failed to load news: {}", e);
                NewsState::Failed(e.message().to_string())
            }
        };
        news.try_set(next);
    });

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <h3 class="card-title">"Health News"</h3>
                {move || match news.get() {
                    NewsState::Loading => view! {
                        <span class="loading loading-spinner loading-md"></span>
                    }
                    .into_any(),
                    NewsState::Failed(msg) => view! {
                        <p class="text-error text-sm">{msg}</p>
                    }
                    .into_any(),
                    NewsState::Ready(articles) => view! {
                        <ul class="space-y-3">
                            {articles
                                .into_iter()
                                .map(|a| {
                                    view! {
                                        <li>
                                            <a class="link link-hover font-medium" href=a.url target="_blank" rel="noopener noreferrer">
                                                {a.title}
                                            </a>
                                            <p class="text-xs opacity-60">{a.source_name.unwrap_or_default()}</p>
                                        </li>
                                    }
                                })
                                .collect_view()}
                        </ul>
                    }
                    .into_any(),
                }}
            </div>
        </div>
    }
}

/// 仪表盘首页
#[component]
pub fn DashboardHome() -> impl IntoView {
    view! {
        <div class="grid gap-6 md:grid-cols-2">
            <UpcomingCard />
            <NewsCard />
        </div>
    }
}
