use leptos::prelude::*;
use leptos::task::spawn_local;
use medizap::shared::format_date_time;

use crate::components::add_reminder_dialog::AddReminderDialog;
use crate::components::dashboard::use_notice;
use crate::feed::use_feed;

/// 提醒列表页：实时镜像存储中的提醒
#[component]
pub fn RemindersPage() -> impl IntoView {
    let feed = use_feed();
    let notice = use_notice();

    let handle_dismiss = move |id: String| {
        spawn_local(async move {
            if let Err(e) = feed.dismiss(id).await {
                notice.error(format!("Failed to dismiss reminder: {}", e.message()));
            }
        });
    };

    let handle_delete = move |id: String| {
        spawn_local(async move {
            match feed.remove(id).await {
                Ok(()) => notice.success("Reminder deleted"),
                Err(e) => notice.error(format!("Failed to delete reminder: {}", e.message())),
            }
        });
    };

    let count = move || feed.state.with(|s| s.records.len());

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body p-0">
                <div class="flex items-center justify-between p-6 pb-2">
                    <div>
                        <h3 class="card-title">"Reminders"</h3>
                        <p class="text-base-content/70 text-sm">"Medication and appointment reminders, soonest first."</p>
                    </div>
                    <AddReminderDialog />
                </div>

                <Show when=move || feed.state.with(|s| s.error.is_some())>
                    <div role="alert" class="alert alert-warning mx-6">
                        <span>{move || feed.state.with(|s| s.error.as_ref().map(|e| e.message().to_string()).unwrap_or_default())}</span>
                    </div>
                </Show>

                <div class="overflow-x-auto w-full">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                <th>"Reminder"</th>
                                <th>"When"</th>
                                <th>"Status"</th>
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>
                            <Show when=move || feed.state.with(|s| s.loading) && count() == 0>
                                <tr>
                                    <td colspan="4" class="text-center py-8 text-base-content/50">
                                        <span class="loading loading-spinner loading-md"></span> " Loading..."
                                    </td>
                                </tr>
                            </Show>
                            <Show when=move || !feed.state.with(|s| s.loading) && count() == 0>
                                <tr>
                                    <td colspan="4" class="text-center py-8 text-base-content/50">
                                        "No reminders yet. Add one to get started."
                                    </td>
                                </tr>
                            </Show>
                            <For
                                each=move || feed.state.with(|s| s.records.clone())
                                key=|r| (r.id.clone(), r.is_dismissed)
                                children=move |r| {
                                    let dismiss_id = r.id.clone();
                                    let delete_id = r.id.clone();
                                    view! {
                                        <tr class=if r.is_dismissed { "opacity-50" } else { "" }>
                                            <td>
                                                <div class="font-bold">{r.label().to_string()}</div>
                                                <div class="text-sm opacity-70">{r.message.clone()}</div>
                                            </td>
                                            <td class="text-sm">{format_date_time(&r.date_time)}</td>
                                            <td>
                                                {if r.is_dismissed {
                                                    view! { <span class="badge badge-ghost">"Dismissed"</span> }.into_any()
                                                } else {
                                                    view! { <span class="badge badge-primary badge-outline">"Active"</span> }.into_any()
                                                }}
                                            </td>
                                            <td class="flex gap-2 justify-end">
                                                {(!r.is_dismissed).then(|| view! {
                                                    <button class="btn btn-ghost btn-sm" on:click=move |_| handle_dismiss(dismiss_id.clone())>
                                                        "Dismiss"
                                                    </button>
                                                })}
                                                <button class="btn btn-ghost btn-sm text-error" on:click=move |_| handle_delete(delete_id.clone())>
                                                    "Delete"
                                                </button>
                                            </td>
                                        </tr>
                                    }
                                }
                            />
                        </tbody>
                    </table>
                </div>
            </div>
        </div>
    }
}
