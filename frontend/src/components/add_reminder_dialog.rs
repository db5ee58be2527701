mod form_state;

use form_state::FormState;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::dashboard::use_notice;
use crate::feed::use_feed;

#[component]
pub fn AddReminderDialog() -> impl IntoView {
    let feed = use_feed();
    let notice = use_notice();
    let open = RwSignal::new(false);
    let loading = RwSignal::new(false);
    let error_msg = RwSignal::new(Option::<String>::None);
    let dialog_ref = NodeRef::<leptos::html::Dialog>::new();
    let form = FormState::new();

    Effect::new(move |_| {
        if let Some(dialog) = dialog_ref.get() {
            if open.get() {
                if !dialog.open() {
                    let _ = dialog.show_modal();
                }
            } else if dialog.open() {
                dialog.close();
            }
        }
    });

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let reminder = match form.to_request() {
            Ok(reminder) => reminder,
            Err(msg) => {
                error_msg.set(Some(msg));
                return;
            }
        };
        error_msg.set(None);
        loading.set(true);

        spawn_local(async move {
            match feed.add(reminder).await {
                Ok(_) => {
                    notice.success("Reminder added");
                    form.reset();
                    open.set(false);
                }
                Err(e) => error_msg.set(Some(format!("Failed to add reminder: {}", e.message()))),
            }
            loading.set(false);
        });
    };

    view! {
        <button class="btn btn-primary" on:click=move |_| open.set(true)>
            "Add Reminder"
        </button>

        <dialog class="modal" node_ref=dialog_ref on:close=move |_| open.set(false)>
            <div class="modal-box">
                <h3 class="font-bold text-lg">"New Reminder"</h3>

                <form on:submit=on_submit class="space-y-4 pt-4">
                    <Show when=move || error_msg.get().is_some()>
                        <div role="alert" class="alert alert-error text-sm py-2">
                            <span>{move || error_msg.get().unwrap_or_default()}</span>
                        </div>
                    </Show>

                    <div class="form-control">
                        <label for="reminder_title" class="label">
                            <span class="label-text">"Title"</span>
                        </label>
                        <input id="reminder_title"
                            type="text"
                            placeholder="Metformin 500mg"
                            on:input=move |ev| form.title.set(event_target_value(&ev))
                            prop:value=form.title
                            class="input input-bordered w-full"
                        />
                    </div>
                    <div class="form-control">
                        <label for="reminder_message" class="label">
                            <span class="label-text">"Message"</span>
                        </label>
                        <textarea id="reminder_message"
                            placeholder="Take after lunch"
                            on:input=move |ev| form.message.set(event_target_value(&ev))
                            prop:value=form.message
                            class="textarea textarea-bordered w-full"
                        ></textarea>
                    </div>
                    <div class="form-control">
                        <label for="reminder_when" class="label">
                            <span class="label-text">"Date & time"</span>
                        </label>
                        <input id="reminder_when" required
                            type="datetime-local"
                            on:input=move |ev| form.when.set(event_target_value(&ev))
                            prop:value=form.when
                            class="input input-bordered w-full"
                        />
                    </div>

                    <div class="modal-action">
                        <button type="button" class="btn btn-ghost" on:click=move |_| open.set(false)>"Cancel"</button>
                        <button type="submit" disabled=move || loading.get() class="btn btn-primary">
                            {move || if loading.get() {
                                view! { <span class="loading loading-spinner"></span> "Saving..." }.into_any()
                            } else {
                                "Save".into_any()
                            }}
                        </button>
                    </div>
                </form>
            </div>
            <form method="dialog" class="modal-backdrop">
                <button>"close"</button>
            </form>
        </dialog>
    }
}
