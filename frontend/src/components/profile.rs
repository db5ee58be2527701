use leptos::prelude::*;
use leptos::task::spawn_local;
use medizap::shared::{EmergencyContact, UserProfile};

use crate::auth::{use_profile, use_session};
use crate::components::dashboard::use_notice;

/// 资料表单的字段信号
#[derive(Clone, Copy)]
struct ProfileForm {
    display_name: RwSignal<String>,
    phone_number: RwSignal<String>,
    date_of_birth: RwSignal<String>,
    blood_group: RwSignal<String>,
    contact_name: RwSignal<String>,
    contact_email: RwSignal<String>,
    contact_phone: RwSignal<String>,
}

impl ProfileForm {
    fn new() -> Self {
        Self {
            display_name: RwSignal::new(String::new()),
            phone_number: RwSignal::new(String::new()),
            date_of_birth: RwSignal::new(String::new()),
            blood_group: RwSignal::new(String::new()),
            contact_name: RwSignal::new(String::new()),
            contact_email: RwSignal::new(String::new()),
            contact_phone: RwSignal::new(String::new()),
        }
    }

    fn fill(&self, profile: UserProfile) {
        self.display_name.set(profile.display_name);
        self.phone_number.set(profile.phone_number.unwrap_or_default());
        self.date_of_birth.set(profile.date_of_birth.unwrap_or_default());
        self.blood_group.set(profile.blood_group.unwrap_or_default());
        self.contact_name.set(profile.emergency_contact.name);
        self.contact_email.set(profile.emergency_contact.email);
        self.contact_phone.set(profile.emergency_contact.phone.unwrap_or_default());
    }

    /// 空白的可选字段在保存前规范化为 None，写入 null 以清除旧值
    fn to_profile(&self) -> UserProfile {
        UserProfile {
            display_name: self.display_name.get(),
            phone_number: Some(self.phone_number.get()),
            date_of_birth: Some(self.date_of_birth.get()),
            blood_group: Some(self.blood_group.get()),
            emergency_contact: EmergencyContact {
                name: self.contact_name.get(),
                email: self.contact_email.get(),
                phone: Some(self.contact_phone.get()),
            },
        }
    }
}

#[component]
fn TextField(
    id: &'static str,
    label: &'static str,
    value: RwSignal<String>,
    #[prop(default = "text")] input_type: &'static str,
    #[prop(optional)] required: bool,
) -> impl IntoView {
    view! {
        <div class="form-control">
            <label for=id class="label">
                <span class="label-text">{label} {required.then_some(" *")}</span>
            </label>
            <input
                id=id
                type=input_type
                required=required
                on:input=move |ev| value.set(event_target_value(&ev))
                prop:value=value
                class="input input-bordered w-full"
            />
        </div>
    }
}

/// 资料页：补全资料后其余仪表盘页面才会开放
#[component]
pub fn ProfilePage() -> impl IntoView {
    let session = use_session();
    let profile = use_profile();
    let notice = use_notice();
    let form = ProfileForm::new();
    let loading = RwSignal::new(true);
    let saving = RwSignal::new(false);
    let error_msg = RwSignal::new(Option::<String>::None);

    // 预填当前资料；没有文档时用会话里的显示名
    if let Some(current) = session.current() {
        spawn_local(async move {
            match profile.load(&current.uid).await {
                Ok(Some(existing)) => form.fill(existing),
                Ok(None) => {
                    if let Some(name) = current.display_name.clone() {
                        form.display_name.try_set(name);
                    }
                }
                Err(e) => {
                    log::warn!(target: "medizap::profile", "Could not prefill profile form: {}", e);
                    error_msg.try_set(Some(e.message().to_string()));
                }
            }
            loading.try_set(false);
        });
    }

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(uid) = session.current().map(|s| s.uid) else {
            error_msg.set(Some("User not authenticated".to_string()));
            return;
        };
        let draft = form.to_profile();
        saving.set(true);
        error_msg.set(None);
        spawn_local(async move {
            match profile.save(&uid, draft).await {
                Ok(saved) => {
                    form.fill(saved);
                    notice.success("Profile saved");
                }
                Err(e) => error_msg.set(Some(e.message().to_string())),
            }
            saving.set(false);
        });
    };

    let missing = move || profile.check.with(|p| p.missing_fields().join(", "));

    view! {
        <div class="card bg-base-100 shadow-xl max-w-2xl">
            <div class="card-body">
                <h3 class="card-title">"Your Profile"</h3>
                <Show when=move || profile.check.with(|p| p.action_required())>
                    <p class="text-warning text-sm">
                        "Complete the required fields to continue. "
                        {move || {
                            let missing = missing();
                            (!missing.is_empty()).then(|| format!("Missing: {missing}"))
                        }}
                    </p>
                </Show>
                <Show when=move || error_msg.get().is_some()>
                    <div role="alert" class="alert alert-error text-sm py-2">
                        <span>{move || error_msg.get().unwrap_or_default()}</span>
                    </div>
                </Show>
                <Show when=move || !loading.get() fallback=|| view! { <span class="loading loading-spinner loading-md"></span> }>
                    <form on:submit=on_submit class="space-y-4">
                        <TextField id="display_name" label="Full name" value=form.display_name required=true />
                        <div class="grid grid-cols-1 md:grid-cols-3 gap-4">
                            <TextField id="phone_number" label="Phone" value=form.phone_number input_type="tel" />
                            <TextField id="date_of_birth" label="Date of birth" value=form.date_of_birth input_type="date" />
                            <TextField id="blood_group" label="Blood group" value=form.blood_group />
                        </div>
                        <h4 class="font-semibold pt-2">"Emergency contact"</h4>
                        <div class="grid grid-cols-1 md:grid-cols-3 gap-4">
                            <TextField id="contact_name" label="Name" value=form.contact_name required=true />
                            <TextField id="contact_email" label="Email" value=form.contact_email input_type="email" required=true />
                            <TextField id="contact_phone" label="Phone" value=form.contact_phone input_type="tel" />
                        </div>
                        <div class="card-actions justify-end">
                            <button type="submit" class="btn btn-primary" disabled=move || saving.get()>
                                {move || if saving.get() { "Saving..." } else { "Save Profile" }}
                            </button>
                        </div>
                    </form>
                </Show>
            </div>
        </div>
    }
}
