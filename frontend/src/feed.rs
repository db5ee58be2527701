//! 提醒列表上下文
//!
//! 由仪表盘布局创建；布局卸载时退订。

use leptos::prelude::*;
use leptos::task::spawn_local;
use medizap::shared::{NewReminder, ReminderPatch};
use medizap::{FeedState, MedResult, MedizapError, ReminderFeed};

use crate::auth::SessionContext;
use crate::web::firebase::FirebaseApp;
use crate::web::firestore::FirestoreReminders;

type Feed = ReminderFeed<FirestoreReminders>;

#[derive(Clone, Copy)]
pub struct FeedContext {
    pub state: RwSignal<FeedState>,
    feed: StoredValue<Feed, leptos::prelude::LocalStorage>,
}

impl FeedContext {
    fn handle(&self) -> MedResult<Feed> {
        self.feed
            .try_get_value()
            .ok_or_else(|| MedizapError::unauthenticated("Reminder list is closed"))
    }

    pub async fn add(&self, reminder: NewReminder) -> MedResult<String> {
        self.handle()?.add(reminder).await
    }

    pub async fn update(&self, id: String, patch: ReminderPatch) -> MedResult<()> {
        self.handle()?.update(&id, patch).await
    }

    pub async fn dismiss(&self, id: String) -> MedResult<()> {
        self.handle()?.dismiss(&id).await
    }

    pub async fn remove(&self, id: String) -> MedResult<()> {
        self.handle()?.remove(&id).await
    }
}

pub fn use_feed() -> FeedContext {
    use_context::<FeedContext>().expect("FeedContext should be provided")
}

/// 创建提醒列表并跟随会话身份切换订阅
pub fn provide_feed(app: &FirebaseApp, session: SessionContext) -> FeedContext {
    let state = RwSignal::new(FeedState::default());
    let feed = ReminderFeed::new(FirestoreReminders::new(app.clone()), |task| spawn_local(task));
    feed.set_listener(move |snapshot| {
        state.try_set(snapshot.clone());
    });

    let ctx = FeedContext {
        state,
        feed: StoredValue::new_local(feed),
    };
    provide_context(ctx);

    let uid = Memo::new(move |_| session.state.with(|s| s.uid().map(str::to_string)));
    Effect::new(move |_| {
        let uid = uid.get();
        ctx.feed.with_value(|f| f.switch_session(uid.as_deref()));
    });
    on_cleanup(move || {
        ctx.feed.try_with_value(|f| f.close());
    });

    ctx
}
