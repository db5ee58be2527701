//! Firestore 存储适配器
//!
//! 资料文档与提醒集合的路径规则见 `medizap_shared`。

use async_trait::async_trait;
use medizap::shared::{
    NewReminder, RawReminder, ReminderPatch, UserProfile, profile_doc_path, reminders_collection_path,
};
use medizap::{CollectionStore, LiveStream, MedResult, ProfileStore, live_channel};
use wasm_bindgen::prelude::*;

use super::firebase::{
    FirebaseApp, fb_collection_add, fb_doc_delete, fb_doc_get, fb_doc_merge, fb_doc_update,
    fb_watch_ordered, js_error, settle,
};
use crate::serde_helper;

/// 按时间排序的字段，写入时由 JS 端转换为存储时间戳
const ORDER_FIELD: &str = "dateTime";

fn time_fields() -> js_sys::Array {
    js_sys::Array::of1(&JsValue::from_str(ORDER_FIELD))
}

// =========================================================
// 用户资料
// =========================================================

#[derive(Clone)]
pub struct FirestoreProfiles {
    app: FirebaseApp,
}

impl FirestoreProfiles {
    pub fn new(app: FirebaseApp) -> Self {
        Self { app }
    }
}

#[async_trait(?Send)]
impl ProfileStore for FirestoreProfiles {
    async fn load_profile(&self, uid: &str) -> MedResult<Option<UserProfile>> {
        let path = profile_doc_path(self.app.namespace(), uid);
        let doc = settle(fb_doc_get(self.app.handle(), &path), "profile.load").await?;
        if doc.is_null() || doc.is_undefined() {
            return Ok(None);
        }
        let json = serde_helper::to_json(&doc)?;
        Ok(Some(serde_json::from_value(json)?))
    }

    async fn save_profile(&self, uid: &str, profile: &UserProfile) -> MedResult<()> {
        let path = profile_doc_path(self.app.namespace(), uid);
        let data = serde_helper::to_value(profile)?;
        settle(fb_doc_merge(self.app.handle(), &path, &data), "profile.save").await?;
        Ok(())
    }
}

// =========================================================
// 提醒集合
// =========================================================

#[derive(Clone)]
pub struct FirestoreReminders {
    app: FirebaseApp,
}

impl FirestoreReminders {
    pub fn new(app: FirebaseApp) -> Self {
        Self { app }
    }

    fn doc_path(&self, uid: &str, id: &str) -> String {
        format!("{}/{}", reminders_collection_path(self.app.namespace(), uid), id)
    }
}

/// 快照文档数组 `[{ id, data }]` 转换为 `RawReminder`
fn read_snapshot(docs: &JsValue) -> MedResult<Vec<RawReminder>> {
    let json = serde_helper::to_json(docs)?;
    Ok(serde_json::from_value(json)?)
}

#[async_trait(?Send)]
impl CollectionStore for FirestoreReminders {
    fn subscribe(&self, uid: &str) -> LiveStream<MedResult<Vec<RawReminder>>> {
        let path = reminders_collection_path(self.app.namespace(), uid);
        let (sender, stream) = live_channel();

        let docs_sender = sender.clone();
        let on_docs = Closure::<dyn FnMut(JsValue)>::new(move |docs: JsValue| {
            docs_sender.send(read_snapshot(&docs));
        });
        let on_error = Closure::<dyn FnMut(JsValue)>::new(move |err: JsValue| {
            sender.send(Err(js_error(err).in_op("reminders.subscribe")));
        });

        let unsubscribe = fb_watch_ordered(
            self.app.handle(),
            &path,
            ORDER_FIELD,
            on_docs.as_ref().unchecked_ref(),
            on_error.as_ref().unchecked_ref(),
        );
        stream.with_teardown(move || {
            let _ = unsubscribe.call0(&JsValue::NULL);
            drop(on_docs);
            drop(on_error);
        })
    }

    async fn add(&self, uid: &str, reminder: &NewReminder) -> MedResult<String> {
        let path = reminders_collection_path(self.app.namespace(), uid);
        let data = serde_helper::to_value(reminder)?;
        let id = settle(
            fb_collection_add(self.app.handle(), &path, &data, &time_fields()),
            "reminders.add",
        )
        .await?;
        Ok(id.as_string().unwrap_or_default())
    }

    async fn update(&self, uid: &str, id: &str, patch: &ReminderPatch) -> MedResult<()> {
        let data = serde_helper::to_value(patch)?;
        settle(
            fb_doc_update(self.app.handle(), &self.doc_path(uid, id), &data, &time_fields()),
            "reminders.update",
        )
        .await?;
        Ok(())
    }

    async fn remove(&self, uid: &str, id: &str) -> MedResult<()> {
        settle(fb_doc_delete(self.app.handle(), &self.doc_path(uid, id)), "reminders.remove").await?;
        Ok(())
    }
}
