//! Firebase JS SDK 胶水层
//!
//! 依赖页面通过 `<script>` 引入的 compat 版 SDK（全局 `firebase` / `firebaseui`）。
//! 所有对 SDK 的调用都集中在这里，上层只看到 `FirebaseApp` 句柄与 `MedizapError`。

use std::rc::Rc;

use medizap::{AppConfig, MedResult, MedizapError};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::serde_helper;

#[wasm_bindgen(inline_js = r#"
function plain(value) {
  if (value === null || value === undefined) return value;
  if (typeof value.toDate === "function" && "seconds" in value) {
    return { seconds: value.seconds, nanoseconds: value.nanoseconds };
  }
  if (Array.isArray(value)) return value.map(plain);
  if (typeof value === "object") {
    const out = {};
    for (const [k, v] of Object.entries(value)) out[k] = plain(v);
    return out;
  }
  return value;
}

function withTimestamps(data, fields) {
  const ts = globalThis.firebase.firestore.Timestamp;
  const out = Object.assign({}, data);
  for (const f of fields) {
    if (typeof out[f] === "number") out[f] = ts.fromMillis(out[f]);
  }
  return out;
}

function storeError(err) {
  return { code: (err && err.code) || "unknown", message: (err && err.message) || String(err) };
}

export function fb_initialize(config) {
  const fb = globalThis.firebase;
  if (!fb) throw new Error("Firebase SDK is not loaded");
  return fb.apps.length ? fb.app() : fb.initializeApp(config);
}

export function fb_delete(app) {
  return app.delete();
}

export function fb_on_auth_changed(app, onUser) {
  return app.auth().onAuthStateChanged(
    (user) => onUser(user ? {
      uid: user.uid,
      email: user.email,
      displayName: user.displayName,
      photoUrl: user.photoURL,
    } : null),
    (err) => { console.error("auth listener failed", err); onUser(null); },
  );
}

export function fb_sign_out(app) {
  return app.auth().signOut();
}

export function fb_id_token(app) {
  const user = app.auth().currentUser;
  if (!user) return Promise.reject({ code: "unauthenticated", message: "No user signed in" });
  return user.getIdToken();
}

export function fb_doc_get(app, path) {
  return app.firestore().doc(path).get()
    .then((snap) => (snap.exists ? plain(snap.data()) : null))
    .catch((err) => Promise.reject(storeError(err)));
}

export function fb_doc_merge(app, path, data) {
  return app.firestore().doc(path).set(data, { merge: true })
    .catch((err) => Promise.reject(storeError(err)));
}

export function fb_watch_ordered(app, path, field, onDocs, onError) {
  return app.firestore().collection(path).orderBy(field, "asc").onSnapshot(
    (snap) => onDocs(snap.docs.map((d) => ({ id: d.id, data: plain(d.data()) }))),
    (err) => onError(storeError(err)),
  );
}

export function fb_collection_add(app, path, data, timeFields) {
  return app.firestore().collection(path).add(withTimestamps(data, timeFields))
    .then((ref) => ref.id)
    .catch((err) => Promise.reject(storeError(err)));
}

export function fb_doc_update(app, path, data, timeFields) {
  return app.firestore().doc(path).update(withTimestamps(data, timeFields))
    .catch((err) => Promise.reject(storeError(err)));
}

export function fb_doc_delete(app, path) {
  return app.firestore().doc(path).delete()
    .catch((err) => Promise.reject(storeError(err)));
}

export function fb_ui_start(app, container, onSuccess) {
  const fb = globalThis.firebase;
  const ui = globalThis.firebaseui.auth.AuthUI.getInstance() || new globalThis.firebaseui.auth.AuthUI(app.auth());
  ui.start(container, {
    signInFlow: "popup",
    signInOptions: [
      fb.auth.GoogleAuthProvider.PROVIDER_ID,
      fb.auth.EmailAuthProvider.PROVIDER_ID,
    ],
    callbacks: {
      signInSuccessWithAuthResult: (result) => onSuccess(result.user ? result.user.uid : ""),
    },
  });
  return ui;
}

export function fb_ui_reset(ui) {
  ui.reset();
}
"#)]
extern "C" {
    #[wasm_bindgen(catch)]
    fn fb_initialize(config: &JsValue) -> Result<JsValue, JsValue>;
    fn fb_delete(app: &JsValue) -> js_sys::Promise;

    pub(crate) fn fb_on_auth_changed(app: &JsValue, on_user: &js_sys::Function) -> js_sys::Function;
    pub(crate) fn fb_sign_out(app: &JsValue) -> js_sys::Promise;
    pub(crate) fn fb_id_token(app: &JsValue) -> js_sys::Promise;

    pub(crate) fn fb_doc_get(app: &JsValue, path: &str) -> js_sys::Promise;
    pub(crate) fn fb_doc_merge(app: &JsValue, path: &str, data: &JsValue) -> js_sys::Promise;
    pub(crate) fn fb_watch_ordered(
        app: &JsValue,
        path: &str,
        field: &str,
        on_docs: &js_sys::Function,
        on_error: &js_sys::Function,
    ) -> js_sys::Function;
    pub(crate) fn fb_collection_add(
        app: &JsValue,
        path: &str,
        data: &JsValue,
        time_fields: &js_sys::Array,
    ) -> js_sys::Promise;
    pub(crate) fn fb_doc_update(
        app: &JsValue,
        path: &str,
        data: &JsValue,
        time_fields: &js_sys::Array,
    ) -> js_sys::Promise;
    pub(crate) fn fb_doc_delete(app: &JsValue, path: &str) -> js_sys::Promise;

    #[wasm_bindgen(catch)]
    fn fb_ui_start(app: &JsValue, container: &web_sys::Element, on_success: &JsValue) -> Result<JsValue, JsValue>;
    fn fb_ui_reset(ui: &JsValue);
}

/// 把 JS 端抛出的错误（`{ code, message }` 或任意值）转换为 `MedizapError`
pub fn js_error(err: JsValue) -> MedizapError {
    let field = |key: &str| {
        js_sys::Reflect::get(&err, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_string())
    };
    let message = field("message")
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{:?}", err));
    match field("code") {
        Some(code) => MedizapError::from_store_code(&code, message),
        None => MedizapError::store(message),
    }
}

/// 等待一个 Promise，并统一错误类型
pub(crate) async fn settle(promise: js_sys::Promise, op: &str) -> MedResult<JsValue> {
    JsFuture::from(promise)
        .await
        .map_err(|e| js_error(e).in_op(op.to_string()))
}

/// 已初始化的 Firebase 应用句柄
///
/// 启动时显式创建，页面卸载时调用 `shutdown()`。
#[derive(Clone)]
pub struct FirebaseApp {
    handle: JsValue,
    namespace: Rc<str>,
}

impl FirebaseApp {
    pub fn initialize(config: &AppConfig) -> MedResult<Self> {
        let options = serde_helper::to_value(&config.firebase)?;
        let handle = fb_initialize(&options).map_err(|e| js_error(e).in_op("firebase.initialize"))?;
        log::info!(
            target: "medizap::firebase",
            "Firebase initialized for project {}",
            config.firebase.project_id
        );
        Ok(Self {
            handle,
            namespace: Rc::from(config.app_namespace()),
        })
    }

    pub(crate) fn handle(&self) -> &JsValue {
        &self.handle
    }

    /// 存储路径中的 `appId`
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// 释放 SDK 持有的连接与监听
    pub fn shutdown(&self) {
        let promise = fb_delete(&self.handle);
        wasm_bindgen_futures::spawn_local(async move {
            match settle(promise, "firebase.shutdown").await {
                Ok(_) => log::info!(target: "medizap::firebase", "Firebase app shut down"),
                Err(e) => log::warn!(target: "medizap::firebase", "Firebase shutdown failed: {}", e),
            }
        });
    }

    /// 在 `container` 中挂载托管登录界面；成功回调返回 false，界面自身不做跳转
    pub fn start_sign_in_ui(&self, container: &web_sys::Element) -> MedResult<SignInUi> {
        let on_success = Closure::<dyn FnMut(String) -> bool>::new(|uid: String| {
            log::info!(target: "medizap::session", "Sign-in UI completed for {}", uid);
            false
        })
        .into_js_value();
        let ui = fb_ui_start(&self.handle, container, &on_success)
            .map_err(|e| js_error(e).in_op("firebase.ui_start"))?;
        Ok(SignInUi { ui })
    }
}

/// 托管登录界面，drop 时重置
pub struct SignInUi {
    ui: JsValue,
}

impl Drop for SignInUi {
    fn drop(&mut self) {
        fb_ui_reset(&self.ui);
    }
}
