//! Firebase Auth 身份后端

use async_trait::async_trait;
use medizap::{IdentityBackend, LiveStream, MedResult, MedizapError, Session, live_channel};
use wasm_bindgen::prelude::*;

use super::firebase::{FirebaseApp, fb_id_token, fb_on_auth_changed, fb_sign_out, settle};
use crate::serde_helper;

#[derive(Clone)]
pub struct FirebaseIdentity {
    app: FirebaseApp,
}

impl FirebaseIdentity {
    pub fn new(app: FirebaseApp) -> Self {
        Self { app }
    }
}

#[async_trait(?Send)]
impl IdentityBackend for FirebaseIdentity {
    fn watch_sessions(&self) -> LiveStream<Option<Session>> {
        let (sender, stream) = live_channel();
        let on_user = Closure::<dyn FnMut(JsValue)>::new(move |user: JsValue| {
            let session = if user.is_null() || user.is_undefined() {
                None
            } else {
                match serde_helper::from_value::<Session>(user) {
                    Ok(session) => Some(session),
                    Err(e) => {
                        log::error!(target: "medizap::session", "Unreadable auth user: {}", e);
                        None
                    }
                }
            };
            sender.send(session);
        });

        let unsubscribe = fb_on_auth_changed(self.app.handle(), on_user.as_ref().unchecked_ref());
        stream.with_teardown(move || {
            let _ = unsubscribe.call0(&JsValue::NULL);
            drop(on_user);
        })
    }

    async fn sign_out(&self) -> MedResult<()> {
        settle(fb_sign_out(self.app.handle()), "identity.sign_out").await?;
        Ok(())
    }

    async fn id_token(&self, session: &Session) -> MedResult<String> {
        let token = settle(fb_id_token(self.app.handle()), "identity.id_token").await?;
        token.as_string().ok_or_else(|| {
            MedizapError::unauthenticated(format!("No ID token for {}", session.uid))
        })
    }
}
