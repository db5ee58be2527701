use std::rc::Rc;

use leptos::prelude::*;
use medizap::api::MedizapApi;
use medizap::shared::protocol::{EmergencyEmailResponse, NewsArticle};
use medizap::{MedResult, MedizapError};

use crate::auth::SessionContext;
use crate::web::http::FetchHttpClient;

/// 下游服务客户端，每次调用都取当前会话的令牌
#[derive(Clone, Copy)]
pub struct ApiContext {
    api: StoredValue<Rc<MedizapApi<FetchHttpClient>>, leptos::prelude::LocalStorage>,
    session: SessionContext,
}

impl ApiContext {
    pub fn new(base_url: &str, session: SessionContext) -> Self {
        Self {
            api: StoredValue::new_local(Rc::new(MedizapApi::new(FetchHttpClient, base_url))),
            session,
        }
    }

    fn client(&self) -> MedResult<Rc<MedizapApi<FetchHttpClient>>> {
        self.api
            .try_get_value()
            .ok_or_else(|| MedizapError::network("API client is gone"))
    }

    /// 最新健康新闻
    pub async fn latest_news(&self) -> MedResult<Vec<NewsArticle>> {
        let token = self.session.bearer_token().await?;
        self.client()?.latest_news(&token).await
    }

    /// 给紧急联系人发送邮件
    pub async fn send_emergency_alert(&self) -> MedResult<EmergencyEmailResponse> {
        let token = self.session.bearer_token().await?;
        self.client()?.send_emergency_alert(&token).await
    }
}

pub fn use_api() -> ApiContext {
    use_context::<ApiContext>().expect("ApiContext should be provided")
}
