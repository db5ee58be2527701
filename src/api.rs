//! 下游 HTTP 服务客户端
//!
//! 每个请求都附带当前会话的 Bearer 令牌。

use log::{debug, warn};
use medizap_shared::protocol::{
    ApiRequest, EmergencyAlertRequest, EmergencyEmailResponse, NewsArticle, NewsRequest,
};
use medizap_shared::{CONTENT_TYPE_JSON, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE, NEWS_CARD_LIMIT};

use crate::error::{MedResult, MedizapError};
use crate::request::{HttpClient, HttpRequest};

const LOG_TARGET: &str = "medizap::api";

pub struct MedizapApi<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> MedizapApi<C> {
    pub fn new(client: C, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 发送一个类型化请求
    pub async fn call<R: ApiRequest>(&self, token: &str, request: &R) -> MedResult<R::Response> {
        let url = self.url(R::PATH);
        let mut req = HttpRequest::new(&url, R::METHOD)
            .with_header(HEADER_AUTHORIZATION, &format!("Bearer {token}"));
        if R::METHOD.has_body() {
            req = req
                .with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON)
                .with_body(serde_json::to_value(request)?);
        }

        debug!(target: LOG_TARGET, "{} {}", R::METHOD.as_str(), url);
        let resp = self
            .client
            .send(req)
            .await
            .map_err(|e| e.in_op_with("api.call", R::PATH))?;

        if !resp.is_success() {
            let err = MedizapError::from_http_status(resp.status, &resp.body).in_op_with("api.call", R::PATH);
            warn!(target: LOG_TARGET, "Request failed: {}", err);
            return Err(err);
        }
        resp.json::<R::Response>()
            .map_err(|e| e.in_op_with("api.call", R::PATH))
    }

    /// 首页新闻卡片：最新的几篇文章
    pub async fn latest_news(&self, token: &str) -> MedResult<Vec<NewsArticle>> {
        let resp = self.call(token, &NewsRequest).await?;
        Ok(resp.articles.into_iter().take(NEWS_CARD_LIMIT).collect())
    }

    /// 通知紧急联系人
    pub async fn send_emergency_alert(&self, token: &str) -> MedResult<EmergencyEmailResponse> {
        self.call(token, &EmergencyAlertRequest::default()).await
    }
}
