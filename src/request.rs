use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::error::{MedResult, MedizapError};
pub use medizap_shared::protocol::HttpMethod;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// 通用 HTTP 请求结构
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> MedResult<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| MedizapError::from(e).in_op_with("http.decode", self.status.to_string()))
    }
}

/// HTTP 客户端特性
/// (?Send) 是因为浏览器环境下 fetch 的 Future 不是 Send 的
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    async fn send(&self, req: HttpRequest) -> MedResult<HttpResponse>;
}

// =========================================================
// 测试环境实现 (Mock)
// =========================================================

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// 按 URL 返回预设响应，未配置的 URL 返回 404；记录所有请求
    pub struct MockHttpClient {
        responses: RefCell<HashMap<String, (u16, String)>>,
        pub requests: RefCell<Vec<HttpRequest>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self {
                responses: RefCell::new(HashMap::new()),
                requests: RefCell::new(Vec::new()),
            }
        }

        pub fn respond(&self, url: &str, status: u16, body: serde_json::Value) {
            self.responses
                .borrow_mut()
                .insert(url.to_string(), (status, body.to_string()));
        }

        pub fn respond_text(&self, url: &str, status: u16, body: &str) {
            self.responses
                .borrow_mut()
                .insert(url.to_string(), (status, body.to_string()));
        }
    }

    #[async_trait::async_trait(?Send)]
    impl HttpClient for MockHttpClient {
        async fn send(&self, req: HttpRequest) -> MedResult<HttpResponse> {
            let canned = self.responses.borrow().get(&req.url).cloned();
            self.requests.borrow_mut().push(req);
            let (status, body) = canned.unwrap_or((404, String::new()));
            Ok(HttpResponse { status, body })
        }
    }
}
