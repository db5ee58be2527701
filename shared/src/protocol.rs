use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// GET/DELETE 请求不携带请求体
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

/// A trait that defines the request-response relationship and metadata for a downstream endpoint.
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The URL path, appended to the configured base URL.
    const PATH: &'static str;
    /// The HTTP method.
    const METHOD: HttpMethod;
}

/// Error payload returned by the downstream services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub detail: String,
}

// =========================================================
// News
// =========================================================

/// Latest health news
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NewsRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub articles: Vec<NewsArticle>,
    #[serde(default)]
    pub total_results: u32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub disclaimer: Option<String>,
}

impl ApiRequest for NewsRequest {
    type Response = NewsResponse;
    const PATH: &'static str = "/news";
    const METHOD: HttpMethod = HttpMethod::Get;
}

// =========================================================
// Emergency alert
// =========================================================

/// Notify the signed-in user's emergency contact. The server resolves the contact from the token.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EmergencyAlertRequest {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyEmailResponse {
    pub status: String,
    pub message: String,
    #[serde(default)]
    pub recipient_email: Option<String>,
}

impl ApiRequest for EmergencyAlertRequest {
    type Response = EmergencyEmailResponse;
    const PATH: &'static str = "/send-emergency-email";
    const METHOD: HttpMethod = HttpMethod::Post;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_news_response_tolerates_sparse_articles() {
        let body = json!({
            "articles": [{ "title": "Sleep and memory", "url": "https://n.example/1" }],
            "total_results": 1
        });
        let resp: NewsResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.articles.len(), 1);
        assert_eq!(resp.articles[0].author, None);
        assert_eq!(resp.disclaimer, None);
    }

    #[test]
    fn test_method_body_rules() {
        assert!(!HttpMethod::Get.has_body());
        assert!(EmergencyAlertRequest::METHOD.has_body());
        assert_eq!(EmergencyAlertRequest::METHOD.as_str(), "POST");
    }
}
