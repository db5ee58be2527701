//! HTTP 请求封装模块
//!
//! 基于 `web_sys::fetch` 实现核心库的 `HttpClient`。

use async_trait::async_trait;
use medizap::request::{HttpClient, HttpRequest, HttpResponse};
use medizap::{MedResult, MedizapError};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

fn build_failed(e: JsValue) -> MedizapError {
    MedizapError::invalid_input(format!("请求构建失败: {:?}", e)).in_op("http.build")
}

fn network_failed(e: JsValue) -> MedizapError {
    MedizapError::network(format!("网络错误: {:?}", e)).in_op("http.fetch")
}

/// 浏览器 fetch 客户端
#[derive(Clone, Copy, Default)]
pub struct FetchHttpClient;

impl FetchHttpClient {
    fn build(req: &HttpRequest) -> MedResult<Request> {
        let headers = Headers::new().map_err(build_failed)?;
        for (key, value) in &req.headers {
            headers.set(key, value).map_err(build_failed)?;
        }

        let opts = RequestInit::new();
        opts.set_method(req.method.as_str());
        opts.set_headers(&headers.into());
        if let Some(body) = &req.body {
            opts.set_body(&JsValue::from_str(body));
        }

        Request::new_with_str_and_init(&req.url, &opts).map_err(build_failed)
    }

    async fn read_text(response: &Response) -> MedResult<String> {
        let promise = response.text().map_err(network_failed)?;
        let text = JsFuture::from(promise).await.map_err(network_failed)?;
        Ok(text.as_string().unwrap_or_default())
    }
}

#[async_trait(?Send)]
impl HttpClient for FetchHttpClient {
    async fn send(&self, req: HttpRequest) -> MedResult<HttpResponse> {
        let request = Self::build(&req)?;
        let window = web_sys::window()
            .ok_or_else(|| MedizapError::network("无法获取 window 对象").in_op("http.fetch"))?;

        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(network_failed)?;
        let response: Response = resp_value.dyn_into().map_err(|e| {
            MedizapError::network(format!("Response 类型转换失败: {:?}", e)).in_op("http.fetch")
        })?;

        let status = response.status();
        let body = Self::read_text(&response).await?;
        Ok(HttpResponse { status, body })
    }
}
