use std::fmt;

use medizap_shared::protocol::ErrorPayload;
use serde::{Deserialize, Serialize};

// =========================================================
// 错误类别枚举
// =========================================================

/// 错误类别
/// 描述失败的语义，而不是失败发生的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// 没有会话或令牌失效
    Unauthenticated,
    /// 存储安全规则拒绝访问
    PermissionDenied,
    /// 资源不存在
    NotFound,
    /// 输入校验失败（配置、表单）
    InvalidInput,
    /// JSON 解析或序列化错误
    Serialization,
    /// 网络层失败（fetch 被拒、连接中断）
    Network,
    /// 身份后端或文档存储的其他失败
    Store,
    /// 下游 HTTP 服务返回的错误
    Upstream,
}

impl ErrorKind {
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::NotFound => "RESOURCE_NOT_FOUND",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Serialization => "JSON_PARSE_ERROR",
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Store => "STORE_ERROR",
            ErrorKind::Upstream => "UPSTREAM_ERROR",
        }
    }

    /// 按存储 SDK 的错误码归类（`permission-denied` 等，可带 `firestore/` 前缀）
    pub fn from_store_code(code: &str) -> Self {
        let code = code.rsplit('/').next().unwrap_or(code);
        match code {
            "permission-denied" => ErrorKind::PermissionDenied,
            "unauthenticated" => ErrorKind::Unauthenticated,
            "not-found" => ErrorKind::NotFound,
            "unavailable" | "network-request-failed" => ErrorKind::Network,
            _ => ErrorKind::Store,
        }
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// 结构化的错误追踪片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSpan {
    /// 操作名称，如 "feed.add", "profile.load"
    pub operation: String,
    /// 额外的细节信息，如 uid、文档 id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// 客户端核心的错误类型
///
/// - kind: 错误语义
/// - message: 错误消息
/// - source: 原始错误（可选）
/// - spans: 调用追踪栈
#[derive(Debug)]
pub struct MedizapError {
    pub kind: ErrorKind,
    pub message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

impl MedizapError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            spans: Vec::new(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Store, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upstream, message)
    }

    /// 带存储错误码的构造
    pub fn from_store_code(code: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::from_store_code(code), message)
    }

    /// 解析下游服务的非 2xx 响应
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorPayload>(body) {
            Ok(payload) => Self::upstream(payload.detail),
            Err(_) => Self::upstream(format!("HTTP error! status: {status}")),
        }
        .in_op_with("http.status", status.to_string())
    }

    // --- Context builders ---

    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // --- Accessors ---

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    pub fn is_permission_denied(&self) -> bool {
        self.kind == ErrorKind::PermissionDenied
    }
}

// =========================================================
// Display & Error trait 实现
// =========================================================

impl fmt::Display for MedizapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for MedizapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl Clone for MedizapError {
    /// 克隆时丢弃 source（不可克隆），保留类别、消息与追踪
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
            spans: self.spans.clone(),
        }
    }
}

impl PartialEq for MedizapError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message && self.spans == other.spans
    }
}

impl From<serde_json::Error> for MedizapError {
    fn from(e: serde_json::Error) -> Self {
        MedizapError::serialization(e.to_string())
    }
}

pub type MedResult<T> = std::result::Result<T, MedizapError>;
