//! Medizap 客户端核心
//!
//! 身份会话、资料完整性判定、路由守卫与实时提醒列表。
//! 不依赖 DOM，浏览器相关的适配器位于 `medizap-frontend`。

pub mod adapter;
pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod guard;
pub mod profile;
pub mod request;
pub mod route;
pub mod session;
pub mod subscription;

pub use adapter::{CollectionStore, IdentityBackend, ProfileStore};
pub use config::{AppConfig, ConfigSource, FirebaseConfig, ProfileFailurePolicy};
pub use error::{ErrorKind, MedResult, MedizapError};
pub use feed::{FeedState, ReminderFeed};
pub use guard::{GateDecision, Navigator, RouteGuard, decide};
pub use profile::{GateSink, ProfileCheck, ProfileResolver, ProfileStatus};
pub use route::AppRoute;
pub use session::{Session, SessionProvider, SessionState};
pub use subscription::{Epoch, LiveSender, LiveStream, Teardown, live_channel};

pub use medizap_shared as shared;
