use async_trait::async_trait;
use medizap_shared::{NewReminder, RawReminder, ReminderPatch, UserProfile};

use crate::error::MedResult;
use crate::session::Session;
use crate::subscription::LiveStream;

/// 抽象身份后端：会话推送、注销、令牌
///
/// 后端不可达或令牌失效时应推送 `None`，由上层按未登录处理。
#[async_trait(?Send)]
pub trait IdentityBackend {
    fn watch_sessions(&self) -> LiveStream<Option<Session>>;
    async fn sign_out(&self) -> MedResult<()>;
    async fn id_token(&self, session: &Session) -> MedResult<String>;
}

/// 抽象资料存储：每个用户一份资料文档
#[async_trait(?Send)]
pub trait ProfileStore {
    async fn load_profile(&self, uid: &str) -> MedResult<Option<UserProfile>>;
    /// 合并写入
    async fn save_profile(&self, uid: &str, profile: &UserProfile) -> MedResult<()>;
}

/// 抽象集合存储：每个用户的提醒集合，快照按 `dateTime` 升序投递
#[async_trait(?Send)]
pub trait CollectionStore {
    fn subscribe(&self, uid: &str) -> LiveStream<MedResult<Vec<RawReminder>>>;
    /// 返回新文档的 id
    async fn add(&self, uid: &str, reminder: &NewReminder) -> MedResult<String>;
    async fn update(&self, uid: &str, id: &str, patch: &ReminderPatch) -> MedResult<()>;
    async fn remove(&self, uid: &str, id: &str) -> MedResult<()>;
}

// =========================================================
// 测试环境实现 (Mock)
// =========================================================
