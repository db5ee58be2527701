//! 实时提醒列表
//!
//! `ReminderFeed` 为当前会话维护一份提醒的本地镜像：
//! - 每个会话最多一个活动订阅，切换会话时先退订旧订阅再建立新订阅
//! - 本地列表只由最新快照决定，写操作只是远端写入的薄代理
//! - 旧订阅迟到的快照按代数（`Epoch`）丢弃

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::channel::mpsc::UnboundedReceiver;
use futures::future::{AbortHandle, Abortable, LocalBoxFuture};
use log::{debug, error, info};
use medizap_shared::{NewReminder, RawReminder, ReminderPatch, ReminderRecord, upcoming};

use crate::adapter::CollectionStore;
use crate::error::{MedResult, MedizapError};
use crate::subscription::{Epoch, Teardown};

#[cfg(test)]
mod tests;

const LOG_TARGET: &str = "medizap::feed";

type Snapshot = MedResult<Vec<RawReminder>>;
type Listener = Rc<dyn Fn(&FeedState)>;
type Clock = Rc<dyn Fn() -> DateTime<Utc>>;

/// 提交到宿主事件循环的任务执行器
pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

/// 对外暴露的列表状态
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedState {
    /// 按存储投递顺序（`dateTime` 升序）
    pub records: Vec<ReminderRecord>,
    pub loading: bool,
    /// 最近一次订阅错误；之前的快照保留
    pub error: Option<MedizapError>,
}

impl FeedState {
    pub fn upcoming(&self, now: DateTime<Utc>, limit: usize) -> Vec<ReminderRecord> {
        upcoming(&self.records, now, limit)
    }

    pub fn find(&self, id: &str) -> Option<&ReminderRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

/// 活动订阅：drop 时中止消费任务并退订
struct ActiveFeed {
    abort: AbortHandle,
    _teardown: Teardown,
}

impl Drop for ActiveFeed {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

struct FeedInner {
    state: FeedState,
    owner: Option<String>,
    active: Option<ActiveFeed>,
}

struct Shared {
    inner: RefCell<FeedInner>,
    epoch: Epoch,
    listener: RefCell<Option<Listener>>,
    clock: Clock,
}

impl Shared {
    /// 通知监听者；调用时不持有任何 RefCell 借用
    fn notify(&self) {
        let state = self.inner.borrow().state.clone();
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(&state);
        }
    }

    fn apply_snapshot(&self, ticket: u64, snapshot: Snapshot) {
        {
            let mut inner = self.inner.borrow_mut();
            if !self.epoch.is_current(ticket) {
                debug!(target: LOG_TARGET, "Dropping snapshot from a closed subscription");
                return;
            }
            let owner = inner.owner.clone().unwrap_or_default();
            match snapshot {
                Ok(raw) => {
                    let now = (self.clock)();
                    let records: Vec<_> = raw
                        .into_iter()
                        .map(|r| ReminderRecord::from_raw(r, now))
                        .collect();
                    debug!(
                        target: LOG_TARGET,
                        "Snapshot for {}: {} reminders",
                        owner,
                        records.len()
                    );
                    inner.state.records = records;
                    inner.state.loading = false;
                    inner.state.error = None;
                }
                Err(e) => {
                    let e = e.in_op_with("feed.snapshot", owner.clone());
                    if e.is_permission_denied() {
                        error!(
                            target: LOG_TARGET,
                            "PERMISSION DENIED! Check the security rules for the reminders of {}: {}",
                            owner,
                            e
                        );
                    } else {
                        error!(target: LOG_TARGET, "Error fetching reminders: {}", e);
                    }
                    inner.state.loading = false;
                    inner.state.error = Some(e);
                }
            }
        }
        self.notify();
    }
}

/// 消费一条订阅的快照，直到通道关闭或共享状态被释放
async fn pump(shared: Weak<Shared>, ticket: u64, mut rx: UnboundedReceiver<Snapshot>) {
    while let Some(snapshot) = rx.next().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.apply_snapshot(ticket, snapshot);
    }
}

/// 实时提醒列表
pub struct ReminderFeed<S> {
    store: Rc<S>,
    spawner: Spawner,
    shared: Rc<Shared>,
}

impl<S> Clone for ReminderFeed<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            spawner: self.spawner.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<S: CollectionStore + 'static> ReminderFeed<S> {
    pub fn new(store: S, spawner: impl Fn(LocalBoxFuture<'static, ()>) + 'static) -> Self {
        Self::with_clock(store, spawner, Utc::now)
    }

    /// 指定时钟（缺失时间的记录回落到该时钟）
    pub fn with_clock(
        store: S,
        spawner: impl Fn(LocalBoxFuture<'static, ()>) + 'static,
        clock: impl Fn() -> DateTime<Utc> + 'static,
    ) -> Self {
        Self {
            store: Rc::new(store),
            spawner: Rc::new(spawner),
            shared: Rc::new(Shared {
                inner: RefCell::new(FeedInner {
                    state: FeedState::default(),
                    owner: None,
                    active: None,
                }),
                epoch: Epoch::new(),
                listener: RefCell::new(None),
                clock: Rc::new(clock),
            }),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 注册状态变化监听（替换已有的监听）
    pub fn set_listener(&self, listener: impl Fn(&FeedState) + 'static) {
        let listener: Listener = Rc::new(listener);
        *self.shared.listener.borrow_mut() = Some(listener);
    }

    pub fn state(&self) -> FeedState {
        self.shared.inner.borrow().state.clone()
    }

    pub fn owner(&self) -> Option<String> {
        self.shared.inner.borrow().owner.clone()
    }

    /// 切换到新的会话（或无会话）
    ///
    /// 旧订阅在新订阅建立之前同步退订；无会话时立即得到空列表且不访问存储。
    pub fn switch_session(&self, uid: Option<&str>) {
        let previous = {
            let mut inner = self.shared.inner.borrow_mut();
            let same_owner = inner.owner.as_deref() == uid;
            if same_owner && (uid.is_none() || inner.active.is_some()) {
                return;
            }
            let active = inner.active.take();
            let owner = inner.owner.take();
            active.map(|active| (active, owner))
        };
        let ticket = self.shared.epoch.advance();

        if let Some((active, owner)) = previous {
            drop(active);
            info!(
                target: LOG_TARGET,
                "Unsubscribed from reminders of {}",
                owner.unwrap_or_default()
            );
        }

        match uid {
            None => {
                let mut inner = self.shared.inner.borrow_mut();
                inner.owner = None;
                inner.state = FeedState::default();
            }
            Some(uid) => {
                let (rx, teardown) = self.store.subscribe(uid).into_parts();
                let (abort, registration) = AbortHandle::new_pair();
                let task = Abortable::new(pump(Rc::downgrade(&self.shared), ticket, rx), registration);
                {
                    let mut inner = self.shared.inner.borrow_mut();
                    inner.owner = Some(uid.to_string());
                    inner.state = FeedState {
                        records: Vec::new(),
                        loading: true,
                        error: None,
                    };
                    inner.active = Some(ActiveFeed {
                        abort,
                        _teardown: teardown,
                    });
                }
                info!(target: LOG_TARGET, "Subscribed to reminders of {}", uid);
                (self.spawner)(Box::pin(async move {
                    let _ = task.await;
                }));
            }
        }
        self.shared.notify();
    }

    /// 释放当前订阅（视图卸载时调用）
    pub fn close(&self) {
        self.switch_session(None);
    }

    // =========================================================
    // 写操作：各自独立，失败只记录日志并返回错误
    // =========================================================

    pub async fn add(&self, reminder: NewReminder) -> MedResult<String> {
        let uid = self.require_owner("feed.add")?;
        match self.store.add(&uid, &reminder).await {
            Ok(id) => {
                debug!(target: LOG_TARGET, "Added reminder {} for {}", id, uid);
                Ok(id)
            }
            Err(e) => Err(write_failed(e.in_op_with("feed.add", uid))),
        }
    }

    pub async fn update(&self, id: &str, patch: ReminderPatch) -> MedResult<()> {
        let uid = self.require_owner("feed.update")?;
        if patch.is_empty() {
            return Ok(());
        }
        self.store
            .update(&uid, id, &patch)
            .await
            .map_err(|e| write_failed(e.in_op_with("feed.update", id)))
    }

    pub async fn remove(&self, id: &str) -> MedResult<()> {
        let uid = self.require_owner("feed.remove")?;
        self.store
            .remove(&uid, id)
            .await
            .map_err(|e| write_failed(e.in_op_with("feed.remove", id)))
    }

    pub async fn dismiss(&self, id: &str) -> MedResult<()> {
        self.update(id, ReminderPatch::dismiss()).await
    }

    fn require_owner(&self, op: &str) -> MedResult<String> {
        self.owner().ok_or_else(|| {
            write_failed(MedizapError::unauthenticated("No user signed in").in_op(op))
        })
    }
}

fn write_failed(e: MedizapError) -> MedizapError {
    error!(target: LOG_TARGET, "Reminder write failed: {}", e);
    e
}
