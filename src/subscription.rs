//! 可取消的实时流
//!
//! 后端的回调式订阅统一转换为 `LiveStream`：一个普通的 `futures::Stream`，
//! 外加一个 `Teardown` 守卫。守卫被丢弃时关闭通道并执行后端的退订函数，且只执行一次。

use std::cell::Cell;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::Stream;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};

// =========================================================
// Teardown
// =========================================================

/// 退订守卫，drop 时运行一次
#[must_use = "dropping a Teardown runs it immediately"]
pub struct Teardown(Option<Box<dyn FnOnce()>>);

impl Teardown {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    /// 立即执行（与 drop 等价，只是意图更明确）
    pub fn release(self) {
        drop(self)
    }

    /// 在现有退订逻辑之后追加一步
    pub fn then(mut self, f: impl FnOnce() + 'static) -> Self {
        let first = self.0.take();
        Self::new(move || {
            if let Some(first) = first {
                first();
            }
            f();
        })
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Teardown")
            .field(&if self.0.is_some() { "armed" } else { "spent" })
            .finish()
    }
}

// =========================================================
// LiveSender / LiveStream
// =========================================================

/// 适配器持有的推送句柄，退订后发送直接丢弃
pub struct LiveSender<T> {
    tx: UnboundedSender<T>,
}

impl<T> Clone for LiveSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> LiveSender<T> {
    /// 推送一项，返回是否仍有接收方
    pub fn send(&self, item: T) -> bool {
        self.tx.unbounded_send(item).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// 结束流：已缓冲的项仍会被消费
    pub fn close(&self) {
        self.tx.close_channel();
    }
}

pub struct LiveStream<T> {
    rx: UnboundedReceiver<T>,
    teardown: Teardown,
}

/// 创建一对推送句柄与实时流；流的守卫默认只负责关闭通道
pub fn live_channel<T: 'static>() -> (LiveSender<T>, LiveStream<T>) {
    let (tx, rx) = mpsc::unbounded();
    let closer = tx.clone();
    let stream = LiveStream {
        rx,
        teardown: Teardown::new(move || closer.close_channel()),
    };
    (LiveSender { tx }, stream)
}

impl<T> LiveStream<T> {
    /// 追加后端退订函数，在通道关闭之后执行
    pub fn with_teardown(self, unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            rx: self.rx,
            teardown: self.teardown.then(unsubscribe),
        }
    }

    /// 拆分为接收端与守卫：所有者可以同步退订，消费任务随后自然结束
    pub fn into_parts(self) -> (UnboundedReceiver<T>, Teardown) {
        (self.rx, self.teardown)
    }
}

impl<T> Stream for LiveStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

// =========================================================
// Epoch
// =========================================================

/// 单调递增的代数计数器，用于丢弃过期的异步结果
#[derive(Clone, Debug, Default)]
pub struct Epoch(Rc<Cell<u64>>);

impl Epoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 进入新的一代并返回其票据
    pub fn advance(&self) -> u64 {
        let next = self.0.get().wrapping_add(1);
        self.0.set(next);
        next
    }

    pub fn current(&self) -> u64 {
        self.0.get()
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.0.get() == ticket
    }
}
