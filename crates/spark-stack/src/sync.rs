//! 同步原语的编译期切换点。
//!
//! - 常规构建使用 `spin::Mutex` 与 `core` 原子类型，保持 `no_std` 可用；
//! - `--cfg loom` 下替换为 `loom` 的模型化原语，使数组池的并发租借/归还可以被穷举调度验证。
//!
//! 两套实现对外暴露同一形状：`Mutex::new`/`Mutex::lock` 与 `AtomicU64`。

#[cfg(not(loom))]
pub(crate) use core::sync::atomic::{AtomicU64, Ordering};
#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicU64, Ordering};

#[cfg(not(loom))]
pub(crate) struct Mutex<T>(spin::Mutex<T>);

#[cfg(not(loom))]
impl<T> Mutex<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(spin::Mutex::new(value))
    }

    pub(crate) fn lock(&self) -> spin::MutexGuard<'_, T> {
        self.0.lock()
    }
}

#[cfg(loom)]
pub(crate) struct Mutex<T>(loom::sync::Mutex<T>);

#[cfg(loom)]
impl<T> Mutex<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(loom::sync::Mutex::new(value))
    }

    // 池内临界区不会 panic，中毒只可能来自测试线程自身的断言失败，直接沿用内部值。
    pub(crate) fn lock(&self) -> loom::sync::MutexGuard<'_, T> {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
