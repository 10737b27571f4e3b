//! 测试桩：记录每一次租借与归还的 [`ArrayPool`] 实现。
//!
//! # 设计背景（Why）
//! - 栈的正确性很大程度上体现在它与池的交互序列上：扩容几次、归还几次、是否重复归还、
//!   是否误把调用方缓冲交给池。用真实池只能看到聚合统计，无法还原顺序；
//! - 集中维护该桩，集成测试、属性测试与基准可以共用同一套观察口径。
//!
//! # 使用方式（How）
//! - `RecordingPool::new()` 精确按请求长度分配；`with_grant` 可模拟向上取整或租借不足的池；
//! - 断言前通过 [`events`](RecordingPool::events) 读取事件序列，或用 `rents`/`releases` 计数。

use alloc::{boxed::Box, vec::Vec};

use spin::Mutex;

use crate::pool::ArrayPool;

/// 池交互事件。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolEvent {
    /// 一次租借：`requested` 为调用方请求的最小长度，`granted` 为实际返回长度。
    Rent { requested: usize, granted: usize },
    /// 一次归还：`length` 为归还数组的长度。
    Release { length: usize },
}

/// 记录交互序列的池桩。
///
/// - 每次租借都新分配 `T::default()` 填充的数组，不复用，便于区分每一块租约；
/// - `grant` 把请求长度映射为实际分配长度，默认恒等。
pub struct RecordingPool<T> {
    events: Mutex<Vec<PoolEvent>>,
    grant: fn(usize) -> usize,
    _marker: core::marker::PhantomData<fn() -> T>,
}

impl<T> RecordingPool<T> {
    /// 按请求长度精确分配。
    pub fn new() -> Self {
        Self::with_grant(|requested| requested)
    }

    /// 以自定义映射决定实际分配长度。
    pub fn with_grant(grant: fn(usize) -> usize) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            grant,
            _marker: core::marker::PhantomData,
        }
    }

    /// 读取当前记录的事件副本。
    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.lock().clone()
    }

    /// 清空并返回事件，便于分阶段断言。
    pub fn take_events(&self) -> Vec<PoolEvent> {
        core::mem::take(&mut *self.events.lock())
    }

    pub fn rents(&self) -> usize {
        self.count(|event| matches!(event, PoolEvent::Rent { .. }))
    }

    pub fn releases(&self) -> usize {
        self.count(|event| matches!(event, PoolEvent::Release { .. }))
    }

    /// 已租出但尚未归还的数组数量。
    pub fn outstanding(&self) -> usize {
        self.rents() - self.releases()
    }

    fn count(&self, predicate: impl Fn(&PoolEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|event| predicate(event)).count()
    }
}

impl<T> Default for RecordingPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> ArrayPool<T> for RecordingPool<T> {
    fn rent(&self, minimum_length: usize) -> Box<[T]> {
        let granted = (self.grant)(minimum_length);
        self.events.lock().push(PoolEvent::Rent {
            requested: minimum_length,
            granted,
        });
        core::iter::repeat_with(T::default).take(granted).collect()
    }

    fn release(&self, buffer: Box<[T]>) {
        self.events.lock().push(PoolEvent::Release {
            length: buffer.len(),
        });
    }
}
