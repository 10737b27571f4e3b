use alloc::{boxed::Box, sync::Arc, vec::Vec};

use crate::{
    config::ArrayPoolConfig,
    sync::{AtomicU64, Mutex, Ordering},
};

/// `ArrayPool` 描述可复用连续存储的租借/归还能力。
///
/// # 设计初衷（Why）
/// - [`PooledStack`](crate::PooledStack) 只在初始缓冲溢出时才需要堆存储，且扩容频率低、
///   释放时机明确，适合从共享池租借而非每次向全局分配器申请；
/// - 以 `Box<[T]>` 作为租约载体：归还即移动所有权，"重复归还"与"归还后继续访问"
///   在安全代码中无法表达，不再依赖调用方自律。
///
/// # 契约定义（What）
/// - `rent(minimum_length)`：返回长度不小于 `minimum_length` 的数组，内容未指定（可能是上一位
///   租借者留下的旧值），调用方应视其为未初始化；资源耗尽时由全局分配器终止进程，不返回错误；
/// - `release(buffer)`：把先前租借的数组交还池；此后归还方不得再访问它。
///   传入并非本池租出的数组属于契约违例，实现可以选择丢弃。
/// - **线程安全**：同一个池会被多个独立的栈实例并发使用，实现必须满足 `Send + Sync`。
pub trait ArrayPool<T>: Send + Sync {
    /// 租借长度至少为 `minimum_length` 的数组。
    fn rent(&self, minimum_length: usize) -> Box<[T]>;

    /// 归还数组。
    fn release(&self, buffer: Box<[T]>);
}

impl<T, P> ArrayPool<T> for &P
where
    P: ArrayPool<T> + ?Sized,
{
    fn rent(&self, minimum_length: usize) -> Box<[T]> {
        (**self).rent(minimum_length)
    }

    fn release(&self, buffer: Box<[T]>) {
        (**self).release(buffer);
    }
}

impl<T, P> ArrayPool<T> for Arc<P>
where
    P: ArrayPool<T> + ?Sized,
{
    fn rent(&self, minimum_length: usize) -> Box<[T]> {
        (**self).rent(minimum_length)
    }

    fn release(&self, buffer: Box<[T]>) {
        (**self).release(buffer);
    }
}

/// 最小桶长度；长度为 0 的请求同样落在该桶。
pub const MIN_BUCKET_LENGTH: usize = 16;
const MAX_POOLED_LENGTH: usize = 1 << 30;

/// `SharedArrayPool` 是按 2 的幂分桶的线程安全数组池，
/// 专注在**高并发、低延迟**场景下复用数组，以减少堆分配次数。
///
/// # 模块角色（Why）
/// - 作为 [`ArrayPool`] 的默认实现，为多个栈实例提供统一的溢出存储来源；
/// - 栈在扩容与释放时以所有权移动的方式租借/归还，池只负责尺寸匹配与保留策略。
///
/// # 核心机制（How）
/// - 桶 `i` 存放长度恰为 `16 << i` 的数组，租借时请求被向上取整到桶长度；
/// - 每个桶是一把 `spin::Mutex` 保护的自由链表，命中时弹出复用，未命中时以 `T::default()`
///   新建整桶长度的数组；
/// - 超过 `max_array_length` 的请求按精确长度分配，归还时丢弃，避免大块内存长期驻留；
/// - `PoolMetrics` 通过原子计数跟踪租借、归还、未命中、丢弃等指标，支撑 [`stats`](Self::stats) 快照。
///
/// # 契约说明（What）
/// - **线程安全**：所有共享状态均通过自旋锁与原子计数保护；
/// - **后置条件**：`rent(n)` 返回的数组长度 `>= n`，`n <= max_array_length` 时恰为桶长度；
/// - 归还长度不是任何桶长度的数组视为外来数组，记录告警后丢弃。
///
/// # 设计权衡（Trade-offs）
/// - 使用自旋锁而非 `std::sync::Mutex`，以便在 `no_std` 环境中仍能工作；临界区只做一次
///   `Vec::push`/`Vec::pop`，自旋代价可以忽略；
/// - 按桶取整会浪费最多一半容量，换取 O(1) 的桶定位与更高的复用命中率。
pub struct SharedArrayPool<T> {
    inner: Arc<PoolInner<T>>,
}

impl<T> Clone for SharedArrayPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for SharedArrayPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> SharedArrayPool<T> {
    /// 使用默认配置创建池。
    pub fn new() -> Self {
        Self::with_config(ArrayPoolConfig::default())
    }

    /// 使用给定配置创建池；桶在此时一次性建好，之后不再调整。
    pub fn with_config(config: ArrayPoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner::new(config)),
        }
    }
}

impl<T> SharedArrayPool<T> {
    /// 当前可被池化的最大数组长度（已取整）。
    pub fn max_array_length(&self) -> usize {
        self.inner.max_array_length
    }

    /// 丢弃所有保留的数组，返回释放的元素个数。
    pub fn trim(&self) -> usize {
        self.inner.trim()
    }

    /// 读取统计快照。
    pub fn stats(&self) -> ArrayPoolStats {
        self.inner.snapshot()
    }
}

impl<T> ArrayPool<T> for SharedArrayPool<T>
where
    T: Default + Send,
{
    fn rent(&self, minimum_length: usize) -> Box<[T]> {
        self.inner.rent(minimum_length)
    }

    fn release(&self, buffer: Box<[T]>) {
        self.inner.release(buffer);
    }
}

impl<T> core::fmt::Debug for SharedArrayPool<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedArrayPool")
            .field("max_array_length", &self.inner.max_array_length)
            .field("buckets", &self.inner.buckets.len())
            .field("stats", &self.stats())
            .finish()
    }
}

/// 池的统计快照。
///
/// - `rents` / `releases`：累计租借与归还次数（归还包含被丢弃的数组）；
/// - `misses`：租借时未命中自由链表、转而新建数组的次数；
/// - `retained_arrays` / `retained_elements`：当前保留在桶中的数组个数与元素总数；
/// - `discarded`：因桶已满或长度超出池化上限而被丢弃的归还次数；
/// - `foreign`：归还长度不匹配任何桶、被判定为外来数组的次数。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArrayPoolStats {
    pub rents: u64,
    pub releases: u64,
    pub misses: u64,
    pub retained_arrays: usize,
    pub retained_elements: usize,
    pub discarded: u64,
    pub foreign: u64,
}

struct PoolInner<T> {
    buckets: Vec<Bucket<T>>,
    max_array_length: usize,
    max_arrays_per_bucket: usize,
    clear_on_release: bool,
    metrics: PoolMetrics,
}

struct Bucket<T> {
    length: usize,
    free_list: Mutex<Vec<Box<[T]>>>,
}

impl<T> PoolInner<T> {
    fn new(config: ArrayPoolConfig) -> Self {
        let max_array_length = config
            .max_array_length()
            .clamp(MIN_BUCKET_LENGTH, MAX_POOLED_LENGTH)
            .next_power_of_two();
        let bucket_count = bucket_index(max_array_length) + 1;
        let buckets = (0..bucket_count)
            .map(|index| Bucket {
                length: bucket_length(index),
                free_list: Mutex::new(Vec::new()),
            })
            .collect();
        Self {
            buckets,
            max_array_length,
            max_arrays_per_bucket: config.max_arrays_per_bucket(),
            clear_on_release: config.clear_on_release(),
            metrics: PoolMetrics::new(),
        }
    }

    fn trim(&self) -> usize {
        let mut freed = 0;
        for bucket in &self.buckets {
            let drained: Vec<Box<[T]>> = core::mem::take(&mut *bucket.free_list.lock());
            freed += drained.len() * bucket.length;
        }
        tracing::debug!(freed, "array pool trimmed");
        freed
    }

    fn snapshot(&self) -> ArrayPoolStats {
        let mut retained_arrays = 0;
        let mut retained_elements = 0;
        for bucket in &self.buckets {
            let retained = bucket.free_list.lock().len();
            retained_arrays += retained;
            retained_elements += retained * bucket.length;
        }
        ArrayPoolStats {
            rents: self.metrics.rents.load(Ordering::Relaxed),
            releases: self.metrics.releases.load(Ordering::Relaxed),
            misses: self.metrics.misses.load(Ordering::Relaxed),
            retained_arrays,
            retained_elements,
            discarded: self.metrics.discarded.load(Ordering::Relaxed),
            foreign: self.metrics.foreign.load(Ordering::Relaxed),
        }
    }
}

impl<T: Default> PoolInner<T> {
    /// 从对应桶的自由链表或堆上获取一个满足长度的数组。
    fn rent(&self, minimum_length: usize) -> Box<[T]> {
        self.metrics.rents.fetch_add(1, Ordering::Relaxed);
        if minimum_length > self.max_array_length {
            self.metrics.misses.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(minimum_length, "array pool rent above pooled limit");
            return allocate(minimum_length);
        }

        let bucket = &self.buckets[bucket_index(minimum_length)];
        let reused = bucket.free_list.lock().pop();
        match reused {
            Some(buffer) => {
                tracing::trace!(minimum_length, length = bucket.length, "array pool hit");
                buffer
            }
            None => {
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(minimum_length, length = bucket.length, "array pool miss");
                allocate(bucket.length)
            }
        }
    }

    fn release(&self, mut buffer: Box<[T]>) {
        self.metrics.releases.fetch_add(1, Ordering::Relaxed);
        let length = buffer.len();
        if length > self.max_array_length {
            self.metrics.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let index = bucket_index(length);
        let bucket = &self.buckets[index];
        if bucket.length != length {
            self.metrics.foreign.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(length, "array pool released a buffer it did not rent");
            return;
        }

        if self.clear_on_release {
            buffer.fill_with(T::default);
        }

        let mut free_list = bucket.free_list.lock();
        if free_list.len() >= self.max_arrays_per_bucket {
            drop(free_list);
            self.metrics.discarded.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(length, "array pool bucket full, buffer discarded");
            return;
        }
        free_list.push(buffer);
    }
}

fn allocate<T: Default>(length: usize) -> Box<[T]> {
    core::iter::repeat_with(T::default).take(length).collect()
}

/// 长度 `length` 所属桶的下标：`0..=16` 落在 0 号桶，之后每翻一倍加一。
fn bucket_index(length: usize) -> usize {
    let rounded = length.max(MIN_BUCKET_LENGTH).next_power_of_two();
    (rounded.trailing_zeros() - MIN_BUCKET_LENGTH.trailing_zeros()) as usize
}

fn bucket_length(index: usize) -> usize {
    MIN_BUCKET_LENGTH << index
}

struct PoolMetrics {
    rents: AtomicU64,
    releases: AtomicU64,
    misses: AtomicU64,
    discarded: AtomicU64,
    foreign: AtomicU64,
}

impl PoolMetrics {
    fn new() -> Self {
        Self {
            rents: AtomicU64::new(0),
            releases: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            foreign: AtomicU64::new(0),
        }
    }
}
