use core::{
    fmt, mem,
    ops::{Index, IndexMut},
};

use crate::{
    backing::Backing,
    config::StackConfig,
    error::{ContractViolation, violated},
    pool::ArrayPool,
};

/// `PooledStack` 是先用调用方缓冲、溢出后向 [`ArrayPool`] 租借数组的后进先出栈。
///
/// # 设计动机（Why）
/// - 递归下降遍历、路径分段处理等热路径里，绝大多数调用只需几个元素，少数需要很多；
///   定长数组有溢出风险，而每次都 `Vec::new` 又会在每次调用上付出分配代价；
/// - 本类型先在调用方提供的栈上数组中工作，只有真正溢出时才向池租借，并在作用域结束时
///   把租借的数组归还，把分配压到“偶发且可复用”。
///
/// # 架构关系（How）
/// - `backing` 是带来源标签的视图：调用方缓冲、租借数组或已释放三者之一，读写路径一致；
/// - `count` 记录逻辑长度，与容量分离；元素以 `T::default()` 作为空槽占位，
///   弹出与扩容都通过 [`mem::take`] 把值移出，原槽位留下默认值，因此只要求 `T: Default`，
///   `String`、`Option<Box<_>>` 这类拥有资源的元素同样适用；
/// - 扩容是唯一的分配点：按 `max(2 * len, len + additional, min_growth_length)` 租借，
///   把存活元素移入新数组后再归还旧的租借数组，最后采用新数组；
/// - [`dispose`](Self::dispose) 与 `Drop` 共享同一释放路径，作用域以任何方式退出
///   （正常返回、提前返回、panic 展开）都会归还租借数组，且至多归还一次。
///
/// # 契约说明（What）
/// - **前置条件**：`pop`/`peek`/`peek_mut` 要求栈非空；索引要求 `< len`；
///   违例按 [`StackConfig::contract`] 处理，默认记录日志后 panic；
/// - **后置条件**：任何操作完成后 `len() <= capacity()`；至多持有一个租借数组；
///   调用方缓冲永远不会交给池；归还池的数组中不残留仍存活的元素；
/// - **单一所有者**：所有修改操作都要求 `&mut self`，实例不提供内部同步。
///
/// # 风险与取舍（Trade-offs）
/// - 栈从不缩容，`clear` 后重新填充可以免去一次租借/归还往返，但峰值容量会一直保留到释放；
/// - `clear` 与 `dispose` 需要逐个重置存活槽位，成本与 `len` 成正比，与 `Vec::clear` 一致；
/// - [`as_slice`](Self::as_slice) 借用的是活动存储，借用规则保证视图无法跨越下一次修改。
pub struct PooledStack<'a, T, P>
where
    T: Default,
    P: ArrayPool<T>,
{
    backing: Backing<'a, T>,
    count: usize,
    pool: P,
    config: StackConfig,
}

impl<'a, T, P> PooledStack<'a, T, P>
where
    T: Default,
    P: ArrayPool<T>,
{
    /// 以调用方缓冲（可为空）与池句柄创建栈；构造时不与池交互。
    pub fn new(initial: &'a mut [T], pool: P) -> Self {
        Self::with_config(initial, pool, StackConfig::default())
    }

    pub fn with_config(initial: &'a mut [T], pool: P, config: StackConfig) -> Self {
        Self {
            backing: Backing::Caller(initial),
            count: 0,
            pool,
            config,
        }
    }

    /// 逻辑长度。
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// 当前底层存储的长度；释放后为 0。
    pub fn capacity(&self) -> usize {
        self.backing.capacity()
    }

    /// 当前是否持有从池租借的数组。
    pub fn is_rented(&self) -> bool {
        self.backing.is_rented()
    }

    pub fn is_disposed(&self) -> bool {
        self.backing.is_disposed()
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// 压入元素；容量已满时先扩容。
    pub fn push(&mut self, item: T) {
        let count = self.count;
        if count == self.backing.capacity() {
            self.grow(1, "push");
        }
        self.backing.as_mut_slice()[count] = item;
        self.count = count + 1;
    }

    /// 弹出栈顶元素。
    ///
    /// # Panics
    /// 栈为空时违反前置条件。
    pub fn pop(&mut self) -> T {
        if self.config.contract().is_enforced() && self.count == 0 {
            violated(ContractViolation::EmptyStack { op: "pop" });
        }
        let top = self.count.wrapping_sub(1);
        let item = mem::take(&mut self.backing.as_mut_slice()[top]);
        self.count = top;
        item
    }

    /// 非失败版本的 [`pop`](Self::pop)。
    pub fn try_pop(&mut self) -> Option<T> {
        let top = self.count.checked_sub(1)?;
        let item = mem::take(&mut self.backing.as_mut_slice()[top]);
        self.count = top;
        Some(item)
    }

    /// 只丢弃栈顶、不取回值；栈为空时返回 `false`。
    pub fn try_discard_top(&mut self) -> bool {
        match self.count.checked_sub(1) {
            Some(top) => {
                drop(mem::take(&mut self.backing.as_mut_slice()[top]));
                self.count = top;
                true
            }
            None => false,
        }
    }

    /// 借用栈顶元素但不弹出。
    ///
    /// # Panics
    /// 栈为空时违反前置条件。
    pub fn peek(&self) -> &T {
        if self.config.contract().is_enforced() && self.count == 0 {
            violated(ContractViolation::EmptyStack { op: "peek" });
        }
        &self.backing.as_slice()[self.count.wrapping_sub(1)]
    }

    pub fn try_peek(&self) -> Option<&T> {
        let top = self.count.checked_sub(1)?;
        Some(&self.backing.as_slice()[top])
    }

    /// 原地修改栈顶元素。
    ///
    /// # Panics
    /// 栈为空时违反前置条件。
    pub fn peek_mut(&mut self) -> &mut T {
        if self.config.contract().is_enforced() && self.count == 0 {
            violated(ContractViolation::EmptyStack { op: "peek_mut" });
        }
        let top = self.count.wrapping_sub(1);
        &mut self.backing.as_mut_slice()[top]
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// 逻辑清空并丢弃存活元素；保留底层存储以便复用。
    pub fn clear(&mut self) {
        self.as_mut_slice().fill_with(T::default);
        self.count = 0;
    }

    /// 按压入顺序（栈底在前）暴露当前内容。
    pub fn as_slice(&self) -> &[T] {
        &self.backing.as_slice()[..self.count]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let count = self.count;
        &mut self.backing.as_mut_slice()[..count]
    }

    /// 丢弃存活元素，归还持有的租借数组并进入容量为 0 的已释放状态。
    ///
    /// 可重复调用，后续调用不会再触发归还。`Drop` 会自动调用本方法。
    pub fn dispose(&mut self) {
        self.clear();
        if let Some(buffer) = self.backing.dispose() {
            tracing::debug!(capacity = buffer.len(), "pooled stack released rented buffer");
            self.pool.release(buffer);
        }
    }

    /// 扩容到至少能再容纳 `additional` 个元素。
    ///
    /// 这是唯一的分配点：租借新数组、移入存活元素、归还旧的租借数组（调用方缓冲只解除借用），
    /// 最后采用新数组。归还发生在移动之后，旧数组不会在被释放后再被读取。
    #[cold]
    fn grow(&mut self, additional: usize, op: &'static str) {
        let enforced = self.config.contract().is_enforced();
        if enforced && self.backing.is_disposed() {
            violated(ContractViolation::UseAfterDispose { op });
        }

        let count = self.count;
        let needed = count.saturating_add(additional);
        debug_assert!(needed > self.backing.capacity());
        let requested = self.config.growth_request(count, additional);
        let mut rented = self.pool.rent(requested);
        if enforced && rented.len() < needed {
            let granted = rented.len();
            self.pool.release(rented);
            violated(ContractViolation::ShortRental {
                requested: needed,
                granted,
            });
        }

        let from = self.backing.capacity();
        for (slot, live) in rented[..count]
            .iter_mut()
            .zip(&mut self.backing.as_mut_slice()[..count])
        {
            *slot = mem::take(live);
        }
        tracing::trace!(
            len = count,
            from,
            to = rented.len(),
            requested,
            "pooled stack grew"
        );
        if let Some(previous) = self.backing.adopt(rented) {
            self.pool.release(previous);
        }
    }
}

impl<T, P> PooledStack<'_, T, P>
where
    T: Clone + Default,
    P: ArrayPool<T>,
{
    /// 按顺序压入切片中的全部元素（逐个克隆），单次调用至多扩容一次。
    pub fn extend_from_slice(&mut self, items: &[T]) {
        if items.is_empty() {
            return;
        }
        let count = self.count;
        let end = count.saturating_add(items.len());
        if end > self.backing.capacity() {
            self.grow(items.len(), "extend_from_slice");
        }
        self.backing.as_mut_slice()[count..end].clone_from_slice(items);
        self.count = end;
    }
}

impl<T, P> Drop for PooledStack<'_, T, P>
where
    T: Default,
    P: ArrayPool<T>,
{
    fn drop(&mut self) {
        self.dispose();
    }
}


impl<T, P> Index<usize> for PooledStack<'_, T, P>
where
    T: Default,
    P: ArrayPool<T>,
{
    type Output = T;

    fn index(&self, index: usize) -> &T {
        if self.config.contract().is_enforced() {
            if index >= self.count {
                violated(ContractViolation::IndexOutOfRange {
                    index,
                    len: self.count,
                });
            }
            &self.as_slice()[index]
        } else {
            &self.backing.as_slice()[index]
        }
    }
}

impl<T, P> IndexMut<usize> for PooledStack<'_, T, P>
where
    T: Default,
    P: ArrayPool<T>,
{
    fn index_mut(&mut self, index: usize) -> &mut T {
        if self.config.contract().is_enforced() {
            if index >= self.count {
                violated(ContractViolation::IndexOutOfRange {
                    index,
                    len: self.count,
                });
            }
            &mut self.as_mut_slice()[index]
        } else {
            &mut self.backing.as_mut_slice()[index]
        }
    }
}

impl<T, P> Extend<T> for PooledStack<'_, T, P>
where
    T: Default,
    P: ArrayPool<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T, P> fmt::Debug for PooledStack<'_, T, P>
where
    T: Default + fmt::Debug,
    P: ArrayPool<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledStack")
            .field("len", &self.count)
            .field("capacity", &self.capacity())
            .field("origin", &self.backing.origin())
            .field("items", &self.as_slice())
            .finish()
    }
}
