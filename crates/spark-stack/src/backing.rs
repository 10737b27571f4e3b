use alloc::boxed::Box;
use core::mem;

/// 栈的底层存储：一块连续缓冲加上“它从哪里来”的标签。
///
/// # 状态划分（What）
/// - `Caller`：调用方提供的初始缓冲，栈只借用，永远不会交给池；
/// - `Rented`：从池租借的数组，本变体本身就是唯一的所有权槽位，替换或释放时必须归还；
/// - `Disposed`：已释放，容量为 0，后续写入会被识别为释放后使用。
///
/// 三种状态的读写路径完全一致，标签只决定释放时是否需要归还。
pub(crate) enum Backing<'a, T> {
    Caller(&'a mut [T]),
    Rented(Box<[T]>),
    Disposed,
}

impl<'a, T> Backing<'a, T> {
    pub(crate) fn capacity(&self) -> usize {
        self.as_slice().len()
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        match self {
            Backing::Caller(slice) => slice,
            Backing::Rented(buffer) => buffer,
            Backing::Disposed => &[],
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            Backing::Caller(slice) => slice,
            Backing::Rented(buffer) => buffer,
            Backing::Disposed => Default::default(),
        }
    }

    pub(crate) fn is_rented(&self) -> bool {
        matches!(self, Backing::Rented(_))
    }

    pub(crate) fn is_disposed(&self) -> bool {
        matches!(self, Backing::Disposed)
    }

    /// 采用新租借的数组，返回被替换下来、需要归还池的旧数组。
    ///
    /// 调用方缓冲被替换时只解除借用，返回 `None`。
    pub(crate) fn adopt(&mut self, rented: Box<[T]>) -> Option<Box<[T]>> {
        match mem::replace(self, Backing::Rented(rented)) {
            Backing::Rented(previous) => Some(previous),
            Backing::Caller(_) | Backing::Disposed => None,
        }
    }

    /// 进入 `Disposed`，交出仍持有的租借数组。
    pub(crate) fn dispose(&mut self) -> Option<Box<[T]>> {
        match mem::replace(self, Backing::Disposed) {
            Backing::Rented(buffer) => Some(buffer),
            Backing::Caller(_) | Backing::Disposed => None,
        }
    }

    pub(crate) fn origin(&self) -> &'static str {
        match self {
            Backing::Caller(_) => "caller",
            Backing::Rented(_) => "rented",
            Backing::Disposed => "disposed",
        }
    }
}
