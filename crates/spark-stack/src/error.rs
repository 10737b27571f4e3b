//! 契约违例的类型化描述与统一上报入口。
//!
//! # 模块定位（Why）
//! - `PooledStack` 不存在可恢复错误：空栈弹出、越界访问、池租借不足、释放后继续使用，
//!   都意味着调用方代码存在缺陷，应立即且响亮地暴露；
//! - 将违例建模为枚举而非零散的 `panic!` 字符串，便于测试断言、日志检索与文档对齐。
//!
//! # 上报策略（How）
//! - [`violated`] 先以 `tracing::error!` 记录结构化事件，再以违例的 `Display` 文本 panic；
//! - 函数标注 `#[cold]` 与 `#[track_caller]`，热路径保持紧凑，panic 位置指向调用方。

use thiserror::Error;

/// 栈或池的前置条件被破坏时产生的诊断。
///
/// # 契约说明（What）
/// - 所有变体均为**不可恢复**的编程错误，仅作为 panic 载荷与日志字段出现；
/// - `op` 字段记录触发违例的公开操作名，保持低基数，便于聚合统计。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// 在空栈上执行了要求非空的操作（`pop`/`peek`/`peek_mut`）。
    #[error("PooledStack::{op} 要求栈非空")]
    EmptyStack { op: &'static str },
    /// 索引超出逻辑长度。
    #[error("PooledStack 索引越界：index {index}，len {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// 数组池返回的缓冲短于扩容所需的最小长度。
    #[error("ArrayPool::rent 返回长度 {granted}，不足所需的 {requested}")]
    ShortRental { requested: usize, granted: usize },
    /// 栈已释放（dispose）后仍被写入。
    #[error("PooledStack::{op} 发生在 dispose 之后")]
    UseAfterDispose { op: &'static str },
}

/// 记录并抛出契约违例。
#[cold]
#[track_caller]
pub(crate) fn violated(violation: ContractViolation) -> ! {
    tracing::error!(violation = %violation, "pooled stack contract violated");
    panic!("{violation}");
}
