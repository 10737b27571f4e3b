#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

//! `spark-stack` 提供先使用调用方缓冲、溢出后向数组池租借存储的后进先出栈。
//!
//! # 模块定位（Why）
//! - 递归下降解析、路径/URI 分段处理等热路径中，多数调用只需要少量元素，少数需要很多；
//!   定长数组会溢出，而总是堆分配的 `Vec` 会在每次调用上付出分配成本；
//! - [`PooledStack`] 先在调用方提供的（通常位于栈帧上的）缓冲里工作，只有溢出时才从
//!   [`ArrayPool`] 租借数组，并保证在作用域结束时恰好归还一次。
//!
//! # 设计概要（How）
//! - `stack` 模块实现 [`PooledStack`]：逻辑长度与容量分离，扩容是唯一的分配点；
//! - `backing` 模块以带来源标签的视图表达“调用方缓冲 / 租借数组 / 已释放”三种状态，
//!   租借数组的所有权槽位就是枚举变体本身，替换与释放都通过移动完成；
//! - `pool` 模块定义 [`ArrayPool`] 能力接口，并提供按 2 的幂分桶的 [`SharedArrayPool`]；
//! - `config` 模块收敛 [`StackConfig`] 与 [`ArrayPoolConfig`]，其中 [`ContractMode`]
//!   决定前置条件检查的严格程度；
//! - `error` 模块以 [`ContractViolation`] 描述所有不可恢复的契约违例。
//!
//! # 示例
//! ```
//! use spark_stack::{PooledStack, SharedArrayPool};
//!
//! let pool = SharedArrayPool::<u32>::new();
//! let mut local = [0u32; 4];
//! let mut stack = PooledStack::new(&mut local, &pool);
//! for value in 1..=6 {
//!     stack.push(value);
//! }
//! assert!(stack.is_rented());
//! assert_eq!(stack.pop(), 6);
//! assert_eq!(stack.as_slice(), &[1, 2, 3, 4, 5]);
//! ```

extern crate alloc;

mod backing;
mod config;
mod error;
mod pool;
mod stack;
mod sync;

/// 测试桩命名空间，集中暴露记录池交互序列的 [`RecordingPool`](test_stubs::RecordingPool)，
/// 供集成测试、属性测试与基准复用。
pub mod test_stubs;

pub use config::{
    ArrayPoolConfig, ContractMode, DEFAULT_MAX_ARRAY_LENGTH, DEFAULT_MAX_ARRAYS_PER_BUCKET,
    DEFAULT_MIN_GROWTH_LENGTH, StackConfig,
};
pub use error::ContractViolation;
pub use pool::{ArrayPool, ArrayPoolStats, MIN_BUCKET_LENGTH, SharedArrayPool};
pub use stack::PooledStack;
