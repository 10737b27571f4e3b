//! 栈与数组池的配置结构。
//!
//! # 设计要点（How）
//! - 采用 `const fn new()` + `with_*` 构建器风格，与 `TcpSocketConfig` 等配置保持一致；
//! - 启用 `serde` Feature 后，结构可直接嵌入宿主配置文件，缺省字段回落到 [`Default`]。

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 栈在首次扩容时向池请求的最小长度。
///
/// 与 [`SharedArrayPool`](crate::SharedArrayPool) 最小桶长度一致，首次租借不会被池再向上取整。
pub const DEFAULT_MIN_GROWTH_LENGTH: usize = 16;

/// 前置条件检查的严格程度。
///
/// # 契约说明（What）
/// - `Enforce`：在所有构建配置下执行显式检查，违例时记录 `tracing::error!` 并 panic，
///   panic 文本来自 [`ContractViolation`](crate::ContractViolation)；
/// - `Trust`：信任调用方满足前置条件，跳过基于逻辑长度的检查，仅保留底层存储自身的边界检查。
///   此时读取 `len..capacity` 区间会得到陈旧值，超出容量的访问仍会 panic，不会产生内存不安全。
///
/// # 风险提示（Trade-offs）
/// - `Trust` 只省去少量比较指令，却让缺陷以“读到旧数据”的形式潜伏；仅在基准已证明检查成本
///   不可接受的路径上使用。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ContractMode {
    #[default]
    Enforce,
    Trust,
}

impl ContractMode {
    /// 是否执行显式前置条件检查。
    pub const fn is_enforced(self) -> bool {
        matches!(self, ContractMode::Enforce)
    }
}

/// [`PooledStack`](crate::PooledStack) 的行为配置。
///
/// - `contract`：前置条件检查策略，默认 [`ContractMode::Enforce`]；
/// - `min_growth_length`：扩容请求的下限。扩容请求为
///   `max(2 * len, len + additional, min_growth_length)`，因此即便下限配置为 0，
///   从零容量开始的扩容也总会请求到至少能容纳新元素的长度。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StackConfig {
    contract: ContractMode,
    min_growth_length: usize,
}

impl StackConfig {
    /// 默认配置：`Enforce` 与 [`DEFAULT_MIN_GROWTH_LENGTH`]。
    pub const fn new() -> Self {
        Self {
            contract: ContractMode::Enforce,
            min_growth_length: DEFAULT_MIN_GROWTH_LENGTH,
        }
    }

    pub const fn with_contract(mut self, contract: ContractMode) -> Self {
        self.contract = contract;
        self
    }

    pub const fn with_min_growth_length(mut self, min_growth_length: usize) -> Self {
        self.min_growth_length = min_growth_length;
        self
    }

    pub const fn contract(&self) -> ContractMode {
        self.contract
    }

    pub const fn min_growth_length(&self) -> usize {
        self.min_growth_length
    }

    /// 计算一次扩容应向池请求的最小长度。
    pub(crate) fn growth_request(&self, len: usize, additional: usize) -> usize {
        len.saturating_mul(2)
            .max(len.saturating_add(additional))
            .max(self.min_growth_length)
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 池中单个数组的默认长度上限（元素个数）。
pub const DEFAULT_MAX_ARRAY_LENGTH: usize = 1 << 20;
/// 每个尺寸桶默认最多保留的数组数量。
pub const DEFAULT_MAX_ARRAYS_PER_BUCKET: usize = 32;

/// [`SharedArrayPool`](crate::SharedArrayPool) 的容量配置。
///
/// # 契约说明（What）
/// - `max_array_length`：可被池化的最大数组长度，构造池时向上取整到 2 的幂并限制在
///   `[16, 1 << 30]`；超过该长度的请求按精确长度分配，归还时直接丢弃；
/// - `max_arrays_per_bucket`：每个尺寸桶的保留上限，桶满时归还的数组被丢弃；
/// - `clear_on_release`：归还时是否以 `T::default()` 覆盖内容，避免旧数据被下一位租借者观察到。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArrayPoolConfig {
    max_array_length: usize,
    max_arrays_per_bucket: usize,
    clear_on_release: bool,
}

impl ArrayPoolConfig {
    pub const fn new() -> Self {
        Self {
            max_array_length: DEFAULT_MAX_ARRAY_LENGTH,
            max_arrays_per_bucket: DEFAULT_MAX_ARRAYS_PER_BUCKET,
            clear_on_release: false,
        }
    }

    pub const fn with_max_array_length(mut self, max_array_length: usize) -> Self {
        self.max_array_length = max_array_length;
        self
    }

    pub const fn with_max_arrays_per_bucket(mut self, max_arrays_per_bucket: usize) -> Self {
        self.max_arrays_per_bucket = max_arrays_per_bucket;
        self
    }

    pub const fn with_clear_on_release(mut self, clear_on_release: bool) -> Self {
        self.clear_on_release = clear_on_release;
        self
    }

    pub const fn max_array_length(&self) -> usize {
        self.max_array_length
    }

    pub const fn max_arrays_per_bucket(&self) -> usize {
        self.max_arrays_per_bucket
    }

    pub const fn clear_on_release(&self) -> bool {
        self.clear_on_release
    }
}

impl Default for ArrayPoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_request_doubles_and_respects_floor() {
        let config = StackConfig::new();
        assert_eq!(config.growth_request(0, 1), DEFAULT_MIN_GROWTH_LENGTH);
        assert_eq!(config.growth_request(4, 1), DEFAULT_MIN_GROWTH_LENGTH);
        assert_eq!(config.growth_request(32, 1), 64);
        assert_eq!(config.growth_request(32, 100), 132);
    }

    #[test]
    fn zero_floor_still_requests_room_for_new_items() {
        let config = StackConfig::new().with_min_growth_length(0);
        assert_eq!(config.growth_request(0, 1), 1);
        assert_eq!(config.growth_request(0, 5), 5);
        assert_eq!(config.growth_request(3, 1), 6);
    }

    #[test]
    fn growth_request_saturates() {
        let config = StackConfig::new();
        assert_eq!(config.growth_request(usize::MAX, 1), usize::MAX);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_config_falls_back_to_defaults() {
        let stack: StackConfig =
            serde_json::from_str(r#"{"contract":"trust"}"#).expect("解析栈配置");
        assert_eq!(stack.contract(), ContractMode::Trust);
        assert_eq!(stack.min_growth_length(), DEFAULT_MIN_GROWTH_LENGTH);

        let pool: ArrayPoolConfig =
            serde_json::from_str(r#"{"clear_on_release":true}"#).expect("解析池配置");
        assert!(pool.clear_on_release());
        assert_eq!(pool.max_array_length(), DEFAULT_MAX_ARRAY_LENGTH);
    }

    #[test]
    fn defaults_are_enforcing() {
        assert!(StackConfig::default().contract().is_enforced());
        assert!(!ContractMode::Trust.is_enforced());
        assert_eq!(
            ArrayPoolConfig::default().max_arrays_per_bucket(),
            DEFAULT_MAX_ARRAYS_PER_BUCKET
        );
    }
}
