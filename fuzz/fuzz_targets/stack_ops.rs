#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spark_stack::{PooledStack, StackConfig, test_stubs::RecordingPool};

/// Fuzz 指令：描述一次栈操作序列。
///
/// - **Why**：扩容、清空、释放交错出现时最容易暴露“重复归还”“扩容丢元素”一类缺陷，
///   本结构让 Fuzzer 自由组合这些动作；
/// - **How**：初始缓冲长度与扩容下限由输入决定，操作序列逐条作用于栈与 `Vec` 影子模型；
/// - **What**：每一步视图必须与模型一致，任意时刻至多一个未归还租约，结束后全部归还。
#[derive(Debug, Arbitrary)]
struct StackCase {
    initial_len: u8,
    min_growth: u8,
    ops: Vec<StackOp>,
}

#[derive(Debug, Arbitrary)]
enum StackOp {
    Push(u16),
    Pop,
    Peek,
    Extend(Vec<u16>),
    Set { index: u8, value: u16 },
    Clear,
}

fuzz_target!(|case: StackCase| {
    let pool = RecordingPool::<u16>::new();
    let mut local = vec![0u16; usize::from(case.initial_len % 32)];
    let config = StackConfig::new().with_min_growth_length(usize::from(case.min_growth));
    let mut stack = PooledStack::with_config(&mut local, &pool, config);
    let mut model: Vec<u16> = Vec::new();

    for op in case.ops {
        match op {
            StackOp::Push(value) => {
                stack.push(value);
                model.push(value);
            }
            StackOp::Pop => assert_eq!(stack.try_pop(), model.pop()),
            StackOp::Peek => assert_eq!(stack.try_peek(), model.last()),
            StackOp::Extend(items) => {
                stack.extend_from_slice(&items);
                model.extend_from_slice(&items);
            }
            StackOp::Set { index, value } => {
                let index = usize::from(index);
                if let (Some(slot), Some(expected)) = (stack.get_mut(index), model.get_mut(index)) {
                    *slot = value;
                    *expected = value;
                }
            }
            StackOp::Clear => {
                stack.clear();
                model.clear();
            }
        }
        assert_eq!(stack.as_slice(), &model[..]);
        assert!(pool.outstanding() <= 1);
    }

    drop(stack);
    assert_eq!(pool.outstanding(), 0);
});
