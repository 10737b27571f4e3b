//! `pool_contract` 集成测试：验证 `SharedArrayPool` 在真实调用路径下的契约执行情况。
//!
//! # 测试目标（Why）
//! - 保障分桶租借、归还复用、统计快照等核心流程能在 crate 公开 API 下正确协作；
//! - 通过外部 crate 视角模拟用户调用，避免依赖内部实现细节；
//! - 及时捕获桶尺寸、保留上限、外来数组处理等回归。
//!
//! # 结构安排（How）
//! - `rent_rounds_up_to_bucket_length`：请求长度向上取整到 2 的幂桶；
//! - `stats_track_rent_release_lifecycle`：检查统计字段随租借/归还演进；
//! - 其它测试覆盖桶满丢弃、超大请求、外来数组、清零归还与收缩等边界场景。

use std::{sync::Arc, thread};

use spark_stack::{ArrayPool, ArrayPoolConfig, MIN_BUCKET_LENGTH, SharedArrayPool};

#[test]
fn rent_rounds_up_to_bucket_length() {
    let pool = SharedArrayPool::<u8>::new();
    assert_eq!(pool.rent(0).len(), MIN_BUCKET_LENGTH);
    assert_eq!(pool.rent(1).len(), MIN_BUCKET_LENGTH);
    assert_eq!(pool.rent(16).len(), 16);
    assert_eq!(pool.rent(17).len(), 32);
    assert_eq!(pool.rent(1000).len(), 1024);
}

/// 通过多次租借 / 归还验证统计快照的生命周期演进。
///
/// # 核心关注点
/// - `misses`：首次租借必然未命中，归还后同桶租借应命中；
/// - `retained_arrays` / `retained_elements`：归还后进入自由链表，租借后离开。
#[test]
fn stats_track_rent_release_lifecycle() {
    let pool = SharedArrayPool::<u32>::new();
    let initial = pool.stats();
    assert_eq!(initial.rents, 0);
    assert_eq!(initial.retained_arrays, 0);

    let first = pool.rent(40);
    let during_first = pool.stats();
    assert_eq!(during_first.rents, 1);
    assert_eq!(during_first.misses, 1);

    pool.release(first);
    let after_first = pool.stats();
    assert_eq!(after_first.releases, 1);
    assert_eq!(after_first.retained_arrays, 1);
    assert_eq!(after_first.retained_elements, 64);

    let second = pool.rent(33);
    let during_second = pool.stats();
    assert_eq!(during_second.misses, 1, "同桶租借应复用自由链表");
    assert_eq!(during_second.retained_arrays, 0);
    pool.release(second);
}

/// 桶达到保留上限后，多余的归还被丢弃并计数。
#[test]
fn full_bucket_discards_extra_releases() {
    let pool = SharedArrayPool::<u8>::with_config(
        ArrayPoolConfig::new().with_max_arrays_per_bucket(2),
    );
    let buffers: Vec<_> = (0..3).map(|_| pool.rent(16)).collect();
    for buffer in buffers {
        pool.release(buffer);
    }
    let stats = pool.stats();
    assert_eq!(stats.retained_arrays, 2);
    assert_eq!(stats.discarded, 1);
    assert_eq!(stats.releases, 3);
}

/// 超过池化上限的请求按精确长度分配，归还时不保留。
#[test]
fn oversized_requests_bypass_buckets() {
    let pool = SharedArrayPool::<u8>::with_config(
        ArrayPoolConfig::new().with_max_array_length(64),
    );
    let large = pool.rent(100);
    assert_eq!(large.len(), 100);
    pool.release(large);
    let stats = pool.stats();
    assert_eq!(stats.retained_arrays, 0);
    assert_eq!(stats.discarded, 1);
}

/// 长度不匹配任何桶的数组被识别为外来数组并丢弃。
#[test]
fn foreign_buffer_is_not_retained() {
    let pool = SharedArrayPool::<u8>::new();
    pool.release(vec![0u8; 24].into_boxed_slice());
    let stats = pool.stats();
    assert_eq!(stats.foreign, 1);
    assert_eq!(stats.retained_arrays, 0);
}

/// 开启 `clear_on_release` 后，下一位租借者看不到旧数据。
#[test]
fn clear_on_release_scrubs_contents() {
    let pool = SharedArrayPool::<u32>::with_config(
        ArrayPoolConfig::new().with_clear_on_release(true),
    );
    let mut buffer = pool.rent(16);
    buffer.fill(0xDEAD);
    pool.release(buffer);
    let reused = pool.rent(16);
    assert!(reused.iter().all(|&value| value == 0));
}

/// 验证 `trim` 能够释放所有保留数组并刷新统计。
#[test]
fn trim_releases_retained_buffers() {
    let pool = SharedArrayPool::<u16>::new();
    let small = pool.rent(16);
    let large = pool.rent(100);
    pool.release(small);
    pool.release(large);
    assert_eq!(pool.trim(), 16 + 128);
    let stats = pool.stats();
    assert_eq!(stats.retained_arrays, 0);
    assert_eq!(stats.retained_elements, 0);
    assert_eq!(pool.trim(), 0);
}

/// 多线程并发租借/归还同一个池，统计总量保持一致。
#[test]
fn concurrent_rent_release_keeps_counts_consistent() {
    let pool = Arc::new(SharedArrayPool::<u64>::new());
    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for round in 0..100 {
                    let mut buffer = pool.rent(16 + (worker * round) % 200);
                    buffer[0] = round as u64;
                    pool.release(buffer);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("工作线程不应 panic");
    }
    let stats = pool.stats();
    assert_eq!(stats.rents, 400);
    assert_eq!(stats.releases, 400);
    assert!(stats.misses <= 400);
    assert_eq!(stats.foreign, 0);
}

/// `Arc` 句柄同样满足 `ArrayPool`，可直接交给栈持有。
#[test]
fn arc_handle_is_a_pool() {
    fn rent_through<P: ArrayPool<u8>>(pool: P) -> usize {
        let buffer = pool.rent(5);
        let len = buffer.len();
        pool.release(buffer);
        len
    }
    let pool = Arc::new(SharedArrayPool::<u8>::new());
    assert_eq!(rent_through(Arc::clone(&pool)), MIN_BUCKET_LENGTH);
    assert_eq!(pool.stats().retained_arrays, 1);
}
