//! 自旋锁封装
//!
//! 提供对数据的互斥访问的自旋锁类型。
//!
//! # 示例
//! ```ignore
//! let lock = SpinLock::new(0);
//! {
//!     let mut guard = lock.lock(); // 获取锁，禁用中断
//!     *guard += 1;
//! } // 离开作用域，释放锁并恢复中断状态
//! ```
//!
//! SpinLock 不可重入，且持锁期间中断被禁用，不应在临界区内执行可能阻塞的操作。

use crate::raw_spin_lock::RawSpinLock;

/// 提供对数据的互斥访问的自旋锁
pub type SpinLock<T> = lock_api::Mutex<RawSpinLock, T>;

/// SpinLock 的 RAII 保护器
pub type SpinLockGuard<'a, T> = lock_api::MutexGuard<'a, RawSpinLock, T>;
