//! VFS 协作方接口定义和注册
//!
//! 文件描述符层不解析路径，也不做真正的 I/O。这些工作通过本模块定义的
//! trait 交给 VFS 完成：os crate 实现 [`VfsOps`] 并在启动时注册。

use alloc::string::String;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicUsize, Ordering};
use uapi::fcntl::OpenFlags;

use crate::FsError;

/// VFS 打开得到的底层文件对象
///
/// 每个 [`crate::OpenFile`] 独占一个 `Vnode`，并在最后一个描述符关闭时对其调用一次 `close`。
pub trait Vnode: Send + Sync {
    /// 从指定偏移读取数据，返回读到的字节数
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize, FsError>;

    /// 向指定偏移写入数据，返回写入的字节数
    fn write_at(&self, offset: usize, buf: &[u8]) -> Result<usize, FsError>;

    /// 文件长度（用于 `SEEK_END`）
    fn size(&self) -> Result<usize, FsError>;

    /// 是否支持 seek；控制台、管道等返回 `false`
    fn is_seekable(&self) -> bool {
        true
    }

    /// 释放底层对象
    ///
    /// 尽力而为：返回的错误会报告给调用者，但不会阻止句柄销毁。
    fn close(&self) -> Result<(), FsError>;

    /// 获取 Any trait 引用，用于安全的类型转换
    fn as_any(&self) -> &dyn core::any::Any;
}

/// VFS 运行时操作
///
/// os crate 需要实现此 trait 并在启动时注册。
pub trait VfsOps: Send + Sync {
    /// 按 `flags`/`mode` 打开 `path`
    ///
    /// `path` 是内核持有的可变缓冲区，解析过程中可能被改写。
    fn open(&self, path: &mut String, flags: OpenFlags, mode: u32)
    -> Result<Arc<dyn Vnode>, FsError>;
}

// ========== VfsOps 注册 ==========

static VFS_OPS_DATA: AtomicUsize = AtomicUsize::new(0);
static VFS_OPS_VTABLE: AtomicUsize = AtomicUsize::new(0);

/// 注册 VFS 操作实现
///
/// # Safety
/// 必须在单线程环境下调用，且只能调用一次
pub unsafe fn register_vfs_ops(ops: &'static dyn VfsOps) {
    let ptr = ops as *const dyn VfsOps;
    // SAFETY: 将 fat pointer 拆分为 data 和 vtable 两部分存储
    let (data, vtable) =
        unsafe { core::mem::transmute::<*const dyn VfsOps, (usize, usize)>(ptr) };
    VFS_OPS_DATA.store(data, Ordering::Release);
    VFS_OPS_VTABLE.store(vtable, Ordering::Release);
}

/// 获取已注册的 VFS 操作实现
///
/// # Panics
/// 如果尚未调用 [`register_vfs_ops`] 注册实现，则 panic
#[inline]
pub fn vfs_ops() -> &'static dyn VfsOps {
    let data = VFS_OPS_DATA.load(Ordering::Acquire);
    let vtable = VFS_OPS_VTABLE.load(Ordering::Acquire);
    if data == 0 {
        #[cfg(test)]
        {
            extern crate test_support;
            return &test_support::mock::vfs::MOCK_VFS_OPS;
        }
        #[cfg(not(test))]
        panic!("filetable: VfsOps not registered");
    }
    // SAFETY: 重组 fat pointer
    unsafe { &*core::mem::transmute::<(usize, usize), *const dyn VfsOps>((data, vtable)) }
}
