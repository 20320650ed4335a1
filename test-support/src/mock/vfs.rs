//! VFS 协作方的 Mock 实现
//!
//! 注意：这里不直接依赖 `filetable` crate（避免循环依赖）。
//! `filetable` crate 在 `cfg(test)` 下为这些类型实现其 trait（例如 `VfsOps` / `Vnode`）。

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Mock 的 VFS 操作
///
/// 路径约定由 `filetable` 的 `cfg(test)` 实现解释。
pub struct MockVfsOps {
    opens: AtomicUsize,
}

impl MockVfsOps {
    pub const fn new() -> Self {
        Self {
            opens: AtomicUsize::new(0),
        }
    }

    /// 记录一次成功的 open
    pub fn note_open(&self) {
        self.opens.fetch_add(1, Ordering::Relaxed);
    }

    /// 成功 open 的累计次数
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }
}

/// Mock 的文件对象
///
/// 内容是确定的字节序列：偏移 `i` 处的字节为 `i as u8`。
/// 只记录写入的字节数和长度变化，不保存写入内容。
pub struct MockVnode {
    seekable: bool,
    size: AtomicUsize,
    written: AtomicUsize,
    closes: AtomicUsize,
    fail_close: AtomicBool,
}

impl MockVnode {
    /// 普通文件，初始长度为 `size`
    pub const fn file(size: usize) -> Self {
        Self {
            seekable: true,
            size: AtomicUsize::new(size),
            written: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            fail_close: AtomicBool::new(false),
        }
    }

    /// 控制台类设备，不可 seek
    pub const fn console() -> Self {
        Self {
            seekable: false,
            size: AtomicUsize::new(0),
            written: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            fail_close: AtomicBool::new(false),
        }
    }

    /// 之后的 close 均返回失败
    pub fn set_fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn fail_close(&self) -> bool {
        self.fail_close.load(Ordering::SeqCst)
    }

    pub fn seekable(&self) -> bool {
        self.seekable
    }

    pub fn size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    /// 累计写入的字节数
    pub fn written(&self) -> usize {
        self.written.load(Ordering::SeqCst)
    }

    /// 被 close 的次数
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// 记录一次 close，返回是否应当报告失败
    pub fn note_close(&self) -> bool {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.fail_close()
    }

    /// 按确定模式填充 `buf`，返回读到的字节数
    pub fn fill(&self, offset: usize, buf: &mut [u8]) -> usize {
        let size = self.size();
        if offset >= size {
            return 0;
        }
        let n = buf.len().min(size - offset);
        for (i, byte) in buf[..n].iter_mut().enumerate() {
            *byte = (offset + i) as u8;
        }
        n
    }

    /// 记录一次写入，必要时扩展长度
    pub fn record_write(&self, offset: usize, len: usize) -> usize {
        self.written.fetch_add(len, Ordering::SeqCst);
        if self.seekable {
            self.size.fetch_max(offset + len, Ordering::SeqCst);
        }
        len
    }
}

/// 全局 Mock 实例
pub static MOCK_VFS_OPS: MockVfsOps = MockVfsOps::new();
