//! 打开文件句柄
//!
//! [`OpenFile`] 包装一个 VFS [`Vnode`]，记录当前偏移和访问模式。
//! 同一个句柄可以被多个描述符槽位引用（`dup`/`dup2`、fork 时复制的表），
//! 这些槽位共享偏移量与访问模式。
//!
//! 引用计数 `refs` 统计的是**描述符槽位**的数量，与 `Arc` 的强引用计数不同：
//! 系统调用可以临时持有 `Arc` 克隆完成一次 I/O，但不会因此成为槽位持有者。
//! 当 `refs` 从 1 降到 0 时，底层 vnode 被关闭，且只关闭一次。

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use log::{debug, warn};
use sync::SpinLock;
use uapi::fcntl::{AccessMode, OpenFlags, SeekWhence};

use crate::{FsError, Vnode, vfs_ops};

/// 受句柄锁保护的可变状态
struct OpenFileState {
    /// 引用此句柄的描述符槽位数，0 表示已销毁
    refs: usize,
    /// 当前读写偏移
    offset: usize,
}

/// 打开文件句柄
pub struct OpenFile {
    vnode: Arc<dyn Vnode>,
    mode: AccessMode,
    state: SpinLock<OpenFileState>,
}

impl OpenFile {
    /// 通过 VFS 打开 `path`，返回 `refs == 1` 的新句柄
    ///
    /// `path` 必须是内核持有的可变缓冲区（已从用户空间拷入），VFS 可能改写它。
    /// 访问模式取自 `flags & O_ACCMODE`；`O_ACCMODE` 全部置位时返回 `InvalidArgument`，
    /// 此时不会调用 VFS。
    pub fn open(path: &mut String, flags: OpenFlags, mode: u32) -> Result<Arc<Self>, FsError> {
        let access = flags.access_mode().ok_or(FsError::InvalidArgument)?;
        let vnode = vfs_ops().open(path, flags, mode)?;
        debug!("open_file: opened {:?} as {:?}", path, access);
        Ok(Arc::new(Self::new(vnode, access)))
    }

    /// 用已经打开的 vnode 构造句柄，`refs == 1`，偏移为 0
    pub fn new(vnode: Arc<dyn Vnode>, mode: AccessMode) -> Self {
        Self {
            vnode,
            mode,
            state: SpinLock::new(OpenFileState { refs: 1, offset: 0 }),
        }
    }

    /// 增加一个槽位引用
    ///
    /// # Panics
    /// 句柄已销毁时 panic
    pub fn acquire(&self) {
        let mut state = self.state.lock();
        assert!(state.refs > 0, "open_file: acquire on a destroyed handle");
        state.refs += 1;
    }

    /// 释放调用者持有的槽位引用
    ///
    /// 若这是最后一个引用，则在锁内标记销毁、锁外关闭 vnode，并返回 vnode 关闭的结果。
    /// 无论关闭是否成功，句柄都已销毁，不能再次释放。
    ///
    /// # Panics
    /// 对已销毁的句柄调用（重复释放）时 panic
    pub fn release(self: Arc<Self>) -> Result<(), FsError> {
        let last = {
            let mut state = self.state.lock();
            assert!(state.refs > 0, "open_file: released more times than acquired");
            state.refs -= 1;
            state.refs == 0
        };
        if !last {
            return Ok(());
        }

        self.vnode.close().inspect_err(|err| {
            warn!("open_file: vnode close failed: {:?}", err);
        })
    }

    /// 当前槽位引用数
    pub fn refs(&self) -> usize {
        self.state.lock().refs
    }

    /// 当前偏移
    pub fn offset(&self) -> usize {
        self.state.lock().offset
    }

    /// 访问模式
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// 是否以可读方式打开
    pub fn readable(&self) -> bool {
        self.mode.readable()
    }

    /// 是否以可写方式打开
    pub fn writable(&self) -> bool {
        self.mode.writable()
    }

    /// 底层 vnode
    pub fn vnode(&self) -> &Arc<dyn Vnode> {
        &self.vnode
    }

    /// 从当前偏移读取，并推进偏移
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, FsError> {
        if !self.readable() {
            return Err(FsError::BadFileDescriptor);
        }
        let offset = self.start_offset()?;
        let n = self.vnode.read_at(offset, buf)?;
        self.advance(offset, n);
        Ok(n)
    }

    /// 在当前偏移写入，并推进偏移
    pub fn write(&self, buf: &[u8]) -> Result<usize, FsError> {
        if !self.writable() {
            return Err(FsError::BadFileDescriptor);
        }
        let offset = self.start_offset()?;
        let n = self.vnode.write_at(offset, buf)?;
        self.advance(offset, n);
        Ok(n)
    }

    /// 设置文件偏移量，返回新的偏移
    pub fn lseek(&self, offset: isize, whence: SeekWhence) -> Result<usize, FsError> {
        if !self.vnode.is_seekable() {
            return Err(FsError::IllegalSeek);
        }
        // vnode 调用不能在自旋锁内进行
        let size = match whence {
            SeekWhence::End => self.vnode.size()?,
            _ => 0,
        };

        let mut state = self.state.lock();
        if state.refs == 0 {
            return Err(FsError::BadFileDescriptor);
        }
        let base = match whence {
            SeekWhence::Set => 0,
            SeekWhence::Cur => state.offset,
            SeekWhence::End => size,
        };
        let base = isize::try_from(base).map_err(|_| FsError::InvalidArgument)?;
        let new_offset = base
            .checked_add(offset)
            .filter(|pos| *pos >= 0)
            .ok_or(FsError::InvalidArgument)?;
        state.offset = new_offset as usize;
        Ok(state.offset)
    }

    /// 取 I/O 起始偏移；不可 seek 的文件总是从 0 开始
    fn start_offset(&self) -> Result<usize, FsError> {
        let state = self.state.lock();
        if state.refs == 0 {
            return Err(FsError::BadFileDescriptor);
        }
        Ok(if self.vnode.is_seekable() {
            state.offset
        } else {
            0
        })
    }

    fn advance(&self, start: usize, n: usize) {
        if self.vnode.is_seekable() {
            self.state.lock().offset = start + n;
        }
    }
}

impl fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("OpenFile")
            .field("mode", &self.mode)
            .field("refs", &state.refs)
            .field("offset", &state.offset)
            .finish()
    }
}
