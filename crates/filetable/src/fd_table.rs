//! 文件描述符表
//!
//! 该模块实现了进程级的文件描述符管理，提供 POSIX 兼容的文件描述符操作。
//!
//! 约定与语义：
//!
//! - 表的容量固定为 [`OPEN_MAX`]，描述符总在 `[0, OPEN_MAX)` 内
//! - `place()`/`dup()` 分配“最小可用 fd”
//! - `dup/dup2` 以及 `copy()`（fork）共享同一个 [`OpenFile`]，因此共享 offset 与访问模式
//! - 表只属于一个进程，修改需要 `&mut self`，不需要额外加锁

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use log::{debug, trace, warn};
use uapi::fcntl::OpenFlags;

use crate::{FsError, OPEN_MAX, OpenFile};

/// 文件描述符表
pub struct FDTable {
    /// 文件描述符数组，长度恒为 `max_fds`
    files: Vec<Option<Arc<OpenFile>>>,
    /// 最大文件描述符数量
    max_fds: usize,
}

impl fmt::Debug for FDTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FDTable")
            .field("max_fds", &self.max_fds)
            .field("used", &self.len())
            .finish()
    }
}

impl FDTable {
    /// 创建所有槽位为空的描述符表
    pub fn new() -> Result<Self, FsError> {
        Self::with_slots(OPEN_MAX)
    }

    fn with_slots(max_fds: usize) -> Result<Self, FsError> {
        let mut files = Vec::new();
        files.try_reserve_exact(max_fds)?;
        files.resize(max_fds, None);
        Ok(Self { files, max_fds })
    }

    /// 最大文件描述符数量
    pub fn max_fds(&self) -> usize {
        self.max_fds
    }

    /// 已占用的槽位数
    pub fn len(&self) -> usize {
        self.files.iter().filter(|slot| slot.is_some()).count()
    }

    /// 是否没有任何打开的描述符
    pub fn is_empty(&self) -> bool {
        self.files.iter().all(Option::is_none)
    }

    /// `fd` 是否指向打开的文件
    pub fn is_open(&self, fd: usize) -> bool {
        matches!(self.files.get(fd), Some(Some(_)))
    }

    /// 按升序遍历已占用的槽位
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Arc<OpenFile>)> + '_ {
        self.files
            .iter()
            .enumerate()
            .filter_map(|(fd, slot)| slot.as_ref().map(|file| (fd, file)))
    }

    fn lowest_free(&self) -> Result<usize, FsError> {
        self.files
            .iter()
            .position(Option::is_none)
            .ok_or(FsError::TooManyOpenFiles)
    }

    /// 把句柄放入最小的空槽位，返回描述符
    ///
    /// 调用者持有的槽位引用转移到该槽位，`refs` 不变。
    /// 表满时返回 `TooManyOpenFiles`，表不变，引用仍归调用者。
    pub fn place(&mut self, file: &Arc<OpenFile>) -> Result<usize, FsError> {
        let fd = self.lowest_free()?;
        self.files[fd] = Some(Arc::clone(file));
        trace!("fd_table: placed file at fd {}", fd);
        Ok(fd)
    }

    /// 获取描述符对应的句柄（借用，不改变引用计数）
    pub fn get(&self, fd: usize) -> Result<&Arc<OpenFile>, FsError> {
        self.files
            .get(fd)
            .and_then(Option::as_ref)
            .ok_or(FsError::BadFileDescriptor)
    }

    /// 打开文件并放入最小的空槽位
    ///
    /// 表满时新句柄会被立即销毁（vnode 被关闭），表不变。
    pub fn open(&mut self, path: &mut String, flags: OpenFlags, mode: u32) -> Result<usize, FsError> {
        let file = OpenFile::open(path, flags, mode)?;
        match self.place(&file) {
            Ok(fd) => {
                debug!("fd_table: open {:?} -> fd {}", path, fd);
                Ok(fd)
            }
            Err(err) => {
                // 引用从未进入表，就地释放
                let _ = file.release();
                Err(err)
            }
        }
    }

    /// 关闭文件描述符
    ///
    /// 槽位持有的引用总会被释放并清空槽位；若这是最后一个引用且 vnode 关闭失败，
    /// 错误返回给调用者，但句柄已经销毁，不会自动重试。
    pub fn close(&mut self, fd: usize) -> Result<(), FsError> {
        let file = self
            .files
            .get_mut(fd)
            .and_then(Option::take)
            .ok_or(FsError::BadFileDescriptor)?;
        debug!("fd_table: close fd {}", fd);
        file.release()
    }

    /// 复制文件描述符到最小的空槽位
    pub fn dup(&mut self, old_fd: usize) -> Result<usize, FsError> {
        let file = Arc::clone(self.get(old_fd)?);
        let fd = self.lowest_free()?;
        file.acquire();
        self.files[fd] = Some(file);
        debug!("fd_table: dup fd {} -> fd {}", old_fd, fd);
        Ok(fd)
    }

    /// 复制文件描述符到指定位置
    ///
    /// `old_fd == new_fd` 时直接成功。`new_fd` 已打开时先关闭它，关闭失败则整个操作中止。
    pub fn dup2(&mut self, old_fd: usize, new_fd: usize) -> Result<usize, FsError> {
        if old_fd >= self.max_fds || new_fd >= self.max_fds {
            return Err(FsError::BadFileDescriptor);
        }
        let file = Arc::clone(self.get(old_fd)?);

        // BSD 语义：dup2 到自身总是成功
        if old_fd == new_fd {
            return Ok(new_fd);
        }

        if self.is_open(new_fd) {
            self.close(new_fd)?;
        }

        file.acquire();
        self.files[new_fd] = Some(file);
        debug!("fd_table: dup2 fd {} -> fd {}", old_fd, new_fd);
        Ok(new_fd)
    }

    /// 复制整个文件描述符表（用于 fork）
    ///
    /// 新表逐槽位镜像本表，共享句柄而不是复制句柄：每个被引用的句柄在扫描时
    /// 即 `acquire`，此时本表仍被借用，扫描中的槽位不会被关闭。
    pub fn copy(&self) -> Result<Self, FsError> {
        let mut files = Vec::new();
        files.try_reserve_exact(self.max_fds)?;

        for slot in &self.files {
            files.push(slot.as_ref().map(|file| {
                file.acquire();
                Arc::clone(file)
            }));
        }

        debug!("fd_table: copied table with {} open fds", self.len());
        Ok(Self {
            files,
            max_fds: self.max_fds,
        })
    }

    /// 关闭所有描述符并销毁表（用于进程退出）
    pub fn destroy(self) {
        debug!("fd_table: destroy table with {} open fds", self.len());
        drop(self);
    }

    fn release_all(&mut self) {
        for (fd, slot) in self.files.iter_mut().enumerate() {
            if let Some(file) = slot.take() {
                // 句柄无论如何都已销毁，退出路径上只记录错误
                if let Err(err) = file.release() {
                    warn!("fd_table: close of fd {} failed at teardown: {:?}", fd, err);
                }
            }
        }
    }
}

impl Drop for FDTable {
    fn drop(&mut self) {
        self.release_all();
    }
}
