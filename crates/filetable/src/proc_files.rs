//! 进程的文件描述符表槽位
//!
//! 进程创建时还没有描述符表，由 [`ProcFiles::init`] 建立并打开标准 I/O；
//! fork 时通过 [`ProcFiles::copy`] 继承，退出时由 [`ProcFiles::destroy`] 销毁。

use alloc::string::String;
use uapi::fcntl::OpenFlags;

use crate::{FDTable, FsError, STDIO_PATH_MAX};

/// 进程持有的文件描述符表（可能尚未建立）
#[derive(Debug, Default)]
pub struct ProcFiles {
    table: Option<FDTable>,
}

impl ProcFiles {
    /// 尚未建立描述符表的状态
    pub const fn new() -> Self {
        Self { table: None }
    }

    /// 是否已经建立描述符表
    pub fn is_initialized(&self) -> bool {
        self.table.is_some()
    }

    /// 描述符表
    pub fn table(&self) -> Option<&FDTable> {
        self.table.as_ref()
    }

    /// 描述符表（可变）
    pub fn table_mut(&mut self) -> Option<&mut FDTable> {
        self.table.as_mut()
    }

    /// 建立描述符表并依次打开标准输入、输出、错误
    ///
    /// 在空表上依次占用最小空槽位，因此 stdin == 0、stdout == 1、stderr == 2。
    /// 任一路径打开失败即中止并返回错误，表可能只填了一部分（进程随后会启动失败）。
    ///
    /// # Panics
    /// 重复调用，或路径长度不小于 [`STDIO_PATH_MAX`] 时 panic
    pub fn init(&mut self, inpath: &str, outpath: &str, errpath: &str) -> Result<(), FsError> {
        for name in [inpath, outpath, errpath] {
            assert!(
                name.len() < STDIO_PATH_MAX,
                "proc_files: stdio path {:?} too long",
                name
            );
        }
        assert!(
            self.table.is_none(),
            "proc_files: descriptor table already initialized"
        );

        let table = self.table.insert(FDTable::new()?);

        // VFS 可能改写路径，因此拷贝到内核持有的可变缓冲区
        let mut path = String::new();
        path.try_reserve_exact(STDIO_PATH_MAX)?;
        for (name, flags) in [
            (inpath, OpenFlags::O_RDONLY),
            (outpath, OpenFlags::O_WRONLY),
            (errpath, OpenFlags::O_WRONLY),
        ] {
            path.clear();
            path.push_str(name);
            table.open(&mut path, flags, 0)?;
        }
        Ok(())
    }

    /// 复制描述符表（用于 fork）
    ///
    /// 尚未建立表时得到同样未建立的结果，不视为错误。
    pub fn copy(&self) -> Result<Self, FsError> {
        let table = match &self.table {
            Some(table) => Some(table.copy()?),
            None => None,
        };
        Ok(Self { table })
    }

    /// 关闭所有描述符并销毁表（用于进程退出）
    ///
    /// # Panics
    /// 表尚未建立或已被销毁时 panic
    pub fn destroy(&mut self) {
        match self.table.take() {
            Some(table) => table.destroy(),
            None => panic!("proc_files: destroying a missing descriptor table"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_mock::init_sync_arch_ops;

    fn init_con() -> ProcFiles {
        init_sync_arch_ops();
        let mut files = ProcFiles::new();
        files.init("con:", "con:", "con:").unwrap();
        files
    }

    #[test]
    fn test_init_opens_stdio_in_order() {
        let files = init_con();
        let table = files.table().unwrap();

        let fds: alloc::vec::Vec<usize> = table.iter().map(|(fd, _)| fd).collect();
        assert_eq!(fds, [0, 1, 2]);
        assert!(table.get(0).unwrap().readable());
        assert!(!table.get(0).unwrap().writable());
        assert!(table.get(1).unwrap().writable());
        assert!(table.get(2).unwrap().writable());
    }

    #[test]
    #[should_panic(expected = "already initialized")]
    fn test_double_init_panics() {
        let mut files = init_con();
        let _ = files.init("con:", "con:", "con:");
    }

    #[test]
    fn test_init_failure_propagates() {
        init_sync_arch_ops();
        let mut files = ProcFiles::new();
        assert_eq!(
            files.init("con:", "missing", "con:"),
            Err(FsError::NotFound)
        );
        // stdin stays open; the table is left partially populated.
        let table = files.table().unwrap();
        assert!(table.is_open(0));
        assert_eq!(table.len(), 1);
    }

    #[test]
    #[should_panic(expected = "too long")]
    fn test_init_rejects_long_path() {
        init_sync_arch_ops();
        let long = "x".repeat(STDIO_PATH_MAX);
        let _ = ProcFiles::new().init(&long, "con:", "con:");
    }

    #[test]
    fn test_copy_of_missing_table_is_missing() {
        let files = ProcFiles::new();
        let copy = files.copy().unwrap();
        assert!(!copy.is_initialized());
    }

    #[test]
    fn test_copy_shares_stdio() {
        let files = init_con();
        let mut child = files.copy().unwrap();

        let parent_table = files.table().unwrap();
        assert_eq!(parent_table.get(1).unwrap().refs(), 2);

        child.destroy();
        assert!(!child.is_initialized());
        assert_eq!(parent_table.get(1).unwrap().refs(), 1);
    }

    #[test]
    #[should_panic(expected = "missing descriptor table")]
    fn test_destroy_missing_table_panics() {
        ProcFiles::new().destroy();
    }
}
