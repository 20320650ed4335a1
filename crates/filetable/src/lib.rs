//! 进程文件描述符层
//!
//! 此 crate 回答两个问题：“描述符 N 现在指向哪个对象”，以及“何时可以释放底层打开文件”。
//!
//! - [`OpenFile`] - 引用计数、带锁的打开文件句柄，可被多个描述符（跨进程）共享
//! - [`FDTable`] - 固定容量的进程级描述符表
//! - [`ProcFiles`] - 进程持有的描述符表：启动时建立、fork 时复制、退出时销毁
//! - [`VfsOps`] / [`Vnode`] - 向 VFS 协作方请求 open/close/读写的接口
//!
//! 调用链：系统调用层 → [`ProcFiles`] / [`FDTable`] → [`OpenFile`] → VFS。

#![no_std]

extern crate alloc;

pub mod config;
pub mod error;
pub mod ops;

mod fd_table;
mod open_file;
mod proc_files;

// Re-export config
pub use config::{OPEN_MAX, STDIO_PATH_MAX};

// Re-export error
pub use error::FsError;

// Re-export ops
pub use ops::{VfsOps, Vnode, register_vfs_ops, vfs_ops};

// Re-export handle and tables
pub use fd_table::FDTable;
pub use open_file::OpenFile;
pub use proc_files::ProcFiles;

// Re-export uapi types for convenience
pub use uapi::fcntl::{AccessMode, OpenFlags, SeekWhence};
