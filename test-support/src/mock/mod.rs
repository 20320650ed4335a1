//! Mock 实现模块
//!
//! 提供架构操作与 VFS 协作方的 Mock 实现，用于测试

pub mod arch;
pub mod vfs;
