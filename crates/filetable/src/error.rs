//! 文件描述符层错误类型
//!
//! 定义了与 POSIX 兼容的错误码，可通过 [`FsError::to_errno()`] 转换为系统调用错误码。
//! VFS 协作方返回的错误原样向上传递。

use uapi::errno;

/// 文件描述符层错误类型
///
/// 各错误码对应标准 POSIX errno 值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    // 文件/目录相关
    /// 文件不存在 (-ENOENT)
    NotFound,
    /// 文件已存在 (-EEXIST)
    AlreadyExists,
    /// 不是目录 (-ENOTDIR)
    NotDirectory,
    /// 是目录 (-EISDIR)
    IsDirectory,

    // 权限相关
    /// 权限被拒绝 (-EACCES)
    PermissionDenied,

    // 文件描述符相关
    /// 无效的文件描述符 (-EBADF)
    BadFileDescriptor,
    /// 打开的文件过多 (-EMFILE)
    TooManyOpenFiles,

    // 资源相关
    /// 内存不足 (-ENOMEM)
    OutOfMemory,

    // 参数相关
    /// 无效参数 (-EINVAL)
    InvalidArgument,
    /// 文件名过长 (-ENAMETOOLONG)
    NameTooLong,
    /// 对不可定位的文件执行 seek (-ESPIPE)
    IllegalSeek,

    // 文件系统相关
    /// 只读文件系统 (-EROFS)
    ReadOnlyFs,
    /// 设备空间不足 (-ENOSPC)
    NoSpace,
    /// I/O 错误 (-EIO)
    IoError,
    /// 设备不存在 (-ENODEV)
    NoDevice,

    // 其他
    /// 操作不支持 (-ENOTSUP)
    NotSupported,
}

impl FsError {
    /// 转换为系统调用错误码（负数）
    pub fn to_errno(&self) -> isize {
        let code = match self {
            FsError::NotFound => errno::ENOENT,
            FsError::AlreadyExists => errno::EEXIST,
            FsError::NotDirectory => errno::ENOTDIR,
            FsError::IsDirectory => errno::EISDIR,
            FsError::PermissionDenied => errno::EACCES,
            FsError::BadFileDescriptor => errno::EBADF,
            FsError::TooManyOpenFiles => errno::EMFILE,
            FsError::OutOfMemory => errno::ENOMEM,
            FsError::InvalidArgument => errno::EINVAL,
            FsError::NameTooLong => errno::ENAMETOOLONG,
            FsError::IllegalSeek => errno::ESPIPE,
            FsError::ReadOnlyFs => errno::EROFS,
            FsError::NoSpace => errno::ENOSPC,
            FsError::IoError => errno::EIO,
            FsError::NoDevice => errno::ENODEV,
            FsError::NotSupported => errno::ENOTSUP,
        };
        -(code as isize)
    }
}

impl From<alloc::collections::TryReserveError> for FsError {
    fn from(_: alloc::collections::TryReserveError) -> Self {
        FsError::OutOfMemory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_values() {
        assert_eq!(FsError::BadFileDescriptor.to_errno(), -9);
        assert_eq!(FsError::OutOfMemory.to_errno(), -12);
        assert_eq!(FsError::TooManyOpenFiles.to_errno(), -24);
        assert_eq!(FsError::IllegalSeek.to_errno(), -29);
    }
}
