//! 文件控制相关定义 (open/lseek)

use bitflags::bitflags;

bitflags! {
    /// open(2) 标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        const O_RDONLY    = 0o0;
        const O_WRONLY    = 0o1;
        const O_RDWR      = 0o2;
        const O_ACCMODE   = 0o3;
        const O_CREAT     = 0o100;
        const O_EXCL      = 0o200;
        const O_NOCTTY    = 0o400;
        const O_TRUNC     = 0o1000;
        const O_APPEND    = 0o2000;
        const O_NONBLOCK  = 0o4000;
        const O_DIRECTORY = 0o200000;
        const O_NOFOLLOW  = 0o400000;
        const O_CLOEXEC   = 0o2000000;
    }
}

/// 访问模式（`flags & O_ACCMODE`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    /// 是否允许读
    pub fn readable(self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    /// 是否允许写
    pub fn writable(self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }

    /// 转换回 open 标志中的访问模式位
    pub fn as_flags(self) -> OpenFlags {
        match self {
            AccessMode::ReadOnly => OpenFlags::O_RDONLY,
            AccessMode::WriteOnly => OpenFlags::O_WRONLY,
            AccessMode::ReadWrite => OpenFlags::O_RDWR,
        }
    }
}

impl OpenFlags {
    /// 提取访问模式；`O_ACCMODE` 全部置位不是合法的访问模式，返回 `None`
    pub fn access_mode(self) -> Option<AccessMode> {
        match self.bits() & Self::O_ACCMODE.bits() {
            0 => Some(AccessMode::ReadOnly),
            1 => Some(AccessMode::WriteOnly),
            2 => Some(AccessMode::ReadWrite),
            _ => None,
        }
    }
}

/// lseek(2) 的 whence 参数
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekWhence {
    Set = 0,
    Cur = 1,
    End = 2,
}

impl TryFrom<i32> for SeekWhence {
    type Error = ();

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SeekWhence::Set),
            1 => Ok(SeekWhence::Cur),
            2 => Ok(SeekWhence::End),
            _ => Err(()),
        }
    }
}
