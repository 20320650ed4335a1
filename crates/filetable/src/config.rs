//! 文件描述符层的编译期配置

/// 每个进程的文件描述符槽位数
pub const OPEN_MAX: usize = 128;

/// 启动时标准 I/O 路径缓冲区的长度（含结尾余量）
pub const STDIO_PATH_MAX: usize = 32;
