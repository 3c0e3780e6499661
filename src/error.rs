//! 错误类型定义
//!
//! 提供目录层操作的错误类型。

use core::fmt;

/// 目录层操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// I/O 错误（块读写不完整或设备失败）
    Io,
    /// 无效参数
    InvalidInput,
    /// 磁盘数据损坏
    Corrupted,
    /// 路径中间组件不存在
    NotFound,
    /// 路径组件不是目录
    NotADirectory,
    /// 已存在
    AlreadyExists,
    /// 空间不足（分配器无法满足请求，或目录表已满）
    NoSpace,
    /// 资源忙
    Busy,
    /// 目录非空
    NotEmpty,
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;
