//! 磁盘数据结构的公共类型
//!
//! 这个模块包含目录项、分配器和卷头共用的类型：
//! - [`Extent`] - 一段连续的磁盘块
//! - [`EntryFlags`] - 目录项标志位

use bitflags::bitflags;

/// 一段连续的磁盘块
///
/// 由引用它的目录项独占。对目录而言是其目录表所在的块，
/// 对文件而言是文件内容所在的块。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent {
    /// 起始块号
    pub start: u64,
    /// 块数
    pub count: u32,
}

impl Extent {
    /// 创建新的 extent
    pub const fn new(start: u64, count: u32) -> Self {
        Self { start, count }
    }

    /// 结束块号（不包含）
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.count as u64)
    }

    /// 检查块号是否落在此 extent 内
    pub fn contains(&self, block: u64) -> bool {
        block >= self.start && block < self.end()
    }
}

bitflags! {
    /// 目录项标志
    ///
    /// 存储在目录项记录的 flags 字节中
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EntryFlags: u8 {
        /// 条目是目录
        const DIRECTORY = 0x01;
    }
}
