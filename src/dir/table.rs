//! 目录表
//!
//! 一个目录的所有目录项在内存中的表示，以及查找、空槽分配和删除操作。

use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
    types::Extent,
};
use alloc::vec::Vec;

use super::entry::{validate_name, DirectoryEntry};

/// 目录表
///
/// 槽 0 是 `.`（自身），槽 1 是 `..`（父目录）。
/// 从磁盘加载的目录表归加载者所有，用完即释放；
/// 根目录和当前工作目录由 [`crate::fs::FileSystem`] 长期持有。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTable {
    entries: Vec<DirectoryEntry>,
}

impl DirectoryTable {
    /// 由目录项列表构造
    pub fn from_entries(entries: Vec<DirectoryEntry>) -> Self {
        Self { entries }
    }

    /// 创建 `count` 个空槽的目录表
    pub fn with_empty_slots(count: usize) -> Self {
        Self {
            entries: alloc::vec![DirectoryEntry::empty(); count],
        }
    }

    /// 槽位总数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否没有任何槽位
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 目录表的字节数
    pub fn byte_size(&self) -> usize {
        self.entries.len() * ENTRY_SIZE
    }

    /// 所有槽位
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// 获取指定槽位
    pub fn entry(&self, index: usize) -> Option<&DirectoryEntry> {
        self.entries.get(index)
    }

    /// 获取指定槽位的可变引用
    pub fn entry_mut(&mut self, index: usize) -> Option<&mut DirectoryEntry> {
        self.entries.get_mut(index)
    }

    /// 已使用槽位的迭代器（`(索引, 条目)`）
    pub fn iter_used(&self) -> impl Iterator<Item = (usize, &DirectoryEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_empty())
    }

    /// `.` 条目
    pub fn self_entry(&self) -> Option<&DirectoryEntry> {
        self.entries.get(SELF_SLOT).filter(|e| e.name == DOT)
    }

    /// 目录表自身所在的 extent（来自 `.` 条目）
    pub fn extent(&self) -> Option<Extent> {
        self.self_entry().and_then(|e| e.extent)
    }

    /// 除 `.` 和 `..` 之外是否没有其他条目
    pub fn has_only_links(&self) -> bool {
        self.iter_used()
            .all(|(i, _)| i == SELF_SLOT || i == PARENT_SLOT)
    }

    /// 按名称查找条目
    ///
    /// 线性扫描，返回第一个名称完全相同的已使用槽位。
    /// 空槽哨兵不会被当作名称匹配。
    pub fn find_entry(&self, name: &str) -> Option<usize> {
        if name.is_empty() || name == EMPTY_ENTRY_NAME {
            return None;
        }
        self.entries.iter().position(|entry| entry.name == name)
    }

    /// 查找第一个空槽
    ///
    /// 低索引优先，删除后的槽位会被优先复用。目录表已满时返回 None。
    pub fn find_free_slot(&self) -> Option<usize> {
        self.entries.iter().position(DirectoryEntry::is_empty)
    }

    /// 把槽位重置为空
    ///
    /// 不会归还条目占用的 extent，调用者需要自行通过分配器释放。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 索引越界，或试图删除 `.` / `..`
    pub fn delete_entry(&mut self, index: usize) -> Result<()> {
        if index == SELF_SLOT || index == PARENT_SLOT {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Cannot delete . or .. entry",
            ));
        }

        let slot = self.entries.get_mut(index).ok_or(Error::new(
            ErrorKind::InvalidInput,
            "Directory slot index out of range",
        ))?;
        *slot = DirectoryEntry::empty();
        Ok(())
    }

    /// 把条目放入第一个空槽
    ///
    /// # 返回
    ///
    /// 条目所在的槽位索引
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 名称不合法
    /// - `ErrorKind::AlreadyExists` - 同名条目已存在
    /// - `ErrorKind::NoSpace` - 目录表已满
    pub fn insert_entry(&mut self, entry: DirectoryEntry) -> Result<usize> {
        validate_name(&entry.name)?;

        if self.find_entry(&entry.name).is_some() {
            return Err(Error::new(ErrorKind::AlreadyExists, "Entry already exists"));
        }

        let index = self
            .find_free_slot()
            .ok_or(Error::new(ErrorKind::NoSpace, "Directory table is full"))?;
        self.entries[index] = entry;
        Ok(index)
    }

    /// 编码为磁盘字节
    ///
    /// `buf` 至少 [`Self::byte_size`] 字节，之后的字节写 0。
    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() < self.byte_size() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Buffer too small for directory table",
            ));
        }

        for (entry, chunk) in self.entries.iter().zip(buf.chunks_exact_mut(ENTRY_SIZE)) {
            entry.encode(chunk)?;
        }
        buf[self.byte_size()..].fill(0);
        Ok(())
    }

    /// 从磁盘字节解码
    ///
    /// 按 [`ENTRY_SIZE`] 切分 `buf`，结尾不足一条记录的字节被忽略。
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let entries = buf
            .chunks_exact(ENTRY_SIZE)
            .map(DirectoryEntry::decode)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }
}
