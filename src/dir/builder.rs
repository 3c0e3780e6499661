//! 目录创建
//!
//! 为新目录分配目录表所需的连续块，初始化所有槽位，
//! 写入 `.` 和 `..`，然后把整张表写到磁盘。

use crate::{
    balloc::ExtentAllocator,
    block::{BlockDev, BlockDevice},
    consts::*,
    error::{Error, ErrorKind, Result},
    fs::SystemHal,
};
use log::*;

use super::{entry::DirectoryEntry, table::DirectoryTable};

/// 目录表的尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableGeometry {
    /// 占用的块数
    pub blocks: u32,
    /// 实际槽位数（填满最后一个块）
    pub entries: u32,
}

impl TableGeometry {
    /// 计算容纳 `requested` 个槽位所需的尺寸
    ///
    /// 实际槽位数可能大于请求数：最后一个块剩余的空间也会被用作槽位。
    /// 调用者应读取返回的槽位数，而不是假定等于请求数。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - `requested` 为 0，或块大小不是
    ///   [`ENTRY_SIZE`] 的整数倍
    pub fn for_entries(requested: u32, block_size: u32) -> Result<Self> {
        if requested == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Directory must have at least one entry",
            ));
        }
        if block_size == 0 || block_size as usize % ENTRY_SIZE != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Block size must be a multiple of the entry size",
            ));
        }

        let requested = requested.max(MIN_DIR_ENTRIES) as u64;
        let bytes = requested * ENTRY_SIZE as u64;
        let blocks = (bytes + block_size as u64 - 1) / block_size as u64;
        let entries = blocks * block_size as u64 / ENTRY_SIZE as u64;

        match (u32::try_from(blocks), u32::try_from(entries)) {
            (Ok(blocks), Ok(entries)) => Ok(Self { blocks, entries }),
            _ => Err(Error::new(
                ErrorKind::InvalidInput,
                "Directory entry count too large",
            )),
        }
    }

    /// 目录表字节数
    pub fn table_bytes(&self) -> u64 {
        self.entries as u64 * ENTRY_SIZE as u64
    }
}

/// 创建目录并写入磁盘，返回其 `.` 条目
///
/// 返回的条目描述新目录自身（大小、时间戳、extent），
/// 调用者改名后即可放入父目录的目录表。
///
/// # 参数
///
/// * `bdev` - 块设备
/// * `allocator` - extent 分配器
/// * `requested_entry_count` - 请求的槽位数
/// * `parent` - 父目录的 `.` 条目；为 None 时创建根目录（根目录的父目录是自身）
///
/// # 错误
///
/// - `ErrorKind::InvalidInput` - 槽位数为 0 或块大小不合适
/// - `ErrorKind::NotADirectory` - `parent` 不是目录
/// - `ErrorKind::NoSpace` - 无法分配完整的连续块
/// - `ErrorKind::Io` - 写入失败（已分配的块会被归还）
pub fn build_directory_entry<H: SystemHal, D: BlockDevice, A: ExtentAllocator>(
    bdev: &mut BlockDev<D>,
    allocator: &mut A,
    requested_entry_count: u32,
    parent: Option<&DirectoryEntry>,
) -> Result<DirectoryEntry> {
    let geometry = TableGeometry::for_entries(requested_entry_count, bdev.block_size())?;

    if let Some(parent) = parent {
        if !parent.is_dir() || parent.extent.is_none() {
            return Err(Error::new(
                ErrorKind::NotADirectory,
                "Parent entry is not a directory",
            ));
        }
    }

    // 不接受部分分配
    let extent = allocator.allocate_blocks(geometry.blocks, geometry.blocks)?;
    if extent.count != geometry.blocks {
        allocator.release_blocks(extent)?;
        return Err(Error::new(
            ErrorKind::NoSpace,
            "Allocator returned a short extent",
        ));
    }

    let now = H::timestamp();
    let me = DirectoryEntry::new_directory(DOT, geometry.table_bytes(), extent, now);

    let mut table = DirectoryTable::with_empty_slots(geometry.entries as usize);
    let dotdot = match parent {
        Some(parent) => parent.renamed(DOTDOT),
        None => me.renamed(DOTDOT),
    };
    if let Some(slot) = table.entry_mut(SELF_SLOT) {
        *slot = me.clone();
    }
    if let Some(slot) = table.entry_mut(PARENT_SLOT) {
        *slot = dotdot;
    }

    let block_size = bdev.block_size() as usize;
    let mut buf = alloc::vec![0u8; geometry.blocks as usize * block_size];
    table.encode(&mut buf)?;

    let written = match bdev.write_blocks(extent.start, extent.count, &buf) {
        Ok(n) => n,
        Err(e) => {
            warn!("[DIR] write of new directory at block {} failed: {}", extent.start, e);
            0
        }
    };

    if written != extent.count {
        allocator.release_blocks(extent)?;
        return Err(Error::new(
            ErrorKind::Io,
            "Failed to write directory table",
        ));
    }

    debug!(
        "[DIR] built directory at block {} ({} blocks, {} entries, root={})",
        extent.start,
        extent.count,
        geometry.entries,
        parent.is_none()
    );

    Ok(me)
}

/// 创建目录并写入磁盘，返回目录表的起始块号
///
/// 参见 [`build_directory_entry`]。
pub fn build_directory<H: SystemHal, D: BlockDevice, A: ExtentAllocator>(
    bdev: &mut BlockDev<D>,
    allocator: &mut A,
    requested_entry_count: u32,
    parent: Option<&DirectoryEntry>,
) -> Result<u64> {
    let me = build_directory_entry::<H, D, A>(bdev, allocator, requested_entry_count, parent)?;
    me.extent.map(|e| e.start).ok_or(Error::new(
        ErrorKind::Corrupted,
        "New directory has no extent",
    ))
}
