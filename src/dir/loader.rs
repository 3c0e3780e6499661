//! 目录表的加载和写回

use crate::{
    block::{BlockDev, BlockDevice},
    consts::*,
    error::{Error, ErrorKind, Result},
    superblock::VolumeHeader,
    types::Extent,
};
use alloc::vec::Vec;
use log::*;

use super::{entry::DirectoryEntry, table::DirectoryTable};

/// 为 extent 分配读写缓冲区
///
/// extent 必须非空且落在卷内，否则返回 `kind` 类型的错误，不做分配。
fn extent_buffer<D: BlockDevice>(
    bdev: &BlockDev<D>,
    extent: Extent,
    kind: ErrorKind,
) -> Result<Vec<u8>> {
    if extent.count == 0 || extent.end() > bdev.total_blocks() {
        warn!(
            "[DIR] extent {}+{} outside volume of {} blocks",
            extent.start,
            extent.count,
            bdev.total_blocks()
        );
        return Err(Error::new(kind, "Directory extent outside the volume"));
    }

    let len = (extent.count as usize)
        .checked_mul(bdev.block_size() as usize)
        .ok_or(Error::new(kind, "Directory extent too large"))?;
    Ok(alloc::vec![0u8; len])
}

/// 读取 extent 覆盖的全部块
///
/// 实际读取的块数与请求不符时返回 `Io`，缓冲区随之丢弃。
fn read_extent<D: BlockDevice>(bdev: &mut BlockDev<D>, extent: Extent) -> Result<Vec<u8>> {
    let mut buf = extent_buffer(bdev, extent, ErrorKind::Corrupted)?;

    let read = match bdev.read_blocks(extent.start, extent.count, &mut buf) {
        Ok(n) => n,
        Err(e) => {
            warn!("[DIR] read of blocks {}..{} failed: {}", extent.start, extent.end(), e);
            0
        }
    };

    if read != extent.count {
        warn!(
            "[DIR] short read at block {}: {}/{} blocks",
            extent.start, read, extent.count
        );
        return Err(Error::new(ErrorKind::Io, "Short read of directory table"));
    }

    Ok(buf)
}

/// 加载目录条目指向的目录表
///
/// 总是从条目自己的 extent 读取。
///
/// # 参数
///
/// * `bdev` - 块设备
/// * `entry` - 目录条目（通常来自父目录表，或是 `.` / `..`）
///
/// # 返回
///
/// 新加载的目录表，归调用者所有
///
/// # 错误
///
/// - `ErrorKind::NotADirectory` - 条目不是目录
/// - `ErrorKind::Io` - 读取的块数与条目记录的不符
/// - `ErrorKind::Corrupted` - 条目没有 extent，extent 超出卷尾，
///   或读到的数据不是合法的目录表
pub fn load_directory<D: BlockDevice>(
    bdev: &mut BlockDev<D>,
    entry: &DirectoryEntry,
) -> Result<DirectoryTable> {
    if !entry.is_dir() {
        return Err(Error::new(ErrorKind::NotADirectory, "Entry is not a directory"));
    }

    let extent = entry.extent.ok_or(Error::new(
        ErrorKind::Corrupted,
        "Directory entry has no extent",
    ))?;

    let buf = read_extent(bdev, extent)?;

    // 先解出 `.`，由它的大小决定目录表的槽位数
    let me = DirectoryEntry::decode(&buf)?;
    let table_bytes = me.size as usize;
    if me.name != DOT
        || !me.is_dir()
        || table_bytes < MIN_DIR_ENTRIES as usize * ENTRY_SIZE
        || table_bytes % ENTRY_SIZE != 0
        || table_bytes > buf.len()
    {
        warn!("[DIR] block {} does not hold a directory table", extent.start);
        return Err(Error::new(ErrorKind::Corrupted, "Invalid directory table header"));
    }

    let table = DirectoryTable::decode(&buf[..table_bytes])?;

    trace!(
        "[DIR] loaded '{}' from block {} ({} entries)",
        entry.name,
        extent.start,
        table.len()
    );

    Ok(table)
}

/// 把目录表写回它的 `.` 条目所指的 extent
///
/// # 错误
///
/// - `ErrorKind::InvalidInput` - 目录表没有 `.` 条目，extent 超出卷尾，
///   或目录表放不进自己的 extent
/// - `ErrorKind::Io` - 写入的块数不足
pub fn store_directory<D: BlockDevice>(bdev: &mut BlockDev<D>, table: &DirectoryTable) -> Result<()> {
    let extent = table.extent().ok_or(Error::new(
        ErrorKind::InvalidInput,
        "Directory table has no self entry",
    ))?;

    let mut buf = extent_buffer(bdev, extent, ErrorKind::InvalidInput)?;
    if table.byte_size() > buf.len() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Directory table larger than its extent",
        ));
    }

    table.encode(&mut buf)?;

    let written = match bdev.write_blocks(extent.start, extent.count, &buf) {
        Ok(n) => n,
        Err(e) => {
            warn!("[DIR] write of blocks {}..{} failed: {}", extent.start, extent.end(), e);
            0
        }
    };

    if written != extent.count {
        return Err(Error::new(ErrorKind::Io, "Short write of directory table"));
    }

    debug!("[DIR] stored directory table at block {}", extent.start);
    Ok(())
}

/// 从卷头记录的位置加载根目录
pub fn load_root_directory<D: BlockDevice>(
    bdev: &mut BlockDev<D>,
    header: &VolumeHeader,
) -> Result<DirectoryTable> {
    let root = header.root_entry();
    let table = load_directory(bdev, &root)?;

    // 根目录的 `.` 必须指回卷头记录的位置
    if table.extent() != Some(header.root) {
        return Err(Error::new(
            ErrorKind::Corrupted,
            "Root directory does not match volume header",
        ));
    }

    Ok(table)
}
