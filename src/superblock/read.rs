//! 卷头读取和验证

use crate::{
    block::{BlockDev, BlockDevice},
    consts::*,
    crc::crc32_skip_field,
    dir::DirectoryEntry,
    error::{Error, ErrorKind, Result},
    types::Extent,
};
use byteorder::{ByteOrder, LittleEndian};
use log::*;

/// 卷头
///
/// 块 0 的前 [`VOLUME_HEADER_SIZE`] 字节，其余字节为 0。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeHeader {
    /// 逻辑块大小
    pub block_size: u32,
    /// 总块数
    pub total_blocks: u64,
    /// 根目录目录表所在的 extent
    pub root: Extent,
}

impl VolumeHeader {
    /// 创建卷头
    pub fn new(block_size: u32, total_blocks: u64, root: Extent) -> Self {
        Self {
            block_size,
            total_blocks,
            root,
        }
    }

    /// 从块设备加载卷头
    ///
    /// # 错误
    ///
    /// - `ErrorKind::Io` - 读取失败
    /// - `ErrorKind::Corrupted` - 魔数、版本或校验和不符，或与设备参数不一致
    pub fn load<D: BlockDevice>(bdev: &mut BlockDev<D>) -> Result<Self> {
        let block_size = bdev.block_size() as usize;
        let mut buf = alloc::vec![0u8; VOLUME_HEADER_BLOCKS as usize * block_size];

        let read = bdev.read_blocks(VOLUME_HEADER_BLOCK, VOLUME_HEADER_BLOCKS, &mut buf)?;
        if read != VOLUME_HEADER_BLOCKS {
            return Err(Error::new(ErrorKind::Io, "Short read of volume header"));
        }

        let header = Self::decode(&buf)?;

        if header.block_size != bdev.block_size() || header.total_blocks > bdev.total_blocks() {
            warn!(
                "[VOLUME] header geometry {}x{} does not match device {}x{}",
                header.total_blocks,
                header.block_size,
                bdev.total_blocks(),
                bdev.block_size()
            );
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Volume header does not match device",
            ));
        }

        Ok(header)
    }

    /// 解析卷头字节
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < VOLUME_HEADER_SIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "Buffer too small for volume header"));
        }
        let raw = &buf[..VOLUME_HEADER_SIZE];

        if LittleEndian::read_u32(&raw[HDR_OFF_MAGIC..]) != VOLUME_MAGIC {
            return Err(Error::new(ErrorKind::Corrupted, "Invalid volume magic number"));
        }
        if LittleEndian::read_u32(&raw[HDR_OFF_VERSION..]) != VOLUME_VERSION {
            return Err(Error::new(ErrorKind::Corrupted, "Unsupported volume version"));
        }
        if LittleEndian::read_u32(&raw[HDR_OFF_CHECKSUM..]) != crc32_skip_field(raw, HDR_OFF_CHECKSUM) {
            return Err(Error::new(ErrorKind::Corrupted, "Volume header checksum mismatch"));
        }

        let header = Self {
            block_size: LittleEndian::read_u32(&raw[HDR_OFF_BLOCK_SIZE..]),
            total_blocks: LittleEndian::read_u64(&raw[HDR_OFF_TOTAL_BLOCKS..]),
            root: Extent::new(
                LittleEndian::read_u64(&raw[HDR_OFF_ROOT_START..]),
                LittleEndian::read_u32(&raw[HDR_OFF_ROOT_COUNT..]),
            ),
        };

        if header.root.count == 0 || header.root.end() > header.total_blocks {
            return Err(Error::new(ErrorKind::Corrupted, "Root extent out of range"));
        }

        Ok(header)
    }

    /// 描述根目录的条目，用于加载根目录表
    pub fn root_entry(&self) -> DirectoryEntry {
        let bytes = self.root.count as u64 * self.block_size as u64;
        DirectoryEntry::new_directory(DOT, bytes, self.root, 0)
    }
}
