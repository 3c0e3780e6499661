//! 块分配功能

use crate::{
    bitmap,
    consts::VOLUME_HEADER_BLOCKS,
    error::{Error, ErrorKind, Result},
    types::Extent,
};
use alloc::vec::Vec;
use log::*;

/// 连续块分配器接口
///
/// 目录创建时通过它申请目录表所需的连续块，删除目录时归还。
pub trait ExtentAllocator {
    /// 分配一段连续块
    ///
    /// # 参数
    ///
    /// * `preferred` - 期望的块数
    /// * `minimum` - 可接受的最少块数
    ///
    /// # 返回
    ///
    /// 成功返回分配到的 extent，块数介于 `minimum` 和 `preferred` 之间
    ///
    /// # 错误
    ///
    /// - `ErrorKind::NoSpace` - 找不到至少 `minimum` 块的连续空闲段
    /// - `ErrorKind::InvalidInput` - 参数无效
    fn allocate_blocks(&mut self, preferred: u32, minimum: u32) -> Result<Extent>;

    /// 归还一段连续块
    fn release_blocks(&mut self, extent: Extent) -> Result<()>;

    /// 把磁盘上已被占用的 extent 标记为已分配
    ///
    /// 挂载时按目录树逐个调用，重建分配状态。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - extent 为空或超出卷尾
    /// - `ErrorKind::Corrupted` - extent 与已分配的块重叠
    fn reserve_blocks(&mut self, extent: Extent) -> Result<()>;
}

/// 基于内存位图的分配器
///
/// 卷头所在的块在创建时即被标记为已使用，其余块全部空闲。
/// 挂载已有卷时由 [`crate::fs::FileSystem`] 调用
/// [`ExtentAllocator::reserve_blocks`] 补齐目录树占用的块。
#[derive(Debug, Clone)]
pub struct BitmapAllocator {
    bitmap: Vec<u8>,
    total_blocks: u64,
}

impl BitmapAllocator {
    /// 创建覆盖 `total_blocks` 个块的分配器
    pub fn new(total_blocks: u64) -> Self {
        let bytes = ((total_blocks + 7) / 8) as usize;
        let mut bitmap = alloc::vec![0u8; bytes];
        let reserved = (VOLUME_HEADER_BLOCKS as u64).min(total_blocks);
        for block in 0..reserved {
            if let Some(byte) = bitmap.get_mut((block / 8) as usize) {
                *byte |= 1 << (block % 8);
            }
        }

        Self {
            bitmap,
            total_blocks,
        }
    }

    /// 总块数
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    /// 空闲块数
    pub fn free_blocks(&self) -> u64 {
        bitmap::count_zeros(&self.bitmap, self.total_blocks)
    }

    /// 检查块是否已分配
    pub fn is_allocated(&self, block: u64) -> bool {
        block < self.total_blocks && bitmap::test_bit(&self.bitmap, block)
    }
}

impl ExtentAllocator for BitmapAllocator {
    fn allocate_blocks(&mut self, preferred: u32, minimum: u32) -> Result<Extent> {
        if minimum == 0 || minimum > preferred {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Invalid allocation request",
            ));
        }

        let run = bitmap::find_zero_run(
            &self.bitmap,
            self.total_blocks,
            preferred as u64,
            minimum as u64,
        );

        let (start, len) = match run {
            Some(run) => run,
            None => {
                warn!(
                    "[BALLOC] no contiguous run: preferred={}, minimum={}, free={}",
                    preferred,
                    minimum,
                    self.free_blocks()
                );
                return Err(Error::new(
                    ErrorKind::NoSpace,
                    "No contiguous free run large enough",
                ));
            }
        };

        bitmap::set_bits(&mut self.bitmap, start, len)?;
        debug!("[BALLOC] allocated blocks {}..{}", start, start + len);

        Ok(Extent::new(start, len as u32))
    }

    fn release_blocks(&mut self, extent: Extent) -> Result<()> {
        if extent.count == 0
            || extent.end() > self.total_blocks
            || !bitmap::all_set(&self.bitmap, extent.start, extent.count as u64)
        {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Releasing blocks that are not allocated",
            ));
        }

        bitmap::clear_bits(&mut self.bitmap, extent.start, extent.count as u64)?;
        debug!("[BALLOC] released blocks {}..{}", extent.start, extent.end());
        Ok(())
    }

    fn reserve_blocks(&mut self, extent: Extent) -> Result<()> {
        if extent.count == 0 || extent.end() > self.total_blocks {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Extent beyond end of volume",
            ));
        }

        if bitmap::any_set(&self.bitmap, extent.start, extent.count as u64) {
            warn!(
                "[BALLOC] blocks {}..{} are already in use",
                extent.start,
                extent.end()
            );
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Extent overlaps blocks already in use",
            ));
        }

        bitmap::set_bits(&mut self.bitmap, extent.start, extent.count as u64)?;
        trace!("[BALLOC] reserved blocks {}..{}", extent.start, extent.end());
        Ok(())
    }
}
