//! 单元测试共用的模拟设备和时钟

use crate::{block::BlockDevice, error::Result, fs::SystemHal};
use alloc::vec::Vec;
use core::time::Duration;

/// 测试时钟返回的固定时间戳（秒）
pub(crate) const TEST_NOW: u64 = 1_700_000_000;

/// 固定时钟
pub(crate) struct TestHal;

impl SystemHal for TestHal {
    fn now() -> Option<Duration> {
        Some(Duration::from_secs(TEST_NOW))
    }
}

/// 没有时钟的平台
pub(crate) struct NoClockHal;

impl SystemHal for NoClockHal {
    fn now() -> Option<Duration> {
        None
    }
}

/// 内存块设备，可以注入短读/短写
pub(crate) struct MockDevice {
    pub(crate) block_size: u32,
    pub(crate) sector_size: u32,
    pub(crate) total_blocks: u64,
    pub(crate) storage: Vec<u8>,
    /// 读取时少返回一个扇区
    pub(crate) short_reads: bool,
    /// 写入时少写一个扇区
    pub(crate) short_writes: bool,
    /// open 调用次数
    pub(crate) opens: u32,
    /// close 调用次数
    pub(crate) closes: u32,
}

impl MockDevice {
    pub(crate) fn new(total_blocks: u64) -> Self {
        let block_size = 512;
        let sector_size = 512;
        let storage = alloc::vec![0u8; (total_blocks * block_size as u64) as usize];
        Self {
            block_size,
            sector_size,
            total_blocks,
            storage,
            short_reads: false,
            short_writes: false,
            opens: 0,
            closes: 0,
        }
    }
}

impl BlockDevice for MockDevice {
    fn block_size(&self) -> u32 {
        self.block_size
    }

    fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    fn read_blocks(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize> {
        let start = (lba * self.sector_size as u64) as usize;
        let mut len = (count * self.sector_size) as usize;
        if self.short_reads {
            len = len.saturating_sub(self.sector_size as usize);
        }
        buf[..len].copy_from_slice(&self.storage[start..start + len]);
        Ok(len)
    }

    fn write_blocks(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize> {
        let start = (lba * self.sector_size as u64) as usize;
        let mut len = (count * self.sector_size) as usize;
        if self.short_writes {
            len = len.saturating_sub(self.sector_size as usize);
        }
        self.storage[start..start + len].copy_from_slice(&buf[..len]);
        Ok(len)
    }

    fn open(&mut self) -> Result<()> {
        self.opens += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closes += 1;
        Ok(())
    }
}
