//! 块设备核心类型

use crate::error::{Error, ErrorKind, Result};

/// 块设备接口
///
/// 实现此 trait 以提供底层块设备访问。
///
/// # 示例
///
/// ```rust,ignore
/// use basicfs_core::{BlockDevice, Result};
///
/// struct MyDevice {
///     // ...
/// }
///
/// impl BlockDevice for MyDevice {
///     fn block_size(&self) -> u32 {
///         512
///     }
///
///     fn sector_size(&self) -> u32 {
///         512
///     }
///
///     fn total_blocks(&self) -> u64 {
///         19531
///     }
///
///     fn read_blocks(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize> {
///         // 实现扇区读取
///         Ok(count as usize * self.sector_size() as usize)
///     }
///
///     fn write_blocks(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize> {
///         // 实现扇区写入
///         Ok(count as usize * self.sector_size() as usize)
///     }
/// }
/// ```
pub trait BlockDevice {
    /// 逻辑块大小（通常 512）
    fn block_size(&self) -> u32;

    /// 物理扇区大小（通常 512）
    fn sector_size(&self) -> u32;

    /// 总块数
    fn total_blocks(&self) -> u64;

    /// 读取扇区
    ///
    /// # 参数
    ///
    /// * `lba` - 逻辑块地址（以扇区为单位）
    /// * `count` - 要读取的扇区数
    /// * `buf` - 目标缓冲区（大小至少为 count * sector_size）
    ///
    /// # 返回
    ///
    /// 成功返回实际读取的字节数，可能少于请求的字节数
    fn read_blocks(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize>;

    /// 写入扇区
    ///
    /// # 返回
    ///
    /// 成功返回实际写入的字节数，可能少于请求的字节数
    fn write_blocks(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize>;

    /// 刷新缓存
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// 打开设备
    ///
    /// 在开始使用设备前调用。默认实现什么都不做。
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// 关闭设备
    ///
    /// 在停止使用设备后调用。默认实现什么都不做。
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// 块设备包装器
///
/// 以逻辑块为单位访问底层设备，并记录读写统计。
///
/// # 并发使用
///
/// BlockDev 本身不包含内部锁，目录层假定单线程使用。
/// 多线程环境应由调用者把整个文件系统放进一把锁里：
///
/// ```rust,ignore
/// use std::sync::{Arc, Mutex};
///
/// let fs = Arc::new(Mutex::new(FileSystem::<_, _, MyHal>::mount(bdev, allocator)?));
/// ```
pub struct BlockDev<D> {
    /// 底层设备
    device: D,
    /// 逻辑读取次数
    read_count: u64,
    /// 逻辑写入次数
    write_count: u64,
}

impl<D: BlockDevice> BlockDev<D> {
    /// 创建新的块设备包装器
    pub fn new(device: D) -> Result<Self> {
        let block_size = device.block_size();
        let sector_size = device.sector_size();

        if block_size == 0 || sector_size == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Block and sector size must be non-zero",
            ));
        }

        // 验证块大小是扇区大小的整数倍
        if block_size % sector_size != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Block size must be a multiple of sector size",
            ));
        }

        Ok(Self {
            device,
            read_count: 0,
            write_count: 0,
        })
    }

    /// 获取底层设备的可变引用
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// 获取逻辑块大小
    pub fn block_size(&self) -> u32 {
        self.device.block_size()
    }

    /// 获取总块数
    pub fn total_blocks(&self) -> u64 {
        self.device.total_blocks()
    }

    /// 获取逻辑读取次数
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    /// 获取逻辑写入次数
    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    /// 将逻辑块地址转换为物理扇区地址
    fn logical_to_physical(&self, lba: u64) -> u64 {
        let block_size = self.device.block_size() as u64;
        let sector_size = self.device.sector_size() as u64;
        lba * block_size / sector_size
    }

    /// 每个逻辑块包含的物理扇区数
    fn sectors_per_block(&self) -> u32 {
        self.device.block_size() / self.device.sector_size()
    }

    fn check_request(&self, lba: u64, count: u32, buf_len: usize) -> Result<usize> {
        let required_size = count as usize * self.device.block_size() as usize;

        if buf_len < required_size {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Buffer too small for requested blocks",
            ));
        }

        if lba.checked_add(count as u64).map_or(true, |end| end > self.total_blocks()) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Block range beyond end of device",
            ));
        }

        Ok(required_size)
    }

    /// 读取连续的逻辑块
    ///
    /// # 参数
    ///
    /// * `lba` - 起始逻辑块地址
    /// * `count` - 要读取的块数
    /// * `buf` - 目标缓冲区（大小至少为 count * block_size）
    ///
    /// # 返回
    ///
    /// 实际读取的完整块数。少于 `count` 表示短读，由调用者处理。
    pub fn read_blocks(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<u32> {
        let required_size = self.check_request(lba, count, buf.len())?;

        let pba = self.logical_to_physical(lba);
        let sector_count = count * self.sectors_per_block();

        self.read_count += 1;
        let bytes = self.device.read_blocks(pba, sector_count, &mut buf[..required_size])?;
        Ok((bytes / self.device.block_size() as usize) as u32)
    }

    /// 写入连续的逻辑块
    ///
    /// # 返回
    ///
    /// 实际写入的完整块数。少于 `count` 表示短写，由调用者处理。
    pub fn write_blocks(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<u32> {
        let required_size = self.check_request(lba, count, buf.len())?;

        let pba = self.logical_to_physical(lba);
        let sector_count = count * self.sectors_per_block();

        self.write_count += 1;
        let bytes = self.device.write_blocks(pba, sector_count, &buf[..required_size])?;
        Ok((bytes / self.device.block_size() as usize) as u32)
    }

    /// 刷新底层设备
    pub fn flush(&mut self) -> Result<()> {
        self.device.flush()
    }

    /// 打开底层设备
    pub fn open(&mut self) -> Result<()> {
        self.device.open()
    }

    /// 关闭底层设备
    ///
    /// 先刷新，然后调用底层设备的 `close()` 方法。
    pub fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.device.close()
    }
}
