//! 块设备抽象
//!
//! 提供块设备接口和块级 I/O 操作。
//! block/device.rs 定义底层设备 trait（按扇区读写）以及按逻辑块读写的包装器 `BlockDev`。
//! 目录层只通过 `BlockDev::read_blocks` / `BlockDev::write_blocks` 访问磁盘，
//! 这两个函数返回实际完成的块数，由调用者判断是否为短读/短写。

mod device;

pub use device::{BlockDevice, BlockDev};
