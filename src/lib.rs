//! basicfs_core: 块文件系统的目录层
//!
//! 这是一个纯 Rust 实现的简单块文件系统目录层，提供：
//! - **固定 128 字节**的目录项磁盘格式
//! - **连续块**存放的目录表（槽 0 为 `.`，槽 1 为 `..`）
//! - 以 `/` 分隔的绝对/相对**路径解析**
//! - 基于以上功能的目录创建、删除和工作目录切换
//!
//! # 示例
//!
//! ```rust,ignore
//! use basicfs_core::{BitmapAllocator, BlockDev, BlockDevice, FileSystem, FsConfig, Result};
//!
//! // 实现 BlockDevice trait
//! struct MyDevice {
//!     // ...
//! }
//!
//! impl BlockDevice for MyDevice {
//!     // 实现必要的方法
//!     // ...
//! }
//!
//! fn main() -> Result<()> {
//!     let bdev = BlockDev::new(MyDevice::new())?;
//!     let allocator = BitmapAllocator::new(bdev.total_blocks());
//!     let mut fs = FileSystem::<_, _, MyHal>::format(bdev, allocator, FsConfig::default())?;
//!
//!     fs.make_dir("/home")?;
//!     assert!(fs.is_dir("/home"));
//!
//!     Ok(())
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`block`] - 块设备抽象
//! - [`consts`] - 常量定义
//! - [`types`] - 数据结构定义
//! - [`superblock`] - 卷头操作
//! - [`dir`] - 目录项、目录表和路径解析
//! - [`fs`] - 文件系统高级 API

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 块设备抽象
pub mod block;

/// 常量定义
pub mod consts;

/// 数据结构定义
pub mod types;

/// 卷头操作
pub mod superblock;

/// 目录操作
pub mod dir;

/// 文件系统高级 API
pub mod fs;

/// 位图操作
pub mod bitmap;

/// 块分配
pub mod balloc;

/// CRC32 校验和计算
pub(crate) mod crc;

#[cfg(test)]
mod testing;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 块设备
pub use block::{BlockDev, BlockDevice};

// 数据结构
pub use types::{EntryFlags, Extent};

// 卷头
pub use superblock::VolumeHeader;

// Dir
pub use dir::{
    build_directory, build_directory_entry, load_directory, resolve_path, store_directory,
    DirectoryEntry, DirectoryTable, PathResolver, ResolvedPath,
};

// 块分配
pub use balloc::{BitmapAllocator, ExtentAllocator};

// FileSystem
pub use fs::{FileSystem, FsConfig, SystemHal};
