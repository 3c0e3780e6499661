//! 连续块（extent）分配模块
//!
//! 目录层只依赖 [`ExtentAllocator`] trait；[`BitmapAllocator`] 是一个
//! 基于内存位图的实现，供格式化和测试使用。

pub mod alloc;

pub use self::alloc::*;
