//! 位图操作
//!
//! 空闲块位图的位级操作，供 [`crate::balloc`] 使用

mod ops;

pub use ops::*;
