//! 卷头操作模块
//!
//! 卷头位于块 0，记录块大小、总块数和根目录位置。
//! 目录层通过卷头找到根目录，而不是使用写死的块号。

mod read;
mod write;

pub use read::*;
pub use write::*;
