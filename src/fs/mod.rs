//! 文件系统高级 API
//!
//! 这个模块把目录层组装成一个已挂载的文件系统：
//! 持有块设备、分配器、卷头以及根目录和当前工作目录两张常驻目录表。

mod filesystem;
mod types;

pub use filesystem::FileSystem;
pub use types::{FsConfig, SystemHal};
