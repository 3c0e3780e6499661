//! 目录操作模块
//!
//! 这个模块提供目录表的创建、加载和路径解析功能。
//!
//! ## 模块结构
//!
//! - `entry` - 目录项及其 128 字节的磁盘格式
//! - `table` - 目录表（查找、空槽分配、删除）
//! - `builder` - 创建新目录
//! - `loader` - 从磁盘加载目录表、写回目录表
//! - `path` - 路径解析
//!
//! ## 使用建议
//!
//! - `path::resolve_path()` - 把路径解析为 (父目录表, 槽位, 名称)
//! - `builder::build_directory_entry()` - 创建目录并取得它的 `.` 条目
//! - `loader::load_directory()` - 加载条目指向的目录表

pub mod builder;
pub mod entry;
pub mod loader;
pub mod path;
pub mod table;

pub use builder::{build_directory, build_directory_entry, TableGeometry};
pub use entry::{validate_name, DirectoryEntry};
pub use loader::{load_directory, load_root_directory, store_directory};
pub use path::{resolve_path, PathResolver, ResolvedPath};
pub use table::DirectoryTable;
