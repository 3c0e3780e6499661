//! 目录层常量定义
//!
//! 这个模块包含了磁盘布局相关的常量：
//! - 目录项记录大小与字段偏移
//! - 保留名称（空槽哨兵、`.`、`..`）
//! - 卷头位置与魔数

//=============================================================================
// 基础常量
//=============================================================================

/// 默认目录项数量（根目录与新建目录）
pub const DEFAULT_DIR_ENTRIES: u32 = 50;

//=============================================================================
// 目录项相关
//=============================================================================

/// 单个目录项在磁盘上的固定大小（字节）
///
/// 块大小必须是它的整数倍，这样目录表总能正好填满若干个块。
pub const ENTRY_SIZE: usize = 128;

/// 名称字段长度（字节，含结尾的零填充）
pub const ENTRY_NAME_FIELD_LEN: usize = 64;

/// 名称最大长度（字节）
pub const MAX_NAME_LEN: usize = ENTRY_NAME_FIELD_LEN - 1;

/// 空槽哨兵名称
///
/// 保留名称，用户不能创建同名条目。
pub const EMPTY_ENTRY_NAME: &str = "-1";

/// 目录自身条目名称（槽 0）
pub const DOT: &str = ".";

/// 父目录条目名称（槽 1）
pub const DOTDOT: &str = "..";

/// `.` 所在槽位
pub const SELF_SLOT: usize = 0;

/// `..` 所在槽位
pub const PARENT_SLOT: usize = 1;

/// 目录表最少槽位数（`.` 和 `..`）
pub const MIN_DIR_ENTRIES: u32 = 2;

/// 路径分隔符
pub const PATH_SEPARATOR: char = '/';

// 目录项字段偏移
pub(crate) const ENTRY_OFF_NAME: usize = 0;
pub(crate) const ENTRY_OFF_FLAGS: usize = 64;
pub(crate) const ENTRY_OFF_CHECKSUM: usize = 68;
pub(crate) const ENTRY_OFF_SIZE: usize = 72;
pub(crate) const ENTRY_OFF_CREATED: usize = 80;
pub(crate) const ENTRY_OFF_MODIFIED: usize = 88;
pub(crate) const ENTRY_OFF_ACCESSED: usize = 96;
pub(crate) const ENTRY_OFF_EXTENT_START: usize = 104;
pub(crate) const ENTRY_OFF_EXTENT_COUNT: usize = 112;

//=============================================================================
// 卷头相关
//=============================================================================

/// 卷头所在块号
pub const VOLUME_HEADER_BLOCK: u64 = 0;

/// 卷头占用的块数
pub const VOLUME_HEADER_BLOCKS: u32 = 1;

/// 卷头魔数 ("BFS1")
pub const VOLUME_MAGIC: u32 = 0x4246_5331;

/// 卷头格式版本
pub const VOLUME_VERSION: u32 = 1;

/// 卷头有效字节数
pub const VOLUME_HEADER_SIZE: usize = 40;

// 卷头字段偏移
pub(crate) const HDR_OFF_MAGIC: usize = 0;
pub(crate) const HDR_OFF_VERSION: usize = 4;
pub(crate) const HDR_OFF_BLOCK_SIZE: usize = 8;
pub(crate) const HDR_OFF_TOTAL_BLOCKS: usize = 16;
pub(crate) const HDR_OFF_ROOT_START: usize = 24;
pub(crate) const HDR_OFF_ROOT_COUNT: usize = 32;
pub(crate) const HDR_OFF_CHECKSUM: usize = 36;
