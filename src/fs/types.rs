//! 文件系统配置和平台接口

use crate::consts::DEFAULT_DIR_ENTRIES;
use core::time::Duration;

/// 系统硬件抽象层 trait
///
/// 提供文件系统所需的系统级功能，主要是时间戳支持
pub trait SystemHal {
    /// 获取当前系统时间
    ///
    /// # 返回
    ///
    /// - `Some(Duration)` - 当前时间（从 UNIX 纪元开始）
    /// - `None` - 时间不可用（例如在没有RTC的嵌入式系统中）
    ///
    /// # 示例
    ///
    /// ```ignore
    /// struct MyHal;
    /// impl SystemHal for MyHal {
    ///     fn now() -> Option<Duration> {
    ///         Some(Duration::from_secs(get_unix_timestamp()))
    ///     }
    /// }
    /// ```
    fn now() -> Option<Duration>;

    /// 目录项使用的时间戳（秒），时间不可用时为 0
    fn timestamp() -> u64 {
        Self::now().map_or(0, |d| d.as_secs())
    }
}

/// 文件系统配置
#[derive(Debug, Clone, Copy)]
pub struct FsConfig {
    /// 格式化时根目录请求的槽位数
    pub root_entry_count: u32,
    /// 新建目录请求的槽位数
    pub dir_entry_count: u32,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            root_entry_count: DEFAULT_DIR_ENTRIES,
            dir_entry_count: DEFAULT_DIR_ENTRIES,
        }
    }
}
