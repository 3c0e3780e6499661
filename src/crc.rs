//! CRC32 校验和计算
//!
//! 为目录项和卷头提供校验和计算功能

use crc32fast::Hasher;

/// 计算记录的校验和，校验和字段本身按 0 参与计算
///
/// # 参数
/// * `record` - 完整记录
/// * `field_off` - 校验和字段（4 字节）在记录中的偏移
///
/// # 返回
/// CRC32 值
pub fn crc32_skip_field(record: &[u8], field_off: usize) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&record[..field_off]);
    hasher.update(&[0u8; 4]);
    hasher.update(&record[field_off + 4..]);
    hasher.finalize()
}
