//! Bitmap 操作实现
//!
//! 每一位对应一个块：1 表示已分配，0 表示空闲。

use crate::error::{Error, ErrorKind, Result};

#[inline]
fn locate(bitmap: &[u8], index: u64) -> Option<(usize, u8)> {
    let byte_index = (index / 8) as usize;
    if byte_index >= bitmap.len() {
        return None;
    }
    Some((byte_index, 1 << (index % 8)))
}

/// 测试位图中某一位是否被设置
///
/// 超出位图范围的位视为已设置，不会被分配出去。
pub fn test_bit(bitmap: &[u8], index: u64) -> bool {
    match locate(bitmap, index) {
        Some((byte, mask)) => bitmap[byte] & mask != 0,
        None => true,
    }
}

/// 批量设置位图中的连续位
///
/// # 返回
///
/// 成功返回 ()，如果超出范围返回错误（此时位图不被修改）
pub fn set_bits(bitmap: &mut [u8], start: u64, count: u64) -> Result<()> {
    check_range(bitmap, start, count)?;
    for i in start..start + count {
        if let Some((byte, mask)) = locate(bitmap, i) {
            bitmap[byte] |= mask;
        }
    }
    Ok(())
}

/// 批量清除位图中的连续位
pub fn clear_bits(bitmap: &mut [u8], start: u64, count: u64) -> Result<()> {
    check_range(bitmap, start, count)?;
    for i in start..start + count {
        if let Some((byte, mask)) = locate(bitmap, i) {
            bitmap[byte] &= !mask;
        }
    }
    Ok(())
}

/// 检查连续位是否全部被设置
pub fn all_set(bitmap: &[u8], start: u64, count: u64) -> bool {
    (start..start.saturating_add(count)).all(|i| test_bit(bitmap, i))
}

/// 检查连续位中是否有任意一位被设置
pub fn any_set(bitmap: &[u8], start: u64, count: u64) -> bool {
    (start..start.saturating_add(count)).any(|i| test_bit(bitmap, i))
}

/// 统计 [0, end) 范围内空闲的位数
pub fn count_zeros(bitmap: &[u8], end: u64) -> u64 {
    let end = end.min(bitmap.len() as u64 * 8);
    (0..end).filter(|&i| !test_bit(bitmap, i)).count() as u64
}

/// 查找一段连续空闲位
///
/// 优先返回第一段长度不小于 `want` 的空闲段；找不到时返回第一段
/// 长度不小于 `min` 的空闲段（长度截断到 `want`）。
///
/// # 参数
///
/// * `bitmap` - 位图数据
/// * `end` - 搜索结束位置（不包含）
/// * `want` - 期望的连续空闲位数
/// * `min` - 可接受的最少连续空闲位数
///
/// # 返回
///
/// `(起始索引, 长度)`，没有满足条件的空闲段时返回 None
pub fn find_zero_run(bitmap: &[u8], end: u64, want: u64, min: u64) -> Option<(u64, u64)> {
    if want == 0 || min == 0 || min > want {
        return None;
    }

    let end = end.min(bitmap.len() as u64 * 8);
    let mut fallback = None;
    let mut run_start = 0;
    let mut run_len = 0;

    for i in 0..end {
        if test_bit(bitmap, i) {
            run_len = 0;
            continue;
        }

        if run_len == 0 {
            run_start = i;
        }
        run_len += 1;

        if run_len == want {
            return Some((run_start, want));
        }
        if run_len == min && fallback.is_none() {
            fallback = Some(run_start);
        }
    }

    // 回退段：从起点向后延伸，直到遇到已分配位或达到 want
    fallback.map(|start| {
        let mut len = 0;
        while len < want && start + len < end && !test_bit(bitmap, start + len) {
            len += 1;
        }
        (start, len)
    })
}

fn check_range(bitmap: &[u8], start: u64, count: u64) -> Result<()> {
    let max_bits = bitmap.len() as u64 * 8;
    match start.checked_add(count) {
        Some(end) if end <= max_bits => Ok(()),
        _ => Err(Error::new(
            ErrorKind::InvalidInput,
            "Bitmap index out of range",
        )),
    }
}
