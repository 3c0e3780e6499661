//! 目录项编解码
//!
//! 每个目录项在磁盘上是一条固定 [`ENTRY_SIZE`] 字节的记录，
//! 所有整数均为小端序：
//!
//! | 偏移 | 长度 | 字段 |
//! |------|------|------|
//! | 0    | 64   | 名称（UTF-8，零填充，最多 63 字节） |
//! | 64   | 1    | 标志（[`EntryFlags`]） |
//! | 65   | 3    | 保留，为 0 |
//! | 68   | 4    | 校验和（CRC32，计算时本字段按 0） |
//! | 72   | 8    | 大小（字节） |
//! | 80   | 8    | 创建时间（秒） |
//! | 88   | 8    | 修改时间（秒） |
//! | 96   | 8    | 访问时间（秒） |
//! | 104  | 8    | extent 起始块 |
//! | 112  | 4    | extent 块数（0 表示没有 extent） |
//! | 116  | 12   | 保留，为 0 |

use crate::{
    consts::*,
    crc::crc32_skip_field,
    error::{Error, ErrorKind, Result},
    types::{EntryFlags, Extent},
};
use alloc::string::{String, ToString};
use byteorder::{ByteOrder, LittleEndian};

/// 目录项
///
/// 目录表中的一个槽位。槽位要么完全为空（名称为 [`EMPTY_ENTRY_NAME`]，
/// 其余字段为 0），要么完全填充。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// 名称，在所属目录表中唯一
    pub name: String,
    /// 标志
    pub flags: EntryFlags,
    /// 文件内容大小；对目录而言是其目录表的字节数
    pub size: u64,
    /// 创建时间
    pub created_at: u64,
    /// 最后修改时间
    pub last_modified: u64,
    /// 最后访问时间
    pub last_accessed: u64,
    /// 此条目独占的磁盘块
    pub extent: Option<Extent>,
}

impl DirectoryEntry {
    /// 空槽
    pub fn empty() -> Self {
        Self {
            name: EMPTY_ENTRY_NAME.to_string(),
            flags: EntryFlags::empty(),
            size: 0,
            created_at: 0,
            last_modified: 0,
            last_accessed: 0,
            extent: None,
        }
    }

    /// 创建目录条目，三个时间戳都设为 `now`
    pub fn new_directory(name: &str, size: u64, extent: Extent, now: u64) -> Self {
        Self {
            name: name.to_string(),
            flags: EntryFlags::DIRECTORY,
            size,
            created_at: now,
            last_modified: now,
            last_accessed: now,
            extent: Some(extent),
        }
    }

    /// 创建文件条目，三个时间戳都设为 `now`
    pub fn new_file(name: &str, size: u64, extent: Option<Extent>, now: u64) -> Self {
        Self {
            name: name.to_string(),
            flags: EntryFlags::empty(),
            size,
            created_at: now,
            last_modified: now,
            last_accessed: now,
            extent,
        }
    }

    /// 复制元数据并改名
    ///
    /// 用于构造 `..`：它是父目录 `.` 条目的副本。
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// 是否为空槽
    pub fn is_empty(&self) -> bool {
        self.name == EMPTY_ENTRY_NAME
    }

    /// 是否为目录
    pub fn is_dir(&self) -> bool {
        !self.is_empty() && self.flags.contains(EntryFlags::DIRECTORY)
    }

    /// 是否为普通文件
    pub fn is_file(&self) -> bool {
        !self.is_empty() && !self.flags.contains(EntryFlags::DIRECTORY)
    }

    /// 编码到 `buf` 的前 [`ENTRY_SIZE`] 字节
    ///
    /// 名称之后未使用的字节和保留字节全部写 0。
    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() < ENTRY_SIZE {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Buffer too small for directory entry",
            ));
        }

        let name = self.name.as_bytes();
        if name.is_empty() || name.len() > MAX_NAME_LEN || name.contains(&0) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Directory entry name cannot be encoded",
            ));
        }

        let record = &mut buf[..ENTRY_SIZE];
        record.fill(0);

        record[ENTRY_OFF_NAME..ENTRY_OFF_NAME + name.len()].copy_from_slice(name);
        record[ENTRY_OFF_FLAGS] = self.flags.bits();
        LittleEndian::write_u64(&mut record[ENTRY_OFF_SIZE..], self.size);
        LittleEndian::write_u64(&mut record[ENTRY_OFF_CREATED..], self.created_at);
        LittleEndian::write_u64(&mut record[ENTRY_OFF_MODIFIED..], self.last_modified);
        LittleEndian::write_u64(&mut record[ENTRY_OFF_ACCESSED..], self.last_accessed);

        if let Some(extent) = self.extent {
            LittleEndian::write_u64(&mut record[ENTRY_OFF_EXTENT_START..], extent.start);
            LittleEndian::write_u32(&mut record[ENTRY_OFF_EXTENT_COUNT..], extent.count);
        }

        let csum = crc32_skip_field(record, ENTRY_OFF_CHECKSUM);
        LittleEndian::write_u32(&mut record[ENTRY_OFF_CHECKSUM..], csum);

        Ok(())
    }

    /// 从 `buf` 的前 [`ENTRY_SIZE`] 字节解码
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 缓冲区不足一条记录
    /// - `ErrorKind::Corrupted` - 校验和不符、名称无效或空槽字段非零
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < ENTRY_SIZE {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Buffer too small for directory entry",
            ));
        }

        let record = &buf[..ENTRY_SIZE];
        let stored = LittleEndian::read_u32(&record[ENTRY_OFF_CHECKSUM..]);
        if stored != crc32_skip_field(record, ENTRY_OFF_CHECKSUM) {
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Directory entry checksum mismatch",
            ));
        }

        let name_field = &record[ENTRY_OFF_NAME..ENTRY_OFF_NAME + ENTRY_NAME_FIELD_LEN];
        let name_len = name_field
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(ENTRY_NAME_FIELD_LEN);
        let name = core::str::from_utf8(&name_field[..name_len])
            .ok()
            .filter(|n| !n.is_empty())
            .ok_or(Error::new(
                ErrorKind::Corrupted,
                "Invalid directory entry name",
            ))?;

        let count = LittleEndian::read_u32(&record[ENTRY_OFF_EXTENT_COUNT..]);
        let extent = if count == 0 {
            None
        } else {
            Some(Extent::new(
                LittleEndian::read_u64(&record[ENTRY_OFF_EXTENT_START..]),
                count,
            ))
        };

        let entry = Self {
            name: name.to_string(),
            flags: EntryFlags::from_bits_truncate(record[ENTRY_OFF_FLAGS]),
            size: LittleEndian::read_u64(&record[ENTRY_OFF_SIZE..]),
            created_at: LittleEndian::read_u64(&record[ENTRY_OFF_CREATED..]),
            last_modified: LittleEndian::read_u64(&record[ENTRY_OFF_MODIFIED..]),
            last_accessed: LittleEndian::read_u64(&record[ENTRY_OFF_ACCESSED..]),
            extent,
        };

        if entry.is_empty() && entry != Self::empty() {
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Empty directory slot has populated fields",
            ));
        }

        Ok(entry)
    }
}

impl Default for DirectoryEntry {
    fn default() -> Self {
        Self::empty()
    }
}

/// 检查用户提供的条目名称
///
/// 拒绝空名称、空槽哨兵、`.`、`..`、含 `/` 或 NUL 的名称，
/// 以及超过 [`MAX_NAME_LEN`] 字节的名称。
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == DOT || name == DOTDOT {
        return Err(Error::new(ErrorKind::InvalidInput, "Invalid entry name"));
    }
    if name == EMPTY_ENTRY_NAME {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Entry name is reserved for empty slots",
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::new(ErrorKind::InvalidInput, "Entry name too long"));
    }
    if name.contains(PATH_SEPARATOR) || name.contains('\0') {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Entry name contains a forbidden character",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dir() -> DirectoryEntry {
        DirectoryEntry::new_directory("docs", 1536, Extent::new(7, 3), 1_700_000_000)
    }

    #[test]
    fn test_entry_type_checks() {
        let dir = sample_dir();
        assert!(dir.is_dir());
        assert!(!dir.is_file());

        let file = DirectoryEntry::new_file("a.txt", 10, Some(Extent::new(20, 1)), 5);
        assert!(file.is_file());
        assert!(!file.is_dir());

        let empty = DirectoryEntry::empty();
        assert!(empty.is_empty());
        assert!(!empty.is_dir());
        assert!(!empty.is_file());
    }

    #[test]
    fn test_encode_layout() {
        let mut buf = [0xffu8; ENTRY_SIZE];
        sample_dir().encode(&mut buf).unwrap();

        assert_eq!(&buf[..4], b"docs");
        assert!(buf[4..ENTRY_NAME_FIELD_LEN].iter().all(|&b| b == 0));
        assert_eq!(buf[ENTRY_OFF_FLAGS], EntryFlags::DIRECTORY.bits());
        assert_eq!(LittleEndian::read_u64(&buf[ENTRY_OFF_SIZE..]), 1536);
        assert_eq!(LittleEndian::read_u64(&buf[ENTRY_OFF_EXTENT_START..]), 7);
        assert_eq!(LittleEndian::read_u32(&buf[ENTRY_OFF_EXTENT_COUNT..]), 3);
        assert!(buf[116..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_slot_layout() {
        let mut buf = [0u8; ENTRY_SIZE];
        DirectoryEntry::empty().encode(&mut buf).unwrap();

        assert_eq!(&buf[..3], b"-1\0");
        assert!(buf[ENTRY_OFF_SIZE..].iter().all(|&b| b == 0));
        assert_eq!(DirectoryEntry::decode(&buf).unwrap(), DirectoryEntry::empty());
    }

    #[test]
    fn test_decode_detects_corruption() {
        let mut buf = [0u8; ENTRY_SIZE];
        sample_dir().encode(&mut buf).unwrap();
        buf[ENTRY_OFF_SIZE] ^= 0x01;

        let err = DirectoryEntry::decode(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);

        // 从未写过的记录
        let zeroed = [0u8; ENTRY_SIZE];
        assert_eq!(
            DirectoryEntry::decode(&zeroed).unwrap_err().kind(),
            ErrorKind::Corrupted
        );
    }

    #[test]
    fn test_encode_rejects_long_name() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        let entry = DirectoryEntry::new_file(&long, 0, None, 0);
        let mut buf = [0u8; ENTRY_SIZE];
        assert_eq!(
            entry.encode(&mut buf).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );

        let max = "y".repeat(MAX_NAME_LEN);
        let entry = DirectoryEntry::new_file(&max, 0, None, 0);
        entry.encode(&mut buf).unwrap();
        assert_eq!(DirectoryEntry::decode(&buf).unwrap().name, max);
    }

    #[test]
    fn test_renamed_keeps_metadata() {
        let parent = sample_dir();
        let dotdot = parent.renamed(DOTDOT);
        assert_eq!(dotdot.name, "..");
        assert_eq!(dotdot.extent, parent.extent);
        assert_eq!(dotdot.size, parent.size);
        assert_eq!(dotdot.created_at, parent.created_at);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("notes").is_ok());
        for bad in ["", ".", "..", "-1", "a/b", "nul\0"] {
            assert_eq!(
                validate_name(bad).unwrap_err().kind(),
                ErrorKind::InvalidInput,
                "{:?}",
                bad
            );
        }
        assert!(validate_name(&"z".repeat(MAX_NAME_LEN + 1)).is_err());
    }
}
