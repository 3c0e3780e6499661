//! 卷头写入

use crate::{
    block::{BlockDev, BlockDevice},
    consts::*,
    crc::crc32_skip_field,
    error::{Error, ErrorKind, Result},
};
use byteorder::{ByteOrder, LittleEndian};

use super::VolumeHeader;

impl VolumeHeader {
    /// 编码卷头，`buf` 中卷头之后的字节写 0
    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() < VOLUME_HEADER_SIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "Buffer too small for volume header"));
        }
        buf.fill(0);

        let raw = &mut buf[..VOLUME_HEADER_SIZE];
        LittleEndian::write_u32(&mut raw[HDR_OFF_MAGIC..], VOLUME_MAGIC);
        LittleEndian::write_u32(&mut raw[HDR_OFF_VERSION..], VOLUME_VERSION);
        LittleEndian::write_u32(&mut raw[HDR_OFF_BLOCK_SIZE..], self.block_size);
        LittleEndian::write_u64(&mut raw[HDR_OFF_TOTAL_BLOCKS..], self.total_blocks);
        LittleEndian::write_u64(&mut raw[HDR_OFF_ROOT_START..], self.root.start);
        LittleEndian::write_u32(&mut raw[HDR_OFF_ROOT_COUNT..], self.root.count);

        let csum = crc32_skip_field(raw, HDR_OFF_CHECKSUM);
        LittleEndian::write_u32(&mut raw[HDR_OFF_CHECKSUM..], csum);
        Ok(())
    }

    /// 把卷头写到块 0
    pub fn store<D: BlockDevice>(&self, bdev: &mut BlockDev<D>) -> Result<()> {
        let block_size = bdev.block_size() as usize;
        let mut buf = alloc::vec![0u8; VOLUME_HEADER_BLOCKS as usize * block_size];
        self.encode(&mut buf)?;

        let written = bdev.write_blocks(VOLUME_HEADER_BLOCK, VOLUME_HEADER_BLOCKS, &buf)?;
        if written != VOLUME_HEADER_BLOCKS {
            return Err(Error::new(ErrorKind::Io, "Short write of volume header"));
        }

        log::debug!("[VOLUME] header stored, root at block {}", self.root.start);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing::MockDevice, types::Extent};

    #[test]
    fn test_store_and_load() {
        let mut bdev = BlockDev::new(MockDevice::new(64)).unwrap();
        let header = VolumeHeader::new(512, 64, Extent::new(1, 13));

        header.store(&mut bdev).unwrap();
        assert_eq!(VolumeHeader::load(&mut bdev).unwrap(), header);
    }

    #[test]
    fn test_load_unformatted() {
        let mut bdev = BlockDev::new(MockDevice::new(64)).unwrap();
        let err = VolumeHeader::load(&mut bdev).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_decode_detects_bit_flip() {
        let header = VolumeHeader::new(512, 64, Extent::new(1, 13));
        let mut buf = [0u8; 512];
        header.encode(&mut buf).unwrap();
        buf[HDR_OFF_ROOT_START] ^= 0x04;

        let err = VolumeHeader::decode(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_load_rejects_mismatched_device() {
        let mut bdev = BlockDev::new(MockDevice::new(64)).unwrap();
        VolumeHeader::new(512, 128, Extent::new(1, 13))
            .store(&mut bdev)
            .unwrap();
        assert_eq!(
            VolumeHeader::load(&mut bdev).unwrap_err().kind(),
            ErrorKind::Corrupted
        );
    }

    #[test]
    fn test_root_entry_is_directory() {
        let header = VolumeHeader::new(512, 64, Extent::new(1, 3));
        let root = header.root_entry();
        assert!(root.is_dir());
        assert_eq!(root.extent, Some(Extent::new(1, 3)));
    }
}
