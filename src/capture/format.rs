//! Binary layout of Life Stream capture files.

use std::io::{self, Read, Write};

/// Magic bytes identifying a capture file.
pub const CAPTURE_MAGIC: &[u8; 4] = b"LSCP";

/// Current format version.
pub const CAPTURE_VERSION: u16 = 1;

/// Compression applied to each stored frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionType {
    /// Raw NV12 bytes.
    #[default]
    None = 0,
    /// LZ4 block with prepended size.
    Lz4 = 1,
}

impl CompressionType {
    pub fn from_u16(flags: u16) -> Option<Self> {
        match flags & 0x0F {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Lz4),
            _ => None,
        }
    }
}

/// Capture file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureHeader {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    /// Number of stored frames.
    pub frame_count: u64,
    /// Presentation index of the first stored frame.
    pub first_index: u64,
    pub compression: CompressionType,
}

impl CaptureHeader {
    /// Magic(4) + Version(2) + Flags(2) + Width(4) + Height(4) + FrameRate(4) +
    /// FrameCount(8) + FirstIndex(8) + Reserved(4) = 40
    pub const SIZE: usize = 40;

    /// Size of one uncompressed NV12 frame.
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3 / 2
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(CAPTURE_MAGIC)?;
        w.write_all(&CAPTURE_VERSION.to_le_bytes())?;
        w.write_all(&(self.compression as u16).to_le_bytes())?;
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&self.frame_rate.to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&self.first_index.to_le_bytes())?;
        w.write_all(&[0u8; 4])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;

        if &buf[0..4] != CAPTURE_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid LSCP magic bytes",
            ));
        }

        let u16_at = |at: usize| u16::from_le_bytes([buf[at], buf[at + 1]]);
        let u32_at = |at: usize| {
            let mut b = [0u8; 4];
            b.copy_from_slice(&buf[at..at + 4]);
            u32::from_le_bytes(b)
        };
        let u64_at = |at: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&buf[at..at + 8]);
            u64::from_le_bytes(b)
        };

        let version = u16_at(4);
        if version != CAPTURE_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported LSCP version: {}", version),
            ));
        }

        let compression = CompressionType::from_u16(u16_at(6)).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "Unknown LSCP compression")
        })?;

        Ok(Self {
            width: u32_at(8),
            height: u32_at(12),
            frame_rate: u32_at(16),
            frame_count: u64_at(20),
            first_index: u64_at(28),
            compression,
        })
    }
}

/// Location of one stored frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndex {
    /// Byte offset from start of file.
    pub offset: u64,
    /// Stored (possibly compressed) size in bytes.
    pub size: u64,
}

impl FrameIndex {
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.offset.to_le_bytes())?;
        w.write_all(&self.size.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf8 = [0u8; 8];
        r.read_exact(&mut buf8)?;
        let offset = u64::from_le_bytes(buf8);
        r.read_exact(&mut buf8)?;
        let size = u64::from_le_bytes(buf8);
        Ok(Self { offset, size })
    }
}

/// Compress data using LZ4.
#[cfg(feature = "lz4")]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Decompress LZ4 data.
#[cfg(feature = "lz4")]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Fallback when LZ4 is not available.
#[cfg(not(feature = "lz4"))]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

#[cfg(not(feature = "lz4"))]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    Ok(data.to_vec())
}
