//! Fixed-width little-endian readers, the counterpart of
//! [`BinaryWriter`](super::binary_writer::BinaryWriter).

use crate::core::constants::MAX_PREALLOCATED_VALUES;
use crate::core::error::{RegForestError, Result};
use std::io::{self, Read};

/// Reads fixed-width numeric fields from a byte source.
///
/// Each method names the field being read so that a truncated stream reports
/// where it ended.
pub trait BinaryReader {
    /// Fill `buffer` completely or fail
    fn read_bytes(&mut self, buffer: &mut [u8], field: &str) -> Result<()>;

    /// Read a single byte
    fn read_u8_field(&mut self, field: &str) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_bytes(&mut buf, field)?;
        Ok(buf[0])
    }

    /// Read a 4-byte signed integer
    fn read_i32_field(&mut self, field: &str) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf, field)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Read an 8-byte IEEE-754 float
    fn read_f64_field(&mut self, field: &str) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_bytes(&mut buf, field)?;
        Ok(f64::from_le_bytes(buf))
    }

    /// Read `count` consecutive 8-byte floats
    fn read_f64_vec(&mut self, count: usize, field: &str) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(count.min(MAX_PREALLOCATED_VALUES));
        for _ in 0..count {
            values.push(self.read_f64_field(field)?);
        }
        Ok(values)
    }
}

impl<R: Read + ?Sized> BinaryReader for R {
    fn read_bytes(&mut self, buffer: &mut [u8], field: &str) -> Result<()> {
        self.read_exact(buffer).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                RegForestError::stream(format!("stream ended while reading {}", field))
            }
            _ => RegForestError::from(e),
        })
    }
}
