//! Fixed-width little-endian writers for the binary tree format.

use std::io::{self, Write};

/// An interface for serializing fixed-width numeric fields to a byte sink.
///
/// Every numeric type is written little-endian with no delimiters or padding.
/// A blanket implementation covers any [`std::io::Write`].
pub trait BinaryWriter {
    /// Append raw bytes to this binary target
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()>;

    /// Write a single byte
    fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.write_bytes(&[value])
    }

    /// Write a 4-byte signed integer
    fn write_i32(&mut self, value: i32) -> io::Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write an 8-byte IEEE-754 float
    fn write_f64(&mut self, value: f64) -> io::Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write every value of a slice as consecutive 8-byte floats
    fn write_f64_slice<'a, I>(&mut self, values: I) -> io::Result<()>
    where
        I: IntoIterator<Item = &'a f64>,
        Self: Sized,
    {
        for value in values {
            self.write_f64(*value)?;
        }
        Ok(())
    }
}

impl<W: Write + ?Sized> BinaryWriter for W {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_all(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_i32_little_endian() {
        let mut buffer: Vec<u8> = Vec::new();
        buffer.write_i32(1).unwrap();
        buffer.write_i32(-1).unwrap();
        assert_eq!(buffer, vec![1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_write_mixed_fields() {
        let mut buffer: Vec<u8> = Vec::new();
        buffer.write_u8(1).unwrap();
        buffer.write_f64(1.5).unwrap();
        assert_eq!(buffer.len(), 9);
        assert_eq!(buffer[0], 1);
        assert_eq!(&buffer[1..], &1.5f64.to_le_bytes());
    }

    #[test]
    fn test_write_f64_slice() {
        let mut buffer: Vec<u8> = Vec::new();
        let values = [0.25, -2.0, 8.0];
        buffer.write_f64_slice(values.iter()).unwrap();
        assert_eq!(buffer.len(), 24);
        assert_eq!(&buffer[8..16], &(-2.0f64).to_le_bytes());
    }
}
