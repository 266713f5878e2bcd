//! Abstract stream for reading and writing
//!
//! Byte channel with position seeking plus the typed helpers the attribute
//! codecs are built on: little-endian fixed-width values, a variable-length
//! unsigned encoding for counts and lengths, null-terminated strings, and
//! length-prefixed raw buffers.

use thiserror::Error;

/// Errors produced by stream operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Attempted to read past the end of the stream.
    #[error("attempted to read past the end of the stream")]
    UnexpectedEof,

    /// The stream does not support reading.
    #[error("stream does not support reading")]
    NotReadable,

    /// The stream does not support writing.
    #[error("stream does not support writing")]
    NotWritable,

    /// Not all bytes could be written.
    #[error("could not write all bytes to the stream")]
    WriteIncomplete,

    /// String data was not valid UTF-8.
    #[error("string data is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// An embedded JSON payload could not be parsed.
    #[error("malformed embedded JSON value: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

/// Abstract stream for reading and writing.
///
/// Multi-byte values use little-endian byte order. Counts and lengths use a
/// variable-length encoding with 7 bits per byte and the high bit as a
/// continuation flag, at most 4 bytes (28 significant bits).
pub trait Stream {
    /// Read bytes from the stream. Returns the number of bytes actually
    /// read, which may be less than requested at the end of the stream.
    fn read(&mut self, dest: &mut [u8]) -> Result<usize, StreamError>;

    /// Write bytes to the stream. Returns the number of bytes actually
    /// written.
    fn write(&mut self, data: &[u8]) -> Result<usize, StreamError>;

    /// Set position in bytes from the beginning of the stream. Returns the
    /// position after the seek.
    fn seek(&mut self, position: usize) -> Result<usize, StreamError>;

    /// Current position in bytes.
    fn position(&self) -> usize;

    /// Size in bytes.
    fn size(&self) -> usize;

    /// Whether read operations are allowed.
    fn is_readable(&self) -> bool;

    /// Whether write operations are allowed.
    fn is_writable(&self) -> bool;

    /// Whether the end of the stream has been reached.
    fn is_eof(&self) -> bool {
        self.position() >= self.size()
    }

    /// Read exactly `dest.len()` bytes or fail.
    fn read_exact(&mut self, dest: &mut [u8]) -> Result<(), StreamError> {
        if self.read(dest)? == dest.len() {
            Ok(())
        } else {
            Err(StreamError::UnexpectedEof)
        }
    }

    /// Write all of `data` or fail.
    fn write_exact(&mut self, data: &[u8]) -> Result<(), StreamError> {
        if self.write(data)? == data.len() {
            Ok(())
        } else {
            Err(StreamError::WriteIncomplete)
        }
    }

    /// Read an 8-bit unsigned integer.
    fn read_u8(&mut self) -> Result<u8, StreamError> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Read an 8-bit signed integer.
    fn read_i8(&mut self) -> Result<i8, StreamError> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a 16-bit unsigned integer.
    fn read_u16(&mut self) -> Result<u16, StreamError> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Read a 16-bit signed integer.
    fn read_i16(&mut self) -> Result<i16, StreamError> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(i16::from_le_bytes(buf))
    }

    /// Read a 32-bit unsigned integer.
    fn read_u32(&mut self) -> Result<u32, StreamError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a 32-bit signed integer.
    fn read_i32(&mut self) -> Result<i32, StreamError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Read a 64-bit unsigned integer.
    fn read_u64(&mut self) -> Result<u64, StreamError> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Read a 64-bit signed integer.
    fn read_i64(&mut self) -> Result<i64, StreamError> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }

    /// Read a 32-bit float.
    fn read_f32(&mut self) -> Result<f32, StreamError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    /// Read a 64-bit float.
    fn read_f64(&mut self) -> Result<f64, StreamError> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    /// Read a boolean stored as one byte.
    fn read_bool(&mut self) -> Result<bool, StreamError> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a variable-length encoded unsigned integer.
    fn read_vle(&mut self) -> Result<u32, StreamError> {
        let mut ret = 0u32;
        for shift in [0u32, 7, 14, 21] {
            let byte = self.read_u8()?;
            ret |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok(ret)
    }

    /// Read a null-terminated UTF-8 string. Stops at the end of the stream
    /// if no terminator is found.
    fn read_string(&mut self) -> Result<String, StreamError> {
        let mut bytes = Vec::new();
        while !self.is_eof() {
            let byte = self.read_u8()?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        Ok(String::from_utf8(bytes)?)
    }

    /// Read a 4-character file ID.
    fn read_file_id(&mut self) -> Result<String, StreamError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(String::from_utf8(buf.to_vec())?)
    }

    /// Read a byte buffer with its size prepended as a VLE value.
    fn read_buffer(&mut self) -> Result<Vec<u8>, StreamError> {
        let len = self.read_vle()? as usize;
        if len > self.size().saturating_sub(self.position()) {
            return Err(StreamError::UnexpectedEof);
        }
        let mut data = vec![0u8; len];
        self.read_exact(&mut data)?;
        Ok(data)
    }

    /// Write an 8-bit unsigned integer.
    fn write_u8(&mut self, value: u8) -> Result<(), StreamError> {
        self.write_exact(&[value])
    }

    /// Write an 8-bit signed integer.
    fn write_i8(&mut self, value: i8) -> Result<(), StreamError> {
        self.write_u8(value as u8)
    }

    /// Write a 16-bit unsigned integer.
    fn write_u16(&mut self, value: u16) -> Result<(), StreamError> {
        self.write_exact(&value.to_le_bytes())
    }

    /// Write a 16-bit signed integer.
    fn write_i16(&mut self, value: i16) -> Result<(), StreamError> {
        self.write_exact(&value.to_le_bytes())
    }

    /// Write a 32-bit unsigned integer.
    fn write_u32(&mut self, value: u32) -> Result<(), StreamError> {
        self.write_exact(&value.to_le_bytes())
    }

    /// Write a 32-bit signed integer.
    fn write_i32(&mut self, value: i32) -> Result<(), StreamError> {
        self.write_exact(&value.to_le_bytes())
    }

    /// Write a 64-bit unsigned integer.
    fn write_u64(&mut self, value: u64) -> Result<(), StreamError> {
        self.write_exact(&value.to_le_bytes())
    }

    /// Write a 64-bit signed integer.
    fn write_i64(&mut self, value: i64) -> Result<(), StreamError> {
        self.write_exact(&value.to_le_bytes())
    }

    /// Write a 32-bit float.
    fn write_f32(&mut self, value: f32) -> Result<(), StreamError> {
        self.write_exact(&value.to_le_bytes())
    }

    /// Write a 64-bit float.
    fn write_f64(&mut self, value: f64) -> Result<(), StreamError> {
        self.write_exact(&value.to_le_bytes())
    }

    /// Write a boolean as one byte.
    fn write_bool(&mut self, value: bool) -> Result<(), StreamError> {
        self.write_u8(u8::from(value))
    }

    /// Write a variable-length encoded unsigned integer. Values are limited
    /// to 28 significant bits.
    fn write_vle(&mut self, value: u32) -> Result<(), StreamError> {
        debug_assert!(value < (1 << 28), "VLE value out of range");
        let mut remaining = value & 0x0FFF_FFFF;
        loop {
            let byte = (remaining & 0x7F) as u8;
            remaining >>= 7;
            if remaining == 0 {
                return self.write_u8(byte);
            }
            self.write_u8(byte | 0x80)?;
        }
    }

    /// Write a null-terminated UTF-8 string.
    fn write_string(&mut self, value: &str) -> Result<(), StreamError> {
        self.write_exact(value.as_bytes())?;
        self.write_u8(0)
    }

    /// Write a 4-character file ID. Shorter values are padded with spaces.
    fn write_file_id(&mut self, value: &str) -> Result<(), StreamError> {
        let mut id = [b' '; 4];
        for (slot, byte) in id.iter_mut().zip(value.bytes()) {
            *slot = byte;
        }
        self.write_exact(&id)
    }

    /// Write a byte buffer with its size prepended as a VLE value.
    fn write_buffer(&mut self, data: &[u8]) -> Result<(), StreamError> {
        self.write_vle(data.len() as u32)?;
        self.write_exact(data)
    }
}
